/// Error types shared by the limno crates
use thiserror::Error;

/// Which side of an axis a rejected query fell on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Below,
    Above,
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Below => write!(f, "less than"),
            Side::Above => write!(f, "greater than"),
        }
    }
}

/// Main error type for retrieval, resolution and merge operations
#[derive(Error, Debug)]
pub enum LimnoError {
    /// Upstream answered with something other than 200
    #[error("Request failed with status {status}, url = {url}")]
    Fetch { status: u16, url: String },

    /// Transport-level failure before a status was received
    #[error("HTTP request failed: {0}")]
    Http(String),

    /// A filter or listing matched nothing
    #[error("No data found: {0}")]
    EmptyResult(String),

    /// Axis with zero samples
    #[error("Axis '{0}' has no samples to resolve against")]
    EmptyAxis(String),

    /// Query coordinate outside the extrapolated axis bounds
    #[error("Value {value} {side} extrapolated bound {bound} (nearest available {nearest})")]
    OutOfRange {
        value: f64,
        bound: f64,
        nearest: f64,
        side: Side,
    },

    /// Spatial grid without usable cells
    #[error("Coordinate grid has no cells")]
    EmptyGrid,

    /// Fragments disagree on the cardinality of a shared axis
    #[error("Axis '{axis}' is not consistent across fragments (expected {expected} samples, found {found})")]
    InconsistentAxis {
        axis: String,
        expected: usize,
        found: usize,
    },

    /// Unknown discriminator string
    #[error("Unrecognized {what}: {value}")]
    UnrecognizedKind { what: &'static str, value: String },

    /// Values do not match the declared axes
    #[error("Shape mismatch: {0}")]
    ShapeMismatch(String),

    /// Field absent from a decoded payload
    #[error("Missing field in payload: {0}")]
    MissingField(String),

    /// Variable absent from a dataset or file
    #[error("Missing variable: {0}")]
    MissingVariable(String),

    #[error("Failed to parse date: {0}")]
    DateParse(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("NetCDF error: {0}")]
    NetCdf(String),

    /// Operation needs a cargo feature that was not compiled in
    #[error("Feature '{0}' not enabled")]
    FeatureDisabled(&'static str),

    #[error("Colourmap {0} not found")]
    ColormapNotFound(String),

    #[error("Rendering failed: {0}")]
    Render(String),
}

/// Type alias for Results using LimnoError
pub type Result<T> = std::result::Result<T, LimnoError>;
