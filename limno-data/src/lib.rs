//! Labelled arrays and the axis logic shared by every lake-data pipeline.
//!
//! Retrieved payloads are turned into [`array::LabelledArray`] values,
//! query points are snapped to samples with [`resolve`], and fragments
//! from separate source calls are stitched together with [`merge`].

pub mod array;
pub mod axis;
pub mod error;
pub mod interpolation;
pub mod jitter;
pub mod merge;
pub mod resolve;

pub use array::{Dataset, LabelledArray};
pub use axis::{Axis, AxisKind};
pub use error::{LimnoError, Result};
pub use resolve::{NearestPolicy, Query};
