//! Field-name mapping for the measurement payload flavours served by
//! Datalakes. Each flavour names where time, depth and values live in the
//! JSON body and which canonical depth axis it is snapped onto.

use limno_data::{
    axis::{Axis, AxisKind},
    error::LimnoError,
};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Instrument flavour of a Datalakes JSON file.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, Serialize, Deserialize)]
pub enum SourceKind {
    Thermochain,
    Idronaut,
    AdcpDeepVelocity,
    AdcpNearSurfaceVelocity,
}

/// How the time key of a payload is laid out.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum TimeLayout {
    /// One epoch-seconds entry per column.
    Series,
    /// The whole profile was taken at the first entry of the array.
    SingleInstant,
}

/// Where each coordinate and value sits in the payload.
#[derive(Debug, PartialEq, Clone, Copy)]
pub struct SourceFields {
    pub time_key: &'static str,
    pub time_layout: TimeLayout,
    pub depth_key: &'static str,
    /// Repeated depth readings must be made unique before use.
    pub jitter_depths: bool,
    /// `(payload key, output variable)` pairs
    pub value_keys: &'static [(&'static str, &'static str)],
}

const THERMOCHAIN_FIELDS: SourceFields = SourceFields {
    time_key: "x",
    time_layout: TimeLayout::Series,
    depth_key: "y",
    jitter_depths: false,
    value_keys: &[("z", "temp")],
};

const IDRONAUT_FIELDS: SourceFields = SourceFields {
    time_key: "M",
    time_layout: TimeLayout::SingleInstant,
    depth_key: "y",
    jitter_depths: true,
    value_keys: &[("x", "temp")],
};

const ADCP_FIELDS: SourceFields = SourceFields {
    time_key: "x",
    time_layout: TimeLayout::Series,
    depth_key: "y",
    jitter_depths: false,
    value_keys: &[("z", "u"), ("z1", "v")],
};

impl SourceKind {
    pub fn fields(&self) -> SourceFields {
        match self {
            SourceKind::Thermochain => THERMOCHAIN_FIELDS,
            SourceKind::Idronaut => IDRONAUT_FIELDS,
            SourceKind::AdcpDeepVelocity | SourceKind::AdcpNearSurfaceVelocity => ADCP_FIELDS,
        }
    }

    /// Depth axis (metres, negative down) the parsed fragment is snapped
    /// onto, if any.
    pub fn canonical_depths(&self) -> Option<Axis> {
        match self {
            SourceKind::Thermochain => None,
            SourceKind::Idronaut => Some(Axis::depth((0..600).map(|k| -0.1 * k as f64).collect())),
            SourceKind::AdcpDeepVelocity => Some(Axis::depth((10..120).map(|k| -(k as f64)).collect())),
            SourceKind::AdcpNearSurfaceVelocity => {
                let positive = Axis::arange("depth", AxisKind::Depth, 0.0, 8.0, 0.25);
                Some(positive.negated())
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Thermochain => "thermochain",
            SourceKind::Idronaut => "idronaut",
            SourceKind::AdcpDeepVelocity => "adcp_deep_velocity",
            SourceKind::AdcpNearSurfaceVelocity => "adcp_near_surface_velocity",
        }
    }
}

impl FromStr for SourceKind {
    type Err = LimnoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "thermochain" => Ok(SourceKind::Thermochain),
            "idronaut" => Ok(SourceKind::Idronaut),
            "adcp_deep_velocity" => Ok(SourceKind::AdcpDeepVelocity),
            "adcp_near_surface_velocity" => Ok(SourceKind::AdcpNearSurfaceVelocity),
            other => Err(LimnoError::UnrecognizedKind {
                what: "dataset type",
                value: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// File format of a Datalakes download.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, Serialize, Deserialize)]
pub enum Datatype {
    Json,
    Nc,
}

impl Datatype {
    pub fn as_str(&self) -> &'static str {
        match self {
            Datatype::Json => "json",
            Datatype::Nc => "nc",
        }
    }
}

impl FromStr for Datatype {
    type Err = LimnoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "json" => Ok(Datatype::Json),
            "nc" => Ok(Datatype::Nc),
            other => Err(LimnoError::UnrecognizedKind {
                what: "datatype (must be either json or nc)",
                value: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for Datatype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
