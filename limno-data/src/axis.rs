use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// What an axis measures. Time axes store seconds since the Unix epoch.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, Serialize, Deserialize)]
pub enum AxisKind {
    Time,
    Depth,
    Spatial,
    Other,
}

/// Ordered coordinate values along one dimension of a labelled array.
///
/// Values are kept in the order the source delivered them; nothing here
/// sorts or deduplicates on construction.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct Axis {
    pub name: String,
    pub kind: AxisKind,
    values: Vec<f64>,
}

impl Axis {
    pub fn new(name: &str, kind: AxisKind, values: Vec<f64>) -> Self {
        Axis {
            name: name.to_string(),
            kind,
            values,
        }
    }

    /// Depth axis in metres (negative below the surface by convention).
    pub fn depth(values: Vec<f64>) -> Self {
        Axis::new("depth", AxisKind::Depth, values)
    }

    /// Time axis from UTC instants.
    pub fn time(instants: &[DateTime<Utc>]) -> Self {
        let values = instants.iter().map(epoch_seconds).collect();
        Axis::new("time", AxisKind::Time, values)
    }

    /// Time axis from raw seconds since the Unix epoch.
    pub fn time_from_epoch(seconds: Vec<f64>) -> Self {
        Axis::new("time", AxisKind::Time, seconds)
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Interpret the values as instants. Values that do not map onto a
    /// representable instant are dropped.
    pub fn timestamps(&self) -> Vec<DateTime<Utc>> {
        self.values.iter().filter_map(|s| from_epoch_seconds(*s)).collect()
    }

    /// Same axis with every value multiplied by -1 (depth sign flips).
    pub fn negated(&self) -> Axis {
        Axis {
            name: self.name.clone(),
            kind: self.kind,
            values: self.values.iter().map(|v| normalize_zero(-v)).collect(),
        }
    }

    /// Evenly spaced axis `start + step * k` for every value strictly
    /// before `stop` (half-open, like a numeric arange).
    pub fn arange(name: &str, kind: AxisKind, start: f64, stop: f64, step: f64) -> Self {
        let mut values = Vec::new();
        if step != 0.0 {
            let count = ((stop - start) / step).ceil();
            if count > 0.0 {
                for k in 0..count as usize {
                    values.push(start + step * k as f64);
                }
            }
        }
        Axis::new(name, kind, values)
    }
}

/// Seconds since the Unix epoch, with sub-second precision.
pub fn epoch_seconds(instant: &DateTime<Utc>) -> f64 {
    instant.timestamp() as f64 + f64::from(instant.timestamp_subsec_nanos()) * 1e-9
}

pub fn from_epoch_seconds(seconds: f64) -> Option<DateTime<Utc>> {
    if !seconds.is_finite() {
        return None;
    }
    let whole = seconds.floor();
    let nanos = ((seconds - whole) * 1e9).round() as u32;
    Utc.timestamp_opt(whole as i64, nanos.min(999_999_999)).single()
}

/// Collapse -0.0 onto 0.0 so coordinate labels compare by bit pattern.
pub(crate) fn normalize_zero(v: f64) -> f64 {
    if v == 0.0 {
        0.0
    } else {
        v
    }
}

/// Bit-pattern key used for label lookups.
pub(crate) fn label_key(v: f64) -> u64 {
    normalize_zero(v).to_bits()
}
