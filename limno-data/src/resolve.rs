//! Nearest-sample resolution along an axis or over a 2-D coordinate grid.
//!
//! The bounded form extrapolates one step past each end of the axis and
//! rejects anything beyond. The lower bound is taken from the two extremes
//! (`2 * min - max`) rather than the two smallest samples; callers rely on
//! that exact window, so it is kept as is.

use crate::{
    axis::{epoch_seconds, Axis},
    error::{LimnoError, Result, Side},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Out-of-range behaviour of a nearest lookup.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Default, Serialize, Deserialize)]
pub enum NearestPolicy {
    /// Reject values past the linearly extrapolated axis ends.
    #[default]
    Extrapolated,
    /// Always return the closest sample.
    Unbounded,
}

/// A target coordinate along one axis plus its tolerance policy.
#[derive(Debug, PartialEq, Clone, Copy)]
pub struct Query {
    pub value: f64,
    pub policy: NearestPolicy,
}

impl Query {
    pub fn nearest(value: f64) -> Self {
        Query {
            value,
            policy: NearestPolicy::Extrapolated,
        }
    }

    pub fn unbounded(value: f64) -> Self {
        Query {
            value,
            policy: NearestPolicy::Unbounded,
        }
    }

    pub fn at_time(instant: &DateTime<Utc>, policy: NearestPolicy) -> Self {
        Query {
            value: epoch_seconds(instant),
            policy,
        }
    }

    pub fn index_in(&self, axis: &Axis) -> Result<usize> {
        resolve_nearest(axis, self.value, self.policy)
    }
}

/// Index of the sample of `axis` closest to `value`.
pub fn resolve_nearest(axis: &Axis, value: f64, policy: NearestPolicy) -> Result<usize> {
    resolve_in(axis.values(), value, policy).map_err(|e| match e {
        LimnoError::EmptyAxis(_) => LimnoError::EmptyAxis(axis.name.clone()),
        other => other,
    })
}

/// Slice form of [`resolve_nearest`].
///
/// A single-sample axis always resolves to 0. Ties go to the lowest index.
pub fn resolve_in(values: &[f64], value: f64, policy: NearestPolicy) -> Result<usize> {
    match values.len() {
        0 => return Err(LimnoError::EmptyAxis(String::new())),
        1 => return Ok(0),
        _ => {}
    }
    if policy == NearestPolicy::Extrapolated {
        let mut sorted = values.to_vec();
        sorted.sort_by(f64::total_cmp);
        let n = sorted.len();
        let upper = 2.0 * sorted[n - 1] - sorted[n - 2];
        let lower = 2.0 * sorted[0] - sorted[n - 1];
        if value > upper {
            return Err(LimnoError::OutOfRange {
                value,
                bound: upper,
                nearest: sorted[n - 1],
                side: Side::Above,
            });
        }
        if value < lower {
            return Err(LimnoError::OutOfRange {
                value,
                bound: lower,
                nearest: sorted[0],
                side: Side::Below,
            });
        }
    }
    Ok(argmin_distance(values, value))
}

fn argmin_distance(values: &[f64], value: f64) -> usize {
    let mut best = 0;
    let mut best_distance = (values[0] - value).abs();
    for (i, v) in values.iter().enumerate().skip(1) {
        let distance = (v - value).abs();
        // NaN distances never win; a NaN in slot 0 is replaced by the first real one
        if distance < best_distance || (best_distance.is_nan() && !distance.is_nan()) {
            best = i;
            best_distance = distance;
        }
    }
    best
}

/// Index of the timestamp closest to `target`, without bounds.
pub fn closest_time_index(timestamps: &[DateTime<Utc>], target: &DateTime<Utc>) -> Result<usize> {
    let seconds: Vec<f64> = timestamps.iter().map(epoch_seconds).collect();
    resolve_in(&seconds, epoch_seconds(target), NearestPolicy::Unbounded)
        .map_err(|_| LimnoError::EmptyAxis("time".to_string()))
}

/// A 2-D field of coordinates (e.g. cell-centre eastings) in row-major order.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct CoordinateGrid {
    pub rows: usize,
    pub cols: usize,
    values: Vec<f64>,
}

impl CoordinateGrid {
    pub fn new(rows: usize, cols: usize, values: Vec<f64>) -> Result<Self> {
        if rows * cols != values.len() {
            return Err(LimnoError::ShapeMismatch(format!(
                "grid {}x{} holds {} values",
                rows,
                cols,
                values.len()
            )));
        }
        Ok(CoordinateGrid { rows, cols, values })
    }

    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self> {
        let cols = rows.first().map_or(0, Vec::len);
        if rows.iter().any(|r| r.len() != cols) {
            return Err(LimnoError::ShapeMismatch("ragged coordinate grid".to_string()));
        }
        CoordinateGrid::new(rows.len(), cols, rows.iter().flatten().copied().collect())
    }

    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        if row < self.rows && col < self.cols {
            self.values.get(row * self.cols + col).copied()
        } else {
            None
        }
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }
}

/// `(row, col)` of the cell whose `(x, y)` is closest to the target.
///
/// Brute-force row-major scan over squared Euclidean distance; the first
/// cell wins ties. There is no bound check.
pub fn resolve_grid(x: &CoordinateGrid, y: &CoordinateGrid, tx: f64, ty: f64) -> Result<(usize, usize)> {
    if x.rows != y.rows || x.cols != y.cols {
        return Err(LimnoError::ShapeMismatch(format!(
            "x grid is {}x{} but y grid is {}x{}",
            x.rows, x.cols, y.rows, y.cols
        )));
    }
    let mut closest: Option<((usize, usize), f64)> = None;
    for n in 0..x.rows {
        for m in 0..x.cols {
            let i = n * x.cols + m;
            let distance = (x.values[i] - tx).powi(2) + (y.values[i] - ty).powi(2);
            if distance.is_nan() {
                continue;
            }
            match closest {
                Some((_, best)) if distance >= best => {}
                _ => closest = Some(((n, m), distance)),
            }
        }
    }
    closest.map(|(index, _)| index).ok_or(LimnoError::EmptyGrid)
}
