//! Linear interpolation of a labelled array onto a new axis.

use crate::{
    array::LabelledArray,
    axis::Axis,
    error::{LimnoError, Result},
};

/// A single sample for interpolation
#[derive(Debug, Clone, Copy)]
pub struct DataPoint {
    pub coordinate: f64,
    pub value: f64,
}

/// Linearly interpolate between two samples at `coordinate`.
///
/// If both samples sit at the same coordinate the first one is returned.
pub fn interpolate_pair(start: &DataPoint, end: &DataPoint, coordinate: f64) -> f64 {
    let span = end.coordinate - start.coordinate;
    if span == 0.0 {
        return start.value;
    }
    let fraction = (coordinate - start.coordinate) / span;
    start.value + (end.value - start.value) * fraction
}

/// Interpolate a series at one coordinate. `points` must be sorted by
/// coordinate. Outside the sampled range the result is NaN.
pub fn interpolate_at(points: &[DataPoint], coordinate: f64) -> f64 {
    let (Some(first), Some(last)) = (points.first(), points.last()) else {
        return f64::NAN;
    };
    if coordinate.is_nan() || coordinate < first.coordinate || coordinate > last.coordinate {
        return f64::NAN;
    }
    let upper = points.partition_point(|p| p.coordinate < coordinate);
    if upper < points.len() && points[upper].coordinate == coordinate {
        return points[upper].value;
    }
    if upper == 0 || upper == points.len() {
        return f64::NAN;
    }
    interpolate_pair(&points[upper - 1], &points[upper], coordinate)
}

/// Interpolate `array` onto `target` along the axis of the same name.
///
/// Each 1-D line along that axis is sorted by coordinate before
/// interpolating. Samples at a NaN coordinate are dropped; NaN values take
/// part as-is.
pub fn interp_linear(array: &LabelledArray, target: &Axis) -> Result<LabelledArray> {
    let pos = array.axis_position(&target.name).ok_or_else(|| {
        LimnoError::ShapeMismatch(format!("'{}' has no axis named '{}'", array.name, target.name))
    })?;
    let shape = array.shape();
    let len = shape[pos];
    let outer: usize = shape[..pos].iter().product();
    let inner: usize = shape[pos + 1..].iter().product();
    let source = array.axes()[pos].values();

    let mut order: Vec<usize> = (0..len).filter(|k| !source[*k].is_nan()).collect();
    order.sort_by(|a, b| source[*a].total_cmp(&source[*b]));

    let mut values = vec![f64::NAN; outer * target.len() * inner];
    for o in 0..outer {
        for i in 0..inner {
            let line: Vec<DataPoint> = order
                .iter()
                .map(|k| DataPoint {
                    coordinate: source[*k],
                    value: array.values()[(o * len + k) * inner + i],
                })
                .collect();
            for (t, coordinate) in target.values().iter().enumerate() {
                values[(o * target.len() + t) * inner + i] = interpolate_at(&line, *coordinate);
            }
        }
    }

    let mut axes = array.axes().to_vec();
    axes[pos] = target.clone();
    LabelledArray::new(&array.name, axes, values)
}
