use crate::{
    axis::Axis,
    error::{LimnoError, Result},
    resolve::{resolve_nearest, NearestPolicy},
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A named, row-major numeric array with one [`Axis`] per dimension.
///
/// Values are never mutated after construction; reshaping operations
/// return a new array.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct LabelledArray {
    pub name: String,
    axes: Vec<Axis>,
    values: Vec<f64>,
}

impl LabelledArray {
    /// Build an array, checking that the value count matches the axes.
    pub fn new(name: &str, axes: Vec<Axis>, values: Vec<f64>) -> Result<Self> {
        let expected: usize = axes.iter().map(Axis::len).product();
        if expected != values.len() {
            return Err(LimnoError::ShapeMismatch(format!(
                "'{}' declares {:?} ({} cells) but holds {} values",
                name,
                axes.iter().map(|a| a.name.as_str()).collect::<Vec<_>>(),
                expected,
                values.len()
            )));
        }
        Ok(LabelledArray {
            name: name.to_string(),
            axes,
            values,
        })
    }

    /// Build a 2-D array from nested rows (`rows[i][j]` indexed by the first
    /// and second axis respectively).
    pub fn from_rows(name: &str, first: Axis, second: Axis, rows: &[Vec<f64>]) -> Result<Self> {
        if rows.len() != first.len() || rows.iter().any(|r| r.len() != second.len()) {
            return Err(LimnoError::ShapeMismatch(format!(
                "'{}' rows do not match {}x{}",
                name,
                first.len(),
                second.len()
            )));
        }
        let values = rows.iter().flatten().copied().collect();
        LabelledArray::new(name, vec![first, second], values)
    }

    pub fn axes(&self) -> &[Axis] {
        &self.axes
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn shape(&self) -> Vec<usize> {
        self.axes.iter().map(Axis::len).collect()
    }

    pub fn ndim(&self) -> usize {
        self.axes.len()
    }

    pub fn axis_position(&self, name: &str) -> Option<usize> {
        self.axes.iter().position(|a| a.name == name)
    }

    pub fn axis(&self, name: &str) -> Option<&Axis> {
        self.axes.iter().find(|a| a.name == name)
    }

    fn require_axis(&self, name: &str) -> Result<usize> {
        self.axis_position(name).ok_or_else(|| {
            LimnoError::ShapeMismatch(format!("'{}' has no axis named '{}'", self.name, name))
        })
    }

    /// Row-major strides for the current shape.
    pub(crate) fn strides(&self) -> Vec<usize> {
        strides_for(&self.shape())
    }

    /// Value at a multi-index, `None` when the index is out of bounds.
    pub fn get(&self, index: &[usize]) -> Option<f64> {
        if index.len() != self.axes.len() {
            return None;
        }
        let mut flat = 0;
        for ((i, stride), axis) in index.iter().zip(self.strides()).zip(&self.axes) {
            if *i >= axis.len() {
                return None;
            }
            flat += i * stride;
        }
        self.values.get(flat).copied()
    }

    /// Pick positions `indices` along `axis_pos`, labelling the result with
    /// `new_axis`.
    pub fn gather(&self, axis_pos: usize, indices: &[usize], new_axis: Axis) -> Result<Self> {
        if axis_pos >= self.axes.len() || new_axis.len() != indices.len() {
            return Err(LimnoError::ShapeMismatch(format!(
                "cannot gather {} positions on axis {} of '{}'",
                indices.len(),
                axis_pos,
                self.name
            )));
        }
        let shape = self.shape();
        let len = shape[axis_pos];
        if let Some(bad) = indices.iter().find(|i| **i >= len) {
            return Err(LimnoError::ShapeMismatch(format!(
                "index {} outside axis '{}' of length {}",
                bad, self.axes[axis_pos].name, len
            )));
        }
        let outer: usize = shape[..axis_pos].iter().product();
        let inner: usize = shape[axis_pos + 1..].iter().product();
        let mut values = Vec::with_capacity(outer * indices.len() * inner);
        for o in 0..outer {
            for i in indices {
                let start = (o * len + i) * inner;
                values.extend_from_slice(&self.values[start..start + inner]);
            }
        }
        let mut axes = self.axes.clone();
        axes[axis_pos] = new_axis;
        LabelledArray::new(&self.name, axes, values)
    }

    /// Slice at one position along `axis_pos`, dropping that dimension.
    pub fn take(&self, axis_pos: usize, index: usize) -> Result<Self> {
        let axis = self
            .axes
            .get(axis_pos)
            .ok_or_else(|| LimnoError::ShapeMismatch(format!("'{}' has no axis {}", self.name, axis_pos)))?;
        let label = axis.values().get(index).copied().ok_or_else(|| {
            LimnoError::ShapeMismatch(format!("index {} outside axis '{}'", index, axis.name))
        })?;
        let single = Axis::new(&axis.name, axis.kind, vec![label]);
        let picked = self.gather(axis_pos, &[index], single)?;
        let mut axes = picked.axes;
        axes.remove(axis_pos);
        LabelledArray::new(&self.name, axes, picked.values)
    }

    /// Slice at the sample nearest to `value` along the named axis.
    pub fn select_nearest(&self, axis_name: &str, value: f64, policy: NearestPolicy) -> Result<Self> {
        let pos = self.require_axis(axis_name)?;
        let index = resolve_nearest(&self.axes[pos], value, policy)?;
        self.take(pos, index)
    }

    /// Replace every value equal to `fill` with NaN.
    pub fn mask_fill_value(self, fill: f64) -> Self {
        let values = self
            .values
            .into_iter()
            .map(|v| if v == fill { f64::NAN } else { v })
            .collect();
        LabelledArray { values, ..self }
    }

    pub fn renamed(self, name: &str) -> Self {
        LabelledArray {
            name: name.to_string(),
            ..self
        }
    }
}

pub(crate) fn strides_for(shape: &[usize]) -> Vec<usize> {
    let mut strides = vec![1; shape.len()];
    for i in (0..shape.len().saturating_sub(1)).rev() {
        strides[i] = strides[i + 1] * shape[i + 1];
    }
    strides
}

/// Named variables retrieved together from one source call.
#[derive(Debug, PartialEq, Clone, Default, Serialize, Deserialize)]
pub struct Dataset {
    pub variables: BTreeMap<String, LabelledArray>,
}

impl Dataset {
    pub fn new() -> Self {
        Dataset::default()
    }

    pub fn from_arrays(arrays: Vec<LabelledArray>) -> Self {
        Dataset {
            variables: arrays.into_iter().map(|a| (a.name.clone(), a)).collect(),
        }
    }

    pub fn insert(&mut self, array: LabelledArray) {
        self.variables.insert(array.name.clone(), array);
    }

    pub fn get(&self, name: &str) -> Result<&LabelledArray> {
        self.variables
            .get(name)
            .ok_or_else(|| LimnoError::MissingVariable(name.to_string()))
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }

    /// Nearest slice of one variable at a depth.
    pub fn select_depth(&self, variable: &str, depth: f64) -> Result<LabelledArray> {
        self.get(variable)?.select_nearest("depth", depth, NearestPolicy::Unbounded)
    }

    /// Nearest profile of one variable at an instant (seconds since epoch).
    pub fn select_profile(&self, variable: &str, time: f64) -> Result<LabelledArray> {
        self.get(variable)?.select_nearest("time", time, NearestPolicy::Unbounded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::axis::AxisKind;

    fn depth_time() -> LabelledArray {
        LabelledArray::from_rows(
            "temp",
            Axis::depth(vec![0.0, -1.0, -2.0]),
            Axis::time_from_epoch(vec![0.0, 60.0]),
            &[vec![10.0, 11.0], vec![8.0, 9.0], vec![6.0, 7.0]],
        )
        .unwrap()
    }

    #[test]
    fn test_new_rejects_wrong_count() {
        let result = LabelledArray::new("t", vec![Axis::depth(vec![0.0, 1.0])], vec![1.0]);
        assert!(matches!(result, Err(LimnoError::ShapeMismatch(_))));
    }

    #[test]
    fn test_get_and_shape() {
        let array = depth_time();
        assert_eq!(array.shape(), vec![3, 2]);
        assert_eq!(array.get(&[1, 1]), Some(9.0));
        assert_eq!(array.get(&[3, 0]), None);
    }

    #[test]
    fn test_take_drops_dimension() {
        let array = depth_time();
        let column = array.take(1, 1).unwrap();
        assert_eq!(column.ndim(), 1);
        assert_eq!(column.values(), &[11.0, 9.0, 7.0]);
        assert_eq!(column.axes()[0].name, "depth");

        let row = array.take(0, 2).unwrap();
        assert_eq!(row.values(), &[6.0, 7.0]);
    }

    #[test]
    fn test_gather_repeats_positions() {
        let array = depth_time();
        let target = Axis::new("depth", AxisKind::Depth, vec![-0.1, -0.2, -1.9]);
        let gathered = array.gather(0, &[0, 0, 2], target).unwrap();
        assert_eq!(gathered.values(), &[10.0, 11.0, 10.0, 11.0, 6.0, 7.0]);
    }

    #[test]
    fn test_select_depth_uses_nearest() {
        let dataset = Dataset::from_arrays(vec![depth_time()]);
        let series = dataset.select_depth("temp", -1.2).unwrap();
        assert_eq!(series.values(), &[8.0, 9.0]);
        let profile = dataset.select_profile("temp", 50.0).unwrap();
        assert_eq!(profile.values(), &[11.0, 9.0, 7.0]);
        assert!(matches!(
            dataset.select_depth("salinity", 0.0),
            Err(LimnoError::MissingVariable(_))
        ));
    }

    #[test]
    fn test_mask_fill_value() {
        let array = LabelledArray::new("t", vec![Axis::depth(vec![0.0, 1.0])], vec![-999.0, 4.0])
            .unwrap()
            .mask_fill_value(-999.0);
        assert!(array.values()[0].is_nan());
        assert_eq!(array.values()[1], 4.0);
    }
}
