//! Combining fragments retrieved from independent source calls.
//!
//! Three contracts live here:
//! - [`concat_along`]: stitch time-chunked fragments end to end, in arrival
//!   order, after checking every other axis has the same cardinality.
//! - [`reindex_nearest`]: snap a fragment onto a canonical axis, one
//!   nearest lookup per target sample.
//! - [`merge_arrays`] / [`merge_datasets`]: label-union merge over sorted
//!   labels where the earliest fragment holding a cell keeps it.

use crate::{
    array::{strides_for, Dataset, LabelledArray},
    axis::{label_key, Axis},
    error::{LimnoError, Result},
    resolve::{resolve_nearest, NearestPolicy},
};
use log::debug;
use std::collections::{BTreeMap, HashMap, HashSet};

/// Concatenate fragments along `axis_name`.
///
/// The first fragment's remaining axes are adopted as canonical. Repeated
/// labels along the concatenation axis are kept.
pub fn concat_along(fragments: &[LabelledArray], axis_name: &str) -> Result<LabelledArray> {
    let first = fragments
        .first()
        .ok_or_else(|| LimnoError::EmptyResult("no fragments to concatenate".to_string()))?;
    let pos = first.axis_position(axis_name).ok_or_else(|| {
        LimnoError::ShapeMismatch(format!("'{}' has no axis named '{}'", first.name, axis_name))
    })?;

    for fragment in &fragments[1..] {
        if fragment.ndim() != first.ndim() || fragment.axis_position(axis_name) != Some(pos) {
            return Err(LimnoError::ShapeMismatch(format!(
                "fragment '{}' does not share the layout of '{}'",
                fragment.name, first.name
            )));
        }
        for (i, (ours, theirs)) in first.axes().iter().zip(fragment.axes()).enumerate() {
            if i != pos && ours.len() != theirs.len() {
                return Err(LimnoError::InconsistentAxis {
                    axis: ours.name.clone(),
                    expected: ours.len(),
                    found: theirs.len(),
                });
            }
        }
    }

    let shape = first.shape();
    let outer: usize = shape[..pos].iter().product();
    let inner: usize = shape[pos + 1..].iter().product();
    let total: usize = fragments.iter().map(|f| f.values().len()).sum();

    let mut values = Vec::with_capacity(total);
    for o in 0..outer {
        for fragment in fragments {
            let block = fragment.shape()[pos] * inner;
            values.extend_from_slice(&fragment.values()[o * block..(o + 1) * block]);
        }
    }

    let labels: Vec<f64> = fragments
        .iter()
        .flat_map(|f| f.axes()[pos].values().to_vec())
        .collect();
    let template = &first.axes()[pos];
    let mut axes = first.axes().to_vec();
    axes[pos] = Axis::new(&template.name, template.kind, labels);

    debug!("concatenated {} fragments of '{}' along {}", fragments.len(), first.name, axis_name);
    LabelledArray::new(&first.name, axes, values)
}

/// Concatenate time-chunked fragments that share a depth grid.
pub fn concat_time(fragments: &[LabelledArray]) -> Result<LabelledArray> {
    concat_along(fragments, "time")
}

/// Snap `array` onto `target` along the axis of the same name.
pub fn reindex_nearest(array: &LabelledArray, target: &Axis, policy: NearestPolicy) -> Result<LabelledArray> {
    let pos = array.axis_position(&target.name).ok_or_else(|| {
        LimnoError::ShapeMismatch(format!("'{}' has no axis named '{}'", array.name, target.name))
    })?;
    let source = &array.axes()[pos];
    let indices = target
        .values()
        .iter()
        .map(|v| resolve_nearest(source, *v, policy))
        .collect::<Result<Vec<usize>>>()?;
    array.gather(pos, &indices, target.clone())
}

/// Reindex every variable of a dataset onto `target`.
pub fn reindex_dataset(dataset: &Dataset, target: &Axis, policy: NearestPolicy) -> Result<Dataset> {
    let arrays = dataset
        .variables
        .values()
        .map(|a| reindex_nearest(a, target, policy))
        .collect::<Result<Vec<_>>>()?;
    Ok(Dataset::from_arrays(arrays))
}

/// Union of axis labels plus a lookup from label to slot.
///
/// Identical axes are kept as they are; any other union is sorted ascending.
fn union_axis(axes: &[&Axis]) -> (Axis, HashMap<u64, usize>) {
    let first = axes[0];
    let mut seen = HashSet::new();
    let mut labels: Vec<f64> = axes
        .iter()
        .flat_map(|a| a.values().iter().copied())
        .filter(|v| seen.insert(label_key(*v)))
        .collect();
    if axes.iter().any(|a| a.values() != first.values()) {
        labels.sort_by(f64::total_cmp);
    }
    let slots = labels.iter().enumerate().map(|(i, v)| (label_key(*v), i)).collect();
    (Axis::new(&first.name, first.kind, labels), slots)
}

/// Label-union merge of arrays sharing the same axis names.
///
/// Cells absent from every fragment are NaN. A cell already filled by an
/// earlier fragment is not overwritten; NaN counts as absent.
pub fn merge_arrays(arrays: &[&LabelledArray]) -> Result<LabelledArray> {
    let first = arrays
        .first()
        .ok_or_else(|| LimnoError::EmptyResult("no fragments to merge".to_string()))?;
    let names: Vec<&str> = first.axes().iter().map(|a| a.name.as_str()).collect();
    for array in &arrays[1..] {
        let theirs: Vec<&str> = array.axes().iter().map(|a| a.name.as_str()).collect();
        if theirs != names {
            return Err(LimnoError::ShapeMismatch(format!(
                "cannot merge '{}' over {:?} with {:?}",
                first.name, names, theirs
            )));
        }
    }

    let mut union_axes = Vec::with_capacity(names.len());
    let mut slot_maps = Vec::with_capacity(names.len());
    for d in 0..names.len() {
        let axes: Vec<&Axis> = arrays.iter().map(|a| &a.axes()[d]).collect();
        let (axis, slots) = union_axis(&axes);
        union_axes.push(axis);
        slot_maps.push(slots);
    }

    let shape: Vec<usize> = union_axes.iter().map(Axis::len).collect();
    let strides = strides_for(&shape);
    let mut values = vec![f64::NAN; shape.iter().product()];

    for array in arrays {
        let local_shape = array.shape();
        let local_strides = strides_for(&local_shape);
        // slot of each local position, per dimension
        let mapping: Vec<Vec<usize>> = array
            .axes()
            .iter()
            .zip(&slot_maps)
            .map(|(axis, slots)| axis.values().iter().map(|v| slots[&label_key(*v)]).collect())
            .collect();
        for (flat, value) in array.values().iter().enumerate() {
            if value.is_nan() {
                continue;
            }
            let mut target = 0;
            for d in 0..local_shape.len() {
                let i = (flat / local_strides[d]) % local_shape[d];
                target += mapping[d][i] * strides[d];
            }
            if values[target].is_nan() {
                values[target] = *value;
            }
        }
    }

    LabelledArray::new(&first.name, union_axes, values)
}

/// Merge datasets variable by variable, in fragment-arrival order.
pub fn merge_datasets(datasets: &[Dataset]) -> Result<Dataset> {
    if datasets.is_empty() {
        return Err(LimnoError::EmptyResult("no datasets to merge".to_string()));
    }
    let mut grouped: BTreeMap<&str, Vec<&LabelledArray>> = BTreeMap::new();
    for dataset in datasets {
        for (name, array) in &dataset.variables {
            grouped.entry(name.as_str()).or_default().push(array);
        }
    }
    let arrays = grouped
        .values()
        .map(|group| merge_arrays(group))
        .collect::<Result<Vec<_>>>()?;
    debug!("merged {} datasets into {} variables", datasets.len(), arrays.len());
    Ok(Dataset::from_arrays(arrays))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::axis::AxisKind;

    fn fragment(depths: &[f64], times: &[f64], rows: &[Vec<f64>]) -> LabelledArray {
        LabelledArray::from_rows(
            "temp",
            Axis::depth(depths.to_vec()),
            Axis::time_from_epoch(times.to_vec()),
            rows,
        )
        .unwrap()
    }

    #[test]
    fn test_concat_time_keeps_arrival_order() {
        let a = fragment(&[0.0, -1.0], &[100.0, 200.0], &[vec![1.0, 2.0], vec![3.0, 4.0]]);
        let b = fragment(&[0.0, -1.0], &[50.0], &[vec![5.0], vec![6.0]]);
        let merged = concat_time(&[a, b]).unwrap();
        assert_eq!(merged.axis("time").unwrap().values(), &[100.0, 200.0, 50.0]);
        assert_eq!(merged.values(), &[1.0, 2.0, 5.0, 3.0, 4.0, 6.0]);
        assert_eq!(merged.axis("depth").unwrap().values(), &[0.0, -1.0]);
    }

    #[test]
    fn test_concat_time_keeps_repeated_timestamps() {
        let a = fragment(&[0.0], &[100.0], &[vec![1.0]]);
        let merged = concat_time(&[a.clone(), a]).unwrap();
        assert_eq!(merged.axis("time").unwrap().values(), &[100.0, 100.0]);
    }

    #[test]
    fn test_concat_time_rejects_depth_mismatch() {
        let a = fragment(&[0.0, -1.0], &[100.0], &[vec![1.0], vec![2.0]]);
        let b = fragment(&[0.0], &[200.0], &[vec![3.0]]);
        assert!(matches!(
            concat_time(&[a, b]),
            Err(LimnoError::InconsistentAxis { expected: 2, found: 1, .. })
        ));
    }

    #[test]
    fn test_concat_time_adopts_first_depths() {
        let a = fragment(&[0.0, -1.0], &[100.0], &[vec![1.0], vec![2.0]]);
        let b = fragment(&[0.0, -1.1], &[200.0], &[vec![3.0], vec![4.0]]);
        let merged = concat_time(&[a, b]).unwrap();
        assert_eq!(merged.axis("depth").unwrap().values(), &[0.0, -1.0]);
    }

    #[test]
    fn test_concat_one_dimensional_series() {
        let a = LabelledArray::new("T", vec![Axis::time_from_epoch(vec![1.0, 2.0])], vec![4.0, 5.0]).unwrap();
        let b = LabelledArray::new("T", vec![Axis::time_from_epoch(vec![3.0])], vec![6.0]).unwrap();
        let merged = concat_time(&[a, b]).unwrap();
        assert_eq!(merged.values(), &[4.0, 5.0, 6.0]);
    }

    #[test]
    fn test_concat_nothing_is_empty_result() {
        assert!(matches!(concat_time(&[]), Err(LimnoError::EmptyResult(_))));
    }

    #[test]
    fn test_reindex_nearest_onto_canonical_depths() {
        let raw = fragment(&[-0.5, -1.0, -1.5], &[0.0], &[vec![10.0], vec![9.0], vec![8.0]]);
        let canonical = Axis::new("depth", AxisKind::Depth, vec![0.0, -0.9, -1.4, -3.0]);
        let snapped = reindex_nearest(&raw, &canonical, NearestPolicy::Unbounded).unwrap();
        assert_eq!(snapped.values(), &[10.0, 9.0, 8.0, 8.0]);
        assert_eq!(snapped.axis("depth").unwrap(), &canonical);
        assert!(reindex_nearest(&raw, &canonical, NearestPolicy::Extrapolated).is_err());
    }

    #[test]
    fn test_merge_with_itself_is_identity() {
        let a = fragment(&[0.0, -1.0], &[100.0, 200.0], &[vec![1.0, 2.0], vec![3.0, 4.0]]);
        let merged = merge_arrays(&[&a, &a]).unwrap();
        assert_eq!(merged, a);
    }

    #[test]
    fn test_merge_union_fills_absent_cells() {
        let a = fragment(&[0.0, -1.0], &[100.0], &[vec![1.0], vec![2.0]]);
        let b = fragment(&[-1.0, -2.0], &[100.0, 200.0], &[vec![9.0, 5.0], vec![6.0, 7.0]]);
        let merged = merge_arrays(&[&a, &b]).unwrap();
        assert_eq!(merged.axis("depth").unwrap().values(), &[-2.0, -1.0, 0.0]);
        assert_eq!(merged.axis("time").unwrap().values(), &[100.0, 200.0]);
        let v = merged.values();
        assert_eq!(&v[..4], &[6.0, 7.0, 2.0, 5.0]);
        // overlap at (depth -1, time 100) keeps the earliest fragment
        assert_eq!(v[2], 2.0);
        assert_eq!(v[4], 1.0);
        assert!(v[5].is_nan());
    }

    #[test]
    fn test_merge_sorts_out_of_order_fragments() {
        let later = fragment(&[0.0], &[200.0], &[vec![2.0]]);
        let earlier = fragment(&[0.0], &[100.0], &[vec![1.0]]);
        let merged = merge_arrays(&[&later, &earlier]).unwrap();
        assert_eq!(merged.axis("time").unwrap().values(), &[100.0, 200.0]);
        assert_eq!(merged.values(), &[1.0, 2.0]);
    }

    #[test]
    fn test_merge_nan_counts_as_absent() {
        let a = fragment(&[0.0], &[100.0], &[vec![f64::NAN]]);
        let b = fragment(&[0.0], &[100.0], &[vec![3.0]]);
        let merged = merge_arrays(&[&a, &b]).unwrap();
        assert_eq!(merged.values(), &[3.0]);
    }

    #[test]
    fn test_merge_datasets_by_variable() {
        let u = fragment(&[0.0], &[100.0], &[vec![1.0]]).renamed("u");
        let v = fragment(&[0.0], &[100.0], &[vec![2.0]]).renamed("v");
        let later_u = fragment(&[0.0], &[200.0], &[vec![3.0]]).renamed("u");
        let merged = merge_datasets(&[
            Dataset::from_arrays(vec![u, v]),
            Dataset::from_arrays(vec![later_u]),
        ])
        .unwrap();
        assert_eq!(merged.get("u").unwrap().values(), &[1.0, 3.0]);
        assert_eq!(merged.get("v").unwrap().values(), &[2.0]);
    }
}
