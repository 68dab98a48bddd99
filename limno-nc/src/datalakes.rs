//! ADCP velocity files published by Datalakes in NetCDF form.

use crate::reader::NcFile;
use limno_data::{
    axis::{Axis, AxisKind},
    error::{LimnoError, Result},
    interpolation::interp_linear,
    merge::merge_datasets,
    Dataset,
};
use log::info;
use std::{fs, path::Path};

/// Velocity components kept from a file.
pub const VELOCITY_VARIABLES: [&str; 2] = ["u", "v"];

/// Depths velocity files are interpolated onto: -2.05 m in 0.25 m steps
/// while below 7.8 m.
pub fn velocity_depths() -> Axis {
    Axis::arange("depth", AxisKind::Depth, -2.05, 7.8, 0.25)
}

/// `u` and `v` from one file, on the file's own axes.
pub fn read_velocity(path: &Path) -> Result<Dataset> {
    let file = NcFile::open(path)?;
    let arrays = VELOCITY_VARIABLES
        .iter()
        .map(|name| file.read_labelled(name))
        .collect::<Result<Vec<_>>>()?;
    Ok(Dataset::from_arrays(arrays))
}

/// Linearly interpolate every variable onto `depths`.
pub fn interpolate_depths(dataset: &Dataset, depths: &Axis) -> Result<Dataset> {
    let arrays = dataset
        .variables
        .values()
        .map(|array| interp_linear(array, depths))
        .collect::<Result<Vec<_>>>()?;
    Ok(Dataset::from_arrays(arrays))
}

/// Read one file and interpolate it onto [`velocity_depths`].
pub fn read_velocity_on_standard_depths(path: &Path) -> Result<Dataset> {
    interpolate_depths(&read_velocity(path)?, &velocity_depths())
}

/// Merge the velocity of every `*.nc` file in `dir`.
pub fn parse_nc_folder(dir: &Path) -> Result<Dataset> {
    let mut paths = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.extension().is_some_and(|ext| ext == "nc"))
        .collect::<Vec<_>>();
    if paths.is_empty() {
        return Err(LimnoError::EmptyResult(format!(
            "No NetCDF files found in directory {}",
            dir.display()
        )));
    }
    paths.sort();
    let datasets = paths
        .iter()
        .map(|p| read_velocity(p))
        .collect::<Result<Vec<_>>>()?;
    info!("Merging {} NetCDF files from {}", datasets.len(), dir.display());
    merge_datasets(&datasets)
}

#[cfg(test)]
mod tests {
    use super::*;
    use limno_data::LabelledArray;

    #[test]
    fn test_velocity_depths() {
        let depths = velocity_depths();
        assert_eq!(depths.len(), 40);
        assert!((depths.values()[0] + 2.05).abs() < 1e-9);
        assert!((depths.values()[39] - 7.7).abs() < 1e-9);
    }

    #[test]
    fn test_interpolate_depths_keeps_every_variable() {
        let u = LabelledArray::from_rows(
            "u",
            Axis::depth(vec![0.0, 1.0]),
            Axis::time_from_epoch(vec![0.0]),
            &[vec![0.0], vec![1.0]],
        )
        .unwrap();
        let v = u.clone().renamed("v");
        let dataset = Dataset::from_arrays(vec![u, v]);
        let target = Axis::depth(vec![0.25, 2.0]);
        let result = interpolate_depths(&dataset, &target).unwrap();
        let u = result.get("u").unwrap();
        assert_eq!(u.values()[0], 0.25);
        assert!(u.values()[1].is_nan());
        assert!(result.get("v").is_ok());
    }

    #[test]
    fn test_empty_folder() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(parse_nc_folder(dir.path()), Err(LimnoError::EmptyResult(_))));
    }
}
