//! Thin layer over the netcdf crate that yields labelled arrays.

#[cfg(feature = "netcdf")]
use limno_data::axis::Axis;
use limno_data::{
    axis::AxisKind,
    error::{LimnoError, Result},
    LabelledArray,
};
use std::path::Path;

/// Kind inferred from a dimension or coordinate name.
pub fn kind_for(name: &str) -> AxisKind {
    match name.to_ascii_lowercase().as_str() {
        "time" => AxisKind::Time,
        "depth" | "z" | "zc" | "zk_lyr" | "kmaxout" | "kmaxout_restr" => AxisKind::Depth,
        "x" | "y" | "m" | "n" | "lat" | "lon" | "latitude" | "longitude" => AxisKind::Spatial,
        _ => AxisKind::Other,
    }
}

/// An open NetCDF file.
#[cfg(feature = "netcdf")]
pub struct NcFile {
    inner: netcdf::File,
    path: String,
}

#[cfg(feature = "netcdf")]
impl NcFile {
    pub fn open(path: &Path) -> Result<Self> {
        let inner = netcdf::open(path)
            .map_err(|e| LimnoError::NetCdf(format!("Unable to open netCDF file {}: {}", path.display(), e)))?;
        Ok(NcFile {
            inner,
            path: path.display().to_string(),
        })
    }

    pub fn has_variable(&self, name: &str) -> bool {
        self.inner.variable(name).is_some()
    }

    /// All values of a variable, flattened row-major, with its shape.
    pub fn read(&self, name: &str) -> Result<(Vec<f64>, Vec<usize>)> {
        let var = self
            .inner
            .variable(name)
            .ok_or_else(|| LimnoError::MissingVariable(format!("{} in {}", name, self.path)))?;
        let shape = var.dimensions().iter().map(|d| d.len()).collect();
        let values = var
            .get_values::<f64, _>(..)
            .map_err(|e| LimnoError::NetCdf(format!("reading {} from {}: {}", name, self.path, e)))?;
        Ok((values, shape))
    }

    pub fn read_flat(&self, name: &str) -> Result<Vec<f64>> {
        Ok(self.read(name)?.0)
    }

    /// A variable as a labelled array. Dimensions with a coordinate
    /// variable of the same name take its values; others are labelled by
    /// position.
    pub fn read_labelled(&self, name: &str) -> Result<LabelledArray> {
        let var = self
            .inner
            .variable(name)
            .ok_or_else(|| LimnoError::MissingVariable(format!("{} in {}", name, self.path)))?;
        let mut axes = Vec::new();
        for dim in var.dimensions() {
            let dim_name = dim.name();
            let labels = if dim_name != name && self.has_variable(&dim_name) {
                self.read_flat(&dim_name)?
            } else {
                (0..dim.len()).map(|i| i as f64).collect()
            };
            axes.push(Axis::new(&dim_name, kind_for(&dim_name), labels));
        }
        let values = var
            .get_values::<f64, _>(..)
            .map_err(|e| LimnoError::NetCdf(format!("reading {} from {}: {}", name, self.path, e)))?;
        LabelledArray::new(name, axes, values)
    }
}

/// Placeholder used when the crate is built without libnetcdf.
#[cfg(not(feature = "netcdf"))]
pub struct NcFile;

#[cfg(not(feature = "netcdf"))]
impl NcFile {
    pub fn open(_path: &Path) -> Result<Self> {
        Err(LimnoError::FeatureDisabled("netcdf"))
    }

    pub fn has_variable(&self, _name: &str) -> bool {
        false
    }

    pub fn read(&self, _name: &str) -> Result<(Vec<f64>, Vec<usize>)> {
        Err(LimnoError::FeatureDisabled("netcdf"))
    }

    pub fn read_flat(&self, _name: &str) -> Result<Vec<f64>> {
        Err(LimnoError::FeatureDisabled("netcdf"))
    }

    pub fn read_labelled(&self, _name: &str) -> Result<LabelledArray> {
        Err(LimnoError::FeatureDisabled("netcdf"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_for_common_names() {
        assert_eq!(kind_for("time"), AxisKind::Time);
        assert_eq!(kind_for("ZK_LYR"), AxisKind::Depth);
        assert_eq!(kind_for("lon"), AxisKind::Spatial);
        assert_eq!(kind_for("salinity"), AxisKind::Other);
    }

    #[cfg(not(feature = "netcdf"))]
    #[test]
    fn test_open_without_feature() {
        assert!(matches!(
            NcFile::open(Path::new("missing.nc")),
            Err(LimnoError::FeatureDisabled("netcdf"))
        ));
    }
}
