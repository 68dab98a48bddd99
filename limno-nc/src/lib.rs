//! NetCDF access for model output and downloaded measurement files.
//!
//! The in-memory extraction logic is always compiled; reading actual
//! files needs the `netcdf` feature (and libnetcdf on the build host).
//! Without it every file-opening function fails with
//! `LimnoError::FeatureDisabled`.

pub mod datalakes;
pub mod delft3d;
pub mod mitgcm;
pub mod reader;
