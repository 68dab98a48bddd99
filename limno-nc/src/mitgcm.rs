//! MITgcm output converted to one NetCDF file per model iteration.
//!
//! Every file carries the grid (`x`, `y`, level index `z`, vertical
//! coordinate `zc` shaped `(z, y, x)`) next to the prognostic fields, so
//! the grid is read from the first iteration and reused for the rest.

use crate::reader::NcFile;
use limno_data::{
    error::{LimnoError, Result},
    resolve::CoordinateGrid,
    LabelledArray,
};
use log::debug;
use std::{
    fmt,
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};

/// Placeholder replaced by the iteration label in a file-name pattern.
pub const ITER_PLACEHOLDER: &str = "{iter}";

/// Width iteration numbers are zero-padded to in file names.
pub const ITER_WIDTH: usize = 10;

pub fn iteration_label(iteration: u64) -> String {
    format!("{:0width$}", iteration, width = ITER_WIDTH)
}

/// File holding `iteration` for a pattern such as `run/output_{iter}.nc`.
pub fn file_for(namespec: &str, iteration: &str) -> PathBuf {
    PathBuf::from(namespec.replace(ITER_PLACEHOLDER, iteration))
}

/// Iterations for which a file matching `namespec` exists, sorted
/// numerically. The label is the last ten characters of the file stem.
pub fn discover_iterations(namespec: &str) -> Result<Vec<String>> {
    let pattern = Path::new(namespec);
    let file_pattern = pattern
        .file_name()
        .map(|f| f.to_string_lossy().to_string())
        .unwrap_or_default();
    let (prefix, suffix) = file_pattern.split_once(ITER_PLACEHOLDER).ok_or_else(|| {
        LimnoError::UnrecognizedKind {
            what: "file name pattern (missing {iter})",
            value: namespec.to_string(),
        }
    })?;
    let dir = match pattern.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };

    let mut found = Vec::new();
    for entry in fs::read_dir(&dir)? {
        let path = entry?.path();
        let Some(name) = path.file_name().map(|n| n.to_string_lossy().to_string()) else {
            continue;
        };
        if name.len() < prefix.len() + suffix.len() || !name.starts_with(prefix) || !name.ends_with(suffix) {
            continue;
        }
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();
        let label: String = stem.chars().skip(stem.chars().count().saturating_sub(ITER_WIDTH)).collect();
        match label.parse::<u64>() {
            Ok(number) => found.push((number, label)),
            Err(_) => debug!("Ignoring {} (no iteration number)", path.display()),
        }
    }
    if found.is_empty() {
        return Err(LimnoError::EmptyResult(format!("No files match {}", namespec)));
    }
    found.sort_by_key(|(number, _)| *number);
    Ok(found.into_iter().map(|(_, label)| label).collect())
}

/// Axis a constant slice is taken along.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum CutAxis {
    X,
    Y,
    Z,
}

impl CutAxis {
    /// Position of this axis in a `(z, y, x)` cube.
    pub fn array_axis(&self) -> usize {
        match self {
            CutAxis::X => 2,
            CutAxis::Y => 1,
            CutAxis::Z => 0,
        }
    }

    /// `(horizontal, vertical)` labels of the resulting section.
    pub fn plot_labels(&self) -> (&'static str, &'static str) {
        match self {
            CutAxis::X => ("y", "z"),
            CutAxis::Y => ("x", "z"),
            CutAxis::Z => ("x", "y"),
        }
    }

    /// Velocity variables lying in the section plane.
    pub fn velocity_components(&self) -> (&'static str, &'static str) {
        match self {
            CutAxis::X => ("V", "W"),
            CutAxis::Y => ("U", "W"),
            CutAxis::Z => ("U", "V"),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CutAxis::X => "x",
            CutAxis::Y => "y",
            CutAxis::Z => "z",
        }
    }
}

impl FromStr for CutAxis {
    type Err = LimnoError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "x" => Ok(CutAxis::X),
            "y" => Ok(CutAxis::Y),
            "z" => Ok(CutAxis::Z),
            other => Err(LimnoError::UnrecognizedKind {
                what: "cut axis (must be x, y or z)",
                value: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for CutAxis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Model grid shared by every iteration of a run.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelGrid {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    /// Level numbers
    pub z: Vec<f64>,
    /// Vertical coordinate, row-major `(z, y, x)`.
    pub zc: Vec<f64>,
    /// Water depth per column, `(y, x)`.
    pub bathymetry: Option<CoordinateGrid>,
}

/// Where and how a cube is cut for display.
#[derive(Debug, Clone, PartialEq)]
pub struct SlicePlan {
    pub axis: CutAxis,
    pub index: usize,
    pub cut_val: f64,
    /// Coordinate of each section column.
    pub horizontal: Vec<f64>,
    /// Vertical coordinate of each section cell.
    pub vertical: CoordinateGrid,
    /// Cells under the bed, row-major over the section.
    pub land: Option<Vec<bool>>,
}

impl ModelGrid {
    fn zc_at(&self, k: usize, j: usize, i: usize) -> f64 {
        self.zc[(k * self.y.len() + j) * self.x.len() + i]
    }

    fn check(&self) -> Result<()> {
        let expected = self.z.len() * self.y.len() * self.x.len();
        if self.zc.len() != expected {
            return Err(LimnoError::ShapeMismatch(format!(
                "zc holds {} values, expected {}",
                self.zc.len(),
                expected
            )));
        }
        if let Some(bathymetry) = &self.bathymetry {
            if bathymetry.rows != self.y.len() || bathymetry.cols != self.x.len() {
                return Err(LimnoError::ShapeMismatch(format!(
                    "bathymetry is {}x{}, expected {}x{}",
                    bathymetry.rows,
                    bathymetry.cols,
                    self.y.len(),
                    self.x.len()
                )));
            }
        }
        Ok(())
    }

    /// Position along `axis` whose coordinate equals `cut_val` exactly.
    pub fn cut_index(&self, axis: CutAxis, cut_val: f64) -> Result<usize> {
        let coordinate = match axis {
            CutAxis::X => &self.x,
            CutAxis::Y => &self.y,
            CutAxis::Z => &self.z,
        };
        coordinate.iter().position(|v| *v == cut_val).ok_or_else(|| {
            LimnoError::EmptyResult(format!("{} = {} is not a level of the model grid", axis, cut_val))
        })
    }

    /// Lowest `zc` of each level.
    fn level_minima(&self) -> Vec<f64> {
        let per_level = self.y.len() * self.x.len();
        self.zc
            .chunks(per_level.max(1))
            .map(|level| level.iter().copied().fold(f64::INFINITY, f64::min))
            .collect()
    }

    /// Plan a section at `cut_val` along `axis`. With `mask_land`, cells
    /// under the bed are flagged and vertical sections are drawn against
    /// uniform level depths so the bed outline shows.
    pub fn plan(&self, axis: CutAxis, cut_val: f64, mask_land: bool) -> Result<SlicePlan> {
        self.check()?;
        let index = self.cut_index(axis, cut_val)?;
        let (nz, ny, nx) = (self.z.len(), self.y.len(), self.x.len());
        let bathymetry = match (mask_land, &self.bathymetry) {
            (true, Some(b)) => Some(b),
            (true, None) => return Err(LimnoError::MissingVariable("Depth".to_string())),
            (false, _) => None,
        };
        let levels = self.level_minima();

        let (horizontal, vertical, land) = match axis {
            CutAxis::X | CutAxis::Y => {
                let (horizontal, cols) = if axis == CutAxis::X { (&self.y, ny) } else { (&self.x, nx) };
                let at = |k: usize, c: usize| match axis {
                    CutAxis::X => self.zc_at(k, c, index),
                    _ => self.zc_at(k, index, c),
                };
                let column_depth = |c: usize| match (axis, bathymetry) {
                    (CutAxis::X, Some(b)) => b.get(c, index),
                    (_, Some(b)) => b.get(index, c),
                    _ => None,
                };
                let mut vertical = Vec::with_capacity(nz * cols);
                let mut land = Vec::with_capacity(nz * cols);
                for (k, level) in levels.iter().enumerate().take(nz) {
                    for c in 0..cols {
                        match column_depth(c) {
                            Some(depth) => {
                                vertical.push(*level);
                                land.push(level.abs() >= depth);
                            }
                            None => vertical.push(at(k, c)),
                        }
                    }
                }
                let land = bathymetry.map(|_| land);
                (horizontal.clone(), CoordinateGrid::new(nz, cols, vertical)?, land)
            }
            CutAxis::Z => {
                let vertical = self.y.iter().flat_map(|y| std::iter::repeat(*y).take(nx)).collect();
                let land = bathymetry.map(|b| b.values().iter().map(|depth| cut_val > *depth).collect());
                (self.x.clone(), CoordinateGrid::new(ny, nx, vertical)?, land)
            }
        };
        Ok(SlicePlan {
            axis,
            index,
            cut_val,
            horizontal,
            vertical,
            land,
        })
    }
}

impl SlicePlan {
    /// Section of a `(z, y, x)` cube.
    pub fn slice(&self, cube: &LabelledArray) -> Result<LabelledArray> {
        if cube.ndim() != 3 {
            return Err(LimnoError::ShapeMismatch(format!(
                "'{}' has {} dimensions, expected (z, y, x)",
                cube.name,
                cube.ndim()
            )));
        }
        let section = cube.take(self.axis.array_axis(), self.index)?;
        let shape = section.shape();
        if shape != [self.vertical.rows, self.vertical.cols] {
            return Err(LimnoError::ShapeMismatch(format!(
                "section of '{}' is {:?}, grid expects {}x{}",
                cube.name, shape, self.vertical.rows, self.vertical.cols
            )));
        }
        Ok(section)
    }

    pub fn is_land(&self, row: usize, col: usize) -> bool {
        self.land
            .as_ref()
            .and_then(|land| land.get(row * self.vertical.cols + col))
            .copied()
            .unwrap_or(false)
    }
}

/// Anything that yields a model grid and per-iteration 3-D fields.
pub trait SliceSource {
    /// Iterations available when none are requested explicitly.
    fn available_iterations(&self) -> Result<Vec<String>>;

    /// Grid read from `iteration`'s file.
    fn grid(&self, iteration: &str) -> Result<ModelGrid>;

    /// One variable of `iteration` as a `(z, y, x)` cube.
    fn variable(&self, iteration: &str, name: &str) -> Result<LabelledArray>;
}

/// A run on disk, one NetCDF file per iteration.
#[derive(Debug, Clone)]
pub struct MitgcmRun {
    pub namespec: String,
}

impl MitgcmRun {
    pub fn new(namespec: &str) -> Self {
        MitgcmRun {
            namespec: namespec.to_string(),
        }
    }

    fn open(&self, iteration: &str) -> Result<NcFile> {
        NcFile::open(&file_for(&self.namespec, iteration))
    }
}

impl SliceSource for MitgcmRun {
    fn available_iterations(&self) -> Result<Vec<String>> {
        discover_iterations(&self.namespec)
    }

    fn grid(&self, iteration: &str) -> Result<ModelGrid> {
        let file = self.open(iteration)?;
        let bathymetry = if file.has_variable("Depth") {
            let (values, shape) = file.read("Depth")?;
            match shape.as_slice() {
                [rows, cols] => Some(CoordinateGrid::new(*rows, *cols, values)?),
                other => return Err(LimnoError::ShapeMismatch(format!("Depth has shape {:?}", other))),
            }
        } else {
            None
        };
        Ok(ModelGrid {
            x: file.read_flat("x")?,
            y: file.read_flat("y")?,
            z: file.read_flat("z")?,
            zc: file.read_flat("zc")?,
            bathymetry,
        })
    }

    fn variable(&self, iteration: &str, name: &str) -> Result<LabelledArray> {
        let mut cube = self.open(iteration)?.read_labelled(name)?;
        // converted files may carry a leading record dimension
        while cube.ndim() > 3 && cube.shape()[0] == 1 {
            cube = cube.take(0, 0)?;
        }
        Ok(cube)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 3 levels, 2 rows, 4 columns; zc = -(k + 1) everywhere except a
    /// shallower first level in the last column.
    fn grid() -> ModelGrid {
        let mut zc = Vec::new();
        for k in 0..3 {
            for _j in 0..2 {
                for i in 0..4 {
                    zc.push(if k == 0 && i == 3 { -0.5 } else { -(k as f64 + 1.0) });
                }
            }
        }
        ModelGrid {
            x: vec![0.0, 100.0, 200.0, 300.0],
            y: vec![0.0, 50.0],
            z: vec![1.0, 2.0, 3.0],
            zc,
            bathymetry: Some(CoordinateGrid::from_rows(&[vec![3.0, 3.0, 2.0, 1.0], vec![3.0, 2.5, 2.0, 0.0]]).unwrap()),
        }
    }

    #[test]
    fn test_iteration_labels_and_files() {
        assert_eq!(iteration_label(360), "0000000360");
        assert_eq!(
            file_for("run/output_{iter}.nc", "0000000360"),
            PathBuf::from("run/output_0000000360.nc")
        );
    }

    #[test]
    fn test_discover_iterations_sorts_numerically() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["output_0000000720.nc", "output_0000000036.nc", "output_0000000360.nc", "other.nc"] {
            fs::write(dir.path().join(name), "").unwrap();
        }
        let namespec = dir.path().join("output_{iter}.nc").display().to_string();
        assert_eq!(
            discover_iterations(&namespec).unwrap(),
            vec!["0000000036", "0000000360", "0000000720"]
        );
    }

    #[test]
    fn test_discover_without_matches() {
        let dir = tempfile::tempdir().unwrap();
        let namespec = dir.path().join("output_{iter}.nc").display().to_string();
        assert!(matches!(discover_iterations(&namespec), Err(LimnoError::EmptyResult(_))));
    }

    #[test]
    fn test_cut_index_requires_exact_level() {
        let grid = grid();
        assert_eq!(grid.cut_index(CutAxis::X, 200.0).unwrap(), 2);
        assert_eq!(grid.cut_index(CutAxis::Z, 1.0).unwrap(), 0);
        assert!(matches!(grid.cut_index(CutAxis::X, 150.0), Err(LimnoError::EmptyResult(_))));
        assert!("w".parse::<CutAxis>().is_err());
    }

    #[test]
    fn test_y_section_masks_below_bed() {
        let plan = grid().plan(CutAxis::Y, 50.0, true).unwrap();
        assert_eq!(plan.index, 1);
        assert_eq!(plan.horizontal, vec![0.0, 100.0, 200.0, 300.0]);
        // level minima are -1, -2, -3; bed along y=50 is 3, 2.5, 2, 0
        assert_eq!(plan.vertical.get(0, 3), Some(-1.0));
        assert!(!plan.is_land(0, 0));
        assert!(plan.is_land(0, 3));
        assert!(!plan.is_land(1, 1));
        assert!(plan.is_land(1, 2));
        assert!(plan.is_land(2, 0));
    }

    #[test]
    fn test_x_section_without_mask_uses_zc() {
        let plan = grid().plan(CutAxis::X, 300.0, false).unwrap();
        assert_eq!(plan.horizontal, vec![0.0, 50.0]);
        assert_eq!(plan.vertical.get(0, 0), Some(-0.5));
        assert!(plan.land.is_none());
    }

    #[test]
    fn test_z_section_compares_cut_value_with_bed() {
        let plan = grid().plan(CutAxis::Z, 2.0, true).unwrap();
        assert_eq!(plan.vertical.get(1, 0), Some(50.0));
        assert!(!plan.is_land(0, 2));
        assert!(plan.is_land(0, 3));
        assert!(plan.is_land(1, 3));
    }

    #[test]
    fn test_mask_requires_bathymetry() {
        let mut grid = grid();
        grid.bathymetry = None;
        assert!(matches!(
            grid.plan(CutAxis::Z, 1.0, true),
            Err(LimnoError::MissingVariable(_))
        ));
    }

    #[test]
    fn test_slice_takes_section() {
        use limno_data::axis::{Axis, AxisKind};
        let values: Vec<f64> = (0..24).map(|v| v as f64).collect();
        let cube = LabelledArray::new(
            "T",
            vec![
                Axis::new("z", AxisKind::Depth, vec![1.0, 2.0, 3.0]),
                Axis::new("y", AxisKind::Spatial, vec![0.0, 50.0]),
                Axis::new("x", AxisKind::Spatial, vec![0.0, 100.0, 200.0, 300.0]),
            ],
            values,
        )
        .unwrap();
        let plan = grid().plan(CutAxis::X, 100.0, false).unwrap();
        let section = plan.slice(&cube).unwrap();
        assert_eq!(section.shape(), vec![3, 2]);
        assert_eq!(section.values(), &[1.0, 5.0, 9.0, 13.0, 17.0, 21.0]);
    }
}
