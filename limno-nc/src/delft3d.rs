//! Extraction from Delft3D-Flow NetCDF output.
//!
//! 4-D fields are laid out `(time, layer, m, n)`. Layer depths come from
//! `ZK_LYR` (positive up, so they are negated before a depth lookup), cell
//! centres from `XZ`/`YZ`, and model time counts seconds from a reference
//! instant (2008-03-01 for the Alplakes runs).

use crate::reader::NcFile;
use chrono::{DateTime, TimeZone, Utc};
use limno_data::{
    axis::{Axis, AxisKind},
    error::{LimnoError, Result},
    resolve::{resolve_grid, resolve_in, CoordinateGrid, NearestPolicy},
    LabelledArray,
};
use limno_utils::dates::from_model_seconds;
use log::info;
use serde::Serialize;
use std::path::Path;

/// Value written by the model for dry or inactive cells.
pub const FILL_VALUE: f64 = -999.0;

/// Pick everything along a dimension, or a single position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Selector {
    All,
    Index(usize),
}

/// Layer selection; `NearestDepth` is resolved against `-ZK_LYR`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LayerSelector {
    All,
    Index(usize),
    NearestDepth(f64),
}

/// Index pattern applied to a `(time, layer, m, n)` field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SlicePattern {
    pub time: Selector,
    pub layer: LayerSelector,
    pub m: Selector,
    pub n: Selector,
}

impl SlicePattern {
    /// Horizontal map at the layer nearest `depth`, every time step.
    pub fn horizontal_at_depth(depth: f64) -> Self {
        SlicePattern {
            time: Selector::All,
            layer: LayerSelector::NearestDepth(depth),
            m: Selector::All,
            n: Selector::All,
        }
    }

    /// Vertical transect along `n` at fixed `m`, every time step.
    pub fn transect_at_m(m: usize) -> Self {
        SlicePattern {
            time: Selector::All,
            layer: LayerSelector::All,
            m: Selector::Index(m),
            n: Selector::All,
        }
    }
}

/// Output-file conventions.
#[derive(Debug, Clone, PartialEq)]
pub struct Delft3dOutput {
    pub reference: DateTime<Utc>,
    pub fill_value: f64,
}

impl Default for Delft3dOutput {
    fn default() -> Self {
        Delft3dOutput {
            reference: Utc.with_ymd_and_hms(2008, 3, 1, 0, 0, 0).single().unwrap_or_default(),
            fill_value: FILL_VALUE,
        }
    }
}

/// Everything needed for an extraction, loaded from one output file.
#[derive(Debug, Clone)]
pub struct Delft3dFields {
    /// Raw model time in seconds after the reference instant.
    pub time: Vec<f64>,
    pub zk_lyr: Vec<f64>,
    pub xz: CoordinateGrid,
    pub yz: CoordinateGrid,
    /// Raw `(time, layer, m, n)` values of the requested variable.
    pub field: Vec<f64>,
    pub name: String,
}

/// Coordinates of the selected cells.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectedCoordinates {
    pub depth: Vec<f64>,
    pub x: Vec<f64>,
    pub y: Vec<f64>,
}

/// Result of an extraction.
#[derive(Debug, Clone, Serialize)]
pub struct Extraction {
    pub timestamps: Vec<DateTime<Utc>>,
    pub data: LabelledArray,
    pub coordinates: SelectedCoordinates,
}

fn pick(values: &[f64], selector: Selector, what: &str) -> Result<Vec<f64>> {
    match selector {
        Selector::All => Ok(values.to_vec()),
        Selector::Index(i) => values
            .get(i)
            .map(|v| vec![*v])
            .ok_or_else(|| LimnoError::ShapeMismatch(format!("{} index {} out of range", what, i))),
    }
}

impl Delft3dFields {
    /// Load the time, layer and grid coordinates plus one variable.
    pub fn load(path: &Path, variable: &str) -> Result<Self> {
        let file = NcFile::open(path)?;
        let time = file.read_flat("time")?;
        let zk_lyr = file.read_flat("ZK_LYR")?;
        let (xz, xz_shape) = file.read("XZ")?;
        let (yz, yz_shape) = file.read("YZ")?;
        let (field, field_shape) = file.read(variable)?;
        let grid = |values: Vec<f64>, shape: Vec<usize>| match shape.as_slice() {
            [rows, cols] => CoordinateGrid::new(*rows, *cols, values),
            other => Err(LimnoError::ShapeMismatch(format!("coordinate grid shape {:?}", other))),
        };
        let fields = Delft3dFields {
            time,
            zk_lyr,
            xz: grid(xz, xz_shape)?,
            yz: grid(yz, yz_shape)?,
            field,
            name: variable.to_string(),
        };
        let expected = [fields.time.len(), fields.zk_lyr.len(), fields.xz.rows, fields.xz.cols];
        if field_shape != expected {
            return Err(LimnoError::ShapeMismatch(format!(
                "{} has shape {:?}, expected (time, layer, m, n) = {:?}",
                variable, field_shape, expected
            )));
        }
        Ok(fields)
    }

    /// Layer depths as positive-down metres.
    pub fn depths(&self) -> Vec<f64> {
        self.zk_lyr.iter().map(|z| -z).collect()
    }

    /// Index of the layer nearest `depth`, with extrapolation bounds.
    pub fn layer_index(&self, depth: f64) -> Result<usize> {
        resolve_in(&self.depths(), depth, NearestPolicy::Extrapolated)
            .map_err(|e| match e {
                LimnoError::EmptyAxis(_) => LimnoError::EmptyAxis("ZK_LYR".to_string()),
                other => other,
            })
    }

    fn cube(&self, conventions: &Delft3dOutput) -> Result<(LabelledArray, Vec<DateTime<Utc>>)> {
        let timestamps = self
            .time
            .iter()
            .map(|t| from_model_seconds(&conventions.reference, *t))
            .collect::<anyhow::Result<Vec<_>>>()
            .map_err(|e| LimnoError::DateParse(e.to_string()))?;
        let axes = vec![
            Axis::time(&timestamps),
            Axis::new("layer", AxisKind::Depth, self.zk_lyr.clone()),
            Axis::new("m", AxisKind::Spatial, (0..self.xz.rows).map(|i| i as f64).collect()),
            Axis::new("n", AxisKind::Spatial, (0..self.xz.cols).map(|i| i as f64).collect()),
        ];
        let cube = LabelledArray::new(&self.name, axes, self.field.clone())?.mask_fill_value(conventions.fill_value);
        Ok((cube, timestamps))
    }

    /// Apply `pattern` to the field.
    pub fn extract(&self, pattern: &SlicePattern, conventions: &Delft3dOutput) -> Result<Extraction> {
        let layer = match pattern.layer {
            LayerSelector::All => Selector::All,
            LayerSelector::Index(i) => Selector::Index(i),
            LayerSelector::NearestDepth(d) => Selector::Index(self.layer_index(d)?),
        };
        let (mut data, timestamps) = self.cube(conventions)?;
        // drop dimensions from the back so earlier positions stay valid
        for (pos, selector) in [(3, pattern.n), (2, pattern.m), (1, layer), (0, pattern.time)] {
            if let Selector::Index(i) = selector {
                data = data.take(pos, i)?;
            }
        }

        let rows = pick(&(0..self.xz.rows).map(|i| i as f64).collect::<Vec<_>>(), pattern.m, "m")?;
        let cols = pick(&(0..self.xz.cols).map(|i| i as f64).collect::<Vec<_>>(), pattern.n, "n")?;
        let mut x = Vec::new();
        let mut y = Vec::new();
        for r in &rows {
            for c in &cols {
                x.extend(self.xz.get(*r as usize, *c as usize));
                y.extend(self.yz.get(*r as usize, *c as usize));
            }
        }
        let coordinates = SelectedCoordinates {
            depth: pick(&self.zk_lyr, layer, "layer")?,
            x,
            y,
        };
        let timestamps = match pattern.time {
            Selector::All => timestamps,
            Selector::Index(i) => timestamps.get(i).copied().into_iter().collect(),
        };
        Ok(Extraction {
            timestamps,
            data,
            coordinates,
        })
    }

    /// Timeseries at the cell nearest `(x, y)` and the layer nearest `depth`.
    pub fn timeseries_at(&self, x: f64, y: f64, depth: f64, conventions: &Delft3dOutput) -> Result<Extraction> {
        let (m, n) = resolve_grid(&self.xz, &self.yz, x, y)?;
        let pattern = SlicePattern {
            time: Selector::All,
            layer: LayerSelector::NearestDepth(depth),
            m: Selector::Index(m),
            n: Selector::Index(n),
        };
        self.extract(&pattern, conventions)
    }
}

/// Read `variable` from `path` and apply `pattern`.
pub fn extract_data(path: &Path, variable: &str, pattern: &SlicePattern) -> Result<Extraction> {
    info!("Extracting {} from {}", variable, path.display());
    Delft3dFields::load(path, variable)?.extract(pattern, &Delft3dOutput::default())
}

/// Read a timeseries of `variable` at the model cell nearest `(x, y)`.
pub fn extract_timeseries_by_coordinates(path: &Path, variable: &str, x: f64, y: f64, depth: f64) -> Result<Extraction> {
    info!("Extracting {} at ({}, {}) depth {} from {}", variable, x, y, depth, path.display());
    Delft3dFields::load(path, variable)?.timeseries_at(x, y, depth, &Delft3dOutput::default())
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 2 times, 3 layers, 2x2 grid; value = 1000 t + 100 l + 10 m + n
    fn fields() -> Delft3dFields {
        let mut field = Vec::new();
        for t in 0..2 {
            for l in 0..3 {
                for m in 0..2 {
                    for n in 0..2 {
                        field.push((1000 * t + 100 * l + 10 * m + n) as f64);
                    }
                }
            }
        }
        field[1] = FILL_VALUE;
        Delft3dFields {
            time: vec![0.0, 3600.0],
            zk_lyr: vec![-0.5, -2.0, -5.0],
            xz: CoordinateGrid::from_rows(&[vec![500.0, 600.0], vec![500.0, 600.0]]).unwrap(),
            yz: CoordinateGrid::from_rows(&[vec![100.0, 100.0], vec![200.0, 200.0]]).unwrap(),
            field,
            name: "R1".to_string(),
        }
    }

    #[test]
    fn test_timestamps_use_reference_epoch() {
        let extraction = fields()
            .extract(&SlicePattern::horizontal_at_depth(2.0), &Delft3dOutput::default())
            .unwrap();
        assert_eq!(extraction.timestamps[0], Utc.with_ymd_and_hms(2008, 3, 1, 0, 0, 0).unwrap());
        assert_eq!(extraction.timestamps[1], Utc.with_ymd_and_hms(2008, 3, 1, 1, 0, 0).unwrap());
    }

    #[test]
    fn test_horizontal_slice_at_nearest_layer() {
        let extraction = fields()
            .extract(&SlicePattern::horizontal_at_depth(1.8), &Delft3dOutput::default())
            .unwrap();
        assert_eq!(extraction.data.shape(), vec![2, 2, 2]);
        assert_eq!(extraction.data.get(&[1, 1, 0]), Some(1110.0));
        assert_eq!(extraction.coordinates.depth, vec![-2.0]);
        assert_eq!(extraction.coordinates.x.len(), 4);
    }

    #[test]
    fn test_fill_value_becomes_nan() {
        let pattern = SlicePattern {
            time: Selector::Index(0),
            layer: LayerSelector::Index(0),
            m: Selector::All,
            n: Selector::All,
        };
        let extraction = fields().extract(&pattern, &Delft3dOutput::default()).unwrap();
        assert!(extraction.data.values()[1].is_nan());
        assert_eq!(extraction.timestamps.len(), 1);
    }

    #[test]
    fn test_depth_outside_bounds() {
        // depths 0.5, 2, 5: upper bound 2*5 - 2 = 8
        let result = fields().extract(&SlicePattern::horizontal_at_depth(9.0), &Delft3dOutput::default());
        assert!(matches!(result, Err(LimnoError::OutOfRange { .. })));
    }

    #[test]
    fn test_timeseries_at_coordinates() {
        let extraction = fields()
            .timeseries_at(590.0, 210.0, 5.0, &Delft3dOutput::default())
            .unwrap();
        assert_eq!(extraction.data.ndim(), 1);
        assert_eq!(extraction.data.values(), &[211.0, 1211.0]);
        assert_eq!(extraction.coordinates.x, vec![600.0]);
        assert_eq!(extraction.coordinates.y, vec![200.0]);
        assert_eq!(extraction.coordinates.depth, vec![-5.0]);
    }

    #[test]
    fn test_transect_pattern() {
        let extraction = fields()
            .extract(&SlicePattern::transect_at_m(0), &Delft3dOutput::default())
            .unwrap();
        assert_eq!(extraction.data.shape(), vec![2, 3, 2]);
        assert_eq!(extraction.coordinates.y, vec![100.0, 100.0]);
    }
}
