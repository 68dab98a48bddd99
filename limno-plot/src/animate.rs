//! GIF animation of constant slices through a 3-D model run, with optional
//! still frames per iteration.

use crate::{
    colormap::{get_colormap, parse_hex_color, Colormap},
    render::{cartesian, cell_edges, draw_colorbar, render_error, value_range},
};
use limno_data::{
    error::{LimnoError, Result},
    LabelledArray,
};
use limno_nc::mitgcm::{iteration_label, CutAxis, SlicePlan, SliceSource};
use log::{info, warn};
use plotters::{coord::Shift, prelude::*};
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Settings of one animation. Build with [`AnimationConfig::new`] and
/// override fields as needed.
#[derive(Debug, Clone, PartialEq)]
pub struct AnimationConfig {
    /// Variable to draw, e.g. `T`
    pub var: String,
    /// GIF file name; `.gif` is appended when missing.
    pub movie_name: String,
    pub cut_var: CutAxis,
    /// Must be a level of the model grid.
    pub cut_val: f64,
    pub sec_per_iter: f64,
    /// Explicit iterations; every file matching `namespec` otherwise.
    pub iters: Option<Vec<u64>>,
    pub vmin: Option<f64>,
    pub vmax: Option<f64>,
    pub image_folder_name: PathBuf,
    pub gif_folder_name: PathBuf,
    pub namespec: String,
    /// Still frames are written as `{stem}{iter}{ext}` when set.
    pub image_name: Option<String>,
    pub fps: u32,
    pub cmap: String,
    /// `#rrggbb` colour for cells under the bed; no masking when `None`.
    pub landmask: Option<String>,
    pub velocity_field: bool,
    pub stride: usize,
    pub xstride: Option<usize>,
    pub ystride: Option<usize>,
    pub zstride: Option<usize>,
    /// Larger values draw shorter arrows.
    pub scale: f64,
    pub width: u32,
    pub height: u32,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        AnimationConfig {
            var: String::new(),
            movie_name: String::new(),
            cut_var: CutAxis::Z,
            cut_val: 0.0,
            sec_per_iter: 1.0,
            iters: None,
            vmin: None,
            vmax: None,
            image_folder_name: PathBuf::from("PNG_IMAGES"),
            gif_folder_name: PathBuf::from("GIF_MOVIES"),
            namespec: "output_{iter}.nc".to_string(),
            image_name: None,
            fps: 2,
            cmap: "cmocean/thermal".to_string(),
            landmask: Some("#603a17".to_string()),
            velocity_field: false,
            stride: 3,
            xstride: None,
            ystride: None,
            zstride: None,
            scale: 20.0,
            width: 800,
            height: 600,
        }
    }
}

impl AnimationConfig {
    pub fn new(var: &str, movie_name: &str, cut_var: CutAxis, cut_val: f64, sec_per_iter: f64) -> Self {
        AnimationConfig {
            var: var.to_string(),
            movie_name: movie_name.to_string(),
            cut_var,
            cut_val,
            sec_per_iter,
            ..AnimationConfig::default()
        }
    }

    pub fn gif_path(&self) -> PathBuf {
        let name = if self.movie_name.ends_with(".gif") {
            self.movie_name.clone()
        } else {
            format!("{}.gif", self.movie_name)
        };
        self.gif_folder_name.join(name)
    }

    /// Still frame of `iteration`, if stills are requested.
    pub fn still_path(&self, iteration: &str) -> Option<PathBuf> {
        let image_name = self.image_name.as_ref()?;
        let path = Path::new(image_name);
        let stem = path.file_stem().map(|s| s.to_string_lossy().to_string()).unwrap_or_default();
        let name = match path.extension() {
            Some(ext) => format!("{}{}.{}", stem, iteration, ext.to_string_lossy()),
            None => format!("{}{}", stem, iteration),
        };
        let folder = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => self.image_folder_name.join(parent),
            _ => self.image_folder_name.clone(),
        };
        Some(folder.join(name))
    }

    /// `(column, row)` arrow strides in the section plane.
    pub fn velocity_strides(&self) -> (usize, usize) {
        let pick = |specific: Option<usize>| specific.unwrap_or(self.stride).max(1);
        match self.cut_var {
            CutAxis::X => (pick(self.ystride), pick(self.zstride)),
            CutAxis::Y => (pick(self.xstride), pick(self.zstride)),
            CutAxis::Z => (pick(self.xstride), pick(self.ystride)),
        }
    }

    fn frame_delay_ms(&self) -> u32 {
        1000 / self.fps.max(1)
    }

    fn title(&self, iteration: &str) -> String {
        let time = iteration.parse::<u64>().map(|i| i as f64 * self.sec_per_iter).unwrap_or(f64::NAN);
        format!("{} at {}={} at t={}", self.var, self.cut_var, self.cut_val, time)
    }
}

/// What an animation run produced.
#[derive(Debug, Clone, PartialEq)]
pub struct AnimationOutput {
    pub gif: PathBuf,
    pub stills: Vec<PathBuf>,
    pub frames: usize,
    pub skipped: Vec<String>,
}

/// One iteration's section, ready to draw.
struct Frame {
    title: String,
    section: LabelledArray,
    velocity: Option<(LabelledArray, LabelledArray)>,
}

struct Painter<'a> {
    plan: &'a SlicePlan,
    cmap: Colormap,
    land: Option<RGBColor>,
    range: (f64, f64),
    strides: (usize, usize),
    scale: f64,
    labels: (&'static str, &'static str),
}

impl Painter<'_> {
    fn extent(&self) -> ((f64, f64), (f64, f64)) {
        let x = cell_edges(&self.plan.horizontal);
        let (mut lo, mut hi) = (f64::INFINITY, f64::NEG_INFINITY);
        for c in 0..self.plan.vertical.cols {
            for edge in cell_edges(&self.column(c)) {
                lo = lo.min(edge);
                hi = hi.max(edge);
            }
        }
        let first = x.first().copied().unwrap_or(0.0);
        let last = x.last().copied().unwrap_or(1.0);
        ((first.min(last), first.max(last)), (lo, hi))
    }

    fn column(&self, c: usize) -> Vec<f64> {
        (0..self.plan.vertical.rows)
            .filter_map(|r| self.plan.vertical.get(r, c))
            .collect()
    }

    fn draw<DB: DrawingBackend>(&self, root: &DrawingArea<DB, Shift>, frame: &Frame, width: u32) -> Result<()> {
        root.fill(&WHITE).map_err(render_error)?;
        let (main, bar) = root.split_horizontally(width.saturating_sub(70));
        let ((x0, x1), (y0, y1)) = self.extent();
        let mut chart = cartesian(&main, &frame.title, self.labels, x0..x1, y0..y1)?;

        let x_edges = cell_edges(&self.plan.horizontal);
        let (rows, cols) = (self.plan.vertical.rows, self.plan.vertical.cols);
        let mut cells = Vec::with_capacity(rows * cols);
        for c in 0..cols {
            let y_edges = cell_edges(&self.column(c));
            for r in 0..rows {
                let colour = if self.plan.is_land(r, c) {
                    self.land
                } else {
                    frame
                        .section
                        .get(&[r, c])
                        .filter(|v| v.is_finite())
                        .map(|v| self.cmap.color_for(v, self.range.0, self.range.1))
                };
                if let Some(colour) = colour {
                    cells.push(Rectangle::new(
                        [(x_edges[c], y_edges[r]), (x_edges[c + 1], y_edges[r + 1])],
                        colour.filled(),
                    ));
                }
            }
        }
        chart.draw_series(cells).map_err(render_error)?;

        if let Some((u, v)) = &frame.velocity {
            let (col_step, row_step) = self.strides;
            let (dx, dy) = ((x1 - x0) / self.scale, (y1 - y0) / self.scale);
            let mut arrows = Vec::new();
            for r in (0..rows).step_by(row_step) {
                for c in (0..cols).step_by(col_step) {
                    let (Some(a), Some(b), Some(y)) = (u.get(&[r, c]), v.get(&[r, c]), self.plan.vertical.get(r, c)) else {
                        continue;
                    };
                    if !(a.is_finite() && b.is_finite()) || self.plan.is_land(r, c) {
                        continue;
                    }
                    let x = self.plan.horizontal[c];
                    let (half_x, half_y) = (a * dx / 2.0, b * dy / 2.0);
                    arrows.push(((x - half_x, y - half_y), (x + half_x, y + half_y)));
                }
            }
            chart
                .draw_series(arrows.iter().map(|(tail, head)| PathElement::new(vec![*tail, *head], BLACK)))
                .map_err(render_error)?;
            chart
                .draw_series(arrows.iter().map(|(_, head)| Circle::new(*head, 2, BLACK.filled())))
                .map_err(render_error)?;
        }
        draw_colorbar(&bar, &self.cmap, self.range)?;
        Ok(())
    }
}

fn read_frame<S: SliceSource>(source: &S, plan: &SlicePlan, config: &AnimationConfig, iteration: &str) -> Result<Frame> {
    let section = plan.slice(&source.variable(iteration, &config.var)?)?;
    let velocity = if config.velocity_field {
        let (xwind, ywind) = config.cut_var.velocity_components();
        Some((
            plan.slice(&source.variable(iteration, xwind)?)?,
            plan.slice(&source.variable(iteration, ywind)?)?,
        ))
    } else {
        None
    };
    Ok(Frame {
        title: config.title(iteration),
        section,
        velocity,
    })
}

/// Write the animation described by `config` from `source`.
///
/// The grid and colour range come from the first iteration. Iterations
/// that cannot be read are skipped with a warning.
pub fn make_animation<S: SliceSource>(source: &S, config: &AnimationConfig) -> Result<AnimationOutput> {
    let iterations = match &config.iters {
        Some(iters) => iters.iter().map(|i| iteration_label(*i)).collect(),
        None => source.available_iterations()?,
    };
    let first = iterations
        .first()
        .ok_or_else(|| LimnoError::EmptyResult("no iteration to animate".to_string()))?;

    fs::create_dir_all(&config.gif_folder_name)?;
    fs::create_dir_all(&config.image_folder_name)?;

    let grid = source.grid(first)?;
    let plan = grid.plan(config.cut_var, config.cut_val, config.landmask.is_some())?;
    let land = config.landmask.as_deref().map(parse_hex_color).transpose()?;

    let initial = read_frame(source, &plan, config, first)?;
    let sea_values = (0..plan.vertical.rows)
        .flat_map(|r| (0..plan.vertical.cols).map(move |c| (r, c)))
        .filter(|(r, c)| !plan.is_land(*r, *c))
        .filter_map(|(r, c)| initial.section.get(&[r, c]))
        .collect::<Vec<_>>();
    let painter = Painter {
        plan: &plan,
        cmap: get_colormap(&config.cmap)?,
        land,
        range: value_range(&sea_values, config.vmin, config.vmax),
        strides: config.velocity_strides(),
        scale: config.scale,
        labels: config.cut_var.plot_labels(),
    };

    let gif = config.gif_path();
    let root = BitMapBackend::gif(&gif, (config.width, config.height), config.frame_delay_ms())
        .map_err(render_error)?
        .into_drawing_area();

    let mut output = AnimationOutput {
        gif: gif.clone(),
        stills: Vec::new(),
        frames: 0,
        skipped: Vec::new(),
    };
    for iteration in &iterations {
        let frame = match read_frame(source, &plan, config, iteration) {
            Ok(frame) => frame,
            Err(e) => {
                warn!("Skipping iter {} ({})", iteration, e);
                output.skipped.push(iteration.clone());
                continue;
            }
        };
        info!("Plotting iteration {}", iteration);
        painter.draw(&root, &frame, config.width)?;
        root.present().map_err(render_error)?;
        output.frames += 1;

        if let Some(still) = config.still_path(iteration) {
            if let Some(parent) = still.parent() {
                fs::create_dir_all(parent)?;
            }
            let still_root = BitMapBackend::new(&still, (config.width, config.height)).into_drawing_area();
            painter.draw(&still_root, &frame, config.width)?;
            still_root.present().map_err(render_error)?;
            drop(still_root);
            output.stills.push(still);
        }
    }
    if config.image_name.is_some() {
        info!("Saved still frames in {}", config.image_folder_name.display());
    }
    info!("Saved animation as {}", gif.display());
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use limno_data::{
        axis::{Axis, AxisKind},
        resolve::CoordinateGrid,
    };
    use limno_nc::mitgcm::ModelGrid;
    use std::collections::HashMap;

    /// Two levels over a 3x3 horizontal grid; the corner column is dry.
    struct MemoryRun {
        grid: ModelGrid,
        cubes: HashMap<(String, String), LabelledArray>,
    }

    fn cube(name: &str, offset: f64) -> LabelledArray {
        LabelledArray::new(
            name,
            vec![
                Axis::new("z", AxisKind::Depth, vec![1.0, 2.0]),
                Axis::new("y", AxisKind::Spatial, vec![0.0, 10.0, 20.0]),
                Axis::new("x", AxisKind::Spatial, vec![0.0, 10.0, 20.0]),
            ],
            (0..18).map(|v| v as f64 + offset).collect(),
        )
        .unwrap()
    }

    impl MemoryRun {
        fn new() -> Self {
            let zc = (0..18).map(|i| if i < 9 { -1.0 } else { -3.0 }).collect();
            let grid = ModelGrid {
                x: vec![0.0, 10.0, 20.0],
                y: vec![0.0, 10.0, 20.0],
                z: vec![1.0, 2.0],
                zc,
                bathymetry: Some(
                    CoordinateGrid::from_rows(&[vec![4.0, 4.0, 4.0], vec![4.0, 4.0, 4.0], vec![4.0, 4.0, 0.0]])
                        .unwrap(),
                ),
            };
            let mut cubes = HashMap::new();
            for (iteration, offset) in [("0000000000", 0.0), ("0000000010", 1.0)] {
                for var in ["T", "U", "V", "W"] {
                    cubes.insert((iteration.to_string(), var.to_string()), cube(var, offset));
                }
            }
            // the third iteration lacks temperature
            cubes.insert(("0000000020".to_string(), "U".to_string()), cube("U", 0.0));
            MemoryRun { grid, cubes }
        }
    }

    impl SliceSource for MemoryRun {
        fn available_iterations(&self) -> Result<Vec<String>> {
            let mut iterations: Vec<String> = self.cubes.keys().map(|(i, _)| i.clone()).collect();
            iterations.sort();
            iterations.dedup();
            Ok(iterations)
        }

        fn grid(&self, _iteration: &str) -> Result<ModelGrid> {
            Ok(self.grid.clone())
        }

        fn variable(&self, iteration: &str, name: &str) -> Result<LabelledArray> {
            self.cubes
                .get(&(iteration.to_string(), name.to_string()))
                .cloned()
                .ok_or_else(|| LimnoError::MissingVariable(format!("{} at {}", name, iteration)))
        }
    }

    fn config(dir: &Path, cut_var: CutAxis, cut_val: f64) -> AnimationConfig {
        AnimationConfig {
            gif_folder_name: dir.join("gif"),
            image_folder_name: dir.join("png"),
            width: 120,
            height: 90,
            ..AnimationConfig::new("T", "movie", cut_var, cut_val, 30.0)
        }
    }

    #[test]
    fn test_defaults() {
        let config = AnimationConfig::default();
        assert_eq!(config.fps, 2);
        assert_eq!(config.cmap, "cmocean/thermal");
        assert_eq!(config.landmask.as_deref(), Some("#603a17"));
        assert_eq!(config.namespec, "output_{iter}.nc");
        assert_eq!(config.scale, 20.0);
        assert_eq!(config.frame_delay_ms(), 500);
    }

    #[test]
    fn test_paths_and_title() {
        let config = AnimationConfig {
            image_name: Some("frame.png".to_string()),
            ..AnimationConfig::new("T", "movie", CutAxis::Y, 10.0, 30.0)
        };
        assert_eq!(config.gif_path(), PathBuf::from("GIF_MOVIES/movie.gif"));
        assert_eq!(
            config.still_path("0000000010"),
            Some(PathBuf::from("PNG_IMAGES/frame0000000010.png"))
        );
        assert_eq!(config.title("0000000010"), "T at y=10 at t=300");
    }

    #[test]
    fn test_velocity_strides_follow_cut_axis() {
        let config = AnimationConfig {
            xstride: Some(2),
            zstride: Some(1),
            ..AnimationConfig::new("T", "m", CutAxis::X, 0.0, 1.0)
        };
        assert_eq!(config.velocity_strides(), (3, 1));
        let config = AnimationConfig {
            cut_var: CutAxis::Z,
            ..config
        };
        assert_eq!(config.velocity_strides(), (2, 3));
    }

    #[test]
    fn test_make_animation_skips_unreadable_iterations() {
        let dir = tempfile::tempdir().unwrap();
        let config = AnimationConfig {
            image_name: Some("still.png".to_string()),
            velocity_field: true,
            stride: 1,
            ..config(dir.path(), CutAxis::Y, 10.0)
        };
        let output = make_animation(&MemoryRun::new(), &config).unwrap();
        assert_eq!(output.frames, 2);
        assert_eq!(output.skipped, vec!["0000000020".to_string()]);
        assert!(output.gif.exists());
        assert_eq!(output.stills.len(), 2);
        assert!(dir.path().join("png").join("still0000000010.png").exists());
    }

    #[test]
    fn test_make_animation_with_explicit_iterations() {
        let dir = tempfile::tempdir().unwrap();
        let config = AnimationConfig {
            iters: Some(vec![10]),
            landmask: None,
            ..config(dir.path(), CutAxis::Z, 2.0)
        };
        let output = make_animation(&MemoryRun::new(), &config).unwrap();
        assert_eq!(output.frames, 1);
        assert!(output.stills.is_empty());
    }

    #[test]
    fn test_cut_value_must_be_a_level() {
        let dir = tempfile::tempdir().unwrap();
        let result = make_animation(&MemoryRun::new(), &config(dir.path(), CutAxis::X, 5.0));
        assert!(matches!(result, Err(LimnoError::EmptyResult(_))));
    }
}
