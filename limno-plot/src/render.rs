//! PNG charts of labelled arrays.
//!
//! Charts are drawn on `f64` coordinates with the plotters bitmap backend.
//! Captions, tick labels and axis descriptions need a font and are only
//! drawn when the `ttf` feature is enabled.

use crate::colormap::{get_colormap, Colormap};
use chrono::{DateTime, Utc};
use limno_data::{
    error::{LimnoError, Result},
    resolve::closest_time_index,
    LabelledArray,
};
use log::info;
use plotters::{
    coord::{types::RangedCoordf64, Shift},
    prelude::*,
};
use std::{fmt::Display, ops::Range, path::Path};

pub(crate) fn render_error<E: Display>(e: E) -> LimnoError {
    LimnoError::Render(e.to_string())
}

/// Presentation settings shared by every chart.
#[derive(Debug, Clone, PartialEq)]
pub struct PlotConfig {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub colormap: String,
    pub vmin: Option<f64>,
    pub vmax: Option<f64>,
    pub width: u32,
    pub height: u32,
}

impl Default for PlotConfig {
    fn default() -> Self {
        PlotConfig {
            title: String::new(),
            x_label: String::new(),
            y_label: String::new(),
            colormap: "jet".to_string(),
            vmin: None,
            vmax: None,
            width: 800,
            height: 600,
        }
    }
}

impl PlotConfig {
    pub fn titled(title: &str) -> Self {
        PlotConfig {
            title: title.to_string(),
            ..PlotConfig::default()
        }
    }
}

pub(crate) type Chart<'a, DB> = ChartContext<'a, DB, Cartesian2d<RangedCoordf64, RangedCoordf64>>;

/// `(min, max)` of the finite values, overridden by the explicit bounds.
/// A degenerate range is widened so a colour scale can be built.
pub fn value_range<'a>(values: impl IntoIterator<Item = &'a f64>, vmin: Option<f64>, vmax: Option<f64>) -> (f64, f64) {
    let (lo, hi) = values
        .into_iter()
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(*v), hi.max(*v)));
    let (lo, hi) = if lo.is_finite() { (lo, hi) } else { (0.0, 1.0) };
    let (lo, hi) = (vmin.unwrap_or(lo), vmax.unwrap_or(hi));
    if hi > lo {
        (lo, hi)
    } else {
        (lo - 0.5, lo + 0.5)
    }
}

/// Cell edges around sample centres: midpoints between neighbours, with
/// the outer edges mirrored.
pub fn cell_edges(centres: &[f64]) -> Vec<f64> {
    match centres {
        [] => Vec::new(),
        [only] => vec![only - 0.5, only + 0.5],
        _ => {
            let n = centres.len();
            let mut edges = Vec::with_capacity(n + 1);
            edges.push(centres[0] - (centres[1] - centres[0]) / 2.0);
            for pair in centres.windows(2) {
                edges.push((pair[0] + pair[1]) / 2.0);
            }
            edges.push(centres[n - 1] + (centres[n - 1] - centres[n - 2]) / 2.0);
            edges
        }
    }
}

fn span(values: impl IntoIterator<Item = f64>) -> Range<f64> {
    let (lo, hi) = value_range(values.into_iter().collect::<Vec<_>>().iter(), None, None);
    lo..hi
}

/// Build a chart over `x` and `y`, with labels when fonts are available.
pub(crate) fn cartesian<'a, DB: DrawingBackend>(
    area: &'a DrawingArea<DB, Shift>,
    title: &str,
    labels: (&str, &str),
    x: Range<f64>,
    y: Range<f64>,
) -> Result<Chart<'a, DB>> {
    let mut builder = ChartBuilder::on(area);
    builder.margin(10);
    #[cfg(feature = "ttf")]
    builder
        .caption(title, ("sans-serif", 20))
        .x_label_area_size(40)
        .y_label_area_size(60);
    #[cfg(not(feature = "ttf"))]
    let _ = (title, labels);
    let mut chart = builder.build_cartesian_2d(x, y).map_err(render_error)?;
    #[cfg(feature = "ttf")]
    chart
        .configure_mesh()
        .x_desc(labels.0)
        .y_desc(labels.1)
        .light_line_style(BLACK.mix(0.15))
        .draw()
        .map_err(render_error)?;
    #[cfg(not(feature = "ttf"))]
    let _ = &mut chart;
    Ok(chart)
}

/// Vertical colour scale in its own area.
pub(crate) fn draw_colorbar<DB: DrawingBackend>(area: &DrawingArea<DB, Shift>, cmap: &Colormap, range: (f64, f64)) -> Result<()> {
    let mut chart = cartesian(area, "", ("", ""), 0.0..1.0, range.0..range.1)?;
    let steps = 64;
    let height = (range.1 - range.0) / steps as f64;
    chart
        .draw_series((0..steps).map(|i| {
            let lo = range.0 + height * i as f64;
            let colour = cmap.color_for(lo + height / 2.0, range.0, range.1);
            Rectangle::new([(0.0, lo), (1.0, lo + height)], colour.filled())
        }))
        .map_err(render_error)?;
    Ok(())
}

#[derive(Clone, Copy, PartialEq)]
enum Origin {
    Upper,
    Lower,
}

fn render_grid(array: &LabelledArray, config: &PlotConfig, path: &Path, origin: Origin) -> Result<()> {
    let shape = array.shape();
    let &[rows, cols] = shape.as_slice() else {
        return Err(LimnoError::ShapeMismatch(format!(
            "'{}' has shape {:?}, expected two dimensions",
            array.name, shape
        )));
    };
    let cmap = get_colormap(&config.colormap)?;
    let range = value_range(array.values(), config.vmin, config.vmax);

    let root = BitMapBackend::new(path, (config.width, config.height)).into_drawing_area();
    root.fill(&WHITE).map_err(render_error)?;
    let (main, bar) = root.split_horizontally(config.width.saturating_sub(70));
    let x_label = if config.x_label.is_empty() { array.axes()[1].name.as_str() } else { config.x_label.as_str() };
    let y_label = if config.y_label.is_empty() { array.axes()[0].name.as_str() } else { config.y_label.as_str() };
    let mut chart = cartesian(&main, &config.title, (x_label, y_label), 0.0..cols as f64, 0.0..rows as f64)?;

    let cells = (0..rows).flat_map(|r| (0..cols).map(move |c| (r, c)));
    chart
        .draw_series(cells.filter_map(|(r, c)| {
            let value = array.values()[r * cols + c];
            if !value.is_finite() {
                return None;
            }
            let y = match origin {
                Origin::Upper => (rows - 1 - r) as f64,
                Origin::Lower => r as f64,
            };
            let colour = cmap.color_for(value, range.0, range.1);
            Some(Rectangle::new([(c as f64, y), (c as f64 + 1.0, y + 1.0)], colour.filled()))
        }))
        .map_err(render_error)?;
    draw_colorbar(&bar, &cmap, range)?;
    root.present().map_err(render_error)?;
    info!("Saved {} to {}", array.name, path.display());
    Ok(())
}

/// Image of a 2-D array with row 0 at the top.
pub fn render_heatmap(array: &LabelledArray, config: &PlotConfig, path: &Path) -> Result<()> {
    render_grid(array, config, path, Origin::Upper)
}

/// Image of a 2-D array with row 0 at the bottom.
pub fn render_transect(array: &LabelledArray, config: &PlotConfig, path: &Path) -> Result<()> {
    render_grid(array, config, path, Origin::Lower)
}

/// Runs of consecutive finite points; NaN breaks the line.
fn finite_runs(points: impl IntoIterator<Item = (f64, f64)>) -> Vec<Vec<(f64, f64)>> {
    let mut runs = vec![Vec::new()];
    for (x, y) in points {
        if x.is_finite() && y.is_finite() {
            if let Some(run) = runs.last_mut() {
                run.push((x, y));
            }
        } else if runs.last().is_some_and(|r| !r.is_empty()) {
            runs.push(Vec::new());
        }
    }
    runs.retain(|r| !r.is_empty());
    runs
}

fn render_line(points: Vec<(f64, f64)>, config: &PlotConfig, labels: (&str, &str), path: &Path) -> Result<()> {
    let root = BitMapBackend::new(path, (config.width, config.height)).into_drawing_area();
    root.fill(&WHITE).map_err(render_error)?;
    let x = span(points.iter().map(|p| p.0));
    let y = {
        let (lo, hi) = value_range(points.iter().map(|p| &p.1), config.vmin, config.vmax);
        lo..hi
    };
    let mut chart = cartesian(&root, &config.title, labels, x, y)?;
    for run in finite_runs(points) {
        chart.draw_series(LineSeries::new(run, &BLUE)).map_err(render_error)?;
    }
    root.present().map_err(render_error)?;
    info!("Saved chart to {}", path.display());
    Ok(())
}

fn single_axis<'a>(array: &'a LabelledArray, expected: &str) -> Result<&'a limno_data::Axis> {
    match array.axes() {
        [axis] => Ok(axis),
        axes => Err(LimnoError::ShapeMismatch(format!(
            "'{}' has {} dimensions, expected a 1-D {} series",
            array.name,
            axes.len(),
            expected
        ))),
    }
}

/// Line chart of a 1-D array over time (x in seconds since the epoch).
pub fn render_timeseries(array: &LabelledArray, config: &PlotConfig, path: &Path) -> Result<()> {
    let time = single_axis(array, "time")?;
    let points = time.values().iter().copied().zip(array.values().iter().copied()).collect();
    let x_label = if config.x_label.is_empty() { "time" } else { config.x_label.as_str() };
    let y_label = if config.y_label.is_empty() { array.name.as_str() } else { config.y_label.as_str() };
    render_line(points, config, (x_label, y_label), path)
}

/// Vertical profile: value along x, depth along y.
pub fn render_profile(array: &LabelledArray, config: &PlotConfig, path: &Path) -> Result<()> {
    let depth = single_axis(array, "depth")?;
    let points = array.values().iter().copied().zip(depth.values().iter().copied()).collect();
    let x_label = if config.x_label.is_empty() { array.name.as_str() } else { config.x_label.as_str() };
    let y_label = if config.y_label.is_empty() { "depth" } else { config.y_label.as_str() };
    let config = PlotConfig {
        vmin: None,
        vmax: None,
        ..config.clone()
    };
    render_line(points, &config, (x_label, y_label), path)
}

/// Scatter of cells at their `(x, y)` positions coloured by value. Cells
/// at `x == 0` are outside the model domain and dropped.
pub fn render_xy_heatmap(x: &[f64], y: &[f64], values: &[f64], config: &PlotConfig, path: &Path) -> Result<()> {
    if x.len() != y.len() || x.len() != values.len() {
        return Err(LimnoError::ShapeMismatch(format!(
            "{} x, {} y and {} values",
            x.len(),
            y.len(),
            values.len()
        )));
    }
    let cells: Vec<(f64, f64, f64)> = x
        .iter()
        .zip(y)
        .zip(values)
        .map(|((x, y), v)| (*x, *y, *v))
        .filter(|(x, y, v)| *x != 0.0 && x.is_finite() && y.is_finite() && v.is_finite())
        .collect();
    if cells.is_empty() {
        return Err(LimnoError::EmptyResult("no cell to plot".to_string()));
    }
    let cmap = get_colormap(&config.colormap)?;
    let range = value_range(cells.iter().map(|c| &c.2), config.vmin, config.vmax);

    let root = BitMapBackend::new(path, (config.width, config.height)).into_drawing_area();
    root.fill(&WHITE).map_err(render_error)?;
    let (main, bar) = root.split_horizontally(config.width.saturating_sub(70));
    let mut chart = cartesian(
        &main,
        &config.title,
        (config.x_label.as_str(), config.y_label.as_str()),
        span(cells.iter().map(|c| c.0)),
        span(cells.iter().map(|c| c.1)),
    )?;
    chart
        .draw_series(cells.iter().map(|(x, y, v)| {
            let colour = cmap.color_for(*v, range.0, range.1);
            EmptyElement::at((*x, *y)) + Rectangle::new([(-3, -3), (3, 3)], colour.filled())
        }))
        .map_err(render_error)?;
    draw_colorbar(&bar, &cmap, range)?;
    root.present().map_err(render_error)?;
    info!("Saved {} cells to {}", cells.len(), path.display());
    Ok(())
}

/// Position of the timestamp closest to `target`.
pub fn closest_date_index(timestamps: &[DateTime<Utc>], target: &DateTime<Utc>) -> Result<usize> {
    closest_time_index(timestamps, target)
}

/// The slice of a time-leading array closest to `target`, e.g. the
/// heatmap frame of a `(time, m, n)` field.
pub fn frame_at(array: &LabelledArray, target: &DateTime<Utc>) -> Result<LabelledArray> {
    let pos = array
        .axis_position("time")
        .ok_or_else(|| LimnoError::ShapeMismatch(format!("'{}' has no time axis", array.name)))?;
    let timestamps = array.axes()[pos].timestamps();
    let index = closest_date_index(&timestamps, target)?;
    info!("Using frame {} ({})", index, timestamps[index]);
    array.take(pos, index)
}
