use limno_nc::delft3d::{extract_data, extract_timeseries_by_coordinates, SlicePattern};
use limno_plot::render::{frame_at, render_heatmap, render_timeseries, render_xy_heatmap, PlotConfig};
use limno_sources::json_store::save_json;
use limno_utils::dates::parse_user_instant;
use log::info;
use std::path::Path;

pub fn run_timeseries(
    file: &Path,
    variable: &str,
    x: f64,
    y: f64,
    depth: f64,
    output: &Path,
    plot: Option<&Path>,
) -> anyhow::Result<()> {
    let extraction = extract_timeseries_by_coordinates(file, variable, x, y, depth)?;
    save_json(&extraction, output)?;
    info!(
        "Saved {} steps of {} at depth {:?} to {}",
        extraction.timestamps.len(),
        variable,
        extraction.coordinates.depth,
        output.display()
    );

    if let Some(plot) = plot {
        let config = PlotConfig::titled(&format!("{} at ({}, {}) {} m", variable, x, y, depth));
        render_timeseries(&extraction.data, &config, plot)?;
    }
    Ok(())
}

pub fn run_map(file: &Path, variable: &str, depth: f64, date: &str, xy: bool, output: &Path) -> anyhow::Result<()> {
    let target = parse_user_instant(date)?;
    let extraction = extract_data(file, variable, &SlicePattern::horizontal_at_depth(depth))?;
    let frame = frame_at(&extraction.data, &target)?;
    let config = PlotConfig {
        colormap: "cmocean/thermal".to_string(),
        ..PlotConfig::titled(&format!("{} at {} m on {}", variable, depth, target.format("%Y-%m-%d %H:%M")))
    };
    if xy {
        let coordinates = &extraction.coordinates;
        render_xy_heatmap(&coordinates.x, &coordinates.y, frame.values(), &config, output)?;
    } else {
        render_heatmap(&frame, &config, output)?;
    }
    Ok(())
}
