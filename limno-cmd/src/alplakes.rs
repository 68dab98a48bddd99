use limno_plot::render::{render_heatmap, render_profile, render_timeseries, PlotConfig};
use limno_sources::{
    alplakes::{
        download_point_timeseries, download_profile, parse_directory, parse_point_timeseries, parse_profile,
        ExportLayout, LakePoint,
    },
    fetch::{ReqwestFetcher, DEFAULT_TIMEOUT},
    json_store::save_json,
};
use limno_utils::dates::parse_user_instant;
use log::info;
use std::path::Path;

#[allow(clippy::too_many_arguments)]
pub async fn run_timeseries(
    lake: &str,
    lat: f64,
    lon: f64,
    start: &str,
    end: &str,
    depth: f64,
    output: &Path,
    plot: Option<&Path>,
) -> anyhow::Result<()> {
    let start = parse_user_instant(start)?;
    let end = parse_user_instant(end)?;
    if end <= start {
        anyhow::bail!("end {} is not after start {}", end, start);
    }
    let client = ReqwestFetcher::new(DEFAULT_TIMEOUT)?;
    let point = LakePoint::new(lake, lat, lon);
    let body = download_point_timeseries(&client, &point, &start, &end, depth).await?;
    save_json(&body, output)?;
    info!("Saved {} timeseries to {}", lake, output.display());

    if let Some(plot) = plot {
        let series = parse_point_timeseries(&body)?;
        let config = PlotConfig {
            x_label: "time".to_string(),
            y_label: "temperature [°C]".to_string(),
            ..PlotConfig::titled(&format!("{} at {} m", lake, depth))
        };
        render_timeseries(&series, &config, plot)?;
    }
    Ok(())
}

pub async fn run_profile(
    lake: &str,
    lat: f64,
    lon: f64,
    date: &str,
    output: &Path,
    plot: Option<&Path>,
) -> anyhow::Result<()> {
    let date = parse_user_instant(date)?;
    let client = ReqwestFetcher::new(DEFAULT_TIMEOUT)?;
    let point = LakePoint::new(lake, lat, lon);
    let body = download_profile(&client, &point, &date).await?;
    save_json(&body, output)?;
    info!("Saved {} profile to {}", lake, output.display());

    if let Some(plot) = plot {
        let profile = parse_profile(&body)?;
        let config = PlotConfig {
            x_label: "temperature [°C]".to_string(),
            y_label: "depth [m]".to_string(),
            ..PlotConfig::titled(&format!("{} on {}", lake, date.format("%Y-%m-%d %H:%M")))
        };
        render_profile(&profile, &config, plot)?;
    }
    Ok(())
}

pub fn run_directory(dir: &Path, layout: ExportLayout, output: &Path, plot: Option<&Path>) -> anyhow::Result<()> {
    let merged = parse_directory(dir, layout)?;
    save_json(&merged, output)?;
    info!("Saved {:?} values to {}", merged.shape(), output.display());

    if let Some(plot) = plot {
        let title = dir.file_name().map(|n| n.to_string_lossy().to_string()).unwrap_or_default();
        if layout == ExportLayout::SimstratDepthTime {
            let config = PlotConfig {
                x_label: "time".to_string(),
                y_label: "depth [m]".to_string(),
                colormap: "cmocean/thermal".to_string(),
                ..PlotConfig::titled(&title)
            };
            render_heatmap(&merged, &config, plot)?;
        } else {
            render_timeseries(&merged, &PlotConfig::titled(&title), plot)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_run_directory_of_point_series() {
        let dir = tempfile::tempdir().unwrap();
        let first = json!({
            "time": ["2024-05-01T00:00:00Z", "2024-05-01T03:00:00Z"],
            "variables": {"T": {"data": [5.0, 5.5]}}
        });
        let second = json!({
            "time": ["2024-05-01T06:00:00Z"],
            "variables": {"T": {"data": [6.0]}}
        });
        save_json(&first, &dir.path().join("a.json")).unwrap();
        save_json(&second, &dir.path().join("b.json")).unwrap();

        let out = dir.path().join("out").join("merged.json");
        run_directory(dir.path(), ExportLayout::Point, &out, None).unwrap();
        let saved: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&out).unwrap()).unwrap();
        assert_eq!(saved["values"], json!([5.0, 5.5, 6.0]));
    }

    #[test]
    fn test_run_directory_of_simstrat_surface_series() {
        let dir = tempfile::tempdir().unwrap();
        let surface = json!({
            "time": ["2024-01-01T00:00:00Z"],
            "variables": {"temperature": {"data": [4.5]}}
        });
        save_json(&surface, &dir.path().join("surface.json")).unwrap();
        let out = dir.path().join("out").join("merged.json");
        run_directory(dir.path(), ExportLayout::SimstratSurface, &out, None).unwrap();
        assert!(out.exists());
    }

    #[test]
    fn test_run_empty_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("merged.json");
        assert!(run_directory(dir.path(), ExportLayout::SimstratDepthTime, &out, None).is_err());
    }
}
