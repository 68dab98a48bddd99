use limno_plot::render::{render_timeseries, PlotConfig};
use limno_sources::{
    datalakes::{download_dataset, DatasetRequest},
    fetch::{ReqwestFetcher, DEFAULT_TIMEOUT},
    json_store::save_json,
    kind::{Datatype, SourceKind},
};
use limno_utils::dates::parse_user_instant;
use log::info;
use std::path::{Path, PathBuf};

/// Timeseries chart of one variable at one depth of the merged dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct DepthChart {
    pub variable: String,
    /// negative below the surface
    pub depth: f64,
    pub path: PathBuf,
}

#[allow(clippy::too_many_arguments)]
pub async fn run_datalakes(
    dataset_id: u64,
    start: &str,
    end: &str,
    kind: SourceKind,
    datatype: Datatype,
    temp_folder: &Path,
    output: &Path,
    chart: Option<DepthChart>,
) -> anyhow::Result<()> {
    let request = DatasetRequest {
        dataset_id,
        start: parse_user_instant(start)?,
        end: parse_user_instant(end)?,
        kind,
        datatype,
    };
    let client = ReqwestFetcher::new(DEFAULT_TIMEOUT)?;
    let (fragments, merged) = download_dataset(&client, &request, temp_folder).await?;
    info!("Merged {} {} files of dataset {}", fragments.len(), kind.as_str(), dataset_id);
    save_json(&merged, output)?;
    info!("Saved {} variables to {}", merged.variables.len(), output.display());

    if let Some(chart) = chart {
        let series = merged.select_depth(&chart.variable, chart.depth)?;
        let config = PlotConfig::titled(&format!("{} at {} m", chart.variable, chart.depth));
        render_timeseries(&series, &config, &chart.path)?;
    }
    Ok(())
}
