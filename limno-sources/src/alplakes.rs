//! Alplakes simulation API: Delft3D-Flow point timeseries and profiles,
//! plus the Simstrat 1-D exports kept on disk as JSON.
//!
//! # URL patterns
//!
//! - point: `{BASE}/simulations/point/delft3d-flow/{lake}/{start}/{end}/{depth}/{lat}/{lon}`
//! - profile: `{BASE}/simulations/profile/delft3d-flow/{lake}/{date}/{lat}/{lon}`
//!
//! Dates are minute-resolution `YYYYMMDDHHMM`, coordinates are WGS84.

use crate::{
    fetch::{fetch_json, HttpFetch},
    json_store::{json_files_in, load_json},
    payload::{field, number_rows, numbers, strings},
};
use chrono::{DateTime, Utc};
use limno_data::{
    axis::Axis,
    error::{LimnoError, Result},
    merge::concat_time,
    LabelledArray,
};
use limno_utils::dates::{format_api_minute, parse_iso_instant};
use log::info;
use serde_json::Value;
use std::{fmt, path::Path, str::FromStr};

pub const BASE_URL: &str = "https://alplakes-api.eawag.ch";

/// Output variable name for every Alplakes temperature series.
pub const TEMPERATURE: &str = "temperature";

/// A point in a lake at which to sample a simulation.
#[derive(Debug, Clone, PartialEq)]
pub struct LakePoint {
    pub lake: String,
    pub lat_wgs84: f64,
    pub lon_wgs84: f64,
}

impl LakePoint {
    pub fn new(lake: &str, lat_wgs84: f64, lon_wgs84: f64) -> Self {
        LakePoint {
            lake: lake.to_string(),
            lat_wgs84,
            lon_wgs84,
        }
    }

    pub fn timeseries_url(&self, start: &DateTime<Utc>, end: &DateTime<Utc>, depth: f64) -> String {
        format!(
            "{}/simulations/point/delft3d-flow/{}/{}/{}/{}/{}/{}",
            BASE_URL,
            self.lake,
            format_api_minute(start),
            format_api_minute(end),
            depth,
            self.lat_wgs84,
            self.lon_wgs84
        )
    }

    pub fn profile_url(&self, date: &DateTime<Utc>) -> String {
        format!(
            "{}/simulations/profile/delft3d-flow/{}/{}/{}/{}",
            BASE_URL,
            self.lake,
            format_api_minute(date),
            self.lat_wgs84,
            self.lon_wgs84
        )
    }
}

/// Download the raw JSON of a point timeseries at one depth.
pub async fn download_point_timeseries<F: HttpFetch>(
    client: &F,
    point: &LakePoint,
    start: &DateTime<Utc>,
    end: &DateTime<Utc>,
    depth: f64,
) -> Result<Value> {
    info!("Downloading {} timeseries at {} m", point.lake, depth);
    fetch_json(client, &point.timeseries_url(start, end, depth)).await
}

/// Download the raw JSON of a vertical profile.
pub async fn download_profile<F: HttpFetch>(client: &F, point: &LakePoint, date: &DateTime<Utc>) -> Result<Value> {
    info!("Downloading {} profile for {}", point.lake, date);
    fetch_json(client, &point.profile_url(date)).await
}

fn time_axis(body: &Value) -> Result<Axis> {
    let raw = strings(field(body, &["time"])?, "time")?;
    let instants = raw
        .iter()
        .map(|s| parse_iso_instant(s).map_err(|e| LimnoError::DateParse(format!("{}: {}", s, e))))
        .collect::<Result<Vec<_>>>()?;
    Ok(Axis::time(&instants))
}

fn series_over_time(body: &Value, variable: &str) -> Result<LabelledArray> {
    let time = time_axis(body)?;
    let values = numbers(field(body, &["variables", variable, "data"])?, variable)?;
    LabelledArray::new(TEMPERATURE, vec![time], values)
}

/// Point timeseries: `time[]` with `variables.T.data[]`.
pub fn parse_point_timeseries(body: &Value) -> Result<LabelledArray> {
    series_over_time(body, "T")
}

/// Vertical profile: `depth.data[]` with `variables.temperature.data[]`.
pub fn parse_profile(body: &Value) -> Result<LabelledArray> {
    let depth = numbers(field(body, &["depth", "data"])?, "depth")?;
    let values = numbers(field(body, &["variables", TEMPERATURE, "data"])?, TEMPERATURE)?;
    LabelledArray::new(TEMPERATURE, vec![Axis::depth(depth)], values)
}

/// Simstrat surface series: `time[]` with `variables.temperature.data[]`.
pub fn parse_simstrat_timeseries(body: &Value) -> Result<LabelledArray> {
    series_over_time(body, TEMPERATURE)
}

/// Simstrat depth/time export: `depth.data[]`, `time[]` and
/// `variables.T.data[depth][time]`.
pub fn parse_simstrat_depth_time(body: &Value) -> Result<LabelledArray> {
    let depth = Axis::depth(numbers(field(body, &["depth", "data"])?, "depth")?);
    let time = time_axis(body)?;
    let rows = number_rows(field(body, &["variables", "T", "data"])?, "T")?;
    LabelledArray::from_rows(TEMPERATURE, depth, time, &rows)
}

/// Layout of the JSON files saved in an Alplakes export directory.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum ExportLayout {
    /// Delft3D point timeseries, `variables.T`
    Point,
    /// Simstrat surface series, `variables.temperature`
    SimstratSurface,
    /// Simstrat depth/time grid
    SimstratDepthTime,
}

impl ExportLayout {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportLayout::Point => "point",
            ExportLayout::SimstratSurface => "simstrat-surface",
            ExportLayout::SimstratDepthTime => "simstrat",
        }
    }

    fn parse(&self, body: &Value) -> Result<LabelledArray> {
        match self {
            ExportLayout::Point => parse_point_timeseries(body),
            ExportLayout::SimstratSurface => parse_simstrat_timeseries(body),
            ExportLayout::SimstratDepthTime => parse_simstrat_depth_time(body),
        }
    }
}

impl FromStr for ExportLayout {
    type Err = LimnoError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "point" => Ok(ExportLayout::Point),
            "simstrat-surface" => Ok(ExportLayout::SimstratSurface),
            "simstrat" => Ok(ExportLayout::SimstratDepthTime),
            other => Err(LimnoError::UnrecognizedKind {
                what: "layout (must be point, simstrat-surface or simstrat)",
                value: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for ExportLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Concatenate every JSON file of `layout` in `dir` along time. Depth/time
/// files must all report the same number of depths.
pub fn parse_directory(dir: &Path, layout: ExportLayout) -> Result<LabelledArray> {
    let fragments = json_files_in(dir)?
        .iter()
        .map(|path| layout.parse(&load_json::<Value>(path)?))
        .collect::<Result<Vec<_>>>()?;
    info!("Parsed {} {} files from {}", fragments.len(), layout, dir.display());
    concat_time(&fragments)
}
