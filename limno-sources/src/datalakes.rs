//! Datalakes measurement archive.
//!
//! A dataset is a list of files. Each file is fetched whole, parsed
//! according to its [`SourceKind`], snapped onto the kind's canonical depth
//! axis and finally merged with its siblings.

use crate::{
    fetch::{fetch_checked, fetch_json, HttpFetch},
    kind::{Datatype, SourceKind, TimeLayout},
    payload::{field, number_rows, numbers},
};
use chrono::{DateTime, Utc};
use limno_data::{
    axis::Axis,
    error::{LimnoError, Result},
    jitter::jitter_duplicates,
    merge::{merge_datasets, reindex_dataset},
    resolve::NearestPolicy,
    Dataset, LabelledArray,
};
use limno_nc::datalakes::read_velocity_on_standard_depths;
use limno_utils::dates::parse_iso_instant;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::{fs, path::Path};

pub const BASE_URL: &str = "https://api.datalakes-eawag.ch";

pub fn files_url(dataset_id: u64) -> String {
    format!("{}/files?datasets_id={}", BASE_URL, dataset_id)
}

pub fn download_url(file_id: u64) -> String {
    format!("{}/download/{}", BASE_URL, file_id)
}

/// One entry of a dataset's file listing. Unknown fields are ignored.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct FileProperties {
    pub id: u64,
    pub filetype: String,
    pub mindatetime: Option<String>,
    pub maxdatetime: Option<String>,
}

/// Ids of the files stored as `datatype`, in listing order.
pub fn filter_by_datatype(files: &[FileProperties], datatype: Datatype) -> Result<Vec<u64>> {
    let ids: Vec<u64> = files
        .iter()
        .filter(|f| f.filetype == datatype.as_str())
        .map(|f| f.id)
        .collect();
    if ids.is_empty() {
        return Err(LimnoError::EmptyResult(format!(
            "No data of type {} found among {} files",
            datatype,
            files.len()
        )));
    }
    Ok(ids)
}

fn instant(raw: &str) -> Result<DateTime<Utc>> {
    parse_iso_instant(raw).map_err(|e| LimnoError::DateParse(format!("{}: {}", raw, e)))
}

/// Ids of the files whose first or last sample falls strictly inside
/// `(start, end)`. Files missing either bound are skipped.
pub fn filter_by_dates(files: &[FileProperties], start: &DateTime<Utc>, end: &DateTime<Utc>) -> Result<Vec<u64>> {
    let mut ids = Vec::new();
    for file in files {
        let (Some(min), Some(max)) = (&file.mindatetime, &file.maxdatetime) else {
            continue;
        };
        let min = instant(min)?;
        let max = instant(max)?;
        if (min > *start && min < *end) || (max > *start && max < *end) {
            ids.push(file.id);
        }
    }
    if ids.is_empty() {
        return Err(LimnoError::EmptyResult(format!(
            "No data between date {} and {} found among {} files",
            start,
            end,
            files.len()
        )));
    }
    Ok(ids)
}

fn time_axis(body: &Value, kind: SourceKind) -> Result<Axis> {
    let fields = kind.fields();
    let raw = numbers(field(body, &[fields.time_key])?, fields.time_key)?;
    match fields.time_layout {
        TimeLayout::Series => Ok(Axis::time_from_epoch(raw)),
        TimeLayout::SingleInstant => raw
            .first()
            .map(|t| Axis::time_from_epoch(vec![*t]))
            .ok_or_else(|| LimnoError::MissingField(format!("{}[0]", fields.time_key))),
    }
}

/// Turn one downloaded JSON file into a dataset over `(depth, time)`.
///
/// Depths are negated so they point down as negative numbers; kinds with a
/// canonical depth axis are snapped onto it by nearest label.
pub fn parse_measurement(body: &Value, kind: SourceKind) -> Result<Dataset> {
    let fields = kind.fields();
    let time = time_axis(body, kind)?;
    let mut depths = numbers(field(body, &[fields.depth_key])?, fields.depth_key)?;
    if fields.jitter_depths {
        depths = jitter_duplicates(&depths);
    }
    let depth = Axis::depth(depths).negated();

    let mut dataset = Dataset::new();
    for &(key, variable) in fields.value_keys {
        let rows = number_rows(field(body, &[key])?, key)?;
        dataset.insert(LabelledArray::from_rows(variable, depth.clone(), time.clone(), &rows)?);
    }

    match kind.canonical_depths() {
        Some(target) => reindex_dataset(&dataset, &target, NearestPolicy::Unbounded),
        None => Ok(dataset),
    }
}

/// Fetch and parse one JSON file.
pub async fn download_and_parse_json<F: HttpFetch>(client: &F, file_id: u64, kind: SourceKind) -> Result<Dataset> {
    let body: Value = fetch_json(client, &download_url(file_id)).await?;
    parse_measurement(&body, kind)
}

/// Fetch one NetCDF file into `temp_folder` and read its velocity on the
/// standard depths.
pub async fn download_and_parse_nc<F: HttpFetch>(client: &F, file_id: u64, temp_folder: &Path) -> Result<Dataset> {
    let response = fetch_checked(client, &download_url(file_id)).await?;
    let path = temp_folder.join(format!("data_{}.nc", file_id));
    fs::write(&path, &response.body)?;
    info!("Saved {} bytes to {}", response.body.len(), path.display());
    read_velocity_on_standard_depths(&path)
}

/// Everything needed to pull one Datalakes dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetRequest {
    pub dataset_id: u64,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub kind: SourceKind,
    pub datatype: Datatype,
}

/// Download every matching file of a dataset. Returns the parsed
/// fragments in listing order together with their merge.
///
/// JSON files are restricted to the requested period; NetCDF files are
/// taken whole.
pub async fn download_dataset<F: HttpFetch>(
    client: &F,
    request: &DatasetRequest,
    temp_folder: &Path,
) -> Result<(Vec<Dataset>, Dataset)> {
    let files: Vec<FileProperties> = fetch_json(client, &files_url(request.dataset_id)).await?;
    let mut ids = filter_by_datatype(&files, request.datatype)?;
    if request.datatype == Datatype::Json {
        let in_period = filter_by_dates(&files, &request.start, &request.end)?;
        ids.retain(|id| in_period.contains(id));
        if ids.is_empty() {
            warn!("Dataset {} has no json file inside the period", request.dataset_id);
            return Err(LimnoError::EmptyResult(format!(
                "No json data between {} and {} in dataset {}",
                request.start, request.end, request.dataset_id
            )));
        }
    }
    fs::create_dir_all(temp_folder)?;

    let mut fragments = Vec::with_capacity(ids.len());
    for id in ids {
        let fragment = match request.datatype {
            Datatype::Json => download_and_parse_json(client, id, request.kind).await?,
            Datatype::Nc => download_and_parse_nc(client, id, temp_folder).await?,
        };
        fragments.push(fragment);
    }
    info!("Merging {} fragments of dataset {}", fragments.len(), request.dataset_id);
    let merged = merge_datasets(&fragments)?;
    Ok((fragments, merged))
}
