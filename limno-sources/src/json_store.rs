//! Pass-through persistence of API responses as pretty-printed JSON files.

use limno_data::error::{LimnoError, Result};
use serde::{de::DeserializeOwned, Serialize};
use std::{
    fs,
    io::{BufReader, BufWriter, Write},
    path::{Path, PathBuf},
};

/// Write `value` to `path`, creating parent directories as needed.
pub fn save_json<T: Serialize + ?Sized>(value: &T, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let writer = BufWriter::new(fs::File::create(path)?);
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(writer, formatter);
    value.serialize(&mut serializer)?;
    serializer.into_inner().flush()?;
    Ok(())
}

pub fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let reader = BufReader::new(fs::File::open(path)?);
    Ok(serde_json::from_reader(reader)?)
}

/// Every `*.json` file directly inside `dir`, sorted by name.
pub fn json_files_in(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut paths = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == "json"))
        .collect::<Vec<PathBuf>>();
    if paths.is_empty() {
        return Err(LimnoError::EmptyResult(format!(
            "No json files found in directory {}",
            dir.display()
        )));
    }
    paths.sort();
    Ok(paths)
}
