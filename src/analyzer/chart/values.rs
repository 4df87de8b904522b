//! Values tree loading and merging.
//!
//! Builds the values tree the way Helm coalesces it: the chart's own
//! `values.yaml`, subchart defaults nested under each subchart's name, then
//! every user-supplied values file in order.

use std::fs::File;
use std::path::{Path, PathBuf};

use serde_yaml::{Mapping, Value};
use thiserror::Error;

use crate::analyzer::chart::archive::{self, is_chart_archive};
use crate::analyzer::chart::metadata::{ChartMetadata, load_chart_metadata, parse_chart_yaml};

const VALUES_FILE: &str = "values.yaml";
const CHARTS_DIR: &str = "charts";

/// Values file errors.
#[derive(Debug, Error)]
pub enum ValuesError {
    #[error("Values file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Failed to read values file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid YAML in values file {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

/// Parse values content; an empty document is an empty mapping.
pub fn parse_values(content: &str) -> Result<Value, serde_yaml::Error> {
    match serde_yaml::from_str::<Value>(content)? {
        Value::Null => Ok(Value::Mapping(Mapping::new())),
        values => Ok(values),
    }
}

/// Load a values file from disk.
pub fn load_values_file(path: &Path) -> Result<Value, ValuesError> {
    if !path.is_file() {
        return Err(ValuesError::NotFound(path.to_path_buf()));
    }
    let content = std::fs::read_to_string(path).map_err(|source| ValuesError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_values(&content).map_err(|source| ValuesError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Resolve values file paths against the working directory and check they exist.
pub fn resolve_values_files(files: &[PathBuf]) -> Result<Vec<PathBuf>, ValuesError> {
    let cwd = std::env::current_dir().unwrap_or_default();
    files
        .iter()
        .map(|file| {
            let path = if file.is_absolute() {
                file.clone()
            } else {
                cwd.join(file)
            };
            if path.is_file() {
                Ok(path)
            } else {
                Err(ValuesError::NotFound(file.clone()))
            }
        })
        .collect()
}

/// Deep-merge `overlay` into `base`.
///
/// Mappings merge key by key; any other value in `overlay` replaces the one
/// in `base`. A `null` in `overlay` deletes the key.
pub fn merge_values(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Mapping(base_map), Value::Mapping(overlay_map)) => {
            for (key, value) in overlay_map {
                if value.is_null() {
                    base_map.remove(&key);
                    continue;
                }
                match base_map.get_mut(&key) {
                    Some(existing) => merge_values(existing, value),
                    None => {
                        base_map.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}

/// Default values of a chart directory, subchart defaults included.
pub fn default_values(chart_root: &Path) -> Result<Value, ValuesError> {
    let own_values = chart_root.join(VALUES_FILE);
    let mut values = if own_values.is_file() {
        load_values_file(&own_values)?
    } else {
        Value::Mapping(Mapping::new())
    };

    let metadata = load_chart_metadata(chart_root);
    for (name, subchart_values) in subchart_defaults(chart_root) {
        let key = metadata
            .as_ref()
            .map(|m| m.values_key_for(&name).to_string())
            .unwrap_or(name);
        nest_subchart_values(&mut values, key, subchart_values);
    }

    Ok(values)
}

/// The merged values tree for a chart plus user-supplied files.
pub fn chart_values(chart_root: &Path, values_files: &[PathBuf]) -> Result<Value, ValuesError> {
    let mut values = default_values(chart_root)?;
    for file in values_files {
        log::debug!("Merging values file: {}", file.display());
        merge_values(&mut values, load_values_file(file)?);
    }
    Ok(values)
}

/// Put subchart defaults under `key`, with the parent's settings on top.
fn nest_subchart_values(values: &mut Value, key: String, defaults: Value) {
    let Value::Mapping(map) = values else {
        return;
    };
    let key = Value::String(key);
    let mut merged = defaults;
    if let Some(parent) = map.remove(&key) {
        merge_values(&mut merged, parent);
    }
    map.insert(key, merged);
}

/// Default values of every subchart under `charts/`, keyed by chart name.
fn subchart_defaults(chart_root: &Path) -> Vec<(String, Value)> {
    let Ok(entries) = std::fs::read_dir(chart_root.join(CHARTS_DIR)) else {
        return Vec::new();
    };

    let mut paths: Vec<PathBuf> = entries.filter_map(|e| e.ok()).map(|e| e.path()).collect();
    paths.sort();

    let mut subcharts = Vec::new();
    for path in paths {
        let loaded = if path.is_dir() {
            subchart_from_dir(&path)
        } else if is_chart_archive(&path) {
            subchart_from_archive(&path)
        } else {
            continue;
        };

        match loaded {
            Ok(Some(subchart)) => subcharts.push(subchart),
            Ok(None) => {}
            Err(e) => log::warn!("Skipping subchart values in {}: {}", path.display(), e),
        }
    }
    subcharts
}

fn subchart_from_dir(dir: &Path) -> Result<Option<(String, Value)>, String> {
    let Some(name) = load_chart_metadata(dir)
        .map(|m| m.name)
        .or_else(|| dir.file_name().map(|n| n.to_string_lossy().into_owned()))
    else {
        return Ok(None);
    };
    let values = default_values(dir).map_err(|e| e.to_string())?;
    Ok(Some((name, values)))
}

fn subchart_from_archive(path: &Path) -> Result<Option<(String, Value)>, String> {
    let file = File::open(path).map_err(|e| e.to_string())?;
    let files = archive::read_chart_files(file, &["Chart.yaml", VALUES_FILE])
        .map_err(|e| e.to_string())?;

    let Some(metadata) = files
        .get("Chart.yaml")
        .and_then(|content| parse_chart_yaml(content).ok())
    else {
        return Ok(None);
    };
    let ChartMetadata { name, .. } = metadata;

    let values = match files.get(VALUES_FILE) {
        Some(content) => parse_values(content).map_err(|e| e.to_string())?,
        None => Value::Mapping(Mapping::new()),
    };
    Ok(Some((name, values)))
}
