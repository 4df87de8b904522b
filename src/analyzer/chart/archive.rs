//! Chart archive (`.tgz`) handling.

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::{Component, Path, PathBuf};

use flate2::read::GzDecoder;

use crate::analyzer::chart::source::ChartError;

/// File name suffixes accepted as chart archives.
pub const ARCHIVE_SUFFIXES: [&str; 2] = [".tgz", ".tar.gz"];

/// Whether `path` looks like a chart archive.
pub fn is_chart_archive(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|n| ARCHIVE_SUFFIXES.iter().any(|suffix| n.ends_with(suffix)))
        .unwrap_or(false)
}

/// Extract a chart archive into `dest` and return the chart root.
pub fn extract_chart(archive: &Path, dest: &Path) -> Result<PathBuf, ChartError> {
    log::info!("Extracting chart archive: {}", archive.display());
    let file = File::open(archive)?;
    unpack_chart(file, dest).map_err(|e| match e {
        ChartError::Io(io) => ChartError::Archive {
            path: archive.to_path_buf(),
            message: io.to_string(),
        },
        other => other,
    })
}

/// Unpack a gzip-compressed tarball into `dest`.
///
/// A chart archive holds exactly one top-level directory, which is returned.
/// Entries that would land outside `dest` are skipped by `tar`.
pub fn unpack_chart<R: Read>(reader: R, dest: &Path) -> Result<PathBuf, ChartError> {
    let mut archive = tar::Archive::new(GzDecoder::new(reader));
    archive.unpack(dest)?;

    let roots: Vec<PathBuf> = std::fs::read_dir(dest)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_dir())
        .collect();

    match roots.as_slice() {
        [root] => {
            log::info!("Chart root directory: {}", root.display());
            Ok(root.clone())
        }
        _ => Err(ChartError::ArchiveLayout(roots.len())),
    }
}

/// Read top-level chart files (e.g. `Chart.yaml`, `values.yaml`) from an
/// archive without unpacking it. Keys are the bare file names.
pub fn read_chart_files<R: Read>(
    reader: R,
    names: &[&str],
) -> std::io::Result<HashMap<String, String>> {
    let mut archive = tar::Archive::new(GzDecoder::new(reader));
    let mut files = HashMap::new();

    for entry in archive.entries()? {
        let mut entry = entry?;
        let path = entry.path()?.into_owned();
        let components: Vec<_> = path
            .components()
            .filter(|c| matches!(c, Component::Normal(_)))
            .collect();

        // Only `<chart>/<file>`; nested subchart files are ignored
        let [_, Component::Normal(file_name)] = components.as_slice() else {
            continue;
        };
        let Some(file_name) = file_name.to_str() else {
            continue;
        };
        if !names.contains(&file_name) {
            continue;
        }

        let mut content = String::new();
        entry.read_to_string(&mut content)?;
        files.insert(file_name.to_string(), content);
    }

    Ok(files)
}
