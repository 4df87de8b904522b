//! Chart acquisition: local paths, URLs and uploaded archives.

use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tempfile::TempDir;
use thiserror::Error;

use crate::analyzer::chart::archive;
use crate::analyzer::chart::helm::is_helm_chart;

/// Chart acquisition errors.
#[derive(Debug, Error)]
pub enum ChartError {
    #[error("Chart path not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Not a valid Helm chart directory: {}", .0.display())]
    NotAChart(PathBuf),

    #[error("Unsupported chart format: {} (only directory or .tgz file supported)", .0.display())]
    UnsupportedFormat(PathBuf),

    #[error("Unexpected chart archive structure: {0} top-level entries found")]
    ArchiveLayout(usize),

    #[error("Failed to read chart archive {}: {message}", .path.display())]
    Archive { path: PathBuf, message: String },

    #[error("Invalid URL format: {0} (must start with http:// or https://)")]
    InvalidUrl(String),

    #[error("Failed to download chart from {url}: {message}")]
    Download { url: String, message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Where a chart comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChartSource {
    /// A chart directory or a `.tgz` archive on disk.
    Path(PathBuf),
    /// An `http://` or `https://` URL of a `.tgz` archive.
    Url(String),
    /// The bytes of an uploaded `.tgz` archive.
    Archive(Vec<u8>),
}

impl ChartSource {
    /// Short human-readable description for logs.
    pub fn describe(&self) -> String {
        match self {
            Self::Path(path) => path.display().to_string(),
            Self::Url(url) => url.clone(),
            Self::Archive(bytes) => format!("uploaded archive ({} bytes)", bytes.len()),
        }
    }

    /// Make the chart available as a directory on disk.
    pub fn prepare(&self, download_timeout: Duration) -> Result<PreparedChart, ChartError> {
        match self {
            Self::Path(path) => prepare_chart(path),
            Self::Url(url) => {
                let bytes = download_chart(url, download_timeout)?;
                PreparedChart::unpack(&bytes)
            }
            Self::Archive(bytes) => PreparedChart::unpack(bytes),
        }
    }
}

/// A chart directory ready for rendering.
///
/// Unpacked archives live in a temporary directory that is removed when
/// this value is dropped.
#[derive(Debug)]
pub struct PreparedChart {
    root: PathBuf,
    workdir: Option<TempDir>,
}

impl PreparedChart {
    /// A chart directory owned by the caller.
    pub fn in_place(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            workdir: None,
        }
    }

    /// Unpack archive bytes into a fresh temporary directory.
    pub fn unpack(bytes: &[u8]) -> Result<Self, ChartError> {
        let workdir = tempfile::Builder::new().prefix("chart-scan-").tempdir()?;
        log::debug!("Created temporary working directory: {}", workdir.path().display());
        let root = archive::unpack_chart(Cursor::new(bytes), workdir.path())?;
        Ok(Self {
            root,
            workdir: Some(workdir),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Whether the chart lives in a temporary directory.
    pub fn is_temporary(&self) -> bool {
        self.workdir.is_some()
    }
}

/// Prepare a chart given as a directory or a `.tgz` archive.
pub fn prepare_chart(path: &Path) -> Result<PreparedChart, ChartError> {
    log::info!("Preparing chart: {}", path.display());

    if !path.exists() {
        return Err(ChartError::NotFound(path.to_path_buf()));
    }

    if path.is_dir() {
        if !is_helm_chart(path) {
            return Err(ChartError::NotAChart(path.to_path_buf()));
        }
        log::info!("Using directory chart: {}", path.display());
        return Ok(PreparedChart::in_place(path));
    }

    if path.is_file() && archive::is_chart_archive(path) {
        log::info!("Using compressed chart: {}", path.display());
        let workdir = tempfile::Builder::new().prefix("chart-scan-").tempdir()?;
        let root = archive::extract_chart(path, workdir.path())?;
        return Ok(PreparedChart {
            root,
            workdir: Some(workdir),
        });
    }

    Err(ChartError::UnsupportedFormat(path.to_path_buf()))
}

/// Check that a chart URL uses http or https.
pub fn validate_url(url: &str) -> Result<(), ChartError> {
    if url.starts_with("http://") || url.starts_with("https://") {
        Ok(())
    } else {
        Err(ChartError::InvalidUrl(url.to_string()))
    }
}

/// Download a chart archive.
pub fn download_chart(url: &str, timeout: Duration) -> Result<Vec<u8>, ChartError> {
    validate_url(url)?;
    log::info!("Downloading chart from URL: {}", url);

    let download_error = |message: String| ChartError::Download {
        url: url.to_string(),
        message,
    };

    let client = reqwest::blocking::Client::builder()
        .timeout(timeout)
        .user_agent(concat!("chart-image-scanner/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| download_error(e.to_string()))?;

    let response = client
        .get(url)
        .send()
        .map_err(|e| download_error(e.to_string()))?;

    if !response.status().is_success() {
        return Err(download_error(format!("server returned {}", response.status())));
    }

    let bytes = response
        .bytes()
        .map_err(|e| download_error(e.to_string()))?;
    log::info!("Downloaded {} bytes", bytes.len());
    Ok(bytes.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::chart::archive::tests::make_tgz;

    #[test]
    fn test_missing_path() {
        let err = prepare_chart(Path::new("/nonexistent/chart.tgz")).unwrap_err();
        assert!(matches!(err, ChartError::NotFound(_)));
        assert!(err.to_string().starts_with("Chart path not found"));
    }

    #[test]
    fn test_directory_without_chart_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let err = prepare_chart(dir.path()).unwrap_err();
        assert!(err.to_string().contains("Not a valid Helm chart directory"));
    }

    #[test]
    fn test_directory_chart_in_place() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("Chart.yaml"), "name: web\n").unwrap();
        let chart = prepare_chart(dir.path()).unwrap();
        assert_eq!(chart.root(), dir.path());
        assert!(!chart.is_temporary());
    }

    #[test]
    fn test_unsupported_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("chart.txt");
        std::fs::write(&file, "hello").unwrap();
        let err = prepare_chart(&file).unwrap_err();
        assert!(matches!(err, ChartError::UnsupportedFormat(_)));
    }

    #[test]
    fn test_archive_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("web-0.1.0.tgz");
        std::fs::write(&file, make_tgz(&[("web/Chart.yaml", "name: web\n")])).unwrap();

        let chart = prepare_chart(&file).unwrap();
        assert!(chart.is_temporary());
        assert!(chart.root().join("Chart.yaml").is_file());
        assert_eq!(chart.root().file_name().unwrap(), "web");
    }

    #[test]
    fn test_uploaded_archive_is_cleaned_up() {
        let data = make_tgz(&[("web/Chart.yaml", "name: web\n")]);
        let chart = ChartSource::Archive(data).prepare(Duration::from_secs(1)).unwrap();
        let root = chart.root().to_path_buf();
        assert!(root.is_dir());
        drop(chart);
        assert!(!root.exists());
    }

    #[test]
    fn test_invalid_url() {
        let err = ChartSource::Url("ftp://example.com/chart.tgz".to_string())
            .prepare(Duration::from_secs(1))
            .unwrap_err();
        assert!(err.to_string().contains("Invalid URL format:"));
        assert!(err.to_string().contains("must start with http:// or https://"));
    }

    #[test]
    fn test_describe() {
        assert_eq!(
            ChartSource::Archive(vec![0; 4]).describe(),
            "uploaded archive (4 bytes)"
        );
    }
}
