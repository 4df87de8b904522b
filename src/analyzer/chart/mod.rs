//! Helm chart scanning.
//!
//! A scan makes the chart available on disk (directory, local archive,
//! download or upload), refreshes its dependencies, renders it with
//! `helm template`, rebuilds the merged values tree and hands both to
//! image discovery.
//!
//! # Example
//!
//! ```rust,no_run
//! use chart_image_scanner::analyzer::chart::{ChartScanner, ChartSource, ScanRequest};
//! use chart_image_scanner::config::Config;
//!
//! # fn main() -> chart_image_scanner::Result<()> {
//! let scanner = ChartScanner::from_config(&Config::default());
//! let report = scanner.scan(&ScanRequest::new(ChartSource::Path("./my-chart".into())))?;
//! for image in &report.discovery.images {
//!     println!("{}", image);
//! }
//! # Ok(())
//! # }
//! ```

pub mod archive;
pub mod helm;
pub mod metadata;
pub mod source;
pub mod values;

use std::path::PathBuf;
use std::time::Duration;

use serde_yaml::{Mapping, Value};

use crate::analyzer::images::{Discovery, DiscoveryOptions, discover};
use crate::config::Config;
use crate::error::Result;

pub use archive::{extract_chart, is_chart_archive, unpack_chart};
pub use helm::{HelmCli, HelmError, ManifestRenderer, is_helm_chart};
pub use metadata::{ChartMetadata, Dependency, load_chart_metadata};
pub use source::{ChartError, ChartSource, PreparedChart, download_chart, prepare_chart};
pub use values::{ValuesError, chart_values, merge_values, resolve_values_files};

/// Scanner knobs that are not about discovery itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanSettings {
    /// Run `helm dependency update` before rendering.
    pub dependency_update: bool,
    pub download_timeout: Duration,
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            dependency_update: true,
            download_timeout: Duration::from_secs(60),
        }
    }
}

/// One chart to scan.
#[derive(Debug, Clone)]
pub struct ScanRequest {
    pub source: ChartSource,
    /// Values files applied in order, later ones winning.
    pub values_files: Vec<PathBuf>,
    pub options: DiscoveryOptions,
}

impl ScanRequest {
    pub fn new(source: ChartSource) -> Self {
        Self {
            source,
            values_files: Vec::new(),
            options: DiscoveryOptions::default(),
        }
    }

    pub fn with_values_files(mut self, values_files: Vec<PathBuf>) -> Self {
        self.values_files = values_files;
        self
    }

    pub fn with_options(mut self, options: DiscoveryOptions) -> Self {
        self.options = options;
        self
    }
}

/// Outcome of a chart scan.
#[derive(Debug, Clone)]
pub struct ScanReport {
    /// Chart.yaml of the scanned chart, if it could be read.
    pub chart: Option<ChartMetadata>,
    pub discovery: Discovery,
}

/// Scans Helm charts for container images.
#[derive(Debug, Clone, Default)]
pub struct ChartScanner<R = HelmCli> {
    renderer: R,
    settings: ScanSettings,
}

impl ChartScanner<HelmCli> {
    pub fn from_config(config: &Config) -> Self {
        Self {
            renderer: HelmCli::from_config(&config.scan),
            settings: ScanSettings {
                dependency_update: config.scan.dependency_update,
                download_timeout: Duration::from_secs(config.download.timeout_secs),
            },
        }
    }
}

impl<R: ManifestRenderer> ChartScanner<R> {
    pub fn new(renderer: R, settings: ScanSettings) -> Self {
        Self { renderer, settings }
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    /// Scan one chart.
    ///
    /// Values files are checked before the chart is touched, so a typo in a
    /// path fails fast without a download.
    pub fn scan(&self, request: &ScanRequest) -> Result<ScanReport> {
        log::info!("Scanning chart: {}", request.source.describe());

        let values_files = resolve_values_files(&request.values_files)?;
        let chart = request.source.prepare(self.settings.download_timeout)?;
        let root = chart.root();

        if self.settings.dependency_update {
            self.renderer.dependency_update(root);
        }

        let render_files = if values_files.is_empty() {
            let defaults = root.join("values.yaml");
            if defaults.is_file() {
                vec![defaults]
            } else {
                Vec::new()
            }
        } else {
            values_files.clone()
        };
        let manifests = self.renderer.render(root, &render_files)?;

        let values = if request.options.include_values_tree {
            chart_values(root, &values_files)?
        } else {
            Value::Mapping(Mapping::new())
        };

        let discovery = discover(&manifests, &values, &request.options);
        let metadata = load_chart_metadata(root);
        if let Some(metadata) = &metadata {
            log::info!(
                "Found {} images in chart {}",
                discovery.images.len(),
                metadata.display_name()
            );
        }

        Ok(ScanReport {
            chart: metadata,
            discovery,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::chart::archive::tests::make_tgz;
    use crate::analyzer::images::NormalizeMode;
    use crate::error::ScannerError;
    use std::cell::RefCell;
    use std::path::Path;

    /// Renderer that returns canned manifests and records its calls.
    #[derive(Default)]
    struct StubRenderer {
        manifests: String,
        calls: RefCell<Vec<(String, Vec<PathBuf>)>>,
    }

    impl StubRenderer {
        fn returning(manifests: &str) -> Self {
            Self {
                manifests: manifests.to_string(),
                ..Self::default()
            }
        }
    }

    impl ManifestRenderer for StubRenderer {
        fn dependency_update(&self, _chart: &Path) {
            self.calls
                .borrow_mut()
                .push(("dependency_update".to_string(), Vec::new()));
        }

        fn render(&self, _chart: &Path, values_files: &[PathBuf]) -> std::result::Result<String, HelmError> {
            self.calls
                .borrow_mut()
                .push(("render".to_string(), values_files.to_vec()));
            Ok(self.manifests.clone())
        }
    }

    struct FailingRenderer;

    impl ManifestRenderer for FailingRenderer {
        fn dependency_update(&self, _chart: &Path) {}

        fn render(&self, _chart: &Path, _values_files: &[PathBuf]) -> std::result::Result<String, HelmError> {
            Err(HelmError::RenderError("template: boom".to_string()))
        }
    }

    const DEPLOYMENT: &str = r#"---
# Source: web/templates/deployment.yaml
apiVersion: apps/v1
kind: Deployment
spec:
  template:
    spec:
      containers:
        - name: web
          image: nginx:1.25
"#;

    fn chart_dir() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("Chart.yaml"), "name: web\nversion: 0.1.0\n").unwrap();
        std::fs::write(
            dir.path().join("values.yaml"),
            "metrics:\n  image:\n    repository: prom/statsd-exporter\n    tag: v0.26.0\n",
        )
        .unwrap();
        dir
    }

    #[test]
    fn test_scan_directory() {
        let dir = chart_dir();
        let scanner = ChartScanner::new(StubRenderer::returning(DEPLOYMENT), ScanSettings::default());
        let report = scanner
            .scan(&ScanRequest::new(ChartSource::Path(dir.path().to_path_buf())))
            .unwrap();

        assert_eq!(
            report.discovery.images,
            vec!["nginx:1.25", "prom/statsd-exporter:v0.26.0"]
        );
        assert_eq!(report.chart.unwrap().display_name(), "web-0.1.0");

        let calls = scanner.renderer().calls.borrow();
        assert_eq!(calls[0].0, "dependency_update");
        // The chart's own values.yaml is passed when no values files are given
        assert_eq!(calls[1], ("render".to_string(), vec![dir.path().join("values.yaml")]));
    }

    #[test]
    fn test_scan_without_values_tree() {
        let dir = chart_dir();
        let scanner = ChartScanner::new(
            StubRenderer::returning(DEPLOYMENT),
            ScanSettings {
                dependency_update: false,
                ..ScanSettings::default()
            },
        );
        let request = ScanRequest::new(ChartSource::Path(dir.path().to_path_buf()))
            .with_options(DiscoveryOptions::default().with_values_tree(false));
        let report = scanner.scan(&request).unwrap();

        assert_eq!(report.discovery.images, vec!["nginx:1.25"]);
        assert_eq!(scanner.renderer().calls.borrow().len(), 1);
    }

    #[test]
    fn test_scan_with_values_files() {
        let dir = chart_dir();
        let prod = dir.path().join("prod.yaml");
        std::fs::write(&prod, "metrics:\n  image:\n    tag: v0.27.0\n").unwrap();

        let scanner = ChartScanner::new(StubRenderer::returning(DEPLOYMENT), ScanSettings::default());
        let request = ScanRequest::new(ChartSource::Path(dir.path().to_path_buf()))
            .with_values_files(vec![prod.clone()])
            .with_options(DiscoveryOptions::default().with_mode(NormalizeMode::Canonical));
        let report = scanner.scan(&request).unwrap();

        assert_eq!(
            report.discovery.images,
            vec!["nginx:1.25", "prom/statsd-exporter:v0.27.0"]
        );
        assert_eq!(scanner.renderer().calls.borrow()[1].1, vec![prod]);
    }

    #[test]
    fn test_missing_values_file_fails_before_render() {
        let dir = chart_dir();
        let scanner = ChartScanner::new(StubRenderer::returning(DEPLOYMENT), ScanSettings::default());
        let request = ScanRequest::new(ChartSource::Path(dir.path().to_path_buf()))
            .with_values_files(vec![PathBuf::from("/nonexistent/prod.yaml")]);
        let err = scanner.scan(&request).unwrap_err();

        assert!(matches!(err, ScannerError::Values(ValuesError::NotFound(_))));
        assert!(scanner.renderer().calls.borrow().is_empty());
    }

    #[test]
    fn test_scan_uploaded_archive() {
        let data = make_tgz(&[
            ("web/Chart.yaml", "name: web\n"),
            ("web/values.yaml", "image:\n  repository: redis\n  tag: \"7\"\n"),
        ]);
        let scanner = ChartScanner::new(StubRenderer::returning(""), ScanSettings::default());
        let report = scanner.scan(&ScanRequest::new(ChartSource::Archive(data))).unwrap();
        assert_eq!(report.discovery.images, vec!["redis:7"]);
    }

    #[test]
    fn test_render_failure() {
        let dir = chart_dir();
        let scanner = ChartScanner::new(FailingRenderer, ScanSettings::default());
        let err = scanner
            .scan(&ScanRequest::new(ChartSource::Path(dir.path().to_path_buf())))
            .unwrap_err();
        assert!(matches!(err, ScannerError::Helm(HelmError::RenderError(_))));
    }

    #[test]
    fn test_not_a_chart() {
        let dir = tempfile::tempdir().unwrap();
        let scanner = ChartScanner::new(StubRenderer::default(), ScanSettings::default());
        let err = scanner
            .scan(&ScanRequest::new(ChartSource::Path(dir.path().to_path_buf())))
            .unwrap_err();
        assert!(matches!(err, ScannerError::Chart(ChartError::NotAChart(_))));
    }
}
