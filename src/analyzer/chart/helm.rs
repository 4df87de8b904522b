//! Helm chart rendering.
//!
//! Rendering shells out to `helm template`. It sits behind the
//! `ManifestRenderer` trait so chart scans can run against a stub.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::common::command_utils::{command_stdout, execute_command, is_command_available};
use crate::config::ScanConfig;

pub const HELM_INSTALL_URL: &str = "https://helm.sh/docs/intro/install/";

/// Turns a chart directory into a multi-document manifest stream.
pub trait ManifestRenderer {
    /// Fetch chart dependencies into `charts/`. Failures are not fatal.
    fn dependency_update(&self, chart: &Path);

    /// Render the chart with the given values files, in order.
    fn render(&self, chart: &Path, values_files: &[PathBuf]) -> Result<String, HelmError>;
}

/// The `helm` command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HelmCli {
    pub binary: String,
    pub release_name: String,
}

impl Default for HelmCli {
    fn default() -> Self {
        Self {
            binary: "helm".to_string(),
            release_name: "dummy".to_string(),
        }
    }
}

impl HelmCli {
    pub fn from_config(config: &ScanConfig) -> Self {
        Self {
            binary: config.helm_binary.clone(),
            release_name: config.release_name.clone(),
        }
    }

    pub fn is_available(&self) -> bool {
        is_command_available(&self.binary, &["version", "--short"])
    }

    pub fn version(&self) -> Option<String> {
        command_stdout(&self.binary, &["version", "--short"])
    }

    fn template_args(&self, chart: &Path, values_files: &[PathBuf]) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            "template".into(),
            self.release_name.clone().into(),
            chart.as_os_str().to_owned(),
        ];
        for values in values_files {
            args.push("-f".into());
            args.push(values.as_os_str().to_owned());
        }
        args
    }
}

impl ManifestRenderer for HelmCli {
    fn dependency_update(&self, chart: &Path) {
        log::info!("Updating chart dependencies: {}", chart.display());
        match execute_command(
            &self.binary,
            [OsString::from("dependency"), "update".into(), chart.as_os_str().to_owned()],
        ) {
            Ok(output) if output.status.success() => {}
            Ok(output) => log::warn!(
                "helm dependency update failed: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            ),
            Err(e) => log::warn!("helm dependency update failed: {}", e),
        }
    }

    fn render(&self, chart: &Path, values_files: &[PathBuf]) -> Result<String, HelmError> {
        let Some(version) = self.version() else {
            return Err(HelmError::HelmNotFound(self.binary.clone()));
        };
        log::debug!("Using helm {}", version);
        log::info!("Rendering chart: {}", chart.display());
        let output = execute_command(&self.binary, self.template_args(chart, values_files))
            .map_err(|e| HelmError::RenderError(e.to_string()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(HelmError::RenderError(stderr.trim().to_string()));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// Check if a directory is a Helm chart.
pub fn is_helm_chart(path: &Path) -> bool {
    path.join("Chart.yaml").exists() || path.join("Chart.yml").exists()
}

/// Helm rendering errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HelmError {
    /// Helm binary not found.
    HelmNotFound(String),
    /// `helm template` failed.
    RenderError(String),
}

impl std::fmt::Display for HelmError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::HelmNotFound(binary) => write!(
                f,
                "{} binary not found in PATH. Install Helm: {}",
                binary, HELM_INSTALL_URL
            ),
            Self::RenderError(msg) => write!(f, "Failed to render chart: {}", msg),
        }
    }
}

impl std::error::Error for HelmError {}
