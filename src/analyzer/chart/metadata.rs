//! Chart.yaml parser.
//!
//! Only the fields needed to label scans and to key subchart values are kept.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Chart dependency.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Dependency {
    /// Dependency chart name
    pub name: String,
    /// Version constraint (SemVer)
    pub version: Option<String>,
    /// Repository URL
    pub repository: Option<String>,
    /// Alias for the dependency; replaces `name` as the values key
    pub alias: Option<String>,
}

impl Dependency {
    /// The key under which the parent chart's values configure this dependency.
    pub fn values_key(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }
}

/// Parsed Chart.yaml metadata.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ChartMetadata {
    /// The chart API version (v1 or v2)
    #[serde(rename = "apiVersion", default)]
    pub api_version: Option<String>,

    /// The name of the chart
    pub name: String,

    /// A SemVer 2 version
    #[serde(default)]
    pub version: Option<String>,

    /// The version of the app that this contains
    #[serde(rename = "appVersion", default)]
    pub app_version: Option<String>,

    /// A list of chart dependencies
    #[serde(default)]
    pub dependencies: Vec<Dependency>,
}

impl ChartMetadata {
    /// Values key for a subchart called `name`, honoring dependency aliases.
    pub fn values_key_for<'a>(&'a self, name: &'a str) -> &'a str {
        self.dependencies
            .iter()
            .find(|d| d.name == name)
            .map(Dependency::values_key)
            .unwrap_or(name)
    }

    /// `name-version` when the version is known.
    pub fn display_name(&self) -> String {
        match &self.version {
            Some(version) => format!("{}-{}", self.name, version),
            None => self.name.clone(),
        }
    }
}

/// Parse Chart.yaml content.
pub fn parse_chart_yaml(content: &str) -> Result<ChartMetadata, serde_yaml::Error> {
    serde_yaml::from_str(content)
}

/// Read Chart.yaml (or Chart.yml) from a chart directory.
pub fn load_chart_metadata(chart_root: &Path) -> Option<ChartMetadata> {
    let path = ["Chart.yaml", "Chart.yml"]
        .iter()
        .map(|name| chart_root.join(name))
        .find(|p| p.is_file())?;

    let content = match std::fs::read_to_string(&path) {
        Ok(content) => content,
        Err(e) => {
            log::warn!("Failed to read {}: {}", path.display(), e);
            return None;
        }
    };

    match parse_chart_yaml(&content) {
        Ok(metadata) => Some(metadata),
        Err(e) => {
            log::warn!("Failed to parse {}: {}", path.display(), e);
            None
        }
    }
}
