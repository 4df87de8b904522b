use serde::{Deserialize, Serialize};

use crate::analyzer::images::DEFAULT_MAX_DEPTH;

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub scan: ScanConfig,
    pub download: DownloadConfig,
    pub server: ServerConfig,
}

/// Chart scanning configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Helm executable name or path
    pub helm_binary: String,
    /// Release name passed to `helm template`
    pub release_name: String,
    /// Run `helm dependency update` before rendering
    pub dependency_update: bool,
    /// Also search the merged values tree
    pub include_values_tree: bool,
    /// Maximum tree nesting before a tree is abandoned
    pub max_depth: usize,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            helm_binary: "helm".to_string(),
            release_name: "dummy".to_string(),
            dependency_update: true,
            include_values_tree: true,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// Chart download configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DownloadConfig {
    pub timeout_secs: u64,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self { timeout_secs: 60 }
    }
}

/// Tool server configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// `stdio` or `http`
    pub transport: String,
    pub host: String,
    pub port: u16,
    /// HTTP endpoint path for JSON-RPC requests
    pub path: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            transport: "stdio".to_string(),
            host: "127.0.0.1".to_string(),
            port: 8000,
            path: "/mcp".to_string(),
        }
    }
}
