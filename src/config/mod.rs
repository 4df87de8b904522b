pub mod types;

pub use types::{Config, DownloadConfig, ScanConfig, ServerConfig};

use crate::error::{ConfigError, Result};
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_FILE_NAME: &str = ".chart-scanner.toml";

/// Get the global config file path (~/.chart-scanner.toml)
pub fn global_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(CONFIG_FILE_NAME))
}

/// Get the local config file path (dir/.chart-scanner.toml)
pub fn local_config_path(dir: &Path) -> PathBuf {
    dir.join(CONFIG_FILE_NAME)
}

/// Parse a config file
pub fn read_config(path: &Path) -> Result<Config> {
    let content = fs::read_to_string(path).map_err(|e| ConfigError::ParsingFailed {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    let config: Config = toml::from_str(&content).map_err(|e| ConfigError::ParsingFailed {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    validate(&config)?;
    Ok(config)
}

/// Load configuration from file or use defaults.
///
/// An explicit path must exist and parse. Otherwise the working directory
/// is checked first, then the home directory; unreadable files there are
/// skipped with a warning.
pub fn load_config(explicit: Option<&Path>) -> Result<Config> {
    if let Some(path) = explicit {
        if !path.is_file() {
            return Err(ConfigError::NotFound(path.to_path_buf()).into());
        }
        return read_config(path);
    }

    let local = std::env::current_dir().ok().map(|cwd| local_config_path(&cwd));
    for candidate in local.into_iter().chain(global_config_path()) {
        if !candidate.is_file() {
            continue;
        }
        match read_config(&candidate) {
            Ok(config) => {
                log::debug!("Loaded configuration from {}", candidate.display());
                return Ok(config);
            }
            Err(e) => log::warn!("Ignoring configuration: {}", e),
        }
    }

    Ok(Config::default())
}

fn validate(config: &Config) -> std::result::Result<(), ConfigError> {
    if !matches!(config.server.transport.as_str(), "stdio" | "http") {
        return Err(ConfigError::InvalidValue {
            field: "server.transport".to_string(),
            message: format!("expected 'stdio' or 'http', got '{}'", config.server.transport),
        });
    }
    if config.scan.max_depth == 0 {
        return Err(ConfigError::InvalidValue {
            field: "scan.max_depth".to_string(),
            message: "must be at least 1".to_string(),
        });
    }
    Ok(())
}
