//! Chart scanning tools exposed over MCP.

use std::path::PathBuf;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, info, warn};

use super::ServerState;
use super::protocol::RpcError;
use crate::analyzer::chart::{ChartSource, ScanRequest};
use crate::analyzer::images::NormalizeMode;

pub const SCAN_CHART_PATH: &str = "scan_chart_path";
pub const SCAN_CHART_URL: &str = "scan_chart_url";
pub const SCAN_CHART_UPLOAD: &str = "scan_chart_upload";

pub const USAGE_URI: &str = "help://usage";

pub const USAGE: &str = "\
Chart Image Scanner
-------------------

Lists the container images a Helm chart deploys.

Available tools:
- scan_chart_path: Scan a local chart directory or .tgz archive
- scan_chart_url: Scan a chart archive downloaded from an http(s) URL
- scan_chart_upload: Scan a base64-encoded .tgz chart archive

Every tool accepts optional `values_files` (paths applied in order) and
`normalize` (default true; false returns images exactly as written).

Example:
    scan_chart_path {\"path\": \"/path/to/chart.tgz\"}
";

/// Text result of a tool call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolOutcome {
    pub text: String,
    pub is_error: bool,
}

impl ToolOutcome {
    fn ok(text: String) -> Self {
        Self {
            text,
            is_error: false,
        }
    }

    fn error(prefix: &str, message: impl std::fmt::Display) -> Self {
        Self {
            text: format!("{}: {}", prefix, message),
            is_error: true,
        }
    }

    pub fn to_json(&self) -> Value {
        json!({
            "content": [{"type": "text", "text": self.text}],
            "isError": self.is_error,
        })
    }
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize)]
struct PathArgs {
    path: String,
    #[serde(default)]
    values_files: Vec<PathBuf>,
    #[serde(default = "default_true")]
    normalize: bool,
}

#[derive(Debug, Deserialize)]
struct UrlArgs {
    url: String,
    #[serde(default)]
    values_files: Vec<PathBuf>,
    #[serde(default = "default_true")]
    normalize: bool,
}

#[derive(Debug, Deserialize)]
struct UploadArgs {
    chart_data: String,
    #[serde(default)]
    values_files: Vec<PathBuf>,
    #[serde(default = "default_true")]
    normalize: bool,
}

fn common_properties() -> Value {
    json!({
        "values_files": {
            "type": "array",
            "items": {"type": "string"},
            "description": "Values files applied in order, later files win (optional)"
        },
        "normalize": {
            "type": "boolean",
            "default": true,
            "description": "Normalize image references; false returns them as written"
        }
    })
}

fn schema(required: &str, description: &str) -> Value {
    let mut properties = common_properties();
    properties[required] = json!({"type": "string", "description": description});
    json!({
        "type": "object",
        "required": [required],
        "properties": properties,
    })
}

/// The `tools/list` payload.
pub fn definitions() -> Value {
    json!([
        {
            "name": SCAN_CHART_PATH,
            "description": "Scan a local Helm chart (directory or .tgz) for container images",
            "inputSchema": schema("path", "Path to the chart directory or .tgz archive"),
        },
        {
            "name": SCAN_CHART_URL,
            "description": "Download a Helm chart archive and scan it for container images",
            "inputSchema": schema("url", "http:// or https:// URL of a .tgz chart archive"),
        },
        {
            "name": SCAN_CHART_UPLOAD,
            "description": "Scan an uploaded Helm chart archive for container images",
            "inputSchema": schema("chart_data", "Base64-encoded .tgz chart archive"),
        },
    ])
}

fn parse_args<T: for<'de> Deserialize<'de>>(tool: &str, arguments: Value) -> Result<T, RpcError> {
    let arguments = if arguments.is_null() {
        json!({})
    } else {
        arguments
    };
    serde_json::from_value(arguments)
        .map_err(|e| RpcError::invalid_params(format!("Invalid arguments for {}: {}", tool, e)))
}

/// Run a tool. Unknown tools and malformed arguments are protocol errors;
/// scan failures are reported in the outcome.
pub async fn call(state: &ServerState, name: &str, arguments: Value) -> Result<ToolOutcome, RpcError> {
    debug!(tool = name, "tool call");
    let (prefix, source, values_files, normalize) = match name {
        SCAN_CHART_PATH => {
            let args: PathArgs = parse_args(name, arguments)?;
            (
                "Error scanning chart",
                ChartSource::Path(PathBuf::from(args.path)),
                args.values_files,
                args.normalize,
            )
        }
        SCAN_CHART_URL => {
            let args: UrlArgs = parse_args(name, arguments)?;
            (
                "Error scanning chart from URL",
                ChartSource::Url(args.url),
                args.values_files,
                args.normalize,
            )
        }
        SCAN_CHART_UPLOAD => {
            let prefix = "Error scanning uploaded chart";
            let args: UploadArgs = parse_args(name, arguments)?;
            let data = match STANDARD.decode(args.chart_data.trim()) {
                Ok(data) => data,
                Err(e) => return Ok(ToolOutcome::error(prefix, format!("invalid base64 chart data: {}", e))),
            };
            info!(bytes = data.len(), "processing uploaded chart");
            (prefix, ChartSource::Archive(data), args.values_files, args.normalize)
        }
        other => return Err(RpcError::invalid_params(format!("Unknown tool: {}", other))),
    };

    let mode = if normalize {
        NormalizeMode::Canonical
    } else {
        NormalizeMode::Raw
    };
    let request = ScanRequest::new(source)
        .with_values_files(values_files)
        .with_options(state.options().clone().with_mode(mode));

    let scanner = state.scanner();
    let scanned = tokio::task::spawn_blocking(move || scanner.scan(&request)).await;

    Ok(match scanned {
        Ok(Ok(report)) => {
            info!(images = report.discovery.images.len(), "scan finished");
            match serde_json::to_string(&report.discovery.images) {
                Ok(text) => ToolOutcome::ok(text),
                Err(e) => ToolOutcome::error(prefix, e),
            }
        }
        Ok(Err(e)) => {
            warn!(error = %e, "{}", prefix);
            ToolOutcome::error(prefix, e)
        }
        Err(e) => ToolOutcome::error(prefix, e),
    })
}
