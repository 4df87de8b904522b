//! Output formatters for discovery results.

pub mod json;
pub mod plain;

use crate::analyzer::images::types::Discovery;

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// One image per line.
    #[default]
    Plain,
    /// JSON array of images.
    Json,
    /// JSON object with images, warnings and document count.
    Report,
}

impl OutputFormat {
    /// Parse from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "plain" | "text" => Some(Self::Plain),
            "json" => Some(Self::Json),
            "report" => Some(Self::Report),
            _ => None,
        }
    }
}

/// Format a discovery result to a string.
pub fn format_result_to_string(result: &Discovery, format: OutputFormat) -> String {
    match format {
        OutputFormat::Plain => plain::format(result),
        OutputFormat::Json => json::format(result),
        OutputFormat::Report => json::format_report(result),
    }
}

/// Format and print a discovery result.
pub fn format_result(result: &Discovery, format: OutputFormat) {
    print!("{}", format_result_to_string(result, format));
}
