use crate::analyzer::images::{Discovery, OutputFormat, format_result_to_string};
use crate::error::{Result, ScannerError};

/// Format a discovery for the terminal; an empty result is an error.
pub fn render_discovery(discovery: &Discovery, format: OutputFormat) -> Result<String> {
    if discovery.is_empty() {
        return Err(ScannerError::NoImagesFound);
    }
    Ok(format_result_to_string(discovery, format))
}
