use std::path::PathBuf;

use crate::analyzer::chart::{ChartScanner, ChartSource, ScanRequest};
use crate::cli::DiscoveryArgs;
use crate::config::Config;
use crate::handlers::utils::render_discovery;

/// Render a chart and list its images.
pub fn handle_scan(chart: PathBuf, args: &DiscoveryArgs, config: &Config) -> crate::Result<String> {
    let scanner = ChartScanner::from_config(config);
    let request = ScanRequest::new(ChartSource::Path(chart))
        .with_values_files(args.values.clone())
        .with_options(args.options(config));

    let report = scanner.scan(&request)?;
    render_discovery(&report.discovery, args.output_format())
}
