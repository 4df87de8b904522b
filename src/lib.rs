//! # Chart Image Scanner
//!
//! Lists the container images a Helm chart deploys. The chart is rendered
//! with `helm template`, then every rendered manifest and the merged values
//! tree are searched for image fields. References are parsed, normalized,
//! deduplicated and sorted.
//!
//! ## Features
//!
//! - **Schema-less discovery**: finds `image:` strings and
//!   `repository`/`tag`/`digest`/`registry` blocks in any resource kind
//! - **Normalization**: applies the `latest` default tag, never invents a registry
//! - **Chart sources**: directories, `.tgz` archives, URLs and uploads
//! - **Tool server**: Model Context Protocol over stdio or HTTP
//!
//! ## Example
//!
//! ```rust,no_run
//! use chart_image_scanner::analyzer::chart::{ChartScanner, ChartSource, ScanRequest};
//! use chart_image_scanner::config::Config;
//!
//! # fn main() -> chart_image_scanner::Result<()> {
//! let report = ChartScanner::from_config(&Config::default())
//!     .scan(&ScanRequest::new(ChartSource::Path("./charts/web".into())))?;
//! println!("{}", report.discovery.images.join("\n"));
//! # Ok(())
//! # }
//! ```

pub mod analyzer;
pub mod cli;
pub mod common;
pub mod config;
pub mod error;
pub mod handlers;
pub mod server;

// Re-export commonly used types and functions
pub use analyzer::chart::{ChartScanner, ChartSource, ScanReport, ScanRequest};
pub use analyzer::images::{Discovery, DiscoveryOptions, NormalizeMode, discover, discover_images};
pub use error::{Result, ScannerError};

use cli::Commands;
use config::Config;

/// The current version of the CLI tool
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Run one CLI command. Text to print on stdout is returned.
pub async fn run_command(command: Commands, config: &Config) -> Result<Option<String>> {
    match command {
        Commands::Scan { chart, discovery } => {
            handlers::handle_scan(chart, &discovery, config).map(Some)
        }
        Commands::Manifest { file, discovery } => {
            handlers::handle_manifest(file, &discovery, config).map(Some)
        }
        Commands::Serve {
            transport,
            host,
            port,
            path,
        } => handlers::handle_serve(transport, host, port, path, config)
            .await
            .map(|()| None),
    }
}
