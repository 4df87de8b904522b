use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::analyzer::images::{DiscoveryOptions, NormalizeMode, OutputFormat};
use crate::config::Config;

#[derive(Parser, Debug)]
#[command(name = "chart-image-scanner")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "List the container images a Helm chart deploys")]
#[command(long_about = "Renders a Helm chart with `helm template`, walks every rendered manifest and the merged values tree, and prints the deduplicated, normalized container image references the chart would deploy.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file
    #[arg(short, long, global = true, value_name = "FILE", env = "CHART_SCANNER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Render a Helm chart and list its images
    Scan {
        /// Chart directory or .tgz archive
        #[arg(value_name = "CHART")]
        chart: PathBuf,

        #[command(flatten)]
        discovery: DiscoveryArgs,
    },

    /// List the images in an already-rendered manifest stream
    Manifest {
        /// Manifest file, or `-` for stdin
        #[arg(value_name = "FILE")]
        file: PathBuf,

        #[command(flatten)]
        discovery: DiscoveryArgs,
    },

    /// Run the Model Context Protocol tool server
    Serve {
        /// Transport to listen on
        #[arg(long, value_enum)]
        transport: Option<TransportKind>,

        /// Host to bind for the HTTP transport
        #[arg(long)]
        host: Option<String>,

        /// Port to bind for the HTTP transport
        #[arg(long)]
        port: Option<u16>,

        /// HTTP endpoint path for JSON-RPC requests
        #[arg(long)]
        path: Option<String>,
    },
}

/// Flags shared by the discovery subcommands.
#[derive(Args, Debug, Clone, Default)]
pub struct DiscoveryArgs {
    /// Values file to apply (repeatable, later files win)
    #[arg(short = 'f', long = "values", value_name = "FILE")]
    pub values: Vec<PathBuf>,

    /// Output images as a JSON array
    #[arg(long, conflicts_with = "report")]
    pub json: bool,

    /// Output a JSON report including warnings
    #[arg(long)]
    pub report: bool,

    /// Print images exactly as found, without normalization
    #[arg(long, conflicts_with = "digest")]
    pub raw: bool,

    /// Prefer @digest over :tag when both are present
    #[arg(long)]
    pub digest: bool,

    /// Only search rendered manifests, not the values tree
    #[arg(long)]
    pub no_values_tree: bool,
}

impl DiscoveryArgs {
    pub fn mode(&self) -> NormalizeMode {
        if self.raw {
            NormalizeMode::Raw
        } else if self.digest {
            NormalizeMode::DigestPinned
        } else {
            NormalizeMode::Canonical
        }
    }

    pub fn output_format(&self) -> OutputFormat {
        if self.report {
            OutputFormat::Report
        } else if self.json {
            OutputFormat::Json
        } else {
            OutputFormat::Plain
        }
    }

    /// Discovery options from config defaults overridden by these flags.
    pub fn options(&self, config: &Config) -> DiscoveryOptions {
        DiscoveryOptions::default()
            .with_values_tree(config.scan.include_values_tree && !self.no_values_tree)
            .with_mode(self.mode())
            .with_max_depth(config.scan.max_depth)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TransportKind {
    /// Newline-delimited JSON-RPC over stdin/stdout
    Stdio,
    /// JSON-RPC over HTTP POST
    Http,
}

impl TransportKind {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "stdio" => Some(Self::Stdio),
            "http" => Some(Self::Http),
            _ => None,
        }
    }
}

impl Cli {
    /// Initialize logging based on verbosity level
    pub fn init_logging(&self) {
        if self.quiet {
            return;
        }

        let level = match self.verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            2 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        };

        env_logger::Builder::from_default_env()
            .filter_level(level)
            .init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_scan_flags() {
        let cli = Cli::parse_from([
            "chart-image-scanner",
            "-vv",
            "scan",
            "./web",
            "-f",
            "a.yaml",
            "--values",
            "b.yaml",
            "--digest",
            "--json",
        ]);
        assert_eq!(cli.verbose, 2);
        let Commands::Scan { chart, discovery } = cli.command else {
            panic!("expected scan");
        };
        assert_eq!(chart, PathBuf::from("./web"));
        assert_eq!(discovery.values, vec![PathBuf::from("a.yaml"), PathBuf::from("b.yaml")]);
        assert_eq!(discovery.mode(), NormalizeMode::DigestPinned);
        assert_eq!(discovery.output_format(), OutputFormat::Json);
    }

    #[test]
    fn test_raw_conflicts_with_digest() {
        assert!(
            Cli::try_parse_from(["chart-image-scanner", "manifest", "-", "--raw", "--digest"])
                .is_err()
        );
    }

    #[test]
    fn test_options_respect_config() {
        let mut config = Config::default();
        config.scan.include_values_tree = false;
        config.scan.max_depth = 8;
        let options = DiscoveryArgs::default().options(&config);
        assert!(!options.include_values_tree);
        assert_eq!(options.max_depth, 8);
        assert_eq!(options.mode, NormalizeMode::Canonical);
    }

    #[test]
    fn test_serve_flags() {
        let cli = Cli::parse_from([
            "chart-image-scanner",
            "serve",
            "--transport",
            "http",
            "--port",
            "9000",
        ]);
        let Commands::Serve { transport, port, .. } = cli.command else {
            panic!("expected serve");
        };
        assert_eq!(transport, Some(TransportKind::Http));
        assert_eq!(port, Some(9000));
    }
}
