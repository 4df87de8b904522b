use clap::Parser;
use colored::Colorize;
use chart_image_scanner::{cli::Cli, config, run_command};
use std::process;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("{} {}", "Error:".red().bold(), e);
        process::exit(1);
    }
}

async fn run() -> chart_image_scanner::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    cli.init_logging();

    // Load configuration
    let config = config::load_config(cli.config.as_deref())?;

    if let Some(output) = run_command(cli.command, &config).await? {
        print!("{}", output);
    }
    Ok(())
}
