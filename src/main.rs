//! Entry point: load `.env`, parse flags, build the config once and hand it to
//! the pipeline.
//!
//! Environment:
//! - `RUST_LOG`: log level (default: info)
//! - every flag in `cli::Cli` that names an `env` can be set there instead

use clap::Parser;
use pickup_report::cli::Cli;
use pickup_report::config::ReportConfig;
use pickup_report::{pipeline, ReportError};
use std::process::ExitCode;
use tracing::{error, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

fn init_logging(verbose: bool) {
    let level = if verbose {
        Level::DEBUG
    } else {
        std::env::var("RUST_LOG")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(Level::INFO)
    };
    FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: &Cli) -> Result<(), ReportError> {
    let config = ReportConfig::from_cli(cli)?;
    let channel = config.archive.open()?;
    let report = pipeline::run(&config, channel.as_deref())?;
    pipeline::publish(&config, &report)?;
    Ok(())
}

fn main() -> ExitCode {
    // A missing .env is fine; the process environment still applies.
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_logging(cli.verbose);

    info!("Starting pickup report");
    match run(&cli) {
        Ok(()) => {
            info!("Report complete");
            ExitCode::SUCCESS
        }
        Err(err @ ReportError::NoCurrentSnapshot { .. }) => {
            warn!("{}. Nothing to report.", err);
            ExitCode::from(err.exit_code())
        }
        Err(err) => {
            error!("Error building report: {:?}", err);
            ExitCode::from(err.exit_code())
        }
    }
}
