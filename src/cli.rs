//! Command-line parsing. Every flag can also come from the environment (or a
//! `.env` file loaded before parsing).

use chrono::NaiveDate;
use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Parser, Clone)]
#[command(
    name = "pickup-report",
    version,
    about = "Build the 7-day pickup report from the latest snapshot"
)]
pub struct Cli {
    /// Directory holding the daily snapshot files (*.csv, *.txt).
    #[arg(long, env = "SNAPSHOT_DIR", default_value = "csv_downloads")]
    pub snapshot_dir: PathBuf,

    /// Report date (YYYY-MM-DD). Defaults to the date in the current file's name.
    #[arg(long, env = "REPORT_DATE")]
    pub report_date: Option<NaiveDate>,

    /// Directory of archived .eml messages to restore missing snapshots from.
    #[arg(long, env = "ARCHIVE_DIR")]
    pub archive_dir: Option<PathBuf>,

    /// Base URL of an HTTP archive service.
    #[arg(long, env = "ARCHIVE_URL")]
    pub archive_url: Option<String>,

    /// Bearer token for the HTTP archive service.
    #[arg(long, env = "ARCHIVE_TOKEN", hide_env_values = true)]
    pub archive_token: Option<String>,

    /// Connect/read timeout for the HTTP archive, in seconds.
    #[arg(long, env = "ARCHIVE_TIMEOUT_SECS", default_value_t = 30)]
    pub archive_timeout_secs: u64,

    /// Never consult the archive, even if one is configured.
    #[arg(long)]
    pub no_remote: bool,

    /// Mailbox the bot sends from; archive copies are addressed here.
    #[arg(long, env = "EMAIL_USER")]
    pub email_user: Option<String>,

    /// Report recipient. Defaults to EMAIL_USER.
    #[arg(long, env = "EMAIL_TO")]
    pub email_to: Option<String>,

    #[arg(long, env = "SENDER_NAME", default_value = "Pickup Report Bot")]
    pub sender_name: String,

    #[arg(long, env = "REPORT_TITLE", default_value = "7-Day Pickup Report")]
    pub title: String,

    /// Write the HTML report to this file.
    #[arg(long, value_name = "FILE")]
    pub html_out: Option<PathBuf>,

    /// Write a JSON summary of the run to this file.
    #[arg(long, value_name = "FILE")]
    pub json_out: Option<PathBuf>,

    /// Write the report and archive messages as .eml files into this directory.
    #[arg(long, env = "OUTBOX_DIR", value_name = "DIR")]
    pub outbox: Option<PathBuf>,

    /// Print the report table to stdout (default when no other output is chosen).
    #[arg(long)]
    pub print: bool,

    /// Debug-level logging.
    #[arg(short, long)]
    pub verbose: bool,
}
