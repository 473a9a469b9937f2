use crate::archive::{ArchiveChannel, HttpArchive, MaildirArchive};
use crate::cli::Cli;
use crate::error::{ReportError, Result};
use chrono::NaiveDate;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub enum ArchiveSettings {
    Disabled,
    Directory(PathBuf),
    Http {
        base_url: String,
        token: Option<String>,
        timeout: Duration,
    },
}

impl ArchiveSettings {
    pub fn open(&self) -> Result<Option<Box<dyn ArchiveChannel>>> {
        let channel: Box<dyn ArchiveChannel> = match self {
            ArchiveSettings::Disabled => return Ok(None),
            ArchiveSettings::Directory(dir) => Box::new(MaildirArchive::new(dir.clone())),
            ArchiveSettings::Http {
                base_url,
                token,
                timeout,
            } => Box::new(HttpArchive::new(base_url, token.clone(), *timeout)?),
        };
        Ok(Some(channel))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MailIdentity {
    pub user: String,
    pub to: Option<String>,
    pub sender_name: String,
}

impl MailIdentity {
    pub fn recipient(&self) -> &str {
        self.to.as_deref().unwrap_or(&self.user)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct OutputSettings {
    pub html: Option<PathBuf>,
    pub json: Option<PathBuf>,
    pub outbox: Option<PathBuf>,
    pub print: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReportConfig {
    pub snapshot_dir: PathBuf,
    pub report_date: Option<NaiveDate>,
    pub archive: ArchiveSettings,
    pub mail: Option<MailIdentity>,
    pub title: String,
    pub output: OutputSettings,
}

impl ReportConfig {
    /// Defaults for a store at `snapshot_dir`: no archive, no outputs.
    pub fn new(snapshot_dir: impl Into<PathBuf>) -> Self {
        Self {
            snapshot_dir: snapshot_dir.into(),
            report_date: None,
            archive: ArchiveSettings::Disabled,
            mail: None,
            title: "7-Day Pickup Report".to_string(),
            output: OutputSettings::default(),
        }
    }

    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let archive = if cli.no_remote {
            ArchiveSettings::Disabled
        } else {
            match (&cli.archive_dir, &cli.archive_url) {
                (Some(_), Some(_)) => {
                    return Err(ReportError::Config(
                        "set either ARCHIVE_DIR or ARCHIVE_URL, not both".into(),
                    ))
                }
                (Some(dir), None) => ArchiveSettings::Directory(dir.clone()),
                (None, Some(url)) => {
                    if cli.archive_timeout_secs == 0 {
                        return Err(ReportError::Config(
                            "ARCHIVE_TIMEOUT_SECS must be at least 1".into(),
                        ));
                    }
                    ArchiveSettings::Http {
                        base_url: url.clone(),
                        token: cli.archive_token.clone(),
                        timeout: Duration::from_secs(cli.archive_timeout_secs),
                    }
                }
                (None, None) => ArchiveSettings::Disabled,
            }
        };

        let mail = cli
            .email_user
            .as_ref()
            .filter(|u| !u.trim().is_empty())
            .map(|user| MailIdentity {
                user: user.trim().to_string(),
                to: cli
                    .email_to
                    .as_ref()
                    .map(|t| t.trim().to_string())
                    .filter(|t| !t.is_empty()),
                sender_name: cli.sender_name.clone(),
            });
        if cli.outbox.is_some() && mail.is_none() {
            return Err(ReportError::Config(
                "--outbox needs EMAIL_USER to address the messages".into(),
            ));
        }

        let output = OutputSettings {
            html: cli.html_out.clone(),
            json: cli.json_out.clone(),
            outbox: cli.outbox.clone(),
            print: cli.print
                || (cli.html_out.is_none() && cli.json_out.is_none() && cli.outbox.is_none()),
        };

        Ok(Self {
            snapshot_dir: cli.snapshot_dir.clone(),
            report_date: cli.report_date,
            archive,
            mail,
            title: cli.title.clone(),
            output,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn parse(args: &[&str]) -> Cli {
        let mut argv = vec!["pickup-report"];
        argv.extend_from_slice(args);
        Cli::parse_from(argv)
    }

    #[test]
    fn prints_when_no_output_is_chosen() {
        let cfg = ReportConfig::from_cli(&parse(&["--snapshot-dir", "data"])).unwrap();
        assert_eq!(cfg.snapshot_dir, PathBuf::from("data"));
        assert!(cfg.output.print);

        let cfg = ReportConfig::from_cli(&parse(&["--html-out", "r.html"])).unwrap();
        assert!(!cfg.output.print);
    }

    #[test]
    fn archive_selection() {
        let cfg = ReportConfig::from_cli(&parse(&["--archive-dir", "sent"])).unwrap();
        assert_eq!(cfg.archive, ArchiveSettings::Directory(PathBuf::from("sent")));

        let cfg = ReportConfig::from_cli(&parse(&[
            "--archive-url",
            "https://archive.example.com",
            "--archive-timeout-secs",
            "5",
        ]))
        .unwrap();
        assert!(matches!(
            cfg.archive,
            ArchiveSettings::Http { timeout, .. } if timeout == Duration::from_secs(5)
        ));

        let cfg =
            ReportConfig::from_cli(&parse(&["--archive-dir", "sent", "--no-remote"])).unwrap();
        assert_eq!(cfg.archive, ArchiveSettings::Disabled);
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let cli = parse(&["--archive-url", "http://x", "--archive-timeout-secs", "0"]);
        assert!(matches!(
            ReportConfig::from_cli(&cli),
            Err(ReportError::Config(_))
        ));
    }

    #[test]
    fn outbox_requires_a_sender() {
        let mut cli = parse(&["--outbox", "out"]);
        cli.email_user = None;
        assert!(matches!(
            ReportConfig::from_cli(&cli),
            Err(ReportError::Config(_))
        ));

        cli.email_user = Some("bot@example.com".into());
        cli.email_to = None;
        let cfg = ReportConfig::from_cli(&cli).unwrap();
        assert_eq!(cfg.mail.unwrap().recipient(), "bot@example.com");
    }

    #[test]
    fn explicit_report_date() {
        let cfg = ReportConfig::from_cli(&parse(&["--report-date", "2024-03-05"])).unwrap();
        assert_eq!(cfg.report_date, NaiveDate::from_ymd_opt(2024, 3, 5));
    }
}
