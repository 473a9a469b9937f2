//! Archive channel: where yesterday's snapshot can be recovered from when the
//! local store does not have it.
//!
//! Every run mails the raw snapshot to itself under a subject built by
//! [`archive_subject`]. Two transports can read those messages back:
//!
//! - [`MaildirArchive`]: a directory of exported `.eml` files (e.g. a synced
//!   "Sent" folder, or the outbox this crate writes)
//! - [`HttpArchive`]: a JSON endpoint in front of the mail store

use crate::error::{ReportError, Result};
use crate::locator::is_snapshot_file;
use base64::Engine;
use chrono::{DateTime, NaiveDate, Utc};
use mailparse::{MailHeaderMap, ParsedMail};
use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde::Deserialize;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Subject line of the self-addressed archive message for `date`.
pub fn archive_subject(date: NaiveDate) -> String {
    format!("DATA ARCHIVE - {}", date.format("%Y-%m-%d"))
}

#[derive(Debug, Clone, PartialEq)]
pub struct Attachment {
    pub filename: String,
    pub payload: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArchiveRecord {
    pub subject: String,
    pub sent_at: Option<DateTime<Utc>>,
    pub attachments: Vec<Attachment>,
}

pub trait ArchiveChannel {
    /// Records whose subject matches `subject_key`, newest first, at most `limit`.
    fn list_records(&self, subject_key: &str, limit: usize) -> Result<Vec<ArchiveRecord>>;

    fn fetch_latest_matching(&self, subject_key: &str) -> Result<Option<ArchiveRecord>> {
        Ok(self.list_records(subject_key, 1)?.into_iter().next())
    }
}

fn subject_matches(subject: &str, key: &str) -> bool {
    // Same semantics as an IMAP SUBJECT search: case-insensitive substring.
    subject.to_lowercase().contains(&key.trim().to_lowercase())
}

fn newest_first(records: &mut [ArchiveRecord]) {
    records.sort_by(|a, b| b.sent_at.cmp(&a.sent_at));
}

/// Reads `.eml` files from a directory.
pub struct MaildirArchive {
    dir: PathBuf,
}

impl MaildirArchive {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn read_message(path: &Path) -> Result<Option<ArchiveRecord>> {
        let bytes = std::fs::read(path).map_err(|e| ReportError::io(path, e))?;
        let mail = mailparse::parse_mail(&bytes)
            .map_err(|e| ReportError::RemoteFetch(format!("{}: {}", path.display(), e)))?;
        let Some(subject) = mail.headers.get_first_value("Subject") else {
            return Ok(None);
        };
        let sent_at = mail
            .headers
            .get_first_value("Date")
            .and_then(|d| mailparse::dateparse(&d).ok())
            .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0))
            .or_else(|| {
                std::fs::metadata(path)
                    .and_then(|m| m.modified())
                    .ok()
                    .map(DateTime::<Utc>::from)
            });
        let mut attachments = Vec::new();
        collect_attachments(&mail, &mut attachments)?;
        Ok(Some(ArchiveRecord {
            subject: subject.trim().to_string(),
            sent_at,
            attachments,
        }))
    }
}

fn collect_attachments(part: &ParsedMail<'_>, out: &mut Vec<Attachment>) -> Result<()> {
    let disposition = part.get_content_disposition();
    let filename = disposition
        .params
        .get("filename")
        .or_else(|| part.ctype.params.get("name"))
        .cloned();
    if let Some(filename) = filename {
        let payload = part
            .get_body_raw()
            .map_err(|e| ReportError::RemoteFetch(format!("attachment {}: {}", filename, e)))?;
        out.push(Attachment {
            filename: filename.trim().to_string(),
            payload,
        });
    }
    for sub in &part.subparts {
        collect_attachments(sub, out)?;
    }
    Ok(())
}

impl ArchiveChannel for MaildirArchive {
    fn list_records(&self, subject_key: &str, limit: usize) -> Result<Vec<ArchiveRecord>> {
        let listing = std::fs::read_dir(&self.dir).map_err(|e| ReportError::io(&self.dir, e))?;
        let mut records = Vec::new();
        for item in listing {
            let path = item.map_err(|e| ReportError::io(&self.dir, e))?.path();
            let is_eml = path
                .extension()
                .map(|e| e.eq_ignore_ascii_case("eml"))
                .unwrap_or(false);
            if !is_eml {
                continue;
            }
            match Self::read_message(&path) {
                Ok(Some(record)) if subject_matches(&record.subject, subject_key) => {
                    records.push(record)
                }
                Ok(_) => {}
                Err(e) => warn!("Skipping unreadable archive message: {}", e),
            }
        }
        newest_first(&mut records);
        records.truncate(limit);
        debug!(
            "{} archive message(s) match '{}' in {}",
            records.len(),
            subject_key,
            self.dir.display()
        );
        Ok(records)
    }
}

#[derive(Debug, Deserialize)]
struct RecordsResponse {
    records: Vec<RemoteRecord>,
}

#[derive(Debug, Deserialize)]
struct RemoteRecord {
    subject: String,
    #[serde(default)]
    sent_at: Option<DateTime<Utc>>,
    #[serde(default)]
    attachments: Vec<RemoteAttachment>,
}

#[derive(Debug, Deserialize)]
struct RemoteAttachment {
    filename: String,
    content_base64: String,
}

/// `GET <base>/records?subject=<key>&limit=<n>` against an archive service.
pub struct HttpArchive {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl HttpArchive {
    pub fn new(base_url: &str, token: Option<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(timeout)
            .timeout(timeout)
            .build()
            .map_err(|e| ReportError::Config(format!("archive HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        })
    }

    fn request(&self, subject_key: &str, limit: usize) -> Result<Vec<RemoteRecord>> {
        let limit = limit.to_string();
        let mut req = self
            .client
            .get(format!("{}/records", self.base_url))
            .query(&[("subject", subject_key), ("limit", limit.as_str())]);
        if let Some(token) = &self.token {
            req = req.bearer_auth(token);
        }
        let resp = req
            .send()
            .map_err(|e| ReportError::RemoteFetch(format!("archive request failed: {e}")))?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(Vec::new());
        }
        if !resp.status().is_success() {
            return Err(ReportError::RemoteFetch(format!(
                "archive request failed with status {}",
                resp.status()
            )));
        }
        let body: RecordsResponse = resp
            .json()
            .map_err(|e| ReportError::RemoteFetch(format!("invalid archive response: {e}")))?;
        Ok(body.records)
    }
}

impl ArchiveChannel for HttpArchive {
    fn list_records(&self, subject_key: &str, limit: usize) -> Result<Vec<ArchiveRecord>> {
        let remote = match self.request(subject_key, limit) {
            Ok(r) => r,
            Err(first) => {
                warn!("{}; retrying once", first);
                self.request(subject_key, limit)?
            }
        };
        let mut records = Vec::with_capacity(remote.len());
        for r in remote {
            let mut attachments = Vec::with_capacity(r.attachments.len());
            for a in r.attachments {
                let payload = base64::engine::general_purpose::STANDARD
                    .decode(a.content_base64.trim())
                    .map_err(|e| {
                        ReportError::RemoteFetch(format!("attachment {}: {e}", a.filename))
                    })?;
                attachments.push(Attachment {
                    filename: a.filename,
                    payload,
                });
            }
            records.push(ArchiveRecord {
                subject: r.subject,
                sent_at: r.sent_at,
                attachments,
            });
        }
        records.retain(|r| subject_matches(&r.subject, subject_key));
        newest_first(&mut records);
        records.truncate(limit);
        Ok(records)
    }
}

/// Persist the first snapshot-like attachment of `record` into `store`.
///
/// The store is append-only. When a file of the same name is already there the
/// attachment is not restored and `None` is returned: the local file holds
/// other data (possibly the current snapshot).
pub fn restore_snapshot(record: &ArchiveRecord, store: &Path) -> Result<Option<PathBuf>> {
    let Some((attachment, name)) = record.attachments.iter().find_map(|a| {
        let name = Path::new(&a.filename).file_name()?.to_owned();
        is_snapshot_file(Path::new(&name)).then_some((a, name))
    }) else {
        return Ok(None);
    };
    std::fs::create_dir_all(store).map_err(|e| ReportError::io(store, e))?;
    let path = store.join(name);
    match std::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&path)
    {
        Ok(mut file) => {
            file.write_all(&attachment.payload)
                .map_err(|e| ReportError::io(&path, e))?;
            info!("Restored historical file: {}", path.display());
            Ok(Some(path))
        }
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
            warn!(
                "Archived {} collides with an existing file in the store; not restored",
                path.display()
            );
            Ok(None)
        }
        Err(e) => Err(ReportError::io(&path, e)),
    }
}
