//! Outbound messages: the report for the recipient and the self-addressed
//! archive copy of the raw snapshot that tomorrow's run will look for.
//!
//! Messages are written as `.eml` files; handing them to a mail transport is
//! left to whatever picks up the outbox directory.

use crate::archive::archive_subject;
use crate::config::MailIdentity;
use crate::error::{ReportError, Result};
use base64::Engine;
use chrono::{NaiveDate, Utc};
use std::fmt::Write as _;
use std::io::Write as _;
use std::path::{Path, PathBuf};
use tracing::info;

const BOUNDARY: &str = "=_pickup_report_boundary";

#[derive(Debug, Clone, PartialEq)]
pub struct OutgoingAttachment {
    pub filename: String,
    pub payload: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    Html(String),
    Plain(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct OutgoingMessage {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub body: Body,
    pub attachments: Vec<OutgoingAttachment>,
}

pub fn report_subject(date: NaiveDate) -> String {
    format!("Daily Sales Report - {}", date.format("%Y-%m-%d"))
}

fn from_header(identity: &MailIdentity) -> String {
    format!("\"{}\" <{}>", identity.sender_name.replace('"', ""), identity.user)
}

pub fn compose_report(identity: &MailIdentity, report_date: NaiveDate, html: &str) -> OutgoingMessage {
    OutgoingMessage {
        from: from_header(identity),
        to: identity.recipient().to_string(),
        subject: report_subject(report_date),
        body: Body::Html(html.to_string()),
        attachments: Vec::new(),
    }
}

/// The archive message carries the raw bytes of the current snapshot.
pub fn compose_archive(
    identity: &MailIdentity,
    report_date: NaiveDate,
    snapshot: &Path,
) -> Result<OutgoingMessage> {
    let payload = std::fs::read(snapshot).map_err(|e| ReportError::io(snapshot, e))?;
    let filename = snapshot
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| ReportError::Config(format!("not a file: {}", snapshot.display())))?;
    Ok(OutgoingMessage {
        from: from_header(identity),
        to: identity.user.clone(),
        subject: archive_subject(report_date),
        body: Body::Plain("Archiving raw data for historical pickup calculation.".to_string()),
        attachments: vec![OutgoingAttachment { filename, payload }],
    })
}

fn wrap_base64(bytes: &[u8]) -> String {
    let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);
    let mut out = String::with_capacity(encoded.len() + encoded.len() / 76 * 2 + 2);
    // base64 output is ASCII, so byte chunks are valid UTF-8.
    for chunk in encoded.as_bytes().chunks(76) {
        out.push_str(std::str::from_utf8(chunk).unwrap_or_default());
        out.push_str("\r\n");
    }
    out
}

impl OutgoingMessage {
    /// RFC 822 / MIME text of the message.
    pub fn to_rfc822(&self) -> Result<String> {
        let mut out = String::new();
        write!(out, "From: {}\r\n", self.from)?;
        write!(out, "To: {}\r\n", self.to)?;
        write!(out, "Subject: {}\r\n", self.subject)?;
        write!(out, "Date: {}\r\n", Utc::now().to_rfc2822())?;
        out.push_str("MIME-Version: 1.0\r\n");
        write!(
            out,
            "Content-Type: multipart/mixed; boundary=\"{}\"\r\n\r\n",
            BOUNDARY
        )?;

        let (ctype, text) = match &self.body {
            Body::Html(s) => ("text/html", s),
            Body::Plain(s) => ("text/plain", s),
        };
        write!(out, "--{}\r\n", BOUNDARY)?;
        write!(out, "Content-Type: {}; charset=utf-8\r\n", ctype)?;
        out.push_str("Content-Transfer-Encoding: base64\r\n\r\n");
        out.push_str(&wrap_base64(text.as_bytes()));

        for att in &self.attachments {
            let name = att.filename.replace('"', "");
            write!(out, "--{}\r\n", BOUNDARY)?;
            write!(out, "Content-Type: application/octet-stream; name=\"{}\"\r\n", name)?;
            out.push_str("Content-Transfer-Encoding: base64\r\n");
            write!(out, "Content-Disposition: attachment; filename=\"{}\"\r\n\r\n", name)?;
            out.push_str(&wrap_base64(&att.payload));
        }
        write!(out, "--{}--\r\n", BOUNDARY)?;
        Ok(out)
    }
}

fn slug(subject: &str) -> String {
    subject
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
        .collect()
}

/// Write `msg` into `dir` as `<subject>.eml`, adding a numeric suffix rather
/// than replacing an existing file.
pub fn write_message(dir: &Path, msg: &OutgoingMessage) -> Result<PathBuf> {
    std::fs::create_dir_all(dir).map_err(|e| ReportError::io(dir, e))?;
    let text = msg.to_rfc822()?;
    let stem = slug(&msg.subject);
    let mut n = 0u32;
    loop {
        let name = if n == 0 {
            format!("{}.eml", stem)
        } else {
            format!("{}-{}.eml", stem, n)
        };
        let path = dir.join(name);
        match std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
        {
            Ok(mut file) => {
                file.write_all(text.as_bytes())
                    .map_err(|e| ReportError::io(&path, e))?;
                info!("Queued '{}' to {} at {}", msg.subject, msg.to, path.display());
                return Ok(path);
            }
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => n += 1,
            Err(e) => return Err(ReportError::io(&path, e)),
        }
    }
}
