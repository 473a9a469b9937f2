//! Finding the current snapshot in the local store and deciding which day it
//! reports on.

use crate::error::{ReportError, Result};
use crate::types::{ReportDateSource, SnapshotEntry};
use crate::util::extract_date_token;
use chrono::{Local, NaiveDate};
use std::path::Path;
use tracing::{debug, info};

pub const SNAPSHOT_EXTENSIONS: [&str; 2] = ["csv", "txt"];

pub fn is_snapshot_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| SNAPSHOT_EXTENSIONS.iter().any(|x| e.eq_ignore_ascii_case(x)))
        .unwrap_or(false)
}

/// List snapshot files in `dir`, newest first.
///
/// A missing directory is an empty store, not an error.
pub fn scan_snapshot_dir(dir: &Path) -> Result<Vec<SnapshotEntry>> {
    if !dir.exists() {
        debug!("Snapshot store {} does not exist yet", dir.display());
        return Ok(Vec::new());
    }
    let mut entries = Vec::new();
    for item in std::fs::read_dir(dir).map_err(|e| ReportError::io(dir, e))? {
        let item = item.map_err(|e| ReportError::io(dir, e))?;
        let path = item.path();
        if !path.is_file() || !is_snapshot_file(&path) {
            continue;
        }
        let meta = item.metadata().map_err(|e| ReportError::io(&path, e))?;
        // Not every filesystem records a birth time.
        let created = meta
            .created()
            .or_else(|_| meta.modified())
            .map_err(|e| ReportError::io(&path, e))?;
        entries.push(SnapshotEntry { path, created });
    }
    sort_newest_first(&mut entries);
    Ok(entries)
}

pub fn sort_newest_first(entries: &mut [SnapshotEntry]) {
    entries.sort_by(|a, b| {
        b.created
            .cmp(&a.created)
            .then_with(|| b.file_name().cmp(&a.file_name()))
    });
}

/// The most recently created snapshot, or `None` for an empty store.
pub fn locate_current(entries: &[SnapshotEntry]) -> Option<&SnapshotEntry> {
    entries.iter().max_by(|a, b| {
        a.created
            .cmp(&b.created)
            .then_with(|| a.file_name().cmp(&b.file_name()))
    })
}

/// Resolve the report date: an explicit date wins, then a `YYYY-MM-DD` token in
/// the file name, then `today`.
pub fn report_date_for(
    entry: &SnapshotEntry,
    explicit: Option<NaiveDate>,
    today: NaiveDate,
) -> (NaiveDate, ReportDateSource) {
    if let Some(date) = explicit {
        return (date, ReportDateSource::Explicit);
    }
    match extract_date_token(&entry.file_name()) {
        Some(date) => (date, ReportDateSource::Identifier),
        None => (today, ReportDateSource::Clock),
    }
}

#[derive(Debug, Clone)]
pub struct Located {
    pub current: SnapshotEntry,
    pub report_date: NaiveDate,
    pub date_source: ReportDateSource,
    /// Every snapshot in the store, newest first, including `current`.
    pub entries: Vec<SnapshotEntry>,
}

/// Scan the store and pick the current snapshot and its report date.
pub fn locate(dir: &Path, explicit: Option<NaiveDate>) -> Result<Located> {
    let entries = scan_snapshot_dir(dir)?;
    let current = locate_current(&entries)
        .cloned()
        .ok_or_else(|| ReportError::NoCurrentSnapshot {
            dir: dir.to_path_buf(),
        })?;
    let (report_date, date_source) =
        report_date_for(&current, explicit, Local::now().date_naive());
    info!(
        "Current snapshot: {} (report date {} from {:?})",
        current.path.display(),
        report_date,
        date_source
    );
    Ok(Located {
        current,
        report_date,
        date_source,
        entries,
    })
}
