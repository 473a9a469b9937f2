//! Finding the snapshot taken the day before the report date.

use crate::archive::{archive_subject, restore_snapshot, ArchiveChannel};
use crate::error::Result;
use crate::types::SnapshotEntry;
use chrono::{Days, NaiveDate};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreviousSnapshot {
    Local(PathBuf),
    Restored(PathBuf),
}

impl PreviousSnapshot {
    pub fn path(&self) -> &Path {
        match self {
            PreviousSnapshot::Local(p) | PreviousSnapshot::Restored(p) => p,
        }
    }
}

pub fn previous_day(report_date: NaiveDate) -> NaiveDate {
    report_date
        .checked_sub_days(Days::new(1))
        .unwrap_or(report_date)
}

/// A local snapshot whose file name carries `target`, other than `current`.
///
/// `entries` is expected newest first; the first match wins.
pub fn find_local<'a>(
    entries: &'a [SnapshotEntry],
    current: &SnapshotEntry,
    target: NaiveDate,
) -> Option<&'a SnapshotEntry> {
    let token = target.format("%Y-%m-%d").to_string();
    entries
        .iter()
        .find(|e| e.path != current.path && e.file_name().contains(&token))
}

pub struct Resolver<'a> {
    store: &'a Path,
    channel: Option<&'a dyn ArchiveChannel>,
}

impl<'a> Resolver<'a> {
    pub fn new(store: &'a Path, channel: Option<&'a dyn ArchiveChannel>) -> Self {
        Self { store, channel }
    }

    /// Local store first, then the archive channel. Any failure on the remote
    /// path is logged and treated as "no previous snapshot".
    pub fn resolve(
        &self,
        report_date: NaiveDate,
        entries: &[SnapshotEntry],
        current: &SnapshotEntry,
    ) -> Option<PreviousSnapshot> {
        let target = previous_day(report_date);
        if let Some(found) = find_local(entries, current, target) {
            info!("Comparing against local snapshot {}", found.path.display());
            return Some(PreviousSnapshot::Local(found.path.clone()));
        }
        let Some(channel) = self.channel else {
            info!("No local snapshot for {} and no archive configured", target);
            return None;
        };
        match self.fetch_remote(channel, target) {
            Ok(Some(path)) => Some(PreviousSnapshot::Restored(path)),
            Ok(None) => {
                info!("No archived snapshot for {}", target);
                None
            }
            Err(e) => {
                warn!("Could not fetch archived snapshot for {}: {}", target, e);
                None
            }
        }
    }

    fn fetch_remote(&self, channel: &dyn ArchiveChannel, target: NaiveDate) -> Result<Option<PathBuf>> {
        let subject = archive_subject(target);
        info!("Searching archive for '{}'", subject);
        match channel.fetch_latest_matching(&subject)? {
            Some(record) => restore_snapshot(&record, self.store),
            None => Ok(None),
        }
    }
}
