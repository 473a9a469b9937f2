use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tabled::Tabled;

/// One record of a snapshot file as it appears on disk. Every cell is kept as
/// text; cleaning happens in `loader::normalize_row`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawRow {
    #[serde(rename = "Date", default)]
    pub date: Option<String>,
    #[serde(rename = "Total Rooms Sold Allocated", default)]
    pub rooms_sold: Option<String>,
    #[serde(rename = "Total Revenue", default)]
    pub total_revenue: Option<String>,
    #[serde(rename = "ADR", default)]
    pub adr: Option<String>,
}

/// A snapshot file in the local store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotEntry {
    pub path: PathBuf,
    pub created: std::time::SystemTime,
}

impl SnapshotEntry {
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Where the report date of a run came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportDateSource {
    Explicit,
    Identifier,
    Clock,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedRow {
    /// `None` when the date cell could not be parsed; such rows never join or window.
    pub date: Option<NaiveDate>,
    pub rooms_sold: f64,
    pub total_revenue: f64,
    pub adr: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReconciledRow {
    #[serde(flatten)]
    pub row: NormalizedRow,
    pub pickup: f64,
}

/// Sign classification of a pickup value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PickupTrend {
    Up,
    Down,
    Flat,
}

impl PickupTrend {
    /// Classifies the whole-unit pickup that gets displayed, so `0.5` is flat.
    pub fn classify(pickup: f64) -> Self {
        let whole = pickup.trunc();
        if whole > 0.0 {
            PickupTrend::Up
        } else if whole < 0.0 {
            PickupTrend::Down
        } else {
            PickupTrend::Flat
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PickupTrend::Up => "up",
            PickupTrend::Down => "down",
            PickupTrend::Flat => "flat",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WindowRow {
    pub date: NaiveDate,
    pub day: String,
    pub rooms_sold: f64,
    pub total_revenue: f64,
    pub adr: f64,
    pub pickup: f64,
    pub trend: PickupTrend,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReportTotals {
    pub total_rooms: f64,
    pub total_revenue: f64,
    pub total_pickup: f64,
    pub average_adr: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportWindow {
    pub report_date: NaiveDate,
    pub end_date: NaiveDate,
    pub rows: Vec<WindowRow>,
    pub totals: ReportTotals,
}

/// Terminal rendering of one report line; every cell is pre-formatted.
#[derive(Debug, Clone, Tabled)]
pub struct ReportTableRow {
    #[tabled(rename = "Date")]
    pub date: String,
    #[tabled(rename = "Day")]
    pub day: String,
    #[tabled(rename = "Rooms")]
    pub rooms: String,
    #[tabled(rename = "Rev")]
    pub revenue: String,
    #[tabled(rename = "ADR")]
    pub adr: String,
    #[tabled(rename = "Pickup")]
    pub pickup: String,
}

/// Machine-readable record of a run, written with `--json-out`.
#[derive(Debug, Serialize)]
pub struct ReportSummary {
    pub report_date: NaiveDate,
    pub report_date_source: ReportDateSource,
    pub current_snapshot: String,
    pub previous_snapshot: Option<String>,
    pub current_load: crate::loader::LoadReport,
    pub previous_load: Option<crate::loader::LoadReport>,
    pub window: ReportWindow,
}
