use crate::error::{ReportError, Result};
use crate::types::{NormalizedRow, RawRow};
use crate::util::{format_int, parse_currency, parse_date_flexible};
use csv::{ByteRecord, ReaderBuilder, StringRecord, Trim};
use serde::Serialize;
use std::path::Path;
use tracing::{debug, info};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LoadReport {
    pub total_rows: usize,
    /// Rows kept but unusable for date-keyed work.
    pub undated_rows: usize,
    /// Numeric cells that fell back to 0.
    pub field_defaults: usize,
    /// Records the CSV reader could not decode at all.
    pub skipped_records: usize,
}

/// Read and normalize one snapshot file.
pub fn load_snapshot(path: &Path) -> Result<(Vec<NormalizedRow>, LoadReport)> {
    let bytes = std::fs::read(path).map_err(|e| ReportError::io(path, e))?;
    let delimiter = sniff_delimiter(path, &bytes);
    let (rows, report) = normalize_bytes(&bytes, delimiter).map_err(|source| ReportError::Csv {
        path: path.to_path_buf(),
        source,
    })?;
    info!(
        "Loaded {}: {} rows ({} undated, {} defaulted fields, {} unreadable records)",
        path.display(),
        format_int(report.total_rows),
        format_int(report.undated_rows),
        format_int(report.field_defaults),
        format_int(report.skipped_records)
    );
    Ok((rows, report))
}

/// `.txt` exports are sometimes tab separated; everything else is CSV.
fn sniff_delimiter(path: &Path, bytes: &[u8]) -> u8 {
    let is_txt = path
        .extension()
        .map(|e| e.eq_ignore_ascii_case("txt"))
        .unwrap_or(false);
    if !is_txt {
        return b',';
    }
    let header = bytes.split(|b| *b == b'\n').next().unwrap_or_default();
    if header.contains(&b'\t') && !header.contains(&b',') {
        b'\t'
    } else {
        b','
    }
}

pub fn normalize_bytes(
    bytes: &[u8],
    delimiter: u8,
) -> std::result::Result<(Vec<NormalizedRow>, LoadReport), csv::Error> {
    let mut rdr = ReaderBuilder::new()
        .flexible(true)
        .trim(Trim::All)
        .delimiter(delimiter)
        .from_reader(bytes);
    // Cells are decoded lossily so a stray legacy-encoded byte only spoils
    // its own field, which then defaults like any other unparsable cell.
    let headers = lossy(rdr.byte_headers()?);

    let mut report = LoadReport::default();
    let mut rows = Vec::new();
    for result in rdr.byte_records() {
        let raw = match result.and_then(|rec| lossy(&rec).deserialize::<RawRow>(Some(&headers))) {
            Ok(r) => r,
            Err(e) => {
                debug!("Skipping unreadable record: {}", e);
                report.skipped_records += 1;
                continue;
            }
        };
        report.total_rows += 1;
        let (row, defaults) = normalize_row(&raw);
        if row.date.is_none() {
            report.undated_rows += 1;
        }
        report.field_defaults += defaults;
        rows.push(row);
    }
    Ok((rows, report))
}

fn lossy(record: &ByteRecord) -> StringRecord {
    record.iter().map(String::from_utf8_lossy).collect()
}

/// Clean one raw record. Returns the row and how many numeric cells defaulted to 0.
pub fn normalize_row(raw: &RawRow) -> (NormalizedRow, usize) {
    let mut defaults = 0usize;
    let mut number = |cell: Option<&str>, non_negative: bool| -> f64 {
        match parse_currency(cell) {
            Some(v) if !non_negative || v >= 0.0 => v,
            _ => {
                defaults += 1;
                0.0
            }
        }
    };
    let rooms_sold = number(raw.rooms_sold.as_deref(), true);
    let total_revenue = number(raw.total_revenue.as_deref(), false);
    let adr = number(raw.adr.as_deref(), false);
    let row = NormalizedRow {
        date: parse_date_flexible(raw.date.as_deref()),
        rooms_sold,
        total_revenue,
        adr,
    };
    (row, defaults)
}
