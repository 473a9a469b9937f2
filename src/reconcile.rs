use crate::types::{NormalizedRow, ReconciledRow};
use chrono::NaiveDate;
use std::collections::HashMap;
use tracing::debug;

/// Rooms sold per date in the previous snapshot.
///
/// When a date appears more than once, the first row in file order wins.
fn previous_rooms_by_date(previous: &[NormalizedRow]) -> HashMap<NaiveDate, f64> {
    let mut map: HashMap<NaiveDate, f64> = HashMap::new();
    let mut duplicates = 0usize;
    for row in previous {
        let Some(date) = row.date else { continue };
        if map.contains_key(&date) {
            duplicates += 1;
            continue;
        }
        map.insert(date, row.rooms_sold);
    }
    if duplicates > 0 {
        debug!(
            "Previous snapshot repeats {} date(s); kept first occurrence",
            duplicates
        );
    }
    map
}

/// Attach a pickup to every current row. Rows without a date, or whose date is
/// not in `previous`, get a pickup of 0; so does everything when `previous` is `None`.
pub fn reconcile(current: &[NormalizedRow], previous: Option<&[NormalizedRow]>) -> Vec<ReconciledRow> {
    let lookup = previous.map(previous_rooms_by_date).unwrap_or_default();
    current
        .iter()
        .map(|row| {
            let pickup = row
                .date
                .and_then(|d| lookup.get(&d))
                .map(|prev| row.rooms_sold - prev)
                .unwrap_or(0.0);
            ReconciledRow {
                row: row.clone(),
                pickup,
            }
        })
        .collect()
}
