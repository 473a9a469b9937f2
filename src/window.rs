use crate::types::{PickupTrend, ReconciledRow, ReportTotals, ReportWindow, WindowRow};
use chrono::{Days, NaiveDate};

pub const WINDOW_DAYS: u64 = 7;

/// Keep rows dated `[report_date, report_date + 6]`, ascending by date.
pub fn build_window(rows: &[ReconciledRow], report_date: NaiveDate) -> ReportWindow {
    let end_date = report_date
        .checked_add_days(Days::new(WINDOW_DAYS - 1))
        .unwrap_or(NaiveDate::MAX);
    let mut kept: Vec<WindowRow> = rows
        .iter()
        .filter_map(|r| {
            let date = r.row.date?;
            (date >= report_date && date <= end_date).then(|| WindowRow {
                date,
                day: date.format("%a").to_string(),
                rooms_sold: r.row.rooms_sold,
                total_revenue: r.row.total_revenue,
                adr: r.row.adr,
                pickup: r.pickup,
                trend: PickupTrend::classify(r.pickup),
            })
        })
        .collect();
    // Stable: rows sharing a date keep file order.
    kept.sort_by_key(|r| r.date);
    let totals = totals(&kept);
    ReportWindow {
        report_date,
        end_date,
        rows: kept,
        totals,
    }
}

pub fn totals(rows: &[WindowRow]) -> ReportTotals {
    let (rooms, revenue, pickup) = rows.iter().fold((0.0, 0.0, 0.0), |(rooms, rev, pk), r| {
        (rooms + r.rooms_sold, rev + r.total_revenue, pk + r.pickup)
    });
    ReportTotals {
        total_rooms: rooms,
        total_revenue: revenue,
        total_pickup: pickup,
        average_adr: if rooms > 0.0 { revenue / rooms } else { 0.0 },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::NormalizedRow;

    fn d(m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, m, day).unwrap()
    }

    fn rec(date: Option<NaiveDate>, rooms: f64, revenue: f64, pickup: f64) -> ReconciledRow {
        ReconciledRow {
            row: NormalizedRow {
                date,
                rooms_sold: rooms,
                total_revenue: revenue,
                adr: if rooms > 0.0 { revenue / rooms } else { 0.0 },
            },
            pickup,
        }
    }

    #[test]
    fn keeps_seven_inclusive_days() {
        let rows: Vec<ReconciledRow> = (9..=17)
            .rev()
            .map(|day| rec(Some(d(1, day)), 1.0, 100.0, 0.0))
            .chain(std::iter::once(rec(None, 5.0, 500.0, 0.0)))
            .collect();
        let window = build_window(&rows, d(1, 10));
        let dates: Vec<NaiveDate> = window.rows.iter().map(|r| r.date).collect();
        assert_eq!(dates, (10..=16).map(|day| d(1, day)).collect::<Vec<_>>());
        assert_eq!(window.end_date, d(1, 16));
        assert_eq!(window.rows[0].day, "Wed");
    }

    #[test]
    fn totals_are_sums_and_weighted_adr() {
        let rows = vec![
            rec(Some(d(3, 5)), 100.0, 10_000.0, 10.0),
            rec(Some(d(3, 6)), 50.0, 7_500.0, -4.0),
            rec(Some(d(3, 7)), 0.0, 0.0, 0.0),
        ];
        let window = build_window(&rows, d(3, 5));
        let t = &window.totals;
        assert_eq!(t.total_rooms, 150.0);
        assert_eq!(t.total_revenue, 17_500.0);
        assert_eq!(t.total_pickup, 6.0);
        assert!((t.average_adr - 17_500.0 / 150.0).abs() < 1e-9);
        let trends: Vec<PickupTrend> = window.rows.iter().map(|r| r.trend).collect();
        assert_eq!(trends, vec![PickupTrend::Up, PickupTrend::Down, PickupTrend::Flat]);
    }

    #[test]
    fn fractional_pickup_follows_displayed_sign() {
        let rows = vec![
            rec(Some(d(3, 5)), 10.5, 1_050.0, 0.5),
            rec(Some(d(3, 6)), 9.5, 950.0, -0.5),
            rec(Some(d(3, 7)), 12.0, 1_200.0, 1.5),
            rec(Some(d(3, 8)), 8.0, 800.0, -1.5),
        ];
        let window = build_window(&rows, d(3, 5));
        let trends: Vec<PickupTrend> = window.rows.iter().map(|r| r.trend).collect();
        assert_eq!(
            trends,
            vec![
                PickupTrend::Flat,
                PickupTrend::Flat,
                PickupTrend::Up,
                PickupTrend::Down
            ]
        );
    }

    #[test]
    fn empty_window_has_zero_totals() {
        let rows = vec![rec(Some(d(2, 1)), 10.0, 1000.0, 3.0)];
        let window = build_window(&rows, d(3, 5));
        assert!(window.rows.is_empty());
        assert_eq!(window.totals, ReportTotals::default());
    }
}
