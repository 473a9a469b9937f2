use chrono::NaiveDate;
use pickup_report::archive::{ArchiveChannel, ArchiveRecord, MaildirArchive};
use pickup_report::config::{MailIdentity, OutputSettings, ReportConfig};
use pickup_report::outbox::{compose_archive, write_message};
use pickup_report::pipeline;
use pickup_report::resolver::PreviousSnapshot;
use pickup_report::types::PickupTrend;
use pickup_report::ReportError;
use std::cell::Cell;
use std::path::Path;

const HEADER: &str = "Date,Total Rooms Sold Allocated,Total Revenue,ADR\n";

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn write_snapshot(dir: &Path, name: &str, rows: &[&str]) {
    std::fs::create_dir_all(dir).unwrap();
    let mut body = HEADER.to_string();
    for r in rows {
        body.push_str(r);
        body.push('\n');
    }
    std::fs::write(dir.join(name), body).unwrap();
}

struct CountingArchive {
    calls: Cell<usize>,
}

impl ArchiveChannel for CountingArchive {
    fn list_records(
        &self,
        _subject_key: &str,
        _limit: usize,
    ) -> pickup_report::Result<Vec<ArchiveRecord>> {
        self.calls.set(self.calls.get() + 1);
        Err(ReportError::RemoteFetch("mailbox unreachable".into()))
    }
}

fn identity() -> MailIdentity {
    MailIdentity {
        user: "bot@example.com".into(),
        to: Some("gm@example.com".into()),
        sender_name: "Pickup Report Bot".into(),
    }
}

#[test]
fn single_row_against_local_previous() {
    let dir = tempfile::tempdir().unwrap();
    let store = dir.path().join("csv_downloads");
    write_snapshot(&store, "Forecast_2024-03-04.csv", &["2024-03-05,90,\"$9,000\",$100.00"]);
    write_snapshot(
        &store,
        "Forecast_2024-03-05.csv",
        &["2024-03-05,100,\"$10,000\",$100.00"],
    );

    let archive = CountingArchive { calls: Cell::new(0) };
    let config = ReportConfig::new(&store);
    let run = pipeline::run(&config, Some(&archive)).unwrap();

    assert_eq!(archive.calls.get(), 0);
    assert_eq!(run.report_date, d(2024, 3, 5));
    assert_eq!(
        run.previous,
        Some(PreviousSnapshot::Local(store.join("Forecast_2024-03-04.csv")))
    );
    assert_eq!(run.window.rows.len(), 1);
    let row = &run.window.rows[0];
    assert_eq!(row.pickup, 10.0);
    assert_eq!(row.trend, PickupTrend::Up);

    let t = &run.window.totals;
    assert_eq!(t.total_rooms, 100.0);
    assert_eq!(t.total_revenue, 10_000.0);
    assert_eq!(t.total_pickup, 10.0);
    assert_eq!(t.average_adr, 100.0);

    assert_eq!(run.html.matches(">$10,000</td>").count(), 2);
    assert_eq!(run.html.matches(">$100.00</td>").count(), 2);
    assert_eq!(run.html.matches(">+10</td>").count(), 2);
}

#[test]
fn no_previous_anywhere_means_zero_pickup() {
    let dir = tempfile::tempdir().unwrap();
    let store = dir.path().join("store");
    write_snapshot(
        &store,
        "Forecast_2024-01-10.csv",
        &[
            "2024-01-09,5,$500,$100",
            "2024-01-10,10,\"$1,000\",$100",
            "2024-01-16,12,\"$1,200\",$100",
            "2024-01-17,14,\"$1,400\",$100",
            "not a date,1,$1,$1",
        ],
    );

    let archive = CountingArchive { calls: Cell::new(0) };
    let run = pipeline::run(&ReportConfig::new(&store), Some(&archive)).unwrap();

    // Remote failure is swallowed after exactly one lookup.
    assert_eq!(archive.calls.get(), 1);
    assert_eq!(run.previous, None);
    assert_eq!(run.previous_load, None);
    assert_eq!(run.current_load.undated_rows, 1);

    let dates: Vec<NaiveDate> = run.window.rows.iter().map(|r| r.date).collect();
    assert_eq!(dates, vec![d(2024, 1, 10), d(2024, 1, 16)]);
    assert!(run.window.rows.iter().all(|r| r.pickup == 0.0));
    assert_eq!(run.window.totals.total_pickup, 0.0);
    assert_eq!(run.window.totals.total_rooms, 22.0);
    assert_eq!(run.window.totals.average_adr, 2_200.0 / 22.0);
}

#[test]
fn restores_previous_from_archived_outbox() {
    let dir = tempfile::tempdir().unwrap();
    let yesterday = dir.path().join("yesterday");
    write_snapshot(
        &yesterday,
        "Forecast_2024-03-04.csv",
        &["2024-03-05,90,$9000,$100", "2024-03-06,40,$4000,$100"],
    );
    let sent = dir.path().join("sent");
    let msg = compose_archive(&identity(), d(2024, 3, 4), &yesterday.join("Forecast_2024-03-04.csv"))
        .unwrap();
    write_message(&sent, &msg).unwrap();

    let store = dir.path().join("store");
    write_snapshot(
        &store,
        "Forecast_2024-03-05.csv",
        &["2024-03-05,100,$10000,$100", "2024-03-06,35,$3500,$100"],
    );

    let archive = MaildirArchive::new(&sent);
    let run = pipeline::run(&ReportConfig::new(&store), Some(&archive)).unwrap();

    let restored = store.join("Forecast_2024-03-04.csv");
    assert_eq!(run.previous, Some(PreviousSnapshot::Restored(restored.clone())));
    assert!(restored.exists());
    let pickups: Vec<f64> = run.window.rows.iter().map(|r| r.pickup).collect();
    assert_eq!(pickups, vec![10.0, -5.0]);
    assert_eq!(run.window.totals.total_pickup, 5.0);
    assert!(run.html.contains(r#"class="pickup-down""#));
}

#[test]
fn empty_store_halts_softly() {
    let dir = tempfile::tempdir().unwrap();
    let err = pipeline::run(&ReportConfig::new(dir.path().join("missing")), None).unwrap_err();
    assert!(matches!(err, ReportError::NoCurrentSnapshot { .. }));
    assert_eq!(err.exit_code(), 0);
}

#[test]
fn explicit_report_date_overrides_file_name() {
    let dir = tempfile::tempdir().unwrap();
    let store = dir.path().join("store");
    write_snapshot(&store, "forecast.csv", &["2024-03-05,100,$10000,$100"]);

    let mut config = ReportConfig::new(&store);
    config.report_date = Some(d(2024, 3, 5));
    let run = pipeline::run(&config, None).unwrap();
    assert_eq!(run.report_date, d(2024, 3, 5));
    assert_eq!(run.window.rows.len(), 1);
}

#[test]
fn publish_writes_every_requested_output() {
    let dir = tempfile::tempdir().unwrap();
    let store = dir.path().join("store");
    write_snapshot(&store, "Forecast_2024-03-05.csv", &["2024-03-05,100,$10000,$100"]);

    let out = dir.path().join("out");
    let mut config = ReportConfig::new(&store);
    config.mail = Some(identity());
    config.output = OutputSettings {
        html: Some(out.join("report.html")),
        json: Some(out.join("summary.json")),
        outbox: Some(out.join("outbox")),
        print: false,
    };
    let run = pipeline::run(&config, None).unwrap();
    pipeline::publish(&config, &run).unwrap();

    let html = std::fs::read_to_string(out.join("report.html")).unwrap();
    assert_eq!(html, run.html);

    let summary: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(out.join("summary.json")).unwrap()).unwrap();
    assert_eq!(summary["report_date"], "2024-03-05");
    assert_eq!(summary["report_date_source"], "identifier");
    assert_eq!(summary["window"]["totals"]["total_rooms"], 100.0);

    // Tomorrow's run can find today's archive copy in the outbox.
    let record = MaildirArchive::new(out.join("outbox"))
        .fetch_latest_matching("DATA ARCHIVE - 2024-03-05")
        .unwrap()
        .unwrap();
    assert_eq!(record.attachments[0].filename, "Forecast_2024-03-05.csv");
    let report = MaildirArchive::new(out.join("outbox"))
        .fetch_latest_matching("Daily Sales Report - 2024-03-05")
        .unwrap()
        .unwrap();
    assert!(report.attachments.is_empty());
}

#[test]
fn failed_archive_compose_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let store = dir.path().join("store");
    write_snapshot(&store, "Forecast_2024-03-05.csv", &["2024-03-05,100,$10000,$100"]);

    let out = dir.path().join("out");
    let mut config = ReportConfig::new(&store);
    config.mail = Some(identity());
    config.output = OutputSettings {
        html: Some(out.join("report.html")),
        json: Some(out.join("summary.json")),
        outbox: Some(out.join("outbox")),
        print: false,
    };
    let run = pipeline::run(&config, None).unwrap();
    // The snapshot vanishes before the archive copy can be composed.
    std::fs::remove_file(store.join("Forecast_2024-03-05.csv")).unwrap();

    let err = pipeline::publish(&config, &run).unwrap_err();
    assert!(matches!(err, ReportError::Io { .. }));
    assert!(!out.exists());
}

#[test]
fn archived_copy_with_current_name_is_not_history() {
    let dir = tempfile::tempdir().unwrap();
    let sent_src = dir.path().join("yesterday");
    write_snapshot(&sent_src, "forecast.csv", &["2024-03-05,90,$9000,$100"]);
    let sent = dir.path().join("sent");
    let msg = compose_archive(&identity(), d(2024, 3, 4), &sent_src.join("forecast.csv")).unwrap();
    write_message(&sent, &msg).unwrap();

    let store = dir.path().join("store");
    write_snapshot(&store, "forecast.csv", &["2024-03-05,100,$10000,$100"]);

    let mut config = ReportConfig::new(&store);
    config.report_date = Some(d(2024, 3, 5));
    let archive = MaildirArchive::new(&sent);
    let run = pipeline::run(&config, Some(&archive)).unwrap();

    assert_eq!(run.previous, None);
    assert_eq!(run.previous_load, None);
    assert_eq!(run.window.rows[0].pickup, 0.0);
    assert_eq!(run.window.rows[0].rooms_sold, 100.0);
}
