//! One report run, end to end:
//! locate → resolve previous → normalize both → reconcile → window → render.

use crate::archive::ArchiveChannel;
use crate::config::ReportConfig;
use crate::error::{ReportError, Result};
use crate::loader::{load_snapshot, LoadReport};
use crate::locator::locate;
use crate::outbox::{compose_archive, compose_report, write_message};
use crate::reconcile::reconcile;
use crate::render::{render_html, render_text};
use crate::resolver::{PreviousSnapshot, Resolver};
use crate::types::{ReportDateSource, ReportSummary, ReportWindow};
use crate::window::build_window;
use chrono::NaiveDate;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct ReportRun {
    pub report_date: NaiveDate,
    pub date_source: ReportDateSource,
    pub current: PathBuf,
    pub previous: Option<PreviousSnapshot>,
    pub current_load: LoadReport,
    pub previous_load: Option<LoadReport>,
    pub window: ReportWindow,
    pub html: String,
}

impl ReportRun {
    pub fn summary(&self) -> ReportSummary {
        ReportSummary {
            report_date: self.report_date,
            report_date_source: self.date_source,
            current_snapshot: self.current.display().to_string(),
            previous_snapshot: self.previous.as_ref().map(|p| p.path().display().to_string()),
            current_load: self.current_load.clone(),
            previous_load: self.previous_load.clone(),
            window: self.window.clone(),
        }
    }
}

/// Build the report. Only a missing/unreadable current snapshot or a render
/// failure is an error; everything about the previous snapshot degrades to a
/// pickup of 0.
pub fn run(config: &ReportConfig, channel: Option<&dyn ArchiveChannel>) -> Result<ReportRun> {
    let located = locate(&config.snapshot_dir, config.report_date)?;
    let report_date = located.report_date;

    let resolver = Resolver::new(&config.snapshot_dir, channel);
    let previous = resolver.resolve(report_date, &located.entries, &located.current);

    let (current_rows, current_load) = load_snapshot(&located.current.path)?;
    let (previous_rows, previous_load) = match previous.as_ref().map(|p| load_snapshot(p.path())) {
        Some(Ok((rows, report))) => (Some(rows), Some(report)),
        Some(Err(e)) => {
            warn!("Previous snapshot unusable, pickup will be 0: {}", e);
            (None, None)
        }
        None => {
            info!("No previous history found. Pickup is 0.");
            (None, None)
        }
    };

    let reconciled = reconcile(&current_rows, previous_rows.as_deref());
    let window = build_window(&reconciled, report_date);
    info!(
        "Window {}..={}: {} row(s), total pickup {:+}",
        window.report_date,
        window.end_date,
        window.rows.len(),
        window.totals.total_pickup
    );
    let html = render_html(&window, &config.title)?;

    Ok(ReportRun {
        report_date,
        date_source: located.date_source,
        current: located.current.path,
        previous: if previous_rows.is_some() { previous } else { None },
        current_load,
        previous_load,
        window,
        html,
    })
}

fn write_file(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| ReportError::io(parent, e))?;
    }
    std::fs::write(path, contents).map_err(|e| ReportError::io(path, e))
}

/// Emit the run to every output the configuration asks for.
///
/// Everything is rendered and composed before the first write, so a failure
/// while preparing one output leaves none of them behind.
pub fn publish(config: &ReportConfig, run: &ReportRun) -> Result<()> {
    let out = &config.output;
    let text = out.print.then(|| render_text(&run.window, &config.title));
    let json = match &out.json {
        Some(path) => Some((path, serde_json::to_string_pretty(&run.summary())?)),
        None => None,
    };
    let messages = match (&out.outbox, &config.mail) {
        (Some(dir), Some(identity)) => {
            let messages = vec![
                compose_report(identity, run.report_date, &run.html),
                compose_archive(identity, run.report_date, &run.current)?,
            ];
            Some((dir, messages))
        }
        _ => None,
    };

    if let Some(path) = &out.html {
        write_file(path, &run.html)?;
        info!("HTML report written to {}", path.display());
    }
    if let Some((path, json)) = json {
        write_file(path, &json)?;
        info!("Summary written to {}", path.display());
    }
    if let Some((dir, messages)) = messages {
        for msg in &messages {
            write_message(dir, msg)?;
        }
    }
    if let Some(text) = text {
        println!("{}", text);
    }
    Ok(())
}
