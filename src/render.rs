//! Report rendering.
//!
//! Both outputs go through [`data_cells`] / [`totals_cells`] so the HTML
//! document and the terminal table always agree on formatting.

use crate::error::Result;
use crate::types::{PickupTrend, ReportTableRow, ReportTotals, ReportWindow, WindowRow};
use crate::util::{format_currency, format_signed, format_whole};
use std::fmt::Write;
use tabled::{settings::Style, Table};

const COLOR_ACCENT: &str = "#F05A28";
const COLOR_HEADER: &str = "#404040";

pub fn data_cells(row: &WindowRow) -> ReportTableRow {
    ReportTableRow {
        date: row.date.format("%m/%d").to_string(),
        day: row.day.clone(),
        rooms: format_whole(row.rooms_sold),
        revenue: format_currency(row.total_revenue, 0),
        adr: format_currency(row.adr, 2),
        pickup: format_signed(row.pickup),
    }
}

pub fn totals_cells(totals: &ReportTotals) -> ReportTableRow {
    ReportTableRow {
        date: "TOTAL".to_string(),
        day: String::new(),
        rooms: format_whole(totals.total_rooms),
        revenue: format_currency(totals.total_revenue, 0),
        adr: format_currency(totals.average_adr, 2),
        pickup: format_signed(totals.total_pickup),
    }
}

fn pickup_color(trend: PickupTrend) -> &'static str {
    match trend {
        PickupTrend::Up => "green",
        PickupTrend::Down => "red",
        PickupTrend::Flat => "#ccc",
    }
}

pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Self-contained, inline-styled HTML suitable for an email body.
pub fn render_html(window: &ReportWindow, title: &str) -> Result<String> {
    let mut html = String::new();
    write!(
        html,
        r#"<div style="font-family: Arial, sans-serif; color: #333;">
  <div style="border-bottom: 4px solid {accent}; padding-bottom: 10px; margin-bottom: 15px;">
    <h2 style="margin:0; color: #2D2D2D;">{title}</h2>
    <span style="color:#888; font-size:12px;">Date: {date}</span>
  </div>
  <table style="width:100%; border-collapse:collapse; font-size:13px;">
    <thead style="background-color:{header}; color:white;">
      <tr>
        <th style="padding:8px;">Date</th>
        <th style="padding:8px;">Day</th>
        <th style="padding:8px;">Rooms</th>
        <th style="padding:8px;">Rev</th>
        <th style="padding:8px;">ADR</th>
        <th style="padding:8px; background-color:{accent};">Pickup</th>
      </tr>
    </thead>
    <tbody>
"#,
        accent = COLOR_ACCENT,
        header = COLOR_HEADER,
        title = escape_html(title),
        date = window.report_date.format("%b %d, %Y"),
    )?;

    for row in &window.rows {
        let cells = data_cells(row);
        write!(
            html,
            r#"      <tr style="border-bottom:1px solid #ddd;">
        <td style="padding:8px; text-align:center;">{date}</td>
        <td style="padding:8px; text-align:center;">{day}</td>
        <td style="padding:8px; text-align:right;">{rooms}</td>
        <td style="padding:8px; text-align:right;">{revenue}</td>
        <td style="padding:8px; text-align:right;">{adr}</td>
        <td class="pickup-{trend}" style="padding:8px; text-align:right; font-weight:bold; color:{color};">{pickup}</td>
      </tr>
"#,
            date = cells.date,
            day = escape_html(&cells.day),
            rooms = cells.rooms,
            revenue = cells.revenue,
            adr = cells.adr,
            trend = row.trend.as_str(),
            color = pickup_color(row.trend),
            pickup = cells.pickup,
        )?;
    }

    let totals = totals_cells(&window.totals);
    write!(
        html,
        r#"      <tr style="background-color:#f4f4f4; font-weight:bold;">
        <td colspan="2" style="padding:8px;">{label}</td>
        <td style="padding:8px; text-align:right;">{rooms}</td>
        <td style="padding:8px; text-align:right;">{revenue}</td>
        <td style="padding:8px; text-align:right;">{adr}</td>
        <td class="pickup-total" style="padding:8px; text-align:right; color:{accent};">{pickup}</td>
      </tr>
    </tbody>
  </table>
</div>
"#,
        label = totals.date,
        rooms = totals.rooms,
        revenue = totals.revenue,
        adr = totals.adr,
        accent = COLOR_ACCENT,
        pickup = totals.pickup,
    )?;
    Ok(html)
}

/// Markdown-style table for terminal output.
pub fn render_text(window: &ReportWindow, title: &str) -> String {
    let mut rows: Vec<ReportTableRow> = window.rows.iter().map(data_cells).collect();
    rows.push(totals_cells(&window.totals));
    let table = Table::new(rows).with(Style::markdown()).to_string();
    format!(
        "{}\nDate: {}\n\n{}\n",
        title,
        window.report_date.format("%b %d, %Y"),
        table
    )
}
