//! Utility helpers for parsing and formatting.
//!
//! This module centralizes all the "dirty" CSV/number/date handling so the
//! rest of the code can assume clean, typed values.
use chrono::{NaiveDate, NaiveDateTime};
use num_format::{Locale, ToFormattedString};
use once_cell::sync::Lazy;
use regex::Regex;

const CURRENCY_SYMBOLS: [char; 4] = ['$', '€', '£', '¥'];

// Order matters: chrono's `%Y` accepts any digit count, so `3/5/24` would
// read as year 3 under `%Y/%m/%d` and `%m/%d/%Y` would read `24` as year 24.
const DATE_FORMATS: [&str; 6] = [
    "%Y-%m-%d",
    "%m/%d/%y",
    "%m/%d/%Y",
    "%Y/%m/%d",
    "%d-%b-%Y",
    "%b %d, %Y",
];

const DATETIME_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M:%S"];

static DATE_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d{4}-\d{2}-\d{2})").expect("date token pattern is valid"));

/// Parse a currency-like cell into `f64`.
///
/// - Accepts `Option<&str>` so callers can pass through optional fields.
/// - Trims whitespace and strips currency symbols and thousands separators.
/// - `(1,234)` is read as an accounting negative.
/// - Rejects anything with alphabetic characters left over.
/// - Returns `None` for anything that cannot be safely parsed.
pub fn parse_currency(s: Option<&str>) -> Option<f64> {
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    let (negate, body) = match s.strip_prefix('(').and_then(|r| r.strip_suffix(')')) {
        Some(inner) => (true, inner),
        None => (false, s),
    };
    let cleaned: String = body
        .chars()
        .filter(|c| !CURRENCY_SYMBOLS.contains(c) && *c != ',' && !c.is_whitespace())
        .collect();
    if cleaned.is_empty() || cleaned.chars().any(|c| c.is_alphabetic()) {
        return None;
    }
    let v = cleaned.parse::<f64>().ok()?;
    if !v.is_finite() {
        return None;
    }
    Some(if negate { -v } else { v })
}

/// Parse a date cell in any of the layouts daily exports are known to use.
pub fn parse_date_flexible(s: Option<&str>) -> Option<NaiveDate> {
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
                .map(|dt| dt.date())
        })
}

/// Find the first `YYYY-MM-DD` token in an identifier such as a file name.
///
/// Tokens that look right but are not real calendar dates (`2024-13-40`) are
/// skipped in favour of a later valid one.
pub fn extract_date_token(text: &str) -> Option<NaiveDate> {
    DATE_TOKEN
        .captures_iter(text)
        .find_map(|c| NaiveDate::parse_from_str(&c[1], "%Y-%m-%d").ok())
}

pub fn format_number(n: f64, decimals: usize) -> String {
    // Format a floating-point value with:
    // - a fixed number of decimal places, and
    // - locale-aware thousands separators (e.g., `1,234,567.89`).
    let abs_n = n.abs();
    // First, format to a plain fixed-decimal string like `1234567.89`.
    let s = format!("{:.*}", decimals, abs_n);
    let mut parts = s.split('.');
    let int_part = parts.next().unwrap_or("0");
    let frac_part = parts.next();
    // Use `num-format` to insert commas into the integer portion. Past u128
    // the digits are grouped by hand rather than lost.
    let mut res = match int_part.parse::<u128>() {
        Ok(v) => v.to_formatted_string(&Locale::en),
        Err(_) => group_thousands(int_part),
    };
    if let Some(frac) = frac_part {
        if decimals > 0 {
            res.push('.');
            res.push_str(frac);
        }
    }
    // A value that rounds to zero is printed unsigned.
    let rounds_to_zero = s.chars().all(|c| c == '0' || c == '.');
    if n < 0.0 && !rounds_to_zero {
        format!("-{}", res)
    } else {
        res
    }
}

fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// `$1,234` style rendering; the sign goes in front of the symbol.
pub fn format_currency(n: f64, decimals: usize) -> String {
    let body = format_number(n, decimals);
    match body.strip_prefix('-') {
        Some(abs) => format!("-${}", abs),
        None => format!("${}", body),
    }
}

/// Whole-unit rendering of a count; fractional parts are truncated.
pub fn format_whole(n: f64) -> String {
    (n.trunc() as i64).to_string()
}

/// Signed whole-unit rendering (`+3`, `-2`, `+0`).
pub fn format_signed(n: f64) -> String {
    format!("{:+}", n.trunc() as i64)
}

pub fn format_int<T>(n: T) -> String
where
    T: ToFormattedString,
{
    // Thin wrapper around `num-format` for integer-like values. This is used
    // for counts in log messages (e.g., `9,855 rows loaded`).
    n.to_formatted_string(&Locale::en)
}
