// src/core/dates.rs
use chrono::{NaiveDate, NaiveDateTime};

use crate::config::consts::DATE_FORMAT;

// Two-digit years first: `%Y` would read "25" as year 25.
const DAY_FIRST_DATES: &[&str] = &["%d/%m/%y", "%d/%m/%Y", "%d-%m-%Y", "%d.%m.%Y", "%Y-%m-%d"];

const DAY_FIRST_DATETIMES: &[&str] = &[
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
    "%d-%m-%Y %H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
];

/// Parse a cell with the day-first convention. Unparseable or blank → None.
/// ISO `YYYY-MM-DD` is accepted as written; it cannot be read day-first.
pub fn parse_day_first(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    DAY_FIRST_DATES
        .iter()
        .find_map(|f| NaiveDate::parse_from_str(s, f).ok())
        .or_else(|| {
            DAY_FIRST_DATETIMES
                .iter()
                .find_map(|f| NaiveDateTime::parse_from_str(s, f).ok())
                .map(|dt| dt.date())
        })
}

/// `DD/MM/YYYY`, the format text blocks, archives and reports share.
pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Strict inverse of [`format_date`].
pub fn parse_block_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), DATE_FORMAT).ok()
}
