use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, TimeZone};
use regex::Regex;
use std::fmt;
use std::sync::OnceLock;

/// A reconciled DICOM date/time with explicit precision
///
/// DICOM splits timestamps into a DA (date) and an optional TM (time)
/// element. When the time is absent or shorter than whole seconds, only
/// date precision is produced; otherwise the configured timezone offset is
/// attached to form a full timestamp. Display output is FHIR-style
/// (`2023-06-15` or `2023-06-15T14:30:00+01:00`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StartedDateTime {
    Date(NaiveDate),
    DateTime(DateTime<FixedOffset>),
}

impl fmt::Display for StartedDateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StartedDateTime::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            StartedDateTime::DateTime(dt) => write!(f, "{}", dt.format("%Y-%m-%dT%H:%M:%S%:z")),
        }
    }
}

fn da_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(r"^\d{8}$").expect("Failed to compile regex"))
}

fn tm_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    // HHMMSS with optional fractional seconds
    REGEX.get_or_init(|| Regex::new(r"^\d{6}(\.\d+)?$").expect("Failed to compile regex"))
}

/// Combines a DICOM DA value and an optional TM value into one timestamp
///
/// Returns `None` for a malformed or impossible date; never an error.
/// A time shorter than whole-seconds precision (HHMMSS) is ignored and the
/// result falls back to date precision. Fractional seconds are truncated.
/// The offset comes from configuration, never from the process clock.
pub fn started_datetime(
    date: &str,
    time: Option<&str>,
    offset: FixedOffset,
) -> Option<StartedDateTime> {
    let date = date.trim();
    if !da_regex().is_match(date) {
        return None;
    }
    let parsed_date = NaiveDate::parse_from_str(date, "%Y%m%d").ok()?;

    let parsed_time = time
        .map(str::trim)
        .filter(|t| tm_regex().is_match(t))
        .and_then(|t| NaiveTime::parse_from_str(&t[0..6], "%H%M%S").ok());

    match parsed_time {
        Some(t) => offset
            .from_local_datetime(&parsed_date.and_time(t))
            .single()
            .map(StartedDateTime::DateTime),
        None => Some(StartedDateTime::Date(parsed_date)),
    }
}

/// Parses a DICOM TM value into seconds since midnight
///
/// Fractional seconds are preserved. Returns `None` on malformed input.
pub fn tm_to_seconds(time: &str) -> Option<f64> {
    let time = time.trim();
    if !tm_regex().is_match(time) {
        return None;
    }
    let hours: f64 = time[0..2].parse().ok()?;
    let minutes: f64 = time[2..4].parse().ok()?;
    let seconds: f64 = time[4..].parse().ok()?;
    if hours >= 24.0 || minutes >= 60.0 || seconds >= 61.0 {
        return None;
    }
    Some(hours * 3600.0 + minutes * 60.0 + seconds)
}
