//! Timestamp and calendar date utilities

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

/// Get current UTC timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Date-only layouts accepted in uploads
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];

/// Date-and-time layouts whose date part is kept
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
];

/// Parse a calendar date from user-supplied text.
///
/// Leading/trailing whitespace is ignored. A trailing time part is accepted
/// and discarded, as is an RFC 3339 offset. Returns `None` for anything that
/// is not a real calendar date (e.g. `2025-02-30`).
pub fn parse_calendar_date(input: &str) -> Option<NaiveDate> {
    let text = input.trim();
    if text.is_empty() {
        return None;
    }

    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(text, fmt) {
            return Some(date);
        }
    }

    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, fmt) {
            return Some(dt.date());
        }
    }

    DateTime::parse_from_rfc3339(text)
        .ok()
        .map(|dt| dt.date_naive())
}

/// Parse a timestamp from warehouse text output.
///
/// Snowflake returns `TIMESTAMP_*` columns as epoch seconds with an optional
/// fractional part (and, for `TIMESTAMP_TZ`, a trailing offset field). RFC 3339
/// and `YYYY-MM-DD HH:MM:SS` are accepted as well.
pub fn parse_timestamp(input: &str) -> Option<DateTime<Utc>> {
    let text = input.trim();
    if text.is_empty() {
        return None;
    }

    let epoch_part = text.split_whitespace().next().unwrap_or(text);
    if let Some((secs, nanos)) = split_epoch(epoch_part) {
        return DateTime::from_timestamp(secs, nanos);
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }

    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
        .map(|naive| naive.and_utc())
}

/// Parse a warehouse `DATE` value: either days since the Unix epoch or text.
pub fn parse_warehouse_date(input: &str) -> Option<NaiveDate> {
    let text = input.trim();
    if let Ok(days) = text.parse::<i64>() {
        let epoch = NaiveDate::from_ymd_opt(1970, 1, 1)?;
        return epoch.checked_add_signed(chrono::Duration::days(days));
    }
    // TIMESTAMP values occasionally land in DATE columns
    if let Some(ts) = parse_timestamp(text) {
        return Some(ts.date_naive());
    }
    parse_calendar_date(text)
}

fn split_epoch(text: &str) -> Option<(i64, u32)> {
    let (whole, frac) = match text.split_once('.') {
        Some((w, f)) => (w, f),
        None => (text, ""),
    };
    if whole.is_empty() || !whole.trim_start_matches('-').chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    if !frac.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let secs = whole.parse::<i64>().ok()?;
    let nanos = if frac.is_empty() {
        0
    } else {
        let padded: String = frac.chars().chain(std::iter::repeat('0')).take(9).collect();
        padded.parse::<u32>().ok()?
    };
    Some((secs, nanos))
}
