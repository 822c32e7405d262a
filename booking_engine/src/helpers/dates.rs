use chrono::{DateTime, NaiveDate};

/// Parses a booking date at day granularity. Accepts a plain `YYYY-MM-DD` date or an RFC 3339 timestamp, in which
/// case the time of day (and offset) is discarded and the calendar date as written is kept.
pub fn parse_schedule_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(value).ok().map(|dt| dt.date_naive()))
}
