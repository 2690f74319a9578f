//! Date handling for booking and birthday fields.
//!
//! The Remote API returns dates as ISO-8601 strings, sometimes with a time-of-day
//! and an offset, sometimes without either. Everything is reduced to a UTC calendar
//! date before it is displayed or submitted, so two clients in different timezones
//! never disagree about which day a booking starts.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

const DATE: &str = "%Y-%m-%d";

/// Parse any of the accepted date spellings into a UTC calendar date.
///
/// Accepted: RFC 3339 with offset (converted to UTC), naive `YYYY-MM-DDTHH:MM:SS[.fff]`
/// or `YYYY-MM-DD HH:MM:SS` (taken as UTC), `YYYY-MM-DD`, and `DD/MM/YYYY`.
pub fn parse(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc).date_naive());
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.date());
        }
    }
    NaiveDate::parse_from_str(s, DATE)
        .or_else(|_| NaiveDate::parse_from_str(s, "%d/%m/%Y"))
        .ok()
}

/// Render a raw API date for display; unparseable input is shown unchanged.
pub fn display(raw: &str) -> String {
    match parse(raw) {
        Some(d) => d.format(DATE).to_string(),
        None => raw.to_string(),
    }
}

/// Midnight UTC of `date`, the form bookings are submitted in.
pub fn to_wire(date: NaiveDate) -> String {
    format!("{}T00:00:00Z", date.format(DATE))
}

/// Plain `YYYY-MM-DD`, used for date-only fields such as a birthday.
pub fn to_date_string(date: NaiveDate) -> String {
    date.format(DATE).to_string()
}

pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}
