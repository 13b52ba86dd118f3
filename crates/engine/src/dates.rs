//! Storage-boundary date conversion.
//!
//! Dates live as calendar days ([`NaiveDate`]) in the domain and as UTC
//! timestamps in the store. Conversion is strict: null-ish, empty or
//! unparseable inputs fail with [`EngineError::InvalidDate`] instead of
//! silently defaulting, because a defaulted due date would corrupt the
//! reporting groups downstream.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};

use crate::{EngineError, ResultEngine};

/// Parses a user- or OCR-supplied date string.
///
/// Accepted forms:
/// - `DD/MM/YYYY` and `DD-MM-YYYY` (Brazilian convention)
/// - 2-digit years, promoted by +2000 (`03/12/25` → 2025-12-03)
/// - ISO `YYYY-MM-DD`
pub fn parse_date(value: &str) -> ResultEngine<NaiveDate> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(EngineError::InvalidDate("empty date".to_string()));
    }

    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Ok(date);
    }

    let parts: Vec<&str> = trimmed.split(['/', '-']).collect();
    if parts.len() == 3 {
        let day: u32 = parts[0]
            .parse()
            .map_err(|_| invalid(trimmed))?;
        let month: u32 = parts[1]
            .parse()
            .map_err(|_| invalid(trimmed))?;
        let mut year: i32 = parts[2]
            .parse()
            .map_err(|_| invalid(trimmed))?;
        if year < 100 {
            year += 2000;
        }
        return NaiveDate::from_ymd_opt(year, month, day).ok_or_else(|| invalid(trimmed));
    }

    Err(invalid(trimmed))
}

fn invalid(value: &str) -> EngineError {
    EngineError::InvalidDate(format!("unparseable date: {value}"))
}

/// Converts a calendar date to the stored UTC timestamp (midnight UTC).
pub fn date_to_timestamp(date: NaiveDate) -> ResultEngine<DateTime<Utc>> {
    let midnight = date
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| EngineError::InvalidDate(format!("invalid date: {date}")))?;
    Ok(Utc.from_utc_datetime(&midnight))
}

/// Converts a stored UTC timestamp back to its calendar date.
pub fn timestamp_to_date(ts: DateTime<Utc>) -> NaiveDate {
    ts.date_naive()
}
