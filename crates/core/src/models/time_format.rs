//! Strict calendar-date (`YYYY-MM-DD`) and time-of-day (`HH:MM`) handling.
//!
//! Stored records and request bodies carry dates and times as plain strings
//! with no timezone. Parsing is strict: `9:00` and `2024-1-5` are rejected so
//! that the string form of a value is always its canonical form.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Deserializer, Serializer, de::Error};

pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const TIME_FORMAT: &str = "%H:%M";

pub fn parse_date(value: &str) -> Option<NaiveDate> {
    if value.len() != 10 {
        return None;
    }
    NaiveDate::parse_from_str(value, DATE_FORMAT).ok()
}

pub fn parse_time(value: &str) -> Option<NaiveTime> {
    if value.len() != 5 {
        return None;
    }
    NaiveTime::parse_from_str(value, TIME_FORMAT).ok()
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

pub fn format_time(time: NaiveTime) -> String {
    time.format(TIME_FORMAT).to_string()
}

/// Serde adapter for `NaiveTime` fields rendered as `HH:MM`.
pub mod hh_mm {
    use super::*;

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format_time(*time))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse_time(&raw).ok_or_else(|| D::Error::custom(format!("invalid time '{}', expected HH:MM", raw)))
    }
}
