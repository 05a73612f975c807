//! Typed reads and writes over a [`DocumentStore`].
//!
//! Each module converts one record type to and from its document form.
//! Attribute names are camelCase, matching the JSON the API speaks.

pub mod availability;
pub mod booking;
pub mod profile;
pub mod slot;

use chrono::{NaiveDate, NaiveTime};
use eyre::{Result, eyre};
use skillsession_core::models::time_format;

use crate::store::{AttributeValue, Document, DocumentExt};

pub(crate) fn date_attr(document: &Document, field: &str) -> Result<NaiveDate> {
    let raw = document.string(field)?;
    time_format::parse_date(raw).ok_or_else(|| eyre!("attribute '{}' is not a date: '{}'", field, raw))
}

pub(crate) fn time_attr(document: &Document, field: &str) -> Result<NaiveTime> {
    let raw = document.string(field)?;
    time_format::parse_time(raw).ok_or_else(|| eyre!("attribute '{}' is not a time: '{}'", field, raw))
}

/// Inserts `value` only when present.
pub(crate) fn put_optional(document: &mut Document, field: &str, value: Option<impl Into<AttributeValue>>) {
    if let Some(value) = value {
        document.insert(field.to_string(), value.into());
    }
}
