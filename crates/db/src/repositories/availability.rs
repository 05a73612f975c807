use eyre::{Result, WrapErr};
use skillsession_core::models::{availability::AvailabilityWindow, time_format};

use crate::store::{Document, DocumentStore, KeyedDocument};

pub fn window_document(window: &AvailabilityWindow) -> KeyedDocument {
    let document = Document::from([
        ("tutorId".to_string(), window.tutor_id.as_str().into()),
        ("date".to_string(), window.date_string().into()),
        ("startTime".to_string(), time_format::format_time(window.start_time).into()),
        ("endTime".to_string(), time_format::format_time(window.end_time).into()),
    ]);
    KeyedDocument::new(window.key(), document)
}

/// Stores `window` unless the tutor already has one for that date.
///
/// Returns `false` when a window exists; nothing is written then.
pub async fn create_window(
    store: &dyn DocumentStore,
    table: &str,
    window: &AvailabilityWindow,
) -> Result<bool> {
    store
        .put_item_if_absent(table, window_document(window))
        .await
        .wrap_err_with(|| format!("failed to store availability '{}'", window.key()))
}
