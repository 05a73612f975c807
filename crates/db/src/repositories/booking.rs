use chrono::{DateTime, Utc};
use eyre::{Result, WrapErr, eyre};
use skillsession_core::models::{
    booking::{Booking, BookingStatus},
    time_format,
};
use tracing::warn;

use super::date_attr;
use crate::store::{Document, DocumentExt, DocumentStore, KeyedDocument, ScanFilter, scan_all};

pub fn booking_document(booking: &Booking) -> KeyedDocument {
    let document = Document::from([
        ("bookingId".to_string(), booking.booking_id.as_str().into()),
        ("tutorId".to_string(), booking.tutor_id.as_str().into()),
        ("learnerId".to_string(), booking.learner_id.as_str().into()),
        ("slotId".to_string(), booking.slot_id.as_str().into()),
        ("slotDate".to_string(), time_format::format_date(booking.slot_date).into()),
        ("status".to_string(), booking.status.as_str().into()),
        ("requestedAt".to_string(), booking.requested_at.to_rfc3339().into()),
    ]);
    KeyedDocument::new(booking.booking_id.clone(), document)
}

pub fn decode_booking(item: &KeyedDocument) -> Result<Booking> {
    let document = &item.document;
    let requested_at = document.string("requestedAt")?;

    Ok(Booking {
        booking_id: document.optional_string("bookingId").unwrap_or_else(|| item.key.clone()),
        tutor_id: document.string("tutorId")?.to_string(),
        learner_id: document.string("learnerId")?.to_string(),
        slot_id: document.string("slotId")?.to_string(),
        slot_date: date_attr(document, "slotDate")?,
        status: document.string("status")?.parse::<BookingStatus>().map_err(|e: String| eyre!(e))?,
        requested_at: DateTime::parse_from_rfc3339(requested_at)
            .wrap_err_with(|| format!("attribute 'requestedAt' is not a timestamp: '{}'", requested_at))?
            .with_timezone(&Utc),
    })
}

fn decode_all(items: Vec<KeyedDocument>) -> Vec<Booking> {
    items
        .iter()
        .filter_map(|item| match decode_booking(item) {
            Ok(booking) => Some(booking),
            Err(e) => {
                warn!("Skipping malformed booking '{}': {}", item.key, e);
                None
            }
        })
        .collect()
}

pub async fn create_booking(store: &dyn DocumentStore, table: &str, booking: &Booking) -> Result<()> {
    store
        .put_item(table, booking_document(booking))
        .await
        .wrap_err_with(|| format!("failed to store booking '{}'", booking.booking_id))
}

pub async fn get_booking(store: &dyn DocumentStore, table: &str, booking_id: &str) -> Result<Option<Booking>> {
    let document = store
        .get_item(table, booking_id)
        .await
        .wrap_err_with(|| format!("failed to load booking '{}'", booking_id))?;

    document
        .map(|document| decode_booking(&KeyedDocument::new(booking_id, document)))
        .transpose()
}

pub async fn set_booking_status(
    store: &dyn DocumentStore,
    table: &str,
    booking_id: &str,
    status: BookingStatus,
) -> Result<bool> {
    let changes = Document::from([("status".to_string(), status.as_str().into())]);
    store
        .update_item(table, booking_id, changes)
        .await
        .wrap_err_with(|| format!("failed to set booking '{}' to {}", booking_id, status))
}

/// A tutor's bookings, most recent request first.
pub async fn list_tutor_bookings(store: &dyn DocumentStore, table: &str, tutor_id: &str) -> Result<Vec<Booking>> {
    let filter = ScanFilter::all().equals("tutorId", tutor_id);
    let mut bookings = decode_all(scan_all(store, table, &filter).await?);
    bookings.sort_by(|a, b| b.requested_at.cmp(&a.requested_at));
    Ok(bookings)
}

/// Slot ids the learner has PENDING requests for with this tutor.
pub async fn pending_slot_ids(
    store: &dyn DocumentStore,
    table: &str,
    tutor_id: &str,
    learner_id: &str,
) -> Result<Vec<String>> {
    let filter = ScanFilter::all()
        .equals("tutorId", tutor_id)
        .equals("learnerId", learner_id)
        .equals("status", BookingStatus::Pending.as_str());

    let mut slot_ids: Vec<String> = decode_all(scan_all(store, table, &filter).await?)
        .into_iter()
        .map(|b| b.slot_id)
        .collect();
    slot_ids.sort();
    slot_ids.dedup();
    Ok(slot_ids)
}
