use eyre::{Result, WrapErr, eyre};
use skillsession_core::models::{
    slot::{Slot, SlotStatus},
    time_format,
};
use tracing::warn;

use super::{date_attr, time_attr};
use crate::store::{Document, DocumentExt, DocumentStore, KeyedDocument, ScanFilter, scan_all};

pub fn slot_document(slot: &Slot) -> KeyedDocument {
    let document = Document::from([
        ("id".to_string(), slot.id.as_str().into()),
        ("tutorId".to_string(), slot.tutor_id.as_str().into()),
        ("date".to_string(), time_format::format_date(slot.date).into()),
        ("startTime".to_string(), time_format::format_time(slot.start_time).into()),
        ("endTime".to_string(), time_format::format_time(slot.end_time).into()),
        ("status".to_string(), slot.status.as_str().into()),
    ]);
    KeyedDocument::new(slot.id.clone(), document)
}

/// Decodes a stored slot. The key is used when the `id` attribute is absent.
pub fn decode_slot(item: &KeyedDocument) -> Result<Slot> {
    let document = &item.document;
    let status = document.string("status")?;

    Ok(Slot {
        id: document.optional_string("id").unwrap_or_else(|| item.key.clone()),
        tutor_id: document.string("tutorId")?.to_string(),
        date: date_attr(document, "date")?,
        start_time: time_attr(document, "startTime")?,
        end_time: time_attr(document, "endTime")?,
        status: status.parse::<SlotStatus>().map_err(|e: String| eyre!(e))?,
    })
}

pub async fn create_slots(store: &dyn DocumentStore, table: &str, slots: &[Slot]) -> Result<()> {
    let items = slots.iter().map(slot_document).collect();
    store
        .batch_put(table, items)
        .await
        .wrap_err_with(|| format!("failed to store {} slot(s)", slots.len()))
}

pub async fn get_slot(store: &dyn DocumentStore, table: &str, slot_id: &str) -> Result<Option<Slot>> {
    let document = store
        .get_item(table, slot_id)
        .await
        .wrap_err_with(|| format!("failed to load slot '{}'", slot_id))?;

    document
        .map(|document| decode_slot(&KeyedDocument::new(slot_id, document)))
        .transpose()
}

/// Every slot whose status is not EXPIRED, undecoded.
pub async fn scan_unexpired(store: &dyn DocumentStore, table: &str) -> Result<Vec<KeyedDocument>> {
    let filter = ScanFilter::all().not_equals("status", SlotStatus::Expired.as_str());
    scan_all(store, table, &filter).await
}

/// A tutor's slots ordered by date and start time. Undecodable records are skipped.
pub async fn list_tutor_slots(store: &dyn DocumentStore, table: &str, tutor_id: &str) -> Result<Vec<Slot>> {
    let filter = ScanFilter::all().equals("tutorId", tutor_id);
    let items = scan_all(store, table, &filter).await?;

    let mut slots: Vec<Slot> = items
        .iter()
        .filter_map(|item| match decode_slot(item) {
            Ok(slot) => Some(slot),
            Err(e) => {
                warn!("Skipping malformed slot '{}': {}", item.key, e);
                None
            }
        })
        .collect();
    slots.sort_by(|a, b| (a.date, a.start_time).cmp(&(b.date, b.start_time)));

    Ok(slots)
}

/// Moves a slot from `from` to `to` only while it is still `from`.
///
/// Returns `false` when the slot is missing or has already left `from`.
pub async fn transition_slot_status(
    store: &dyn DocumentStore,
    table: &str,
    slot_id: &str,
    from: SlotStatus,
    to: SlotStatus,
) -> Result<bool> {
    let expected = ScanFilter::all().equals("status", from.as_str());
    let changes = Document::from([("status".to_string(), to.as_str().into())]);
    store
        .update_item_if(table, slot_id, &expected, changes)
        .await
        .wrap_err_with(|| format!("failed to move slot '{}' from {} to {}", slot_id, from, to))
}

/// Returns `false` when the slot no longer exists.
pub async fn set_slot_status(
    store: &dyn DocumentStore,
    table: &str,
    slot_id: &str,
    status: SlotStatus,
) -> Result<bool> {
    let changes = Document::from([("status".to_string(), status.as_str().into())]);
    store
        .update_item(table, slot_id, changes)
        .await
        .wrap_err_with(|| format!("failed to set slot '{}' to {}", slot_id, status))
}
