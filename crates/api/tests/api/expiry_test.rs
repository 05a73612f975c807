use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use chrono::NaiveDateTime;
use eyre::eyre;
use pretty_assertions::assert_eq;
use skillsession_api::jobs::expiry::sweep_expired_slots;
use skillsession_core::{
    errors::SessionError,
    models::slot::{SlotStatus, SweepSummary},
};
use skillsession_db::{
    AttributeValue, DocumentStore, KeyedDocument, MemoryDocumentStore, ScanPage,
    mock::MockDocumentStore,
    repositories::slot::{create_slots, get_slot, slot_document},
};

use crate::test_utils::slot_on;

fn at(value: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M").unwrap()
}

#[test_log::test(tokio::test)]
async fn test_slot_expires_one_minute_after_end() {
    let store = MemoryDocumentStore::default();
    let slot = slot_on("2024-01-01", "09:00", "10:00", "t1", 1, SlotStatus::Open);
    create_slots(&store, "slots", &[slot.clone()]).await.unwrap();

    let early = sweep_expired_slots(&store, "slots", at("2024-01-01 10:00")).await.unwrap();
    assert_eq!(early, SweepSummary { processed: 1, expired: 0, failed: 0 });

    let late = sweep_expired_slots(&store, "slots", at("2024-01-01 10:01")).await.unwrap();
    assert_eq!(late, SweepSummary { processed: 1, expired: 1, failed: 0 });
    let stored = get_slot(&store, "slots", &slot.id).await.unwrap().unwrap();
    assert_eq!(stored.status, SlotStatus::Expired);

    let again = sweep_expired_slots(&store, "slots", at("2024-01-01 10:02")).await.unwrap();
    assert_eq!(again, SweepSummary { processed: 0, expired: 0, failed: 0 });
}

#[test_log::test(tokio::test)]
async fn test_sweep_drains_every_page() {
    let store = MemoryDocumentStore::with_page_size(3);
    let slots: Vec<_> = (1..=10)
        .map(|seq| slot_on("2024-01-01", "09:00", "10:00", &format!("t{:02}", seq), 1, SlotStatus::Open))
        .collect();
    create_slots(&store, "slots", &slots).await.unwrap();
    // Expired records sit in the same pages and must not stop pagination.
    store
        .update_item(
            "slots",
            &slots[0].id,
            [("status".to_string(), AttributeValue::from("EXPIRED"))].into(),
        )
        .await
        .unwrap();

    let summary = sweep_expired_slots(&store, "slots", at("2024-01-02 00:00")).await.unwrap();

    assert_eq!(summary, SweepSummary { processed: 9, expired: 9, failed: 0 });
}

#[test_log::test(tokio::test)]
async fn test_malformed_records_are_counted_and_skipped() {
    let store = MemoryDocumentStore::default();
    let good = slot_on("2024-01-01", "09:00", "10:00", "t1", 1, SlotStatus::Open);
    create_slots(&store, "slots", &[good]).await.unwrap();
    store
        .put_item(
            "slots",
            KeyedDocument::new(
                "broken",
                [
                    ("status".to_string(), AttributeValue::from("OPEN")),
                    ("date".to_string(), AttributeValue::from("not-a-date")),
                ]
                .into(),
            ),
        )
        .await
        .unwrap();

    let summary = sweep_expired_slots(&store, "slots", at("2024-01-01 12:00")).await.unwrap();

    assert_eq!(summary, SweepSummary { processed: 2, expired: 1, failed: 0 });
    let broken = store.get_item("slots", "broken").await.unwrap().unwrap();
    assert_eq!(broken.get("status"), Some(&AttributeValue::from("OPEN")));
}

#[test_log::test(tokio::test)]
async fn test_failed_updates_are_counted_not_fatal() {
    let slots = [
        slot_on("2024-01-01", "09:00", "10:00", "a", 1, SlotStatus::Open),
        slot_on("2024-01-01", "09:00", "10:00", "b", 1, SlotStatus::Booked),
        slot_on("2024-01-01", "09:00", "10:00", "c", 1, SlotStatus::Open),
        slot_on("2099-01-01", "09:00", "10:00", "d", 1, SlotStatus::Open),
    ];
    let first_page = vec![slot_document(&slots[0]), slot_document(&slots[1])];
    let second_page = vec![slot_document(&slots[2]), slot_document(&slots[3])];
    let cursor = first_page[1].key.clone();
    let failing = slots[0].id.clone();
    let vanished = slots[2].id.clone();

    let mut store = MockDocumentStore::new();
    store.expect_scan().times(2).returning(move |_, _, start| {
        if start.is_none() {
            Ok(ScanPage {
                items: first_page.clone(),
                last_evaluated_key: Some(cursor.clone()),
            })
        } else {
            Ok(ScanPage {
                items: second_page.clone(),
                last_evaluated_key: None,
            })
        }
    });

    let attempts = Arc::new(AtomicUsize::new(0));
    let counter = attempts.clone();
    store.expect_update_item().returning(move |_, key, changes| {
        counter.fetch_add(1, Ordering::SeqCst);
        assert_eq!(changes.get("status"), Some(&AttributeValue::from("EXPIRED")));
        if key == failing {
            Err(eyre!("provisioned throughput exceeded"))
        } else {
            Ok(key != vanished)
        }
    });

    let summary = sweep_expired_slots(&store, "slots", at("2024-01-02 00:00")).await.unwrap();

    assert_eq!(summary, SweepSummary { processed: 4, expired: 1, failed: 2 });
    assert_eq!(attempts.load(Ordering::SeqCst), 3);
}

#[test_log::test(tokio::test)]
async fn test_scan_failure_aborts_sweep() {
    let mut store = MockDocumentStore::new();
    store
        .expect_scan()
        .returning(|_, _, _| Err(eyre!("connection reset")));
    store.expect_update_item().never();

    let result = sweep_expired_slots(&store, "slots", at("2024-01-02 00:00")).await;

    assert!(matches!(result, Err(SessionError::Storage(_))));
}
