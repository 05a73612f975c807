use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use async_trait::async_trait;
use axum::http::StatusCode;
use axum_test::TestServer;
use fake::{Fake, faker::internet::en::SafeEmail};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use skillsession_api::{ApiState, build_router};
use skillsession_core::models::slot::SlotStatus;
use skillsession_db::{
    Document, DocumentStore, KeyedDocument, MemoryDocumentStore, ScanFilter, ScanPage,
    repositories::slot,
};

use crate::test_utils::{TestContext, slot_on};

/// Expires a slot right after it is read, once armed, as a sweep running
/// between a handler's read and write would.
struct ExpiringAfterReadStore {
    inner: MemoryDocumentStore,
    armed: AtomicBool,
}

#[async_trait]
impl DocumentStore for ExpiringAfterReadStore {
    async fn get_item(&self, table: &str, key: &str) -> eyre::Result<Option<Document>> {
        let item = self.inner.get_item(table, key).await?;
        if table == "slots" && self.armed.swap(false, Ordering::SeqCst) {
            slot::set_slot_status(&self.inner, table, key, SlotStatus::Expired).await?;
        }
        Ok(item)
    }

    async fn put_item(&self, table: &str, item: KeyedDocument) -> eyre::Result<()> {
        self.inner.put_item(table, item).await
    }

    async fn batch_put(&self, table: &str, items: Vec<KeyedDocument>) -> eyre::Result<()> {
        self.inner.batch_put(table, items).await
    }

    async fn update_item(&self, table: &str, key: &str, changes: Document) -> eyre::Result<bool> {
        self.inner.update_item(table, key, changes).await
    }

    async fn update_item_if(
        &self,
        table: &str,
        key: &str,
        expected: &ScanFilter,
        changes: Document,
    ) -> eyre::Result<bool> {
        self.inner.update_item_if(table, key, expected, changes).await
    }

    async fn put_item_if_absent(&self, table: &str, item: KeyedDocument) -> eyre::Result<bool> {
        self.inner.put_item_if_absent(table, item).await
    }

    async fn scan(
        &self,
        table: &str,
        filter: &ScanFilter,
        exclusive_start_key: Option<String>,
    ) -> eyre::Result<ScanPage> {
        self.inner.scan(table, filter, exclusive_start_key).await
    }
}

async fn request_booking(ctx: &TestContext, slot_id: &str, learner: &str) -> String {
    let response = ctx
        .server
        .post("/api/bookings")
        .json(&json!({
            "tutorid": "t1",
            "studentid": learner,
            "slotid": slot_id,
            "slotDate": "2999-01-01"
        }))
        .await;

    response.assert_status(StatusCode::CREATED);
    let body: Value = response.json();
    assert_eq!(body["success"], json!(true));
    body["bookingId"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_confirming_a_booking_books_the_slot() {
    let ctx = TestContext::new();
    ctx.seed_slot(&slot_on("2999-01-01", "09:00", "10:00", "t1", 1, SlotStatus::Open)).await;
    let learner: String = SafeEmail().fake();

    let booking_id = request_booking(&ctx, "S12999-01-01t1", &learner).await;
    assert!(booking_id.starts_with('b'));

    let pending = ctx
        .server
        .get("/api/bookings/pending")
        .add_query_param("tutorId", "t1")
        .add_query_param("learnerId", &learner)
        .await;
    pending.assert_status_ok();
    assert_eq!(pending.json::<Value>(), json!(["S12999-01-01t1"]));

    let response = ctx
        .server
        .post(&format!("/api/bookings/{}/response", booking_id))
        .json(&json!({"tutorId": "t1", "action": "CONFIRM"}))
        .await;

    response.assert_status_ok();
    assert_eq!(
        response.json::<Value>(),
        json!({"success": true, "message": "Booking confirmed successfully", "status": "CONFIRM"})
    );
    assert_eq!(ctx.slot_status("S12999-01-01t1").await, Some(SlotStatus::Booked));

    let bookings: Value = ctx.server.get("/api/tutors/t1/bookings").await.json();
    assert_eq!(bookings["bookings"][0]["status"], json!("CONFIRM"));
    assert_eq!(bookings["bookings"][0]["learnerId"], json!(learner));
}

#[tokio::test]
async fn test_rejecting_leaves_slot_open() {
    let ctx = TestContext::new();
    ctx.seed_slot(&slot_on("2999-01-01", "09:00", "10:00", "t1", 1, SlotStatus::Open)).await;

    let booking_id = request_booking(&ctx, "S12999-01-01t1", "l1").await;
    let response = ctx
        .server
        .post(&format!("/api/bookings/{}/response", booking_id))
        .json(&json!({"action": "reject"}))
        .await;

    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["status"], json!("REJECT"));
    assert_eq!(ctx.slot_status("S12999-01-01t1").await, Some(SlotStatus::Open));

    let second = ctx
        .server
        .post(&format!("/api/bookings/{}/response", booking_id))
        .json(&json!({"action": "CONFIRM"}))
        .await;
    second.assert_status(StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_confirming_for_expired_slot_is_a_conflict() {
    let ctx = TestContext::new();
    ctx.seed_slot(&slot_on("2999-01-01", "09:00", "10:00", "t1", 1, SlotStatus::Open)).await;
    let booking_id = request_booking(&ctx, "S12999-01-01t1", "l1").await;

    // The slot expires while the request is pending.
    ctx.seed_slot(&slot_on("2999-01-01", "09:00", "10:00", "t1", 1, SlotStatus::Expired)).await;

    let response = ctx
        .server
        .post(&format!("/api/bookings/{}/response", booking_id))
        .json(&json!({"action": "CONFIRM"}))
        .await;

    response.assert_status(StatusCode::CONFLICT);
    assert_eq!(ctx.slot_status("S12999-01-01t1").await, Some(SlotStatus::Expired));

    let pending: Value = ctx
        .server
        .get("/api/bookings/pending")
        .add_query_param("tutorId", "t1")
        .add_query_param("learnerId", "l1")
        .await
        .json();
    assert_eq!(pending, json!(["S12999-01-01t1"]));
}

#[tokio::test]
async fn test_slot_expiring_during_confirmation_stays_expired() {
    let store = Arc::new(ExpiringAfterReadStore {
        inner: MemoryDocumentStore::default(),
        armed: AtomicBool::new(false),
    });
    let open = slot_on("2999-01-01", "09:00", "10:00", "t1", 1, SlotStatus::Open);
    slot::create_slots(&store.inner, "slots", &[open.clone()]).await.unwrap();
    let server = TestServer::new(build_router(Arc::new(ApiState::new(store.clone())))).unwrap();

    let created = server
        .post("/api/bookings")
        .json(&json!({"tutorId": "t1", "learnerId": "l1", "slotId": open.id, "slotDate": "2999-01-01"}))
        .await;
    created.assert_status(StatusCode::CREATED);
    let booking_id = created.json::<Value>()["bookingId"].as_str().unwrap().to_string();

    store.armed.store(true, Ordering::SeqCst);
    let response = server
        .post(&format!("/api/bookings/{}/response", booking_id))
        .json(&json!({"action": "CONFIRM"}))
        .await;

    response.assert_status(StatusCode::CONFLICT);
    let stored = slot::get_slot(&store.inner, "slots", &open.id).await.unwrap().unwrap();
    assert_eq!(stored.status, SlotStatus::Expired);

    let pending: Value = server
        .get("/api/bookings/pending")
        .add_query_param("tutorId", "t1")
        .add_query_param("learnerId", "l1")
        .await
        .json();
    assert_eq!(pending, json!([open.id]));
}

#[tokio::test]
async fn test_booking_requires_open_slot() {
    let ctx = TestContext::new();
    ctx.seed_slot(&slot_on("2999-01-01", "09:00", "10:00", "t1", 1, SlotStatus::Booked)).await;

    let booked = ctx
        .server
        .post("/api/bookings")
        .json(&json!({"tutorId": "t1", "learnerId": "l1", "slotId": "S12999-01-01t1", "slotDate": "2999-01-01"}))
        .await;
    booked.assert_status(StatusCode::CONFLICT);

    let missing = ctx
        .server
        .post("/api/bookings")
        .json(&json!({"tutorId": "t1", "learnerId": "l1", "slotId": "nope", "slotDate": "2999-01-01"}))
        .await;
    missing.assert_status(StatusCode::NOT_FOUND);

    let invalid = ctx
        .server
        .post("/api/bookings")
        .json(&json!({"tutorId": "t1", "slotId": "S12999-01-01t1", "slotDate": "2999-01-01"}))
        .await;
    invalid.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(ctx.store.count("bookings").await, 0);
}

#[tokio::test]
async fn test_decision_validation() {
    let ctx = TestContext::new();
    ctx.seed_slot(&slot_on("2999-01-01", "09:00", "10:00", "t1", 1, SlotStatus::Open)).await;
    let booking_id = request_booking(&ctx, "S12999-01-01t1", "l1").await;

    let unknown = ctx
        .server
        .post("/api/bookings/bmissing/response")
        .json(&json!({"action": "CONFIRM"}))
        .await;
    unknown.assert_status(StatusCode::NOT_FOUND);

    let bad_action = ctx
        .server
        .post(&format!("/api/bookings/{}/response", booking_id))
        .json(&json!({"action": "MAYBE"}))
        .await;
    bad_action.assert_status(StatusCode::BAD_REQUEST);

    let wrong_tutor = ctx
        .server
        .post(&format!("/api/bookings/{}/response", booking_id))
        .json(&json!({"tutorId": "t2", "action": "CONFIRM"}))
        .await;
    wrong_tutor.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(ctx.slot_status("S12999-01-01t1").await, Some(SlotStatus::Open));
}

#[tokio::test]
async fn test_pending_lookup_requires_both_ids() {
    let ctx = TestContext::new();

    let response = ctx
        .server
        .get("/api/bookings/pending")
        .add_query_param("tutorId", "t1")
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
}
