use axum::http::StatusCode;
use pretty_assertions::assert_eq;
use rstest::rstest;
use serde_json::{Value, json};
use skillsession_api::handlers::availability::generate_availability;
use skillsession_core::{
    errors::SessionError,
    models::{availability::CreateAvailabilityRequest, slot::SlotStatus},
    slotting::{SlotPolicy, TrailingRemainder},
};
use skillsession_db::DocumentStore;

use crate::test_utils::TestContext;

#[tokio::test]
async fn test_create_availability_generates_hourly_slots() {
    let ctx = TestContext::new();

    let response = ctx
        .server
        .post("/api/availability")
        .json(&json!({
            "tutorId": "tutor@example.com",
            "date": "2024-01-01",
            "startTime": "09:00",
            "endTime": "11:00"
        }))
        .await;

    response.assert_status(StatusCode::CREATED);
    let body: Value = response.json();
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["slotsCreated"], json!(2));

    assert_eq!(ctx.store.count("availability").await, 1);
    let slots = ctx.store.documents("slots").await;
    let keys: Vec<_> = slots.iter().map(|s| s.key.as_str()).collect();
    assert_eq!(
        keys,
        vec!["S12024-01-01tutor@example.com", "S22024-01-01tutor@example.com"]
    );

    assert_eq!(ctx.slot_status("S12024-01-01tutor@example.com").await, Some(SlotStatus::Open));
    let first = ctx
        .store
        .get_item("slots", "S12024-01-01tutor@example.com")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(serde_json::to_value(&first).unwrap()["endTime"], json!("10:00"));
}

#[tokio::test]
async fn test_duplicate_availability_is_a_conflict_without_writes() {
    let ctx = TestContext::new();
    let body = json!({"id": "t1", "date": "2024-01-01", "startTime": "09:00", "endTime": "12:00"});

    ctx.server
        .post("/api/availability")
        .json(&body)
        .await
        .assert_status(StatusCode::CREATED);

    let retry = json!({"tutorId": "t1", "date": "2024-01-01", "startTime": "13:00", "endTime": "15:00"});
    let response = ctx.server.post("/api/availability").json(&retry).await;

    response.assert_status(StatusCode::CONFLICT);
    let error: Value = response.json();
    assert!(error["error"].as_str().unwrap().contains("Availability already exists for this date"));
    assert_eq!(ctx.store.count("availability").await, 1);
    assert_eq!(ctx.store.count("slots").await, 3);
}

#[tokio::test]
async fn test_concurrent_publishing_creates_one_window() {
    let ctx = TestContext::new();
    let request = |start: &str, end: &str| -> CreateAvailabilityRequest {
        serde_json::from_value(json!({"tutorId": "t1", "date": "2024-01-01", "startTime": start, "endTime": end}))
            .unwrap()
    };

    let (morning, afternoon) = tokio::join!(
        generate_availability(&ctx.state, request("09:00", "11:00")),
        generate_availability(&ctx.state, request("13:00", "16:00")),
    );

    let outcomes = [morning, afternoon];
    assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(outcomes.iter().any(|r| matches!(r, Err(SessionError::Conflict(_)))));
    assert_eq!(ctx.store.count("availability").await, 1);
    let created = outcomes.iter().find_map(|r| r.as_ref().ok().copied()).unwrap();
    assert_eq!(ctx.store.count("slots").await, created);
}

#[rstest]
#[case(json!({"tutorId": "t1", "date": "2024-01-01", "startTime": "09:00", "endTime": "09:30"}), "Time range must be at least 60 minutes")]
#[case(json!({"tutorId": "t1", "date": "2024-01-01", "startTime": "11:00", "endTime": "09:00"}), "End time must be after start time")]
#[case(json!({"date": "2024-01-01", "startTime": "09:00", "endTime": "11:00"}), "Tutor ID is required")]
#[case(json!({"tutorId": "t1", "date": "2024-13-01", "startTime": "09:00", "endTime": "11:00"}), "Invalid date format")]
#[case(json!({"tutorId": "t1", "date": "2024-01-01", "startTime": "9am", "endTime": "11:00"}), "Invalid start time format")]
#[tokio::test]
async fn test_invalid_availability_is_rejected_without_writes(#[case] body: Value, #[case] message: &str) {
    let ctx = TestContext::new();

    let response = ctx.server.post("/api/availability").json(&body).await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let error: Value = response.json();
    assert!(
        error["error"].as_str().unwrap().contains(message),
        "unexpected error body: {}",
        error
    );
    assert_eq!(ctx.store.count("availability").await, 0);
    assert_eq!(ctx.store.count("slots").await, 0);
}

#[tokio::test]
async fn test_malformed_json_is_a_bad_request() {
    let ctx = TestContext::new();

    let response = ctx
        .server
        .post("/api/availability")
        .content_type("application/json")
        .bytes("{not json".into())
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let error: Value = response.json();
    assert!(error["error"].as_str().unwrap().contains("Invalid request body"));
}

#[tokio::test]
async fn test_reject_policy_refuses_partial_trailing_slot() {
    let ctx = TestContext::with_policy(SlotPolicy {
        slot_minutes: 60,
        trailing: TrailingRemainder::Reject,
    });

    let response = ctx
        .server
        .post("/api/availability")
        .json(&json!({"tutorId": "t1", "date": "2024-01-01", "startTime": "09:00", "endTime": "11:30"}))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(ctx.store.count("availability").await, 0);
}

#[tokio::test]
async fn test_drop_policy_keeps_whole_slots() {
    let ctx = TestContext::new();

    let response = ctx
        .server
        .post("/api/availability")
        .json(&json!({"tutorId": "t1", "date": "2024-01-01", "startTime": "09:00", "endTime": "11:30"}))
        .await;

    response.assert_status(StatusCode::CREATED);
    assert_eq!(response.json::<Value>()["slotsCreated"], json!(2));
}
