//! # Availability Handlers
//!
//! A tutor publishes one availability window per date. Publishing validates
//! the window, cuts it into slots according to the configured
//! [`SlotPolicy`](skillsession_core::slotting::SlotPolicy), then writes the
//! window and all of its slots.
//!
//! The window is inserted only if none exists for the tutor and date, so two
//! concurrent requests for the same date cannot both succeed. The window
//! insert and the slot batch put are still two separate writes with no
//! rollback. A failure between them leaves a window with no slots, and the
//! tutor cannot publish that date again.

use std::sync::Arc;

use axum::{Json, extract::State, extract::rejection::JsonRejection, http::StatusCode};
use skillsession_core::{
    errors::{SessionError, SessionResult},
    models::{
        availability::{CreateAvailabilityRequest, CreateAvailabilityResponse},
        slot::Slot,
    },
    slotting::plan_slots,
};
use skillsession_db::repositories::{availability, slot};
use tracing::info;

use crate::{ApiState, middleware::error_handling::AppError};

/// Validates `request`, then stores the window and its slots.
///
/// Returns the number of slots created. Nothing is written when the request
/// is invalid or a window already exists for the tutor and date.
pub async fn generate_availability(
    state: &ApiState,
    request: CreateAvailabilityRequest,
) -> SessionResult<usize> {
    let window = request.validate()?;
    let planned = plan_slots(window.date, window.start_time, window.end_time, &state.slot_policy)?;

    let slots: Vec<Slot> = planned.iter().map(|p| Slot::from_plan(&window, p)).collect();

    let store = state.store.as_ref();
    if !availability::create_window(store, &state.tables.availability, &window).await? {
        return Err(SessionError::Conflict(
            "Availability already exists for this date".to_string(),
        ));
    }
    slot::create_slots(store, &state.tables.slots, &slots).await?;

    info!(
        "Created availability {} with {} slot(s)",
        window.key(),
        slots.len()
    );
    Ok(slots.len())
}

#[axum::debug_handler]
pub async fn create_availability(
    State(state): State<Arc<ApiState>>,
    payload: Result<Json<CreateAvailabilityRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CreateAvailabilityResponse>), AppError> {
    let Json(payload) = payload?;
    let slots_created = generate_availability(&state, payload).await?;

    let response = CreateAvailabilityResponse {
        success: true,
        message: "Availability and time slots created successfully".to_string(),
        slots_created,
    };

    Ok((StatusCode::CREATED, Json(response)))
}
