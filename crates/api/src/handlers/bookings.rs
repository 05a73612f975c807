//! # Booking Handlers
//!
//! A learner requests an OPEN slot, creating a PENDING booking. The tutor
//! then confirms or rejects it. Confirming books the slot (`OPEN -> BOOKED`)
//! before the booking itself is marked, so a slot that expired in the
//! meantime fails the confirmation and leaves the booking PENDING. The slot
//! write is conditional on the status read just before it; a sweep landing
//! in between turns the confirmation into a conflict.

use std::sync::Arc;

use axum::{
    Json,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
};
use chrono::Utc;
use skillsession_core::{
    errors::SessionError,
    models::{
        booking::{
            Booking, BookingAction, BookingDecisionRequest, BookingDecisionResponse, BookingStatus,
            CreateBookingRequest, CreateBookingResponse, PendingBookingsQuery, TutorBookingsResponse,
        },
        slot::SlotStatus,
    },
};
use skillsession_db::repositories::{booking, slot};
use tracing::info;

use crate::{ApiState, middleware::error_handling::AppError};

#[axum::debug_handler]
pub async fn create_booking(
    State(state): State<Arc<ApiState>>,
    payload: Result<Json<CreateBookingRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CreateBookingResponse>), AppError> {
    let Json(payload) = payload?;
    let request = payload.validate()?;
    let store = state.store.as_ref();

    let requested_slot = slot::get_slot(store, &state.tables.slots, &request.slot_id)
        .await
        .map_err(SessionError::Storage)?
        .ok_or_else(|| SessionError::NotFound(format!("Slot {} not found", request.slot_id)))?;

    if requested_slot.tutor_id != request.tutor_id {
        return Err(SessionError::Validation(format!(
            "Slot {} does not belong to tutor {}",
            request.slot_id, request.tutor_id
        ))
        .into());
    }
    if requested_slot.status != SlotStatus::Open {
        return Err(SessionError::Conflict(format!(
            "Slot {} is {} and cannot be requested",
            requested_slot.id, requested_slot.status
        ))
        .into());
    }

    let new_booking = Booking {
        booking_id: Booking::new_id(),
        tutor_id: request.tutor_id,
        learner_id: request.learner_id,
        slot_id: request.slot_id,
        slot_date: request.slot_date,
        status: BookingStatus::Pending,
        requested_at: Utc::now(),
    };
    booking::create_booking(store, &state.tables.bookings, &new_booking)
        .await
        .map_err(SessionError::Storage)?;

    info!(
        "Booking {} requested by {} for slot {}",
        new_booking.booking_id, new_booking.learner_id, new_booking.slot_id
    );

    let response = CreateBookingResponse {
        success: true,
        message: "Booking request has been sent to the teacher for approval".to_string(),
        booking_id: new_booking.booking_id,
    };

    Ok((StatusCode::CREATED, Json(response)))
}

#[axum::debug_handler]
pub async fn respond_to_booking(
    State(state): State<Arc<ApiState>>,
    Path(booking_id): Path<String>,
    payload: Result<Json<BookingDecisionRequest>, JsonRejection>,
) -> Result<Json<BookingDecisionResponse>, AppError> {
    let Json(payload) = payload?;
    let action = payload.action()?;
    let store = state.store.as_ref();

    let existing = booking::get_booking(store, &state.tables.bookings, &booking_id)
        .await
        .map_err(SessionError::Storage)?
        .ok_or_else(|| SessionError::NotFound(format!("Booking {} not found", booking_id)))?;

    payload.check_matches(&existing)?;

    if existing.status != BookingStatus::Pending {
        return Err(SessionError::Conflict(format!(
            "Booking {} has already been answered with {}",
            booking_id, existing.status
        ))
        .into());
    }

    if action == BookingAction::Confirm {
        let booked_slot = slot::get_slot(store, &state.tables.slots, &existing.slot_id)
            .await
            .map_err(SessionError::Storage)?
            .ok_or_else(|| SessionError::NotFound(format!("Slot {} not found", existing.slot_id)))?;

        if !booked_slot.status.can_transition_to(SlotStatus::Booked) {
            return Err(SessionError::Conflict(format!(
                "Slot {} is {} and cannot be booked",
                booked_slot.id, booked_slot.status
            ))
            .into());
        }

        let booked = slot::transition_slot_status(
            store,
            &state.tables.slots,
            &booked_slot.id,
            booked_slot.status,
            SlotStatus::Booked,
        )
        .await
        .map_err(SessionError::Storage)?;
        if !booked {
            return Err(SessionError::Conflict(format!(
                "Slot {} changed while the booking was being confirmed",
                booked_slot.id
            ))
            .into());
        }
    }

    let status = action.resulting_status();
    let updated = booking::set_booking_status(store, &state.tables.bookings, &booking_id, status)
        .await
        .map_err(SessionError::Storage)?;
    if !updated {
        return Err(SessionError::NotFound(format!("Booking {} not found", booking_id)).into());
    }

    // Notification delivery is handled outside this service.
    info!(
        "Booking {} {} by tutor {}; learner {} to be notified",
        booking_id,
        action.past_tense(),
        existing.tutor_id,
        existing.learner_id
    );

    Ok(Json(BookingDecisionResponse {
        success: true,
        message: format!("Booking {} successfully", action.past_tense()),
        status,
    }))
}

#[axum::debug_handler]
pub async fn list_tutor_bookings(
    State(state): State<Arc<ApiState>>,
    Path(tutor_id): Path<String>,
) -> Result<Json<TutorBookingsResponse>, AppError> {
    let tutor_id = tutor_id.trim();
    if tutor_id.is_empty() {
        return Err(SessionError::validation("Tutor ID is required").into());
    }

    let bookings = booking::list_tutor_bookings(state.store.as_ref(), &state.tables.bookings, tutor_id)
        .await
        .map_err(SessionError::Storage)?;

    Ok(Json(TutorBookingsResponse { bookings }))
}

/// Slot ids the learner is still waiting on with this tutor.
#[axum::debug_handler]
pub async fn pending_booking_slots(
    State(state): State<Arc<ApiState>>,
    query: Result<Query<PendingBookingsQuery>, QueryRejection>,
) -> Result<Json<Vec<String>>, AppError> {
    let Query(query) = query?;
    let (tutor_id, learner_id) = query.validate()?;

    let slot_ids = booking::pending_slot_ids(
        state.store.as_ref(),
        &state.tables.bookings,
        &tutor_id,
        &learner_id,
    )
    .await
    .map_err(SessionError::Storage)?;

    Ok(Json(slot_ids))
}
