use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
};
use skillsession_core::{
    errors::SessionError,
    models::slot::{ExpireSlotsResponse, Slot},
};
use skillsession_db::repositories::slot;

use crate::{ApiState, jobs::expiry, middleware::error_handling::AppError};

#[axum::debug_handler]
pub async fn list_tutor_slots(
    State(state): State<Arc<ApiState>>,
    Path(tutor_id): Path<String>,
) -> Result<Json<Vec<Slot>>, AppError> {
    let tutor_id = tutor_id.trim();
    if tutor_id.is_empty() {
        return Err(SessionError::validation("Tutor ID is required").into());
    }

    let slots = slot::list_tutor_slots(state.store.as_ref(), &state.tables.slots, tutor_id)
        .await
        .map_err(SessionError::Storage)?;

    if slots.is_empty() {
        return Err(SessionError::NotFound("No slots found for this teacher".to_string()).into());
    }

    Ok(Json(slots))
}

/// Runs one expiry sweep on demand.
#[axum::debug_handler]
pub async fn expire_slots(
    State(state): State<Arc<ApiState>>,
) -> Result<Json<ExpireSlotsResponse>, AppError> {
    let results = expiry::run_expiry_sweep(&state).await?;

    Ok(Json(ExpireSlotsResponse {
        message: "Expired slots processed successfully".to_string(),
        results,
    }))
}
