use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;

use crate::{ApiState, handlers};

pub fn routes() -> Router<Arc<ApiState>> {
    Router::new()
        .route("/api/tutors/:tutor_id/slots", get(handlers::slots::list_tutor_slots))
        .route("/api/slots/expire", post(handlers::slots::expire_slots))
}
