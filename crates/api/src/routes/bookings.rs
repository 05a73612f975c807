use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;

use crate::{ApiState, handlers};

pub fn routes() -> Router<Arc<ApiState>> {
    Router::new()
        .route("/api/bookings", post(handlers::bookings::create_booking))
        .route(
            "/api/bookings/pending",
            get(handlers::bookings::pending_booking_slots),
        )
        .route(
            "/api/bookings/:booking_id/response",
            post(handlers::bookings::respond_to_booking),
        )
        .route(
            "/api/tutors/:tutor_id/bookings",
            get(handlers::bookings::list_tutor_bookings),
        )
}
