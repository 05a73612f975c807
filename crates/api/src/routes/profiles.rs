use axum::{
    Router,
    routing::{get, post, put},
};
use std::sync::Arc;

use crate::{ApiState, handlers};

pub fn routes() -> Router<Arc<ApiState>> {
    Router::new()
        .route("/api/profiles", post(handlers::profiles::register_user))
        .route("/api/profiles/:email", get(handlers::profiles::get_profile))
        .route(
            "/api/profiles/:email/learner",
            put(handlers::profiles::update_learner_profile),
        )
        .route(
            "/api/profiles/:email/teacher",
            put(handlers::profiles::update_teacher_profile),
        )
        .route("/api/teachers", get(handlers::profiles::search_teachers))
}
