//! # Error Handling Middleware
//!
//! Maps domain errors to HTTP status codes and `{"error": "..."}` bodies so
//! every handler fails the same way:
//!
//! | Error | Status |
//! |---|---|
//! | `Validation` | 400 |
//! | `NotFound` | 404 |
//! | `Conflict` | 409 |
//! | `Storage`, `Internal` | 500 |

use axum::{
    Json,
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use skillsession_core::errors::SessionError;
use tracing::error;

/// Application error wrapper that provides HTTP status code mapping
///
/// # Example
///
/// ```
/// use axum::Json;
/// use skillsession_api::middleware::error_handling::AppError;
/// use skillsession_core::errors::SessionError;
///
/// async fn handler(tutor_id: Option<String>) -> Result<Json<String>, AppError> {
///     let tutor_id = tutor_id
///         .ok_or_else(|| SessionError::validation("Tutor ID is required"))?;
///     Ok(Json(tutor_id))
/// }
/// # fn main() {}
/// ```
#[derive(Debug)]
pub struct AppError(pub SessionError);

impl AppError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            SessionError::NotFound(_) => StatusCode::NOT_FOUND,
            SessionError::Validation(_) => StatusCode::BAD_REQUEST,
            SessionError::Conflict(_) => StatusCode::CONFLICT,
            SessionError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            SessionError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            match &self.0 {
                SessionError::Storage(report) => error!("Request failed: {:?}", report),
                other => error!("Request failed: {}", other),
            }
        }

        let body = Json(json!({ "error": self.0.to_string() }));
        (status, body).into_response()
    }
}

impl From<SessionError> for AppError {
    fn from(err: SessionError) -> Self {
        AppError(err)
    }
}

/// Bare `eyre` errors come from the storage layer.
impl From<eyre::Report> for AppError {
    fn from(err: eyre::Report) -> Self {
        AppError(SessionError::Storage(err))
    }
}

/// Unparseable JSON bodies are client errors.
impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError(SessionError::Validation(format!(
            "Invalid request body: {}",
            rejection.body_text()
        )))
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError(SessionError::Validation(format!(
            "Invalid query string: {}",
            rejection.body_text()
        )))
    }
}
