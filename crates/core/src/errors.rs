use thiserror::Error;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Storage error: {0}")]
    Storage(#[from] eyre::Report),

    #[error("Internal server error: {0}")]
    Internal(#[from] Box<dyn std::error::Error + Send + Sync>),
}

impl SessionError {
    pub fn validation(message: impl Into<String>) -> Self {
        SessionError::Validation(message.into())
    }
}

pub type SessionResult<T> = Result<T, SessionError>;
