// src/error.rs
use thiserror::Error;

pub const INVALID_CREATE_BODY: &str = "CreateTickerRequestBody is invalid";
pub const INVALID_REQUEST: &str = "Request is invalid";

/// A payload failed the precondition checks of its operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ValidationError {
    pub message: String,
}

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn create_body() -> Self {
        Self::new(INVALID_CREATE_BODY)
    }

    pub fn request() -> Self {
        Self::new(INVALID_REQUEST)
    }
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to connect to store: {0}")]
    Connection(String),

    #[error("store query failed: {0}")]
    Query(String),

    #[error("failed to decode stored item: {0}")]
    Decode(String),

    #[error("invalid page cursor: {0}")]
    InvalidCursor(String),
}

/// Failure raised while an operation handler runs.
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("storage failed: {0}")]
    Storage(#[from] StorageError),
}
