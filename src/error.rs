use thiserror::Error;

#[derive(Error, Debug)]
pub enum BidstoreError {
    #[error("Not a bidstore data directory. Run 'bidstore init' first.")]
    NotInitialized,

    #[error("Already initialized. Remove .bidstore/ to reinitialize.")]
    AlreadyInitialized,

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Invalid status transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },

    #[error("Entity is {status} and can no longer be modified")]
    NotEditable { status: String },

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, BidstoreError>;
