//! Error types for storage, configuration and sessions

use thiserror::Error;

/// Errors reported by a card store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Storage backend failed: {0}")]
    Backend(String),

    #[error("Invalid card record: {0}")]
    Record(#[from] RecordError),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors raised while validating a stored card record
#[derive(Debug, Error)]
pub enum RecordError {
    #[error("Card record is missing an id")]
    MissingId,

    #[error("Card {card_id} has an invalid {field} timestamp: {value}")]
    Timestamp {
        card_id: String,
        field: &'static str,
        value: String,
    },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid session config: {0}")]
    Invalid(String),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Failed to persist card: {0}")]
    Persist(#[source] StoreError),

    #[error("Failed to load cards: {0}")]
    Load(#[source] StoreError),

    #[error("Failed to lock session")]
    Lock,
}

impl From<SessionError> for String {
    fn from(err: SessionError) -> Self {
        err.to_string()
    }
}
