//! Error types for TouchCare Core

use thiserror::Error;

use crate::schema::ValidationError;

/// Errors that can occur while ingesting records or managing app state
#[derive(Debug, Error)]
pub enum CareError {
    #[error("Failed to parse records: {0}")]
    ParseError(String),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Invalid record: {0}")]
    InvalidRecord(#[from] ValidationError),

    #[error("Invalid period kind: {0} (expected week or month)")]
    InvalidPeriod(String),

    #[error("Timestamp out of range: {0}")]
    InvalidTimestamp(i64),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Device error: {0}")]
    DeviceError(String),

    #[error("Authentication failed: {0}")]
    AuthError(String),
}
