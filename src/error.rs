//! Error types for Session Insights
//!
//! Only the boundary layers (JSON parsing, configuration, CLI and FFI) return
//! these errors. The aggregation functions themselves are infallible.

use thiserror::Error;

/// Errors that can occur at the crate boundary
#[derive(Debug, Error)]
pub enum InsightsError {
    #[error("Failed to parse session payload: {0}")]
    ParseError(String),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Invalid timezone: {0}")]
    InvalidTimezone(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),
}
