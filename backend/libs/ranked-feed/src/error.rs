//! Error types for the ranked-feed repository core
//!
//! Every failure in this crate is returned to the immediate caller as a
//! typed result. Nothing is logged, retried, or suppressed here; that
//! policy belongs to the calling service.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for ranked-feed operations
pub type Result<T> = std::result::Result<T, FeedQueryError>;

/// Error type for ranked pagination and query governance
#[derive(Error, Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "error_type", content = "details")]
pub enum FeedQueryError {
    /// Cursor token is structurally malformed
    #[error("Invalid cursor: {0}")]
    InvalidCursor(String),

    /// Cursor was minted under a different sort strategy
    #[error("Cursor strategy mismatch: cursor was issued for '{cursor}', request is for '{requested}'")]
    CursorStrategyMismatch { cursor: String, requested: String },

    /// Query joins more relations than the configured maximum
    #[error("Too many joins: {joins} exceeds maximum of {max}")]
    TooManyJoins { joins: u32, max: u32 },

    /// Declared offset exceeds the configured maximum
    #[error("Offset too large: {offset} exceeds maximum of {max}")]
    OffsetTooLarge { offset: i64, max: i64 },

    /// Declared limit exceeds the configured maximum
    #[error("Limit too large: {limit} exceeds maximum of {max}")]
    LimitTooLarge { limit: i64, max: i64 },

    /// Aggregate complexity score exceeds the governance ceiling
    #[error("Query too complex: score {score:.1} exceeds ceiling of {ceiling:.1}")]
    TooComplex { score: f64, ceiling: f64 },

    /// Backing store failed while executing the range scan
    #[error("Store error: {0}")]
    Store(String),
}

impl FeedQueryError {
    /// HTTP status hint for the calling handler layer.
    ///
    /// Cursor and governance failures are client-input errors; only a
    /// store failure maps to a server error.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::InvalidCursor(_) | Self::CursorStrategyMismatch { .. } => 400,
            Self::TooManyJoins { .. }
            | Self::OffsetTooLarge { .. }
            | Self::LimitTooLarge { .. }
            | Self::TooComplex { .. } => 422,
            Self::Store(_) => 500,
        }
    }

    /// True when the failure was caused by client-supplied input.
    pub fn is_client_error(&self) -> bool {
        self.status_code() < 500
    }
}

impl From<sqlx::Error> for FeedQueryError {
    fn from(err: sqlx::Error) -> Self {
        FeedQueryError::Store(err.to_string())
    }
}
