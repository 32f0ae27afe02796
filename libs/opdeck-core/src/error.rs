//! Error types for opdeck-core.

use thiserror::Error;

/// Result type alias using ParseError.
pub type Result<T> = std::result::Result<T, ParseError>;

/// Errors raised when turning user input into core values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("unknown grade: {0} (expected again, hard, good or easy)")]
    UnknownGrade(String),

    #[error("unknown scheduling policy: {0} (expected fixed or ease)")]
    UnknownPolicy(String),

    #[error("invalid card id: {0}")]
    InvalidCardId(String),
}
