//! Import error types.

use thiserror::Error;

use crate::client::NetworkError;

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("No catalog entries found for this user")]
    NoEntries,

    #[error("No opening themes matched any catalog entry")]
    NothingMatched,

    #[error("Import already in progress")]
    AlreadyInProgress,

    #[error("Failed to fetch catalog: {0}")]
    Fetch(#[from] NetworkError),
}

impl ImportError {
    /// Empty outcomes are reported to the user, not treated as failures.
    pub fn is_empty_outcome(&self) -> bool {
        matches!(self, Self::NoEntries | Self::NothingMatched)
    }
}
