//! Blob store error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("invalid blob data: {0}")]
    Json(#[from] serde_json::Error),

    #[error("blob {key} has unsupported version {found}")]
    UnsupportedVersion { key: String, found: u32 },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("blob store lock poisoned")]
    Poisoned,
}
