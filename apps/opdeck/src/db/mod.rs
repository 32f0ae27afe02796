//! Local persistence: four JSON blobs in one SQLite table.

pub mod error;
pub mod repository;
pub mod schema;

pub use error::StoreError;
pub use repository::{load_json, save_json, BlobStore, MemoryBlobStore, SqliteBlobStore, StoredBlob};
