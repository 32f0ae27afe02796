//! Key-value blob persistence.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::db::error::StoreError;
use crate::db::schema::{BLOB_VERSION, SCHEMA};

type Result<T> = std::result::Result<T, StoreError>;

/// A persisted JSON value and the envelope version it was written with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredBlob {
    pub version: u32,
    pub value: String,
}

/// Independently keyed blobs with whole-value replacement.
pub trait BlobStore: Send + Sync {
    fn load(&self, key: &str) -> Result<Option<StoredBlob>>;
    fn save(&self, key: &str, blob: &StoredBlob) -> Result<()>;
    fn delete(&self, key: &str) -> Result<()>;
}

/// Read and decode a blob, rejecting envelope versions this build cannot read.
pub fn load_json<T: DeserializeOwned>(store: &dyn BlobStore, key: &str) -> Result<Option<T>> {
    match store.load(key)? {
        None => Ok(None),
        Some(blob) if blob.version != BLOB_VERSION => Err(StoreError::UnsupportedVersion {
            key: key.to_string(),
            found: blob.version,
        }),
        Some(blob) => Ok(Some(serde_json::from_str(&blob.value)?)),
    }
}

/// Encode and replace a blob.
pub fn save_json<T: Serialize + ?Sized>(store: &dyn BlobStore, key: &str, value: &T) -> Result<()> {
    let blob = StoredBlob {
        version: BLOB_VERSION,
        value: serde_json::to_string(value)?,
    };
    store.save(key, &blob)
}

/// SQLite implementation of the blob store.
pub struct SqliteBlobStore {
    conn: Mutex<Connection>,
}

impl SqliteBlobStore {
    /// Open database at path, creating if necessary.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        Self::initialize(conn)
    }

    /// Open in-memory database (for testing).
    pub fn open_in_memory() -> Result<Self> {
        Self::initialize(Connection::open_in_memory()?)
    }

    fn initialize(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StoreError::Poisoned)
    }
}

impl BlobStore for SqliteBlobStore {
    fn load(&self, key: &str) -> Result<Option<StoredBlob>> {
        self.conn()?
            .query_row(
                "SELECT version, value FROM blobs WHERE key = ?1",
                params![key],
                |row| {
                    Ok(StoredBlob {
                        version: row.get(0)?,
                        value: row.get(1)?,
                    })
                },
            )
            .optional()
            .map_err(Into::into)
    }

    fn save(&self, key: &str, blob: &StoredBlob) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        self.conn()?.execute(
            "INSERT OR REPLACE INTO blobs (key, version, value, updated_at) VALUES (?1, ?2, ?3, ?4)",
            params![key, blob.version, blob.value, now],
        )?;
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<()> {
        self.conn()?
            .execute("DELETE FROM blobs WHERE key = ?1", params![key])?;
        Ok(())
    }
}

/// Process-local blob store.
#[derive(Default)]
pub struct MemoryBlobStore {
    blobs: Mutex<HashMap<String, StoredBlob>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn blobs(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, StoredBlob>>> {
        self.blobs.lock().map_err(|_| StoreError::Poisoned)
    }
}

impl BlobStore for MemoryBlobStore {
    fn load(&self, key: &str) -> Result<Option<StoredBlob>> {
        Ok(self.blobs()?.get(key).cloned())
    }

    fn save(&self, key: &str, blob: &StoredBlob) -> Result<()> {
        self.blobs()?.insert(key.to_string(), blob.clone());
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<()> {
        self.blobs()?.remove(key);
        Ok(())
    }
}
