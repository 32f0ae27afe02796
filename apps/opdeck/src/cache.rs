//! Persistent theme lookup cache.
//!
//! An empty record list is a real entry: it records that the show was looked
//! up and nothing matched, so the lookup is never repeated.

use std::collections::BTreeMap;
use std::sync::Arc;

use opdeck_core::ThemeRecord;

use crate::db::schema::THEME_CACHE_KEY;
use crate::db::{load_json, save_json, BlobStore, StoreError};

pub struct ThemeCache {
    store: Arc<dyn BlobStore>,
    entries: BTreeMap<i64, Vec<ThemeRecord>>,
}

impl ThemeCache {
    pub fn open(store: Arc<dyn BlobStore>) -> Result<Self, StoreError> {
        let raw: BTreeMap<String, Vec<ThemeRecord>> =
            load_json(store.as_ref(), THEME_CACHE_KEY)?.unwrap_or_default();

        let mut entries = BTreeMap::new();
        for (key, records) in raw {
            match key.parse::<i64>() {
                Ok(id) => {
                    entries.insert(id, records);
                }
                Err(_) => tracing::warn!(key = %key, "dropping theme cache entry with invalid id"),
            }
        }

        Ok(Self { store, entries })
    }

    pub fn get(&self, catalog_id: i64) -> Option<&[ThemeRecord]> {
        self.entries.get(&catalog_id).map(Vec::as_slice)
    }

    pub fn contains(&self, catalog_id: i64) -> bool {
        self.entries.contains_key(&catalog_id)
    }

    pub fn insert(&mut self, catalog_id: i64, records: Vec<ThemeRecord>) {
        self.entries.insert(catalog_id, records);
        self.persist();
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.persist();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn persist(&self) {
        let blob: BTreeMap<String, &Vec<ThemeRecord>> = self
            .entries
            .iter()
            .map(|(id, records)| (id.to_string(), records))
            .collect();
        if let Err(e) = save_json(self.store.as_ref(), THEME_CACHE_KEY, &blob) {
            tracing::warn!(error = %e, "failed to persist theme cache");
        }
    }
}
