//! Application state.

use std::sync::Arc;

use opdeck_core::RunSettings;

use crate::cache::ThemeCache;
use crate::cards::CardStore;
use crate::db::schema::SETTINGS_KEY;
use crate::db::{load_json, save_json, BlobStore, StoreError};
use crate::schedule::ScheduleBook;

/// The four persisted aggregates, loaded once per process.
///
/// In-memory values are authoritative; blob writes are best-effort mirrors.
pub struct AppState {
    pub cache: ThemeCache,
    pub cards: CardStore,
    pub schedule: ScheduleBook,
    pub settings: RunSettings,
    store: Arc<dyn BlobStore>,
}

impl AppState {
    pub fn open(store: Arc<dyn BlobStore>) -> Result<Self, StoreError> {
        let settings = load_json(store.as_ref(), SETTINGS_KEY)?.unwrap_or_default();
        Ok(Self {
            cache: ThemeCache::open(store.clone())?,
            cards: CardStore::open(store.clone())?,
            schedule: ScheduleBook::open(store.clone())?,
            settings,
            store,
        })
    }

    pub fn update_settings(&mut self, settings: RunSettings) {
        self.settings = settings;
        if let Err(e) = save_json(self.store.as_ref(), SETTINGS_KEY, &self.settings) {
            tracing::warn!(error = %e, "failed to persist settings");
        }
    }
}
