//! SQLite schema and blob keys.

/// Version written into every blob envelope.
pub const BLOB_VERSION: u32 = 1;

/// Card id -> schedule state.
pub const SCHEDULE_KEY: &str = "schedule";

/// Catalog id -> resolved theme records.
pub const THEME_CACHE_KEY: &str = "theme_cache";

/// Run settings.
pub const SETTINGS_KEY: &str = "settings";

/// Ordered card collection.
pub const CARDS_KEY: &str = "cards";

/// Each aggregate is one row, rewritten wholesale on change.
pub const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS blobs (
    key TEXT PRIMARY KEY,
    version INTEGER NOT NULL,
    value TEXT NOT NULL,
    updated_at TEXT NOT NULL
);
"#;
