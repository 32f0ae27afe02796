//! CLI command handlers.

pub mod cache;
pub mod import;
pub mod settings;
pub mod study;

use std::sync::Arc;

use crate::anilist::AniListFetcher;
use crate::client::{RateLimitedClient, ReqwestTransport};
use crate::config::AppConfig;
use crate::db::SqliteBlobStore;
use crate::import::ImportCoordinator;
use crate::state::AppState;
use crate::themes::ThemeResolver;

pub use cache::clear_cache;
pub use import::import;
pub use settings::{settings, SettingsArgs};
pub use study::{due, grade};

/// Coordinator wired to the live services.
pub type LiveCoordinator =
    ImportCoordinator<AniListFetcher<ReqwestTransport>, ThemeResolver<ReqwestTransport>>;

/// Load every persisted aggregate from the configured database.
pub fn open_state(config: &AppConfig) -> anyhow::Result<AppState> {
    tracing::debug!(path = %config.db_path.display(), "opening database");
    let store = SqliteBlobStore::open(&config.db_path)?;
    Ok(AppState::open(Arc::new(store))?)
}

/// Both services share one client, so retries and pacing apply across them.
pub fn build_coordinator(config: &AppConfig) -> anyhow::Result<LiveCoordinator> {
    let transport = ReqwestTransport::new(&config.user_agent, config.timeout)?;
    let client = Arc::new(RateLimitedClient::new(transport, config.retry.clone()));
    Ok(ImportCoordinator::new(
        AniListFetcher::new(client.clone(), config.anilist_url.as_str()),
        ThemeResolver::new(client, config.animethemes_url.as_str()),
    ))
}
