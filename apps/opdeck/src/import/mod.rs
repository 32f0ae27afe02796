//! Import pipeline.
//!
//! One run walks the user's catalog in order, resolves each show's openings,
//! and commits new cards as it goes so review can start before the run ends.
//! Runs are strictly sequential: one request at a time, paced by an
//! inter-item delay.

pub mod error;

use std::collections::HashSet;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use opdeck_core::{Card, CatalogEntry, ThemeRecord, TitleVariants};
use serde::Serialize;
use tokio::sync::Mutex;

use crate::anilist::UserRef;
use crate::cache::ThemeCache;
use crate::client::{jitter, NetworkError};
use crate::state::AppState;

pub use error::ImportError;

/// Source of a user's catalog entries.
pub trait CatalogSource: Send + Sync {
    fn fetch_all(
        &self,
        user: &UserRef,
    ) -> impl Future<Output = Result<Vec<CatalogEntry>, NetworkError>> + Send;
}

/// Resolves one catalog entry to its opening themes, through the cache.
pub trait ThemeSource: Send + Sync {
    fn resolve(
        &self,
        cache: &mut ThemeCache,
        catalog_id: i64,
        titles: &TitleVariants,
    ) -> impl Future<Output = Result<Vec<ThemeRecord>, NetworkError>> + Send;
}

/// Cooperative cancellation flag, polled once per catalog entry.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle(Arc<AtomicBool>);

impl CancelHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportOutcome {
    Completed,
    Cancelled,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ImportProgress {
    pub processed: usize,
    pub total: usize,
    pub cards_added: usize,
}

/// Summary of a finished run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    pub outcome: ImportOutcome,
    pub processed: usize,
    pub total: usize,
    /// Cards committed during the run, counted before retention evicts any.
    pub cards_added: usize,
    /// Shows whose lookup failed; they count as processed with zero cards.
    pub failed: usize,
    pub duplicates_removed: usize,
    pub evicted: usize,
    pub stored_cards: usize,
}

/// Events emitted to the caller while a run progresses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type")]
pub enum ImportEvent {
    Started { total: usize },
    Progress(ImportProgress),
    Finished(ImportReport),
    Failed { error: String },
}

/// Run status, for callers polling instead of listening to events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type")]
pub enum ImportStatus {
    Idle,
    Running(ImportProgress),
    Finished(ImportReport),
    Failed { error: String },
}

pub struct ImportCoordinator<L, R> {
    lister: L,
    resolver: R,
    status: Mutex<ImportStatus>,
    /// Ids dropped by retention during this session; later runs skip them.
    evicted: Mutex<HashSet<String>>,
}

impl<L: CatalogSource, R: ThemeSource> ImportCoordinator<L, R> {
    pub fn new(lister: L, resolver: R) -> Self {
        Self {
            lister,
            resolver,
            status: Mutex::new(ImportStatus::Idle),
            evicted: Mutex::new(HashSet::new()),
        }
    }

    pub async fn status(&self) -> ImportStatus {
        self.status.lock().await.clone()
    }

    /// Import the user's openings into `state.cards`.
    ///
    /// Emits `Started`, one `Progress` per processed show and a terminal
    /// `Finished` or `Failed`. Cards committed before a failure or
    /// cancellation stay committed.
    pub async fn run<F>(
        &self,
        user: &UserRef,
        state: &mut AppState,
        cancel: &CancelHandle,
        mut on_event: F,
    ) -> Result<ImportReport, ImportError>
    where
        F: FnMut(&ImportEvent),
    {
        {
            let mut status = self.status.lock().await;
            if matches!(*status, ImportStatus::Running(_)) {
                return Err(ImportError::AlreadyInProgress);
            }
            *status = ImportStatus::Running(ImportProgress::default());
        }

        let result = self.execute(user, state, cancel, &mut on_event).await;

        let (status, event) = match &result {
            Ok(report) => {
                tracing::info!(
                    user = %user,
                    outcome = ?report.outcome,
                    processed = report.processed,
                    cards_added = report.cards_added,
                    failed = report.failed,
                    "import finished"
                );
                (
                    ImportStatus::Finished(report.clone()),
                    ImportEvent::Finished(report.clone()),
                )
            }
            Err(e) => {
                tracing::warn!(user = %user, error = %e, "import failed");
                let error = e.to_string();
                (
                    ImportStatus::Failed {
                        error: error.clone(),
                    },
                    ImportEvent::Failed { error },
                )
            }
        };
        *self.status.lock().await = status;
        on_event(&event);
        result
    }

    async fn execute<F>(
        &self,
        user: &UserRef,
        state: &mut AppState,
        cancel: &CancelHandle,
        on_event: &mut F,
    ) -> Result<ImportReport, ImportError>
    where
        F: FnMut(&ImportEvent),
    {
        let entries = self.lister.fetch_all(user).await?;
        let settings = state.settings.clone();
        let total = settings.effective_show_cap(entries.len());
        if total == 0 {
            return Err(ImportError::NoEntries);
        }

        tracing::info!(user = %user, available = entries.len(), total, "starting import");
        on_event(&ImportEvent::Started { total });

        let mut known = state.cards.ids();
        known.extend(self.evicted.lock().await.iter().cloned());
        let mut progress = ImportProgress {
            total,
            ..ImportProgress::default()
        };
        let mut outcome = ImportOutcome::Completed;
        let mut failed = 0;
        let delay = Duration::from_millis(settings.inter_item_delay_ms);
        let max_jitter = Duration::from_millis(settings.item_jitter_ms);

        for (index, entry) in entries.iter().take(total).enumerate() {
            if cancel.is_cancelled() {
                tracing::info!(processed = progress.processed, total, "import cancelled");
                outcome = ImportOutcome::Cancelled;
                break;
            }

            match self
                .resolver
                .resolve(&mut state.cache, entry.catalog_id, &entry.titles)
                .await
            {
                Ok(themes) => {
                    let staged: Vec<Card> = themes
                        .iter()
                        .take(settings.max_cards_per_show)
                        .map(|theme| Card::from_theme(entry, theme))
                        .filter(|card| known.insert(card.id.clone()))
                        .collect();
                    progress.cards_added += state.cards.commit(staged);
                }
                Err(e) => {
                    failed += 1;
                    tracing::warn!(
                        catalog_id = entry.catalog_id,
                        title = entry.titles.display(),
                        error = %e,
                        "failed to resolve themes, skipping show"
                    );
                }
            }

            progress.processed += 1;
            *self.status.lock().await = ImportStatus::Running(progress);
            on_event(&ImportEvent::Progress(progress));

            if index + 1 < total {
                tokio::time::sleep(delay + jitter(max_jitter)).await;
            }
        }

        let duplicates_removed = state.cards.dedupe();
        let mut evicted = 0;
        if let Some(limit) = settings.max_stored_cards {
            let dropped = state
                .cards
                .retain_within(limit, |id| state.schedule.attempts(id));
            state.schedule.forget(dropped.iter().map(|c| c.id.as_str()));
            evicted = dropped.len();
            self.evicted
                .lock()
                .await
                .extend(dropped.into_iter().map(|c| c.id));
        }

        if state.cards.is_empty() {
            return Err(ImportError::NothingMatched);
        }

        Ok(ImportReport {
            outcome,
            processed: progress.processed,
            total,
            cards_added: progress.cards_added,
            failed,
            duplicates_removed,
            evicted,
            stored_cards: state.cards.len(),
        })
    }
}
