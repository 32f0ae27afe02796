//! Core library for the opening-theme flashcard deck.
//!
//! Provides:
//! - Domain types (CatalogEntry, ThemeRecord, Card, ScheduleState, Grade, RunSettings)
//! - Scheduling policies behind a common trait (fixed interval, ease factor)

pub mod algorithm;
pub mod error;
pub mod types;

pub use algorithm::{get_policy, next, SchedulingPolicy};
pub use error::{ParseError, Result};
pub use types::{
    card_id, parse_card_id, Card, CatalogEntry, Grade, PolicyKind, RunSettings, ScheduleState,
    Season, ThemeRecord, TitleVariants,
};
