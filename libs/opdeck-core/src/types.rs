//! Core types for the opening-theme deck.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::ParseError;

/// Broadcast season of a show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Season {
    Winter,
    Spring,
    Summer,
    Fall,
}

/// Title variants of a catalog entry.
///
/// Blank strings are stored as `None` so lookups never query an empty name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TitleVariants {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub romaji: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub english: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub native: Option<String>,
}

impl TitleVariants {
    pub fn new(
        romaji: Option<String>,
        english: Option<String>,
        native: Option<String>,
    ) -> Self {
        Self {
            romaji: non_blank(romaji),
            english: non_blank(english),
            native: non_blank(native),
        }
    }

    /// Non-empty variants in lookup priority order: romaji, english, native.
    pub fn ordered(&self) -> impl Iterator<Item = &str> {
        [&self.romaji, &self.english, &self.native]
            .into_iter()
            .filter_map(|t| t.as_deref())
            .filter(|t| !t.trim().is_empty())
    }

    /// Title shown to the user.
    pub fn display(&self) -> &str {
        self.ordered().next().unwrap_or("Untitled")
    }

    pub fn is_empty(&self) -> bool {
        self.ordered().next().is_none()
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// One show from the user's remote list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub catalog_id: i64,
    pub titles: TitleVariants,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub season: Option<Season>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
}

/// An opening theme resolved from the theme index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThemeRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sequence: Option<u32>,
    #[serde(default)]
    pub song_title: String,
    #[serde(default, deserialize_with = "one_or_many")]
    pub artists: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_url: Option<String>,
}

impl ThemeRecord {
    /// Sequence number with the default of 1 applied.
    pub fn sequence_number(&self) -> u32 {
        self.sequence.unwrap_or(1)
    }
}

/// Accepts either `"artist"` or `["a", "b"]`.
fn one_or_many<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match Option::<OneOrMany>::deserialize(deserializer)? {
        Some(OneOrMany::One(s)) if s.trim().is_empty() => Vec::new(),
        Some(OneOrMany::One(s)) => vec![s],
        Some(OneOrMany::Many(v)) => v,
        None => Vec::new(),
    })
}

/// Build the deterministic card id for a show's opening.
pub fn card_id(catalog_id: i64, sequence: u32) -> String {
    format!("{catalog_id}::OP{sequence}")
}

/// Split a card id back into `(catalog_id, sequence)`.
pub fn parse_card_id(id: &str) -> Result<(i64, u32), ParseError> {
    let invalid = || ParseError::InvalidCardId(id.to_string());
    let (catalog, sequence) = id.split_once("::OP").ok_or_else(invalid)?;
    let catalog_id = catalog.parse().map_err(|_| invalid())?;
    let sequence = sequence.parse().map_err(|_| invalid())?;
    Ok((catalog_id, sequence))
}

/// A flashcard prompting for one opening theme.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    pub id: String,
    pub catalog_id: i64,
    pub title: TitleVariants,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub season: Option<Season>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    pub sequence: u32,
    pub song_title: String,
    #[serde(default, deserialize_with = "one_or_many")]
    pub artists: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_url: Option<String>,
}

impl Card {
    pub fn from_theme(entry: &CatalogEntry, theme: &ThemeRecord) -> Self {
        let sequence = theme.sequence_number();
        Self {
            id: card_id(entry.catalog_id, sequence),
            catalog_id: entry.catalog_id,
            title: entry.titles.clone(),
            season: entry.season,
            year: entry.year,
            sequence,
            song_title: theme.song_title.clone(),
            artists: theme.artists.clone(),
            media_url: theme.media_url.clone(),
        }
    }

    /// A card without a media link has no preview clip.
    pub fn has_preview(&self) -> bool {
        self.media_url.is_some()
    }
}

/// Review grade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Grade {
    Again,
    Hard,
    Good,
    Easy,
}

impl Grade {
    /// Convert to 4-point numeric value (1-4).
    pub fn to_value(self) -> u8 {
        match self {
            Self::Again => 1,
            Self::Hard => 2,
            Self::Good => 3,
            Self::Easy => 4,
        }
    }

    /// Create from 4-point numeric value.
    pub fn from_value(value: u8) -> Option<Self> {
        match value {
            1 => Some(Self::Again),
            2 => Some(Self::Hard),
            3 => Some(Self::Good),
            4 => Some(Self::Easy),
            _ => None,
        }
    }

    /// Every grade except Again counts as a successful recall.
    pub fn is_success(self) -> bool {
        !matches!(self, Self::Again)
    }
}

impl FromStr for Grade {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "again" | "1" => Ok(Self::Again),
            "hard" | "2" => Ok(Self::Hard),
            "good" | "3" => Ok(Self::Good),
            "easy" | "4" => Ok(Self::Easy),
            other => Err(ParseError::UnknownGrade(other.to_string())),
        }
    }
}

/// Review schedule for a single card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleState {
    /// Current review gap in seconds.
    pub interval_secs: i64,
    pub repetitions: u32,
    pub attempts: u32,
    pub successes: u32,
    pub ease_factor: f64,
    pub due_at: DateTime<Utc>,
}

impl ScheduleState {
    /// Default state for a card that has never been graded.
    pub fn new(now: DateTime<Utc>, ease_factor: f64) -> Self {
        Self {
            interval_secs: 0,
            repetitions: 0,
            attempts: 0,
            successes: 0,
            ease_factor,
            due_at: now,
        }
    }

    pub fn interval(&self) -> Duration {
        Duration::try_seconds(self.interval_secs).unwrap_or(Duration::MAX)
    }

    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.due_at <= now
    }

    /// Fraction of attempts graded as a success.
    pub fn success_rate(&self) -> f64 {
        if self.attempts == 0 {
            0.0
        } else {
            f64::from(self.successes) / f64::from(self.attempts)
        }
    }
}

/// Named scheduling policies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyKind {
    /// Three-grade fixed interval ladder.
    FixedInterval,
    /// Four-grade ease-factor model.
    EaseFactor,
}

impl PolicyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FixedInterval => "fixed",
            Self::EaseFactor => "ease",
        }
    }
}

impl FromStr for PolicyKind {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fixed" | "fixed_interval" => Ok(Self::FixedInterval),
            "ease" | "ease_factor" | "sm2" => Ok(Self::EaseFactor),
            other => Err(ParseError::UnknownPolicy(other.to_string())),
        }
    }
}

impl fmt::Display for PolicyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Persisted run settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunSettings {
    /// Requested show cap; never applied below [`RunSettings::MIN_SHOWS`].
    pub max_shows: usize,
    pub max_cards_per_show: usize,
    pub inter_item_delay_ms: u64,
    pub item_jitter_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_stored_cards: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub policy: Option<PolicyKind>,
}

impl RunSettings {
    pub const MIN_SHOWS: usize = 10;

    /// Number of shows a run processes out of `available` entries.
    pub fn effective_show_cap(&self, available: usize) -> usize {
        self.max_shows.max(Self::MIN_SHOWS).min(available)
    }
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            max_shows: 50,
            max_cards_per_show: 3,
            inter_item_delay_ms: 700,
            item_jitter_ms: 300,
            max_stored_cards: None,
            policy: None,
        }
    }
}
