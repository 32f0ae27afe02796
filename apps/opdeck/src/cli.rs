//! Command-line interface.

use clap::{Parser, Subcommand};
use opdeck_core::Grade;

use crate::commands::{self, SettingsArgs};
use crate::config::AppConfig;

#[derive(Debug, Parser)]
#[command(version, about = "Anime opening flashcards", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Import openings from a user's anime lists.
    Import {
        /// Numeric user id or user name.
        user: String,
    },
    /// List cards due for review.
    Due {
        /// Show at most this many cards.
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Grade a card: again, hard, good or easy (or 1-4).
    Grade { card_id: String, grade: Grade },
    /// Show or change run settings.
    Settings(SettingsArgs),
    /// Forget all cached theme lookups.
    ClearCache,
}

pub async fn dispatch(cli: Cli, config: &AppConfig) -> anyhow::Result<()> {
    let mut state = commands::open_state(config)?;
    match cli.command {
        Command::Import { user } => commands::import(config, &mut state, &user).await,
        Command::Due { limit } => commands::due(&state, limit),
        Command::Grade { card_id, grade } => commands::grade(&mut state, &card_id, grade),
        Command::Settings(args) => commands::settings(&mut state, args),
        Command::ClearCache => commands::clear_cache(&mut state),
    }
}
