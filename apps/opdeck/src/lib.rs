//! Anime opening flashcards.
//!
//! Imports opening themes for the shows on a user's AniList lists, resolved
//! through AnimeThemes, and schedules them for review.

pub mod anilist;
pub mod cache;
pub mod cards;
pub mod cli;
pub mod client;
pub mod commands;
pub mod config;
pub mod db;
pub mod import;
pub mod review;
pub mod schedule;
pub mod state;
pub mod themes;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::Cli;
use crate::config::AppConfig;

pub use state::AppState;

pub async fn run() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = AppConfig::from_env()?;
    cli::dispatch(cli, &config).await
}
