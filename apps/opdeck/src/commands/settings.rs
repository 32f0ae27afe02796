//! `settings` command.

use clap::Args;
use opdeck_core::PolicyKind;

use crate::state::AppState;

#[derive(Debug, Default, Args)]
pub struct SettingsArgs {
    /// Scheduling policy: fixed or ease.
    #[arg(long)]
    pub policy: Option<PolicyKind>,
    /// Shows processed per import (never fewer than 10).
    #[arg(long)]
    pub max_shows: Option<usize>,
    /// Openings kept per show.
    #[arg(long)]
    pub max_cards_per_show: Option<usize>,
    /// Pause between shows, in milliseconds.
    #[arg(long)]
    pub delay_ms: Option<u64>,
    /// Upper bound of the random extra pause, in milliseconds.
    #[arg(long)]
    pub jitter_ms: Option<u64>,
    /// Cap on stored cards; least reviewed cards are evicted first.
    #[arg(long)]
    pub max_stored_cards: Option<usize>,
}

impl SettingsArgs {
    fn is_empty(&self) -> bool {
        self.policy.is_none()
            && self.max_shows.is_none()
            && self.max_cards_per_show.is_none()
            && self.delay_ms.is_none()
            && self.jitter_ms.is_none()
            && self.max_stored_cards.is_none()
    }
}

/// Show settings, or update the given fields and persist them.
pub fn settings(state: &mut AppState, args: SettingsArgs) -> anyhow::Result<()> {
    if !args.is_empty() {
        let mut updated = state.settings.clone();
        if let Some(policy) = args.policy {
            updated.policy = Some(policy);
        }
        if let Some(n) = args.max_shows {
            updated.max_shows = n;
        }
        if let Some(n) = args.max_cards_per_show {
            updated.max_cards_per_show = n;
        }
        if let Some(ms) = args.delay_ms {
            updated.inter_item_delay_ms = ms;
        }
        if let Some(ms) = args.jitter_ms {
            updated.item_jitter_ms = ms;
        }
        if let Some(n) = args.max_stored_cards {
            updated.max_stored_cards = Some(n);
        }
        state.update_settings(updated);
    }

    let s = &state.settings;
    println!(
        "policy: {}",
        s.policy.map_or("(none)".to_string(), |p| p.to_string())
    );
    println!("max shows: {}", s.max_shows);
    println!("max cards per show: {}", s.max_cards_per_show);
    println!("delay: {} ms (+ up to {} ms)", s.inter_item_delay_ms, s.item_jitter_ms);
    match s.max_stored_cards {
        Some(n) => println!("max stored cards: {n}"),
        None => println!("max stored cards: unlimited"),
    }
    Ok(())
}
