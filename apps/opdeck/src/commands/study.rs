//! Review commands.

use chrono::Utc;
use opdeck_core::{Card, Grade};

use crate::review::grade_card;
use crate::state::AppState;

/// List cards due now, earliest first.
pub fn due(state: &AppState, limit: Option<usize>) -> anyhow::Result<()> {
    let now = Utc::now();
    let (due, later) = state.schedule.partition_due(state.cards.as_slice(), now);

    println!("{} due, {} scheduled later.", due.len(), later.len());
    for card in due.iter().take(limit.unwrap_or(usize::MAX)) {
        println!("{}", describe(card));
        if let Some(url) = &card.media_url {
            println!("    {url}");
        }
    }
    Ok(())
}

pub fn grade(state: &mut AppState, card_id: &str, grade: Grade) -> anyhow::Result<()> {
    let next = grade_card(state, card_id, grade, Utc::now())?;
    println!(
        "{card_id}: next review {} ({} of {} correct)",
        next.due_at.format("%Y-%m-%d %H:%M UTC"),
        next.successes,
        next.attempts
    );
    Ok(())
}

fn describe(card: &Card) -> String {
    let mut line = format!("{}  {} OP{}", card.id, card.title.display(), card.sequence);
    if !card.song_title.is_empty() {
        line.push_str(&format!(" \"{}\"", card.song_title));
    }
    if !card.artists.is_empty() {
        line.push_str(&format!(" by {}", card.artists.join(", ")));
    }
    line
}
