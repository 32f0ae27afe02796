//! Grading a card.

use chrono::{DateTime, Utc};
use opdeck_core::{get_policy, Grade, ScheduleState};
use thiserror::Error;

use crate::state::AppState;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReviewError {
    #[error("Card not found: {0}")]
    UnknownCard(String),

    #[error("No scheduling policy selected; run `opdeck settings --policy <fixed|ease>` first")]
    NoPolicy,
}

/// Apply `grade` to a card under the configured policy and record the result.
pub fn grade_card(
    state: &mut AppState,
    card_id: &str,
    grade: Grade,
    now: DateTime<Utc>,
) -> Result<ScheduleState, ReviewError> {
    let kind = state.settings.policy.ok_or(ReviewError::NoPolicy)?;
    if state.cards.get(card_id).is_none() {
        return Err(ReviewError::UnknownCard(card_id.to_string()));
    }

    let policy = get_policy(kind);
    let current = state.schedule.state_or_initial(card_id, policy.as_ref(), now);
    let next = policy.schedule(&current, grade, now);
    state.schedule.record(card_id, next.clone());

    tracing::debug!(
        card_id,
        grade = ?grade,
        policy = policy.name(),
        due_at = %next.due_at,
        "graded card"
    );
    Ok(next)
}
