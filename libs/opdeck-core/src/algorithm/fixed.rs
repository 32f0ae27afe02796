//! Three-grade fixed interval policy.
//!
//! Easy walks up a fixed ladder of review gaps, Hard repeats the card
//! immediately and Again sends it back to a short relearn step. Good is
//! accepted and treated as Easy.

use super::{bump_counters, finish, SchedulingPolicy, DAY_SECS, RELEARN_DELAY_SECS};
use crate::types::{Grade, ScheduleState};
use chrono::{DateTime, Utc};

/// Fixed interval ladder, in days.
#[derive(Debug, Clone)]
pub struct FixedInterval {
    pub ladder_days: Vec<i64>,
}

impl Default for FixedInterval {
    fn default() -> Self {
        Self {
            ladder_days: vec![1, 3, 7, 14, 30, 60, 120],
        }
    }
}

impl SchedulingPolicy for FixedInterval {
    fn name(&self) -> &'static str {
        "fixed"
    }

    fn initial_state(&self, now: DateTime<Utc>) -> ScheduleState {
        ScheduleState::new(now, 0.0)
    }

    fn schedule(&self, state: &ScheduleState, grade: Grade, now: DateTime<Utc>) -> ScheduleState {
        let (attempts, successes, repetitions) = bump_counters(state, grade);

        let interval_secs = match grade {
            Grade::Again => RELEARN_DELAY_SECS,
            Grade::Hard => 0,
            Grade::Good | Grade::Easy => self.rung(repetitions) * DAY_SECS,
        };

        finish(
            attempts,
            successes,
            repetitions,
            interval_secs,
            state.ease_factor,
            now,
        )
    }
}

impl FixedInterval {
    /// Ladder rung for the given repetition count (1-based), capped at the top.
    fn rung(&self, repetitions: u32) -> i64 {
        let index = (repetitions.max(1) - 1) as usize;
        self.ladder_days
            .get(index)
            .or_else(|| self.ladder_days.last())
            .copied()
            .unwrap_or(1)
    }
}
