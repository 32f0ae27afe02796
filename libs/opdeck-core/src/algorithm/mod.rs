//! Spaced repetition scheduling policies.
//!
//! A policy maps `(prior state, grade, now)` to a new [`ScheduleState`]. Every
//! policy keeps the same bookkeeping: `attempts` grows by one per call,
//! `successes` only on non-Again grades, and Again resets `repetitions`.

pub mod ease;
pub mod fixed;

use crate::types::{Grade, PolicyKind, ScheduleState};
use chrono::{DateTime, Duration, Utc};

/// Relearn delay applied by every policy on Again.
pub const RELEARN_DELAY_SECS: i64 = 10 * 60;

pub const DAY_SECS: i64 = 24 * 60 * 60;

/// Trait for spaced repetition policies.
pub trait SchedulingPolicy: Send + Sync {
    /// Policy identifier.
    fn name(&self) -> &'static str;

    /// State for a card that has never been graded.
    fn initial_state(&self, now: DateTime<Utc>) -> ScheduleState;

    /// Calculate the state after grading a card at `now`.
    fn schedule(&self, state: &ScheduleState, grade: Grade, now: DateTime<Utc>) -> ScheduleState;
}

/// Apply `grade` using the wall clock, read exactly once.
pub fn next(policy: &dyn SchedulingPolicy, state: &ScheduleState, grade: Grade) -> ScheduleState {
    policy.schedule(state, grade, Utc::now())
}

/// Instantiate a policy by kind.
pub fn get_policy(kind: PolicyKind) -> Box<dyn SchedulingPolicy> {
    match kind {
        PolicyKind::FixedInterval => Box::new(fixed::FixedInterval::default()),
        PolicyKind::EaseFactor => Box::new(ease::EaseFactor::default()),
    }
}

/// Counters shared by every policy; interval and due date are filled in by the caller.
fn bump_counters(state: &ScheduleState, grade: Grade) -> (u32, u32, u32) {
    let attempts = state.attempts.saturating_add(1);
    let successes = if grade.is_success() {
        state.successes.saturating_add(1).min(attempts)
    } else {
        state.successes.min(attempts)
    };
    let repetitions = if grade.is_success() {
        state.repetitions.saturating_add(1)
    } else {
        0
    };
    (attempts, successes, repetitions)
}

fn finish(
    attempts: u32,
    successes: u32,
    repetitions: u32,
    interval_secs: i64,
    ease_factor: f64,
    now: DateTime<Utc>,
) -> ScheduleState {
    ScheduleState {
        interval_secs,
        repetitions,
        attempts,
        successes,
        ease_factor,
        due_at: due_after(now, interval_secs),
    }
}

/// `now + interval_secs`, saturating at the latest representable instant.
fn due_after(now: DateTime<Utc>, interval_secs: i64) -> DateTime<Utc> {
    Duration::try_seconds(interval_secs)
        .and_then(|gap| now.checked_add_signed(gap))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}
