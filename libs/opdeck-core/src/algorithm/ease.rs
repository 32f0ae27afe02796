//! Four-grade ease-factor policy.
//!
//! Based on SuperMemo 2 with configurable parameters. Lapses drop the card
//! into a ten minute relearn step instead of a full day.

use super::{bump_counters, finish, SchedulingPolicy, DAY_SECS, RELEARN_DELAY_SECS};
use crate::types::{Grade, ScheduleState};
use chrono::{DateTime, Utc};

/// SM-2 style policy with configurable parameters.
#[derive(Debug, Clone)]
pub struct EaseFactor {
    pub initial_ease: f64,
    pub minimum_ease: f64,
    pub easy_bonus: f64,
    pub hard_multiplier: f64,
    pub graduating_interval: f64,
    pub second_interval: f64,
    pub easy_interval: f64,
    /// Longest review gap, in days.
    pub maximum_interval: f64,
}

impl Default for EaseFactor {
    fn default() -> Self {
        Self {
            initial_ease: 2.5,
            minimum_ease: 1.3,
            easy_bonus: 1.3,
            hard_multiplier: 1.2,
            graduating_interval: 1.0,
            second_interval: 6.0,
            easy_interval: 4.0,
            maximum_interval: 36_500.0,
        }
    }
}

impl SchedulingPolicy for EaseFactor {
    fn name(&self) -> &'static str {
        "ease"
    }

    fn initial_state(&self, now: DateTime<Utc>) -> ScheduleState {
        ScheduleState::new(now, self.initial_ease)
    }

    fn schedule(&self, state: &ScheduleState, grade: Grade, now: DateTime<Utc>) -> ScheduleState {
        let (attempts, successes, repetitions) = bump_counters(state, grade);
        let ease = if state.ease_factor > 0.0 {
            state.ease_factor
        } else {
            self.initial_ease
        };
        // Relearn steps are not review gaps; only a graduated interval feeds growth.
        let previous_days = if state.repetitions == 0 {
            0.0
        } else {
            state.interval_secs as f64 / DAY_SECS as f64
        };

        let (interval_days, new_ease) = match grade {
            Grade::Again => {
                let new_ease = (ease - 0.2).max(self.minimum_ease);
                return finish(attempts, successes, 0, RELEARN_DELAY_SECS, new_ease, now);
            }
            Grade::Hard => (
                (previous_days * self.hard_multiplier).max(self.graduating_interval),
                ease - 0.15,
            ),
            Grade::Good => {
                let days = match state.repetitions {
                    0 => self.graduating_interval,
                    1 => self.second_interval,
                    _ => previous_days * ease,
                };
                (days.max(previous_days), ease)
            }
            Grade::Easy => {
                let days = match state.repetitions {
                    0 => self.easy_interval,
                    _ => (previous_days * ease * self.easy_bonus).max(self.second_interval),
                };
                (days.max(previous_days), ease + 0.15)
            }
        };

        let interval_days = interval_days.min(self.maximum_interval);
        let interval_secs = (interval_days * DAY_SECS as f64).round() as i64;
        finish(
            attempts,
            successes,
            repetitions,
            interval_secs,
            new_ease.max(self.minimum_ease),
            now,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> DateTime<Utc> {
        Utc::now()
    }

    #[test]
    fn new_card_graduates_on_good() {
        let policy = EaseFactor::default();
        let state = policy.schedule(&policy.initial_state(now()), Grade::Good, now());
        assert_eq!(state.interval().num_days(), 1);
        assert_eq!(state.repetitions, 1);
    }

    #[test]
    fn new_card_easy_gets_longer_interval() {
        let policy = EaseFactor::default();
        let state = policy.schedule(&policy.initial_state(now()), Grade::Easy, now());
        assert_eq!(state.interval().num_days(), 4);
        assert!(state.ease_factor > policy.initial_ease);
    }

    #[test]
    fn good_sequence_follows_sm2_steps() {
        let policy = EaseFactor::default();
        let t = now();
        let mut state = policy.initial_state(t);
        let mut days = Vec::new();
        for _ in 0..4 {
            state = policy.schedule(&state, Grade::Good, t);
            days.push(state.interval().num_days());
        }
        assert_eq!(days, vec![1, 6, 15, 37]);
    }

    #[test]
    fn long_success_streaks_stop_at_the_maximum_interval() {
        let policy = EaseFactor::default();
        let max_secs = (policy.maximum_interval * DAY_SECS as f64) as i64;
        for grade in [Grade::Easy, Grade::Good] {
            let t = now();
            let mut state = policy.initial_state(t);
            for _ in 0..50 {
                state = policy.schedule(&state, grade, t);
                assert!(state.interval_secs <= max_secs, "{grade:?}");
                assert!(state.due_at > t, "{grade:?}");
            }
            assert_eq!(state.interval_secs, max_secs, "{grade:?}");
            assert_eq!(state.attempts, 50);
        }
    }

    #[test]
    fn review_card_lapse_on_again() {
        let policy = EaseFactor::default();
        let t = now();
        let prior = ScheduleState {
            interval_secs: 10 * DAY_SECS,
            repetitions: 5,
            attempts: 5,
            successes: 5,
            ..policy.initial_state(t)
        };
        let state = policy.schedule(&prior, Grade::Again, t);
        assert_eq!(state.repetitions, 0);
        assert_eq!(state.interval_secs, RELEARN_DELAY_SECS);
        assert!((state.ease_factor - 2.3).abs() < 1e-9);
    }

    #[test]
    fn relearned_card_graduates_again_from_one_day() {
        let policy = EaseFactor::default();
        let t = now();
        let lapsed = policy.schedule(&policy.initial_state(t), Grade::Again, t);
        let state = policy.schedule(&lapsed, Grade::Good, t);
        assert_eq!(state.interval().num_days(), 1);
    }

    #[test]
    fn hard_grows_slowly_but_never_shrinks() {
        let policy = EaseFactor::default();
        let t = now();
        let prior = ScheduleState {
            interval_secs: 10 * DAY_SECS,
            repetitions: 3,
            ..policy.initial_state(t)
        };
        let state = policy.schedule(&prior, Grade::Hard, t);
        assert_eq!(state.interval().num_days(), 12);
        assert!(state.due_at > t);
    }

    #[test]
    fn ease_factor_never_below_minimum() {
        let policy = EaseFactor::default();
        let t = now();
        let prior = ScheduleState {
            ease_factor: 1.4,
            ..policy.initial_state(t)
        };
        let state = policy.schedule(&prior, Grade::Again, t);
        assert!(state.ease_factor >= policy.minimum_ease);
        let state = policy.schedule(&state, Grade::Hard, t);
        assert!(state.ease_factor >= policy.minimum_ease);
    }
}
