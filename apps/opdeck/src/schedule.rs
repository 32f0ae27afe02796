//! Per-card schedule states.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use opdeck_core::{Card, ScheduleState, SchedulingPolicy};

use crate::db::schema::SCHEDULE_KEY;
use crate::db::{load_json, save_json, BlobStore, StoreError};

pub struct ScheduleBook {
    store: Arc<dyn BlobStore>,
    states: HashMap<String, ScheduleState>,
}

impl ScheduleBook {
    pub fn open(store: Arc<dyn BlobStore>) -> Result<Self, StoreError> {
        let states = load_json(store.as_ref(), SCHEDULE_KEY)?.unwrap_or_default();
        Ok(Self { store, states })
    }

    pub fn get(&self, card_id: &str) -> Option<&ScheduleState> {
        self.states.get(card_id)
    }

    /// Stored state, or the policy's initial state when the card was never graded.
    pub fn state_or_initial(
        &self,
        card_id: &str,
        policy: &dyn SchedulingPolicy,
        now: DateTime<Utc>,
    ) -> ScheduleState {
        self.states
            .get(card_id)
            .cloned()
            .unwrap_or_else(|| policy.initial_state(now))
    }

    pub fn attempts(&self, card_id: &str) -> u32 {
        self.states.get(card_id).map_or(0, |s| s.attempts)
    }

    pub fn record(&mut self, card_id: &str, state: ScheduleState) {
        self.states.insert(card_id.to_string(), state);
        self.persist();
    }

    /// Drop states for cards that no longer exist.
    pub fn forget<'a, I>(&mut self, card_ids: I)
    where
        I: IntoIterator<Item = &'a str>,
    {
        let before = self.states.len();
        for id in card_ids {
            self.states.remove(id);
        }
        if self.states.len() != before {
            self.persist();
        }
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Split cards into (due, later). Ungraded cards are due immediately;
    /// due cards come back earliest first.
    pub fn partition_due<'c>(
        &self,
        cards: &'c [Card],
        now: DateTime<Utc>,
    ) -> (Vec<&'c Card>, Vec<&'c Card>) {
        let due_at = |card: &Card| self.states.get(&card.id).map_or(now, |s| s.due_at);

        let (mut due, mut later): (Vec<&Card>, Vec<&Card>) =
            cards.iter().partition(|card| due_at(*card) <= now);
        due.sort_by_key(|card| due_at(*card));
        later.sort_by_key(|card| due_at(*card));
        (due, later)
    }

    fn persist(&self) {
        if let Err(e) = save_json(self.store.as_ref(), SCHEDULE_KEY, &self.states) {
            tracing::warn!(error = %e, "failed to persist schedule states");
        }
    }
}
