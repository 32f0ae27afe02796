//! Persistent, deduplicated card collection.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use opdeck_core::Card;

use crate::db::schema::CARDS_KEY;
use crate::db::{load_json, save_json, BlobStore, StoreError};

pub struct CardStore {
    store: Arc<dyn BlobStore>,
    cards: Vec<Card>,
}

impl CardStore {
    pub fn open(store: Arc<dyn BlobStore>) -> Result<Self, StoreError> {
        let cards = load_json(store.as_ref(), CARDS_KEY)?.unwrap_or_default();
        Ok(Self { store, cards })
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Card> {
        self.cards.iter()
    }

    pub fn as_slice(&self) -> &[Card] {
        &self.cards
    }

    pub fn get(&self, id: &str) -> Option<&Card> {
        self.cards.iter().rev().find(|c| c.id == id)
    }

    /// Ids currently stored. Rebuilt on every call, never accumulated.
    pub fn ids(&self) -> HashSet<String> {
        self.cards.iter().map(|c| c.id.clone()).collect()
    }

    /// Append cards and write the collection through. Returns how many were added.
    pub fn commit(&mut self, cards: Vec<Card>) -> usize {
        if cards.is_empty() {
            return 0;
        }
        let added = cards.len();
        self.cards.extend(cards);
        self.persist();
        added
    }

    /// Collapse duplicate ids, keeping the most recently written record in
    /// the slot where the id first appeared. Returns how many were removed.
    pub fn dedupe(&mut self) -> usize {
        let mut latest: HashMap<&str, usize> = HashMap::new();
        for (index, card) in self.cards.iter().enumerate() {
            latest.insert(card.id.as_str(), index);
        }
        if latest.len() == self.cards.len() {
            return 0;
        }

        let mut seen = HashSet::new();
        let deduped: Vec<Card> = self
            .cards
            .iter()
            .filter(|card| seen.insert(card.id.as_str()))
            .map(|card| self.cards[latest[card.id.as_str()]].clone())
            .collect();

        let removed = self.cards.len() - deduped.len();
        self.cards = deduped;
        self.persist();
        removed
    }

    /// Shrink to at most `limit` cards, evicting the least reviewed first and
    /// the oldest among equally reviewed cards. Returns the evicted cards.
    pub fn retain_within<F>(&mut self, limit: usize, attempts_of: F) -> Vec<Card>
    where
        F: Fn(&str) -> u32,
    {
        if self.cards.len() <= limit {
            return Vec::new();
        }
        let excess = self.cards.len() - limit;

        let mut ranked: Vec<(u32, usize)> = self
            .cards
            .iter()
            .enumerate()
            .map(|(index, card)| (attempts_of(&card.id), index))
            .collect();
        ranked.sort_unstable();
        let doomed: HashSet<usize> = ranked.into_iter().take(excess).map(|(_, i)| i).collect();

        let mut evicted = Vec::with_capacity(excess);
        let mut kept = Vec::with_capacity(limit);
        for (index, card) in std::mem::take(&mut self.cards).into_iter().enumerate() {
            if doomed.contains(&index) {
                evicted.push(card);
            } else {
                kept.push(card);
            }
        }
        self.cards = kept;
        self.persist();

        tracing::info!(evicted = evicted.len(), limit, "evicted cards over retention limit");
        evicted
    }

    fn persist(&self) {
        if let Err(e) = save_json(self.store.as_ref(), CARDS_KEY, &self.cards) {
            tracing::warn!(error = %e, "failed to persist card collection");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryBlobStore;
    use opdeck_core::TitleVariants;
    use pretty_assertions::assert_eq;

    fn card(catalog_id: i64, sequence: u32, song: &str) -> Card {
        Card {
            id: opdeck_core::card_id(catalog_id, sequence),
            catalog_id,
            title: TitleVariants::new(Some(format!("Show {catalog_id}")), None, None),
            season: None,
            year: None,
            sequence,
            song_title: song.to_string(),
            artists: Vec::new(),
            media_url: None,
        }
    }

    fn open() -> (Arc<dyn BlobStore>, CardStore) {
        let store: Arc<dyn BlobStore> = Arc::new(MemoryBlobStore::new());
        let cards = CardStore::open(store.clone()).unwrap();
        (store, cards)
    }

    #[test]
    fn commit_writes_through() {
        let (store, mut cards) = open();
        assert_eq!(cards.commit(vec![card(1, 1, "a"), card(2, 1, "b")]), 2);
        assert_eq!(cards.commit(Vec::new()), 0);

        let reopened = CardStore::open(store).unwrap();
        assert_eq!(reopened.len(), 2);
        assert_eq!(reopened.ids(), cards.ids());
    }

    #[test]
    fn dedupe_keeps_latest_record_in_first_slot() {
        let (_, mut cards) = open();
        cards.commit(vec![card(1, 1, "old"), card(2, 1, "b"), card(1, 1, "new")]);

        assert_eq!(cards.dedupe(), 1);
        let songs: Vec<&str> = cards.iter().map(|c| c.song_title.as_str()).collect();
        assert_eq!(songs, vec!["new", "b"]);
        assert_eq!(cards.dedupe(), 0);
        assert_eq!(cards.get("1::OP1").unwrap().song_title, "new");
    }

    #[test]
    fn retention_evicts_least_reviewed_then_oldest() {
        let (_, mut cards) = open();
        cards.commit(vec![
            card(1, 1, "a"),
            card(2, 1, "b"),
            card(3, 1, "c"),
            card(4, 1, "d"),
        ]);
        let attempts = |id: &str| match id {
            "1::OP1" => 5,
            "3::OP1" => 2,
            _ => 0,
        };

        let evicted = cards.retain_within(2, attempts);
        let evicted: Vec<&str> = evicted.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(evicted, vec!["2::OP1", "4::OP1"]);
        let kept: Vec<&str> = cards.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(kept, vec!["1::OP1", "3::OP1"]);
    }

    #[test]
    fn retention_within_limit_is_a_no_op() {
        let (_, mut cards) = open();
        cards.commit(vec![card(1, 1, "a")]);
        assert!(cards.retain_within(5, |_| 0).is_empty());
        assert_eq!(cards.len(), 1);
    }
}
