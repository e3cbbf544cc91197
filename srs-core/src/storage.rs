use crate::error::{RecordError, StoreError};
use crate::models::{Card, DEFAULT_EASE_FACTOR};
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Where session cards come from and where graded cards go.
pub trait CardStore: Send {
    fn load_cards_for_deck(&self, deck_id: &str) -> Result<Vec<Card>, StoreError>;

    fn persist(&self, card: &Card) -> Result<(), StoreError>;
}

impl<T: CardStore + Sync> CardStore for Arc<T> {
    fn load_cards_for_deck(&self, deck_id: &str) -> Result<Vec<Card>, StoreError> {
        (**self).load_cards_for_deck(deck_id)
    }

    fn persist(&self, card: &Card) -> Result<(), StoreError> {
        (**self).persist(card)
    }
}

/// A timestamp as older app versions wrote it: ISO string or epoch milliseconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawTimestamp {
    Millis(i64),
    Text(String),
}

impl RawTimestamp {
    fn parse(&self, card_id: &str, field: &'static str) -> Result<DateTime<Utc>, RecordError> {
        let parsed = match self {
            RawTimestamp::Millis(ms) => Utc.timestamp_millis_opt(*ms).single(),
            RawTimestamp::Text(text) => DateTime::parse_from_rfc3339(text).ok().map(|dt| dt.with_timezone(&Utc)),
        };

        parsed.ok_or_else(|| RecordError::Timestamp {
            card_id: card_id.to_string(),
            field,
            value: match self {
                RawTimestamp::Millis(ms) => ms.to_string(),
                RawTimestamp::Text(text) => text.clone(),
            },
        })
    }
}

/// A stored card before validation. Records written by older versions may lack
/// scheduling fields entirely.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CardRecord {
    pub id: String,
    pub deck_id: String,
    pub front: String,
    pub back: String,
    pub ease_factor: Option<f64>,
    pub interval: Option<i64>,
    pub repetitions: Option<u32>,
    pub last_reviewed: Option<RawTimestamp>,
    pub next_review: Option<RawTimestamp>,
    pub is_new: Option<bool>,
    pub skip_count: Option<u32>,
}

impl CardRecord {
    pub fn into_card(self, now: DateTime<Utc>) -> Result<Card, RecordError> {
        if self.id.is_empty() {
            return Err(RecordError::MissingId);
        }

        let last_reviewed = self
            .last_reviewed
            .as_ref()
            .map(|ts| ts.parse(&self.id, "lastReviewed"))
            .transpose()?;
        let next_review = self
            .next_review
            .as_ref()
            .map(|ts| ts.parse(&self.id, "nextReview"))
            .transpose()?;

        let repetitions = self.repetitions.unwrap_or(0);
        let is_new = self
            .is_new
            .unwrap_or(repetitions == 0 && last_reviewed.is_none());

        let card = Card {
            id: self.id,
            deck_id: self.deck_id,
            front: self.front,
            back: self.back,
            ease_factor: self.ease_factor.unwrap_or(DEFAULT_EASE_FACTOR),
            interval: self.interval.unwrap_or(1),
            repetitions,
            last_reviewed: last_reviewed.unwrap_or(now),
            next_review: next_review.unwrap_or(now),
            is_new,
            skip_count: self.skip_count.unwrap_or(0),
        };
        Ok(card.normalized())
    }
}

/// In-memory card store keyed by deck, then card id.
#[derive(Debug, Default)]
pub struct MemoryStore {
    decks: Mutex<HashMap<String, HashMap<String, Card>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cards(cards: impl IntoIterator<Item = Card>) -> Self {
        let mut decks: HashMap<String, HashMap<String, Card>> = HashMap::new();
        for card in cards {
            decks.entry(card.deck_id.clone()).or_default().insert(card.id.clone(), card);
        }
        MemoryStore {
            decks: Mutex::new(decks),
        }
    }

    /// Build a store from raw records. Any invalid record fails the whole load.
    pub fn from_records(records: Vec<CardRecord>, now: DateTime<Utc>) -> Result<Self, StoreError> {
        let cards = records
            .into_iter()
            .map(|record| record.into_card(now))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::with_cards(cards))
    }

    pub fn from_json(json: &str, now: DateTime<Utc>) -> Result<Self, StoreError> {
        let records: Vec<CardRecord> = serde_json::from_str(json)?;
        Self::from_records(records, now)
    }

    pub fn get_card(&self, deck_id: &str, card_id: &str) -> Result<Option<Card>, StoreError> {
        let decks = self.lock()?;
        Ok(decks.get(deck_id).and_then(|cards| cards.get(card_id)).cloned())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, HashMap<String, Card>>>, StoreError> {
        self.decks
            .lock()
            .map_err(|_| StoreError::Backend("Failed to lock cards".to_string()))
    }
}

impl CardStore for MemoryStore {
    fn load_cards_for_deck(&self, deck_id: &str) -> Result<Vec<Card>, StoreError> {
        let decks = self.lock()?;
        let mut cards: Vec<Card> = decks
            .get(deck_id)
            .map(|cards| cards.values().cloned().collect())
            .unwrap_or_default();
        cards.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(cards)
    }

    fn persist(&self, card: &Card) -> Result<(), StoreError> {
        let mut decks = self.lock()?;
        decks
            .entry(card.deck_id.clone())
            .or_default()
            .insert(card.id.clone(), card.clone());
        Ok(())
    }
}
