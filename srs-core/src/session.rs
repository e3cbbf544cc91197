//! Study session queue.
//!
//! A session owns an ordered queue of cards. The card at the front is the one
//! being shown; it leaves the queue only once it has been graded or skipped.
//! Failed and hard cards are put back a few positions ahead so they come up
//! again before the session ends.

use crate::config::SessionConfig;
use crate::error::{ConfigError, SessionError};
use crate::models::{
    Card, Difficulty, GradingResponse, Partition, Progress, SessionKind, SessionSnapshot, SessionStats,
};
use crate::spaced_repetition::SpacedRepetition;
use crate::storage::CardStore;
use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

pub type ChangeCallback = Box<dyn FnMut(&SessionSnapshot) + Send>;

pub struct SessionManager<S, R = StdRng> {
    store: S,
    config: SessionConfig,
    rng: R,
    clock: fn() -> DateTime<Utc>,
    queue: Vec<Card>,
    stats: SessionStats,
    missed: Vec<Card>,
    kind: SessionKind,
    on_change: Option<ChangeCallback>,
}

impl<S: CardStore> SessionManager<S, StdRng> {
    pub fn new(store: S, config: SessionConfig) -> Result<Self, ConfigError> {
        Self::with_rng(store, config, StdRng::from_entropy())
    }
}

impl<S: CardStore, R: Rng> SessionManager<S, R> {
    /// Fails when `config` would make the reinsertion or skip arithmetic
    /// meaningless (zero divisors, an empty skip window).
    pub fn with_rng(store: S, config: SessionConfig, rng: R) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(SessionManager {
            store,
            config,
            rng,
            clock: Utc::now,
            queue: Vec::new(),
            stats: SessionStats::default(),
            missed: Vec::new(),
            kind: SessionKind::Regular,
            on_change: None,
        })
    }

    pub fn with_clock(mut self, clock: fn() -> DateTime<Utc>) -> Self {
        self.clock = clock;
        self
    }

    pub fn set_on_change(&mut self, callback: impl FnMut(&SessionSnapshot) + Send + 'static) {
        self.on_change = Some(Box::new(callback));
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn now(&self) -> DateTime<Utc> {
        (self.clock)()
    }

    /// Build a regular session from `pool`: every due card plus enough new cards
    /// to reach `max_cards`, shuffled together.
    pub fn start_session(&mut self, pool: Vec<Card>, max_cards: usize) {
        let now = self.now();
        let pool: Vec<Card> = pool.into_iter().map(Card::normalized).collect();
        let Partition { due, new } = SpacedRepetition::partition(&pool, now);

        let new_limit = max_cards.saturating_sub(due.len());
        let due_count = due.len();
        let new_count = new.len().min(new_limit);

        let mut queue = due;
        queue.extend(new.into_iter().take(new_limit));
        queue.shuffle(&mut self.rng);
        queue.truncate(max_cards);

        log::info!(
            "Starting session with {} cards ({} due, {} new, cap {})",
            queue.len(),
            due_count,
            new_count,
            max_cards
        );

        self.stats = SessionStats::new(queue.len());
        self.queue = queue;
        self.missed.clear();
        self.kind = SessionKind::Regular;
        self.notify();
    }

    /// Replay the cards missed in the last session, in the order they were missed.
    /// Returns false and leaves the current session alone when nothing was missed.
    pub fn start_missed_cards_review(&mut self) -> bool {
        if self.missed.is_empty() {
            log::debug!("No missed cards to review");
            return false;
        }

        log::info!("Starting review of {} missed cards", self.missed.len());
        self.queue = self.missed.clone();
        self.stats = SessionStats::new(self.queue.len());
        self.kind = SessionKind::MissedReview;
        self.notify();
        true
    }

    /// Grade the current card. The session advances even when persisting the
    /// graded card fails; the store error is handed back to the caller.
    pub fn process_response(&mut self, card: &Card, response: GradingResponse) -> Result<Option<Card>, SessionError> {
        if !self.is_current(card, "process_response") {
            return Ok(None);
        }

        let current = self.queue.remove(0);
        let updated = SpacedRepetition::update_card(&current, &response, self.now());
        let persisted = self.store.persist(&updated);
        if let Err(err) = &persisted {
            log::error!("Failed to persist card {}: {}", updated.id, err);
        }

        if !response.correct {
            self.record_missed(&updated);
        }

        if let Some(delay) = self.reappearance_delay(&response) {
            let position = delay.min(self.queue.len());
            log::debug!("Card {} reappears at position {}", updated.id, position);
            self.queue.insert(position, updated.clone());
        }

        self.stats.completed_card_ids.insert(updated.id.clone());
        if response.correct {
            self.stats.correct_count += 1;
        } else {
            self.stats.incorrect_count += 1;
        }

        self.notify();
        persisted.map_err(SessionError::Persist)?;
        Ok(Some(updated))
    }

    /// Defer the current card without grading it.
    pub fn mark_card_later(&mut self, card: &Card) {
        if !self.is_current(card, "mark_card_later") {
            return;
        }

        let mut skipped = self.queue.remove(0);
        skipped.skip_count += 1;

        let position = if skipped.skip_count >= self.config.skip_limit {
            self.queue.len()
        } else {
            let offset = self
                .rng
                .gen_range(self.config.skip_window_min..self.config.skip_window_max);
            offset.min(self.queue.len())
        };

        log::debug!(
            "Card {} skipped ({} times), moved to position {}",
            skipped.id,
            skipped.skip_count,
            position
        );
        self.queue.insert(position, skipped);
        self.notify();
    }

    /// Drop the session. Returns its stats if one was running; missed cards are kept.
    pub fn end_session(&mut self) -> Option<SessionStats> {
        let had_session = !self.queue.is_empty() || self.stats.total_cards > 0;
        self.queue.clear();
        let stats = std::mem::take(&mut self.stats);
        self.kind = SessionKind::Regular;
        self.notify();

        if had_session {
            log::info!(
                "Session ended: {}/{} cards completed, {} correct, {} incorrect",
                stats.completed_card_ids.len(),
                stats.total_cards,
                stats.correct_count,
                stats.incorrect_count
            );
            Some(stats)
        } else {
            None
        }
    }

    pub fn is_active(&self) -> bool {
        !self.queue.is_empty()
    }

    pub fn current_card(&self) -> Option<&Card> {
        self.queue.first()
    }

    pub fn queue(&self) -> &[Card] {
        &self.queue
    }

    pub fn progress(&self) -> Progress {
        Progress::from_stats(&self.stats)
    }

    pub fn remaining_count(&self) -> usize {
        self.queue.len()
    }

    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    pub fn session_kind(&self) -> SessionKind {
        self.kind
    }

    pub fn has_missed_cards(&self) -> bool {
        !self.missed.is_empty()
    }

    pub fn missed_cards(&self) -> &[Card] {
        &self.missed
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            current_card_id: self.current_card().map(|card| card.id.clone()),
            progress: self.progress(),
            remaining: self.remaining_count(),
            kind: self.kind,
        }
    }

    /// Positions ahead (counted after the current card is removed) at which an
    /// answered card comes back. `None` means it is done for this session.
    fn reappearance_delay(&self, response: &GradingResponse) -> Option<usize> {
        let remaining = self.queue.len();
        if !response.correct {
            Some(
                self.config
                    .incorrect_max_delay
                    .min(remaining / self.config.incorrect_delay_divisor),
            )
        } else if response.difficulty == Difficulty::Hard {
            Some(self.config.hard_max_delay.min(remaining / self.config.hard_delay_divisor))
        } else {
            None
        }
    }

    fn record_missed(&mut self, card: &Card) {
        match self.missed.iter_mut().find(|missed| missed.id == card.id) {
            Some(existing) => *existing = card.clone(),
            None => self.missed.push(card.clone()),
        }
    }

    /// Callers must only act on the card currently shown.
    fn is_current(&self, card: &Card, operation: &str) -> bool {
        let current = self.queue.first();
        let is_current = matches!(current, Some(current) if current.id == card.id);
        if !is_current {
            log::warn!(
                "{} called for card {} but the current card is {:?}",
                operation,
                card.id,
                current.map(|c| c.id.as_str())
            );
        }
        debug_assert!(
            is_current,
            "{} called for card {} which is not the current card",
            operation,
            card.id
        );
        is_current
    }

    fn notify(&mut self) {
        if self.on_change.is_none() {
            return;
        }
        let snapshot = self.snapshot();
        if let Some(callback) = self.on_change.as_mut() {
            callback(&snapshot);
        }
    }
}
