use crate::config::SessionConfig;
use crate::error::{ConfigError, SessionError};
use crate::models::{Card, CardDraft, GradingResponse, Progress, ReviewStats, SessionStats};
use crate::session::SessionManager;
use crate::spaced_repetition::SpacedRepetition;
use crate::storage::CardStore;
use std::sync::{Mutex, MutexGuard};

/// Shares one study session between threads. Each call holds the session lock
/// for its whole duration.
pub struct StudyService<S> {
    session: Mutex<SessionManager<S>>,
}

impl<S: CardStore> StudyService<S> {
    pub fn new(store: S, config: SessionConfig) -> Result<Self, ConfigError> {
        Ok(Self::from_manager(SessionManager::new(store, config)?))
    }

    pub fn from_manager(manager: SessionManager<S>) -> Self {
        StudyService {
            session: Mutex::new(manager),
        }
    }

    /// Load the deck and start a regular session. Uses the configured card cap
    /// when `max_cards` is not given.
    pub fn start_deck_session(&self, deck_id: &str, max_cards: Option<usize>) -> Result<Option<Card>, SessionError> {
        let mut session = self.lock()?;
        let pool = session
            .store()
            .load_cards_for_deck(deck_id)
            .map_err(SessionError::Load)?;
        let max_cards = max_cards.unwrap_or(session.config().default_max_cards);

        log::debug!("Loaded {} cards from deck {}", pool.len(), deck_id);
        session.start_session(pool, max_cards);
        Ok(session.current_card().cloned())
    }

    pub fn create_card(&self, draft: CardDraft) -> Result<Card, SessionError> {
        let session = self.lock()?;
        let card = SpacedRepetition::create_new_card(draft, session.now());
        session.store().persist(&card).map_err(SessionError::Persist)?;
        Ok(card)
    }

    /// Grade whatever card is currently shown. Returns the graded card, or
    /// `None` when no session is running.
    pub fn review_current(&self, response: GradingResponse) -> Result<Option<Card>, SessionError> {
        let mut session = self.lock()?;
        match session.current_card().cloned() {
            Some(current) => session.process_response(&current, response),
            None => Ok(None),
        }
    }

    /// Skip the current card and return the card shown next.
    pub fn skip_current(&self) -> Result<Option<Card>, SessionError> {
        let mut session = self.lock()?;
        if let Some(current) = session.current_card().cloned() {
            session.mark_card_later(&current);
        }
        Ok(session.current_card().cloned())
    }

    pub fn review_missed(&self) -> Result<bool, SessionError> {
        let mut session = self.lock()?;
        Ok(session.start_missed_cards_review())
    }

    pub fn end_session(&self) -> Result<Option<SessionStats>, SessionError> {
        let mut session = self.lock()?;
        Ok(session.end_session())
    }

    pub fn current_card(&self) -> Result<Option<Card>, SessionError> {
        let session = self.lock()?;
        Ok(session.current_card().cloned())
    }

    pub fn progress(&self) -> Result<Progress, SessionError> {
        let session = self.lock()?;
        Ok(session.progress())
    }

    pub fn remaining_count(&self) -> Result<usize, SessionError> {
        let session = self.lock()?;
        Ok(session.remaining_count())
    }

    pub fn missed_cards(&self) -> Result<Vec<Card>, SessionError> {
        let session = self.lock()?;
        Ok(session.missed_cards().to_vec())
    }

    pub fn deck_stats(&self, deck_id: &str) -> Result<ReviewStats, SessionError> {
        let session = self.lock()?;
        let cards = session
            .store()
            .load_cards_for_deck(deck_id)
            .map_err(SessionError::Load)?;
        Ok(SpacedRepetition::deck_stats(&cards, session.now()))
    }

    fn lock(&self) -> Result<MutexGuard<'_, SessionManager<S>>, SessionError> {
        self.session.lock().map_err(|_| SessionError::Lock)
    }
}
