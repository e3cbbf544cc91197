use crate::models::{
    Card, CardDraft, Difficulty, GradingResponse, IntervalPreview, Partition, ReviewStats, DEFAULT_EASE_FACTOR,
    MAX_INTERVAL_DAYS, MIN_EASE_FACTOR,
};
use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

const MATURE_INTERVAL_DAYS: i64 = 21;

/// SM-2 spaced repetition algorithm implementation
pub struct SpacedRepetition;

impl SpacedRepetition {
    /// SM-2 quality for a correct answer. Incorrect answers never reach this mapping.
    pub fn quality(difficulty: Difficulty) -> u8 {
        match difficulty {
            Difficulty::Easy => 5,
            Difficulty::Normal => 4,
            Difficulty::Hard => 3,
        }
    }

    /// Compute the card's next scheduling state. The input card is left untouched.
    pub fn update_card(card: &Card, response: &GradingResponse, now: DateTime<Utc>) -> Card {
        let mut updated = card.clone();

        if response.correct {
            updated.repetitions += 1;

            let q = (5 - Self::quality(response.difficulty)) as f64;
            updated.ease_factor = (card.ease_factor + (0.1 - q * (0.08 + q * 0.02))).max(MIN_EASE_FACTOR);

            updated.interval = match updated.repetitions {
                1 => 1,
                2 => 6,
                _ => ((card.interval as f64 * updated.ease_factor).round() as i64).clamp(1, MAX_INTERVAL_DAYS),
            };
        } else {
            // Lapse: start over, make the card harder
            updated.repetitions = 0;
            updated.interval = 1;
            updated.ease_factor = (card.ease_factor - 0.2).max(MIN_EASE_FACTOR);
        }

        updated.is_new = false;
        updated.last_reviewed = now;
        updated.next_review = now + Duration::days(updated.interval);
        updated.skip_count = 0;
        updated
    }

    /// Check if a card is due for review. New cards are never due.
    pub fn is_due(card: &Card, now: DateTime<Utc>) -> bool {
        !card.is_new && card.next_review <= now
    }

    /// Split cards into due and new. Reviewed cards that are not yet due land in neither.
    pub fn partition(cards: &[Card], now: DateTime<Utc>) -> Partition {
        let mut partition = Partition::default();
        for card in cards {
            if card.is_new {
                partition.new.push(card.clone());
            } else if Self::is_due(card, now) {
                partition.due.push(card.clone());
            }
        }
        partition
    }

    pub fn create_new_card(draft: CardDraft, now: DateTime<Utc>) -> Card {
        Card {
            id: draft.id.unwrap_or_else(|| Uuid::new_v4().to_string()),
            deck_id: draft.deck_id,
            front: draft.front,
            back: draft.back,
            ease_factor: DEFAULT_EASE_FACTOR,
            interval: 1,
            repetitions: 0,
            last_reviewed: now,
            next_review: now, // Available immediately for first review
            is_new: true,
            skip_count: 0,
        }
    }

    /// Interval each possible answer would give, for labelling grading buttons.
    pub fn preview_intervals(card: &Card, now: DateTime<Utc>) -> IntervalPreview {
        let interval_for = |response: GradingResponse| Self::update_card(card, &response, now).interval;

        IntervalPreview {
            incorrect: interval_for(GradingResponse::incorrect()),
            hard: interval_for(GradingResponse::correct(Difficulty::Hard)),
            normal: interval_for(GradingResponse::correct(Difficulty::Normal)),
            easy: interval_for(GradingResponse::correct(Difficulty::Easy)),
        }
    }

    /// Calculate review statistics
    pub fn deck_stats(cards: &[Card], now: DateTime<Utc>) -> ReviewStats {
        let reviewed = || cards.iter().filter(|card| !card.is_new);

        ReviewStats {
            total_cards: cards.len(),
            cards_due: cards.iter().filter(|card| Self::is_due(card, now)).count(),
            cards_new: cards.iter().filter(|card| card.is_new).count(),
            cards_learning: reviewed().filter(|card| card.interval < MATURE_INTERVAL_DAYS).count(),
            cards_mature: reviewed().filter(|card| card.interval >= MATURE_INTERVAL_DAYS).count(),
        }
    }
}
