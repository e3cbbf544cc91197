use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

pub const DEFAULT_EASE_FACTOR: f64 = 2.5;
pub const MIN_EASE_FACTOR: f64 = 1.3;
/// Longest interval a card can be scheduled out, in days.
pub const MAX_INTERVAL_DAYS: i64 = 36_500;

/// A flashcard with its scheduling state. Content fields are opaque to the scheduler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Card {
    pub id: String,
    pub deck_id: String,
    pub front: String,
    pub back: String,
    pub ease_factor: f64, // SM-2 ease factor
    pub interval: i64,    // days
    pub repetitions: u32,
    pub last_reviewed: DateTime<Utc>,
    pub next_review: DateTime<Utc>,
    pub is_new: bool,
    pub skip_count: u32,
}

impl Card {
    /// Coerce scheduling fields back inside their invariants.
    pub fn normalized(mut self) -> Self {
        self.ease_factor = self.ease_factor.max(MIN_EASE_FACTOR);
        if self.is_new {
            self.repetitions = 0;
        }
        self.interval = self.interval.clamp(1, MAX_INTERVAL_DAYS);
        self
    }
}

/// Content for a card that has not been scheduled yet.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CardDraft {
    pub id: Option<String>,
    pub deck_id: String,
    pub front: String,
    pub back: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Normal,
    Hard,
}

impl FromStr for Difficulty {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "easy" => Ok(Difficulty::Easy),
            "normal" => Ok(Difficulty::Normal),
            "hard" => Ok(Difficulty::Hard),
            _ => Err(format!("Invalid difficulty value: {}", value)),
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Difficulty::Easy => "easy",
            Difficulty::Normal => "normal",
            Difficulty::Hard => "hard",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GradingResponse {
    pub correct: bool,
    pub difficulty: Difficulty,
}

impl GradingResponse {
    pub fn correct(difficulty: Difficulty) -> Self {
        Self { correct: true, difficulty }
    }

    pub fn incorrect() -> Self {
        Self {
            correct: false,
            difficulty: Difficulty::Normal,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionStats {
    pub total_cards: usize,
    pub completed_card_ids: HashSet<String>,
    pub correct_count: usize,
    pub incorrect_count: usize,
}

impl SessionStats {
    pub fn new(total_cards: usize) -> Self {
        Self {
            total_cards,
            ..Self::default()
        }
    }

    pub fn accuracy(&self) -> f64 {
        let answered = self.correct_count + self.incorrect_count;
        if answered == 0 {
            0.0
        } else {
            self.correct_count as f64 / answered as f64
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    pub completed: usize,
    pub total: usize,
    pub percentage: u32,
}

impl Progress {
    pub fn from_stats(stats: &SessionStats) -> Self {
        let completed = stats.completed_card_ids.len();
        let total = stats.total_cards;
        let percentage = if total == 0 {
            0
        } else {
            ((completed as f64 / total as f64) * 100.0).round() as u32
        };
        Progress {
            completed,
            total,
            percentage,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SessionKind {
    #[default]
    Regular,
    MissedReview,
}

/// Passed to the session change callback after every mutation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSnapshot {
    pub current_card_id: Option<String>,
    pub progress: Progress,
    pub remaining: usize,
    pub kind: SessionKind,
}

#[derive(Debug, Default)]
pub struct Partition {
    pub due: Vec<Card>,
    pub new: Vec<Card>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntervalPreview {
    pub incorrect: i64,
    pub hard: i64,
    pub normal: i64,
    pub easy: i64,
}

#[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewStats {
    pub total_cards: usize,
    pub cards_due: usize,
    pub cards_new: usize,
    pub cards_learning: usize,
    pub cards_mature: usize,
}
