pub mod config;
pub mod error;
pub mod models;
pub mod session;
pub mod spaced_repetition;
pub mod storage;
pub mod study_service;

pub use config::SessionConfig;
pub use error::{ConfigError, RecordError, SessionError, StoreError};
pub use models::{
    Card, CardDraft, Difficulty, GradingResponse, IntervalPreview, Partition, Progress, ReviewStats, SessionKind,
    SessionSnapshot, SessionStats,
};
pub use session::SessionManager;
pub use spaced_repetition::SpacedRepetition;
pub use storage::{CardRecord, CardStore, MemoryStore, RawTimestamp};
pub use study_service::StudyService;
