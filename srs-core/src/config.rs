use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Tuning for session ordering. Every field falls back to its default when absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub default_max_cards: usize,
    /// Skips at which a card is sent to the back of the queue.
    pub skip_limit: u32,
    pub skip_window_min: usize,
    /// Exclusive.
    pub skip_window_max: usize,
    pub incorrect_max_delay: usize,
    pub incorrect_delay_divisor: usize,
    pub hard_max_delay: usize,
    pub hard_delay_divisor: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            default_max_cards: 20,
            skip_limit: 3,
            skip_window_min: 3,
            skip_window_max: 10,
            incorrect_max_delay: 3,
            incorrect_delay_divisor: 4,
            hard_max_delay: 8,
            hard_delay_divisor: 2,
        }
    }
}

impl SessionConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: SessionConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a JSON file. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            log::debug!("No session config at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let reader = BufReader::new(File::open(path)?);
        let config: SessionConfig = serde_json::from_reader(reader)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.incorrect_delay_divisor == 0 || self.hard_delay_divisor == 0 {
            return Err(ConfigError::Invalid("delay divisors must be non-zero".to_string()));
        }
        if self.skip_window_min >= self.skip_window_max {
            return Err(ConfigError::Invalid(format!(
                "skip window [{}, {}) is empty",
                self.skip_window_min, self.skip_window_max
            )));
        }
        if self.skip_limit == 0 {
            return Err(ConfigError::Invalid("skip_limit must be at least 1".to_string()));
        }
        Ok(())
    }
}
