//! Quiz configuration.
//!
//! Defaults match the shipped game. Every field can be overridden from the
//! environment, which is how the terminal binary is configured.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

/// Storage key of the ranking. Renaming it is the only way to change schema.
pub const DEFAULT_RANKING_KEY: &str = "quizNumberRanking";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A variable held something that is not a number.
    #[error("{var} must be a number, got {value:?}")]
    NotANumber {
        /// Variable name
        var: &'static str,
        /// Raw value
        value: String,
    },
    /// A duration was configured as zero.
    #[error("{0} must be greater than zero")]
    Zero(&'static str),
}

/// Configuration for the round engine and its driver.
#[derive(Debug, Clone)]
pub struct QuizConfig {
    /// Time allowed per question.
    pub time_limit: Duration,
    /// How long an outcome stays on screen before the game moves on.
    pub result_display: Duration,
    /// Period of the countdown timer tick.
    pub tick_interval: Duration,
    /// Store key holding the ranking.
    pub ranking_key: String,
    /// File backing the key-value store.
    pub store_path: PathBuf,
    /// Fixed RNG seed. `None` draws one from the OS.
    pub seed: Option<u64>,
    /// Link appended to shared results.
    pub share_url: String,
}

impl Default for QuizConfig {
    fn default() -> Self {
        Self {
            time_limit: Duration::from_secs(10),
            result_display: Duration::from_millis(1000),
            tick_interval: Duration::from_millis(50),
            ranking_key: DEFAULT_RANKING_KEY.to_string(),
            store_path: PathBuf::from("quiz-number-store.json"),
            seed: None,
            share_url: "https://github.com/your-org/quiz-number".to_string(),
        }
    }
}

impl QuizConfig {
    /// Create config from environment variables.
    ///
    /// Unset variables keep their default.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Create config from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(secs) = parse_var::<u64>(&lookup, "QUIZ_TIME_LIMIT_SECS")? {
            config.time_limit = nonzero("QUIZ_TIME_LIMIT_SECS", Duration::from_secs(secs))?;
        }
        if let Some(ms) = parse_var::<u64>(&lookup, "QUIZ_RESULT_DISPLAY_MS")? {
            config.result_display = Duration::from_millis(ms);
        }
        if let Some(ms) = parse_var::<u64>(&lookup, "QUIZ_TICK_MS")? {
            config.tick_interval = nonzero("QUIZ_TICK_MS", Duration::from_millis(ms))?;
        }
        if let Some(key) = lookup("QUIZ_RANKING_KEY").filter(|k| !k.is_empty()) {
            config.ranking_key = key;
        }
        if let Some(path) = lookup("QUIZ_STORE_PATH").filter(|p| !p.is_empty()) {
            config.store_path = PathBuf::from(path);
        }
        config.seed = parse_var::<u64>(&lookup, "QUIZ_SEED")?;
        if let Some(url) = lookup("QUIZ_SHARE_URL") {
            config.share_url = url;
        }

        Ok(config)
    }
}

fn parse_var<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
) -> Result<Option<T>, ConfigError> {
    match lookup(var) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::NotANumber { var, value }),
    }
}

fn nonzero(var: &'static str, value: Duration) -> Result<Duration, ConfigError> {
    if value.is_zero() {
        Err(ConfigError::Zero(var))
    } else {
        Ok(value)
    }
}
