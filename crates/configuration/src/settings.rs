use crate::error::ConfigError;
use core_types::StrategyId;
use serde::Deserialize;
use std::path::PathBuf;

/// The root configuration structure for the entire application.
///
/// Every field is required; nothing is probed for at call time.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub database: DatabaseSettings,
    pub strategy: StrategySettings,
    pub confirmation: ConfirmationParams,
    pub telegram: TelegramConfig,
    pub logging: LoggingConfig,
}

/// Where the signal state lives.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    /// A SQLite URL, e.g. `sqlite://marketflow.db` or `sqlite::memory:`.
    pub url: String,
    pub max_connections: u32,
}

/// Parameters of the ratio-threshold model and the policy that runs on it.
#[derive(Debug, Clone, Deserialize)]
pub struct StrategySettings {
    pub strategy_id: StrategyId,
    /// Number of trailing ratio observations averaged into the threshold `V`.
    pub threshold_window: usize,
    /// A stored threshold older than this is treated as absent.
    pub threshold_max_age_hours: i64,
}

/// Gates for the enhanced (multi-factor) evaluation path.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfirmationParams {
    /// Entries need the relevant RSI strictly below this (not overbought).
    pub entry_rsi_max: f64,
    /// A held instrument whose RSI is strictly above this is exited.
    pub exit_rsi_extreme: f64,
    /// Inclusive fear-score band inside which entries are allowed.
    pub fear_entry_min: f64,
    pub fear_entry_max: f64,
    /// A fear score strictly above this (extreme greed) forces an exit.
    pub exit_fear_extreme: f64,
}

/// Telegram credentials. Empty values disable alerting.
#[derive(Debug, Clone, Deserialize)]
pub struct TelegramConfig {
    pub token: String,
    pub chat_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Default `EnvFilter` directive when `RUST_LOG` is not set.
    pub level: String,
    pub directory: PathBuf,
    pub file_prefix: String,
}

impl Config {
    /// Checks that the loaded values are logical. Called once at startup.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database.url.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "database.url must not be empty".to_string(),
            ));
        }
        if self.database.max_connections == 0 {
            return Err(ConfigError::ValidationError(
                "database.max_connections must be at least 1".to_string(),
            ));
        }
        if self.strategy.threshold_window == 0 {
            return Err(ConfigError::ValidationError(
                "strategy.threshold_window must be at least 1".to_string(),
            ));
        }
        if self.strategy.threshold_max_age_hours <= 0 {
            return Err(ConfigError::ValidationError(
                "strategy.threshold_max_age_hours must be positive".to_string(),
            ));
        }
        self.confirmation.validate()?;
        if self.telegram.token.is_empty() != self.telegram.chat_id.is_empty() {
            return Err(ConfigError::ValidationError(
                "telegram.token and telegram.chat_id must be set together".to_string(),
            ));
        }
        if self.logging.file_prefix.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "logging.file_prefix must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

impl ConfirmationParams {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let bounded = [
            ("entry_rsi_max", self.entry_rsi_max),
            ("exit_rsi_extreme", self.exit_rsi_extreme),
            ("fear_entry_min", self.fear_entry_min),
            ("fear_entry_max", self.fear_entry_max),
            ("exit_fear_extreme", self.exit_fear_extreme),
        ];
        for (name, value) in bounded {
            if !(0.0..=100.0).contains(&value) {
                return Err(ConfigError::ValidationError(format!(
                    "confirmation.{name} must be between 0 and 100, got {value}"
                )));
            }
        }
        if self.entry_rsi_max > self.exit_rsi_extreme {
            return Err(ConfigError::ValidationError(
                "confirmation.entry_rsi_max must not exceed exit_rsi_extreme".to_string(),
            ));
        }
        if self.fear_entry_min > self.fear_entry_max {
            return Err(ConfigError::ValidationError(
                "confirmation.fear_entry_min must not exceed fear_entry_max".to_string(),
            ));
        }
        // A fear score that admits an entry must not also force the exit.
        if self.fear_entry_max > self.exit_fear_extreme {
            return Err(ConfigError::ValidationError(
                "confirmation.fear_entry_max must not exceed exit_fear_extreme".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for ConfirmationParams {
    fn default() -> Self {
        Self {
            entry_rsi_max: 70.0,
            exit_rsi_extreme: 80.0,
            fear_entry_min: 20.0,
            fear_entry_max: 80.0,
            exit_fear_extreme: 80.0,
        }
    }
}
