// Declare the modules that make up this crate.
pub mod error;
pub mod settings;

pub use error::ConfigError;

// Re-export the core types to provide a clean public API.
pub use settings::{
    Config, ConfirmationParams, DatabaseSettings, LoggingConfig, StrategySettings, TelegramConfig,
};

/// Loads the application configuration from the `config.toml` file.
///
/// Values can be overridden with environment variables such as
/// `MARKETFLOW__TELEGRAM__TOKEN`. The result is validated before it is returned.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from("config.toml")
}

/// Same as [`load_config`] but reads the given file.
pub fn load_config_from(path: &str) -> Result<Config, ConfigError> {
    let builder = config::Config::builder()
        .add_source(config::File::with_name(path))
        .add_source(
            config::Environment::with_prefix("MARKETFLOW")
                .prefix_separator("__")
                .separator("__"),
        )
        .build()?;

    finish(builder)
}

/// Parses a TOML document directly. Useful for embedding a default config.
pub fn parse_config(toml: &str) -> Result<Config, ConfigError> {
    let builder = config::Config::builder()
        .add_source(config::File::from_str(toml, config::FileFormat::Toml))
        .build()?;

    finish(builder)
}

fn finish(builder: config::Config) -> Result<Config, ConfigError> {
    // Attempt to deserialize the entire configuration into our `Config` struct
    let config = builder.try_deserialize::<Config>()?;
    config.validate()?;
    tracing::debug!(strategy = ?config.strategy.strategy_id, "Configuration loaded");
    Ok(config)
}
