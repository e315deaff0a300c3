use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    /// The cycle was aborted before anything was read or written.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The store failed; the cycle is not complete and nothing was published.
    #[error("Persistence error: {0}")]
    Persistence(#[from] database::DbError),

    #[error("Strategy error: {0}")]
    Strategy(#[from] strategies::StrategyError),

    /// No cached threshold is young enough to decide on.
    #[error("No threshold calculated in the last {max_age_hours} hours; refresh it first")]
    StaleThreshold { max_age_hours: i64 },
}
