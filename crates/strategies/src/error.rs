use core_types::{CoreError, Position};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum StrategyError {
    #[error("Strategy received invalid parameters: {0}")]
    InvalidParameters(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("An error occurred during indicator calculation: {0}")]
    IndicatorError(String),

    #[error("Decision proposed a forbidden transition from {from} to {to}")]
    InvalidTransition { from: Position, to: Position },

    /// Never returned from a cycle; the enhanced path logs it and fails closed.
    #[error("Confirmation data unavailable: {0}")]
    ConfirmationDataMissing(String),
}

impl From<CoreError> for StrategyError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::InvalidInput(field, detail) => {
                StrategyError::InvalidInput(format!("{field}: {detail}"))
            }
            CoreError::InvalidTransition { from, to } => {
                StrategyError::InvalidTransition { from, to }
            }
        }
    }
}
