use crate::enums::Position;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    #[error("Invalid input for {0}: {1}")]
    InvalidInput(String, String),

    #[error("Transition from {from} to {to} is not allowed")]
    InvalidTransition { from: Position, to: Position },
}
