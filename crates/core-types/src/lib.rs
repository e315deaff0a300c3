pub mod enums;
pub mod error;
pub mod structs;
pub mod transitions;

// Re-export the core types to provide a clean public API.
pub use enums::{Crossover, Position, SignalType, StrategyId, Trend};
pub use error::CoreError;
pub use structs::{ConfirmationInputs, CycleInputs, RatioObservation, SignalRecord, SignalState};
