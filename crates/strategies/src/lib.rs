//! # MarketFlow Strategy Library
//!
//! This crate contains the decision logic of the system: the ratio-threshold model,
//! crossover detection, the position state machine and the multi-factor
//! confirmation filter.
//!
//! ## Architectural Principles
//!
//! - **Layer 1 Logic:** This is a pure logic crate. It has no knowledge of databases,
//!   notifications or scheduling. It depends only on `core-types` and `configuration`.
//! - **State In, State Out:** A strategy never keeps the previous observation itself.
//!   It receives the persisted `SignalState` and returns the next one inside a
//!   `Decision`, which the engine commits.
//!
//! ## Public API
//!
//! - `Strategy`: The trait both policies implement.
//! - `create_strategy`: The factory function to construct a strategy instance.
//! - `RatioThresholdModel`, `CrossoverDetector`, `PositionStateMachine`,
//!   `ConfirmationFilter`: the building blocks.

// Declare all the modules that constitute this crate.
pub mod confirmation;
pub mod crossover;
pub mod enhanced;
pub mod error;
pub mod factory;
pub mod ratio;
pub mod ratio_threshold;
pub mod state_machine;

// Re-export the key components to create a clean, public-facing API.
pub use confirmation::{Confirmation, ConfirmationFilter};
pub use crossover::CrossoverDetector;
pub use enhanced::EnhancedRatioThreshold;
pub use error::StrategyError;
pub use factory::create_strategy;
pub use ratio::{RatioThresholdModel, ThresholdSnapshot};
pub use ratio_threshold::RatioThreshold;
pub use state_machine::{Decision, PositionStateMachine};

// Re-export StrategyId from core_types
pub use core_types::StrategyId;

use core_types::{CycleInputs, SignalState};

/// The core trait that all decision policies must implement.
///
/// `evaluate` takes `&self`: everything a policy needs to remember between cycles
/// lives in the `SignalState` it is handed, so the same instance can be shared
/// by an engine behind an `Arc`.
pub trait Strategy: Send + Sync {
    fn id(&self) -> StrategyId;

    /// Decides one cycle.
    ///
    /// # Returns
    ///
    /// * `Ok(Decision)` - the record for this cycle and the state to persist, even
    ///   when nothing changes.
    /// * `Err(StrategyError)` - if the inputs are invalid or the decision would break
    ///   the transition table. Nothing should be persisted in that case.
    fn evaluate(&self, inputs: &CycleInputs, prior: &SignalState) -> Result<Decision, StrategyError>;
}
