use crate::confirmation::ConfirmationFilter;
use crate::error::StrategyError;
use crate::state_machine::{Decision, PositionStateMachine};
use crate::Strategy;
use configuration::ConfirmationParams;
use core_types::{CycleInputs, SignalState, StrategyId};

/// The ratio-threshold policy with multi-factor confirmation.
///
/// Entries need RSI, trend and fear score to agree; exits fire on the plain
/// crossover/trend rules and can additionally be forced by extreme readings.
/// Missing or malformed confirmation inputs block entries only.
#[derive(Debug, Clone)]
pub struct EnhancedRatioThreshold {
    machine: PositionStateMachine,
}

impl EnhancedRatioThreshold {
    pub fn new(params: ConfirmationParams) -> Result<Self, StrategyError> {
        let filter = ConfirmationFilter::new(params)?;
        Ok(Self {
            machine: PositionStateMachine::with_confirmation(filter),
        })
    }
}

impl Strategy for EnhancedRatioThreshold {
    fn id(&self) -> StrategyId {
        StrategyId::EnhancedRatioThreshold
    }

    fn evaluate(&self, inputs: &CycleInputs, prior: &SignalState) -> Result<Decision, StrategyError> {
        self.machine.evaluate(inputs, prior)
    }
}
