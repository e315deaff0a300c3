use crate::error::StrategyError;
use crate::state_machine::{Decision, PositionStateMachine};
use crate::Strategy;
use core_types::{CycleInputs, SignalState, StrategyId};

/// The plain ratio-threshold policy: crossover plus the secondary trend gate.
#[derive(Debug, Clone, Default)]
pub struct RatioThreshold {
    machine: PositionStateMachine,
}

impl RatioThreshold {
    pub fn new() -> Self {
        Self {
            machine: PositionStateMachine::new(),
        }
    }
}

impl Strategy for RatioThreshold {
    fn id(&self) -> StrategyId {
        StrategyId::RatioThreshold
    }

    fn evaluate(&self, inputs: &CycleInputs, prior: &SignalState) -> Result<Decision, StrategyError> {
        self.machine.evaluate(inputs, prior)
    }
}
