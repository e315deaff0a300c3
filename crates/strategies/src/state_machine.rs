use crate::confirmation::{Confirmation, ConfirmationFilter};
use crate::crossover::CrossoverDetector;
use crate::error::StrategyError;
use core_types::transitions;
use core_types::{
    ConfirmationInputs, Crossover, CycleInputs, Position, RatioObservation, SignalRecord,
    SignalState, SignalType,
};

/// The result of one decision cycle: the record to publish and the state to
/// persist. Nothing has been written anywhere yet.
#[derive(Debug, Clone, PartialEq)]
pub struct Decision {
    pub crossover: Crossover,
    pub record: SignalRecord,
    pub next_state: SignalState,
}

impl Decision {
    /// The position held after the cycle.
    pub fn position(&self) -> Position {
        self.record.to
    }

    pub fn is_actionable(&self) -> bool {
        self.record.is_actionable()
    }
}

enum Step {
    Move {
        to: Position,
        signal_type: SignalType,
        reason: String,
    },
    Stay {
        reason: String,
    },
}

/// Owns the per-cycle rules for moving between `CASH`, `QQQ` and `SPY`.
///
/// Exits are evaluated before entries and a cycle moves at most one edge, so a
/// switch between the two legs always takes two cycles. With a
/// [`ConfirmationFilter`] attached, entries additionally need confirmation and
/// exits can be forced by the indicators; the transition table is the same.
#[derive(Debug, Clone, Default)]
pub struct PositionStateMachine {
    filter: Option<ConfirmationFilter>,
}

impl PositionStateMachine {
    pub fn new() -> Self {
        Self { filter: None }
    }

    pub fn with_confirmation(filter: ConfirmationFilter) -> Self {
        Self {
            filter: Some(filter),
        }
    }

    /// `(inputs, prior) -> (next_state, record)`. Pure apart from logging.
    pub fn evaluate(
        &self,
        inputs: &CycleInputs,
        prior: &SignalState,
    ) -> Result<Decision, StrategyError> {
        let observation = &inputs.observation;
        observation.validate()?;

        let current_above = observation.is_above();
        let mut detector = CrossoverDetector::resume(prior);
        let crossover = detector.observe(current_above);
        let held = prior.current_position();

        tracing::debug!(
            ratio = observation.ratio,
            threshold = observation.threshold,
            ?crossover,
            %held,
            trend_ok = inputs.secondary_trend_ok,
            "Evaluating cycle"
        );

        let confirmation = self.usable_confirmation(inputs);
        let step = if held.is_cash() {
            self.evaluate_entry(observation, crossover, inputs.secondary_trend_ok, confirmation)
        } else {
            self.evaluate_exit(held, crossover, inputs.secondary_trend_ok, confirmation)
        };

        let mut next_state = *prior;
        next_state.observe(current_above, observation.timestamp);

        let record = match step {
            Step::Move {
                to,
                signal_type,
                reason,
            } => {
                transitions::ensure_allowed(held, to)?;
                next_state.hold(to, observation.timestamp);
                tracing::info!(%held, %to, %signal_type, %reason, "Position transition decided");
                SignalRecord::new(signal_type, held, to, reason, crossover, observation)
            }
            Step::Stay { reason } => {
                tracing::debug!(%held, %reason, "Position unchanged");
                SignalRecord::new(SignalType::None, held, held, reason, crossover, observation)
            }
        };

        Ok(Decision {
            crossover,
            record,
            next_state,
        })
    }

    /// Without a filter nothing is needed. With one, unusable inputs are logged
    /// and treated as "not confirmed".
    fn usable_confirmation<'a>(&self, inputs: &'a CycleInputs) -> Option<&'a ConfirmationInputs> {
        let filter = self.filter.as_ref()?;
        match filter.usable(inputs.confirmation.as_ref()) {
            Ok(confirmation) => Some(confirmation),
            Err(e) => {
                tracing::warn!(error = %e, "Confirmation unavailable; entries fail closed");
                None
            }
        }
    }

    fn evaluate_exit(
        &self,
        held: Position,
        crossover: Crossover,
        trend_ok: bool,
        confirmation: Option<&ConfirmationInputs>,
    ) -> Step {
        let exit = |reason: String| Step::Move {
            to: Position::Cash,
            signal_type: SignalType::Exit,
            reason,
        };

        // Crossover and trend-break exits are never gated by confirmation.
        match held {
            Position::Qqq if crossover == Crossover::Down => {
                return exit("N crossed below V, selling QQQ".to_string());
            }
            Position::Spy if crossover == Crossover::Up => {
                return exit("N crossed above V, selling SPY".to_string());
            }
            Position::Spy if !trend_ok => {
                return exit("SPY lost its long-term trend, selling SPY".to_string());
            }
            alternative if alternative.is_alternative() => {
                return Step::Stay {
                    reason: format!("holding {alternative}, no automatic exit"),
                };
            }
            _ => {}
        }

        if let (Some(filter), Some(inputs)) = (&self.filter, confirmation) {
            if let Some(reason) = filter.forced_exit(held, inputs) {
                return exit(format!("{reason}, selling {held}"));
            }
        }

        Step::Stay {
            reason: format!("holding {held}, no exit condition met"),
        }
    }

    fn evaluate_entry(
        &self,
        observation: &RatioObservation,
        crossover: Crossover,
        trend_ok: bool,
        confirmation: Option<&ConfirmationInputs>,
    ) -> Step {
        let (target, reason) = if crossover == Crossover::Up {
            (Position::Qqq, "N crossed above V, buying QQQ")
        } else if !observation.is_above() && trend_ok {
            (Position::Spy, "N at or below V with SPY in an uptrend, buying SPY")
        } else {
            return Step::Stay {
                reason: "in cash, no entry condition met".to_string(),
            };
        };

        if let Some(filter) = &self.filter {
            let verdict = match confirmation {
                Some(inputs) => filter.confirm_entry(target, inputs),
                None => Confirmation::Rejected("confirmation data unavailable".to_string()),
            };
            if let Confirmation::Rejected(why) = verdict {
                return Step::Stay {
                    reason: format!("entry into {target} not confirmed: {why}"),
                };
            }
        }

        Step::Move {
            to: target,
            signal_type: SignalType::Entry,
            reason: reason.to_string(),
        }
    }
}
