use crate::error::StrategyError;
use configuration::ConfirmationParams;
use core_types::{ConfirmationInputs, Position, Trend};

/// Outcome of an entry confirmation.
#[derive(Debug, Clone, PartialEq)]
pub enum Confirmation {
    Confirmed,
    Rejected(String),
}

/// Multi-factor gate built from RSI, trend direction and the fear score.
///
/// It only ever restricts: entries need every factor to agree, and exits may be
/// forced early. It never proposes a target of its own.
#[derive(Debug, Clone)]
pub struct ConfirmationFilter {
    params: ConfirmationParams,
}

impl ConfirmationFilter {
    pub fn new(params: ConfirmationParams) -> Result<Self, StrategyError> {
        params
            .validate()
            .map_err(|e| StrategyError::InvalidParameters(e.to_string()))?;
        Ok(Self { params })
    }

    /// Returns the inputs only if they are present and well-formed.
    pub fn usable<'a>(
        &self,
        inputs: Option<&'a ConfirmationInputs>,
    ) -> Result<&'a ConfirmationInputs, StrategyError> {
        let inputs = inputs.ok_or_else(|| {
            StrategyError::ConfirmationDataMissing("no confirmation inputs supplied".to_string())
        })?;
        inputs
            .validate()
            .map_err(|e| StrategyError::ConfirmationDataMissing(e.to_string()))?;
        Ok(inputs)
    }

    /// Entry into `target` needs the relevant RSI below the overbought line, the
    /// relevant trend rising, and the fear score inside the non-extreme band.
    pub fn confirm_entry(&self, target: Position, inputs: &ConfirmationInputs) -> Confirmation {
        let Some((rsi, trend)) = inputs.readings_for(target) else {
            return Confirmation::Rejected(format!("no confirmation readings for {target}"));
        };

        if rsi >= self.params.entry_rsi_max {
            return Confirmation::Rejected(format!(
                "{target} RSI {rsi:.1} is overbought (>= {:.0})",
                self.params.entry_rsi_max
            ));
        }
        if trend != Trend::Rising {
            return Confirmation::Rejected(format!("{target} trend is {trend:?}, not rising"));
        }
        let fear = inputs.fear_score;
        if fear < self.params.fear_entry_min || fear > self.params.fear_entry_max {
            return Confirmation::Rejected(format!(
                "fear score {fear:.0} is outside {:.0}..={:.0}",
                self.params.fear_entry_min, self.params.fear_entry_max
            ));
        }
        Confirmation::Confirmed
    }

    /// An exit forced by the indicators alone, independent of any crossover.
    pub fn forced_exit(&self, held: Position, inputs: &ConfirmationInputs) -> Option<String> {
        let (rsi, trend) = inputs.readings_for(held)?;

        if rsi > self.params.exit_rsi_extreme {
            return Some(format!(
                "{held} RSI {rsi:.1} is extremely overbought (> {:.0})",
                self.params.exit_rsi_extreme
            ));
        }
        if trend == Trend::Falling {
            return Some(format!("{held} trend turned falling"));
        }
        if inputs.fear_score > self.params.exit_fear_extreme {
            return Some(format!(
                "fear score {:.0} signals extreme greed (> {:.0})",
                inputs.fear_score, self.params.exit_fear_extreme
            ));
        }
        None
    }
}
