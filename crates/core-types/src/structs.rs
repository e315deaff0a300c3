use crate::enums::{Crossover, Position, SignalType, Trend};
use crate::error::CoreError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The ratio `N` of the two reference instruments at one point in time, together
/// with the threshold `V` it is compared against. `V` is constant within a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RatioObservation {
    pub timestamp: DateTime<Utc>,
    pub ratio: f64,
    pub threshold: f64,
}

impl RatioObservation {
    pub fn new(timestamp: DateTime<Utc>, ratio: f64, threshold: f64) -> Self {
        Self {
            timestamp,
            ratio,
            threshold,
        }
    }

    /// `N > V`. Equality counts as "not above".
    pub fn is_above(&self) -> bool {
        self.ratio > self.threshold
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        if !self.ratio.is_finite() || self.ratio <= 0.0 {
            return Err(CoreError::InvalidInput(
                "ratio".to_string(),
                format!("expected a positive finite number, got {}", self.ratio),
            ));
        }
        if !self.threshold.is_finite() || self.threshold <= 0.0 {
            return Err(CoreError::InvalidInput(
                "threshold".to_string(),
                format!("expected a positive finite number, got {}", self.threshold),
            ));
        }
        Ok(())
    }
}

/// Indicator readings used by the enhanced evaluation path. Computed elsewhere and
/// handed in per cycle; never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConfirmationInputs {
    pub qqq_rsi: f64,
    pub spy_rsi: f64,
    pub qqq_trend: Trend,
    pub spy_trend: Trend,
    /// 0 is extreme fear, 100 is extreme greed.
    pub fear_score: f64,
}

impl ConfirmationInputs {
    /// RSI and trend of the instrument a confirmation is about. Cash and the
    /// alternatives have no readings.
    pub fn readings_for(&self, position: Position) -> Option<(f64, Trend)> {
        match position {
            Position::Qqq => Some((self.qqq_rsi, self.qqq_trend)),
            Position::Spy => Some((self.spy_rsi, self.spy_trend)),
            _ => None,
        }
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        for (name, value) in [
            ("qqq_rsi", self.qqq_rsi),
            ("spy_rsi", self.spy_rsi),
            ("fear_score", self.fear_score),
        ] {
            if !value.is_finite() || !(0.0..=100.0).contains(&value) {
                return Err(CoreError::InvalidInput(
                    name.to_string(),
                    format!("expected a value between 0 and 100, got {value}"),
                ));
            }
        }
        Ok(())
    }
}

/// Everything one decision cycle consumes besides the persisted state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CycleInputs {
    pub observation: RatioObservation,
    /// External trend gate for instrument B, e.g. "SPY above its 40-week MA".
    pub secondary_trend_ok: bool,
    pub confirmation: Option<ConfirmationInputs>,
}

/// The decision state that has to survive restarts.
///
/// `last_active_signal == None` means flat. `last_check_time == None` means no cycle
/// has been observed since the state was created or reset, so there is no previous
/// "N above V" reference even though the flag itself defaults to `false`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SignalState {
    pub last_n_above_v: bool,
    pub last_check_time: Option<DateTime<Utc>>,
    pub last_active_signal: Option<Position>,
    pub last_signal_time: Option<DateTime<Utc>>,
}

impl SignalState {
    pub fn current_position(&self) -> Position {
        self.last_active_signal.unwrap_or(Position::Cash)
    }

    /// The remembered `N > V` flag, if any cycle has been observed.
    pub fn previous_observation(&self) -> Option<bool> {
        self.last_check_time.map(|_| self.last_n_above_v)
    }

    /// Records a newly held position. Holding cash is stored as `None`.
    pub fn hold(&mut self, position: Position, at: DateTime<Utc>) {
        self.last_active_signal = if position.is_cash() {
            None
        } else {
            Some(position)
        };
        self.last_signal_time = Some(at);
    }

    /// Records this cycle's `N > V` observation.
    pub fn observe(&mut self, n_above_v: bool, at: DateTime<Utc>) {
        self.last_n_above_v = n_above_v;
        self.last_check_time = Some(at);
    }
}

/// A structured signal for the notifier and the signal log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalRecord {
    pub signal_id: Uuid,
    pub signal_type: SignalType,
    pub from: Position,
    pub to: Position,
    pub reason: String,
    pub ratio: f64,
    pub threshold: f64,
    pub crossover: Crossover,
    pub timestamp: DateTime<Utc>,
}

impl SignalRecord {
    pub fn new(
        signal_type: SignalType,
        from: Position,
        to: Position,
        reason: impl Into<String>,
        crossover: Crossover,
        observation: &RatioObservation,
    ) -> Self {
        Self {
            signal_id: Uuid::new_v4(),
            signal_type,
            from,
            to,
            reason: reason.into(),
            ratio: observation.ratio,
            threshold: observation.threshold,
            crossover,
            timestamp: observation.timestamp,
        }
    }

    /// Entries and exits are worth delivering; `NONE` records are not.
    pub fn is_actionable(&self) -> bool {
        self.signal_type != SignalType::None
    }
}
