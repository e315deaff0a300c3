use crate::error::DbError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use core_types::{SignalRecord, SignalState};

/// Durable home of the engine's [`SignalState`].
///
/// The engine only ever talks to this trait, so tests can substitute a store
/// that fails on demand.
#[async_trait]
pub trait SignalStateStore: Send + Sync {
    /// Returns the persisted state, creating and persisting the default on
    /// first use.
    async fn load(&self) -> Result<SignalState, DbError>;

    /// Atomically replaces the state and, if given, appends `record` to the
    /// signal log. Either both land or neither does.
    async fn save(&self, state: &SignalState, record: Option<&SignalRecord>) -> Result<(), DbError>;

    /// Restores the default state. The signal log is kept.
    async fn reset(&self) -> Result<SignalState, DbError>;

    /// The most recent emitted records, newest first.
    async fn recent_signals(&self, limit: u32) -> Result<Vec<SignalRecord>, DbError>;
}

/// One refresh of the threshold: the ratio series and its trailing mean.
#[derive(Debug, Clone, PartialEq)]
pub struct ThresholdCalculation {
    pub n_values: Vec<f64>,
    pub v_value: f64,
    pub window: usize,
    pub last_updated: DateTime<Utc>,
}

impl ThresholdCalculation {
    /// Age of the calculation relative to `now`.
    pub fn age(&self, now: DateTime<Utc>) -> chrono::Duration {
        now - self.last_updated
    }
}

#[async_trait]
pub trait CalculationStore: Send + Sync {
    async fn save_calculation(&self, calculation: &ThresholdCalculation) -> Result<(), DbError>;

    async fn latest_calculation(&self) -> Result<Option<ThresholdCalculation>, DbError>;
}
