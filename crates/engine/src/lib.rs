//! # MarketFlow Engine
//!
//! Wires a decision policy to its persisted state. One cycle is
//! load -> decide -> save -> publish, serialised behind a mutex so concurrent
//! callers can never interleave two cycles on the same state row.

use crate::error::EngineError;
use chrono::Utc;
use core_types::{Crossover, CycleInputs, Position, SignalRecord, SignalState};
use database::SignalStateStore;
use events::{CycleFailure, EngineEvent};
use std::sync::Arc;
use strategies::{Strategy, StrategyError};
use tokio::sync::{Mutex, broadcast};

pub mod error;
pub mod threshold;

pub use threshold::ThresholdCache;

/// What a completed (persisted) cycle produced.
#[derive(Debug, Clone, PartialEq)]
pub struct CycleOutcome {
    pub crossover: Crossover,
    /// Always present; `signal_type` is `NONE` when nothing changed.
    pub record: SignalRecord,
    pub state: SignalState,
}

impl CycleOutcome {
    pub fn position(&self) -> Position {
        self.record.to
    }
}

/// The application seam around a [`Strategy`].
pub struct DecisionEngine {
    strategy: Box<dyn Strategy>,
    store: Arc<dyn SignalStateStore>,
    // Guards the load-decide-save sequence.
    gate: Mutex<()>,
    events: broadcast::Sender<EngineEvent>,
}

impl DecisionEngine {
    pub fn new(
        strategy: Box<dyn Strategy>,
        store: Arc<dyn SignalStateStore>,
        events: broadcast::Sender<EngineEvent>,
    ) -> Self {
        Self {
            strategy,
            store,
            gate: Mutex::new(()),
            events,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.events.subscribe()
    }

    /// Loads the persisted state and announces the engine on the event channel.
    pub async fn start(&self) -> Result<SignalState, EngineError> {
        let state = self.store.load().await?;
        tracing::info!(
            strategy = ?self.strategy.id(),
            position = %state.current_position(),
            "Decision engine started"
        );
        self.publish(EngineEvent::Started {
            position: state.current_position(),
        });
        Ok(state)
    }

    /// Runs one cycle.
    ///
    /// Invalid inputs are rejected before the store is touched. The new state
    /// and any ENTRY/EXIT record are committed together, and the record is
    /// published only after that commit succeeded.
    pub async fn run_cycle(&self, inputs: &CycleInputs) -> Result<CycleOutcome, EngineError> {
        inputs
            .observation
            .validate()
            .map_err(|e| EngineError::InvalidInput(e.to_string()))?;

        let _guard = self.gate.lock().await;

        let prior = self.store.load().await?;
        let decision = self
            .strategy
            .evaluate(inputs, &prior)
            .map_err(|e| match e {
                StrategyError::InvalidInput(msg) => EngineError::InvalidInput(msg),
                other => EngineError::Strategy(other),
            })?;

        let logged = decision.is_actionable().then_some(&decision.record);
        if let Err(e) = self.store.save(&decision.next_state, logged).await {
            tracing::error!(error = %e, "Failed to persist cycle; state left unchanged");
            return Err(EngineError::Persistence(e));
        }

        if decision.is_actionable() {
            tracing::info!(
                signal_id = %decision.record.signal_id,
                signal_type = %decision.record.signal_type,
                from = %decision.record.from,
                to = %decision.record.to,
                reason = %decision.record.reason,
                "Signal emitted"
            );
            self.publish(EngineEvent::SignalEmitted(decision.record.clone()));
        } else {
            tracing::debug!(position = %decision.position(), "Cycle completed without a signal");
        }

        Ok(CycleOutcome {
            crossover: decision.crossover,
            record: decision.record,
            state: decision.next_state,
        })
    }

    /// Announces a cycle the caller gave up on.
    pub fn report_failure(&self, error: &EngineError) {
        self.publish(EngineEvent::CycleFailed(CycleFailure {
            timestamp: Utc::now(),
            message: error.to_string(),
        }));
    }

    pub async fn current_state(&self) -> Result<SignalState, EngineError> {
        let _guard = self.gate.lock().await;
        Ok(self.store.load().await?)
    }

    pub async fn recent_signals(&self, limit: u32) -> Result<Vec<SignalRecord>, EngineError> {
        Ok(self.store.recent_signals(limit).await?)
    }

    /// Restores the default state (CASH, no reference observation).
    pub async fn reset(&self) -> Result<SignalState, EngineError> {
        let _guard = self.gate.lock().await;
        Ok(self.store.reset().await?)
    }

    // Fire-and-forget: having no subscribers is not an error.
    fn publish(&self, event: EngineEvent) {
        if self.events.send(event).is_err() {
            tracing::debug!("No event subscribers");
        }
    }
}
