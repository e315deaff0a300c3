use crate::error::EngineError;
use chrono::{DateTime, Duration, Utc};
use configuration::StrategySettings;
use database::{CalculationStore, ThresholdCalculation};
use std::sync::Arc;
use strategies::{RatioThresholdModel, StrategyError};

/// Computes `V` from a historical window and keeps the result in the
/// `calculations` table, so cycles can run on spot prices alone.
pub struct ThresholdCache {
    model: RatioThresholdModel,
    store: Arc<dyn CalculationStore>,
    max_age: Duration,
}

impl ThresholdCache {
    pub fn new(model: RatioThresholdModel, store: Arc<dyn CalculationStore>, max_age: Duration) -> Self {
        Self {
            model,
            store,
            max_age,
        }
    }

    pub fn from_settings(
        settings: &StrategySettings,
        store: Arc<dyn CalculationStore>,
    ) -> Result<Self, EngineError> {
        let model = RatioThresholdModel::new(settings.threshold_window)?;
        Ok(Self::new(
            model,
            store,
            Duration::hours(settings.threshold_max_age_hours),
        ))
    }

    /// Recomputes `V` over the aligned price series `a` and `b` and stores it.
    pub async fn refresh_threshold(
        &self,
        a: &[f64],
        b: &[f64],
        at: DateTime<Utc>,
    ) -> Result<ThresholdCalculation, EngineError> {
        let snapshot = self.model.compute(a, b).map_err(|e| match e {
            StrategyError::InvalidInput(msg) => EngineError::InvalidInput(msg),
            other => EngineError::Strategy(other),
        })?;

        let calculation = ThresholdCalculation {
            n_values: snapshot.ratios,
            v_value: snapshot.threshold,
            window: self.model.window(),
            last_updated: at,
        };
        self.store.save_calculation(&calculation).await?;
        tracing::info!(
            threshold = calculation.v_value,
            points = calculation.n_values.len(),
            "Threshold refreshed"
        );
        Ok(calculation)
    }

    /// `Some(V)` if the latest calculation is younger than `max_age` at `now`.
    pub async fn cached_threshold(
        &self,
        max_age: Duration,
        now: DateTime<Utc>,
    ) -> Result<Option<f64>, EngineError> {
        let Some(latest) = self.store.latest_calculation().await? else {
            tracing::warn!("No threshold has been calculated yet");
            return Ok(None);
        };

        let age = latest.age(now);
        if age >= max_age {
            tracing::warn!(
                age_hours = age.num_hours(),
                max_age_hours = max_age.num_hours(),
                "Cached threshold is stale"
            );
            return Ok(None);
        }
        Ok(Some(latest.v_value))
    }

    /// The cached threshold under the configured maximum age, or
    /// [`EngineError::StaleThreshold`].
    pub async fn fresh_threshold(&self, now: DateTime<Utc>) -> Result<f64, EngineError> {
        self.cached_threshold(self.max_age, now)
            .await?
            .ok_or(EngineError::StaleThreshold {
                max_age_hours: self.max_age.num_hours(),
            })
    }
}
