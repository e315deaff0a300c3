use crate::error::StrategyError;
use chrono::{DateTime, Utc};
use core_types::RatioObservation;
use ta::indicators::SimpleMovingAverage as Sma;
use ta::Next;

/// The ratio series of one refresh together with the threshold derived from it.
#[derive(Debug, Clone, PartialEq)]
pub struct ThresholdSnapshot {
    pub ratios: Vec<f64>,
    pub threshold: f64,
}

/// Computes `N = A / B` and the threshold `V`, the mean of `N` over the trailing
/// window. Stateless: every call works only on what it is given.
#[derive(Debug, Clone, Copy)]
pub struct RatioThresholdModel {
    window: usize,
}

impl RatioThresholdModel {
    /// `window` caps how many of the most recent ratios are averaged into `V`.
    pub fn new(window: usize) -> Result<Self, StrategyError> {
        if window == 0 {
            return Err(StrategyError::InvalidParameters(
                "threshold window must be at least 1".to_string(),
            ));
        }
        Ok(Self { window })
    }

    pub fn window(&self) -> usize {
        self.window
    }

    /// Element-wise `A_i / B_i` over two date-aligned series.
    pub fn ratio_series(a: &[f64], b: &[f64]) -> Result<Vec<f64>, StrategyError> {
        if a.is_empty() || b.is_empty() {
            return Err(StrategyError::InvalidInput(
                "price series cannot be empty".to_string(),
            ));
        }
        if a.len() != b.len() {
            return Err(StrategyError::InvalidInput(format!(
                "price series must have the same length ({} vs {})",
                a.len(),
                b.len()
            )));
        }
        a.iter()
            .zip(b)
            .map(|(&numerator, &denominator)| Self::current_ratio(numerator, denominator))
            .collect()
    }

    /// `N_now = A_now / B_now`.
    pub fn current_ratio(a_now: f64, b_now: f64) -> Result<f64, StrategyError> {
        if !a_now.is_finite() || !b_now.is_finite() {
            return Err(StrategyError::InvalidInput(format!(
                "prices must be finite (got {a_now} / {b_now})"
            )));
        }
        if b_now == 0.0 {
            return Err(StrategyError::InvalidInput(
                "denominator price cannot be zero".to_string(),
            ));
        }
        Ok(a_now / b_now)
    }

    /// Arithmetic mean of the trailing `window` ratios (all of them when fewer
    /// are supplied).
    pub fn threshold(&self, ratios: &[f64]) -> Result<f64, StrategyError> {
        if ratios.is_empty() {
            return Err(StrategyError::InvalidInput(
                "cannot average an empty ratio series".to_string(),
            ));
        }
        let period = self.window.min(ratios.len());
        let mut sma = Sma::new(period).map_err(|e| StrategyError::IndicatorError(format!("{e:?}")))?;

        // The last output of the moving average is the mean of the trailing window.
        Ok(ratios.iter().fold(0.0, |_, &ratio| sma.next(ratio)))
    }

    /// Ratio series and threshold for one refresh of the historical window.
    pub fn compute(&self, a: &[f64], b: &[f64]) -> Result<ThresholdSnapshot, StrategyError> {
        let ratios = Self::ratio_series(a, b)?;
        let threshold = self.threshold(&ratios)?;
        tracing::debug!(
            points = ratios.len(),
            window = self.window,
            threshold,
            "Threshold recomputed"
        );
        Ok(ThresholdSnapshot { ratios, threshold })
    }

    /// Builds this cycle's observation from spot prices and a known threshold.
    pub fn observe(
        a_now: f64,
        b_now: f64,
        threshold: f64,
        at: DateTime<Utc>,
    ) -> Result<RatioObservation, StrategyError> {
        let ratio = Self::current_ratio(a_now, b_now)?;
        let observation = RatioObservation::new(at, ratio, threshold);
        observation.validate()?;
        Ok(observation)
    }
}
