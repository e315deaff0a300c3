use crate::enhanced::EnhancedRatioThreshold;
use crate::error::StrategyError;
use crate::ratio_threshold::RatioThreshold;
use crate::Strategy;
use configuration::Config;
use core_types::StrategyId;

/// Creates a new strategy instance based on the provided ID and configuration.
pub fn create_strategy(id: StrategyId, config: &Config) -> Result<Box<dyn Strategy>, StrategyError> {
    // The compiler will error if a new StrategyId is added but not handled here.
    match id {
        StrategyId::RatioThreshold => Ok(Box::new(RatioThreshold::new())),
        StrategyId::EnhancedRatioThreshold => Ok(Box::new(EnhancedRatioThreshold::new(
            config.confirmation.clone(),
        )?)),
    }
}
