use core_types::{Crossover, SignalState};

/// Classifies a change of the `N > V` regime between consecutive observations.
///
/// The only state is the remembered flag of the previous observation. It is
/// resumed from the persisted [`SignalState`] and written back as part of the
/// same commit as the rest of the cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CrossoverDetector {
    last_above: Option<bool>,
}

impl CrossoverDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Picks up where the previous cycle left off. A state that has never been
    /// checked has no reference, so its first observation is `NONE`.
    pub fn resume(state: &SignalState) -> Self {
        Self {
            last_above: state.previous_observation(),
        }
    }

    /// Classifies `current_above` against the remembered flag, then remembers it.
    pub fn observe(&mut self, current_above: bool) -> Crossover {
        let crossover = classify(self.last_above, current_above);
        self.last_above = Some(current_above);
        crossover
    }
}

/// The pure classification rule.
pub fn classify(last_above: Option<bool>, current_above: bool) -> Crossover {
    match (last_above, current_above) {
        (Some(false), true) => Crossover::Up,
        (Some(true), false) => Crossover::Down,
        _ => Crossover::None,
    }
}
