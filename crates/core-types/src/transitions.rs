//! The position transition table.
//!
//! Every move between holdings goes through cash. From `CASH` any instrument may be
//! entered; every instrument may only be left for `CASH`. A direct switch between two
//! instruments (for example `QQQ -> SPY`) has no edge and has to be expressed as an
//! exit in one cycle followed by an entry in a later one.

use crate::enums::Position;
use crate::error::CoreError;

/// Returns whether `from -> to` is an edge of the transition table.
///
/// Staying in place is not a transition and is therefore not an edge.
pub fn is_allowed(from: Position, to: Position) -> bool {
    match (from, to) {
        (Position::Cash, Position::Cash) => false,
        (Position::Cash, _) => true,
        (_, Position::Cash) => true,
        _ => false,
    }
}

/// Checks an edge before any state mutation.
pub fn ensure_allowed(from: Position, to: Position) -> Result<(), CoreError> {
    if is_allowed(from, to) {
        Ok(())
    } else {
        Err(CoreError::InvalidTransition { from, to })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const ALL_POSITIONS: [Position; 9] = [
        Position::Cash,
        Position::Qqq,
        Position::Spy,
        Position::Sh,
        Position::Psq,
        Position::Agg,
        Position::Lqd,
        Position::Tlt,
        Position::Gld,
    ];

    fn targets(from: Position) -> Vec<Position> {
        ALL_POSITIONS.into_iter().filter(|to| is_allowed(from, *to)).collect()
    }

    #[test]
    fn primary_legs_only_connect_through_cash() {
        assert!(is_allowed(Position::Cash, Position::Qqq));
        assert!(is_allowed(Position::Cash, Position::Spy));
        assert!(is_allowed(Position::Qqq, Position::Cash));
        assert!(is_allowed(Position::Spy, Position::Cash));
        assert!(!is_allowed(Position::Qqq, Position::Spy));
        assert!(!is_allowed(Position::Spy, Position::Qqq));
    }

    #[test]
    fn alternatives_are_targets_not_hops() {
        for alt in Position::ALTERNATIVES {
            assert!(is_allowed(Position::Cash, alt));
            assert!(is_allowed(alt, Position::Cash));
            assert!(!is_allowed(Position::Qqq, alt));
            assert!(!is_allowed(alt, Position::Spy));
        }
    }

    #[test]
    fn rejected_edge_names_both_ends() {
        let err = ensure_allowed(Position::Spy, Position::Qqq).unwrap_err();
        assert_eq!(
            err,
            CoreError::InvalidTransition {
                from: Position::Spy,
                to: Position::Qqq
            }
        );
    }

    #[test]
    fn instruments_have_exactly_one_exit() {
        for pos in ALL_POSITIONS.iter().filter(|p| !p.is_cash()) {
            assert_eq!(targets(*pos), vec![Position::Cash]);
        }
        assert_eq!(targets(Position::Cash).len(), ALL_POSITIONS.len() - 1);
    }

    fn arb_position() -> impl Strategy<Value = Position> {
        proptest::sample::select(ALL_POSITIONS.to_vec())
    }

    proptest! {
        /// Every edge touches cash on exactly one side.
        #[test]
        fn every_edge_touches_cash(from in arb_position(), to in arb_position()) {
            if is_allowed(from, to) {
                prop_assert!(from.is_cash() ^ to.is_cash());
            }
        }
    }
}
