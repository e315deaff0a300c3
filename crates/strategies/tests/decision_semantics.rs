//! Cycle-by-cycle behaviour of both policies, driven the way the engine drives
//! them: each decision's `next_state` becomes the next cycle's prior.

use chrono::{DateTime, Duration, TimeZone, Utc};
use configuration::ConfirmationParams;
use core_types::transitions;
use core_types::{
    ConfirmationInputs, Crossover, CycleInputs, Position, RatioObservation, SignalState,
    SignalType, Trend,
};
use proptest::prelude::*;
use strategies::{
    Decision, EnhancedRatioThreshold, RatioThreshold, Strategy as Policy, StrategyError,
};

fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 8, 15, 0, 0).unwrap()
}

fn cycle(cycle: i64, ratio: f64, threshold: f64, trend_ok: bool) -> CycleInputs {
    CycleInputs {
        observation: RatioObservation::new(start() + Duration::hours(cycle), ratio, threshold),
        secondary_trend_ok: trend_ok,
        confirmation: None,
    }
}

fn calm() -> ConfirmationInputs {
    ConfirmationInputs {
        qqq_rsi: 55.0,
        spy_rsi: 50.0,
        qqq_trend: Trend::Rising,
        spy_trend: Trend::Rising,
        fear_score: 50.0,
    }
}

fn run(policy: &dyn Policy, inputs: &[CycleInputs]) -> Vec<Decision> {
    let mut state = SignalState::default();
    inputs
        .iter()
        .map(|input| {
            let decision = policy.evaluate(input, &state).unwrap();
            state = decision.next_state;
            decision
        })
        .collect()
}

#[test]
fn crossing_above_threshold_enters_qqq_once() {
    let inputs: Vec<_> = [0.9, 0.95, 1.05, 1.1]
        .iter()
        .enumerate()
        .map(|(i, &n)| cycle(i as i64, n, 1.0, false))
        .collect();

    let decisions = run(&RatioThreshold::new(), &inputs);

    assert_eq!(decisions[0].crossover, Crossover::None);
    assert_eq!(decisions[0].position(), Position::Cash);
    assert_eq!(decisions[1].position(), Position::Cash);

    assert_eq!(decisions[2].crossover, Crossover::Up);
    assert_eq!(decisions[2].record.signal_type, SignalType::Entry);
    assert_eq!(decisions[2].record.from, Position::Cash);
    assert_eq!(decisions[2].record.to, Position::Qqq);

    assert_eq!(decisions[3].crossover, Crossover::None);
    assert_eq!(decisions[3].record.signal_type, SignalType::None);
    assert_eq!(decisions[3].position(), Position::Qqq);
}

#[test]
fn spy_exits_exactly_when_trend_breaks() {
    let inputs = [
        cycle(0, 0.97, 1.0, true),
        cycle(1, 0.96, 1.0, true),
        cycle(2, 0.95, 1.0, true),
        cycle(3, 0.95, 1.0, false),
        cycle(4, 0.94, 1.0, false),
    ];

    let decisions = run(&RatioThreshold::new(), &inputs);

    assert_eq!(decisions[0].record.signal_type, SignalType::Entry);
    assert_eq!(decisions[0].position(), Position::Spy);
    assert_eq!(decisions[1].record.signal_type, SignalType::None);
    assert_eq!(decisions[2].record.signal_type, SignalType::None);
    assert_eq!(decisions[3].record.signal_type, SignalType::Exit);
    assert_eq!(decisions[3].record.from, Position::Spy);
    assert_eq!(decisions[3].position(), Position::Cash);
    // Trend still broken: stays in cash.
    assert_eq!(decisions[4].position(), Position::Cash);
}

#[test]
fn leg_switch_takes_two_cycles() {
    // Hold QQQ, fall below V with SPY trending: exit first, enter SPY next cycle.
    let inputs = [
        cycle(0, 0.95, 1.0, false),
        cycle(1, 1.05, 1.0, false),
        cycle(2, 0.98, 1.0, true),
        cycle(3, 0.98, 1.0, true),
    ];

    let decisions = run(&RatioThreshold::new(), &inputs);

    assert_eq!(decisions[1].position(), Position::Qqq);
    assert_eq!(decisions[2].record.signal_type, SignalType::Exit);
    assert_eq!(decisions[2].position(), Position::Cash);
    assert_eq!(decisions[3].record.signal_type, SignalType::Entry);
    assert_eq!(decisions[3].position(), Position::Spy);
}

#[test]
fn repeated_cycle_is_a_no_op() {
    let policy = RatioThreshold::new();
    let prior = {
        let mut state = SignalState::default();
        state.observe(false, start());
        state
    };
    let input = cycle(1, 1.2, 1.0, true);

    let first = policy.evaluate(&input, &prior).unwrap();
    let second = policy.evaluate(&input, &first.next_state).unwrap();

    assert_eq!(first.record.signal_type, SignalType::Entry);
    assert_eq!(second.position(), first.position());
    assert_eq!(second.record.signal_type, SignalType::None);
}

#[test]
fn enhanced_forces_exit_on_extreme_rsi_without_crossover() {
    let policy = EnhancedRatioThreshold::new(ConfirmationParams::default()).unwrap();
    let mut prior = SignalState::default();
    prior.observe(true, start());
    prior.hold(Position::Qqq, start());

    let mut input = cycle(1, 1.1, 1.0, true);
    input.confirmation = Some(ConfirmationInputs {
        qqq_rsi: 85.0,
        ..calm()
    });

    let decision = policy.evaluate(&input, &prior).unwrap();
    assert_eq!(decision.crossover, Crossover::None);
    assert_eq!(decision.record.signal_type, SignalType::Exit);
    assert_eq!(decision.position(), Position::Cash);
}

#[test]
fn enhanced_forces_exit_when_held_trend_turns_falling() {
    let policy = EnhancedRatioThreshold::new(ConfirmationParams::default()).unwrap();
    let mut prior = SignalState::default();
    prior.observe(true, start());
    prior.hold(Position::Qqq, start());

    let mut input = cycle(1, 1.1, 1.0, true);
    input.confirmation = Some(ConfirmationInputs {
        qqq_trend: Trend::Falling,
        ..calm()
    });

    let decision = policy.evaluate(&input, &prior).unwrap();
    assert_eq!(decision.crossover, Crossover::None);
    assert_eq!(decision.record.signal_type, SignalType::Exit);
    assert_eq!(decision.record.from, Position::Qqq);
    assert_eq!(decision.position(), Position::Cash);
}

#[test]
fn enhanced_forces_exit_on_extreme_fear_score() {
    let policy = EnhancedRatioThreshold::new(ConfirmationParams::default()).unwrap();
    let mut prior = SignalState::default();
    prior.observe(false, start());
    prior.hold(Position::Spy, start());

    // Still below V with the trend intact: only the fear score can force this exit.
    let mut input = cycle(1, 0.95, 1.0, true);
    input.confirmation = Some(ConfirmationInputs {
        fear_score: 85.0,
        ..calm()
    });

    let decision = policy.evaluate(&input, &prior).unwrap();
    assert_eq!(decision.crossover, Crossover::None);
    assert_eq!(decision.record.signal_type, SignalType::Exit);
    assert_eq!(decision.record.from, Position::Spy);
    assert_eq!(decision.position(), Position::Cash);
}

#[test]
fn enhanced_rejects_entry_band_that_forces_exit() {
    let params = ConfirmationParams {
        fear_entry_max: 90.0,
        exit_fear_extreme: 80.0,
        ..ConfirmationParams::default()
    };
    assert!(matches!(
        EnhancedRatioThreshold::new(params),
        Err(StrategyError::InvalidParameters(_))
    ));
}

#[test]
fn enhanced_settles_on_repeated_identical_cycles() {
    let policy = EnhancedRatioThreshold::new(ConfirmationParams::default()).unwrap();
    // Fear on the upper edge of the entry band: admitted, but not extreme.
    let inputs: Vec<_> = (0..6)
        .map(|i| {
            let mut input = cycle(i, 0.95, 1.0, true);
            input.confirmation = Some(ConfirmationInputs {
                fear_score: 80.0,
                ..calm()
            });
            input
        })
        .collect();

    let decisions = run(&policy, &inputs);

    assert_eq!(decisions[0].record.signal_type, SignalType::Entry);
    assert_eq!(decisions[0].position(), Position::Spy);
    for decision in &decisions[1..] {
        assert_eq!(decision.record.signal_type, SignalType::None);
        assert_eq!(decision.position(), Position::Spy);
    }
}

#[test]
fn enhanced_fails_closed_without_confirmation() {
    let policy = EnhancedRatioThreshold::new(ConfirmationParams::default()).unwrap();
    let mut prior = SignalState::default();
    prior.observe(false, start());

    let decision = policy.evaluate(&cycle(1, 1.1, 1.0, true), &prior).unwrap();
    assert_eq!(decision.crossover, Crossover::Up);
    assert_eq!(decision.record.signal_type, SignalType::None);
    assert_eq!(decision.position(), Position::Cash);
    // The crossover is still consumed.
    assert_eq!(decision.next_state.previous_observation(), Some(true));
}

#[test]
fn enhanced_still_honours_unconditional_exits_without_confirmation() {
    let policy = EnhancedRatioThreshold::new(ConfirmationParams::default()).unwrap();
    let mut prior = SignalState::default();
    prior.observe(false, start());
    prior.hold(Position::Spy, start());

    let mut input = cycle(1, 0.95, 1.0, false);
    input.confirmation = Some(ConfirmationInputs {
        spy_rsi: -3.0,
        ..calm()
    });

    let decision = policy.evaluate(&input, &prior).unwrap();
    assert_eq!(decision.record.signal_type, SignalType::Exit);
    assert_eq!(decision.position(), Position::Cash);
}

#[test]
fn enhanced_confirmed_entry_matches_plain_policy() {
    let plain = RatioThreshold::new();
    let enhanced = EnhancedRatioThreshold::new(ConfirmationParams::default()).unwrap();
    let mut prior = SignalState::default();
    prior.observe(false, start());
    let mut input = cycle(1, 1.1, 1.0, false);
    input.confirmation = Some(calm());

    let a = plain.evaluate(&input, &prior).unwrap();
    let b = enhanced.evaluate(&input, &prior).unwrap();
    assert_eq!(a.position(), Position::Qqq);
    assert_eq!(b.position(), Position::Qqq);
}

fn arb_confirmation() -> impl Strategy<Value = Option<ConfirmationInputs>> {
    let trend = prop_oneof![Just(Trend::Rising), Just(Trend::Falling), Just(Trend::Stable)];
    proptest::option::of(
        (0.0..100.0_f64, 0.0..100.0_f64, trend.clone(), trend, 0.0..100.0_f64).prop_map(
            |(qqq_rsi, spy_rsi, qqq_trend, spy_trend, fear_score)| ConfirmationInputs {
                qqq_rsi,
                spy_rsi,
                qqq_trend,
                spy_trend,
                fear_score,
            },
        ),
    )
}

proptest! {
    /// Whatever the inputs, every position change is an edge of the table and
    /// the two primary legs never swap in a single cycle.
    #[test]
    fn only_table_edges_are_taken(
        steps in proptest::collection::vec(
            (0.8..1.2_f64, any::<bool>(), arb_confirmation()),
            1..60,
        ),
        enhanced in any::<bool>(),
    ) {
        let policy: Box<dyn Policy> = if enhanced {
            Box::new(EnhancedRatioThreshold::new(ConfirmationParams::default()).unwrap())
        } else {
            Box::new(RatioThreshold::new())
        };
        let mut state = SignalState::default();
        for (i, (ratio, trend_ok, confirmation)) in steps.into_iter().enumerate() {
            let mut input = cycle(i as i64, ratio, 1.0, trend_ok);
            input.confirmation = confirmation;
            let decision = policy.evaluate(&input, &state).unwrap();
            let from = state.current_position();
            let to = decision.position();
            if from != to {
                prop_assert!(transitions::is_allowed(from, to));
                prop_assert!(to.is_cash() || to.is_primary());
            }
            prop_assert_eq!(decision.record.from, from);
            prop_assert_eq!(decision.record.signal_type == SignalType::None, from == to);
            state = decision.next_state;
        }
    }
}
