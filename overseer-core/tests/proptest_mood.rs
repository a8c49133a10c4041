//! Property-based tests for the mood transition gate.
//!
//! The adjacency invariant must hold over the full 16×16 mood space:
//! `validate_transition(a, b) == b` iff `|severity(a) - severity(b)| <= 1`,
//! and `== a` otherwise.

use proptest::prelude::*;

use overseer_core::mood::{ALL_MOODS, Mood};

fn arb_mood() -> impl Strategy<Value = Mood> {
    prop::sample::select(ALL_MOODS.to_vec())
}

proptest! {
    #[test]
    fn transition_respects_severity_adjacency(a in arb_mood(), b in arb_mood()) {
        let result = Mood::validate_transition(a, b);
        let delta = i16::from(a.severity()) - i16::from(b.severity());
        if delta.abs() <= 1 {
            prop_assert_eq!(result, b);
        } else {
            prop_assert_eq!(result, a);
        }
    }

    #[test]
    fn transition_result_is_always_one_of_the_inputs(a in arb_mood(), b in arb_mood()) {
        let result = Mood::validate_transition(a, b);
        prop_assert!(result == a || result == b);
    }

    #[test]
    fn gate_never_leaves_the_vocabulary(a in arb_mood(), name in "\\PC*") {
        let result = Mood::gate(a, &name);
        prop_assert!(ALL_MOODS.contains(&result));
    }
}

/// The property test samples pairs; this covers the full grid exhaustively.
#[test]
fn all_256_pairs_behave() {
    for a in ALL_MOODS {
        for b in ALL_MOODS {
            let result = Mood::validate_transition(a, b);
            let delta = i16::from(a.severity()) - i16::from(b.severity());
            if delta.abs() <= 1 {
                assert_eq!(result, b, "{a} -> {b} should be accepted");
            } else {
                assert_eq!(result, a, "{a} -> {b} should be rejected");
            }
        }
    }
}
