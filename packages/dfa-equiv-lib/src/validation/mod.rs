use anyhow::ensure;

use crate::automaton::{
    Automaton, StateIndex,
    dfa::{Dfa, pair::EquivalentPairs},
};

pub mod same_language;

/// Checks that two states are equivalent by exploring every pair of states
/// reachable from `(a, b)` by reading the same word. The states are
/// equivalent iff no reachable pair disagrees on acceptance.
pub fn states_equivalent(dfa: &Dfa, a: StateIndex, b: StateIndex) -> bool {
    let n = dfa.state_count();
    let mut visited = vec![false; n * n];
    let mut stack = vec![(a, b)];
    visited[a * n + b] = true;

    while let Some((p, q)) = stack.pop() {
        if dfa.is_final(p) != dfa.is_final(q) {
            return false;
        }

        for symbol in 0..dfa.alphabet_size() {
            let next = (dfa.successor(p, symbol), dfa.successor(q, symbol));
            if !visited[next.0 * n + next.1] {
                visited[next.0 * n + next.1] = true;
                stack.push(next);
            }
        }
    }

    true
}

/// Checks every property an equivalence result has to satisfy for `dfa`:
/// pairs are canonical and strictly ascending, equivalent states agree on
/// acceptance, successors of equivalent states are equal or equivalent, and
/// every pair that is missing is distinguishable.
///
/// Returns a description of the first violation.
pub fn check_equivalence_properties(dfa: &Dfa, pairs: &EquivalentPairs) -> anyhow::Result<()> {
    ensure!(
        pairs.state_count() == dfa.state_count(),
        "result covers {} states, the automaton has {}",
        pairs.state_count(),
        dfa.state_count()
    );

    for pair in pairs {
        ensure!(
            pair.low() < pair.high(),
            "{} is not canonical or reflexive",
            pair
        );
        ensure!(pair.high() < dfa.state_count(), "{} is out of range", pair);
    }

    for window in pairs.pairs().windows(2) {
        ensure!(
            window[0] < window[1],
            "{} is not strictly before {}",
            window[0],
            window[1]
        );
    }

    for pair in pairs {
        ensure!(
            dfa.is_final(pair.low()) == dfa.is_final(pair.high()),
            "{} disagrees on acceptance",
            pair
        );

        for symbol in 0..dfa.alphabet_size() {
            let p = dfa.successor(pair.low(), symbol);
            let q = dfa.successor(pair.high(), symbol);
            ensure!(
                pairs.contains(p, q),
                "{} is equivalent, but its successors ({}, {}) on symbol {} are not",
                pair,
                p,
                q,
                dfa.symbol_name(symbol)
            );
        }
    }

    for low in 0..dfa.state_count() {
        for high in low + 1..dfa.state_count() {
            ensure!(
                pairs.contains(low, high) == states_equivalent(dfa, low, high),
                "({}, {}) is misclassified",
                low,
                high
            );
        }
    }

    Ok(())
}

/// Like [check_equivalence_properties], but panics on the first violation.
pub fn assert_equivalence_properties(dfa: &Dfa, pairs: &EquivalentPairs) {
    if let Err(e) = check_equivalence_properties(dfa, pairs) {
        panic!("{:#}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::automaton::dfa::{equivalence::compute_equivalent_pairs, pair::StatePair};

    fn two_equivalent_states() -> Dfa {
        // 0 and 1 both move to the final state 2
        Dfa::from_rows(&[2], vec![vec![2], vec![2], vec![2]]).unwrap()
    }

    #[test]
    fn computed_pairs_pass() {
        let dfa = two_equivalent_states();

        assert!(check_equivalence_properties(&dfa, &compute_equivalent_pairs(&dfa)).is_ok());
    }

    #[test]
    fn missing_pair_is_reported() {
        let dfa = two_equivalent_states();
        let error = check_equivalence_properties(&dfa, &EquivalentPairs::new(3, vec![]))
            .unwrap_err();

        assert_eq!(error.to_string(), "(0, 1) is misclassified");
    }

    #[test]
    fn acceptance_mismatch_is_reported() {
        let dfa = two_equivalent_states();
        let pairs = EquivalentPairs::new(3, vec![StatePair::new(0, 1), StatePair::new(1, 2)]);

        assert_eq!(
            check_equivalence_properties(&dfa, &pairs)
                .unwrap_err()
                .to_string(),
            "(1, 2) disagrees on acceptance"
        );
    }

    #[test]
    fn unordered_pairs_are_reported() {
        let dfa = Dfa::from_rows(&[], vec![vec![0], vec![0], vec![0]]).unwrap();
        let pairs = EquivalentPairs::new(
            3,
            vec![StatePair::new(1, 2), StatePair::new(0, 1), StatePair::new(0, 2)],
        );

        assert_eq!(
            check_equivalence_properties(&dfa, &pairs)
                .unwrap_err()
                .to_string(),
            "(1, 2) is not strictly before (0, 1)"
        );
    }

    #[test]
    #[should_panic(expected = "is misclassified")]
    fn assert_panics_on_violation() {
        let dfa = two_equivalent_states();
        assert_equivalence_properties(&dfa, &EquivalentPairs::new(3, vec![]));
    }
}
