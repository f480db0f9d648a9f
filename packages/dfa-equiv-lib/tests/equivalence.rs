use dfa_equiv_lib::{
    automaton::{
        Automaton,
        dfa::{
            Dfa,
            equivalence::{EquivalenceTableBuilder, PropagationStrategy, compute_equivalent_pairs},
        },
    },
    random::{RandomDfaShape, RandomOptions, generate_random_dfas},
    validation::{
        assert_equivalence_properties,
        same_language::{assert_distinguishes, find_distinguishing_word, same_language},
    },
};

const STRATEGIES: [PropagationStrategy; 2] =
    [PropagationStrategy::Worklist, PropagationStrategy::Rescan];

fn equivalent_pairs_with(dfa: &Dfa, strategy: PropagationStrategy) -> String {
    EquivalenceTableBuilder::new(dfa)
        .with_strategy(strategy)
        .build()
        .equivalent_pairs()
        .to_string()
}

#[test]
fn test_acceptance_mismatch() {
    // two states, only state 1 is final
    let dfa = Dfa::from_rows(&[1], vec![vec![0, 1], vec![1, 1]]).unwrap();

    for strategy in STRATEGIES {
        assert_eq!(equivalent_pairs_with(&dfa, strategy), "");
    }
}

#[test]
fn test_all_states_equivalent() {
    let dfa = Dfa::from_rows(&[], vec![vec![1, 2], vec![1, 2], vec![1, 2]]).unwrap();

    for strategy in STRATEGIES {
        assert_eq!(
            equivalent_pairs_with(&dfa, strategy),
            "(0, 1) (0, 2) (1, 2)"
        );
    }
}

#[test]
fn test_unary_counter() {
    // 0 -a-> 1 -a-> 2 -a-> 3, 3 is final and loops
    let dfa = Dfa::from_rows(&[3], vec![vec![1], vec![2], vec![3], vec![3]]).unwrap();

    for strategy in STRATEGIES {
        assert_eq!(equivalent_pairs_with(&dfa, strategy), "");
    }
}

#[test]
fn test_single_state() {
    let dfa = Dfa::from_rows(&[], vec![vec![0, 0]]).unwrap();

    for strategy in STRATEGIES {
        assert_eq!(equivalent_pairs_with(&dfa, strategy), "");
    }
}

#[test]
fn test_textbook_example() {
    // (a|b)*a(a|b) with redundant states: 0 ~ 4 and 2 ~ 5
    let dfa = Dfa::from_rows(
        &[2, 3, 5],
        vec![
            vec![1, 4], // 0
            vec![3, 2], // 1
            vec![1, 4], // 2
            vec![3, 2], // 3
            vec![1, 4], // 4
            vec![1, 4], // 5
        ],
    )
    .unwrap();

    let pairs = compute_equivalent_pairs(&dfa);
    assert_eq!(pairs.to_string(), "(0, 4) (2, 5)");
    assert_eq!(pairs.classes(), vec![vec![0, 4], vec![1], vec![2, 5], vec![3]]);

    assert_equivalence_properties(&dfa, &pairs);
}

#[test]
fn test_distinguished_after_two_symbols() {
    // 0 and 1 only differ after reading "ab"
    let dfa = Dfa::from_rows(
        &[4],
        vec![
            vec![2, 5], // 0
            vec![3, 5], // 1
            vec![5, 4], // 2
            vec![5, 5], // 3
            vec![5, 5], // 4
            vec![5, 5], // 5
        ],
    )
    .unwrap();

    let table = EquivalenceTableBuilder::new(&dfa).with_witnesses(true).build();

    assert!(table.is_marked(0, 1));
    assert!(!table.is_marked(3, 5));
    assert_eq!(table.witness(&dfa, 0, 1), Some(vec![0, 1]));
    assert_distinguishes(&dfa, 0, 1, &[0, 1]);
}

#[test]
fn test_empty_alphabet() {
    let dfa = Dfa::new(vec![], &[0, 2], vec![vec![], vec![], vec![], vec![]]).unwrap();

    for strategy in STRATEGIES {
        assert_eq!(equivalent_pairs_with(&dfa, strategy), "(0, 2) (1, 3)");
    }
}

#[test]
fn test_idempotence() {
    let dfas = generate_random_dfas(
        &RandomOptions::new(3, 5),
        RandomDfaShape::new(8, 2, 0.4),
    );

    for dfa in &dfas {
        assert_eq!(compute_equivalent_pairs(dfa), compute_equivalent_pairs(dfa));
    }
}

#[test]
fn test_random_strategies_agree() {
    let dfas = generate_random_dfas(
        &RandomOptions::new(42, 50),
        RandomDfaShape::new(9, 2, 0.3),
    );

    for dfa in &dfas {
        let worklist = EquivalenceTableBuilder::new(dfa)
            .with_strategy(PropagationStrategy::Worklist)
            .build();
        let rescan = EquivalenceTableBuilder::new(dfa)
            .with_strategy(PropagationStrategy::Rescan)
            .build();

        assert_eq!(worklist.equivalent_pairs(), rescan.equivalent_pairs());
        assert_eq!(worklist.marked_count(), rescan.marked_count());
        assert_equivalence_properties(dfa, &worklist.equivalent_pairs());
    }
}

#[test]
fn test_random_witnesses() {
    let dfas = generate_random_dfas(
        &RandomOptions::new(11, 30),
        RandomDfaShape::new(7, 3, 0.5),
    );

    for dfa in &dfas {
        for strategy in STRATEGIES {
            let table = EquivalenceTableBuilder::new(dfa)
                .with_strategy(strategy)
                .with_witnesses(true)
                .build();

            for low in 0..dfa.state_count() {
                for high in low + 1..dfa.state_count() {
                    match table.witness(dfa, low, high) {
                        Some(word) => assert_distinguishes(dfa, low, high, &word),
                        None => assert!(same_language(dfa, low, high, dfa.state_count())),
                    }
                }
            }
        }
    }
}

#[test]
fn test_worklist_witnesses_are_shortest() {
    let dfas = generate_random_dfas(
        &RandomOptions::new(5, 30),
        RandomDfaShape::new(7, 2, 0.3),
    );

    for dfa in &dfas {
        let table = EquivalenceTableBuilder::new(dfa).with_witnesses(true).build();

        for low in 0..dfa.state_count() {
            for high in low + 1..dfa.state_count() {
                let shortest = find_distinguishing_word(dfa, low, high, dfa.state_count());
                assert_eq!(
                    table.witness(dfa, low, high).map(|w| w.len()),
                    shortest.map(|w| w.len()),
                    "witness length of ({}, {})",
                    low,
                    high
                );
            }
        }
    }
}
