use itertools::{Itertools, repeat_n};

use crate::automaton::{Automaton, StateIndex, SymbolIndex};

/// Searches for a word of length below `max_word_length` that is accepted
/// from exactly one of the two states. Words are tried by increasing length,
/// so the result is a shortest one within the bound.
pub fn find_distinguishing_word(
    automaton: &impl Automaton,
    a: StateIndex,
    b: StateIndex,
    max_word_length: usize,
) -> Option<Vec<SymbolIndex>> {
    if max_word_length == 0 {
        return None;
    }

    if automaton.is_final(a) != automaton.is_final(b) {
        return Some(vec![]);
    }

    for i in 1..max_word_length {
        let combinations = repeat_n(0..automaton.alphabet_size(), i).multi_cartesian_product();

        for word in combinations {
            if automaton.accepts_from(a, &word) != automaton.accepts_from(b, &word) {
                return Some(word);
            }
        }
    }

    None
}

/// Checks whether the two states accept the same words up to a certain
/// length. For an automaton with `n` states, a bound of `n` is enough to
/// decide equivalence.
pub fn same_language(
    automaton: &impl Automaton,
    a: StateIndex,
    b: StateIndex,
    max_word_length: usize,
) -> bool {
    find_distinguishing_word(automaton, a, b, max_word_length).is_none()
}

pub fn assert_same_language(
    automaton: &impl Automaton,
    a: StateIndex,
    b: StateIndex,
    max_word_length: usize,
) {
    if let Some(word) = find_distinguishing_word(automaton, a, b, max_word_length) {
        let accepted_by = if automaton.accepts_from(a, &word) { a } else { b };
        panic!(
            "{:?} is only accepted from state {}. Thus states {} and {} are not equivalent.",
            word, accepted_by, a, b
        );
    }
}

/// Checks that `word` leads `a` and `b` to states that disagree on
/// acceptance.
pub fn check_distinguishes(
    automaton: &impl Automaton,
    a: StateIndex,
    b: StateIndex,
    word: &[SymbolIndex],
) -> anyhow::Result<()> {
    anyhow::ensure!(
        automaton.accepts_from(a, word) != automaton.accepts_from(b, word),
        "{:?} does not distinguish states {} and {}",
        word,
        a,
        b
    );

    Ok(())
}

pub fn assert_distinguishes(
    automaton: &impl Automaton,
    a: StateIndex,
    b: StateIndex,
    word: &[SymbolIndex],
) {
    if let Err(e) = check_distinguishes(automaton, a, b, word) {
        panic!("{}", e);
    }
}

#[test]
fn test_distinguishing_word_is_shortest() {
    use crate::automaton::dfa::Dfa;

    // 0 -a-> 1 -a-> 2 -a-> 3 (final, loops)
    let dfa = Dfa::from_rows(&[3], vec![vec![1], vec![2], vec![3], vec![3]]).unwrap();

    assert_eq!(find_distinguishing_word(&dfa, 0, 1, 4), Some(vec![0, 0]));
    assert_eq!(find_distinguishing_word(&dfa, 0, 1, 2), None);
    assert!(check_distinguishes(&dfa, 0, 1, &[0, 0]).is_ok());
    assert!(check_distinguishes(&dfa, 0, 1, &[0]).is_err());
}
