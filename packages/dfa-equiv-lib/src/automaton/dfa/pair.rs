use std::fmt::Display;

use itertools::Itertools;
use petgraph::unionfind::UnionFind;
use serde::Serialize;

use crate::automaton::StateIndex;

/// An unordered pair of two distinct states, stored with the smaller index
/// first. The derived ordering is lexicographic on `(low, high)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(into = "(StateIndex, StateIndex)")]
pub struct StatePair {
    low: StateIndex,
    high: StateIndex,
}

impl StatePair {
    /// Creates the pair `{a, b}` in either orientation. The states must
    /// differ.
    pub fn new(a: StateIndex, b: StateIndex) -> Self {
        debug_assert_ne!(a, b, "a state pair needs two distinct states");

        if a < b {
            StatePair { low: a, high: b }
        } else {
            StatePair { low: b, high: a }
        }
    }

    pub fn low(&self) -> StateIndex {
        self.low
    }

    pub fn high(&self) -> StateIndex {
        self.high
    }

    pub fn contains(&self, state: StateIndex) -> bool {
        self.low == state || self.high == state
    }
}

impl From<StatePair> for (StateIndex, StateIndex) {
    fn from(pair: StatePair) -> Self {
        (pair.low, pair.high)
    }
}

impl Display for StatePair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.low, self.high)
    }
}

/// The pairs of states left unmarked by the table-filling algorithm, in
/// ascending lexicographic order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EquivalentPairs {
    state_count: usize,
    pairs: Vec<StatePair>,
}

impl EquivalentPairs {
    /// `pairs` must already be sorted and free of duplicates.
    pub(crate) fn new(state_count: usize, pairs: Vec<StatePair>) -> Self {
        debug_assert!(pairs.windows(2).all(|w| w[0] < w[1]));

        EquivalentPairs { state_count, pairs }
    }

    pub fn state_count(&self) -> usize {
        self.state_count
    }

    pub fn pairs(&self) -> &[StatePair] {
        &self.pairs
    }

    pub fn iter(&self) -> impl Iterator<Item = &StatePair> {
        self.pairs.iter()
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Whether `a` and `b` were found equivalent, in either orientation.
    /// A state is always equivalent to itself.
    pub fn contains(&self, a: StateIndex, b: StateIndex) -> bool {
        a == b || self.pairs.binary_search(&StatePair::new(a, b)).is_ok()
    }

    /// Groups all states into equivalence classes. Every state appears in
    /// exactly one class, singletons included; classes are sorted by their
    /// smallest member and members are ascending.
    pub fn classes(&self) -> Vec<Vec<StateIndex>> {
        let mut union_find = UnionFind::<usize>::new(self.state_count);
        for pair in &self.pairs {
            union_find.union(pair.low, pair.high);
        }

        let mut class_of_root: Vec<Option<usize>> = vec![None; self.state_count];
        let mut classes: Vec<Vec<StateIndex>> = vec![];

        for state in 0..self.state_count {
            let root = union_find.find_mut(state);
            match class_of_root[root] {
                Some(class) => classes[class].push(state),
                None => {
                    class_of_root[root] = Some(classes.len());
                    classes.push(vec![state]);
                }
            }
        }

        classes
    }
}

impl<'a> IntoIterator for &'a EquivalentPairs {
    type Item = &'a StatePair;
    type IntoIter = std::slice::Iter<'a, StatePair>;

    fn into_iter(self) -> Self::IntoIter {
        self.pairs.iter()
    }
}

/// Renders the pairs as one output line, e.g. `(0, 1) (0, 2) (1, 2)`.
impl Display for EquivalentPairs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.pairs.iter().join(" "))
    }
}

#[test]
fn test_pair_is_canonical() {
    let a = StatePair::new(3, 1);
    let b = StatePair::new(1, 3);

    assert_eq!(a, b);
    assert_eq!(a.low(), 1);
    assert_eq!(a.high(), 3);
    assert_eq!(a.to_string(), "(1, 3)");
}

#[test]
fn test_pair_ordering_is_lexicographic() {
    let mut pairs = vec![
        StatePair::new(2, 3),
        StatePair::new(0, 2),
        StatePair::new(1, 0),
        StatePair::new(3, 0),
    ];
    pairs.sort();

    assert_eq!(
        pairs.iter().join(" "),
        "(0, 1) (0, 2) (0, 3) (2, 3)"
    );
}

#[test]
fn test_classes_include_singletons() {
    let pairs = EquivalentPairs::new(5, vec![StatePair::new(0, 3), StatePair::new(1, 4)]);

    assert_eq!(pairs.classes(), vec![vec![0, 3], vec![1, 4], vec![2]]);
    assert!(pairs.contains(4, 1));
    assert!(pairs.contains(2, 2));
    assert!(!pairs.contains(0, 1));
}
