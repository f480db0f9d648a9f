use std::{collections::VecDeque, fmt::Display, str::FromStr};

use fixedbitset::FixedBitSet;
use serde::{Deserialize, Serialize};

use crate::automaton::{
    Automaton, StateIndex, SymbolIndex,
    dfa::{
        Dfa, ReverseTransitions,
        pair::{EquivalentPairs, StatePair},
    },
};

/// How the marking is driven to its fixed point. Both strategies mark
/// exactly the same pairs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropagationStrategy {
    /// Process a queue of newly marked pairs and only look at their
    /// predecessors, found through a reverse transition index.
    #[default]
    Worklist,
    /// Rescan every unmarked pair until a full pass marks nothing new.
    Rescan,
}

impl FromStr for PropagationStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "worklist" | "queue" => Ok(PropagationStrategy::Worklist),
            "rescan" | "scan" => Ok(PropagationStrategy::Rescan),
            _ => Err(format!("Invalid propagation strategy: {}", s)),
        }
    }
}

impl Display for PropagationStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PropagationStrategy::Worklist => write!(f, "worklist"),
            PropagationStrategy::Rescan => write!(f, "rescan"),
        }
    }
}

/// Why a pair got marked as distinguishable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mark {
    /// Exactly one of the two states is final.
    Seed,
    /// Reading `symbol` leads to a pair that was already marked.
    Step { symbol: SymbolIndex },
}

// step entry of a seeded pair
const SEED: u32 = u32::MAX;

/// The triangular marking table over all unordered pairs of distinct states.
///
/// Cells are stored flat: pair `{low, high}` lives at
/// `high * (high - 1) / 2 + low`, one bit per cell. A cell only ever goes
/// from unmarked to marked.
///
/// When witnesses are recorded, a second table keeps the symbol every pair
/// was marked on. The successor pair follows from the automaton, so this is
/// enough to rebuild a distinguishing word.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DistinguishabilityTable {
    state_count: usize,
    marked: FixedBitSet,
    steps: Option<Vec<u32>>,
}

impl DistinguishabilityTable {
    pub fn new(state_count: usize) -> Self {
        DistinguishabilityTable {
            state_count,
            marked: FixedBitSet::with_capacity(Self::cell_count(state_count)),
            steps: None,
        }
    }

    /// Like [DistinguishabilityTable::new], but also records the reason for
    /// every mark.
    pub fn with_witnesses(state_count: usize) -> Self {
        DistinguishabilityTable {
            steps: Some(vec![SEED; Self::cell_count(state_count)]),
            ..Self::new(state_count)
        }
    }

    fn cell_count(state_count: usize) -> usize {
        state_count * state_count.saturating_sub(1) / 2
    }

    fn cell(pair: StatePair) -> usize {
        pair.high() * (pair.high() - 1) / 2 + pair.low()
    }

    pub fn state_count(&self) -> usize {
        self.state_count
    }

    pub fn has_witnesses(&self) -> bool {
        self.steps.is_some()
    }

    /// The reason `{a, b}` is marked. `None` while it is unmarked or when
    /// the table does not record witnesses. A state is never
    /// distinguishable from itself.
    pub fn mark_of(&self, a: StateIndex, b: StateIndex) -> Option<Mark> {
        if !self.is_marked(a, b) {
            return None;
        }

        let steps = self.steps.as_ref()?;
        Some(match steps[Self::cell(StatePair::new(a, b))] {
            SEED => Mark::Seed,
            symbol => Mark::Step {
                symbol: symbol as SymbolIndex,
            },
        })
    }

    pub fn is_marked(&self, a: StateIndex, b: StateIndex) -> bool {
        a != b && self.is_pair_marked(StatePair::new(a, b))
    }

    fn is_pair_marked(&self, pair: StatePair) -> bool {
        self.marked.contains(Self::cell(pair))
    }

    /// Marks `pair` unless it is marked already. Returns whether the pair was
    /// newly marked; an existing mark is never replaced.
    pub fn mark(&mut self, pair: StatePair, mark: Mark) -> bool {
        let cell = Self::cell(pair);
        if self.marked.put(cell) {
            return false;
        }

        if let Some(steps) = &mut self.steps {
            steps[cell] = match mark {
                Mark::Seed => SEED,
                // symbol indices stay below u32::MAX
                Mark::Step { symbol } => symbol as u32,
            };
        }
        true
    }

    pub fn marked_count(&self) -> usize {
        self.marked.count_ones(..)
    }

    /// All pairs without a mark, in ascending lexicographic order.
    pub fn unmarked_pairs(&self) -> impl Iterator<Item = StatePair> + '_ {
        let n = self.state_count;
        (0..n)
            .flat_map(move |low| (low + 1..n).map(move |high| StatePair::new(low, high)))
            .filter(|pair| !self.is_pair_marked(*pair))
    }

    pub fn equivalent_pairs(&self) -> EquivalentPairs {
        EquivalentPairs::new(self.state_count, self.unmarked_pairs().collect())
    }

    /// A word that leads `a` and `b` to states with different acceptance in
    /// `dfa`, rebuilt from the recorded marks. `None` if the pair is
    /// unmarked or the table does not record witnesses.
    ///
    /// Tables filled with [PropagationStrategy::Worklist] yield a shortest
    /// such word.
    pub fn witness(&self, dfa: &Dfa, a: StateIndex, b: StateIndex) -> Option<Vec<SymbolIndex>> {
        let mut mark = self.mark_of(a, b)?;
        let (mut low, mut high) = (a, b);
        let mut word = vec![];

        // successors are always marked strictly before their predecessors,
        // so the chain ends in a seed
        while let Mark::Step { symbol } = mark {
            word.push(symbol);
            low = dfa.successor(low, symbol);
            high = dfa.successor(high, symbol);
            mark = self.mark_of(low, high)?;
        }

        Some(word)
    }

    /// Renders the lower triangle: row `high`, column `low`, `x` for a
    /// marked pair and `.` for an unmarked one.
    pub fn render(&self) -> String {
        let width = self.state_count.saturating_sub(1).to_string().len();
        let mut out = String::new();

        for high in 1..self.state_count {
            out.push_str(&format!("{:>width$} |", high, width = width));
            for low in 0..high {
                let symbol = if self.is_marked(low, high) { 'x' } else { '.' };
                out.push_str(&format!(" {:>width$}", symbol, width = width));
            }
            out.push('\n');
        }

        if self.state_count > 1 {
            out.push_str(&format!("{:>width$}  ", "", width = width));
            for low in 0..self.state_count - 1 {
                out.push_str(&format!(" {:>width$}", low, width = width));
            }
            out.push('\n');
        }

        out
    }
}

/// Runs the table-filling algorithm on one automaton.
///
/// ```
/// use dfa_equiv_lib::automaton::dfa::{Dfa, equivalence::EquivalenceTableBuilder};
///
/// let dfa = Dfa::from_rows(&[], vec![vec![1, 2], vec![1, 2], vec![1, 2]]).unwrap();
/// let table = EquivalenceTableBuilder::new(&dfa).build();
///
/// assert_eq!(table.equivalent_pairs().to_string(), "(0, 1) (0, 2) (1, 2)");
/// ```
#[derive(Debug, Clone)]
pub struct EquivalenceTableBuilder<'a> {
    dfa: &'a Dfa,
    strategy: PropagationStrategy,
    witnesses: bool,
}

impl<'a> EquivalenceTableBuilder<'a> {
    pub fn new(dfa: &'a Dfa) -> Self {
        EquivalenceTableBuilder {
            dfa,
            strategy: PropagationStrategy::default(),
            witnesses: false,
        }
    }

    pub fn with_strategy(mut self, strategy: PropagationStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Record why each pair was marked, so that
    /// [DistinguishabilityTable::witness] can rebuild distinguishing words.
    /// Costs four bytes per pair on top of the one bit of the table.
    pub fn with_witnesses(mut self, witnesses: bool) -> Self {
        self.witnesses = witnesses;
        self
    }

    /// Seeds the table and propagates marks until nothing changes.
    pub fn build(&self) -> DistinguishabilityTable {
        let state_count = self.dfa.state_count();
        let mut table = if self.witnesses {
            DistinguishabilityTable::with_witnesses(state_count)
        } else {
            DistinguishabilityTable::new(state_count)
        };

        let seeded = self.seed(&mut table);
        tracing::debug!(
            "Seeded {} of {} pairs by acceptance",
            seeded.len(),
            DistinguishabilityTable::cell_count(state_count)
        );

        match self.strategy {
            PropagationStrategy::Worklist => self.propagate_worklist(&mut table, seeded),
            PropagationStrategy::Rescan => self.propagate_rescan(&mut table),
        }

        tracing::debug!(
            "Fixed point reached with {} marked pairs",
            table.marked_count()
        );

        table
    }

    // mark all pairs where exactly one state is final
    fn seed(&self, table: &mut DistinguishabilityTable) -> Vec<StatePair> {
        let mut seeded = vec![];

        for high in 1..self.dfa.state_count() {
            for low in 0..high {
                if self.dfa.is_final(low) != self.dfa.is_final(high) {
                    let pair = StatePair::new(low, high);
                    table.mark(pair, Mark::Seed);
                    seeded.push(pair);
                }
            }
        }

        seeded
    }

    fn propagate_worklist(&self, table: &mut DistinguishabilityTable, seeded: Vec<StatePair>) {
        let reverse = ReverseTransitions::new(self.dfa);
        let mut queue = VecDeque::from(seeded);
        let mut processed = 0usize;

        // every pair enters the queue exactly once, when it gets marked
        while let Some(pair) = queue.pop_front() {
            processed += 1;

            for symbol in 0..self.dfa.alphabet_size() {
                let low_sources = reverse.predecessors(pair.low(), symbol);
                let high_sources = reverse.predecessors(pair.high(), symbol);

                for &p in low_sources {
                    for &q in high_sources {
                        // p == q would need two different successors on one symbol
                        let predecessor = StatePair::new(p, q);
                        if table.mark(predecessor, Mark::Step { symbol }) {
                            queue.push_back(predecessor);
                        }
                    }
                }
            }
        }

        tracing::debug!("Worklist processed {} marked pairs", processed);
    }

    fn propagate_rescan(&self, table: &mut DistinguishabilityTable) {
        let mut passes = 0usize;
        let mut changed = true;

        while changed {
            changed = false;
            passes += 1;

            for high in 1..self.dfa.state_count() {
                for low in 0..high {
                    let pair = StatePair::new(low, high);
                    if table.is_pair_marked(pair) {
                        continue;
                    }

                    for symbol in 0..self.dfa.alphabet_size() {
                        let low_target = self.dfa.successor(low, symbol);
                        let high_target = self.dfa.successor(high, symbol);

                        if low_target == high_target {
                            continue;
                        }

                        if table.is_pair_marked(StatePair::new(low_target, high_target)) {
                            table.mark(pair, Mark::Step { symbol });
                            changed = true;
                            break;
                        }
                    }
                }
            }
        }

        tracing::debug!("Rescan needed {} passes", passes);
    }
}

/// Computes all pairs of Myhill-Nerode equivalent states of `dfa`.
pub fn compute_equivalent_pairs(dfa: &Dfa) -> EquivalentPairs {
    EquivalenceTableBuilder::new(dfa).build().equivalent_pairs()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn both_strategies(dfa: &Dfa) -> [DistinguishabilityTable; 2] {
        [PropagationStrategy::Worklist, PropagationStrategy::Rescan].map(|strategy| {
            EquivalenceTableBuilder::new(dfa)
                .with_strategy(strategy)
                .with_witnesses(true)
                .build()
        })
    }

    #[test]
    fn table_indexing_is_symmetric() {
        let mut table = DistinguishabilityTable::new(4);

        assert!(table.mark(StatePair::new(3, 1), Mark::Seed));
        assert!(table.is_marked(1, 3));
        assert!(table.is_marked(3, 1));
        assert!(!table.is_marked(1, 1));
        assert!(!table.is_marked(0, 3));
        assert_eq!(table.marked_count(), 1);
    }

    #[test]
    fn marks_are_never_replaced() {
        let mut table = DistinguishabilityTable::with_witnesses(3);
        let pair = StatePair::new(0, 2);

        assert!(table.mark(pair, Mark::Seed));
        assert!(!table.mark(pair, Mark::Step { symbol: 0 }));
        assert_eq!(table.mark_of(0, 2), Some(Mark::Seed));
    }

    #[test]
    fn marks_are_only_kept_with_witnesses() {
        let mut table = DistinguishabilityTable::new(3);
        table.mark(StatePair::new(0, 2), Mark::Step { symbol: 1 });

        assert!(!table.has_witnesses());
        assert!(table.is_marked(0, 2));
        assert_eq!(table.mark_of(0, 2), None);
    }

    #[test]
    fn unmarked_pairs_are_lexicographic() {
        let mut table = DistinguishabilityTable::new(4);
        table.mark(StatePair::new(0, 2), Mark::Seed);

        let pairs: Vec<_> = table.unmarked_pairs().map(<(usize, usize)>::from).collect();
        assert_eq!(pairs, vec![(0, 1), (0, 3), (1, 2), (1, 3), (2, 3)]);
    }

    #[test]
    fn single_state_has_no_pairs() {
        let dfa = Dfa::from_rows(&[0], vec![vec![0, 0]]).unwrap();

        for table in both_strategies(&dfa) {
            assert!(table.equivalent_pairs().is_empty());
            assert_eq!(table.render(), "");
        }
    }

    #[test]
    fn acceptance_mismatch_is_seeded() {
        let dfa = Dfa::from_rows(&[1], vec![vec![0, 1], vec![1, 1]]).unwrap();

        for table in both_strategies(&dfa) {
            assert_eq!(table.mark_of(0, 1), Some(Mark::Seed));
            assert_eq!(table.witness(&dfa, 0, 1), Some(vec![]));
        }
    }

    #[test]
    fn propagation_follows_successors() {
        // 0 -a-> 1 -a-> 2 -a-> 3 (final, loops)
        let dfa = Dfa::from_rows(&[3], vec![vec![1], vec![2], vec![3], vec![3]]).unwrap();

        for table in both_strategies(&dfa) {
            assert!(table.equivalent_pairs().is_empty());
            assert_eq!(table.marked_count(), 6);
            assert_eq!(table.mark_of(2, 3), Some(Mark::Seed));
        }

        let [worklist, _] = both_strategies(&dfa);
        assert_eq!(worklist.witness(&dfa, 0, 1), Some(vec![0, 0]));
        assert_eq!(worklist.witness(&dfa, 0, 2), Some(vec![0]));
        assert_eq!(worklist.mark_of(1, 2), Some(Mark::Step { symbol: 0 }));
    }

    #[test]
    fn witnesses_need_recording() {
        let dfa = Dfa::from_rows(&[3], vec![vec![1], vec![2], vec![3], vec![3]]).unwrap();
        let table = EquivalenceTableBuilder::new(&dfa).build();

        assert!(table.is_marked(0, 1));
        assert_eq!(table.witness(&dfa, 0, 1), None);
    }

    #[test]
    fn empty_alphabet_only_separates_by_acceptance() {
        let dfa = Dfa::new(vec![], &[1, 3], vec![vec![], vec![], vec![], vec![]]).unwrap();

        for table in both_strategies(&dfa) {
            assert_eq!(table.equivalent_pairs().to_string(), "(0, 2) (1, 3)");
        }
    }

    #[test]
    fn large_cycle_fits_in_a_bit_table() {
        // a single cycle over 3000 states with a final state every 1500
        // steps: exactly the states 1500 apart are equivalent
        let n = 3000;
        let rows = (0..n).map(|state| vec![(state + 1) % n]).collect();
        let dfa = Dfa::from_rows(&[0, 1500], rows).unwrap();

        let table = EquivalenceTableBuilder::new(&dfa).build();
        let pairs = table.equivalent_pairs();

        assert_eq!(pairs.len(), 1500);
        assert!(pairs.contains(0, 1500));
        assert!(pairs.contains(1499, 2999));
        assert!(!pairs.contains(0, 1));
        assert_eq!(table.marked_count(), n * (n - 1) / 2 - 1500);
        assert!(!table.has_witnesses());

        let recorded = EquivalenceTableBuilder::new(&dfa).with_witnesses(true).build();
        assert_eq!(recorded.equivalent_pairs(), pairs);
        assert_eq!(recorded.witness(&dfa, 1, 2).map(|w| w.len()), Some(1498));
    }

    #[test]
    fn render_draws_lower_triangle() {
        let dfa = Dfa::from_rows(&[2], vec![vec![2], vec![2], vec![2]]).unwrap();
        let table = EquivalenceTableBuilder::new(&dfa).build();

        assert_eq!(table.render(), "1 | .\n2 | x x\n    0 1\n");
    }

    #[test]
    fn strategy_parses_from_str() {
        assert_eq!("Rescan".parse(), Ok(PropagationStrategy::Rescan));
        assert_eq!("worklist".parse(), Ok(PropagationStrategy::Worklist));
        assert!("hopcroft".parse::<PropagationStrategy>().is_err());
    }
}
