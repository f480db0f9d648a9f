pub mod dfa;

/// States of a [dfa::Dfa] are identified by their row in the transition
/// table, `0..state_count`.
pub type StateIndex = usize;

/// Symbols are identified by their position on the alphabet line,
/// `0..alphabet_size`. Their names only matter for display.
pub type SymbolIndex = usize;

/// Read-only view of a complete deterministic automaton.
pub trait Automaton {
    fn state_count(&self) -> usize;
    fn alphabet_size(&self) -> usize;
    fn is_final(&self, state: StateIndex) -> bool;
    fn successor(&self, state: StateIndex, symbol: SymbolIndex) -> StateIndex;

    /// The state reached by reading `word` starting in `state`.
    fn run(&self, state: StateIndex, word: &[SymbolIndex]) -> StateIndex {
        word.iter()
            .fold(state, |current, &symbol| self.successor(current, symbol))
    }

    fn accepts_from(&self, state: StateIndex, word: &[SymbolIndex]) -> bool {
        self.is_final(self.run(state, word))
    }
}
