use std::fmt::Display;

use crate::automaton::StateIndex;

/// A node in the graph view of a [super::Dfa].
/// It carries the table index of the state it stands for and a flag
/// indicating whether the state is accepting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DfaNode {
    pub state: StateIndex,
    pub accepting: bool,
}

impl DfaNode {
    pub fn new(state: StateIndex, accepting: bool) -> Self {
        DfaNode { state, accepting }
    }

    pub fn accepting(&self) -> bool {
        self.accepting
    }

    pub fn state(&self) -> StateIndex {
        self.state
    }
}

impl Display for DfaNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.state)
    }
}
