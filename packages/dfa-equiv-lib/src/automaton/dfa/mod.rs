use itertools::Itertools;
use node::DfaNode;
use petgraph::{
    graph::{DiGraph, NodeIndex},
    visit::EdgeRef,
};
use thiserror::Error;

use crate::automaton::{
    Automaton, StateIndex, SymbolIndex, dfa::pair::EquivalentPairs,
};

pub mod equivalence;
pub mod node;
pub mod pair;

/// Structural problems in an automaton description. Raised while building a
/// [Dfa], either directly or through the text parser.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MalformedAutomaton {
    #[error("unexpected end of input, expected {0}")]
    UnexpectedEnd(&'static str),

    #[error("missing {0}")]
    MissingValue(&'static str),

    #[error("'{0}' is not a non-negative integer")]
    InvalidInteger(String),

    #[error("unexpected '{found}' after {expected}")]
    UnexpectedTokens {
        expected: &'static str,
        found: String,
    },

    #[error("an automaton needs at least one state")]
    EmptyStateSet,

    #[error("transition row of state {state} has {found} entries, expected {expected}")]
    RowLengthMismatch {
        state: StateIndex,
        expected: usize,
        found: usize,
    },

    #[error(
        "transition of state {state} on symbol {symbol} targets state {target}, but there are only {state_count} states"
    )]
    TransitionOutOfRange {
        state: StateIndex,
        symbol: SymbolIndex,
        target: StateIndex,
        state_count: usize,
    },

    #[error("final state {state} is out of range for {state_count} states")]
    FinalStateOutOfRange {
        state: StateIndex,
        state_count: usize,
    },
}

/// A complete deterministic finite automaton in table form.
///
/// The transition function is stored row-major: the successor of state `p`
/// on symbol `s` lives at `p * alphabet_size + s`. A `Dfa` can only be
/// built through [Dfa::new], which checks that the table is total and that
/// every referenced state exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dfa {
    alphabet: Vec<String>,
    accepting: Vec<bool>,
    transitions: Vec<StateIndex>,
}

impl Dfa {
    /// Builds a DFA from its alphabet, its final states and one transition
    /// row per state. Row `i` describes state `i` and must have one entry per
    /// alphabet symbol. Final states may be listed more than once.
    pub fn new(
        alphabet: Vec<String>,
        final_states: &[StateIndex],
        rows: Vec<Vec<StateIndex>>,
    ) -> Result<Self, MalformedAutomaton> {
        let state_count = rows.len();
        if state_count == 0 {
            return Err(MalformedAutomaton::EmptyStateSet);
        }

        let mut accepting = vec![false; state_count];
        for &state in final_states {
            if state >= state_count {
                return Err(MalformedAutomaton::FinalStateOutOfRange { state, state_count });
            }
            accepting[state] = true;
        }

        let alphabet_size = alphabet.len();
        let mut transitions = Vec::with_capacity(state_count * alphabet_size);

        for (state, row) in rows.into_iter().enumerate() {
            if row.len() != alphabet_size {
                return Err(MalformedAutomaton::RowLengthMismatch {
                    state,
                    expected: alphabet_size,
                    found: row.len(),
                });
            }

            if let Some((symbol, &target)) = row.iter().find_position(|&&t| t >= state_count) {
                return Err(MalformedAutomaton::TransitionOutOfRange {
                    state,
                    symbol,
                    target,
                    state_count,
                });
            }

            transitions.extend(row);
        }

        Ok(Dfa {
            alphabet,
            accepting,
            transitions,
        })
    }

    /// Like [Dfa::new], but names the symbols `a`, `b`, `c`, ... after the
    /// width of the first row.
    pub fn from_rows(
        final_states: &[StateIndex],
        rows: Vec<Vec<StateIndex>>,
    ) -> Result<Self, MalformedAutomaton> {
        let width = rows.first().map(|row| row.len()).unwrap_or(0);
        Dfa::new(default_alphabet(width), final_states, rows)
    }

    pub fn alphabet(&self) -> &[String] {
        &self.alphabet
    }

    pub fn symbol_name(&self, symbol: SymbolIndex) -> &str {
        &self.alphabet[symbol]
    }

    pub fn final_states(&self) -> impl Iterator<Item = StateIndex> + '_ {
        self.accepting
            .iter()
            .enumerate()
            .filter(|(_, accepting)| **accepting)
            .map(|(state, _)| state)
    }

    /// The transition row of `state`, indexed by symbol.
    pub fn row(&self, state: StateIndex) -> &[StateIndex] {
        let width = self.alphabet.len();
        &self.transitions[state * width..(state + 1) * width]
    }

    /// Renders a word of symbol indices with the symbol names.
    pub fn word_to_names(&self, word: &[SymbolIndex]) -> Vec<&str> {
        word.iter().map(|&symbol| self.symbol_name(symbol)).collect()
    }

    /// The graph view of this automaton: one node per state, one edge per
    /// table entry labelled with the symbol name. Node `i` is state `i`.
    pub fn to_graph(&self) -> DiGraph<DfaNode, String> {
        let mut graph = DiGraph::with_capacity(self.state_count(), self.transitions.len());

        for state in 0..self.state_count() {
            graph.add_node(DfaNode::new(state, self.accepting[state]));
        }

        for state in 0..self.state_count() {
            for (symbol, &target) in self.row(state).iter().enumerate() {
                graph.add_edge(
                    NodeIndex::new(state),
                    NodeIndex::new(target),
                    self.alphabet[symbol].clone(),
                );
            }
        }

        graph
    }

    /// Renders the automaton in graphviz DOT. When `equivalent` is given,
    /// every equivalent pair is drawn as a dashed, undirected red edge.
    pub fn to_graphviz(&self, equivalent: Option<&EquivalentPairs>) -> String {
        let graph = self.to_graph();

        let mut dot = String::new();
        dot.push_str("digraph finite_state_machine {\n");
        dot.push_str("fontname=\"Helvetica,Arial,sans-serif\"\n");
        dot.push_str("node [fontname=\"Helvetica,Arial,sans-serif\"]\n");
        dot.push_str("edge [fontname=\"Helvetica,Arial,sans-serif\"]\n");
        dot.push_str("rankdir=LR;\n");

        let accepting_states = graph
            .node_indices()
            .filter(|node| graph[*node].accepting())
            .map(|node| graph[node].to_string())
            .join(" ");

        if !accepting_states.is_empty() {
            dot.push_str(&format!("node [shape = doublecircle]; {};\n", accepting_states));
        }
        dot.push_str("node [shape = circle];\n");

        for node in graph.node_indices() {
            dot.push_str(&format!("{};\n", graph[node]));
        }

        for edge in graph.edge_references() {
            dot.push_str(&format!(
                "{} -> {} [ label=\"{}\" ];\n",
                graph[edge.source()],
                graph[edge.target()],
                edge.weight().escape_default()
            ));
        }

        if let Some(equivalent) = equivalent {
            for pair in equivalent {
                dot.push_str(&format!(
                    "{} -> {} [ dir=none style=dashed color=red constraint=false ];\n",
                    pair.low(),
                    pair.high()
                ));
            }
        }

        dot.push_str("}\n");

        dot
    }
}

impl Automaton for Dfa {
    fn state_count(&self) -> usize {
        self.accepting.len()
    }

    fn alphabet_size(&self) -> usize {
        self.alphabet.len()
    }

    fn is_final(&self, state: StateIndex) -> bool {
        self.accepting[state]
    }

    fn successor(&self, state: StateIndex, symbol: SymbolIndex) -> StateIndex {
        self.transitions[state * self.alphabet.len() + symbol]
    }
}

/// Names symbols `a` to `z`, then `s26`, `s27`, ...
pub fn default_alphabet(size: usize) -> Vec<String> {
    (0..size)
        .map(|i| match u8::try_from(i) {
            Ok(i) if i < 26 => char::from(b'a' + i).to_string(),
            _ => format!("s{}", i),
        })
        .collect()
}

/// The inverse of the transition function: for every target state and
/// symbol, the states that move into it on that symbol.
#[derive(Debug, Clone)]
pub struct ReverseTransitions {
    alphabet_size: usize,
    sources: Vec<Vec<StateIndex>>,
}

impl ReverseTransitions {
    pub fn new(dfa: &Dfa) -> Self {
        let alphabet_size = dfa.alphabet_size();
        let mut sources = vec![vec![]; dfa.state_count() * alphabet_size];

        for state in 0..dfa.state_count() {
            for (symbol, &target) in dfa.row(state).iter().enumerate() {
                sources[target * alphabet_size + symbol].push(state);
            }
        }

        ReverseTransitions {
            alphabet_size,
            sources,
        }
    }

    pub fn predecessors(&self, target: StateIndex, symbol: SymbolIndex) -> &[StateIndex] {
        &self.sources[target * self.alphabet_size + symbol]
    }
}
