use itertools::Itertools;
use rand::{RngExt, SeedableRng, rngs::StdRng};

use crate::automaton::{
    Automaton,
    dfa::{Dfa, default_alphabet},
};

pub struct RandomOptions {
    pub seed: u64,
    pub count: usize,
}

impl Default for RandomOptions {
    fn default() -> Self {
        RandomOptions { seed: 1, count: 10 }
    }
}

impl RandomOptions {
    pub fn new(seed: u64, count: usize) -> Self {
        RandomOptions { seed, count }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_count(mut self, count: usize) -> Self {
        self.count = count;
        self
    }
}

/// Shape of the generated automata.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RandomDfaShape {
    pub state_count: usize,
    pub alphabet_size: usize,
    /// Probability for each state to be final.
    pub final_probability: f64,
}

impl RandomDfaShape {
    pub fn new(state_count: usize, alphabet_size: usize, final_probability: f64) -> Self {
        RandomDfaShape {
            state_count,
            alphabet_size,
            final_probability,
        }
    }
}

/// Generates `options.count` complete DFAs with uniformly random
/// transitions. The same seed always yields the same automata. The final
/// probability is clamped to `[0, 1]`.
pub fn generate_random_dfas(options: &RandomOptions, shape: RandomDfaShape) -> Vec<Dfa> {
    let mut r = StdRng::seed_from_u64(options.seed);
    let state_count = shape.state_count.max(1);
    // NaN never makes a state final
    let final_probability = if shape.final_probability.is_nan() {
        0.0
    } else {
        shape.final_probability.clamp(0.0, 1.0)
    };

    (0..options.count)
        .filter_map(|_| {
            let final_states = (0..state_count)
                .filter(|_| r.random_bool(final_probability))
                .collect_vec();

            let rows = (0..state_count)
                .map(|_| {
                    (0..shape.alphabet_size)
                        .map(|_| r.random_range(0..state_count))
                        .collect_vec()
                })
                .collect_vec();

            Dfa::new(default_alphabet(shape.alphabet_size), &final_states, rows).ok()
        })
        .collect()
}

/// Writes automata in the batch text format, so that the output can be fed
/// back into the parser.
pub fn to_batch_format(dfas: &[Dfa]) -> String {
    let mut out = format!("{}\n", dfas.len());

    for dfa in dfas {
        out.push_str(&format!("{}\n", dfa.state_count()));
        out.push_str(&format!("{}\n", dfa.alphabet().join(" ")));
        out.push_str(&format!("{}\n", dfa.final_states().join(" ")));
        for state in 0..dfa.state_count() {
            out.push_str(&format!("{}\n", dfa.row(state).iter().join(" ")));
        }
    }

    out
}

#[test]
fn test_generation_is_deterministic() {
    let shape = RandomDfaShape::new(6, 2, 0.3);
    let a = generate_random_dfas(&RandomOptions::new(7, 5), shape);
    let b = generate_random_dfas(&RandomOptions::new(7, 5), shape);

    assert_eq!(a.len(), 5);
    assert_eq!(a, b);
    assert!(a.iter().all(|dfa| dfa.state_count() == 6 && dfa.alphabet_size() == 2));
}

#[test]
fn test_generation_tolerates_invalid_probabilities() {
    let options = RandomOptions::new(3, 4);

    let none_final = generate_random_dfas(&options, RandomDfaShape::new(5, 1, f64::NAN));
    assert!(none_final.iter().all(|dfa| dfa.final_states().count() == 0));

    let all_final = generate_random_dfas(&options, RandomDfaShape::new(5, 1, f64::INFINITY));
    assert!(all_final.iter().all(|dfa| dfa.final_states().count() == 5));
}
