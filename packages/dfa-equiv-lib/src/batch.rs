use rayon::{
    ThreadPoolBuilder,
    iter::{IndexedParallelIterator, IntoParallelIterator, ParallelIterator},
};

use crate::{
    automaton::{
        Automaton, SymbolIndex,
        dfa::{
            Dfa,
            equivalence::{DistinguishabilityTable, EquivalenceTableBuilder, PropagationStrategy},
            pair::{EquivalentPairs, StatePair},
        },
    },
    config::EquivalenceConfig,
    input::{BatchReader, InputError},
    logger::{LogLevel, Logger},
};

/// The outcome of one test case. Owns its automaton and its table, nothing
/// is shared between test cases.
#[derive(Debug, Clone)]
pub struct CaseResult {
    /// 1-based position in the batch.
    pub case: usize,
    pub dfa: Dfa,
    pub table: DistinguishabilityTable,
    pub pairs: EquivalentPairs,
}

impl CaseResult {
    /// Builds the table of `dfa`. With `witnesses` set, the table records
    /// enough to explain every distinguishable pair.
    pub fn compute(case: usize, dfa: Dfa, strategy: PropagationStrategy, witnesses: bool) -> Self {
        let table = EquivalenceTableBuilder::new(&dfa)
            .with_strategy(strategy)
            .with_witnesses(witnesses)
            .build();
        let pairs = table.equivalent_pairs();

        CaseResult {
            case,
            dfa,
            table,
            pairs,
        }
    }

    /// A distinguishing word for every pair that is not equivalent, in
    /// ascending pair order. Empty unless witnesses were recorded.
    pub fn witnesses(&self) -> Vec<(StatePair, Vec<SymbolIndex>)> {
        let n = self.dfa.state_count();

        (0..n)
            .flat_map(|low| (low + 1..n).map(move |high| StatePair::new(low, high)))
            .filter_map(|pair| {
                self.table
                    .witness(&self.dfa, pair.low(), pair.high())
                    .map(|word| (pair, word))
            })
            .collect()
    }
}

/// All results computed before the first malformed test case, plus that
/// error if there was one.
#[derive(Debug, Clone)]
pub struct BatchReport {
    pub cases: Vec<CaseResult>,
    pub error: Option<InputError>,
}

impl BatchReport {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Parses `input` and computes the equivalent pairs of every test case in
/// input order. Parsing stops at the first malformed test case; the cases
/// before it are still computed.
///
/// Only fails if a thread pool was requested and could not be built.
pub fn run_batch(
    input: &str,
    config: &EquivalenceConfig,
    logger: Option<&Logger>,
) -> anyhow::Result<BatchReport> {
    let reader = match BatchReader::new(input) {
        Ok(reader) => reader,
        Err(error) => {
            return Ok(BatchReport {
                cases: vec![],
                error: Some(error),
            });
        }
    };

    if let Some(l) = logger {
        l.info(&format!("Reading {} test cases", reader.case_count()));
    }

    let mut dfas = vec![];
    let mut error = None;
    for case in reader {
        match case {
            Ok(dfa) => dfas.push(dfa),
            Err(e) => error = Some(e),
        }
    }

    let strategy = *config.get_strategy();
    let witnesses = *config.get_witnesses();
    let cases: Vec<CaseResult> = if *config.get_parallel() {
        let mut builder = ThreadPoolBuilder::new();
        if let Some(threads) = config.get_threads() {
            builder = builder.num_threads(*threads);
        }
        let pool = builder.build()?;

        pool.install(|| {
            dfas.into_par_iter()
                .enumerate()
                .map(|(i, dfa)| CaseResult::compute(i + 1, dfa, strategy, witnesses))
                .collect()
        })
    } else {
        dfas.into_iter()
            .enumerate()
            .map(|(i, dfa)| CaseResult::compute(i + 1, dfa, strategy, witnesses))
            .collect()
    };

    if let Some(l) = logger {
        for result in &cases {
            l.object("Case")
                .add_field("case", result.case)
                .add_field("states", result.dfa.state_count())
                .add_field("symbols", result.dfa.alphabet_size())
                .add_field("marked", result.table.marked_count())
                .add_field("equivalent", result.pairs.len())
                .log(LogLevel::Debug);
        }

        if let Some(e) = &error {
            l.warn(&format!("Stopped at malformed input: {}", e));
        }
    }

    Ok(BatchReport { cases, error })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn witnesses_skip_equivalent_pairs() {
        let dfa = Dfa::from_rows(&[2], vec![vec![2], vec![2], vec![2]]).unwrap();
        let result = CaseResult::compute(1, dfa, PropagationStrategy::Worklist, true);

        assert_eq!(
            result.witnesses(),
            vec![(StatePair::new(0, 2), vec![]), (StatePair::new(1, 2), vec![])]
        );
    }

    #[test]
    fn witnesses_are_empty_unless_recorded() {
        let dfa = Dfa::from_rows(&[2], vec![vec![2], vec![2], vec![2]]).unwrap();
        let result = CaseResult::compute(1, dfa, PropagationStrategy::Rescan, false);

        assert!(result.witnesses().is_empty());
        assert_eq!(result.pairs.to_string(), "(0, 1)");
    }
}
