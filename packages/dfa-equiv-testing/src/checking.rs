use anyhow::Context;
use dfa_equiv_lib::{
    automaton::{
        Automaton,
        dfa::{
            Dfa,
            equivalence::{EquivalenceTableBuilder, PropagationStrategy},
        },
    },
    logger::Logger,
    random::generate_random_dfas,
    validation::{check_equivalence_properties, same_language::check_distinguishes},
};
use rayon::{
    ThreadPoolBuilder,
    iter::{IndexedParallelIterator, IntoParallelRefIterator, ParallelIterator},
};

use crate::Args;

pub fn check(logger: &Logger, args: &Args) -> anyhow::Result<()> {
    let dfas = generate_random_dfas(&args.random_options(), args.shape());

    logger.info(&format!(
        "Checking {} random DFAs with {} states over {} symbols...",
        dfas.len(),
        args.states,
        args.symbols
    ));

    let mut builder = ThreadPoolBuilder::new();
    if let Some(threads) = args.threads {
        builder = builder.num_threads(threads);
    }
    let pool = builder.build().context("failed to build thread pool")?;

    let failures = pool.install(|| {
        dfas.par_iter()
            .enumerate()
            .filter_map(|(i, dfa)| {
                check_dfa(dfa)
                    .with_context(|| format!("check failed for DFA {} (seed {})", i, args.seed))
                    .err()
            })
            .collect::<Vec<_>>()
    });

    for failure in &failures {
        logger.warn(&format!("{:#}", failure));
    }

    if !failures.is_empty() {
        anyhow::bail!("{} of {} DFAs failed", failures.len(), dfas.len());
    }

    logger.info(&format!("All {} DFAs passed.", dfas.len()));

    Ok(())
}

/// Runs both strategies on `dfa` and compares them against each other and
/// against the properties every equivalence result has to satisfy.
fn check_dfa(dfa: &Dfa) -> anyhow::Result<()> {
    let [worklist, rescan] = [PropagationStrategy::Worklist, PropagationStrategy::Rescan].map(
        |strategy| {
            EquivalenceTableBuilder::new(dfa)
                .with_strategy(strategy)
                .with_witnesses(true)
                .build()
        },
    );

    let pairs = worklist.equivalent_pairs();
    anyhow::ensure!(
        pairs == rescan.equivalent_pairs(),
        "strategies disagree: worklist gives '{}', rescan gives '{}'",
        pairs,
        rescan.equivalent_pairs()
    );

    check_equivalence_properties(dfa, &pairs)?;

    for low in 0..dfa.state_count() {
        for high in low + 1..dfa.state_count() {
            for (strategy, table) in [("worklist", &worklist), ("rescan", &rescan)] {
                if let Some(word) = table.witness(dfa, low, high) {
                    check_distinguishes(dfa, low, high, &word)
                        .with_context(|| format!("{} witness", strategy))?;
                }
            }
        }
    }

    Ok(())
}
