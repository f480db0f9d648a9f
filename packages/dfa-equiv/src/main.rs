use std::{
    fs,
    io::{self, Read},
    process::ExitCode,
};

use anyhow::Context;
use clap::Parser;
use dfa_equiv_lib::{
    automaton::dfa::equivalence::PropagationStrategy,
    batch::{BatchReport, run_batch},
    config::EquivalenceConfig,
    logger::Logger,
    output::{OutputFormat, render},
};

#[derive(Parser, Debug)]
#[command(name = "DFA Equivalent States")]
#[command(version = "0.1")]
#[command(about = "List the pairs of equivalent states of DFAs with the table-filling algorithm", long_about = None)]
struct Args {
    /// Batch file to read, stdin if omitted.
    file: Option<String>,

    #[arg(short, long)]
    config: Option<String>,

    #[arg(short, long)]
    strategy: Option<PropagationStrategy>,

    #[arg(short, long)]
    format: Option<OutputFormat>,

    /// Compute independent test cases in parallel.
    #[arg(long)]
    parallel: bool,

    /// Include a distinguishing word for every non-equivalent pair (JSON only).
    #[arg(long)]
    witnesses: bool,

    /// Print the distinguishability table of every test case to stderr.
    #[arg(long)]
    table: bool,

    /// Print every automaton as a graphviz graph with its equivalent pairs.
    #[arg(long)]
    dot: bool,
}

impl Args {
    fn read_input(&self) -> anyhow::Result<String> {
        match &self.file {
            Some(file) => {
                fs::read_to_string(file).with_context(|| format!("failed to read {}", file))
            }
            None => {
                let mut input = String::new();
                io::stdin()
                    .read_to_string(&mut input)
                    .context("failed to read stdin")?;
                Ok(input)
            }
        }
    }

    /// Flags given on the command line take precedence over the config file.
    fn apply_to(&self, mut config: EquivalenceConfig) -> EquivalenceConfig {
        if let Some(strategy) = self.strategy {
            config.set_strategy(strategy);
        }
        if let Some(format) = self.format {
            config.set_format(format);
        }
        if self.parallel {
            config.set_parallel(true);
        }
        if self.witnesses {
            config.set_witnesses(true);
        }
        config
    }
}

fn main() -> anyhow::Result<ExitCode> {
    let args = Args::parse();

    let config = args.apply_to(EquivalenceConfig::from_optional_file(args.config.as_ref())?);

    let logger = Logger::from_config(config.get_logger(), "Equivalence")?;
    if let Some(l) = &logger {
        tracing_subscriber::fmt()
            .with_max_level(l.level().to_tracing_level())
            .with_writer(io::stderr)
            .init();
    }

    let input = args.read_input()?;
    let report = run_batch(&input, &config, logger.as_ref())?;

    print_report(&args, &config, &report)?;

    if let Some(l) = &logger {
        l.flush();
    }

    match report.error {
        Some(error) => {
            eprintln!("error: {:#}", anyhow::Error::from(error));
            Ok(ExitCode::FAILURE)
        }
        None => Ok(ExitCode::SUCCESS),
    }
}

fn print_report(
    args: &Args,
    config: &EquivalenceConfig,
    report: &BatchReport,
) -> anyhow::Result<()> {
    if args.table {
        for result in &report.cases {
            eprintln!("Case {}:\n{}", result.case, result.table.render());
        }
    }

    if args.dot {
        for result in &report.cases {
            println!("{}", result.dfa.to_graphviz(Some(&result.pairs)));
        }
    } else {
        print!("{}", render(report, *config.get_format())?);
    }

    Ok(())
}
