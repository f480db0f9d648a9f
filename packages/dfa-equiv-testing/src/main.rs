use std::{fmt::Display, str::FromStr};

use anyhow::Context;
use clap::Parser;
use dfa_equiv_lib::{
    logger::{LogLevel, Logger},
    random::{RandomDfaShape, RandomOptions},
};

use crate::{checking::check, generation::generate};

pub mod checking;
pub mod generation;

#[derive(Parser, Debug)]
#[command(name = "DFA Equivalent States Tester")]
#[command(version = "0.1")]
#[command(about = "Generate random DFA batches and cross-check the equivalence algorithms", long_about = None)]
pub struct Args {
    /// Where `generate` writes the batch, stdout if omitted.
    output: Option<String>,

    #[arg(short, long, default_value_t = Mode::Check)]
    mode: Mode,

    #[arg(long, default_value_t = 1)]
    seed: u64,

    #[arg(long, default_value_t = 100)]
    count: usize,

    #[arg(long, default_value_t = 10)]
    states: usize,

    #[arg(long, default_value_t = 2)]
    symbols: usize,

    /// Probability for each state to be final, between 0 and 1.
    #[arg(long, default_value_t = 0.3, value_parser = parse_probability)]
    final_probability: f64,

    /// Threads used by `check`, rayon's default if omitted.
    #[arg(short, long)]
    threads: Option<usize>,
}

fn parse_probability(s: &str) -> Result<f64, String> {
    let p: f64 = s
        .parse()
        .map_err(|_| format!("'{}' is not a number", s))?;

    if !(0.0..=1.0).contains(&p) {
        return Err(format!("{} is not a probability between 0 and 1", s));
    }

    Ok(p)
}

impl Args {
    pub fn random_options(&self) -> RandomOptions {
        RandomOptions::default()
            .with_seed(self.seed)
            .with_count(self.count)
    }

    pub fn shape(&self) -> RandomDfaShape {
        RandomDfaShape::new(self.states, self.symbols, self.final_probability)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    Check,
    Generate,
}

impl FromStr for Mode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "check" => Ok(Mode::Check),
            "generate" | "gen" => Ok(Mode::Generate),
            _ => Err(anyhow::anyhow!("Invalid mode: {}", s)),
        }
    }
}

impl Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Mode::Check => write!(f, "Check"),
            Mode::Generate => write!(f, "Generate"),
        }
    }
}

fn main() -> std::process::ExitCode {
    let logger = Logger::new(LogLevel::Info, "tester");
    let res = run(&logger);
    match &res {
        Ok(_) => {
            logger.info("Tester completed successfully.");
            std::process::ExitCode::SUCCESS
        }
        Err(e) => {
            logger.error(&format!("Tester failed with error: {:#}", e));
            std::process::ExitCode::FAILURE
        }
    }
}

fn run(logger: &Logger) -> anyhow::Result<()> {
    let args = Args::parse();

    match &args.mode {
        Mode::Generate => generate(logger, &args),
        Mode::Check => check(logger, &args),
    }
    .with_context(|| format!("failed in mode: {}", &args.mode))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn probability_must_be_in_unit_interval() {
        assert_eq!(parse_probability("0.25"), Ok(0.25));
        assert_eq!(parse_probability("1"), Ok(1.0));
        assert!(parse_probability("nan").is_err());
        assert!(parse_probability("inf").is_err());
        assert!(parse_probability("-0.5").is_err());
        assert!(parse_probability("1.5").is_err());
        assert!(parse_probability("often").is_err());
    }

    #[test]
    fn args_reject_nan_probability() {
        let args = Args::try_parse_from(["tester", "--final-probability", "nan"]);
        assert!(args.is_err());

        let args =
            Args::try_parse_from(["tester", "-m", "generate", "--final-probability", "0.5"])
                .unwrap();
        assert_eq!(args.mode, Mode::Generate);
        assert_eq!(args.shape().final_probability, 0.5);
    }
}
