use std::fs;

use anyhow::Context;
use dfa_equiv_lib::{
    logger::Logger,
    random::{generate_random_dfas, to_batch_format},
};

use crate::Args;

pub fn generate(logger: &Logger, args: &Args) -> anyhow::Result<()> {
    logger.info("Generating random DFAs...");

    let dfas = generate_random_dfas(&args.random_options(), args.shape());

    logger.info(&format!("Generated {} random DFAs.", dfas.len()));

    let batch = to_batch_format(&dfas);

    match &args.output {
        Some(file) => {
            fs::write(file, batch).with_context(|| format!("failed to write: {}", file))?;
            logger.info(&format!("Persisted random DFAs to file: {}", file));
        }
        None => print!("{}", batch),
    }

    Ok(())
}
