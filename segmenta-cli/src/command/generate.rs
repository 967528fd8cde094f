use std::path::PathBuf;

use anyhow::Context;
use ndarray_rand::rand::SeedableRng;
use rand_isaac::Isaac64Rng;
use segmenta_datasets::generate;

use crate::report;

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct GenerateArg {
    /// Number of customers
    #[arg(long, default_value_t = 5000)]
    rows: usize,
    /// Seed of the random generator
    #[arg(long, default_value_t = 42)]
    seed: u64,
    /// Output CSV file
    #[arg(short, long, default_value = "customers.csv")]
    output: PathBuf,
}

pub(crate) fn run(arg: &GenerateArg) -> anyhow::Result<()> {
    let mut rng = Isaac64Rng::seed_from_u64(arg.seed);
    let customers = generate::customers(arg.rows, &mut rng);
    report::write_customers(&arg.output, &customers)
        .with_context(|| format!("failed to write {}", arg.output.display()))?;
    log::info!("wrote {} customers to {}", customers.len(), arg.output.display());
    Ok(())
}
