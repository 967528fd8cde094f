use std::{fs, path::PathBuf};

use anyhow::Context;
use clap::ValueEnum;
use segmenta::ParamGuard;
use segmenta_clustering::KMeansInit;
use segmenta_segments::{DecisionTable, SegmentationParams};

use crate::report;

#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Init {
    #[default]
    Random,
    KmeansPlusPlus,
}

impl From<Init> for KMeansInit {
    fn from(init: Init) -> Self {
        match init {
            Init::Random => KMeansInit::Random,
            Init::KmeansPlusPlus => KMeansInit::KMeansPlusPlus,
        }
    }
}

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct RunArg {
    /// Customer CSV file
    #[arg(short, long)]
    input: PathBuf,
    /// Directory receiving the output tables
    #[arg(short, long, default_value = "out")]
    output_dir: PathBuf,
    /// Smallest number of clusters tried
    #[arg(long, default_value_t = 3)]
    k_min: usize,
    /// Largest number of clusters tried
    #[arg(long, default_value_t = 6)]
    k_max: usize,
    /// Rows drawn to score every candidate number of clusters
    #[arg(long, default_value_t = 2000)]
    sample_size: usize,
    /// Seed of the sampling and of every K-means run
    #[arg(long, default_value_t = 42)]
    seed: u64,
    /// K-means restarts per candidate number of clusters
    #[arg(long, default_value_t = 10)]
    selection_runs: usize,
    /// K-means restarts of the final partition
    #[arg(long, default_value_t = 20)]
    final_runs: usize,
    /// Iteration bound of every K-means run
    #[arg(long, default_value_t = 300)]
    max_iterations: u64,
    /// Centroid initialisation
    #[arg(long, value_enum, default_value_t = Init::Random)]
    init: Init,
    /// Decision table JSON file, the built-in table when absent
    #[arg(long)]
    rules: Option<PathBuf>,
}

pub(crate) fn run(arg: &RunArg) -> anyhow::Result<()> {
    let decision_table = match &arg.rules {
        Some(path) => {
            let json = fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            DecisionTable::from_json(&json)
                .with_context(|| format!("invalid decision table {}", path.display()))?
        }
        None => DecisionTable::builtin(),
    };

    let pipeline = SegmentationParams::new()
        .k_range(arg.k_min..=arg.k_max)
        .sample_size(arg.sample_size)
        .seed(arg.seed)
        .selection_runs(arg.selection_runs)
        .final_runs(arg.final_runs)
        .max_n_iterations(arg.max_iterations)
        .init_method(arg.init.into())
        .decision_table(decision_table)
        .check()?;

    let table = report::read_customers(&arg.input)
        .with_context(|| format!("failed to load customers from {}", arg.input.display()))?;
    let segmentation = pipeline
        .run(&table, None)
        .context("segmentation failed")?;

    let tables = report::render(&table, &segmentation)?;
    report::write_all(&arg.output_dir, &tables)
        .with_context(|| format!("failed to write to {}", arg.output_dir.display()))?;
    log::info!(
        "k={}, {} tables written to {}",
        segmentation.n_clusters(),
        tables.len(),
        arg.output_dir.display()
    );
    Ok(())
}
