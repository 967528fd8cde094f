use crate::KMeansError;
use thiserror::Error;

/// An error when selecting K with an invalid hyperparameter
#[derive(Error, Debug)]
pub enum KSelectionParamsError {
    #[error("the candidate range {min}..={max} is empty")]
    EmptyRange { min: usize, max: usize },
    #[error("candidate numbers of clusters must be at least 1")]
    ZeroClusters,
    #[error("sample_size must be at least 2")]
    SampleSize,
    #[error("n_runs cannot be 0")]
    NRuns,
    #[error("max_n_iterations cannot be 0")]
    MaxIterations,
}

/// An error when selecting the number of clusters
#[derive(Error, Debug)]
pub enum KSelectionError {
    /// When any of the hyperparameters are set the wrong value
    #[error("Invalid hyperparameter: {0}")]
    InvalidParams(#[from] KSelectionParamsError),
    /// When no candidate produced a clustering with two non-empty clusters
    #[error("no feasible clustering for any K in {k_min}..={k_max}")]
    NoFeasibleClustering { k_min: usize, k_max: usize },
    #[error(transparent)]
    KMeans(#[from] KMeansError),
    #[error(transparent)]
    SegmentaError(#[from] segmenta::error::Error),
}
