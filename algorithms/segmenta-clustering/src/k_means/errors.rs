use thiserror::Error;

/// An error when fitting with an invalid hyperparameter
#[derive(Error, Debug)]
pub enum KMeansParamsError {
    #[error("n_clusters cannot be 0")]
    NClusters,
    #[error("n_runs cannot be 0")]
    NRuns,
    #[error("max_n_iterations cannot be 0")]
    MaxIterations,
}

/// An error when modeling a KMeans algorithm
#[derive(Error, Debug)]
pub enum KMeansError {
    /// When any of the hyperparameters are set the wrong value
    #[error("Invalid hyperparameter: {0}")]
    InvalidParams(#[from] KMeansParamsError),
    /// When a cluster ends up without members and empty clusters are rejected
    #[error("Fitting failed: cluster {0} is empty")]
    EmptyCluster(usize),
    #[error(transparent)]
    SegmentaError(#[from] segmenta::error::Error),
}
