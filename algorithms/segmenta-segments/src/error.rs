//! Error definitions for profiling, segment mapping and the pipeline
use segmenta_clustering::{KMeansError, KSelectionError};
use segmenta_preprocessing::PreprocessingError;
use thiserror::Error;

/// An error when aggregating clusters
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProfileError {
    #[error("{memberships} cluster memberships for a table of {records} rows")]
    MembershipMismatch { records: usize, memberships: usize },
}

/// An error when loading or building a decision table
#[derive(Error, Debug)]
pub enum DecisionTableError {
    #[error("a decision table needs at least one rule")]
    NoRules,
    #[error("segment `{0}` is defined more than once")]
    DuplicateSegment(String),
    #[error("rule {rule} refers to the undefined segment `{segment}`")]
    UnknownSegment { rule: usize, segment: String },
    #[error("the last rule must have no condition, so that every cluster gets a segment")]
    MissingCatchAll,
    #[error("rule {rule} has a threshold that is not a finite number")]
    NonFiniteThreshold { rule: usize },
    #[error("unknown metric `{0}`, expected `feature:<column>` or `outcome:<column>`")]
    UnknownMetric(String),
    #[error("malformed decision table: {0}")]
    Json(#[from] serde_json::Error),
}

/// An error when banding default probabilities
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RiskError {
    #[error("risk thresholds must satisfy 0 <= medium ({medium}) <= high ({high}) <= 1")]
    InvalidThresholds { medium: f64, high: f64 },
    #[error("the risk model returned {found} probabilities for {expected} rows")]
    ProbabilityCountMismatch { expected: usize, found: usize },
    #[error("the risk model returned {value} for row {row}, outside of [0, 1]")]
    InvalidProbability { row: usize, value: f64 },
}

/// An error when checking the pipeline parameters
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SegmentationParamsError {
    #[error("the candidate range {min}..={max} is empty or starts at 0")]
    KRange { min: usize, max: usize },
    #[error("sample_size must be at least 2")]
    SampleSize,
    #[error("{0} cannot be 0")]
    ZeroRuns(&'static str),
    #[error("max_n_iterations cannot be 0")]
    MaxIterations,
}

/// Any failure of the end-to-end segmentation
#[derive(Error, Debug)]
pub enum SegmentationError {
    #[error("Invalid hyperparameter: {0}")]
    InvalidParams(#[from] SegmentationParamsError),
    #[error(transparent)]
    Preprocessing(#[from] PreprocessingError),
    #[error(transparent)]
    Selection(#[from] KSelectionError),
    #[error(transparent)]
    Clustering(#[from] KMeansError),
    #[error(transparent)]
    Profile(#[from] ProfileError),
    #[error(transparent)]
    DecisionTable(#[from] DecisionTableError),
    #[error(transparent)]
    Risk(#[from] RiskError),
    #[error(transparent)]
    Segmenta(#[from] segmenta::error::Error),
}

pub type Result<T> = std::result::Result<T, SegmentationError>;
