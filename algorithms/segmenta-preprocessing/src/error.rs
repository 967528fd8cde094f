//! Error definitions for preprocessing
use thiserror::Error;
pub type Result<T> = std::result::Result<T, PreprocessingError>;

#[derive(Error, Debug, Clone)]
pub enum PreprocessingError {
    #[error("not enough samples")]
    NotEnoughSamples,
    #[error("feature {0} is constant, its standard deviation is zero")]
    DegenerateFeature(usize),
    #[error("feature {0} contains a value that is not a valid float")]
    NonFiniteValue(usize),
    #[error("expected {expected} features, found {found}")]
    FeatureCountMismatch { expected: usize, found: usize },
    #[error(transparent)]
    Segmenta(#[from] segmenta::error::Error),
}
