//! Error types in Segmenta
//!

use thiserror::Error;

use ndarray::ShapeError;
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug, Clone)]
pub enum Error {
    #[error("invalid parameter {0}")]
    Parameters(String),
    #[error("insufficient data: {required} rows required, {available} available")]
    InsufficientData { required: usize, available: usize },
    #[error("invalid record at row {row}: {reason}")]
    InvalidRecord { row: usize, reason: String },
    #[error("duplicate customer id {0}")]
    DuplicateId(u64),
    #[error("length mismatch: {records} records but {memberships} memberships")]
    MembershipMismatch { records: usize, memberships: usize },
    #[error("invalid ndarray shape {0}")]
    NdShape(#[from] ShapeError),
}
