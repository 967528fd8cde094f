//! # Preprocessing
//! ## The Big Picture
//!
//! `segmenta-preprocessing` is a crate in the `segmenta` workspace. It turns raw customer
//! attributes, measured in wildly different units (rupees, score points, ratios, counts), into
//! comparable features before they reach any distance based algorithm.
//!
//! ## Current state
//! `segmenta-preprocessing` provides the following preprocessing algorithms:
//! * [Standard scaling](standard_scaling::StandardScaler)

pub mod error;
pub mod standard_scaling;

pub use error::PreprocessingError;
pub use standard_scaling::{FittedStandardScaler, StandardScaler};
