//! Provide traits for different classes of algorithms
//!

use std::error::Error;

/// Transformation algorithms
///
/// A transformer takes a matrix and maps it into a new representation, for example the
/// standardized version of a feature matrix. Fallible transformations set `T` to a `Result`.
pub trait Transformer<R, T> {
    fn transform(&self, x: R) -> T;
}

/// Fittable algorithms
///
/// A fittable algorithm takes a set of records and creates an object with the learned
/// parameters, for example the per-column statistics of a scaler or the centroids of a
/// clustering. The object is returned by value and never refitted afterwards.
pub trait Fit<R, E: Error + From<crate::error::Error>> {
    type Object;

    fn fit(&self, records: &R) -> Result<Self::Object, E>;
}

/// Predict with model
///
/// Assigns targets to new records with an already fitted model. Implemented for matrices as
/// well as for single observations.
pub trait Predict<R, T> {
    fn predict(&self, x: R) -> T;
}
