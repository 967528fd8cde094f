//! `segmenta` groups customers into behavioural clusters and turns those clusters into
//! business segments.
//!
//! This crate is the small shared core of the workspace. It defines
//!
//! * the customer schema ([`CustomerRecord`], [`CustomerTable`], [`Feature`], [`Outcome`]),
//!   validated once at the ingestion boundary so that every algorithm only sees well-typed
//!   numeric matrices;
//! * the [`Float`] bound shared by the numeric algorithms;
//! * the algorithm traits ([`Fit`](traits::Fit), [`Transformer`](traits::Transformer),
//!   [`Predict`](traits::Predict)) and the [`ParamGuard`] hyperparameter checking pattern;
//! * the silhouette score used to compare clusterings ([`metrics::silhouette_score`]).
//!
//! The algorithms themselves live in sibling crates:
//!
//! * `segmenta-preprocessing`: the standard scaler;
//! * `segmenta-clustering`: K-Means and the silhouette driven choice of K;
//! * `segmenta-segments`: cluster profiling, the segment decision table and the end-to-end
//!   pipeline.
//!
//! Random number generators are always passed in explicitly, so every run is reproducible
//! from its seed.
//!
//! ```
//! use segmenta::prelude::*;
//! use ndarray::array;
//!
//! let record = |customer_id, credit_score| CustomerRecord {
//!     customer_id,
//!     annual_income_inr: 1_200_000.,
//!     credit_score,
//!     debt_to_income: 0.3,
//!     avg_monthly_spend_inr: 40_000.,
//!     late_payments_12m: 0.,
//!     products_owned: 3.,
//!     defaulted: 0.,
//!     churned: 0.,
//! };
//! let table = CustomerTable::from_records(&[
//!     record(1, 610.),
//!     record(2, 620.),
//!     record(3, 790.),
//!     record(4, 800.),
//! ])?;
//! assert_eq!(table.feature_column(Feature::CreditScore), array![610., 620., 790., 800.]);
//!
//! // two well separated groups of credit scores
//! let scores = table.feature_column(Feature::CreditScore).insert_axis(ndarray::Axis(1));
//! let silhouette = silhouette_score(&scores, &array![0, 0, 1, 1])?.unwrap();
//! assert!(silhouette > 0.9);
//! # Ok::<(), Error>(())
//! ```

pub mod dataset;
pub mod error;
mod metrics_clustering;
mod param_guard;
pub mod prelude;
pub mod traits;

pub use dataset::{CustomerRecord, CustomerTable, Feature, Float, Outcome};
pub use param_guard::ParamGuard;

/// Common metrics functions for clustering
pub mod metrics {
    pub use crate::metrics_clustering::{silhouette_samples, silhouette_score};
}
