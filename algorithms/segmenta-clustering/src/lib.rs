//! `segmenta-clustering` provides the clustering algorithms of the `segmenta` workspace.
//!
//! ## The big picture
//!
//! Customers are grouped by running K-Means on their standardized features. K itself is not
//! known in advance: it is chosen by clustering a bounded random sample for every candidate
//! value and keeping the one with the best silhouette score.
//!
//! ## Current state
//!
//! Right now `segmenta-clustering` provides:
//! * [K-Means](KMeans), Lloyd's algorithm with explicit empty cluster handling
//! * [K selection](KSelection), the silhouette driven choice of the number of clusters
//!
//! Implementation choices, algorithmic details and examples can be found in the page dedicated
//! to the specific algorithms.
#[allow(clippy::new_ret_no_self)]
mod k_means;
mod k_selection;

pub use k_means::*;
pub use k_selection::*;
