//! `segmenta-segments` turns a partition of customers into business segments.
//!
//! ## The big picture
//!
//! Clusters found by [`segmenta_clustering`] are anonymous: their indices change with K and
//! with the seed. This crate describes each of them with a [profile](ClusterProfiler) (feature
//! means, default and churn rates, size) and labels the profiles with a versioned
//! [decision table](DecisionTable) of threshold rules, each segment carrying its recommended
//! actions.
//!
//! [`SegmentationParams`] chains every stage, from the raw [`CustomerTable`](segmenta::CustomerTable)
//! to the [`SegmentationReport`]:
//!
//! 1. standardize the features,
//! 2. select K with the silhouette score of a sample,
//! 3. partition every customer with K-means,
//! 4. profile the clusters,
//! 5. map the profiles to segments,
//! 6. optionally band the default probabilities of an external [`DefaultRiskModel`].

pub mod decision_table;
pub mod error;
pub mod mapper;
pub mod pipeline;
pub mod profile;
pub mod risk;

pub use decision_table::{Comparison, Condition, DecisionTable, Metric, Rule, Segment};
pub use error::{
    DecisionTableError, ProfileError, RiskError, SegmentationError, SegmentationParamsError,
};
pub use mapper::{MappedCluster, SegmentMapper, SegmentMapping};
pub use pipeline::{SegmentationParams, SegmentationPipeline, SegmentationReport};
pub use profile::{ClusterProfile, ClusterProfiler, ProfileTable};
pub use risk::{DefaultRiskModel, RiskAssessment, RiskBand, RiskThresholds};
