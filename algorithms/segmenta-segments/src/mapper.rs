//! Cluster to segment mapping
use crate::decision_table::{DecisionTable, Segment};
use crate::profile::{ClusterProfile, ProfileTable};
use serde::{Deserialize, Serialize};

/// Labels every profiled cluster with the segment of a [`DecisionTable`].
///
/// The mapping has no learned parameter: the same profiles and table always give the same
/// labels, and every cluster of the profile table is labeled exactly once.
#[derive(Clone, Debug, PartialEq)]
pub struct SegmentMapper {
    table: DecisionTable,
}

impl Default for SegmentMapper {
    fn default() -> Self {
        Self::new(DecisionTable::builtin())
    }
}

impl SegmentMapper {
    pub fn new(table: DecisionTable) -> Self {
        SegmentMapper { table }
    }

    pub fn table(&self) -> &DecisionTable {
        &self.table
    }

    pub fn map(&self, profiles: &ProfileTable) -> SegmentMapping {
        let clusters = profiles
            .iter()
            .map(|profile| {
                let (rule, segment) = self.table.classify(profile);
                log::debug!(
                    "cluster {} ({} members) -> {} (rule {})",
                    profile.cluster(),
                    profile.count(),
                    segment.name,
                    rule
                );
                MappedCluster {
                    profile: profile.clone(),
                    rule,
                    segment: segment.name.clone(),
                }
            })
            .collect();

        SegmentMapping {
            version: self.table.version().to_string(),
            clusters,
            segments: self.table.segments().to_vec(),
        }
    }
}

/// A profiled cluster with its suggested segment
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MappedCluster {
    profile: ClusterProfile,
    rule: usize,
    segment: String,
}

impl MappedCluster {
    pub fn cluster(&self) -> usize {
        self.profile.cluster()
    }

    pub fn profile(&self) -> &ClusterProfile {
        &self.profile
    }

    /// Index of the decision table rule that matched
    pub fn rule(&self) -> usize {
        self.rule
    }

    pub fn segment(&self) -> &str {
        &self.segment
    }
}

/// Outcome of [`SegmentMapper::map`]
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SegmentMapping {
    version: String,
    clusters: Vec<MappedCluster>,
    segments: Vec<Segment>,
}

impl SegmentMapping {
    /// Version of the decision table used
    pub fn version(&self) -> &str {
        &self.version
    }

    /// One entry per profiled cluster, in ascending cluster index
    pub fn clusters(&self) -> &[MappedCluster] {
        &self.clusters
    }

    pub fn segment_of(&self, cluster: usize) -> Option<&str> {
        self.clusters
            .iter()
            .find(|c| c.cluster() == cluster)
            .map(|c| c.segment())
    }

    /// Actions of the segment suggested for `cluster`
    pub fn actions_of(&self, cluster: usize) -> Option<&[String]> {
        let name = self.segment_of(cluster)?;
        self.segments
            .iter()
            .find(|s| s.name == name)
            .map(|s| s.actions.as_slice())
    }

    /// Every segment of the decision table with its actions, in table order
    pub fn recommendations(&self) -> &[Segment] {
        &self.segments
    }
}
