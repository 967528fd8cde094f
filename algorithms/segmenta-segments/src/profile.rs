//! Per-cluster aggregation of customer attributes
use crate::error::ProfileError;
use ndarray::{Array1, ArrayBase, Data, Ix1, Zip};
use segmenta::{CustomerTable, Feature, Outcome};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

struct ClusterSums {
    count: usize,
    features: Array1<f64>,
    outcomes: Array1<f64>,
}

impl ClusterSums {
    fn new() -> Self {
        ClusterSums {
            count: 0,
            features: Array1::zeros(Feature::COUNT),
            outcomes: Array1::zeros(Outcome::COUNT),
        }
    }
}

/// Aggregates a partition of a [`CustomerTable`] into one [`ClusterProfile`] per cluster.
///
/// The profiler only averages the selected columns: the feature means describe the cluster in
/// the original units, while the means of the 0/1 outcome columns read as rates (default rate,
/// churn rate). Outcomes never take part in the clustering, they are joined here for reporting.
///
/// ```
/// use segmenta::{CustomerRecord, CustomerTable, Feature, Outcome};
/// use segmenta_segments::ClusterProfiler;
/// use ndarray::array;
///
/// let record = |customer_id, credit_score, defaulted| CustomerRecord {
///     customer_id,
///     annual_income_inr: 500_000.,
///     credit_score,
///     debt_to_income: 0.3,
///     avg_monthly_spend_inr: 20_000.,
///     late_payments_12m: 1.,
///     products_owned: 2.,
///     defaulted,
///     churned: 0.,
/// };
/// let table = CustomerTable::from_records(&[
///     record(1, 600., 1.),
///     record(2, 800., 0.),
///     record(3, 700., 0.),
/// ])
/// .unwrap();
///
/// let profiles = ClusterProfiler::new().profile(&table, &array![1, 0, 1]).unwrap();
/// assert_eq!(profiles.counts(), vec![(0, 1), (1, 2)]);
/// assert_eq!(profiles.get(1).unwrap().mean(Feature::CreditScore), Some(650.));
/// assert_eq!(profiles.get(1).unwrap().rate(Outcome::Defaulted), Some(0.5));
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClusterProfiler {
    features: Vec<Feature>,
    outcomes: Vec<Outcome>,
}

impl Default for ClusterProfiler {
    fn default() -> Self {
        Self::new()
    }
}

impl ClusterProfiler {
    /// Profiles every feature and every outcome
    pub fn new() -> Self {
        ClusterProfiler {
            features: Feature::ALL.to_vec(),
            outcomes: Outcome::ALL.to_vec(),
        }
    }

    /// Profiles only the given columns. Duplicates are ignored.
    pub fn with_columns(
        features: impl IntoIterator<Item = Feature>,
        outcomes: impl IntoIterator<Item = Outcome>,
    ) -> Self {
        let mut features: Vec<Feature> = features.into_iter().collect();
        features.sort_unstable();
        features.dedup();
        let mut outcomes: Vec<Outcome> = outcomes.into_iter().collect();
        outcomes.sort_unstable();
        outcomes.dedup();
        ClusterProfiler { features, outcomes }
    }

    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    pub fn outcomes(&self) -> &[Outcome] {
        &self.outcomes
    }

    /// Computes the profile of every cluster index present in `memberships`, in ascending
    /// cluster index. `memberships[i]` is the cluster of the i-th row of `table`.
    pub fn profile(
        &self,
        table: &CustomerTable,
        memberships: &ArrayBase<impl Data<Elem = usize>, Ix1>,
    ) -> Result<ProfileTable, ProfileError> {
        if memberships.len() != table.nrows() {
            return Err(ProfileError::MembershipMismatch {
                records: table.nrows(),
                memberships: memberships.len(),
            });
        }
        let mut sums: BTreeMap<usize, ClusterSums> = BTreeMap::new();
        Zip::from(memberships)
            .and(table.features().rows())
            .and(table.outcomes().rows())
            .for_each(|&cluster, features, outcomes| {
                let sums = sums.entry(cluster).or_insert_with(ClusterSums::new);
                sums.count += 1;
                sums.features += &features;
                sums.outcomes += &outcomes;
            });

        let profiles = sums
            .into_iter()
            .map(|(cluster, sums)| {
                let n = sums.count as f64;
                ClusterProfile {
                    cluster,
                    count: sums.count,
                    feature_means: self
                        .features
                        .iter()
                        .map(|&f| (f, sums.features[f.index()] / n))
                        .collect(),
                    outcome_rates: self
                        .outcomes
                        .iter()
                        .map(|&o| (o, sums.outcomes[o.index()] / n))
                        .collect(),
                }
            })
            .collect();

        Ok(ProfileTable {
            features: self.features.clone(),
            outcomes: self.outcomes.clone(),
            profiles,
        })
    }
}

/// Aggregate description of the members of one cluster
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClusterProfile {
    cluster: usize,
    count: usize,
    feature_means: BTreeMap<Feature, f64>,
    outcome_rates: BTreeMap<Outcome, f64>,
}

impl ClusterProfile {
    pub fn cluster(&self) -> usize {
        self.cluster
    }

    /// Number of members, never zero
    pub fn count(&self) -> usize {
        self.count
    }

    /// Mean of a feature over the members, `None` if the feature was not profiled
    pub fn mean(&self, feature: Feature) -> Option<f64> {
        self.feature_means.get(&feature).copied()
    }

    /// Share of members with the outcome, `None` if the outcome was not profiled
    pub fn rate(&self, outcome: Outcome) -> Option<f64> {
        self.outcome_rates.get(&outcome).copied()
    }

    pub fn feature_means(&self) -> &BTreeMap<Feature, f64> {
        &self.feature_means
    }

    pub fn outcome_rates(&self) -> &BTreeMap<Outcome, f64> {
        &self.outcome_rates
    }
}

/// Profiles of the non-empty clusters of a partition, in ascending cluster index
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProfileTable {
    features: Vec<Feature>,
    outcomes: Vec<Outcome>,
    profiles: Vec<ClusterProfile>,
}

impl ProfileTable {
    pub fn profiles(&self) -> &[ClusterProfile] {
        &self.profiles
    }

    pub fn iter(&self) -> impl Iterator<Item = &ClusterProfile> {
        self.profiles.iter()
    }

    pub fn get(&self, cluster: usize) -> Option<&ClusterProfile> {
        self.profiles
            .binary_search_by_key(&cluster, |p| p.cluster)
            .ok()
            .map(|i| &self.profiles[i])
    }

    /// `(cluster, member count)` pairs
    pub fn counts(&self) -> Vec<(usize, usize)> {
        self.profiles.iter().map(|p| (p.cluster, p.count)).collect()
    }

    /// Profiled feature columns
    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    /// Profiled outcome columns
    pub fn outcomes(&self) -> &[Outcome] {
        &self.outcomes
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::{array, Array1};
    use ndarray_rand::rand::SeedableRng;
    use rand_isaac::Isaac64Rng;
    use segmenta::CustomerRecord;
    use segmenta_datasets::generate;

    fn record(customer_id: u64, income: f64, credit_score: f64, defaulted: f64) -> CustomerRecord {
        CustomerRecord {
            customer_id,
            annual_income_inr: income,
            credit_score,
            debt_to_income: 0.25,
            avg_monthly_spend_inr: income / 30.,
            late_payments_12m: 0.,
            products_owned: 3.,
            defaulted,
            churned: 1. - defaulted,
        }
    }

    fn table() -> CustomerTable {
        CustomerTable::from_records(&[
            record(10, 1_000_000., 700., 0.),
            record(11, 3_000_000., 800., 0.),
            record(12, 400_000., 600., 1.),
            record(13, 600_000., 620., 0.),
        ])
        .unwrap()
    }

    #[test]
    fn means_and_rates_per_cluster() {
        let profiles = ClusterProfiler::new()
            .profile(&table(), &array![0, 0, 2, 2])
            .unwrap();
        // cluster 1 has no member and is omitted
        assert_eq!(profiles.counts(), vec![(0, 2), (2, 2)]);
        assert!(profiles.get(1).is_none());

        let high = profiles.get(0).unwrap();
        assert_abs_diff_eq!(high.mean(Feature::AnnualIncome).unwrap(), 2_000_000.);
        assert_abs_diff_eq!(high.mean(Feature::CreditScore).unwrap(), 750.);
        assert_abs_diff_eq!(high.rate(Outcome::Defaulted).unwrap(), 0.);
        assert_abs_diff_eq!(high.rate(Outcome::Churned).unwrap(), 1.);

        let low = profiles.get(2).unwrap();
        assert_abs_diff_eq!(low.mean(Feature::CreditScore).unwrap(), 610.);
        assert_abs_diff_eq!(low.rate(Outcome::Defaulted).unwrap(), 0.5);
    }

    #[test]
    fn unselected_columns_are_absent() {
        let profiles = ClusterProfiler::with_columns(
            [Feature::CreditScore, Feature::CreditScore],
            [Outcome::Defaulted],
        )
        .profile(&table(), &array![0, 1, 0, 1])
        .unwrap();
        assert_eq!(profiles.features(), &[Feature::CreditScore]);
        let profile = profiles.get(1).unwrap();
        assert_eq!(profile.feature_means().len(), 1);
        assert_eq!(profile.mean(Feature::AnnualIncome), None);
        assert_eq!(profile.rate(Outcome::Churned), None);
        assert_eq!(profile.mean(Feature::CreditScore), Some(710.));
    }

    #[test]
    fn memberships_must_cover_the_table() {
        let res = ClusterProfiler::new().profile(&table(), &array![0, 1]);
        assert_eq!(
            res,
            Err(ProfileError::MembershipMismatch {
                records: 4,
                memberships: 2
            })
        );
    }

    #[test]
    fn sparse_cluster_indices() {
        let profiles = ClusterProfiler::new()
            .profile(&table(), &array![usize::MAX, 7, usize::MAX, 7])
            .unwrap();
        assert_eq!(profiles.counts(), vec![(7, 2), (usize::MAX, 2)]);
        assert!(profiles.get(usize::MAX).is_some());
    }

    #[test]
    fn means_stay_within_the_column_range() {
        let mut rng = Isaac64Rng::seed_from_u64(42);
        let table = CustomerTable::from_records(&generate::customers(300, &mut rng)).unwrap();
        let memberships: Array1<usize> = (0..table.nrows()).map(|i| (i * 7) % 5).collect();
        let profiles = ClusterProfiler::new().profile(&table, &memberships).unwrap();

        assert_eq!(profiles.len(), 5);
        assert_eq!(profiles.counts().iter().map(|c| c.1).sum::<usize>(), 300);
        for feature in Feature::ALL {
            let column = table.feature_column(feature);
            let min = column.fold(f64::INFINITY, |a, &b| a.min(b));
            let max = column.fold(f64::NEG_INFINITY, |a, &b| a.max(b));
            for profile in profiles.iter() {
                let mean = profile.mean(feature).unwrap();
                assert!(min <= mean && mean <= max);
            }
        }
    }
}
