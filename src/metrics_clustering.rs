//! Common metrics for clustering
use crate::error::{Error, Result};
use crate::Float;
use ndarray::{Array1, ArrayBase, ArrayView1, Data, Ix1, Ix2};
use std::collections::BTreeMap;
use std::ops::Sub;

struct DistanceCount<F> {
    total_distance: F,
    count: usize,
}

impl<F: Float> DistanceCount<F> {
    /// Sets the total distance from the sample to this cluster to zero
    pub fn reset(&mut self) {
        self.total_distance = F::zero();
    }

    pub fn new() -> DistanceCount<F> {
        DistanceCount {
            total_distance: F::zero(),
            count: 0,
        }
    }

    /// Divides the total distance from the sample to this cluster by the number of samples in the cluster
    pub fn mean_distance(&self) -> F {
        self.total_distance / F::cast(self.count)
    }

    /// To be used in the cluster in which the sample is located. The distance from the sample to itself
    /// is zero so it does not get added to the total distance. We can then just divide the total
    /// distance by #samples in this cluster - 1
    pub fn same_label_mean_distance(&self) -> F {
        self.total_distance / F::cast(self.count - 1)
    }

    /// adds the distance of `other_sample` from `eval_sample` to the total distance of `eval_sample` from the current cluster
    pub fn add_point(&mut self, eval_sample: ArrayView1<F>, other_sample: ArrayView1<F>) {
        self.total_distance += eval_sample.sub(&other_sample).mapv(|x| x * x).sum().sqrt();
    }
}

/// Evaluates the silhouette of every sample of a clustering, using euclidean distance.
///
/// The silhouette of a sample is `(b - a) / max(a, b)`, where `a` is its average distance to
/// the other samples of its own cluster and `b` the smallest average distance to the samples of
/// another non-empty cluster. Values go from -1 to +1 when the sample is respectively closer
/// (on average) to another cluster and to its own cluster.
///
/// Conventions:
/// * a sample alone in its cluster has silhouette 0;
/// * a sample with `a = b = 0` (duplicated points) has silhouette 0;
/// * cluster indices without members are ignored, they never act as the "other" cluster.
///
/// Returns `None` when fewer than two clusters have members, because the score is undefined.
pub fn silhouette_samples<F: Float>(
    records: &ArrayBase<impl Data<Elem = F>, Ix2>,
    memberships: &ArrayBase<impl Data<Elem = usize>, Ix1>,
) -> Result<Option<Array1<F>>> {
    if records.nrows() != memberships.len() {
        return Err(Error::MembershipMismatch {
            records: records.nrows(),
            memberships: memberships.len(),
        });
    }
    // labels are arbitrary indices, map them onto 0..n_clusters
    let mut positions = BTreeMap::new();
    for &m in memberships {
        let next = positions.len();
        positions.entry(m).or_insert(next);
    }
    if positions.len() < 2 {
        return Ok(None);
    }
    let dense: Vec<usize> = memberships.iter().map(|m| positions[m]).collect();

    let mut clusters: Vec<DistanceCount<F>> =
        (0..positions.len()).map(|_| DistanceCount::new()).collect();
    for &m in &dense {
        clusters[m].count += 1;
    }

    let samples = records
        .rows()
        .into_iter()
        .zip(dense.iter())
        .map(|(sample, &own)| {
            // Loops through all samples and adds the distance between them and `sample` to
            // the cluster in which they belong
            for (other, &m) in records.rows().into_iter().zip(dense.iter()) {
                clusters[m].add_point(sample, other);
            }

            let score = if clusters[own].count == 1 {
                F::zero()
            } else {
                // average distance from `sample` to points in its cluster
                let a_x = clusters[own].same_label_mean_distance();
                // minimum average distance from `sample` to another cluster
                let b_x = clusters
                    .iter()
                    .enumerate()
                    .filter(|(label, counter)| *label != own && counter.count > 0)
                    .map(|(_, counter)| counter.mean_distance())
                    .fold(F::infinity(), F::min);

                let max = if a_x > b_x { a_x } else { b_x };
                if max > F::zero() {
                    (b_x - a_x) / max
                } else {
                    F::zero()
                }
            };
            clusters.iter_mut().for_each(DistanceCount::reset);
            score
        })
        .collect::<Array1<F>>();

    Ok(Some(samples))
}

/// Evaluates the quality of a clustering as the mean silhouette of its samples.
///
/// See [`silhouette_samples`] for the definition and the conventions on degenerate clusters.
/// Returns `None` when fewer than two clusters have members.
pub fn silhouette_score<F: Float>(
    records: &ArrayBase<impl Data<Elem = F>, Ix2>,
    memberships: &ArrayBase<impl Data<Elem = usize>, Ix1>,
) -> Result<Option<F>> {
    let samples = silhouette_samples(records, memberships)?;
    Ok(samples.map(|s| s.sum() / F::cast(s.len())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::{array, concatenate, Array, Array1, Axis};

    #[test]
    fn test_silhouette_score() {
        // Two very far apart clusters, each with its own label.
        // This is a very good clustering for silhouette and should return a score very close to +1
        let records = concatenate![
            Axis(0),
            Array::linspace(0f64, 1f64, 10),
            Array::linspace(10000f64, 10001f64, 10)
        ]
        .insert_axis(Axis(1));
        let records = concatenate![Axis(1), records, records];
        let memberships = concatenate![Axis(0), Array1::from_elem(10, 0), Array1::from_elem(10, 1)];
        let score = silhouette_score(&records, &memberships).unwrap().unwrap();
        assert_abs_diff_eq!(score, 1f64, epsilon = 1e-3);

        // Two clusters separated into halves very far from each other and each very near an half of the other cluster.
        // Bad but not terrible for silhouette, should return a score slightly negative
        let records = concatenate![
            Axis(0),
            Array::linspace(0f64, 1f64, 5),
            Array::linspace(1f64, 2f64, 5),
            Array::linspace(10000f64, 10001f64, 5),
            Array::linspace(10001f64, 10002f64, 5)
        ]
        .insert_axis(Axis(1));
        let records = concatenate![Axis(1), records, records];
        let memberships = concatenate![
            Axis(0),
            Array1::from_elem(5, 0),
            Array1::from_elem(5, 1),
            Array1::from_elem(5, 0),
            Array1::from_elem(5, 1)
        ];
        let score = silhouette_score(&records, &memberships).unwrap().unwrap();
        assert!(score < 0f64);

        // Very bad clustering with a high number of clusters, I expect a very negative value
        let records = Array::linspace(0f64, 10f64, 100).insert_axis(Axis(1));
        let records = concatenate![Axis(1), records, records];
        let memberships = Array1::from_shape_fn(100, |i| (i + 3) % 48);
        let score = silhouette_score(&records, &memberships).unwrap().unwrap();
        assert!(score < -0.5f64)
    }

    #[test]
    fn hand_computed_samples() {
        // cluster 0 = {0, 1}, cluster 1 = {4}
        let records = array![[0.], [1.], [4.]];
        let memberships = array![0, 0, 1];
        let samples = silhouette_samples(&records, &memberships).unwrap().unwrap();
        // a = 1, b = 4 -> 3 / 4
        assert_abs_diff_eq!(samples[0], 0.75);
        // a = 1, b = 3 -> 2 / 3
        assert_abs_diff_eq!(samples[1], 2. / 3.);
        // singleton
        assert_abs_diff_eq!(samples[2], 0.);
    }

    #[test]
    fn single_cluster_is_undefined() {
        let records = Array::linspace(0f64, 1f64, 10).insert_axis(Axis(1));
        let memberships = Array1::<usize>::zeros(10);
        assert!(silhouette_score(&records, &memberships).unwrap().is_none());
    }

    #[test]
    fn empty_cluster_indices_are_ignored() {
        // label 1 has no members, labels 0 and 2 are two tight far apart groups
        let records = array![[0.], [0.1], [10.], [10.1]];
        let memberships = array![0, 0, 2, 2];
        let score = silhouette_score(&records, &memberships).unwrap().unwrap();
        assert!(score > 0.9);
    }

    #[test]
    fn duplicated_points_score_zero() {
        let records = array![[1.], [1.], [1.], [1.]];
        let memberships = array![0, 0, 1, 1];
        let score = silhouette_score(&records, &memberships).unwrap().unwrap();
        assert_abs_diff_eq!(score, 0.);
    }

    #[test]
    fn large_labels_are_accepted() {
        let records = array![[0.], [0.1], [10.], [10.1]];
        let memberships = array![usize::MAX, usize::MAX, 3, 3];
        let score = silhouette_score(&records, &memberships).unwrap().unwrap();
        let reference = silhouette_score(&records, &array![1, 1, 0, 0]).unwrap().unwrap();
        assert_abs_diff_eq!(score, reference);
    }

    #[test]
    fn length_mismatch_is_an_error() {
        let records = array![[0.], [1.]];
        let memberships = array![0];
        let res = silhouette_score(&records, &memberships);
        assert!(matches!(res, Err(Error::MembershipMismatch { .. })));
    }
}
