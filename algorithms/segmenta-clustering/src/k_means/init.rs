use super::algorithm::closest_centroid;
use ndarray::{s, Array1, Array2, ArrayView2, Axis, Zip};
use ndarray_rand::rand;
use ndarray_rand::rand::distributions::{Distribution, WeightedIndex};
use ndarray_rand::rand::Rng;
use segmenta::Float;

#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
/// Specifies centroid initialization algorithm for KMeans.
pub enum KMeansInit {
    /// Pick random points as centroids, without replacement.
    #[default]
    Random,
    /// K-means++ algorithm. Using this over random initialization causes K-means to converge
    /// faster for almost all cases, since K-means++ produces better centroids.
    KMeansPlusPlus,
}

impl KMeansInit {
    /// Runs the chosen initialization routine
    pub(crate) fn run<F: Float>(
        &self,
        n_clusters: usize,
        observations: ArrayView2<F>,
        rng: &mut impl Rng,
    ) -> Array2<F> {
        match self {
            Self::Random => random_init(n_clusters, observations, rng),
            Self::KMeansPlusPlus => k_means_pp(n_clusters, observations, rng),
        }
    }
}

/// Pick random points from the input matrix as centroids
fn random_init<F: Float>(
    n_clusters: usize,
    observations: ArrayView2<F>,
    rng: &mut impl Rng,
) -> Array2<F> {
    let (n_samples, _) = observations.dim();
    let indices = rand::seq::index::sample(rng, n_samples, n_clusters).into_vec();
    observations.select(Axis(0), &indices)
}

/// Selects centroids using the KMeans++ initialization algorithm. The weights determine the
/// likeliness of an input point to be selected as a centroid relative to other points. The higher
/// the weight, the more likely the point will be selected as a centroid.
fn k_means_pp<F: Float>(
    n_clusters: usize,
    observations: ArrayView2<F>,
    rng: &mut impl Rng,
) -> Array2<F> {
    let (n_samples, n_features) = observations.dim();
    let mut centroids = Array2::zeros((n_clusters, n_features));
    let n = rng.gen_range(0..n_samples);
    centroids.row_mut(0).assign(&observations.row(n));

    let mut dists = Array1::zeros(n_samples);
    for c_cnt in 1..n_clusters {
        update_min_dists(&centroids.slice(s![0..c_cnt, ..]), &observations, &mut dists);
        // every point sits on a centroid already when all weights are zero
        let centroid_idx = match WeightedIndex::new(dists.iter()) {
            Ok(weights) => weights.sample(rng),
            Err(_) => rng.gen_range(0..n_samples),
        };
        centroids
            .row_mut(c_cnt)
            .assign(&observations.row(centroid_idx));
    }
    centroids
}

fn update_min_dists<F: Float>(
    centroids: &ArrayView2<F>,
    observations: &ArrayView2<F>,
    dists: &mut Array1<F>,
) {
    Zip::from(observations.rows())
        .and(dists)
        .par_for_each(|observation, dist| *dist = closest_centroid(centroids, &observation).1);
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array};
    use ndarray_rand::rand::SeedableRng;
    use rand_xoshiro::Xoshiro256Plus;
    use std::collections::HashSet;

    #[test]
    fn random_init_picks_distinct_points() {
        let mut rng = Xoshiro256Plus::seed_from_u64(7);
        let observations = Array::from_shape_fn((20, 2), |(i, j)| (i * 2 + j) as f64);
        let centroids = KMeansInit::Random.run(5, observations.view(), &mut rng);
        assert_eq!(centroids.dim(), (5, 2));
        let distinct: HashSet<u64> = centroids.column(0).iter().map(|x| *x as u64).collect();
        assert_eq!(distinct.len(), 5);
        for centroid in centroids.rows() {
            assert!(observations.rows().into_iter().any(|row| row == centroid));
        }
    }

    #[test]
    fn same_seed_same_centroids() {
        let observations = Array::from_shape_fn((50, 3), |(i, j)| ((i * 7 + j * 3) % 11) as f64);
        for init in [KMeansInit::Random, KMeansInit::KMeansPlusPlus] {
            let a = init.run(4, observations.view(), &mut Xoshiro256Plus::seed_from_u64(3));
            let b = init.run(4, observations.view(), &mut Xoshiro256Plus::seed_from_u64(3));
            assert_eq!(a, b);
        }
    }

    #[test]
    fn k_means_pp_spreads_centroids() {
        let mut rng = Xoshiro256Plus::seed_from_u64(42);
        let observations = array![[0.0f64, 0.], [0.1, 0.], [100., 100.], [100.1, 100.]];
        let centroids = KMeansInit::KMeansPlusPlus.run(2, observations.view(), &mut rng);
        let far_apart = (centroids[[0, 0]] - centroids[[1, 0]]).abs() > 50.;
        assert!(far_apart);
    }

    #[test]
    fn k_means_pp_survives_identical_points() {
        let mut rng = Xoshiro256Plus::seed_from_u64(42);
        let observations = Array2::<f64>::ones((6, 2));
        let centroids = KMeansInit::KMeansPlusPlus.run(3, observations.view(), &mut rng);
        assert_eq!(centroids, Array2::<f64>::ones((3, 2)));
    }
}
