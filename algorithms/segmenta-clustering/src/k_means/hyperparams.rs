use crate::KMeansParamsError;

use super::init::KMeansInit;
use ndarray_rand::rand::Rng;
use segmenta::{Float, ParamGuard};
use std::marker::PhantomData;

#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

/// What to do with a cluster that loses all of its members during the iterations
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum EmptyClusterPolicy {
    /// Move the empty centroid onto the point farthest from its centroid in the largest
    /// cluster. Ties pick the lowest cluster index, then the lowest row.
    #[default]
    Reseed,
    /// Leave the centroid in place and fail with
    /// [`KMeansError::EmptyCluster`](crate::KMeansError::EmptyCluster) if the final partition
    /// has an empty cluster.
    Reject,
}

#[derive(Clone, Debug, PartialEq)]
/// The set of hyperparameters that can be specified for the execution of
/// the [K-means algorithm](crate::KMeans).
pub struct KMeansValidParams<F: Float, R: Rng> {
    /// Number of time the k-means algorithm will be run with different centroid seeds.
    n_runs: usize,
    /// We exit the training loop when the number of training iterations
    /// exceeds `max_n_iterations` even if the assignments are still changing.
    max_n_iterations: u64,
    /// The number of clusters we will be looking for in the training dataset.
    n_clusters: usize,
    /// The initialization strategy used to initialize the centroids.
    init: KMeansInit,
    /// Handling of clusters without members
    empty_cluster_policy: EmptyClusterPolicy,
    /// The random number generator
    rng: R,
    phantom: PhantomData<F>,
}

#[derive(Clone, Debug, PartialEq)]
/// An helper struct used to construct a set of [valid hyperparameters](KMeansValidParams) for
/// the [K-means algorithm](crate::KMeans) (using the builder pattern).
pub struct KMeansParams<F: Float, R: Rng>(KMeansValidParams<F, R>);

impl<F: Float, R: Rng> KMeansParams<F, R> {
    /// `new` lets us configure our training algorithm parameters:
    /// * we will be looking for `n_clusters` in the training dataset;
    /// * the training is considered complete when an assignment step leaves every
    ///   observation in the cluster it already belonged to;
    /// * we exit the training loop when the number of training iterations
    ///   exceeds `max_n_iterations` even if the assignments are still changing;
    /// * as KMeans convergence depends on centroids initialization
    ///   we run the algorithm `n_runs` times and we keep the run with the
    ///   smallest inertia (sum of squared euclidean distances to the closest centroid).
    ///
    /// Defaults are provided if optional parameters are not specified:
    /// * `max_n_iterations = 300`
    /// * `n_runs = 10`
    /// * `init = Random`
    /// * `empty_cluster_policy = Reseed`
    pub fn new(n_clusters: usize, rng: R) -> Self {
        Self(KMeansValidParams {
            n_runs: 10,
            max_n_iterations: 300,
            n_clusters,
            init: KMeansInit::Random,
            empty_cluster_policy: EmptyClusterPolicy::Reseed,
            rng,
            phantom: PhantomData,
        })
    }

    /// Change the value of `n_runs`
    pub fn n_runs(mut self, n_runs: usize) -> Self {
        self.0.n_runs = n_runs;
        self
    }

    /// Change the value of `max_n_iterations`
    pub fn max_n_iterations(mut self, max_n_iterations: u64) -> Self {
        self.0.max_n_iterations = max_n_iterations;
        self
    }

    /// Change the value of `init`
    pub fn init_method(mut self, init: KMeansInit) -> Self {
        self.0.init = init;
        self
    }

    /// Change the handling of empty clusters
    pub fn empty_cluster_policy(mut self, policy: EmptyClusterPolicy) -> Self {
        self.0.empty_cluster_policy = policy;
        self
    }
}

impl<F: Float, R: Rng> ParamGuard for KMeansParams<F, R> {
    type Checked = KMeansValidParams<F, R>;
    type Error = KMeansParamsError;

    fn check_ref(&self) -> Result<&Self::Checked, Self::Error> {
        if self.0.n_clusters == 0 {
            Err(KMeansParamsError::NClusters)
        } else if self.0.n_runs == 0 {
            Err(KMeansParamsError::NRuns)
        } else if self.0.max_n_iterations == 0 {
            Err(KMeansParamsError::MaxIterations)
        } else {
            Ok(&self.0)
        }
    }

    fn check(self) -> Result<Self::Checked, Self::Error> {
        self.check_ref()?;
        Ok(self.0)
    }
}

impl<F: Float, R: Rng> KMeansValidParams<F, R> {
    /// The final results will be the best output of n_runs consecutive runs in terms of inertia.
    pub fn n_runs(&self) -> usize {
        self.n_runs
    }

    /// We exit the training loop when the number of training iterations
    /// exceeds `max_n_iterations` even if the assignments are still changing.
    pub fn max_n_iterations(&self) -> u64 {
        self.max_n_iterations
    }

    /// The number of clusters we will be looking for in the training dataset.
    pub fn n_clusters(&self) -> usize {
        self.n_clusters
    }

    /// Cluster initialization strategy
    pub fn init_method(&self) -> KMeansInit {
        self.init
    }

    pub fn empty_cluster_policy(&self) -> EmptyClusterPolicy {
        self.empty_cluster_policy
    }

    /// Returns the random generator
    pub fn rng(&self) -> &R {
        &self.rng
    }
}

#[cfg(test)]
mod tests {
    use crate::{KMeans, KMeansParams, KMeansParamsError, KMeansValidParams};
    use rand_isaac::Isaac64Rng;
    use segmenta::ParamGuard;

    #[test]
    fn autotraits() {
        fn has_autotraits<T: Send + Sync + Sized + Unpin>() {}
        has_autotraits::<KMeansParams<f64, Isaac64Rng>>();
        has_autotraits::<KMeansValidParams<f64, Isaac64Rng>>();
    }

    #[test]
    fn n_clusters_cannot_be_zero() {
        let res = KMeans::<f32>::params(0).check();
        assert!(matches!(res, Err(KMeansParamsError::NClusters)))
    }

    #[test]
    fn max_n_iterations_cannot_be_zero() {
        let res = KMeans::<f64>::params(1).max_n_iterations(0).check();
        assert!(matches!(res, Err(KMeansParamsError::MaxIterations)))
    }

    #[test]
    fn n_runs_cannot_be_zero() {
        let res = KMeans::<f64>::params(1).n_runs(0).check();
        assert!(matches!(res, Err(KMeansParamsError::NRuns)))
    }

    #[test]
    fn defaults() {
        let params = KMeans::<f64>::params(4).check().unwrap();
        assert_eq!(params.n_clusters(), 4);
        assert_eq!(params.n_runs(), 10);
        assert_eq!(params.max_n_iterations(), 300);
    }
}
