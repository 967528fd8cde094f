use crate::k_means::{EmptyClusterPolicy, KMeansParams, KMeansValidParams};
use crate::KMeansError;
use ndarray::{Array1, Array2, ArrayBase, ArrayView2, Data, Ix1, Ix2, Zip};
use ndarray_rand::rand::Rng;
use ndarray_rand::rand::SeedableRng;
use rand_isaac::Isaac64Rng;
use segmenta::error::Error;
use segmenta::traits::{Fit, Predict};
use segmenta::Float;

#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Debug, PartialEq)]
/// K-means clustering aims to partition a set of unlabeled observations into clusters,
/// where each observation belongs to the cluster with the nearest mean.
///
/// The mean of the points within a cluster is called *centroid*.
///
/// Given the set of centroids, you can assign an observation to a cluster
/// choosing the nearest centroid.
///
/// We implement the _standard algorithm_ (also known as Lloyd's Algorithm). More details on the
/// algorithm can be found [here](https://en.wikipedia.org/wiki/K-means_clustering).
///
/// ## Standard algorithm
///
/// K-means is an iterative algorithm: it progressively refines the choice of centroids.
///
/// It's guaranteed to converge, even though it might not find the optimal set of centroids
/// (unfortunately it can get stuck in a local minimum, finding the optimal minimum if NP-hard!).
///
/// There are three steps in the standard algorithm:
/// - initialisation step: select initial centroids using one of our provided algorithms.
/// - assignment step: assign each observation to the nearest cluster
///                    (minimum euclidean distance between the observation and the cluster's
///                    centroid, the lowest centroid index wins a tie);
/// - update step: recompute the centroid of each cluster as the mean of its members.
///
/// The initialisation step is a one-off, done at the very beginning.
/// Assignment and update are repeated in a loop until convergence is reached (an assignment
/// step moves no observation) or we exceed `max_n_iterations`.
///
/// ## Empty clusters
///
/// A centroid can lose all of its observations during the update step, which would make its
/// mean undefined. With [`EmptyClusterPolicy::Reseed`] (the default) the centroid is moved
/// onto the observation farthest from its centroid in the largest cluster. A cluster that
/// cannot be re-seeded (the largest cluster has a single member, or all of its members sit on
/// its centroid) stays empty and is reported with a size of zero. With
/// [`EmptyClusterPolicy::Reject`] fitting fails with [`KMeansError::EmptyCluster`] instead.
///
/// ## Parallelisation
///
/// The work performed by the assignment step does not require any coordination:
/// the closest centroid for each point can be computed independently from the
/// closest centroid for any of the remaining points, so it runs on the `rayon` thread pool.
/// The update step is a reduction and runs on the calling thread. The outcome does not depend
/// on the number of threads.
///
/// ## Tutorial
///
/// ```
/// use segmenta::traits::{Fit, Predict};
/// use segmenta_clustering::{KMeans, KMeansError};
/// use segmenta_datasets::generate;
/// use ndarray::{array, Axis};
/// use ndarray_rand::rand::SeedableRng;
/// use rand_isaac::Isaac64Rng;
/// use approx::assert_abs_diff_eq;
///
/// // Our random number generator, seeded for reproducibility
/// let mut rng = Isaac64Rng::seed_from_u64(42);
///
/// // `expected_centroids` has shape `(n_centroids, n_features)`
/// // i.e. three points in the 2-dimensional plane
/// let expected_centroids = array![[0., 1.], [-10., 20.], [-1., 10.]];
/// // Let's generate a synthetic dataset: three blobs of observations
/// // (100 points each) centered around our `expected_centroids`
/// let data = generate::blobs(100, &expected_centroids, &mut rng);
/// let n_clusters = expected_centroids.len_of(Axis(0));
///
/// let model: KMeans<f64> = KMeans::params_with_rng(n_clusters, rng)
///     .fit(&data)
///     .map_err(|e: KMeansError| e)
///     .expect("KMeans fitted");
///
/// // Once we found our set of centroids, we can also assign new points to the nearest cluster
/// let new_observation = array![-9., 20.5];
/// // Predict returns the **index** of the nearest cluster
/// let cluster: usize = model.predict(&new_observation);
/// let closest_centroid = model.centroids().row(cluster);
/// assert_abs_diff_eq!(closest_centroid.to_owned(), array![-10., 20.], epsilon = 0.5);
/// ```
pub struct KMeans<F: Float> {
    centroids: Array2<F>,
    memberships: Array1<usize>,
    cluster_sizes: Array1<usize>,
    inertia: F,
    n_iterations: u64,
    converged: bool,
}

impl<F: Float> KMeans<F> {
    pub fn params(nclusters: usize) -> KMeansParams<F, Isaac64Rng> {
        KMeansParams::new(nclusters, Isaac64Rng::seed_from_u64(42))
    }

    pub fn params_with_seed(nclusters: usize, seed: u64) -> KMeansParams<F, Isaac64Rng> {
        KMeansParams::new(nclusters, Isaac64Rng::seed_from_u64(seed))
    }

    pub fn params_with_rng<R: Rng>(nclusters: usize, rng: R) -> KMeansParams<F, R> {
        KMeansParams::new(nclusters, rng)
    }

    /// Return the set of centroids as a 2-dimensional matrix with shape
    /// `(n_centroids, n_features)`.
    pub fn centroids(&self) -> &Array2<F> {
        &self.centroids
    }

    /// Cluster index of every training observation
    pub fn memberships(&self) -> &Array1<usize> {
        &self.memberships
    }

    /// Return the number of training points belonging to each cluster
    pub fn cluster_sizes(&self) -> &Array1<usize> {
        &self.cluster_sizes
    }

    pub fn n_clusters(&self) -> usize {
        self.centroids.nrows()
    }

    /// Number of clusters with at least one training point
    pub fn n_non_empty_clusters(&self) -> usize {
        self.cluster_sizes.iter().filter(|&&c| c > 0).count()
    }

    /// Return the sum of squared distances between each training point and its closest
    /// centroid.
    pub fn inertia(&self) -> F {
        self.inertia
    }

    /// Number of assignment steps performed by the retained run
    pub fn n_iterations(&self) -> u64 {
        self.n_iterations
    }

    /// Whether the retained run stopped because the assignments were stable, rather than
    /// because it hit `max_n_iterations`
    pub fn converged(&self) -> bool {
        self.converged
    }
}

impl<F: Float, R: Rng + Clone, DA: Data<Elem = F>> Fit<ArrayBase<DA, Ix2>, KMeansError>
    for KMeansValidParams<F, R>
{
    type Object = KMeans<F>;

    /// Given an input matrix `observations`, with shape `(n_observations, n_features)`,
    /// `fit` identifies `n_clusters` centroids based on the training data distribution.
    ///
    /// An instance of `KMeans` is returned.
    ///
    fn fit(&self, observations: &ArrayBase<DA, Ix2>) -> Result<Self::Object, KMeansError> {
        let n_samples = observations.nrows();
        if n_samples < self.n_clusters() {
            return Err(Error::InsufficientData {
                required: self.n_clusters(),
                available: n_samples,
            }
            .into());
        }

        let mut rng = self.rng().clone();
        let observations = observations.view();

        let mut best = lloyd(self, observations, &mut rng);
        log::debug!(
            "k-means k={} run 0: {} iterations, inertia {:.4}",
            self.n_clusters(),
            best.n_iterations,
            best.inertia
        );
        for run in 1..self.n_runs() {
            let candidate = lloyd(self, observations, &mut rng);
            log::debug!(
                "k-means k={} run {}: {} iterations, inertia {:.4}",
                self.n_clusters(),
                run,
                candidate.n_iterations,
                candidate.inertia
            );
            // We keep the run which minimizes the inertia, the first one on ties
            if candidate.inertia < best.inertia {
                best = candidate;
            }
        }

        if !best.converged {
            log::warn!(
                "k-means k={} did not converge within {} iterations",
                self.n_clusters(),
                self.max_n_iterations()
            );
        }
        if let Some(empty) = best.cluster_sizes.iter().position(|&c| c == 0) {
            match self.empty_cluster_policy() {
                EmptyClusterPolicy::Reject => return Err(KMeansError::EmptyCluster(empty)),
                EmptyClusterPolicy::Reseed => {
                    log::warn!("k-means k={}: cluster {} is empty", self.n_clusters(), empty)
                }
            }
        }
        Ok(best)
    }
}

impl<F: Float, DA: Data<Elem = F>> Predict<&ArrayBase<DA, Ix2>, Array1<usize>> for KMeans<F> {
    /// Given an input matrix `observations`, with shape `(n_observations, n_features)`,
    /// `predict` returns, for each observation, the index of the closest cluster/centroid.
    ///
    /// You can retrieve the centroid associated to an index using the
    /// [`centroids` method](#method.centroids).
    fn predict(&self, observations: &ArrayBase<DA, Ix2>) -> Array1<usize> {
        assert_eq!(
            observations.ncols(),
            self.centroids.ncols(),
            "The number of features must match the number of centroid coordinates."
        );
        let mut memberships = Array1::zeros(observations.nrows());
        let mut dists = Array1::zeros(observations.nrows());
        update_memberships_and_dists(
            &self.centroids,
            &observations.view(),
            &mut memberships,
            &mut dists,
        );
        memberships
    }
}

impl<F: Float, DA: Data<Elem = F>> Predict<&ArrayBase<DA, Ix1>, usize> for KMeans<F> {
    /// Given one input observation, return the index of its closest cluster
    ///
    /// You can retrieve the centroid associated to an index using the
    /// [`centroids` method](#method.centroids).
    fn predict(&self, observation: &ArrayBase<DA, Ix1>) -> usize {
        closest_centroid(&self.centroids, observation).0
    }
}

/// A single run of Lloyd's algorithm from a fresh initialisation
fn lloyd<F: Float, R: Rng>(
    params: &KMeansValidParams<F, R>,
    observations: ArrayView2<F>,
    rng: &mut R,
) -> KMeans<F> {
    let n_samples = observations.nrows();
    let mut centroids = params
        .init_method()
        .run(params.n_clusters(), observations, rng);
    let mut memberships = Array1::zeros(n_samples);
    let mut dists = Array1::zeros(n_samples);

    let mut converged = false;
    let mut n_iterations = 0;
    while n_iterations < params.max_n_iterations() {
        n_iterations += 1;
        let moved =
            update_memberships_and_dists(&centroids, &observations, &mut memberships, &mut dists);
        if moved == 0 && n_iterations > 1 {
            converged = true;
            break;
        }
        let (new_centroids, mut counts) = compute_centroids(&centroids, &observations, &memberships);
        centroids = new_centroids;
        if params.empty_cluster_policy() == EmptyClusterPolicy::Reseed {
            reseed_empty_clusters(&mut centroids, &mut counts, &observations, &mut memberships);
        }
    }
    if !converged {
        // the last update moved the centroids, bring the assignments in line with them
        update_memberships_and_dists(&centroids, &observations, &mut memberships, &mut dists);
    }

    let mut cluster_sizes = Array1::zeros(params.n_clusters());
    memberships.iter().for_each(|&c| cluster_sizes[c] += 1);

    KMeans {
        centroids,
        memberships,
        cluster_sizes,
        inertia: dists.sum(),
        n_iterations,
        converged,
    }
}

/// K-means is an iterative algorithm.
/// We will perform the assignment and update steps until we are satisfied
/// (according to our convergence criteria).
///
/// `compute_centroids` returns a 2-dimensional array,
/// where the i-th row corresponds to the i-th cluster, together with the number of
/// observations in each cluster. An empty cluster keeps its old centroid.
fn compute_centroids<F: Float>(
    old_centroids: &Array2<F>,
    // (n_observations, n_features)
    observations: &ArrayBase<impl Data<Elem = F>, Ix2>,
    // (n_observations,)
    cluster_memberships: &ArrayBase<impl Data<Elem = usize>, Ix1>,
) -> (Array2<F>, Array1<usize>) {
    let n_clusters = old_centroids.nrows();
    let mut counts: Array1<usize> = Array1::zeros(n_clusters);
    let mut centroids = Array2::zeros((n_clusters, observations.ncols()));

    Zip::from(observations.rows())
        .and(cluster_memberships)
        .for_each(|observation, &cluster_membership| {
            let mut centroid = centroids.row_mut(cluster_membership);
            centroid += &observation;
            counts[cluster_membership] += 1;
        });

    Zip::from(centroids.rows_mut())
        .and(old_centroids.rows())
        .and(&counts)
        .for_each(|mut centroid, old_centroid, &cnt| {
            if cnt == 0 {
                centroid.assign(&old_centroid);
            } else {
                centroid /= F::cast(cnt);
            }
        });
    (centroids, counts)
}

/// Moves every empty centroid onto the observation farthest from its centroid in the largest
/// cluster, updating the donor centroid, the counts and the memberships accordingly.
fn reseed_empty_clusters<F: Float>(
    centroids: &mut Array2<F>,
    counts: &mut Array1<usize>,
    observations: &ArrayBase<impl Data<Elem = F>, Ix2>,
    cluster_memberships: &mut Array1<usize>,
) {
    for empty in 0..counts.len() {
        if counts[empty] > 0 {
            continue;
        }
        // largest cluster, lowest index on ties
        let donor = counts
            .iter()
            .enumerate()
            .fold(0, |best, (idx, &cnt)| if cnt > counts[best] { idx } else { best });
        if counts[donor] < 2 {
            log::debug!("cluster {} left empty: no cluster can spare a point", empty);
            continue;
        }

        // farthest member of the donor cluster, lowest row on ties
        let mut farthest: Option<(usize, F)> = None;
        for (row, (observation, &m)) in observations
            .rows()
            .into_iter()
            .zip(cluster_memberships.iter())
            .enumerate()
        {
            if m != donor {
                continue;
            }
            let dist = squared_distance(&centroids.row(donor), &observation);
            if farthest.map_or(true, |(_, best)| dist > best) {
                farthest = Some((row, dist));
            }
        }
        let row = match farthest {
            Some((row, dist)) if dist > F::zero() => row,
            _ => {
                log::debug!("cluster {} left empty: cluster {} is a single point", empty, donor);
                continue;
            }
        };

        let point = observations.row(row);
        let cnt = F::cast(counts[donor]);
        let donor_centroid = (&centroids.row(donor) * cnt - &point) / (cnt - F::one());
        centroids.row_mut(donor).assign(&donor_centroid);
        centroids.row_mut(empty).assign(&point);
        counts[donor] -= 1;
        counts[empty] = 1;
        cluster_memberships[row] = empty;
    }
}

/// Updates `cluster_memberships` with the index of the closest centroid of each observation and
/// `dists` with the squared distance to it. Returns the number of observations whose membership
/// changed.
pub(crate) fn update_memberships_and_dists<F: Float>(
    centroids: &ArrayBase<impl Data<Elem = F> + Sync, Ix2>,
    observations: &ArrayBase<impl Data<Elem = F> + Sync, Ix2>,
    cluster_memberships: &mut Array1<usize>,
    dists: &mut Array1<F>,
) -> usize {
    let mut moved = Array1::from_elem(observations.nrows(), false);
    Zip::from(observations.rows())
        .and(cluster_memberships)
        .and(dists)
        .and(&mut moved)
        .par_for_each(|observation, cluster_membership, dist, moved| {
            let (m, d) = closest_centroid(centroids, &observation);
            *moved = *cluster_membership != m;
            *cluster_membership = m;
            *dist = d;
        });
    moved.iter().filter(|&&m| m).count()
}

/// Given a matrix of centroids with shape (n_centroids, n_features) and an observation,
/// return the index of the closest centroid (the index of the corresponding row in `centroids`)
/// and the squared euclidean distance to it. The lowest index wins a tie.
pub(crate) fn closest_centroid<F: Float>(
    // (n_centroids, n_features)
    centroids: &ArrayBase<impl Data<Elem = F>, Ix2>,
    // (n_features)
    observation: &ArrayBase<impl Data<Elem = F>, Ix1>,
) -> (usize, F) {
    let mut closest_index = 0;
    let mut minimum_distance = F::infinity();

    for (centroid_index, centroid) in centroids.rows().into_iter().enumerate() {
        let distance = squared_distance(&centroid, observation);
        if distance < minimum_distance {
            closest_index = centroid_index;
            minimum_distance = distance;
        }
    }
    (closest_index, minimum_distance)
}

fn squared_distance<F: Float>(
    a: &ArrayBase<impl Data<Elem = F>, Ix1>,
    b: &ArrayBase<impl Data<Elem = F>, Ix1>,
) -> F {
    Zip::from(a)
        .and(b)
        .fold(F::zero(), |acc, &x, &y| acc + (x - y) * (x - y))
}
