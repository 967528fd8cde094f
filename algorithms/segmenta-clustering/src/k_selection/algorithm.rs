use crate::k_selection::{KSelectionParams, KSelectionValidParams};
use crate::{KMeans, KMeansError, KSelectionError};
use ndarray::{ArrayBase, Axis, Data, Ix2};
use ndarray_rand::rand::seq::index;
use ndarray_rand::rand::{Rng, SeedableRng};
use rand_isaac::Isaac64Rng;
use rayon::prelude::*;
use segmenta::error::Error;
use segmenta::metrics::silhouette_score;
use segmenta::traits::Fit;
use segmenta::Float;

#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

/// Mean silhouette obtained by one candidate number of clusters
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Debug, PartialEq)]
pub struct CandidateScore<F> {
    pub k: usize,
    /// `None` when the candidate was skipped: more clusters than sampled rows, an empty
    /// cluster, or fewer than two non-empty clusters.
    pub score: Option<F>,
}

/// Silhouette driven choice of the number of clusters.
///
/// A sample of `sample_size` rows is drawn once, without replacement. Every candidate K of the
/// range is fitted with [`KMeans`] on that sample and scored with the mean silhouette of the
/// resulting partition. The candidate with the highest score is retained, the lowest K on ties.
///
/// Candidates are fitted in parallel. Each of them receives its own generator, seeded from
/// values drawn in candidate order from the generator of the parameters, so the outcome is the
/// same as a sequential evaluation.
///
/// ```
/// use segmenta::traits::Fit;
/// use segmenta_clustering::{KSelection, KSelectionError};
/// use segmenta_datasets::generate;
/// use ndarray::array;
/// use ndarray_rand::rand::SeedableRng;
/// use rand_isaac::Isaac64Rng;
///
/// let mut rng = Isaac64Rng::seed_from_u64(42);
/// let centers = array![[0., 0.], [15., 15.], [-15., 15.]];
/// let data = generate::blobs(40, &centers, &mut rng);
///
/// let selection: KSelection<f64> = KSelection::params_with_rng(2..=5, rng)
///     .sample_size(100)
///     .fit(&data)
///     .map_err(|e: KSelectionError| e)
///     .expect("a feasible clustering");
/// assert_eq!(selection.best_k(), 3);
/// ```
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Debug, PartialEq)]
pub struct KSelection<F> {
    best_k: usize,
    best_score: F,
    scores: Vec<CandidateScore<F>>,
    sample_indices: Vec<usize>,
}

impl<F: Float> KSelection<F> {
    pub fn params(k_range: std::ops::RangeInclusive<usize>) -> KSelectionParams<F, Isaac64Rng> {
        KSelectionParams::new(k_range, Isaac64Rng::seed_from_u64(42))
    }

    pub fn params_with_seed(
        k_range: std::ops::RangeInclusive<usize>,
        seed: u64,
    ) -> KSelectionParams<F, Isaac64Rng> {
        KSelectionParams::new(k_range, Isaac64Rng::seed_from_u64(seed))
    }

    pub fn params_with_rng<R: Rng>(
        k_range: std::ops::RangeInclusive<usize>,
        rng: R,
    ) -> KSelectionParams<F, R> {
        KSelectionParams::new(k_range, rng)
    }

    pub fn best_k(&self) -> usize {
        self.best_k
    }

    pub fn best_score(&self) -> F {
        self.best_score
    }

    /// One entry per candidate, in ascending K
    pub fn scores(&self) -> &[CandidateScore<F>] {
        &self.scores
    }

    /// Rows of the input matrix used for scoring, in ascending order
    pub fn sample_indices(&self) -> &[usize] {
        &self.sample_indices
    }
}

impl<F, R, DA> Fit<ArrayBase<DA, Ix2>, KSelectionError> for KSelectionValidParams<F, R>
where
    F: Float,
    R: Rng + SeedableRng + Clone + Send + Sync,
    DA: Data<Elem = F>,
{
    type Object = KSelection<F>;

    fn fit(&self, observations: &ArrayBase<DA, Ix2>) -> Result<Self::Object, KSelectionError> {
        let n_samples = observations.nrows();
        if self.sample_size() > n_samples {
            return Err(Error::InsufficientData {
                required: self.sample_size(),
                available: n_samples,
            }
            .into());
        }
        if self.sample_size() < self.k_min() {
            return Err(Error::InsufficientData {
                required: self.k_min(),
                available: self.sample_size(),
            }
            .into());
        }

        let mut rng = self.rng().clone();
        let mut sample_indices = index::sample(&mut rng, n_samples, self.sample_size()).into_vec();
        sample_indices.sort_unstable();
        let sample = observations.select(Axis(0), &sample_indices);

        let candidates: Vec<(usize, u64)> =
            self.k_range().map(|k| (k, rng.gen::<u64>())).collect();

        let scores = candidates
            .into_par_iter()
            .map(|(k, seed)| -> Result<CandidateScore<F>, KSelectionError> {
                if k > sample.nrows() {
                    return Ok(CandidateScore { k, score: None });
                }
                let fitted: Result<KMeans<F>, KMeansError> =
                    KMeans::params_with_rng(k, R::seed_from_u64(seed))
                        .n_runs(self.n_runs())
                        .max_n_iterations(self.max_n_iterations())
                        .init_method(self.init_method())
                        .fit(&sample);
                let score = match fitted {
                    // a partition that kept an empty cluster never reached `k` clusters
                    Ok(model) if model.n_non_empty_clusters() < k => None,
                    Ok(model) => silhouette_score(&sample, model.memberships())?,
                    Err(KMeansError::EmptyCluster(_)) => None,
                    Err(err) => return Err(err.into()),
                };
                Ok(CandidateScore { k, score })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut best: Option<(usize, F)> = None;
        for candidate in &scores {
            match candidate.score {
                Some(score) => {
                    log::info!("silhouette score for k={}: {:.4}", candidate.k, score);
                    if best.map_or(true, |(_, best_score)| score > best_score) {
                        best = Some((candidate.k, score));
                    }
                }
                None => log::info!("k={} skipped: no valid silhouette score", candidate.k),
            }
        }

        let (best_k, best_score) = best.ok_or(KSelectionError::NoFeasibleClustering {
            k_min: self.k_min(),
            k_max: self.k_max(),
        })?;
        log::info!("selected k={} (silhouette {:.4})", best_k, best_score);

        Ok(KSelection {
            best_k,
            best_score,
            scores,
            sample_indices,
        })
    }
}
