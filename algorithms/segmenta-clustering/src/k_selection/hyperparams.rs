use crate::{KMeansInit, KSelectionParamsError};
use ndarray_rand::rand::Rng;
use segmenta::{Float, ParamGuard};
use std::marker::PhantomData;
use std::ops::RangeInclusive;

#[derive(Clone, Debug, PartialEq)]
/// The set of hyperparameters of the [silhouette driven selection](crate::KSelection) of the
/// number of clusters.
pub struct KSelectionValidParams<F: Float, R: Rng> {
    /// Candidate numbers of clusters, both ends included
    k_range: RangeInclusive<usize>,
    /// Number of rows drawn, without replacement, to cluster and score every candidate
    sample_size: usize,
    /// K-means restarts for every candidate
    n_runs: usize,
    /// Iteration bound of every K-means run
    max_n_iterations: u64,
    init: KMeansInit,
    rng: R,
    phantom: PhantomData<F>,
}

#[derive(Clone, Debug, PartialEq)]
/// Builder for [`KSelectionValidParams`]
pub struct KSelectionParams<F: Float, R: Rng>(KSelectionValidParams<F, R>);

impl<F: Float, R: Rng> KSelectionParams<F, R> {
    /// Candidates are the values of `k_range`.
    ///
    /// Defaults are provided if optional parameters are not specified:
    /// * `sample_size = 2000`
    /// * `n_runs = 10`
    /// * `max_n_iterations = 300`
    /// * `init = Random`
    pub fn new(k_range: RangeInclusive<usize>, rng: R) -> Self {
        Self(KSelectionValidParams {
            k_range,
            sample_size: 2000,
            n_runs: 10,
            max_n_iterations: 300,
            init: KMeansInit::Random,
            rng,
            phantom: PhantomData,
        })
    }

    pub fn sample_size(mut self, sample_size: usize) -> Self {
        self.0.sample_size = sample_size;
        self
    }

    pub fn n_runs(mut self, n_runs: usize) -> Self {
        self.0.n_runs = n_runs;
        self
    }

    pub fn max_n_iterations(mut self, max_n_iterations: u64) -> Self {
        self.0.max_n_iterations = max_n_iterations;
        self
    }

    pub fn init_method(mut self, init: KMeansInit) -> Self {
        self.0.init = init;
        self
    }
}

impl<F: Float, R: Rng> ParamGuard for KSelectionParams<F, R> {
    type Checked = KSelectionValidParams<F, R>;
    type Error = KSelectionParamsError;

    fn check_ref(&self) -> Result<&Self::Checked, Self::Error> {
        let (min, max) = (*self.0.k_range.start(), *self.0.k_range.end());
        if min > max {
            Err(KSelectionParamsError::EmptyRange { min, max })
        } else if min == 0 {
            Err(KSelectionParamsError::ZeroClusters)
        } else if self.0.sample_size < 2 {
            Err(KSelectionParamsError::SampleSize)
        } else if self.0.n_runs == 0 {
            Err(KSelectionParamsError::NRuns)
        } else if self.0.max_n_iterations == 0 {
            Err(KSelectionParamsError::MaxIterations)
        } else {
            Ok(&self.0)
        }
    }

    fn check(self) -> Result<Self::Checked, Self::Error> {
        self.check_ref()?;
        Ok(self.0)
    }
}

impl<F: Float, R: Rng> KSelectionValidParams<F, R> {
    pub fn k_range(&self) -> RangeInclusive<usize> {
        self.k_range.clone()
    }

    pub fn k_min(&self) -> usize {
        *self.k_range.start()
    }

    pub fn k_max(&self) -> usize {
        *self.k_range.end()
    }

    pub fn sample_size(&self) -> usize {
        self.sample_size
    }

    pub fn n_runs(&self) -> usize {
        self.n_runs
    }

    pub fn max_n_iterations(&self) -> u64 {
        self.max_n_iterations
    }

    pub fn init_method(&self) -> KMeansInit {
        self.init
    }

    pub fn rng(&self) -> &R {
        &self.rng
    }
}

#[cfg(test)]
mod tests {
    use crate::{KSelection, KSelectionParamsError};
    use segmenta::ParamGuard;

    #[test]
    fn empty_range_is_rejected() {
        #[allow(clippy::reversed_empty_ranges)]
        let res = KSelection::<f64>::params(6..=3).check();
        assert!(matches!(
            res,
            Err(KSelectionParamsError::EmptyRange { min: 6, max: 3 })
        ));
    }

    #[test]
    fn zero_clusters_is_rejected() {
        let res = KSelection::<f64>::params(0..=3).check();
        assert!(matches!(res, Err(KSelectionParamsError::ZeroClusters)));
    }

    #[test]
    fn sample_size_must_hold_two_points() {
        let res = KSelection::<f64>::params(1..=3).sample_size(1).check();
        assert!(matches!(res, Err(KSelectionParamsError::SampleSize)));
    }

    #[test]
    fn runs_and_iterations_cannot_be_zero() {
        let res = KSelection::<f64>::params(3..=6).n_runs(0).check();
        assert!(matches!(res, Err(KSelectionParamsError::NRuns)));
        let res = KSelection::<f64>::params(3..=6).max_n_iterations(0).check();
        assert!(matches!(res, Err(KSelectionParamsError::MaxIterations)));
    }

    #[test]
    fn defaults() {
        let params = KSelection::<f32>::params(3..=6).check().unwrap();
        assert_eq!(params.k_min(), 3);
        assert_eq!(params.k_max(), 6);
        assert_eq!(params.sample_size(), 2000);
        assert_eq!(params.n_runs(), 10);
        assert_eq!(params.max_n_iterations(), 300);
    }
}
