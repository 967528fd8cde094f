//! End-to-end segmentation: standardize, select K, partition, profile, map
use crate::decision_table::DecisionTable;
use crate::error::{Result, SegmentationError, SegmentationParamsError};
use crate::mapper::{SegmentMapper, SegmentMapping};
use crate::profile::{ClusterProfiler, ProfileTable};
use crate::risk::{DefaultRiskModel, RiskAssessment, RiskThresholds};
use ndarray::{Array1, Array2};
use segmenta::traits::{Fit, Transformer};
use segmenta::{CustomerTable, ParamGuard};
use segmenta_clustering::{KMeans, KMeansInit, KSelection};
use segmenta_preprocessing::{FittedStandardScaler, StandardScaler};
use std::ops::RangeInclusive;

/// Checked parameters of the segmentation, see [`SegmentationParams`]
#[derive(Clone, Debug, PartialEq)]
pub struct SegmentationPipeline {
    k_range: RangeInclusive<usize>,
    sample_size: usize,
    seed: u64,
    selection_runs: usize,
    final_runs: usize,
    max_n_iterations: u64,
    init: KMeansInit,
    profiler: ClusterProfiler,
    mapper: SegmentMapper,
    risk_thresholds: RiskThresholds,
}

/// Builder of a [`SegmentationPipeline`].
///
/// Defaults follow the historical batch job:
/// * candidates `k_range = 3..=6`, scored on `sample_size = 2000` rows
/// * `seed = 42`, shared by the sampling and every K-means run
/// * `selection_runs = 10` restarts per candidate and `final_runs = 20` for the final partition
/// * `max_n_iterations = 300`, random initialisation
/// * the [built-in decision table](DecisionTable::builtin) and the default
///   [risk thresholds](RiskThresholds)
#[derive(Clone, Debug, PartialEq)]
pub struct SegmentationParams(SegmentationPipeline);

impl Default for SegmentationParams {
    fn default() -> Self {
        Self::new()
    }
}

impl SegmentationParams {
    pub fn new() -> Self {
        SegmentationParams(SegmentationPipeline {
            k_range: 3..=6,
            sample_size: 2000,
            seed: 42,
            selection_runs: 10,
            final_runs: 20,
            max_n_iterations: 300,
            init: KMeansInit::Random,
            profiler: ClusterProfiler::new(),
            mapper: SegmentMapper::default(),
            risk_thresholds: RiskThresholds::default(),
        })
    }

    pub fn k_range(mut self, k_range: RangeInclusive<usize>) -> Self {
        self.0.k_range = k_range;
        self
    }

    pub fn sample_size(mut self, sample_size: usize) -> Self {
        self.0.sample_size = sample_size;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.0.seed = seed;
        self
    }

    pub fn selection_runs(mut self, runs: usize) -> Self {
        self.0.selection_runs = runs;
        self
    }

    pub fn final_runs(mut self, runs: usize) -> Self {
        self.0.final_runs = runs;
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

    pub fn profiler(mut self, profiler: ClusterProfiler) -> Self {
        self.0.profiler = profiler;
        self
    }

    pub fn decision_table(mut self, table: DecisionTable) -> Self {
        self.0.mapper = SegmentMapper::new(table);
        self
    }

    pub fn risk_thresholds(mut self, thresholds: RiskThresholds) -> Self {
        self.0.risk_thresholds = thresholds;
        self
    }
}

impl ParamGuard for SegmentationParams {
    type Checked = SegmentationPipeline;
    type Error = SegmentationParamsError;

    fn check_ref(&self) -> std::result::Result<&Self::Checked, Self::Error> {
        let (min, max) = (*self.0.k_range.start(), *self.0.k_range.end());
        if min == 0 || min > max {
            Err(SegmentationParamsError::KRange { min, max })
        } else if self.0.sample_size < 2 {
            Err(SegmentationParamsError::SampleSize)
        } else if self.0.selection_runs == 0 {
            Err(SegmentationParamsError::ZeroRuns("selection_runs"))
        } else if self.0.final_runs == 0 {
            Err(SegmentationParamsError::ZeroRuns("final_runs"))
        } else if self.0.max_n_iterations == 0 {
            Err(SegmentationParamsError::MaxIterations)
        } else {
            Ok(&self.0)
        }
    }

    fn check(self) -> std::result::Result<Self::Checked, Self::Error> {
        self.check_ref()?;
        Ok(self.0)
    }
}

impl SegmentationPipeline {
    pub fn k_range(&self) -> RangeInclusive<usize> {
        self.k_range.clone()
    }

    pub fn sample_size(&self) -> usize {
        self.sample_size
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn selection_runs(&self) -> usize {
        self.selection_runs
    }

    pub fn final_runs(&self) -> usize {
        self.final_runs
    }

    pub fn max_n_iterations(&self) -> u64 {
        self.max_n_iterations
    }

    pub fn decision_table(&self) -> &DecisionTable {
        self.mapper.table()
    }

    pub fn risk_thresholds(&self) -> &RiskThresholds {
        &self.risk_thresholds
    }

    /// Segments `table`, scoring the default risk of every customer when a model is given.
    ///
    /// Either every stage succeeds and the full report is returned, or the first failure is
    /// returned and nothing else.
    pub fn run(
        &self,
        table: &CustomerTable,
        risk_model: Option<&dyn DefaultRiskModel>,
    ) -> Result<SegmentationReport> {
        log::info!("segmenting {} customers", table.nrows());

        let features = table.features();
        let scaler = StandardScaler::new()
            .fit(&features)
            .map_err(SegmentationError::Preprocessing)?;
        let scaled = scaler.transform(&features)?;

        let selection_params = KSelection::params_with_seed(self.k_range(), self.seed)
            .sample_size(self.sample_size)
            .n_runs(self.selection_runs)
            .max_n_iterations(self.max_n_iterations)
            .init_method(self.init);
        let selection: KSelection<f64> = selection_params
            .fit(&scaled)
            .map_err(SegmentationError::Selection)?;

        let k = selection.best_k();
        let model_params = KMeans::params_with_seed(k, self.seed)
            .n_runs(self.final_runs)
            .max_n_iterations(self.max_n_iterations)
            .init_method(self.init);
        let model: KMeans<f64> = model_params
            .fit(&scaled)
            .map_err(SegmentationError::Clustering)?;
        log::info!(
            "final partition: k={}, inertia {:.4}, {} iterations",
            k,
            model.inertia(),
            model.n_iterations()
        );

        let profiles = self.profiler.profile(table, model.memberships())?;
        let mapping = self.mapper.map(&profiles);
        for cluster in mapping.clusters() {
            log::info!(
                "cluster {}: {} customers, segment {}",
                cluster.cluster(),
                cluster.profile().count(),
                cluster.segment()
            );
        }

        let risk = risk_model
            .map(|model| self.risk_thresholds.assess(model, table))
            .transpose()?;

        Ok(SegmentationReport {
            ids: table.ids().to_vec(),
            scaler,
            selection,
            model,
            profiles,
            mapping,
            risk,
        })
    }
}

impl Fit<CustomerTable, SegmentationError> for SegmentationPipeline {
    type Object = SegmentationReport;

    fn fit(&self, table: &CustomerTable) -> Result<Self::Object> {
        self.run(table, None)
    }
}

/// Everything produced by a segmentation run
#[derive(Clone, Debug, PartialEq)]
pub struct SegmentationReport {
    ids: Vec<u64>,
    scaler: FittedStandardScaler<f64>,
    selection: KSelection<f64>,
    model: KMeans<f64>,
    profiles: ProfileTable,
    mapping: SegmentMapping,
    risk: Option<RiskAssessment>,
}

impl SegmentationReport {
    /// Customer ids, in table order
    pub fn ids(&self) -> &[u64] {
        &self.ids
    }

    pub fn scaler(&self) -> &FittedStandardScaler<f64> {
        &self.scaler
    }

    /// Score of every candidate K
    pub fn selection(&self) -> &KSelection<f64> {
        &self.selection
    }

    /// Final partition of the standardized customers
    pub fn model(&self) -> &KMeans<f64> {
        &self.model
    }

    pub fn n_clusters(&self) -> usize {
        self.model.n_clusters()
    }

    /// Cluster of every customer, in table order
    pub fn memberships(&self) -> &Array1<usize> {
        self.model.memberships()
    }

    pub fn profiles(&self) -> &ProfileTable {
        &self.profiles
    }

    pub fn mapping(&self) -> &SegmentMapping {
        &self.mapping
    }

    pub fn risk(&self) -> Option<&RiskAssessment> {
        self.risk.as_ref()
    }

    /// Suggested segment of the customer at `row`
    pub fn segment_of_row(&self, row: usize) -> Option<&str> {
        let cluster = *self.memberships().get(row)?;
        self.mapping.segment_of(cluster)
    }

    /// Centroids of the final partition, in the units of the input features
    pub fn centroids_in_original_units(&self) -> Result<Array2<f64>> {
        Ok(self.scaler.inverse_transform(self.model.centroids())?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let pipeline = SegmentationParams::new().check().unwrap();
        assert_eq!(pipeline.k_range(), 3..=6);
        assert_eq!(pipeline.sample_size(), 2000);
        assert_eq!(pipeline.seed(), 42);
        assert_eq!(pipeline.selection_runs(), 10);
        assert_eq!(pipeline.final_runs(), 20);
        assert_eq!(pipeline.decision_table().version(), "2024-01");
        assert_eq!(pipeline.risk_thresholds(), &RiskThresholds::default());
    }

    #[test]
    fn invalid_parameters() {
        #[allow(clippy::reversed_empty_ranges)]
        let res = SegmentationParams::new().k_range(5..=4).check();
        assert_eq!(res, Err(SegmentationParamsError::KRange { min: 5, max: 4 }));
        let res = SegmentationParams::new().k_range(0..=4).check();
        assert_eq!(res, Err(SegmentationParamsError::KRange { min: 0, max: 4 }));
        let res = SegmentationParams::new().sample_size(1).check();
        assert_eq!(res, Err(SegmentationParamsError::SampleSize));
        let res = SegmentationParams::new().final_runs(0).check();
        assert_eq!(res, Err(SegmentationParamsError::ZeroRuns("final_runs")));
        let res = SegmentationParams::new().max_n_iterations(0).check();
        assert_eq!(res, Err(SegmentationParamsError::MaxIterations));
    }
}
