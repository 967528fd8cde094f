use approx::assert_abs_diff_eq;
use ndarray::{array, Array1, ArrayView2};
use ndarray_rand::rand::SeedableRng;
use rand_isaac::Isaac64Rng;
use segmenta::traits::Fit;
use segmenta::{CustomerRecord, CustomerTable, Feature, ParamGuard};
use segmenta_clustering::{KMeans, KMeansError, KSelection, KSelectionError};
use segmenta_datasets::generate;
use segmenta_preprocessing::PreprocessingError;
use segmenta_segments::{
    ClusterProfiler, DefaultRiskModel, RiskBand, SegmentMapper, SegmentationError,
    SegmentationParams, SegmentationReport,
};
use std::collections::HashSet;

fn synthetic_customers(n: usize, seed: u64) -> CustomerTable {
    let mut rng = Isaac64Rng::seed_from_u64(seed);
    CustomerTable::from_records(&generate::customers(n, &mut rng)).unwrap()
}

fn segment(params: SegmentationParams, table: &CustomerTable) -> Result<SegmentationReport, SegmentationError> {
    params.fit(table)
}

#[test]
fn four_blobs_are_found_and_profiled() {
    let mut rng = Isaac64Rng::seed_from_u64(42);
    let centers = array![[0., 0.], [12., 12.], [-12., 12.], [12., -12.]];
    let points = generate::blobs(50, &centers, &mut rng);

    let selection: Result<KSelection<f64>, KSelectionError> =
        KSelection::params(3..=6).sample_size(200).fit(&points);
    let selection = selection.unwrap();
    assert_eq!(selection.best_k(), 4);

    let model: Result<KMeans<f64>, KMeansError> =
        KMeans::params(selection.best_k()).n_runs(20).fit(&points);
    let model = model.unwrap();

    // the blob coordinates become the credit score and the income of 200 customers
    let records: Vec<CustomerRecord> = points
        .rows()
        .into_iter()
        .enumerate()
        .map(|(i, p)| CustomerRecord {
            customer_id: i as u64 + 1,
            annual_income_inr: 1_000_000. + 10_000. * p[1],
            credit_score: 700. + 10. * p[0],
            debt_to_income: 0.3,
            avg_monthly_spend_inr: 30_000.,
            late_payments_12m: 1.,
            products_owned: 2.,
            defaulted: if i < 50 { 1. } else { 0. },
            churned: 0.,
        })
        .collect();
    let table = CustomerTable::from_records(&records).unwrap();
    let profiles = ClusterProfiler::new()
        .profile(&table, model.memberships())
        .unwrap();
    assert_eq!(profiles.len(), 4);
    assert!(profiles.counts().iter().all(|&(_, count)| count == 50));

    // the first blob holds every defaulter
    let first = profiles.get(model.memberships()[0]).unwrap();
    assert_abs_diff_eq!(first.rate(segmenta::Outcome::Defaulted).unwrap(), 1.);
    assert_abs_diff_eq!(first.mean(Feature::CreditScore).unwrap(), 700., epsilon = 5.);

    let mapping = SegmentMapper::default().map(&profiles);
    let labeled: Vec<usize> = mapping.clusters().iter().map(|c| c.cluster()).collect();
    let profiled: Vec<usize> = profiles.iter().map(|p| p.cluster()).collect();
    assert_eq!(labeled, profiled);
    assert_eq!(mapping.segment_of(model.memberships()[0]), Some("High-Risk"));
}

#[test]
fn end_to_end_on_synthetic_customers() {
    let table = synthetic_customers(2500, 7);
    let report = segment(SegmentationParams::new(), &table).unwrap();

    assert!((3..=6).contains(&report.n_clusters()));
    assert_eq!(report.selection().scores().len(), 4);
    assert_eq!(report.memberships().len(), 2500);
    assert_eq!(report.ids(), table.ids());
    assert!(report.risk().is_none());

    // every customer belongs to a profiled, labeled cluster
    let total: usize = report.profiles().counts().iter().map(|c| c.1).sum();
    assert_eq!(total, 2500);
    for row in 0..table.nrows() {
        assert!(report.segment_of_row(row).is_some());
    }
    let labeled: HashSet<usize> = report.mapping().clusters().iter().map(|c| c.cluster()).collect();
    assert_eq!(labeled.len(), report.profiles().len());

    // profile means stay within the range of each feature
    for feature in Feature::ALL {
        let column = table.feature_column(feature);
        let min = column.fold(f64::INFINITY, |a, &b| a.min(b));
        let max = column.fold(f64::NEG_INFINITY, |a, &b| a.max(b));
        for profile in report.profiles().iter() {
            let mean = profile.mean(feature).unwrap();
            assert!(min <= mean && mean <= max, "{} mean {} out of range", feature, mean);
        }
    }

    let centroids = report.centroids_in_original_units().unwrap();
    assert_eq!(centroids.dim(), (report.n_clusters(), Feature::COUNT));
}

#[test]
fn same_seed_same_report() {
    let table = synthetic_customers(600, 3);
    let params = SegmentationParams::new().sample_size(300).k_range(2..=4);
    let a = segment(params.clone(), &table).unwrap();
    let b = segment(params, &table).unwrap();
    assert_eq!(a, b);
}

#[test]
fn constant_feature_is_rejected() {
    let mut rng = Isaac64Rng::seed_from_u64(1);
    let records: Vec<CustomerRecord> = generate::customers(100, &mut rng)
        .into_iter()
        .map(|r| CustomerRecord {
            products_owned: 2.,
            ..r
        })
        .collect();
    let table = CustomerTable::from_records(&records).unwrap();
    let res = segment(SegmentationParams::new().sample_size(50), &table);
    assert!(matches!(
        res,
        Err(SegmentationError::Preprocessing(
            PreprocessingError::DegenerateFeature(5)
        ))
    ));
}

#[test]
fn sample_larger_than_the_table() {
    let table = synthetic_customers(100, 1);
    let res = segment(SegmentationParams::new(), &table);
    assert!(matches!(
        res,
        Err(SegmentationError::Selection(KSelectionError::SegmentaError(
            segmenta::error::Error::InsufficientData {
                required: 2000,
                available: 100
            }
        )))
    ));
}

/// Flags customers with many late payments
struct LatePayments;

impl DefaultRiskModel for LatePayments {
    fn default_probabilities(&self, features: ArrayView2<f64>) -> Array1<f64> {
        features
            .column(Feature::LatePayments.index())
            .mapv(|late| (late / 6.).min(1.))
    }
}

#[test]
fn risk_bands_are_attached() {
    let table = synthetic_customers(400, 11);
    let pipeline = SegmentationParams::new()
        .sample_size(200)
        .check_unwrap();
    let report = pipeline.run(&table, Some(&LatePayments)).unwrap();
    let risk = report.risk().unwrap();
    assert_eq!(risk.bands().len(), 400);
    for (row, band) in risk.bands().iter().enumerate() {
        let late = table.feature_column(Feature::LatePayments)[row];
        let expected = if late >= 3. {
            RiskBand::High
        } else if late >= 2.1 {
            RiskBand::Medium
        } else {
            RiskBand::Low
        };
        assert_eq!(*band, expected);
    }
}
