//! Utility functions for randomly generating datasets

use ndarray::{s, Array, Array2, ArrayBase, Data, Ix1, Ix2};
use ndarray_rand::{
    rand::distributions::WeightedIndex,
    rand::Rng,
    rand_distr::{Distribution, Normal, Poisson, StandardNormal},
    RandomExt,
};
use segmenta::CustomerRecord;

/// Special case of `blobs_with_distribution` with a standard normal distribution.
pub fn blobs(
    blob_size: usize,
    blob_centroids: &ArrayBase<impl Data<Elem = f64>, Ix2>,
    rng: &mut impl Rng,
) -> Array2<f64> {
    blobs_with_distribution(blob_size, blob_centroids, StandardNormal, rng)
}

/// Given an input matrix `blob_centroids`, with shape `(n_blobs, n_features)`,
/// generate `blob_size` data points (a "blob") around each of the blob centroids.
///
/// The points of the i-th blob occupy rows `i * blob_size..(i + 1) * blob_size`.
pub fn blobs_with_distribution(
    blob_size: usize,
    blob_centroids: &ArrayBase<impl Data<Elem = f64>, Ix2>,
    distribution: impl Distribution<f64> + Clone,
    rng: &mut impl Rng,
) -> Array2<f64> {
    let (n_centroids, n_features) = blob_centroids.dim();
    let mut blobs: Array2<f64> = Array2::zeros((n_centroids * blob_size, n_features));

    for (blob_index, blob_centroid) in blob_centroids.rows().into_iter().enumerate() {
        let blob = make_blob(blob_size, &blob_centroid, distribution.clone(), rng);

        let indexes = s![blob_index * blob_size..(blob_index + 1) * blob_size, ..];
        blobs.slice_mut(indexes).assign(&blob);
    }
    blobs
}

fn make_blob(
    blob_size: usize,
    blob_centroid: &ArrayBase<impl Data<Elem = f64>, Ix1>,
    distribution: impl Distribution<f64>,
    rng: &mut impl Rng,
) -> Array2<f64> {
    let shape = (blob_size, blob_centroid.len());
    let origin_blob: Array2<f64> = Array::random_using(shape, distribution, rng);
    origin_blob + blob_centroid
}

/// Behaviour of one group of synthetic customers
struct Tier {
    weight: f64,
    income: (f64, f64),
    credit_score: (f64, f64),
    debt_to_income: (f64, f64),
    monthly_spend: (f64, f64),
    late_payments_rate: f64,
    products: (f64, f64),
    default_probability: f64,
    churn_probability: f64,
}

const TIERS: [Tier; 4] = [
    // affluent
    Tier {
        weight: 0.15,
        income: (3_500_000., 600_000.),
        credit_score: (790., 25.),
        debt_to_income: (0.15, 0.05),
        monthly_spend: (120_000., 25_000.),
        late_payments_rate: 0.2,
        products: (5., 1.),
        default_probability: 0.02,
        churn_probability: 0.05,
    },
    // established
    Tier {
        weight: 0.35,
        income: (1_500_000., 300_000.),
        credit_score: (720., 25.),
        debt_to_income: (0.28, 0.06),
        monthly_spend: (55_000., 12_000.),
        late_payments_rate: 0.8,
        products: (3.5, 1.),
        default_probability: 0.06,
        churn_probability: 0.10,
    },
    // emerging
    Tier {
        weight: 0.30,
        income: (700_000., 150_000.),
        credit_score: (660., 25.),
        debt_to_income: (0.40, 0.07),
        monthly_spend: (25_000., 6_000.),
        late_payments_rate: 2.,
        products: (2., 1.),
        default_probability: 0.15,
        churn_probability: 0.18,
    },
    // stressed
    Tier {
        weight: 0.20,
        income: (400_000., 100_000.),
        credit_score: (580., 30.),
        debt_to_income: (0.58, 0.08),
        monthly_spend: (18_000., 5_000.),
        late_payments_rate: 5.,
        products: (1.5, 0.8),
        default_probability: 0.35,
        churn_probability: 0.25,
    },
];

fn normal(rng: &mut impl Rng, (mean, std_dev): (f64, f64)) -> f64 {
    // the parameters are constants with a positive deviation
    Normal::new(mean, std_dev)
        .map(|d| d.sample(rng))
        .unwrap_or(mean)
}

/// Generates `n_customers` records with ids `1..=n_customers`, each drawn from one of four
/// behavioural tiers (affluent, established, emerging, stressed).
///
/// Attributes are clamped to plausible ranges: credit scores within `300..=900`, counts are
/// non-negative integers, at least one product is owned. `defaulted` and `churned` are 0/1 flags
/// whose probability grows with the riskiness of the tier.
///
/// ```
/// use segmenta_datasets::generate;
/// use ndarray_rand::rand::SeedableRng;
/// use rand_isaac::Isaac64Rng;
///
/// let mut rng = Isaac64Rng::seed_from_u64(42);
/// let customers = generate::customers(100, &mut rng);
/// assert_eq!(customers.len(), 100);
/// assert_eq!(customers[0].customer_id, 1);
/// ```
pub fn customers(n_customers: usize, rng: &mut impl Rng) -> Vec<CustomerRecord> {
    let tiers = WeightedIndex::new(TIERS.iter().map(|t| t.weight))
        .expect("tier weights are positive constants");

    (1..=n_customers as u64)
        .map(|customer_id| {
            let tier = &TIERS[tiers.sample(rng)];
            let late_payments: f64 = Poisson::new(tier.late_payments_rate)
                .map(|d| d.sample(rng))
                .unwrap_or(0.);

            CustomerRecord {
                customer_id,
                annual_income_inr: normal(rng, tier.income).max(60_000.).round(),
                credit_score: normal(rng, tier.credit_score).round().clamp(300., 900.),
                debt_to_income: normal(rng, tier.debt_to_income).clamp(0.01, 1.5),
                avg_monthly_spend_inr: normal(rng, tier.monthly_spend).max(1_000.).round(),
                late_payments_12m: late_payments.min(12.),
                products_owned: normal(rng, tier.products).round().clamp(1., 8.),
                defaulted: if rng.gen_bool(tier.default_probability) { 1. } else { 0. },
                churned: if rng.gen_bool(tier.churn_probability) { 1. } else { 0. },
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::{array, Axis};
    use ndarray_rand::rand::SeedableRng;
    use rand_isaac::Isaac64Rng;
    use segmenta::CustomerTable;

    #[test]
    fn blobs_are_centered_on_their_centroids() {
        let mut rng = Isaac64Rng::seed_from_u64(42);
        let centroids = array![[0., 0.], [100., -100.]];
        let data = blobs(500, &centroids, &mut rng);
        assert_eq!(data.dim(), (1000, 2));
        let first = data.slice(s![..500, ..]).mean_axis(Axis(0)).unwrap();
        let second = data.slice(s![500.., ..]).mean_axis(Axis(0)).unwrap();
        assert_abs_diff_eq!(first, centroids.row(0), epsilon = 0.2);
        assert_abs_diff_eq!(second, centroids.row(1), epsilon = 0.2);
    }

    #[test]
    fn customers_form_a_valid_table() {
        let mut rng = Isaac64Rng::seed_from_u64(42);
        let records = customers(1000, &mut rng);
        let table = CustomerTable::from_records(&records).unwrap();
        assert_eq!(table.nrows(), 1000);
        for record in &records {
            assert!((300. ..=900.).contains(&record.credit_score));
            assert!(record.products_owned >= 1.);
            assert_eq!(record.late_payments_12m.fract(), 0.);
        }
    }

    #[test]
    fn customers_are_reproducible() {
        let a = customers(50, &mut Isaac64Rng::seed_from_u64(1));
        let b = customers(50, &mut Isaac64Rng::seed_from_u64(1));
        assert_eq!(a, b);
    }
}
