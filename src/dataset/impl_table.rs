use std::collections::HashSet;

use ndarray::{Array2, ArrayView1, ArrayView2, Axis};

use super::{CustomerRecord, Feature, Outcome};
use crate::error::{Error, Result};

/// Validated, column-typed customer table
///
/// Rows are addressed by position; `ids()[i]` is the stable identity of row `i`. The feature
/// matrix has shape `(n_customers, Feature::COUNT)` and the outcome matrix
/// `(n_customers, Outcome::COUNT)`, both in the column order of the respective enum.
///
/// The table is read-only once built: derived columns such as cluster memberships are produced
/// by the algorithms as separate arrays and merged back by the caller.
#[derive(Clone, Debug, PartialEq)]
pub struct CustomerTable {
    ids: Vec<u64>,
    features: Array2<f64>,
    outcomes: Array2<f64>,
}

impl CustomerTable {
    /// Builds a table from raw records, rejecting empty input, duplicate ids and invalid values
    pub fn from_records(records: &[CustomerRecord]) -> Result<Self> {
        let ids = records.iter().map(|r| r.customer_id).collect();
        let features = Array2::from_shape_vec(
            (records.len(), Feature::COUNT),
            records.iter().flat_map(|r| r.features()).collect(),
        )?;
        let outcomes = Array2::from_shape_vec(
            (records.len(), Outcome::COUNT),
            records.iter().flat_map(|r| r.outcomes()).collect(),
        )?;

        Self::new(ids, features, outcomes)
    }

    /// Builds a table from already assembled columns
    pub fn new(ids: Vec<u64>, features: Array2<f64>, outcomes: Array2<f64>) -> Result<Self> {
        if ids.is_empty() {
            return Err(Error::InsufficientData {
                required: 1,
                available: 0,
            });
        }
        if features.dim() != (ids.len(), Feature::COUNT) {
            return Err(Error::Parameters(format!(
                "feature matrix has shape {:?}, expected ({}, {})",
                features.dim(),
                ids.len(),
                Feature::COUNT
            )));
        }
        if outcomes.dim() != (ids.len(), Outcome::COUNT) {
            return Err(Error::Parameters(format!(
                "outcome matrix has shape {:?}, expected ({}, {})",
                outcomes.dim(),
                ids.len(),
                Outcome::COUNT
            )));
        }

        let mut seen = HashSet::with_capacity(ids.len());
        for (row, &id) in ids.iter().enumerate() {
            if !seen.insert(id) {
                return Err(Error::DuplicateId(id));
            }
            validate_row(row, features.row(row), outcomes.row(row))?;
        }

        Ok(CustomerTable {
            ids,
            features,
            outcomes,
        })
    }

    pub fn nrows(&self) -> usize {
        self.ids.len()
    }

    pub fn ids(&self) -> &[u64] {
        &self.ids
    }

    /// Feature matrix with shape `(n_customers, Feature::COUNT)`
    pub fn features(&self) -> ArrayView2<'_, f64> {
        self.features.view()
    }

    /// Outcome matrix with shape `(n_customers, Outcome::COUNT)`
    pub fn outcomes(&self) -> ArrayView2<'_, f64> {
        self.outcomes.view()
    }

    pub fn feature_column(&self, feature: Feature) -> ArrayView1<'_, f64> {
        self.features.index_axis(Axis(1), feature.index())
    }

    pub fn outcome_column(&self, outcome: Outcome) -> ArrayView1<'_, f64> {
        self.outcomes.index_axis(Axis(1), outcome.index())
    }

    /// Reassembles the record stored at `row`
    pub fn record(&self, row: usize) -> CustomerRecord {
        let f = self.features.row(row);
        let o = self.outcomes.row(row);
        CustomerRecord {
            customer_id: self.ids[row],
            annual_income_inr: f[Feature::AnnualIncome.index()],
            credit_score: f[Feature::CreditScore.index()],
            debt_to_income: f[Feature::DebtToIncome.index()],
            avg_monthly_spend_inr: f[Feature::AvgMonthlySpend.index()],
            late_payments_12m: f[Feature::LatePayments.index()],
            products_owned: f[Feature::ProductsOwned.index()],
            defaulted: o[Outcome::Defaulted.index()],
            churned: o[Outcome::Churned.index()],
        }
    }

    pub fn records(&self) -> impl Iterator<Item = CustomerRecord> + '_ {
        (0..self.nrows()).map(move |row| self.record(row))
    }
}

fn validate_row(row: usize, features: ArrayView1<f64>, outcomes: ArrayView1<f64>) -> Result<()> {
    for feature in Feature::ALL {
        let value = features[feature.index()];
        if !value.is_finite() {
            return Err(Error::InvalidRecord {
                row,
                reason: format!("{} is not a finite number", feature),
            });
        }
        let is_count = matches!(feature, Feature::LatePayments | Feature::ProductsOwned);
        if is_count && value < 0. {
            return Err(Error::InvalidRecord {
                row,
                reason: format!("{} cannot be negative ({})", feature, value),
            });
        }
    }
    for outcome in Outcome::ALL {
        let value = outcomes[outcome.index()];
        if !(0. ..=1.).contains(&value) {
            return Err(Error::InvalidRecord {
                row,
                reason: format!("{} must lie in [0, 1], got {}", outcome, value),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn record(customer_id: u64, credit_score: f64, defaulted: f64) -> CustomerRecord {
        CustomerRecord {
            customer_id,
            annual_income_inr: 650_000.,
            credit_score,
            debt_to_income: 0.55,
            avg_monthly_spend_inr: 22_000.,
            late_payments_12m: 2.,
            products_owned: 2.,
            defaulted,
            churned: 0.,
        }
    }

    #[test]
    fn builds_columns_in_schema_order() {
        let table =
            CustomerTable::from_records(&[record(1, 660., 0.), record(2, 590., 1.)]).unwrap();
        assert_eq!(table.nrows(), 2);
        assert_eq!(table.ids(), &[1, 2]);
        assert_eq!(table.feature_column(Feature::CreditScore), array![660., 590.]);
        assert_eq!(table.outcome_column(Outcome::Defaulted), array![0., 1.]);
        assert_eq!(table.record(1), record(2, 590., 1.));
        assert_eq!(table.records().count(), 2);
    }

    #[test]
    fn rejects_empty_input() {
        let res = CustomerTable::from_records(&[]);
        assert!(matches!(res, Err(Error::InsufficientData { .. })));
    }

    #[test]
    fn rejects_duplicate_ids() {
        let res = CustomerTable::from_records(&[record(3, 700., 0.), record(3, 710., 0.)]);
        assert!(matches!(res, Err(Error::DuplicateId(3))));
    }

    #[test]
    fn rejects_non_finite_features() {
        let res = CustomerTable::from_records(&[record(1, 700., 0.), record(2, f64::NAN, 0.)]);
        assert!(matches!(res, Err(Error::InvalidRecord { row: 1, .. })));
    }

    #[test]
    fn rejects_outcomes_outside_unit_interval() {
        let res = CustomerTable::from_records(&[record(1, 700., 2.)]);
        assert!(matches!(res, Err(Error::InvalidRecord { row: 0, .. })));
    }

    #[test]
    fn rejects_negative_counts() {
        let mut bad = record(1, 700., 0.);
        bad.late_payments_12m = -1.;
        let res = CustomerTable::from_records(&[bad]);
        assert!(matches!(res, Err(Error::InvalidRecord { row: 0, .. })));
    }

    #[test]
    fn rejects_mismatched_shapes() {
        let res = CustomerTable::new(vec![1], Array2::zeros((1, 3)), Array2::zeros((1, 2)));
        assert!(matches!(res, Err(Error::Parameters(_))));
    }
}
