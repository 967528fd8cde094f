//! Datasets
//!
//! This module implements the customer schema consumed by every algorithm of the workspace,
//! together with the floating point bound used by the numeric code.
use ndarray::ScalarOperand;

use num_traits::{AsPrimitive, FromPrimitive, NumAssignOps, NumCast, Signed};
use rand::distributions::uniform::SampleUniform;

use std::fmt;
use std::iter::Sum;
use std::ops::{AddAssign, DivAssign, MulAssign, SubAssign};

#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

mod impl_table;

pub use impl_table::CustomerTable;

/// Floating point numbers
///
/// This trait bound multiplexes to the most common assumption of floating point number and
/// implement them for 32bit and 64bit floating points. They are used in the feature matrices
/// handed to the scaler, the clustering algorithms and the clustering metrics.
pub trait Float:
    FromPrimitive
    + num_traits::Float
    + PartialOrd
    + Sync
    + Send
    + Default
    + fmt::Display
    + fmt::Debug
    + Signed
    + Sum
    + NumAssignOps
    + AsPrimitive<usize>
    + for<'a> AddAssign<&'a Self>
    + for<'a> MulAssign<&'a Self>
    + for<'a> SubAssign<&'a Self>
    + for<'a> DivAssign<&'a Self>
    + SampleUniform
    + ScalarOperand
    + approx::AbsDiffEq<Epsilon = Self>
{
    fn cast<T: NumCast>(x: T) -> Self {
        NumCast::from(x).unwrap()
    }
}

impl Float for f32 {}

impl Float for f64 {}

/// Numeric attributes describing the financial behaviour of a customer
///
/// The discriminant of each variant is the index of the corresponding column in
/// [`CustomerTable::features`].
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Feature {
    #[cfg_attr(feature = "serde", serde(rename = "annual_income_inr"))]
    AnnualIncome = 0,
    #[cfg_attr(feature = "serde", serde(rename = "credit_score"))]
    CreditScore = 1,
    #[cfg_attr(feature = "serde", serde(rename = "debt_to_income"))]
    DebtToIncome = 2,
    #[cfg_attr(feature = "serde", serde(rename = "avg_monthly_spend_inr"))]
    AvgMonthlySpend = 3,
    #[cfg_attr(feature = "serde", serde(rename = "late_payments_12m"))]
    LatePayments = 4,
    #[cfg_attr(feature = "serde", serde(rename = "products_owned"))]
    ProductsOwned = 5,
}

impl Feature {
    /// Number of feature columns
    pub const COUNT: usize = 6;

    /// Every feature, in column order
    pub const ALL: [Feature; Feature::COUNT] = [
        Feature::AnnualIncome,
        Feature::CreditScore,
        Feature::DebtToIncome,
        Feature::AvgMonthlySpend,
        Feature::LatePayments,
        Feature::ProductsOwned,
    ];

    /// Column index in the feature matrix
    pub fn index(self) -> usize {
        self as usize
    }

    /// Name of the column in tabular inputs and outputs
    pub fn column_name(self) -> &'static str {
        match self {
            Feature::AnnualIncome => "annual_income_inr",
            Feature::CreditScore => "credit_score",
            Feature::DebtToIncome => "debt_to_income",
            Feature::AvgMonthlySpend => "avg_monthly_spend_inr",
            Feature::LatePayments => "late_payments_12m",
            Feature::ProductsOwned => "products_owned",
        }
    }

    pub fn from_column_name(name: &str) -> Option<Feature> {
        Feature::ALL.into_iter().find(|f| f.column_name() == name)
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column_name())
    }
}

/// Binary outcome columns joined to the clusters for reporting
///
/// They never take part in the clustering itself.
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate", rename_all = "snake_case")
)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Outcome {
    Defaulted = 0,
    Churned = 1,
}

impl Outcome {
    pub const COUNT: usize = 2;

    pub const ALL: [Outcome; Outcome::COUNT] = [Outcome::Defaulted, Outcome::Churned];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn column_name(self) -> &'static str {
        match self {
            Outcome::Defaulted => "defaulted",
            Outcome::Churned => "churned",
        }
    }

    pub fn from_column_name(name: &str) -> Option<Outcome> {
        Outcome::ALL.into_iter().find(|o| o.column_name() == name)
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column_name())
    }
}

/// One customer row, as read by the ingestion boundary
///
/// Field names double as column names of the tabular input. Outcomes are `0`/`1`
/// indicators, kept as floating point so that their cluster means read as rates.
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Debug, PartialEq)]
pub struct CustomerRecord {
    pub customer_id: u64,
    pub annual_income_inr: f64,
    pub credit_score: f64,
    pub debt_to_income: f64,
    pub avg_monthly_spend_inr: f64,
    pub late_payments_12m: f64,
    pub products_owned: f64,
    pub defaulted: f64,
    pub churned: f64,
}

impl CustomerRecord {
    pub fn feature(&self, feature: Feature) -> f64 {
        match feature {
            Feature::AnnualIncome => self.annual_income_inr,
            Feature::CreditScore => self.credit_score,
            Feature::DebtToIncome => self.debt_to_income,
            Feature::AvgMonthlySpend => self.avg_monthly_spend_inr,
            Feature::LatePayments => self.late_payments_12m,
            Feature::ProductsOwned => self.products_owned,
        }
    }

    pub fn outcome(&self, outcome: Outcome) -> f64 {
        match outcome {
            Outcome::Defaulted => self.defaulted,
            Outcome::Churned => self.churned,
        }
    }

    /// The feature vector, in column order
    pub fn features(&self) -> [f64; Feature::COUNT] {
        Feature::ALL.map(|f| self.feature(f))
    }

    pub fn outcomes(&self) -> [f64; Outcome::COUNT] {
        Outcome::ALL.map(|o| self.outcome(o))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_names_round_trip() {
        for feature in Feature::ALL {
            assert_eq!(Feature::from_column_name(feature.column_name()), Some(feature));
        }
        for outcome in Outcome::ALL {
            assert_eq!(Outcome::from_column_name(outcome.column_name()), Some(outcome));
        }
        assert_eq!(Feature::from_column_name("defaulted"), None);
    }

    #[test]
    fn indices_follow_column_order() {
        let indices: Vec<usize> = Feature::ALL.iter().map(|f| f.index()).collect();
        assert_eq!(indices, (0..Feature::COUNT).collect::<Vec<_>>());
        assert_eq!(Outcome::Churned.index(), 1);
    }

    #[test]
    fn record_accessors() {
        let record = CustomerRecord {
            customer_id: 7,
            annual_income_inr: 1_000_000.,
            credit_score: 710.,
            debt_to_income: 0.4,
            avg_monthly_spend_inr: 38_000.,
            late_payments_12m: 1.,
            products_owned: 3.,
            defaulted: 0.,
            churned: 1.,
        };
        assert_eq!(
            record.features(),
            [1_000_000., 710., 0.4, 38_000., 1., 3.]
        );
        assert_eq!(record.outcomes(), [0., 1.]);
        assert_eq!(record.feature(Feature::CreditScore), 710.);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn feature_serializes_as_column_name() {
        let json = serde_json::to_string(&Feature::AvgMonthlySpend).unwrap();
        assert_eq!(json, "\"avg_monthly_spend_inr\"");
        let outcome: Outcome = serde_json::from_str("\"churned\"").unwrap();
        assert_eq!(outcome, Outcome::Churned);
    }
}
