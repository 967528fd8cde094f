//! Default-risk banding
//!
//! The probability of default of a customer comes from an external classification model, seen
//! through the [`DefaultRiskModel`] trait. This module only validates its output and buckets
//! it into [`RiskBand`]s.
use crate::error::RiskError;
use ndarray::{Array1, ArrayView2};
use segmenta::CustomerTable;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A fitted classifier returning the probability of default of every row of a feature matrix
///
/// The matrix holds the raw features of the customers, with the columns ordered as
/// [`Feature::ALL`](segmenta::Feature::ALL).
pub trait DefaultRiskModel {
    fn default_probabilities(&self, features: ArrayView2<f64>) -> Array1<f64>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RiskBand {
    Low,
    Medium,
    High,
}

impl fmt::Display for RiskBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RiskBand::Low => "Low",
            RiskBand::Medium => "Medium",
            RiskBand::High => "High",
        };
        f.write_str(name)
    }
}

/// Probability cut-offs: `p < medium` is low risk, `medium <= p < high` is medium risk and
/// `p >= high` is high risk. Defaults to `0.35` and `0.50`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RiskThresholds {
    medium: f64,
    high: f64,
}

impl Default for RiskThresholds {
    fn default() -> Self {
        RiskThresholds {
            medium: 0.35,
            high: 0.50,
        }
    }
}

impl RiskThresholds {
    pub fn new(medium: f64, high: f64) -> Result<Self, RiskError> {
        // written so that NaN fails the check
        if !(0. ..=1.).contains(&medium) || !(0. ..=1.).contains(&high) || medium > high {
            return Err(RiskError::InvalidThresholds { medium, high });
        }
        Ok(RiskThresholds { medium, high })
    }

    pub fn medium(&self) -> f64 {
        self.medium
    }

    pub fn high(&self) -> f64 {
        self.high
    }

    pub fn band(&self, probability: f64) -> RiskBand {
        if probability >= self.high {
            RiskBand::High
        } else if probability >= self.medium {
            RiskBand::Medium
        } else {
            RiskBand::Low
        }
    }

    /// Scores every customer of `table` with `model` and bands the probabilities
    pub fn assess(
        &self,
        model: &dyn DefaultRiskModel,
        table: &CustomerTable,
    ) -> Result<RiskAssessment, RiskError> {
        let probabilities = model.default_probabilities(table.features());
        if probabilities.len() != table.nrows() {
            return Err(RiskError::ProbabilityCountMismatch {
                expected: table.nrows(),
                found: probabilities.len(),
            });
        }
        if let Some((row, &value)) = probabilities
            .iter()
            .enumerate()
            .find(|(_, p)| !(0. ..=1.).contains(*p))
        {
            return Err(RiskError::InvalidProbability { row, value });
        }
        let bands = probabilities.iter().map(|&p| self.band(p)).collect();
        Ok(RiskAssessment {
            probabilities,
            bands,
        })
    }
}

/// Default probability and risk band of every customer, in table order
#[derive(Clone, Debug, PartialEq)]
pub struct RiskAssessment {
    probabilities: Array1<f64>,
    bands: Vec<RiskBand>,
}

impl RiskAssessment {
    pub fn probabilities(&self) -> &Array1<f64> {
        &self.probabilities
    }

    pub fn bands(&self) -> &[RiskBand] {
        &self.bands
    }
}
