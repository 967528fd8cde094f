//! Ordered threshold rules turning a cluster profile into a business segment
use crate::error::DecisionTableError;
use crate::profile::ClusterProfile;
use segmenta::{Feature, Outcome};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

const BUILTIN_RULES: &str = include_str!("../data/default_rules.json");

/// Profile value a condition is evaluated on
///
/// Written `feature:<column>` or `outcome:<column>` in a decision table, e.g.
/// `feature:credit_score` or `outcome:defaulted`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Metric {
    /// Mean of a feature over the cluster
    Feature(Feature),
    /// Rate of an outcome over the cluster
    Outcome(Outcome),
}

impl Metric {
    pub fn value(self, profile: &ClusterProfile) -> Option<f64> {
        match self {
            Metric::Feature(feature) => profile.mean(feature),
            Metric::Outcome(outcome) => profile.rate(outcome),
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Metric::Feature(feature) => write!(f, "feature:{}", feature),
            Metric::Outcome(outcome) => write!(f, "outcome:{}", outcome),
        }
    }
}

impl FromStr for Metric {
    type Err = DecisionTableError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let metric = match s.split_once(':') {
            Some(("feature", column)) => Feature::from_column_name(column).map(Metric::Feature),
            Some(("outcome", column)) => Outcome::from_column_name(column).map(Metric::Outcome),
            _ => None,
        };
        metric.ok_or_else(|| DecisionTableError::UnknownMetric(s.to_string()))
    }
}

impl TryFrom<String> for Metric {
    type Error = DecisionTableError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Metric> for String {
    fn from(metric: Metric) -> Self {
        metric.to_string()
    }
}

/// How a profile value is compared with a threshold
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Comparison {
    /// `value >= threshold`
    AtLeast,
    /// `value <= threshold`
    AtMost,
    /// `value > threshold`
    Above,
    /// `value < threshold`
    Below,
}

impl Comparison {
    pub fn holds(self, value: f64, threshold: f64) -> bool {
        match self {
            Comparison::AtLeast => value >= threshold,
            Comparison::AtMost => value <= threshold,
            Comparison::Above => value > threshold,
            Comparison::Below => value < threshold,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub metric: Metric,
    pub op: Comparison,
    pub threshold: f64,
}

impl Condition {
    /// A metric missing from the profile, or NaN, never satisfies a condition
    pub fn holds(&self, profile: &ClusterProfile) -> bool {
        match self.metric.value(profile) {
            Some(value) if !value.is_nan() => self.op.holds(value, self.threshold),
            _ => false,
        }
    }
}

/// Assigns `segment` to a profile satisfying every condition of `when`
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    pub segment: String,
    #[serde(default)]
    pub when: Vec<Condition>,
}

impl Rule {
    pub fn matches(&self, profile: &ClusterProfile) -> bool {
        self.when.iter().all(|condition| condition.holds(profile))
    }
}

/// Business segment and its recommended actions, in priority order
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    pub name: String,
    pub actions: Vec<String>,
}

#[derive(Deserialize)]
struct RawDecisionTable {
    version: String,
    segments: Vec<Segment>,
    rules: Vec<Rule>,
}

impl TryFrom<RawDecisionTable> for DecisionTable {
    type Error = DecisionTableError;

    fn try_from(raw: RawDecisionTable) -> Result<Self, Self::Error> {
        DecisionTable::new(raw.version, raw.segments, raw.rules)
    }
}

/// A versioned, ordered list of rules over a closed set of segments.
///
/// Rules are evaluated in order and the first one whose conditions all hold wins. The last rule
/// has no condition, which makes the table total: every profile gets a segment. The table is
/// validated when it is built or deserialized, so a `DecisionTable` value is always usable.
///
/// The tables are stored as JSON:
///
/// ```json
/// {
///   "version": "2024-01",
///   "segments": [{ "name": "Premier", "actions": ["Offer higher credit limits"] }, ...],
///   "rules": [
///     {
///       "segment": "Premier",
///       "when": [
///         { "metric": "feature:credit_score", "op": "at_least", "threshold": 750 },
///         { "metric": "outcome:defaulted", "op": "at_most", "threshold": 0.05 }
///       ]
///     },
///     ...
///     { "segment": "High-Risk", "when": [] }
///   ]
/// }
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawDecisionTable")]
pub struct DecisionTable {
    version: String,
    segments: Vec<Segment>,
    rules: Vec<Rule>,
    /// Index in `segments` of the segment of every rule
    #[serde(skip)]
    rule_segments: Vec<usize>,
}

impl DecisionTable {
    pub fn new(
        version: impl Into<String>,
        segments: Vec<Segment>,
        rules: Vec<Rule>,
    ) -> Result<Self, DecisionTableError> {
        let mut by_name = HashMap::with_capacity(segments.len());
        for (index, segment) in segments.iter().enumerate() {
            if by_name.insert(segment.name.as_str(), index).is_some() {
                return Err(DecisionTableError::DuplicateSegment(segment.name.clone()));
            }
        }

        let last = rules.last().ok_or(DecisionTableError::NoRules)?;
        if !last.when.is_empty() {
            return Err(DecisionTableError::MissingCatchAll);
        }

        let rule_segments = rules
            .iter()
            .enumerate()
            .map(|(rule, r)| {
                if r.when.iter().any(|c| !c.threshold.is_finite()) {
                    return Err(DecisionTableError::NonFiniteThreshold { rule });
                }
                by_name
                    .get(r.segment.as_str())
                    .copied()
                    .ok_or_else(|| DecisionTableError::UnknownSegment {
                        rule,
                        segment: r.segment.clone(),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(DecisionTable {
            version: version.into(),
            segments,
            rules,
            rule_segments,
        })
    }

    /// The table shipped with the crate: Premier, Gold, Silver and High-Risk tiers on the
    /// average credit score and the default rate of a cluster.
    pub fn builtin() -> Self {
        Self::from_json(BUILTIN_RULES).expect("the embedded decision table is valid")
    }

    pub fn from_json(json: &str) -> Result<Self, DecisionTableError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json_pretty(&self) -> Result<String, DecisionTableError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn segment(&self, name: &str) -> Option<&Segment> {
        self.segments.iter().find(|s| s.name == name)
    }

    /// Index of the first rule matching `profile` and the segment it assigns
    pub fn classify(&self, profile: &ClusterProfile) -> (usize, &Segment) {
        let last = self.rules.len() - 1;
        let rule = self
            .rules
            .iter()
            .position(|rule| rule.matches(profile))
            .unwrap_or(last);
        (rule, &self.segments[self.rule_segments[rule]])
    }
}
