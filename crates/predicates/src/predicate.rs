//! Predicate types and evaluation logic for anchor conditions.

use anchors_core::{AnchorError, AnchorResult};
use ndarray::ArrayView1;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComparisonOperator {
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
    Equals,
    NotEquals,
}

impl ComparisonOperator {
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::LessThan => "<",
            Self::LessThanOrEqual => "<=",
            Self::GreaterThan => ">",
            Self::GreaterThanOrEqual => ">=",
            Self::Equals => "==",
            Self::NotEquals => "!=",
        }
    }

    /// NaN on either side never compares true, including for `NotEquals`.
    pub fn compare(&self, actual: f64, expected: f64) -> bool {
        if actual.is_nan() || expected.is_nan() {
            return false;
        }
        match self {
            Self::LessThan => actual < expected,
            Self::LessThanOrEqual => actual <= expected,
            Self::GreaterThan => actual > expected,
            Self::GreaterThanOrEqual => actual >= expected,
            Self::Equals => actual == expected,
            Self::NotEquals => actual != expected,
        }
    }
}

/// One boundary condition on a single feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Predicate {
    pub feature: String,
    pub operator: ComparisonOperator,
    pub value: f64,
}

impl Predicate {
    pub fn new(feature: impl Into<String>, operator: ComparisonOperator, value: f64) -> Self {
        Self {
            feature: feature.into(),
            operator,
            value,
        }
    }

    /// Resolve the feature name against a column layout.
    pub fn bind<S: AsRef<str>>(&self, feature_names: &[S]) -> AnchorResult<BoundPredicate> {
        let index = feature_names
            .iter()
            .position(|n| n.as_ref() == self.feature)
            .ok_or_else(|| AnchorError::MissingFeatures(vec![self.feature.clone()]))?;
        Ok(BoundPredicate {
            index,
            operator: self.operator,
            value: self.value,
        })
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.feature, self.operator.symbol(), self.value)
    }
}

/// A predicate whose feature has been resolved to a column index.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundPredicate {
    pub index: usize,
    pub operator: ComparisonOperator,
    pub value: f64,
}

impl BoundPredicate {
    pub fn matches(&self, row: ArrayView1<'_, f64>) -> bool {
        row.get(self.index)
            .map_or(false, |&actual| self.operator.compare(actual, self.value))
    }
}
