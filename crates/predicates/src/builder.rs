//! Anchor builder: fluent API for constructing anchors by hand.

use crate::anchor::Anchor;
use crate::predicate::{ComparisonOperator, Predicate};

#[derive(Debug, Default)]
pub struct AnchorBuilder {
    predicates: Vec<Predicate>,
}

impl AnchorBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn predicate(mut self, predicate: Predicate) -> Self {
        self.predicates.push(predicate);
        self
    }

    pub fn less_than(self, feature: impl Into<String>, value: f64) -> Self {
        self.predicate(Predicate::new(feature, ComparisonOperator::LessThan, value))
    }

    pub fn at_most(self, feature: impl Into<String>, value: f64) -> Self {
        self.predicate(Predicate::new(
            feature,
            ComparisonOperator::LessThanOrEqual,
            value,
        ))
    }

    pub fn greater_than(self, feature: impl Into<String>, value: f64) -> Self {
        self.predicate(Predicate::new(feature, ComparisonOperator::GreaterThan, value))
    }

    pub fn at_least(self, feature: impl Into<String>, value: f64) -> Self {
        self.predicate(Predicate::new(
            feature,
            ComparisonOperator::GreaterThanOrEqual,
            value,
        ))
    }

    pub fn equals(self, feature: impl Into<String>, value: f64) -> Self {
        self.predicate(Predicate::new(feature, ComparisonOperator::Equals, value))
    }

    pub fn not_equals(self, feature: impl Into<String>, value: f64) -> Self {
        self.predicate(Predicate::new(feature, ComparisonOperator::NotEquals, value))
    }

    pub fn build(self) -> Anchor {
        Anchor::from_predicates(self.predicates)
    }
}
