//! Anchor: an ordered conjunction of predicates.
//!
//! Anchors are value types: [`Anchor::extend`] returns a new anchor and
//! leaves the receiver untouched.

use anchors_core::{AnchorError, AnchorResult, Dataset};
use ndarray::ArrayView1;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::predicate::{BoundPredicate, Predicate};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Anchor {
    predicates: Vec<Predicate>,
}

impl Anchor {
    /// The anchor with no predicates; every row satisfies it.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_predicates(predicates: Vec<Predicate>) -> Self {
        Self { predicates }
    }

    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    pub fn len(&self) -> usize {
        self.predicates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    /// A copy of this anchor with `predicate` appended.
    pub fn extend(&self, predicate: Predicate) -> Anchor {
        let mut predicates = Vec::with_capacity(self.predicates.len() + 1);
        predicates.extend_from_slice(&self.predicates);
        predicates.push(predicate);
        Anchor { predicates }
    }

    /// Resolve every predicate against a column layout. All unknown
    /// features are reported together.
    pub fn bind<S: AsRef<str>>(&self, feature_names: &[S]) -> AnchorResult<BoundAnchor> {
        let mut bound = Vec::with_capacity(self.predicates.len());
        let mut missing = Vec::new();

        for predicate in &self.predicates {
            match predicate.bind(feature_names) {
                Ok(b) => bound.push(b),
                Err(AnchorError::MissingFeatures(names)) => {
                    for name in names {
                        if !missing.contains(&name) {
                            missing.push(name);
                        }
                    }
                }
                Err(other) => return Err(other),
            }
        }

        if !missing.is_empty() {
            return Err(AnchorError::MissingFeatures(missing));
        }
        Ok(BoundAnchor { predicates: bound })
    }

    /// Row-wise satisfaction flags against a dataset.
    pub fn mask(&self, dataset: &Dataset) -> AnchorResult<Vec<bool>> {
        let bound = self.bind(dataset.feature_names())?;
        Ok(dataset
            .values()
            .rows()
            .into_iter()
            .map(|row| bound.matches(row))
            .collect())
    }

    pub fn count(&self, dataset: &Dataset) -> AnchorResult<usize> {
        Ok(self.mask(dataset)?.into_iter().filter(|&m| m).count())
    }

    /// The rows of `dataset` that satisfy every predicate.
    pub fn filter(&self, dataset: &Dataset) -> AnchorResult<Dataset> {
        let mask = self.mask(dataset)?;
        dataset.filter_rows(&mask)
    }
}

impl fmt::Display for Anchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.predicates.is_empty() {
            return write!(f, "TRUE");
        }
        for (i, p) in self.predicates.iter().enumerate() {
            if i > 0 {
                write!(f, " AND ")?;
            }
            write!(f, "{p}")?;
        }
        Ok(())
    }
}

impl From<Vec<Predicate>> for Anchor {
    fn from(predicates: Vec<Predicate>) -> Self {
        Self::from_predicates(predicates)
    }
}

/// An anchor bound to a fixed column layout, cheap to evaluate per row.
#[derive(Debug, Clone, Default)]
pub struct BoundAnchor {
    predicates: Vec<BoundPredicate>,
}

impl BoundAnchor {
    pub fn matches(&self, row: ArrayView1<'_, f64>) -> bool {
        self.predicates.iter().all(|p| p.matches(row))
    }
}
