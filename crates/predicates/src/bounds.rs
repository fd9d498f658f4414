//! Axis-aligned bounding boxes: the search space of every anchor strategy.
//!
//! A box is one half-open interval `(lower, upper]` per feature; a missing
//! bound is unbounded on that side. [`BoundingBox::to_anchor`] turns the
//! finite sides into predicates.

use anchors_core::{AnchorError, AnchorResult};
use ndarray::ArrayView1;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::anchor::Anchor;
use crate::predicate::{ComparisonOperator, Predicate};

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Interval {
    pub lower: Option<f64>,
    pub upper: Option<f64>,
}

impl Interval {
    pub fn unbounded() -> Self {
        Self::default()
    }

    pub fn new(lower: Option<f64>, upper: Option<f64>) -> Self {
        Self { lower, upper }
    }

    pub fn contains(&self, value: f64) -> bool {
        if value.is_nan() {
            return self.lower.is_none() && self.upper.is_none();
        }
        self.lower.map_or(true, |lo| value > lo) && self.upper.map_or(true, |hi| value <= hi)
    }

    pub fn bounded_sides(&self) -> usize {
        self.lower.is_some() as usize + self.upper.is_some() as usize
    }

    /// Fraction of `[min, max]` this interval overlaps.
    pub fn fraction_of(&self, (min, max): (f64, f64)) -> f64 {
        let width = max - min;
        if !(width > 0.0) {
            return if self.contains(min) { 1.0 } else { 0.0 };
        }
        let lo = self.lower.map_or(min, |lo| lo.max(min));
        let hi = self.upper.map_or(max, |hi| hi.min(max));
        ((hi - lo) / width).clamp(0.0, 1.0)
    }

    /// Stable hash key; distinguishes unbounded from any finite value.
    pub fn key(&self) -> [u64; 2] {
        let bits = |v: Option<f64>, none: u64| v.map_or(none, f64::to_bits);
        [
            bits(self.lower, f64::NEG_INFINITY.to_bits()),
            bits(self.upper, f64::INFINITY.to_bits()),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    features: Vec<String>,
    intervals: Vec<Interval>,
}

impl BoundingBox {
    /// The box covering the whole feature space (the empty anchor).
    pub fn unbounded(features: Vec<String>) -> Self {
        let intervals = vec![Interval::unbounded(); features.len()];
        Self {
            features,
            intervals,
        }
    }

    pub fn from_intervals(features: Vec<String>, intervals: Vec<Interval>) -> AnchorResult<Self> {
        if features.len() != intervals.len() {
            return Err(AnchorError::DimensionMismatch {
                expected: features.len(),
                actual: intervals.len(),
            });
        }
        Ok(Self {
            features,
            intervals,
        })
    }

    pub fn features(&self) -> &[String] {
        &self.features
    }

    pub fn intervals(&self) -> &[Interval] {
        &self.intervals
    }

    pub fn interval(&self, k: usize) -> Option<&Interval> {
        self.intervals.get(k)
    }

    pub fn dims(&self) -> usize {
        self.intervals.len()
    }

    pub fn with_lower(&self, k: usize, lower: Option<f64>) -> Self {
        let mut next = self.clone();
        if let Some(iv) = next.intervals.get_mut(k) {
            iv.lower = lower;
        }
        next
    }

    pub fn with_upper(&self, k: usize, upper: Option<f64>) -> Self {
        let mut next = self.clone();
        if let Some(iv) = next.intervals.get_mut(k) {
            iv.upper = upper;
        }
        next
    }

    pub fn contains(&self, row: ArrayView1<'_, f64>) -> bool {
        row.len() == self.intervals.len()
            && self
                .intervals
                .iter()
                .zip(row.iter())
                .all(|(iv, &v)| iv.contains(v))
    }

    pub fn bounded_sides(&self) -> usize {
        self.intervals.iter().map(Interval::bounded_sides).sum()
    }

    /// Fraction of the bounded domain `ranges` covered by the box.
    pub fn volume_fraction(&self, ranges: &[(f64, f64)]) -> f64 {
        self.intervals
            .iter()
            .zip(ranges.iter())
            .map(|(iv, &range)| iv.fraction_of(range))
            .product()
    }

    pub fn key(&self) -> Vec<u64> {
        self.intervals.iter().flat_map(|iv| iv.key()).collect()
    }

    /// One `>` predicate per finite lower side and one `<=` per finite
    /// upper side, in feature order.
    pub fn to_anchor(&self) -> Anchor {
        let mut anchor = Anchor::empty();
        for (name, iv) in self.features.iter().zip(&self.intervals) {
            if let Some(lo) = iv.lower {
                anchor = anchor.extend(Predicate::new(
                    name.clone(),
                    ComparisonOperator::GreaterThan,
                    lo,
                ));
            }
            if let Some(hi) = iv.upper {
                anchor = anchor.extend(Predicate::new(
                    name.clone(),
                    ComparisonOperator::LessThanOrEqual,
                    hi,
                ));
            }
        }
        anchor
    }
}

impl fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_anchor())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anchors_core::Dataset;
    use ndarray::array;

    fn names() -> Vec<String> {
        vec!["x1".to_string(), "x2".to_string()]
    }

    #[test]
    fn test_interval_half_open() {
        let iv = Interval::new(Some(1.0), Some(2.0));
        assert!(!iv.contains(1.0));
        assert!(iv.contains(1.5));
        assert!(iv.contains(2.0));
        assert!(!iv.contains(2.5));
        assert!(Interval::unbounded().contains(f64::NAN));
        assert!(!iv.contains(f64::NAN));
    }

    #[test]
    fn test_unbounded_box_is_empty_anchor() {
        let b = BoundingBox::unbounded(names());
        assert!(b.to_anchor().is_empty());
        assert_eq!(b.bounded_sides(), 0);
        assert!(b.contains(array![100.0, -100.0].view()));
        assert!((b.volume_fraction(&[(0.0, 1.0), (0.0, 1.0)]) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_box_agrees_with_anchor() {
        let b = BoundingBox::unbounded(names())
            .with_lower(0, Some(1.0))
            .with_upper(1, Some(3.0));
        let anchor = b.to_anchor();
        assert_eq!(anchor.to_string(), "x1 > 1 AND x2 <= 3");

        let ds = Dataset::new(
            names(),
            array![[0.5, 1.0], [1.5, 2.0], [2.0, 4.0], [3.0, 3.0]],
        )
        .unwrap();
        let mask = anchor.mask(&ds).unwrap();
        let direct: Vec<bool> = ds.values().rows().into_iter().map(|r| b.contains(r)).collect();
        assert_eq!(mask, direct);
        assert_eq!(mask, vec![false, true, false, true]);
    }

    #[test]
    fn test_volume_fraction() {
        let b = BoundingBox::unbounded(names())
            .with_lower(0, Some(0.5))
            .with_upper(1, Some(0.25));
        let v = b.volume_fraction(&[(0.0, 1.0), (0.0, 1.0)]);
        assert!((v - 0.125).abs() < 1e-12);
    }

    #[test]
    fn test_key_distinguishes_sides() {
        let a = BoundingBox::unbounded(names()).with_lower(0, Some(1.0));
        let b = BoundingBox::unbounded(names()).with_upper(0, Some(1.0));
        assert_ne!(a.key(), b.key());
        assert_eq!(a.key(), a.clone().key());
    }

    #[test]
    fn test_from_intervals_checks_dims() {
        assert!(BoundingBox::from_intervals(names(), vec![Interval::unbounded()]).is_err());
    }
}
