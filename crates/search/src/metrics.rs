//! Precision and coverage of anchors against a labelled perturbation sample.
//!
//! A [`SampleSet`] is built once per explanation: the black-box model labels
//! every perturbation sample up front, after which evaluating a candidate
//! box is a pure count. Box evaluations are memoized so the concurrent
//! brute-force workers and repeated bandit moves never recount.

use anchors_core::{AnchorError, AnchorResult, Dataset};
use anchors_model::Classifier;
use anchors_predicates::{Anchor, BoundingBox};
use dashmap::DashMap;
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnchorMetrics {
    /// `None` when no sample falls inside the anchor.
    pub precision: Option<f64>,
    pub coverage: f64,
    pub inside: usize,
    pub total: usize,
}

impl AnchorMetrics {
    pub fn meets(&self, threshold: f64) -> bool {
        self.precision.map_or(false, |p| p >= threshold)
    }
}

/// Ranking used by every strategy: greater coverage first, then greater
/// precision, then fewer bounded sides. Each side is `(metrics, bounded_sides)`.
pub fn compare_candidates(a: (&AnchorMetrics, usize), b: (&AnchorMetrics, usize)) -> Ordering {
    a.0.coverage
        .total_cmp(&b.0.coverage)
        .then_with(|| {
            a.0.precision
                .unwrap_or(-1.0)
                .total_cmp(&b.0.precision.unwrap_or(-1.0))
        })
        .then_with(|| b.1.cmp(&a.1))
}

pub fn precision_of(mask: &[bool], labels: &[usize], target: usize) -> Option<f64> {
    let (inside, hits) = mask
        .iter()
        .zip(labels)
        .filter(|(m, _)| **m)
        .fold((0usize, 0usize), |(n, h), (_, &l)| (n + 1, h + (l == target) as usize));
    (inside > 0).then(|| hits as f64 / inside as f64)
}

pub fn coverage_of(mask: &[bool]) -> f64 {
    if mask.is_empty() {
        return 0.0;
    }
    mask.iter().filter(|&&m| m).count() as f64 / mask.len() as f64
}

pub struct SampleSet {
    samples: Dataset,
    labels: Vec<usize>,
    target: usize,
    cache: DashMap<Vec<u64>, AnchorMetrics>,
}

impl SampleSet {
    pub fn new(samples: Dataset, labels: Vec<usize>, target: usize) -> AnchorResult<Self> {
        if labels.len() != samples.n_rows() {
            return Err(AnchorError::DimensionMismatch {
                expected: samples.n_rows(),
                actual: labels.len(),
            });
        }
        Ok(Self {
            samples,
            labels,
            target,
            cache: DashMap::new(),
        })
    }

    /// Label `samples` with `model`, recording `target` as the class to explain.
    pub fn label<C: Classifier + ?Sized>(
        feature_names: Vec<String>,
        samples: Array2<f64>,
        model: &C,
        target: usize,
    ) -> AnchorResult<Self> {
        if model.n_features() != samples.ncols() {
            return Err(AnchorError::DimensionMismatch {
                expected: model.n_features(),
                actual: samples.ncols(),
            });
        }
        let labels = model.predict_batch(&samples);
        let samples = Dataset::new(feature_names, samples)?;
        let set = Self::new(samples, labels, target)?;
        debug!(
            samples = set.len(),
            target = target,
            target_rate = set.target_rate(),
            "Labelled perturbation samples"
        );
        Ok(set)
    }

    pub fn samples(&self) -> &Dataset {
        &self.samples
    }

    pub fn feature_names(&self) -> &[String] {
        self.samples.feature_names()
    }

    pub fn labels(&self) -> &[usize] {
        &self.labels
    }

    pub fn target(&self) -> usize {
        self.target
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Share of all samples the model assigns to the target class.
    pub fn target_rate(&self) -> f64 {
        precision_of(&vec![true; self.labels.len()], &self.labels, self.target).unwrap_or(0.0)
    }

    pub fn precision(&self, anchor: &Anchor) -> AnchorResult<Option<f64>> {
        let mask = anchor.mask(&self.samples)?;
        Ok(precision_of(&mask, &self.labels, self.target))
    }

    pub fn coverage(&self, anchor: &Anchor) -> AnchorResult<f64> {
        let mask = anchor.mask(&self.samples)?;
        Ok(coverage_of(&mask))
    }

    /// Metrics of a box, memoized by its bit pattern.
    pub fn evaluate(&self, bounds: &BoundingBox) -> AnchorMetrics {
        let key = bounds.key();
        if let Some(hit) = self.cache.get(&key) {
            return *hit;
        }

        let mut inside = 0usize;
        let mut hits = 0usize;
        for (row, &label) in self.samples.values().rows().into_iter().zip(&self.labels) {
            if bounds.contains(row) {
                inside += 1;
                hits += (label == self.target) as usize;
            }
        }

        let total = self.labels.len();
        let metrics = AnchorMetrics {
            precision: (inside > 0).then(|| hits as f64 / inside as f64),
            coverage: if total > 0 {
                inside as f64 / total as f64
            } else {
                0.0
            },
            inside,
            total,
        };
        self.cache.insert(key, metrics);
        metrics
    }

    /// Number of distinct boxes evaluated so far.
    pub fn evaluations(&self) -> usize {
        self.cache.len()
    }
}
