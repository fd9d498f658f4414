//! Sequential greedy anchor search.
//!
//! Starts from the empty anchor and, one predicate at a time, bounds a
//! previously unbounded side of the box. When some candidate already meets
//! the precision threshold the widest such candidate is taken and the search
//! stops; otherwise the most precise candidate is taken and the search
//! continues until `max_predicates` is reached.

use anchors_core::{AnchorError, AnchorResult};
use anchors_predicates::{Anchor, BoundingBox, ComparisonOperator, Predicate};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use tracing::debug;

use crate::cut_points::CutGrid;
use crate::metrics::{compare_candidates, AnchorMetrics, SampleSet};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GreedyStep {
    pub step: usize,
    pub predicate: Predicate,
    pub precision: Option<f64>,
    pub coverage: f64,
    pub candidates: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GreedyOutcome {
    pub anchor: Anchor,
    pub bounds: BoundingBox,
    pub metrics: AnchorMetrics,
    pub feasible: bool,
    pub steps: Vec<GreedyStep>,
}

struct Move {
    bounds: BoundingBox,
    predicate: Predicate,
    metrics: AnchorMetrics,
}

pub struct GreedySearch<'a> {
    samples: &'a SampleSet,
    grid: &'a CutGrid,
    threshold: f64,
    max_predicates: usize,
}

impl<'a> GreedySearch<'a> {
    pub fn new(
        samples: &'a SampleSet,
        grid: &'a CutGrid,
        threshold: f64,
        max_predicates: usize,
    ) -> Self {
        Self {
            samples,
            grid,
            threshold,
            max_predicates,
        }
    }

    pub fn run(&self, instance: &[f64]) -> AnchorResult<GreedyOutcome> {
        let names = self.samples.feature_names().to_vec();
        if instance.len() != names.len() || instance.len() != self.grid.dims() {
            return Err(AnchorError::DimensionMismatch {
                expected: names.len(),
                actual: instance.len(),
            });
        }

        let mut anchor = Anchor::empty();
        let mut bounds = BoundingBox::unbounded(names);
        let mut metrics = self.samples.evaluate(&bounds);
        let mut steps = Vec::new();

        while !metrics.meets(self.threshold) && anchor.len() < self.max_predicates {
            let moves = self.moves(&bounds, instance);
            let considered = moves.len();
            let Some(chosen) = self.pick(moves) else {
                debug!(step = steps.len() + 1, "No candidate with samples inside, stopping");
                break;
            };

            debug!(
                step = steps.len() + 1,
                predicate = %chosen.predicate,
                precision = ?chosen.metrics.precision,
                coverage = chosen.metrics.coverage,
                candidates = considered,
                "Greedy step"
            );

            steps.push(GreedyStep {
                step: steps.len() + 1,
                predicate: chosen.predicate.clone(),
                precision: chosen.metrics.precision,
                coverage: chosen.metrics.coverage,
                candidates: considered,
            });
            anchor = anchor.extend(chosen.predicate);
            bounds = chosen.bounds;
            metrics = chosen.metrics;
        }

        Ok(GreedyOutcome {
            feasible: metrics.meets(self.threshold),
            anchor,
            bounds,
            metrics,
            steps,
        })
    }

    /// Every box that bounds one currently unbounded side at a cut point.
    fn moves(&self, bounds: &BoundingBox, instance: &[f64]) -> Vec<Move> {
        let mut moves = Vec::new();
        for (k, &x) in instance.iter().enumerate() {
            let name = &self.samples.feature_names()[k];
            let Some(interval) = bounds.interval(k) else {
                continue;
            };

            if interval.lower.is_none() {
                for lo in self.grid.below(k, x) {
                    let next = bounds.with_lower(k, Some(lo));
                    moves.push(Move {
                        metrics: self.samples.evaluate(&next),
                        bounds: next,
                        predicate: Predicate::new(name.clone(), ComparisonOperator::GreaterThan, lo),
                    });
                }
            }
            if interval.upper.is_none() {
                for hi in self.grid.above(k, x) {
                    let next = bounds.with_upper(k, Some(hi));
                    moves.push(Move {
                        metrics: self.samples.evaluate(&next),
                        bounds: next,
                        predicate: Predicate::new(
                            name.clone(),
                            ComparisonOperator::LessThanOrEqual,
                            hi,
                        ),
                    });
                }
            }
        }
        moves
    }

    /// Widest feasible move if any, otherwise the most precise; earlier
    /// moves win ties. Moves with no samples inside are never picked.
    fn pick(&self, moves: Vec<Move>) -> Option<Move> {
        let any_feasible = moves.iter().any(|m| m.metrics.meets(self.threshold));
        let rank = |a: &Move, b: &Move| -> Ordering {
            if any_feasible {
                compare_candidates(
                    (&a.metrics, a.bounds.bounded_sides()),
                    (&b.metrics, b.bounds.bounded_sides()),
                )
            } else {
                a.metrics
                    .precision
                    .unwrap_or(-1.0)
                    .total_cmp(&b.metrics.precision.unwrap_or(-1.0))
                    .then_with(|| a.metrics.coverage.total_cmp(&b.metrics.coverage))
            }
        };

        moves
            .into_iter()
            .filter(|m| m.metrics.precision.is_some())
            .filter(|m| !any_feasible || m.metrics.meets(self.threshold))
            .fold(None, |best: Option<Move>, m| match best {
                Some(b) if rank(&m, &b) != Ordering::Greater => Some(b),
                _ => Some(m),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anchors_model::FnClassifier;
    use ndarray::Array2;

    fn lattice<F>(label: F) -> SampleSet
    where
        F: Fn(ndarray::ArrayView1<'_, f64>) -> usize + Send + Sync,
    {
        let mut values = Array2::<f64>::zeros((64, 2));
        for i in 0..8 {
            for j in 0..8 {
                values[[i * 8 + j, 0]] = i as f64 / 8.0 + 0.0625;
                values[[i * 8 + j, 1]] = j as f64 / 8.0 + 0.0625;
            }
        }
        let model = FnClassifier::new(2, label);
        SampleSet::label(vec!["x1".to_string(), "x2".to_string()], values, &model, 1).unwrap()
    }

    #[test]
    fn test_single_predicate_when_half_plane() {
        let set = lattice(|row| (row[0] > 0.5) as usize);
        let grid = CutGrid::from_samples(set.samples(), 32);
        let outcome = GreedySearch::new(&set, &grid, 0.95, 4)
            .run(&[0.8125, 0.3125])
            .unwrap();

        assert!(outcome.feasible);
        assert_eq!(outcome.anchor.to_string(), "x1 > 0.5");
        assert_eq!(outcome.steps.len(), 1);
        assert!((outcome.metrics.coverage - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_quadrant_needs_two_predicates() {
        let set = lattice(|row| (row[0] > 0.5 && row[1] < 0.5) as usize);
        let grid = CutGrid::from_samples(set.samples(), 32);
        let outcome = GreedySearch::new(&set, &grid, 0.95, 4)
            .run(&[0.8125, 0.3125])
            .unwrap();

        assert!(outcome.feasible);
        assert_eq!(outcome.anchor.to_string(), "x1 > 0.5 AND x2 <= 0.5");
        assert_eq!(outcome.metrics.precision, Some(1.0));
        assert!((outcome.metrics.coverage - 0.25).abs() < 1e-12);

        // Each step extends the anchor by exactly one predicate.
        for (i, step) in outcome.steps.iter().enumerate() {
            assert_eq!(step.step, i + 1);
            assert_eq!(&outcome.anchor.predicates()[i], &step.predicate);
        }
        assert_eq!(outcome.anchor, outcome.bounds.to_anchor());
    }

    #[test]
    fn test_predicate_budget_stops_early() {
        let set = lattice(|row| (row[0] > 0.5 && row[1] < 0.5) as usize);
        let grid = CutGrid::from_samples(set.samples(), 32);
        let outcome = GreedySearch::new(&set, &grid, 0.95, 1)
            .run(&[0.8125, 0.3125])
            .unwrap();

        assert!(!outcome.feasible);
        assert_eq!(outcome.anchor.len(), 1);
        assert_eq!(outcome.metrics.precision, Some(0.5));
    }

    #[test]
    fn test_already_feasible_returns_empty_anchor() {
        let set = lattice(|_row| 1);
        let grid = CutGrid::from_samples(set.samples(), 32);
        let outcome = GreedySearch::new(&set, &grid, 0.95, 4)
            .run(&[0.5, 0.5])
            .unwrap();
        assert!(outcome.feasible);
        assert!(outcome.anchor.is_empty());
        assert!((outcome.metrics.coverage - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_dimension_mismatch() {
        let set = lattice(|row| (row[0] > 0.5) as usize);
        let grid = CutGrid::from_samples(set.samples(), 32);
        assert!(GreedySearch::new(&set, &grid, 0.95, 4)
            .run(&[0.1, 0.2, 0.3])
            .is_err());
    }
}
