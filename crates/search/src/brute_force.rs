//! Brute-force anchor search: evaluate every cut-point box that contains
//! the instance and keep the feasible one with the greatest coverage.
//!
//! Per feature the lower side ranges over {unbounded} ∪ cuts below the
//! instance and the upper side over cuts at or above it ∪ {unbounded}; the
//! grid is the cartesian product. Rows of the grid (choices for the first
//! feature) are independent and are split across scoped worker threads
//! that share the memoized [`SampleSet`].

use anchors_core::config::BruteForceConfig;
use anchors_core::{AnchorError, AnchorResult};
use anchors_predicates::{BoundingBox, Interval};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::cut_points::CutGrid;
use crate::metrics::{compare_candidates, AnchorMetrics, SampleSet};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub bounds: BoundingBox,
    pub metrics: AnchorMetrics,
}

/// One evaluated grid cell, kept for plotting precision/coverage surfaces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridCell {
    pub index: usize,
    pub intervals: Vec<Interval>,
    pub precision: Option<f64>,
    pub coverage: f64,
    pub feasible: bool,
}

impl GridCell {
    fn bounded_sides(&self) -> usize {
        self.intervals.iter().map(Interval::bounded_sides).sum()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BruteForceOutcome {
    pub best: Option<Candidate>,
    pub grid: Vec<GridCell>,
}

pub struct BruteForceSearch<'a> {
    samples: &'a SampleSet,
    grid: &'a CutGrid,
    config: &'a BruteForceConfig,
    threshold: f64,
}

impl<'a> BruteForceSearch<'a> {
    pub fn new(
        samples: &'a SampleSet,
        grid: &'a CutGrid,
        config: &'a BruteForceConfig,
        threshold: f64,
    ) -> Self {
        Self {
            samples,
            grid,
            config,
            threshold,
        }
    }

    /// Interval choices per feature for boxes containing `instance`.
    pub fn choices(&self, instance: &[f64]) -> Vec<Vec<Interval>> {
        instance
            .iter()
            .enumerate()
            .map(|(k, &x)| {
                let lowers = std::iter::once(None).chain(self.grid.below(k, x).into_iter().map(Some));
                let uppers: Vec<Option<f64>> = self
                    .grid
                    .above(k, x)
                    .into_iter()
                    .map(Some)
                    .chain(std::iter::once(None))
                    .collect();
                lowers
                    .flat_map(|lo| uppers.iter().map(move |&hi| Interval::new(lo, hi)))
                    .collect()
            })
            .collect()
    }

    pub fn grid_size(choices: &[Vec<Interval>]) -> Option<usize> {
        choices
            .iter()
            .try_fold(1usize, |acc, c| acc.checked_mul(c.len()))
    }

    pub fn run(&self, instance: &[f64]) -> AnchorResult<BruteForceOutcome> {
        let names = self.samples.feature_names();
        if instance.len() != names.len() || instance.len() != self.grid.dims() {
            return Err(AnchorError::DimensionMismatch {
                expected: names.len(),
                actual: instance.len(),
            });
        }

        let choices = self.choices(instance);
        let size = Self::grid_size(&choices)
            .filter(|&n| n <= self.config.max_candidates)
            .ok_or_else(|| {
                AnchorError::InvalidConfig(format!(
                    "brute-force grid exceeds max_candidates ({}); lower max_cuts_per_feature",
                    self.config.max_candidates
                ))
            })?;

        let mut grid = if choices.is_empty() {
            vec![self.evaluate_cell(0, Vec::new())]
        } else {
            self.evaluate_parallel(&choices)?
        };
        grid.sort_by_key(|cell| cell.index);

        info!(
            cells = size,
            workers = self.config.workers,
            feasible = grid.iter().filter(|c| c.feasible).count(),
            "Brute-force grid evaluated"
        );

        let best = grid
            .iter()
            .filter(|cell| cell.feasible)
            .max_by(|a, b| {
                compare_candidates(
                    (&self.metrics_of(a), a.bounded_sides()),
                    (&self.metrics_of(b), b.bounded_sides()),
                )
                // Earlier cells win exact ties.
                .then_with(|| b.index.cmp(&a.index))
            })
            .map(|cell| -> AnchorResult<Candidate> {
                let bounds = BoundingBox::from_intervals(names.to_vec(), cell.intervals.clone())?;
                let metrics = self.samples.evaluate(&bounds);
                Ok(Candidate { bounds, metrics })
            })
            .transpose()?;

        Ok(BruteForceOutcome { best, grid })
    }

    fn evaluate_parallel(&self, choices: &[Vec<Interval>]) -> AnchorResult<Vec<GridCell>> {
        let rows = choices[0].len();
        let workers = self.config.workers.clamp(1, rows.max(1));

        std::thread::scope(|scope| {
            let handles: Vec<_> = (0..workers)
                .map(|worker| {
                    scope.spawn(move || {
                        let mut cells = Vec::new();
                        for row in (worker..rows).step_by(workers) {
                            self.evaluate_row(row, choices, &mut cells);
                        }
                        debug!(worker = worker, cells = cells.len(), "Brute-force worker finished");
                        cells
                    })
                })
                .collect();

            let mut grid = Vec::new();
            for handle in handles {
                let cells = handle
                    .join()
                    .map_err(|_| AnchorError::Search("brute-force worker panicked".to_string()))?;
                grid.extend(cells);
            }
            Ok::<_, AnchorError>(grid)
        })
    }

    /// Every cell whose first-feature interval is `choices[0][row]`.
    fn evaluate_row(&self, row: usize, choices: &[Vec<Interval>], out: &mut Vec<GridCell>) {
        let rest = &choices[1..];
        let row_len: usize = rest.iter().map(Vec::len).product();
        let mut digits = vec![0usize; rest.len()];

        for offset in 0..row_len {
            let mut intervals = Vec::with_capacity(choices.len());
            intervals.push(choices[0][row]);
            intervals.extend(rest.iter().zip(&digits).map(|(c, &d)| c[d]));
            out.push(self.evaluate_cell(row * row_len + offset, intervals));

            // Mixed-radix increment, last feature fastest.
            for pos in (0..digits.len()).rev() {
                digits[pos] += 1;
                if digits[pos] < rest[pos].len() {
                    break;
                }
                digits[pos] = 0;
            }
        }
    }

    fn evaluate_cell(&self, index: usize, intervals: Vec<Interval>) -> GridCell {
        let bounds = BoundingBox::from_intervals(self.samples.feature_names().to_vec(), intervals)
            .unwrap_or_else(|_| BoundingBox::unbounded(self.samples.feature_names().to_vec()));
        let metrics = self.samples.evaluate(&bounds);
        GridCell {
            index,
            intervals: bounds.intervals().to_vec(),
            precision: metrics.precision,
            coverage: metrics.coverage,
            feasible: metrics.meets(self.threshold),
        }
    }

    fn metrics_of(&self, cell: &GridCell) -> AnchorMetrics {
        AnchorMetrics {
            precision: cell.precision,
            coverage: cell.coverage,
            inside: 0,
            total: self.samples.len(),
        }
    }
}
