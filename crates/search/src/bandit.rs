//! Multi-armed bandit anchor search: UCB1 over outward moves of the box.
//!
//! The box starts as the tightest cut-point cell around the instance. Each
//! arm moves one side of one feature outward to the next cut (or to
//! unbounded once the cuts run out), so two features give four arms. A move
//! that drops precision below the threshold is undone and penalized; an arm
//! that keeps failing is blocked. Accepted moves are rewarded with the
//! coverage they add.

use anchors_core::config::BanditConfig;
use anchors_core::{AnchorError, AnchorResult};
use anchors_predicates::BoundingBox;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::cut_points::CutGrid;
use crate::metrics::{AnchorMetrics, SampleSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Lower,
    Upper,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BanditStep {
    pub round: usize,
    pub arm: usize,
    pub feature: String,
    pub side: Side,
    pub accepted: bool,
    pub reward: f64,
    pub precision: Option<f64>,
    pub coverage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArmStats {
    pub feature: String,
    pub side: Side,
    pub pulls: u64,
    pub mean_reward: f64,
    pub blocked: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BanditOutcome {
    pub bounds: BoundingBox,
    pub metrics: AnchorMetrics,
    pub feasible: bool,
    pub steps: Vec<BanditStep>,
    pub arms: Vec<ArmStats>,
}

#[derive(Debug, Clone)]
struct ArmState {
    feature: usize,
    side: Side,
    /// Cuts this side can still move through, closest first.
    cuts: Vec<f64>,
    /// Index into `cuts` of the current position; `None` once unbounded.
    position: Option<usize>,
    pulls: u64,
    total_reward: f64,
    failures: usize,
    blocked: bool,
}

impl ArmState {
    fn new(feature: usize, side: Side, cuts: Vec<f64>) -> Self {
        let position = if cuts.is_empty() { None } else { Some(0) };
        Self {
            feature,
            side,
            cuts,
            position,
            pulls: 0,
            total_reward: 0.0,
            failures: 0,
            blocked: false,
        }
    }

    fn current(&self) -> Option<f64> {
        self.position.map(|i| self.cuts[i])
    }

    /// The next position outward, or `None` when already unbounded.
    fn next_position(&self) -> Option<Option<usize>> {
        let i = self.position?;
        Some((i + 1 < self.cuts.len()).then_some(i + 1))
    }

    fn mean_reward(&self) -> f64 {
        if self.pulls == 0 {
            0.0
        } else {
            self.total_reward / self.pulls as f64
        }
    }
}

pub struct BanditSearch<'a> {
    samples: &'a SampleSet,
    grid: &'a CutGrid,
    config: &'a BanditConfig,
    threshold: f64,
}

impl<'a> BanditSearch<'a> {
    pub fn new(
        samples: &'a SampleSet,
        grid: &'a CutGrid,
        config: &'a BanditConfig,
        threshold: f64,
    ) -> Self {
        Self {
            samples,
            grid,
            config,
            threshold,
        }
    }

    pub fn run(&self, instance: &[f64]) -> AnchorResult<BanditOutcome> {
        let names = self.samples.feature_names().to_vec();
        if instance.len() != names.len() || instance.len() != self.grid.dims() {
            return Err(AnchorError::DimensionMismatch {
                expected: names.len(),
                actual: instance.len(),
            });
        }

        let mut arms: Vec<ArmState> = instance
            .iter()
            .enumerate()
            .flat_map(|(k, &x)| {
                [
                    ArmState::new(k, Side::Lower, self.grid.below(k, x)),
                    ArmState::new(k, Side::Upper, self.grid.above(k, x)),
                ]
            })
            .collect();

        let mut bounds = BoundingBox::unbounded(names.clone());
        for arm in &arms {
            bounds = apply(&bounds, arm.feature, arm.side, arm.current());
        }
        let mut metrics = self.samples.evaluate(&bounds);
        let mut steps = Vec::new();

        if metrics.precision.map_or(false, |p| p < self.threshold) {
            info!(
                precision = ?metrics.precision,
                "Tightest box around the instance is already below threshold"
            );
            return Ok(self.outcome(bounds, metrics, steps, &arms));
        }

        let mut total_pulls: u64 = 0;
        for round in 1..=self.config.rounds {
            let Some(idx) = self.select_arm(&arms, total_pulls) else {
                debug!(round = round, "All arms blocked");
                break;
            };

            let arm = &arms[idx];
            let (accepted, reward, next) = match arm.next_position() {
                None => (false, -self.config.penalty, None),
                Some(position) => {
                    let value = position.map(|i| arm.cuts[i]);
                    let candidate = apply(&bounds, arm.feature, arm.side, value);
                    let candidate_metrics = self.samples.evaluate(&candidate);
                    if candidate_metrics
                        .precision
                        .map_or(false, |p| p < self.threshold)
                    {
                        (false, -self.config.penalty, None)
                    } else {
                        let gain = candidate_metrics.coverage - metrics.coverage;
                        (true, gain.max(0.0), Some((position, candidate, candidate_metrics)))
                    }
                }
            };

            let arm = &mut arms[idx];
            arm.pulls += 1;
            arm.total_reward += reward;
            total_pulls += 1;

            if let Some((position, candidate, candidate_metrics)) = next {
                arm.position = position;
                arm.failures = 0;
                bounds = candidate;
                metrics = candidate_metrics;
                // Nothing further out once unbounded.
                if position.is_none() {
                    arm.blocked = true;
                }
            } else {
                arm.failures += 1;
                if arm.position.is_none() || arm.failures >= self.config.patience.max(1) {
                    arm.blocked = true;
                }
            }

            debug!(
                round = round,
                arm = idx,
                accepted = accepted,
                reward = reward,
                coverage = metrics.coverage,
                "Bandit move"
            );

            steps.push(BanditStep {
                round,
                arm: idx,
                feature: names[arm.feature].clone(),
                side: arm.side,
                accepted,
                reward,
                precision: metrics.precision,
                coverage: metrics.coverage,
            });
        }

        Ok(self.outcome(bounds, metrics, steps, &arms))
    }

    /// UCB1: untried arms first, then mean reward plus exploration bonus.
    fn select_arm(&self, arms: &[ArmState], total_pulls: u64) -> Option<usize> {
        let active = arms.iter().enumerate().filter(|(_, a)| !a.blocked);

        if let Some((idx, _)) = arms
            .iter()
            .enumerate()
            .find(|(_, a)| !a.blocked && a.pulls == 0)
        {
            return Some(idx);
        }

        let log_total = (total_pulls.max(1) as f64).ln();
        let mut best_score = f64::NEG_INFINITY;
        let mut best_arm = None;
        for (idx, arm) in active {
            let exploration = (self.config.exploration * log_total / arm.pulls as f64).sqrt();
            let score = arm.mean_reward() + exploration;
            if score > best_score {
                best_score = score;
                best_arm = Some(idx);
            }
        }
        best_arm
    }

    fn outcome(
        &self,
        bounds: BoundingBox,
        metrics: AnchorMetrics,
        steps: Vec<BanditStep>,
        arms: &[ArmState],
    ) -> BanditOutcome {
        let names = self.samples.feature_names();
        BanditOutcome {
            feasible: metrics.meets(self.threshold),
            bounds,
            metrics,
            steps,
            arms: arms
                .iter()
                .map(|a| ArmStats {
                    feature: names[a.feature].clone(),
                    side: a.side,
                    pulls: a.pulls,
                    mean_reward: a.mean_reward(),
                    blocked: a.blocked,
                })
                .collect(),
        }
    }
}

fn apply(bounds: &BoundingBox, feature: usize, side: Side, value: Option<f64>) -> BoundingBox {
    match side {
        Side::Lower => bounds.with_lower(feature, value),
        Side::Upper => bounds.with_upper(feature, value),
    }
}
