//! Anchor explainer: draws perturbation samples around an instance, labels
//! them once with the black-box model, and runs the configured search.

use anchors_core::{AnchorError, AnchorResult, AppConfig, Dataset, SearchStrategy};
use anchors_model::Classifier;
use anchors_predicates::{Anchor, BoundingBox};
use chrono::{DateTime, Utc};
use ndarray::ArrayView1;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use tracing::{info, warn};
use uuid::Uuid;

use crate::bandit::{ArmStats, BanditSearch, BanditStep};
use crate::brute_force::{BruteForceSearch, GridCell};
use crate::cut_points::CutGrid;
use crate::greedy::{GreedySearch, GreedyStep};
use crate::metrics::SampleSet;
use crate::perturbation::PerturbationDistribution;

/// Strategy-specific trace, kept for plotting.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StrategyDetail {
    BruteForce { grid: Vec<GridCell> },
    Greedy { steps: Vec<GreedyStep> },
    Bandit { steps: Vec<BanditStep>, arms: Vec<ArmStats> },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Explanation {
    pub id: Uuid,
    pub strategy: SearchStrategy,
    pub anchor: Anchor,
    pub bounds: BoundingBox,
    pub precision: Option<f64>,
    pub coverage: f64,
    pub volume_coverage: f64,
    pub feasible: bool,
    pub threshold: f64,
    pub target_class: usize,
    pub samples: usize,
    pub candidates_evaluated: usize,
    pub generated_at: DateTime<Utc>,
    pub detail: StrategyDetail,
}

impl Explanation {
    pub fn to_json(&self) -> AnchorResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn write_json(&self, path: impl AsRef<Path>) -> AnchorResult<()> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }
}

impl fmt::Display for Explanation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let precision = self
            .precision
            .map_or_else(|| "n/a".to_string(), |p| format!("{p:.3}"));
        write!(
            f,
            "IF {} THEN class {} (precision {}, coverage {:.3})",
            self.anchor, self.target_class, precision, self.coverage
        )
    }
}

pub struct AnchorExplainer {
    config: AppConfig,
}

impl AnchorExplainer {
    pub fn new(config: AppConfig) -> AnchorResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Explain `model`'s prediction for `instance`, sampling neighbours from
    /// the configured perturbation family fitted to `dataset`.
    pub fn explain<C, R>(
        &self,
        model: &C,
        dataset: &Dataset,
        instance: ArrayView1<'_, f64>,
        rng: &mut R,
    ) -> AnchorResult<Explanation>
    where
        C: Classifier + ?Sized,
        R: Rng + ?Sized,
    {
        let distribution = PerturbationDistribution::from_config(
            self.config.perturbation.kind,
            dataset,
            instance,
            self.config.perturbation.scale,
        )?;
        self.explain_with(
            model,
            &distribution,
            dataset.feature_names(),
            &dataset.feature_ranges(),
            instance,
            rng,
        )
    }

    /// Explain with an explicit perturbation distribution. `ranges` bound
    /// the domain for volume coverage.
    pub fn explain_with<C, R>(
        &self,
        model: &C,
        distribution: &PerturbationDistribution,
        feature_names: &[String],
        ranges: &[(f64, f64)],
        instance: ArrayView1<'_, f64>,
        rng: &mut R,
    ) -> AnchorResult<Explanation>
    where
        C: Classifier + ?Sized,
        R: Rng + ?Sized,
    {
        let d = feature_names.len();
        for actual in [instance.len(), model.n_features(), distribution.n_features()] {
            if actual != d {
                return Err(AnchorError::DimensionMismatch { expected: d, actual });
            }
        }
        if instance.iter().any(|v| v.is_nan()) {
            return Err(AnchorError::Search(
                "instance contains NaN values".to_string(),
            ));
        }

        let search = &self.config.search;
        let target = model.predict(instance);
        let raw = distribution.sample(self.config.perturbation.samples, rng)?;
        let samples = SampleSet::label(feature_names.to_vec(), raw, model, target)?;
        let grid = CutGrid::from_samples(samples.samples(), search.max_cuts_per_feature);
        let point = instance.to_vec();

        info!(
            strategy = %search.strategy,
            perturbation = %distribution.kind(),
            samples = samples.len(),
            target = target,
            target_rate = samples.target_rate(),
            cuts = grid.total_cuts(),
            "Searching for anchor"
        );

        let (anchor, bounds, metrics, feasible, detail) = match search.strategy {
            SearchStrategy::BruteForce => {
                let outcome = BruteForceSearch::new(
                    &samples,
                    &grid,
                    &self.config.brute_force,
                    search.precision_threshold,
                )
                .run(&point)?;
                let (bounds, metrics, feasible) = match outcome.best {
                    Some(best) => (best.bounds, best.metrics, true),
                    None => {
                        // Nothing feasible: report the tightest cell around the instance.
                        let tight = tightest_box(feature_names, &grid, &point);
                        let metrics = samples.evaluate(&tight);
                        (tight, metrics, false)
                    }
                };
                (
                    bounds.to_anchor(),
                    bounds,
                    metrics,
                    feasible,
                    StrategyDetail::BruteForce { grid: outcome.grid },
                )
            }
            SearchStrategy::Greedy => {
                let outcome = GreedySearch::new(
                    &samples,
                    &grid,
                    search.precision_threshold,
                    search.max_predicates,
                )
                .run(&point)?;
                (
                    outcome.anchor,
                    outcome.bounds,
                    outcome.metrics,
                    outcome.feasible,
                    StrategyDetail::Greedy {
                        steps: outcome.steps,
                    },
                )
            }
            SearchStrategy::Bandit => {
                let outcome = BanditSearch::new(
                    &samples,
                    &grid,
                    &self.config.bandit,
                    search.precision_threshold,
                )
                .run(&point)?;
                (
                    outcome.bounds.to_anchor(),
                    outcome.bounds,
                    outcome.metrics,
                    outcome.feasible,
                    StrategyDetail::Bandit {
                        steps: outcome.steps,
                        arms: outcome.arms,
                    },
                )
            }
        };

        if feasible {
            info!(
                anchor = %anchor,
                precision = ?metrics.precision,
                coverage = metrics.coverage,
                evaluated = samples.evaluations(),
                "Anchor found"
            );
        } else {
            warn!(
                anchor = %anchor,
                precision = ?metrics.precision,
                threshold = search.precision_threshold,
                "No anchor met the precision threshold"
            );
        }

        Ok(Explanation {
            id: Uuid::new_v4(),
            strategy: search.strategy,
            volume_coverage: bounds.volume_fraction(ranges),
            anchor,
            bounds,
            precision: metrics.precision,
            coverage: metrics.coverage,
            feasible,
            threshold: search.precision_threshold,
            target_class: target,
            samples: samples.len(),
            candidates_evaluated: samples.evaluations(),
            generated_at: Utc::now(),
            detail,
        })
    }
}

/// The cut-point cell immediately around `point`.
fn tightest_box(feature_names: &[String], grid: &CutGrid, point: &[f64]) -> BoundingBox {
    point.iter().enumerate().fold(
        BoundingBox::unbounded(feature_names.to_vec()),
        |b, (k, &x)| {
            b.with_lower(k, grid.below(k, x).first().copied())
                .with_upper(k, grid.above(k, x).first().copied())
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use anchors_model::{FnClassifier, RadialClassifier};
    use ndarray::array;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn unit_square() -> Dataset {
        Dataset::new(
            vec!["x1".to_string(), "x2".to_string()],
            array![[0.0, 0.0], [1.0, 1.0], [0.0, 1.0], [1.0, 0.0]],
        )
        .unwrap()
    }

    fn config(strategy: SearchStrategy) -> AppConfig {
        let mut config = AppConfig::default();
        config.search.strategy = strategy;
        config.search.precision_threshold = 0.95;
        config.perturbation.samples = 2000;
        config.search.max_cuts_per_feature = 16;
        config
    }

    #[test]
    fn test_every_strategy_explains_half_plane() {
        let model = FnClassifier::new(2, |row| (row[0] > 0.5) as usize);
        let ds = unit_square();
        let instance = array![0.8, 0.3];

        for strategy in [
            SearchStrategy::BruteForce,
            SearchStrategy::Greedy,
            SearchStrategy::Bandit,
        ] {
            let explainer = AnchorExplainer::new(config(strategy)).unwrap();
            let mut rng = StdRng::seed_from_u64(17);
            let explanation = explainer
                .explain(&model, &ds, instance.view(), &mut rng)
                .unwrap();

            assert_eq!(explanation.strategy, strategy);
            assert_eq!(explanation.target_class, 1);
            assert!(explanation.feasible, "{strategy} found no anchor");
            assert!(explanation.precision.unwrap() >= 0.95);
            assert!((0.0..=1.0).contains(&explanation.coverage));
            assert!((0.0..=1.0).contains(&explanation.volume_coverage));
            assert!(explanation.bounds.contains(instance.view()));
            assert!(explanation.coverage > 0.25, "{strategy}: {explanation}");
        }
    }

    #[test]
    fn test_radial_boundary_anchor_contains_instance() {
        let model = RadialClassifier::new(vec![0.5, 0.5], 0.3);
        let ds = unit_square();
        let instance = array![0.5, 0.5];
        let explainer = AnchorExplainer::new(config(SearchStrategy::Bandit)).unwrap();
        let explanation = explainer
            .explain(&model, &ds, instance.view(), &mut StdRng::seed_from_u64(5))
            .unwrap();

        assert_eq!(explanation.target_class, 1);
        assert!(explanation.feasible);
        assert!(explanation.bounds.contains(instance.view()));
        // No side can reach the edge of the square while staying inside the disc.
        assert!(explanation.bounds.intervals().iter().all(|iv| iv.bounded_sides() == 2));
        assert_eq!(explanation.anchor.len(), 4);
        match &explanation.detail {
            StrategyDetail::Bandit { arms, .. } => assert_eq!(arms.len(), 4),
            other => panic!("unexpected detail: {other:?}"),
        }
    }

    #[test]
    fn test_seeded_runs_are_reproducible() {
        let model = FnClassifier::new(2, |row| (row[0] + row[1] > 1.0) as usize);
        let ds = unit_square();
        let explainer = AnchorExplainer::new(config(SearchStrategy::Bandit)).unwrap();
        let a = explainer
            .explain(&model, &ds, array![0.9, 0.8].view(), &mut StdRng::seed_from_u64(9))
            .unwrap();
        let b = explainer
            .explain(&model, &ds, array![0.9, 0.8].view(), &mut StdRng::seed_from_u64(9))
            .unwrap();
        assert_eq!(a.anchor, b.anchor);
        assert_eq!(a.precision, b.precision);
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_dimension_and_nan_checks() {
        let model = FnClassifier::new(2, |_row| 0);
        let ds = unit_square();
        let explainer = AnchorExplainer::new(AppConfig::default()).unwrap();
        let mut rng = StdRng::seed_from_u64(1);

        assert!(explainer
            .explain(&model, &ds, array![0.5].view(), &mut rng)
            .is_err());
        assert!(matches!(
            explainer.explain(&model, &ds, array![f64::NAN, 0.5].view(), &mut rng),
            Err(AnchorError::Search(_))
        ));

        let wide = FnClassifier::new(3, |_row| 0);
        assert!(matches!(
            explainer.explain(&wide, &ds, array![0.5, 0.5].view(), &mut rng),
            Err(AnchorError::DimensionMismatch { expected: 2, actual: 3 })
        ));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = AppConfig::default();
        config.perturbation.samples = 0;
        assert!(AnchorExplainer::new(config).is_err());
    }

    #[test]
    fn test_unreachable_threshold_reports_infeasible() {
        // Labels alternate with the sample's position in a fine checkerboard.
        let model = FnClassifier::new(2, |row| {
            (((row[0] * 40.0).floor() + (row[1] * 40.0).floor()) as i64 % 2) as usize
        });
        let ds = unit_square();
        let mut config = config(SearchStrategy::BruteForce);
        config.search.precision_threshold = 1.0;
        config.search.max_cuts_per_feature = 4;
        let explainer = AnchorExplainer::new(config).unwrap();
        let explanation = explainer
            .explain(&model, &ds, array![0.51, 0.49].view(), &mut StdRng::seed_from_u64(3))
            .unwrap();
        assert!(!explanation.feasible);
        assert!(explanation.bounds.contains(array![0.51, 0.49].view()));
    }

    #[test]
    fn test_json_and_display() {
        let model = FnClassifier::new(2, |row| (row[0] > 0.5) as usize);
        let explainer = AnchorExplainer::new(config(SearchStrategy::Greedy)).unwrap();
        let explanation = explainer
            .explain(&model, &unit_square(), array![0.9, 0.1].view(), &mut StdRng::seed_from_u64(2))
            .unwrap();

        let json: serde_json::Value = serde_json::from_str(&explanation.to_json().unwrap()).unwrap();
        assert_eq!(json["strategy"], "greedy");
        assert_eq!(json["detail"]["kind"], "greedy");
        assert!(explanation.to_string().starts_with("IF x1 > "));
    }
}
