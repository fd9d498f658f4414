//! Perturbation distributions: synthetic neighbours of a local instance.

use anchors_core::{AnchorError, AnchorResult, Dataset, PerturbationKind};
use ndarray::{Array2, ArrayView1};
use rand::Rng;

#[derive(Debug, Clone)]
pub enum PerturbationDistribution {
    /// Independent uniform draws over `[min, max]` per feature.
    Uniform { ranges: Vec<(f64, f64)> },
    /// Independent normal draws around `center` with per-feature `scale`.
    Gaussian { center: Vec<f64>, scale: Vec<f64> },
    /// Rows drawn with replacement from `data`.
    Empirical { data: Array2<f64> },
}

impl PerturbationDistribution {
    /// Build the configured family from the training data and the instance.
    /// Gaussian scale is `scale` times each feature's standard deviation.
    pub fn from_config(
        kind: PerturbationKind,
        dataset: &Dataset,
        instance: ArrayView1<'_, f64>,
        scale: f64,
    ) -> AnchorResult<Self> {
        if dataset.is_empty() {
            return Err(AnchorError::EmptyDataset);
        }
        if instance.len() != dataset.n_features() {
            return Err(AnchorError::DimensionMismatch {
                expected: dataset.n_features(),
                actual: instance.len(),
            });
        }

        Ok(match kind {
            PerturbationKind::Uniform => Self::Uniform {
                ranges: dataset.feature_ranges(),
            },
            PerturbationKind::Gaussian => Self::Gaussian {
                center: instance.to_vec(),
                scale: dataset.feature_std().into_iter().map(|s| s * scale).collect(),
            },
            PerturbationKind::Empirical => Self::Empirical {
                data: dataset.values().clone(),
            },
        })
    }

    pub fn kind(&self) -> PerturbationKind {
        match self {
            Self::Uniform { .. } => PerturbationKind::Uniform,
            Self::Gaussian { .. } => PerturbationKind::Gaussian,
            Self::Empirical { .. } => PerturbationKind::Empirical,
        }
    }

    pub fn n_features(&self) -> usize {
        match self {
            Self::Uniform { ranges } => ranges.len(),
            Self::Gaussian { center, .. } => center.len(),
            Self::Empirical { data } => data.ncols(),
        }
    }

    /// Draw `n` samples, one per row.
    pub fn sample<R: Rng + ?Sized>(&self, n: usize, rng: &mut R) -> AnchorResult<Array2<f64>> {
        let d = self.n_features();
        if d == 0 {
            return Err(AnchorError::DimensionMismatch {
                expected: 1,
                actual: 0,
            });
        }

        let mut out = Array2::<f64>::zeros((n, d));
        match self {
            Self::Uniform { ranges } => {
                for mut row in out.rows_mut() {
                    for (v, &(lo, hi)) in row.iter_mut().zip(ranges) {
                        *v = lo + (hi - lo) * rng.gen::<f64>();
                    }
                }
            }
            Self::Gaussian { center, scale } => {
                if scale.len() != d {
                    return Err(AnchorError::DimensionMismatch {
                        expected: d,
                        actual: scale.len(),
                    });
                }
                for mut row in out.rows_mut() {
                    for ((v, &c), &s) in row.iter_mut().zip(center).zip(scale) {
                        *v = c + s * standard_normal(rng);
                    }
                }
            }
            Self::Empirical { data } => {
                if data.nrows() == 0 {
                    return Err(AnchorError::EmptyDataset);
                }
                for mut row in out.rows_mut() {
                    let idx = rng.gen_range(0..data.nrows());
                    row.assign(&data.row(idx));
                }
            }
        }
        Ok(out)
    }
}

/// Box-Muller transform.
fn standard_normal<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    let u1: f64 = 1.0 - rng.gen::<f64>();
    let u2: f64 = rng.gen::<f64>();
    (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
}
