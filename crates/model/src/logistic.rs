//! One-vs-rest logistic regression trained by full-batch gradient descent.
//!
//! Features are standardized with the training mean and standard deviation
//! before fitting; the same transform is applied at prediction time.

use anchors_core::config::ModelConfig;
use anchors_core::{AnchorError, AnchorResult};
use ndarray::{Array1, Array2, ArrayView1, Axis};
use tracing::{debug, info};

use crate::classifier::Classifier;

#[derive(Debug, Clone)]
pub struct LogisticRegression {
    means: Array1<f64>,
    stds: Array1<f64>,
    /// One row of weights per binary model.
    weights: Array2<f64>,
    biases: Array1<f64>,
    n_classes: usize,
}

impl LogisticRegression {
    /// Fit on `x` with class indices `labels` (as produced by `encode_labels`).
    pub fn fit(x: &Array2<f64>, labels: &[usize], config: &ModelConfig) -> AnchorResult<Self> {
        if x.nrows() == 0 {
            return Err(AnchorError::EmptyDataset);
        }
        if labels.len() != x.nrows() {
            return Err(AnchorError::DimensionMismatch {
                expected: x.nrows(),
                actual: labels.len(),
            });
        }
        if let Some(((row, col), _)) = x.indexed_iter().find(|(_, v)| !v.is_finite()) {
            return Err(AnchorError::Model(format!(
                "non-finite feature value at row {}, column {}",
                row + 1,
                col + 1
            )));
        }
        let n_classes = labels.iter().copied().max().map_or(0, |m| m + 1);
        let distinct = {
            let mut seen = vec![false; n_classes];
            labels.iter().for_each(|&l| seen[l] = true);
            seen.into_iter().filter(|&s| s).count()
        };
        if distinct < 2 {
            return Err(AnchorError::Model(format!(
                "need at least two classes to fit, found {distinct}"
            )));
        }

        let means = x
            .mean_axis(Axis(0))
            .ok_or(AnchorError::EmptyDataset)?;
        let stds = x.std_axis(Axis(0), 0.0).mapv(|s| if s > 0.0 { s } else { 1.0 });
        let xs = (x - &means) / &stds;

        // Two classes share a single model for the positive class.
        let targets: Vec<usize> = if n_classes == 2 {
            vec![1]
        } else {
            (0..n_classes).collect()
        };

        let n_features = x.ncols();
        let mut weights = Array2::<f64>::zeros((targets.len(), n_features));
        let mut biases = Array1::<f64>::zeros(targets.len());

        for (m, &class) in targets.iter().enumerate() {
            let y = Array1::from_iter(labels.iter().map(|&l| (l == class) as u8 as f64));
            let (w, b) = gradient_descent(&xs, &y, config);
            weights.row_mut(m).assign(&w);
            biases[m] = b;
            debug!(class = class, bias = b, "Fitted binary logistic model");
        }

        info!(
            rows = x.nrows(),
            features = n_features,
            classes = n_classes,
            epochs = config.epochs,
            "Logistic regression fitted"
        );

        Ok(Self {
            means,
            stds,
            weights,
            biases,
            n_classes,
        })
    }

    pub fn n_classes(&self) -> usize {
        self.n_classes
    }

    /// Class membership probabilities; one-vs-rest scores are normalized to sum to 1.
    ///
    /// `row` must have the width the model was fitted on; ndarray panics on
    /// a broadcast of any other width.
    pub fn predict_proba(&self, row: ArrayView1<'_, f64>) -> Vec<f64> {
        debug_assert_eq!(
            row.len(),
            self.means.len(),
            "row width does not match the fitted feature count"
        );
        let xs = (&row - &self.means) / &self.stds;
        let scores: Vec<f64> = self
            .weights
            .rows()
            .into_iter()
            .zip(self.biases.iter())
            .map(|(w, b)| sigmoid(w.dot(&xs) + b))
            .collect();

        if self.n_classes == 2 {
            return vec![1.0 - scores[0], scores[0]];
        }
        let total: f64 = scores.iter().sum();
        if total > 0.0 {
            scores.into_iter().map(|s| s / total).collect()
        } else {
            vec![1.0 / self.n_classes as f64; self.n_classes]
        }
    }

    /// Training accuracy helper.
    pub fn accuracy(&self, x: &Array2<f64>, labels: &[usize]) -> f64 {
        if labels.is_empty() {
            return 0.0;
        }
        let hits = self
            .predict_batch(x)
            .iter()
            .zip(labels)
            .filter(|(p, l)| p == l)
            .count();
        hits as f64 / labels.len() as f64
    }
}

impl Classifier for LogisticRegression {
    fn n_features(&self) -> usize {
        self.means.len()
    }

    fn predict(&self, row: ArrayView1<'_, f64>) -> usize {
        self.predict_proba(row)
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(idx, _)| idx)
            .unwrap_or(0)
    }
}

fn gradient_descent(xs: &Array2<f64>, y: &Array1<f64>, config: &ModelConfig) -> (Array1<f64>, f64) {
    let n = xs.nrows() as f64;
    let mut w = Array1::<f64>::zeros(xs.ncols());
    let mut b = 0.0;

    for _ in 0..config.epochs {
        let residual = (xs.dot(&w) + b).mapv(sigmoid) - y;
        let grad_w = xs.t().dot(&residual) / n + &w * config.l2;
        let grad_b = residual.sum() / n;
        w = w - grad_w * config.learning_rate;
        b -= grad_b * config.learning_rate;
    }
    (w, b)
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}
