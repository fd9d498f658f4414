//! Hand-specified decision regions with a known shape, useful for seeing
//! what an anchor should look like.

use ndarray::ArrayView1;
use serde::{Deserialize, Serialize};

use crate::classifier::Classifier;

/// Class 1 inside a Euclidean ball, class 0 outside.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RadialClassifier {
    pub center: Vec<f64>,
    pub radius: f64,
}

impl RadialClassifier {
    pub fn new(center: Vec<f64>, radius: f64) -> Self {
        Self { center, radius }
    }
}

impl Classifier for RadialClassifier {
    fn n_features(&self) -> usize {
        self.center.len()
    }

    fn predict(&self, row: ArrayView1<'_, f64>) -> usize {
        let dist2: f64 = row
            .iter()
            .zip(&self.center)
            .map(|(x, c)| (x - c).powi(2))
            .sum();
        (dist2 <= self.radius * self.radius) as usize
    }
}

/// Class 1 when a single feature exceeds a threshold.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThresholdClassifier {
    pub n_features: usize,
    pub feature: usize,
    pub threshold: f64,
}

impl ThresholdClassifier {
    pub fn new(n_features: usize, feature: usize, threshold: f64) -> Self {
        Self {
            n_features,
            feature,
            threshold,
        }
    }
}

impl Classifier for ThresholdClassifier {
    fn n_features(&self) -> usize {
        self.n_features
    }

    fn predict(&self, row: ArrayView1<'_, f64>) -> usize {
        row.get(self.feature)
            .map_or(0, |&v| (v > self.threshold) as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_radial_boundary() {
        let model = RadialClassifier::new(vec![0.0, 0.0], 1.0);
        assert_eq!(model.predict(array![0.5, 0.5].view()), 1);
        assert_eq!(model.predict(array![1.0, 0.0].view()), 1);
        assert_eq!(model.predict(array![0.9, 0.9].view()), 0);
        assert_eq!(model.n_features(), 2);
    }

    #[test]
    fn test_threshold() {
        let model = ThresholdClassifier::new(3, 2, 0.5);
        assert_eq!(model.predict(array![9.0, 9.0, 0.4].view()), 0);
        assert_eq!(model.predict(array![0.0, 0.0, 0.6].view()), 1);
    }
}
