//! Candidate thresholds: the midpoints between consecutive distinct
//! values of each feature.

use anchors_core::Dataset;
use serde::{Deserialize, Serialize};

/// Midpoints between consecutive sorted distinct values. NaNs are ignored.
pub fn cut_points<I: IntoIterator<Item = f64>>(values: I) -> Vec<f64> {
    let mut sorted: Vec<f64> = values.into_iter().filter(|v| !v.is_nan()).collect();
    sorted.sort_by(|a, b| a.total_cmp(b));
    sorted.dedup();
    sorted.windows(2).map(|w| (w[0] + w[1]) / 2.0).collect()
}

/// Keep at most `max` evenly spaced cuts, always including both ends.
pub fn thin(cuts: Vec<f64>, max: usize) -> Vec<f64> {
    if cuts.len() <= max {
        return cuts;
    }
    if max == 0 {
        return Vec::new();
    }
    if max == 1 {
        return vec![cuts[cuts.len() / 2]];
    }
    let last = (cuts.len() - 1) as f64;
    let mut picked: Vec<f64> = (0..max)
        .map(|i| cuts[(i as f64 * last / (max - 1) as f64).round() as usize])
        .collect();
    picked.dedup();
    picked
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CutGrid {
    cuts: Vec<Vec<f64>>,
}

impl CutGrid {
    /// `cuts` must be sorted ascending per feature.
    pub fn from_cuts(cuts: Vec<Vec<f64>>) -> Self {
        Self { cuts }
    }

    pub fn from_samples(samples: &Dataset, max_per_feature: usize) -> Self {
        let cuts = samples
            .values()
            .columns()
            .into_iter()
            .map(|col| thin(cut_points(col.iter().copied()), max_per_feature))
            .collect();
        Self { cuts }
    }

    pub fn dims(&self) -> usize {
        self.cuts.len()
    }

    pub fn cuts(&self, k: usize) -> &[f64] {
        self.cuts.get(k).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Cuts strictly below `x`, closest first.
    pub fn below(&self, k: usize, x: f64) -> Vec<f64> {
        self.cuts(k).iter().rev().copied().filter(|&c| c < x).collect()
    }

    /// Cuts at or above `x`, closest first.
    pub fn above(&self, k: usize, x: f64) -> Vec<f64> {
        self.cuts(k).iter().copied().filter(|&c| c >= x).collect()
    }

    pub fn total_cuts(&self) -> usize {
        self.cuts.iter().map(Vec::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_midpoints_of_distinct_values() {
        assert_eq!(cut_points(vec![3.0, 1.0, 2.0, 1.0]), vec![1.5, 2.5]);
        assert!(cut_points(vec![4.0, 4.0]).is_empty());
        assert!(cut_points(Vec::new()).is_empty());
        assert_eq!(cut_points(vec![f64::NAN, 0.0, 1.0]), vec![0.5]);
    }

    #[test]
    fn test_thin_keeps_ends() {
        let cuts: Vec<f64> = (0..10).map(f64::from).collect();
        let thinned = thin(cuts.clone(), 4);
        assert_eq!(thinned.len(), 4);
        assert_eq!(thinned[0], 0.0);
        assert_eq!(thinned[3], 9.0);
        assert_eq!(thin(cuts.clone(), 20), cuts);
        assert_eq!(thin(cuts, 1), vec![5.0]);
    }

    #[test]
    fn test_below_and_above_closest_first() {
        let grid = CutGrid::from_cuts(vec![vec![0.5, 1.5, 2.5, 3.5]]);
        assert_eq!(grid.below(0, 2.0), vec![1.5, 0.5]);
        assert_eq!(grid.above(0, 2.0), vec![2.5, 3.5]);
        assert_eq!(grid.above(0, 2.5), vec![2.5, 3.5]);
        assert!(grid.below(0, 0.1).is_empty());
        assert!(grid.cuts(7).is_empty());
    }

    #[test]
    fn test_from_samples() {
        let ds = Dataset::new(
            vec!["a".to_string(), "b".to_string()],
            array![[0.0, 5.0], [1.0, 5.0], [2.0, 5.0]],
        )
        .unwrap();
        let grid = CutGrid::from_samples(&ds, 8);
        assert_eq!(grid.dims(), 2);
        assert_eq!(grid.cuts(0), &[0.5, 1.5]);
        assert!(grid.cuts(1).is_empty());
        assert_eq!(grid.total_cuts(), 2);
    }
}
