//! Tabular numeric dataset with named feature columns.
//!
//! Rows are stored in an `ndarray` matrix; column names are only resolved
//! when something asks for them, so an unknown name surfaces as
//! [`AnchorError::MissingFeatures`] at lookup time.

use ndarray::{Array2, ArrayView1, Axis};
use std::collections::HashSet;
use std::path::Path;
use tracing::debug;

use crate::error::{AnchorError, AnchorResult};

#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    feature_names: Vec<String>,
    values: Array2<f64>,
}

impl Dataset {
    pub fn new(feature_names: Vec<String>, values: Array2<f64>) -> AnchorResult<Self> {
        if feature_names.len() != values.ncols() {
            return Err(AnchorError::DimensionMismatch {
                expected: feature_names.len(),
                actual: values.ncols(),
            });
        }

        let mut seen = HashSet::new();
        for name in &feature_names {
            if !seen.insert(name.as_str()) {
                return Err(AnchorError::InvalidConfig(format!(
                    "duplicate feature name '{name}'"
                )));
            }
        }

        Ok(Self {
            feature_names,
            values,
        })
    }

    /// Parse a header line followed by comma-separated numeric rows.
    pub fn from_csv_str(text: &str) -> AnchorResult<Self> {
        let mut lines = text
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty());

        let (_, header) = lines.next().ok_or(AnchorError::EmptyDataset)?;
        let feature_names: Vec<String> = header
            .split(',')
            .map(|name| name.trim().trim_matches('"').to_string())
            .collect();
        let width = feature_names.len();

        let mut flat = Vec::new();
        let mut n_rows = 0;
        for (idx, line) in lines {
            let cells: Vec<&str> = line.split(',').collect();
            if cells.len() != width {
                return Err(AnchorError::DimensionMismatch {
                    expected: width,
                    actual: cells.len(),
                });
            }
            for (col, cell) in cells.iter().enumerate() {
                let parse_error = |message: String| AnchorError::Parse {
                    line: idx + 1,
                    column: col + 1,
                    message,
                };
                let value = cell
                    .trim()
                    .trim_matches('"')
                    .parse::<f64>()
                    .map_err(|e| parse_error(format!("'{}': {e}", cell.trim())))?;
                // `parse` accepts "NaN" and "inf"; neither is a usable measurement.
                if !value.is_finite() {
                    return Err(parse_error(format!("'{}': not a finite number", cell.trim())));
                }
                flat.push(value);
            }
            n_rows += 1;
        }

        if n_rows == 0 {
            return Err(AnchorError::EmptyDataset);
        }

        let values = Array2::from_shape_vec((n_rows, width), flat)
            .map_err(|e| AnchorError::Internal(e.into()))?;
        debug!(rows = n_rows, columns = width, "Parsed CSV dataset");
        Self::new(feature_names, values)
    }

    pub fn from_csv_path(path: impl AsRef<Path>) -> AnchorResult<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_csv_str(&text)
    }

    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    pub fn values(&self) -> &Array2<f64> {
        &self.values
    }

    pub fn n_rows(&self) -> usize {
        self.values.nrows()
    }

    pub fn n_features(&self) -> usize {
        self.values.ncols()
    }

    pub fn is_empty(&self) -> bool {
        self.values.nrows() == 0
    }

    pub fn row(&self, index: usize) -> Option<ArrayView1<'_, f64>> {
        (index < self.n_rows()).then(|| self.values.row(index))
    }

    pub fn column_index(&self, name: &str) -> AnchorResult<usize> {
        self.feature_names
            .iter()
            .position(|n| n == name)
            .ok_or_else(|| AnchorError::MissingFeatures(vec![name.to_string()]))
    }

    pub fn column(&self, name: &str) -> AnchorResult<ArrayView1<'_, f64>> {
        let idx = self.column_index(name)?;
        Ok(self.values.column(idx))
    }

    /// Project the dataset onto `names`, in that order. Every absent column
    /// is reported in one error.
    pub fn select<S: AsRef<str>>(&self, names: &[S]) -> AnchorResult<Dataset> {
        let missing: Vec<String> = names
            .iter()
            .map(|name| name.as_ref())
            .filter(|name| !self.feature_names.iter().any(|n| n == *name))
            .map(str::to_string)
            .collect();
        if !missing.is_empty() {
            return Err(AnchorError::MissingFeatures(missing));
        }

        let indices: Vec<usize> = names
            .iter()
            .map(|name| self.column_index(name.as_ref()))
            .collect::<AnchorResult<_>>()?;
        let values = self.values.select(Axis(1), &indices);
        Dataset::new(
            names.iter().map(|n| n.as_ref().to_string()).collect(),
            values,
        )
    }

    /// Remove the label column, returning the remaining features and the labels.
    pub fn split_target(&self, target: &str) -> AnchorResult<(Dataset, Vec<f64>)> {
        let target_idx = self.column_index(target)?;
        let labels = self.values.column(target_idx).to_vec();
        let keep: Vec<&String> = self
            .feature_names
            .iter()
            .filter(|name| name.as_str() != target)
            .collect();
        let features = self.select(&keep)?;
        Ok((features, labels))
    }

    /// Keep only the rows whose flag in `mask` is set.
    pub fn filter_rows(&self, mask: &[bool]) -> AnchorResult<Dataset> {
        if mask.len() != self.n_rows() {
            return Err(AnchorError::DimensionMismatch {
                expected: self.n_rows(),
                actual: mask.len(),
            });
        }
        let indices: Vec<usize> = mask
            .iter()
            .enumerate()
            .filter_map(|(i, keep)| keep.then_some(i))
            .collect();
        Ok(Self {
            feature_names: self.feature_names.clone(),
            values: self.values.select(Axis(0), &indices),
        })
    }

    /// Observed `(min, max)` of every column; NaNs are skipped.
    pub fn feature_ranges(&self) -> Vec<(f64, f64)> {
        self.values
            .columns()
            .into_iter()
            .map(|col| {
                col.iter()
                    .filter(|v| !v.is_nan())
                    .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
                        (lo.min(v), hi.max(v))
                    })
            })
            .collect()
    }

    /// Population standard deviation of every column.
    pub fn feature_std(&self) -> Vec<f64> {
        self.values
            .columns()
            .into_iter()
            .map(|col| {
                let n = col.len().max(1) as f64;
                let mean = col.sum() / n;
                (col.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n).sqrt()
            })
            .collect()
    }
}

/// Map distinct label values to class indices in ascending value order.
/// A non-finite label has no class and is rejected with its row index.
pub fn encode_labels(labels: &[f64]) -> AnchorResult<(Vec<usize>, Vec<f64>)> {
    if let Some(row) = labels.iter().position(|v| !v.is_finite()) {
        return Err(AnchorError::Model(format!(
            "label in row {} is not a finite number",
            row + 1
        )));
    }

    let mut classes = labels.to_vec();
    classes.sort_by(|a, b| a.total_cmp(b));
    classes.dedup();

    let encoded = labels
        .iter()
        .map(|v| classes.iter().position(|c| c == v).unwrap_or(0))
        .collect();
    Ok((encoded, classes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn sample() -> Dataset {
        Dataset::from_csv_str("x1,x2,label\n1.0,2.0,0\n3.0,4.0,1\n\n5.0,6.0,1\n").unwrap()
    }

    #[test]
    fn test_parse_csv() {
        let ds = sample();
        assert_eq!(ds.n_rows(), 3);
        assert_eq!(ds.n_features(), 3);
        assert_eq!(ds.feature_names(), &["x1", "x2", "label"]);
        assert_eq!(ds.row(1).unwrap().to_vec(), vec![3.0, 4.0, 1.0]);
        assert!(ds.row(3).is_none());
    }

    #[test]
    fn test_parse_error_reports_position() {
        let err = Dataset::from_csv_str("a,b\n1,2\n3,oops\n").unwrap_err();
        match err {
            AnchorError::Parse { line, column, .. } => {
                assert_eq!(line, 3);
                assert_eq!(column, 2);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_ragged_and_empty_rejected() {
        assert!(matches!(
            Dataset::from_csv_str("a,b\n1\n"),
            Err(AnchorError::DimensionMismatch { expected: 2, actual: 1 })
        ));
        assert!(matches!(
            Dataset::from_csv_str("a,b\n"),
            Err(AnchorError::EmptyDataset)
        ));
        assert!(matches!(
            Dataset::from_csv_str(""),
            Err(AnchorError::EmptyDataset)
        ));
    }

    #[test]
    fn test_select_reports_all_missing_columns() {
        let ds = sample();
        match ds.select(&["x1", "age", "income"]) {
            Err(AnchorError::MissingFeatures(missing)) => {
                assert_eq!(missing, vec!["age".to_string(), "income".to_string()]);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_select_reorders_columns() {
        let ds = sample().select(&["x2", "x1"]).unwrap();
        assert_eq!(ds.feature_names(), &["x2", "x1"]);
        assert_eq!(ds.row(0).unwrap().to_vec(), vec![2.0, 1.0]);
    }

    #[test]
    fn test_split_target() {
        let (features, labels) = sample().split_target("label").unwrap();
        assert_eq!(features.feature_names(), &["x1", "x2"]);
        assert_eq!(labels, vec![0.0, 1.0, 1.0]);
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let result = Dataset::new(
            vec!["a".to_string(), "a".to_string()],
            array![[1.0, 2.0]],
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_feature_ranges_and_std() {
        let ds = sample();
        let ranges = ds.feature_ranges();
        assert_eq!(ranges[0], (1.0, 5.0));
        assert_eq!(ranges[1], (2.0, 6.0));
        let std = ds.feature_std();
        assert!((std[0] - (8.0f64 / 3.0).sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_filter_rows() {
        let ds = sample().filter_rows(&[true, false, true]).unwrap();
        assert_eq!(ds.n_rows(), 2);
        assert_eq!(ds.row(1).unwrap()[0], 5.0);
        assert!(sample().filter_rows(&[true]).is_err());
    }

    #[test]
    fn test_encode_labels() {
        let (encoded, classes) = encode_labels(&[2.0, 0.5, 2.0, 7.0]).unwrap();
        assert_eq!(classes, vec![0.5, 2.0, 7.0]);
        assert_eq!(encoded, vec![1, 0, 1, 2]);
    }

    #[test]
    fn test_encode_labels_rejects_nan() {
        match encode_labels(&[0.0, 1.0, f64::NAN]) {
            Err(AnchorError::Model(message)) => assert!(message.contains("row 3")),
            other => panic!("unexpected result: {other:?}"),
        }
        assert!(encode_labels(&[0.0, f64::INFINITY]).is_err());
    }

    #[test]
    fn test_non_finite_cells_rejected() {
        for cell in ["NaN", "nan", "inf", "-inf"] {
            let text = format!("a,b,label\n1.0,2.0,0\n{cell},50,1\n");
            match Dataset::from_csv_str(&text) {
                Err(AnchorError::Parse { line, column, .. }) => {
                    assert_eq!(line, 3);
                    assert_eq!(column, 1);
                }
                other => panic!("{cell} was accepted: {other:?}"),
            }
        }
    }
}
