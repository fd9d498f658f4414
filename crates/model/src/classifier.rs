//! The black-box contract: the search only ever asks a model for the
//! predicted class of a row.

use ndarray::{Array2, ArrayView1};
use std::sync::Arc;

pub trait Classifier: Send + Sync {
    /// Number of input columns the model expects.
    fn n_features(&self) -> usize;

    fn predict(&self, row: ArrayView1<'_, f64>) -> usize;

    fn predict_batch(&self, rows: &Array2<f64>) -> Vec<usize> {
        rows.rows().into_iter().map(|row| self.predict(row)).collect()
    }
}

impl<C: Classifier + ?Sized> Classifier for &C {
    fn n_features(&self) -> usize {
        (**self).n_features()
    }

    fn predict(&self, row: ArrayView1<'_, f64>) -> usize {
        (**self).predict(row)
    }
}

impl<C: Classifier + ?Sized> Classifier for Arc<C> {
    fn n_features(&self) -> usize {
        (**self).n_features()
    }

    fn predict(&self, row: ArrayView1<'_, f64>) -> usize {
        (**self).predict(row)
    }
}

impl<C: Classifier + ?Sized> Classifier for Box<C> {
    fn n_features(&self) -> usize {
        (**self).n_features()
    }

    fn predict(&self, row: ArrayView1<'_, f64>) -> usize {
        (**self).predict(row)
    }
}

/// Adapts a closure into a [`Classifier`].
pub struct FnClassifier<F> {
    n_features: usize,
    func: F,
}

impl<F> FnClassifier<F>
where
    F: Fn(ArrayView1<'_, f64>) -> usize + Send + Sync,
{
    pub fn new(n_features: usize, func: F) -> Self {
        Self { n_features, func }
    }
}

impl<F> Classifier for FnClassifier<F>
where
    F: Fn(ArrayView1<'_, f64>) -> usize + Send + Sync,
{
    fn n_features(&self) -> usize {
        self.n_features
    }

    fn predict(&self, row: ArrayView1<'_, f64>) -> usize {
        (self.func)(row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_fn_classifier_batch() {
        let model = FnClassifier::new(2, |row| (row[0] + row[1] > 1.0) as usize);
        let rows = array![[0.0, 0.0], [1.0, 1.0], [0.2, 0.3]];
        assert_eq!(model.predict_batch(&rows), vec![0, 1, 0]);
        assert_eq!(model.n_features(), 2);
    }

    #[test]
    fn test_shared_and_boxed_models() {
        let model: Arc<dyn Classifier> =
            Arc::new(FnClassifier::new(1, |row| (row[0] > 0.0) as usize));
        let boxed: Box<dyn Classifier> = Box::new(model.clone());
        assert_eq!(model.predict(array![1.0].view()), 1);
        assert_eq!(boxed.predict(array![-1.0].view()), 0);
        assert_eq!((&model).n_features(), 1);
    }
}
