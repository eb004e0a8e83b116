//! Classifier trait shared by evaluation and plotting

use crate::error::Result;
use ndarray::{Array1, Array2};

/// Trait for fitted classifiers
pub trait Classifier {
    /// Class labels in prediction index order
    fn classes(&self) -> &[String];

    /// Predicted class indices
    fn predict(&self, x: &Array2<f64>) -> Result<Array1<usize>>;

    /// Per-class probabilities in class order, if the model provides them
    fn predict_proba(&self, _x: &Array2<f64>) -> Result<Option<Array2<f64>>> {
        Ok(None)
    }

    fn n_classes(&self) -> usize {
        self.classes().len()
    }
}
