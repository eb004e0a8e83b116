//! Linear model implementations

use super::models::Classifier;
use super::optim::Lbfgs;
use crate::error::{PipelineError, Result};
use crate::preprocessing::LabelEncoder;
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// L2-regularized logistic regression fitted with L-BFGS.
///
/// Two classes use a single sigmoid output; more classes use a multinomial
/// softmax with one weight row per class. Regularization is the inverse
/// strength `C`; intercepts are not penalized.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogisticRegression {
    /// Fitted coefficients, one row per output
    pub coefficients: Option<Array2<f64>>,
    /// Fitted intercepts, one per output
    pub intercepts: Option<Array1<f64>>,
    /// Class labels in ascending order
    pub classes: Vec<String>,
    /// Inverse regularization strength
    pub c: f64,
    /// Maximum optimizer iterations
    pub max_iter: usize,
    /// Gradient tolerance
    pub tol: f64,
    /// Iterations used by the last fit
    pub n_iter: usize,
    /// Whether the last fit met its tolerance
    pub converged: bool,
    /// Whether model is fitted
    pub is_fitted: bool,
}

impl Default for LogisticRegression {
    fn default() -> Self {
        Self::new()
    }
}

impl LogisticRegression {
    /// Create a new logistic regression model
    pub fn new() -> Self {
        Self {
            coefficients: None,
            intercepts: None,
            classes: Vec::new(),
            c: 1.0,
            max_iter: 100,
            tol: 1e-4,
            n_iter: 0,
            converged: false,
            is_fitted: false,
        }
    }

    /// Set inverse regularization strength
    pub fn with_c(mut self, c: f64) -> Self {
        self.c = c;
        self
    }

    /// Set maximum iterations
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Fit on feature rows and their class labels
    pub fn fit(&mut self, x: &Array2<f64>, y: &[String]) -> Result<&mut Self> {
        let n_samples = x.nrows();
        let n_features = x.ncols();

        if n_samples != y.len() {
            return Err(PipelineError::ShapeError {
                expected: format!("y length = {}", n_samples),
                actual: format!("y length = {}", y.len()),
            });
        }
        if n_samples == 0 {
            return Err(PipelineError::NumericFitError("no training rows".to_string()));
        }
        if let Some(((row, col), _)) = x.indexed_iter().find(|(_, v)| !v.is_finite()) {
            return Err(PipelineError::NumericFitError(format!(
                "non-finite feature value at row {}, column {}",
                row, col
            )));
        }
        if !(self.c > 0.0) {
            return Err(PipelineError::NumericFitError(format!(
                "inverse regularization must be positive, got {}",
                self.c
            )));
        }

        let mut encoder = LabelEncoder::new();
        let y_idx = encoder.fit_transform(y)?;
        let classes = encoder.classes().to_vec();
        if classes.len() < 2 {
            return Err(PipelineError::NumericFitError(format!(
                "need at least 2 classes, found {}",
                classes.len()
            )));
        }

        let n_outputs = if classes.len() == 2 { 1 } else { classes.len() };
        let lambda = 1.0 / (self.c * n_samples as f64);
        let objective = Objective {
            x,
            y: &y_idx,
            n_outputs,
            lambda,
        };

        let x0 = Array1::zeros(n_outputs * (n_features + 1));
        let result = Lbfgs::new(self.max_iter)
            .with_gtol(self.tol)
            .minimize(|w| objective.loss_grad(w), x0);

        let (coefficients, intercepts) = unpack(&result.x, n_outputs, n_features);

        if !result.converged {
            warn!(
                max_iter = self.max_iter,
                n_iter = result.n_iter,
                "Logistic regression did not converge; consider raising max_iter"
            );
        }
        debug!(
            n_iter = result.n_iter,
            loss = result.fun,
            classes = classes.len(),
            "Logistic regression fitted"
        );

        self.coefficients = Some(coefficients);
        self.intercepts = Some(intercepts);
        self.classes = classes;
        self.n_iter = result.n_iter;
        self.converged = result.converged;
        self.is_fitted = true;

        Ok(self)
    }

    /// Raw decision values, one column per output
    pub fn decision_function(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        let (coefficients, intercepts) = match (&self.coefficients, &self.intercepts) {
            (Some(c), Some(b)) if self.is_fitted => (c, b),
            _ => return Err(PipelineError::ModelNotFitted),
        };
        if x.ncols() != coefficients.ncols() {
            return Err(PipelineError::ShapeError {
                expected: format!("{} features", coefficients.ncols()),
                actual: format!("{} features", x.ncols()),
            });
        }
        Ok(x.dot(&coefficients.t()) + intercepts)
    }

    /// Class probabilities, columns in class order
    pub fn predict_proba(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        let z = self.decision_function(x)?;

        if self.classes.len() == 2 {
            let p = z.column(0).mapv(sigmoid);
            let mut proba = Array2::zeros((x.nrows(), 2));
            proba.column_mut(0).assign(&p.mapv(|v| 1.0 - v));
            proba.column_mut(1).assign(&p);
            Ok(proba)
        } else {
            Ok(softmax_rows(&z))
        }
    }

    /// Predicted class indices
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<usize>> {
        let proba = self.predict_proba(x)?;
        Ok(proba.map_axis(Axis(1), |row| argmax(row.iter().copied())))
    }

    /// Predicted class labels
    pub fn predict_labels(&self, x: &Array2<f64>) -> Result<Vec<String>> {
        Ok(self
            .predict(x)?
            .iter()
            .map(|&i| self.classes[i].clone())
            .collect())
    }

    /// Get accuracy score
    pub fn score(&self, x: &Array2<f64>, y: &[String]) -> Result<f64> {
        let y_pred = self.predict_labels(x)?;
        let correct = y_pred.iter().zip(y.iter()).filter(|(p, t)| p == t).count();
        Ok(correct as f64 / y.len().max(1) as f64)
    }
}

impl Classifier for LogisticRegression {
    fn classes(&self) -> &[String] {
        &self.classes
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<usize>> {
        LogisticRegression::predict(self, x)
    }

    fn predict_proba(&self, x: &Array2<f64>) -> Result<Option<Array2<f64>>> {
        LogisticRegression::predict_proba(self, x).map(Some)
    }
}

/// Mean log-loss plus L2 penalty on the weights
struct Objective<'a> {
    x: &'a Array2<f64>,
    y: &'a Array1<usize>,
    n_outputs: usize,
    lambda: f64,
}

impl Objective<'_> {
    fn loss_grad(&self, params: &Array1<f64>) -> (f64, Array1<f64>) {
        let n = self.x.nrows() as f64;
        let d = self.x.ncols();
        let (w, b) = unpack(params, self.n_outputs, d);
        let z = self.x.dot(&w.t()) + &b;

        // residual = predicted probability - one-hot target
        let (data_loss, residual) = if self.n_outputs == 1 {
            let mut loss = 0.0;
            let mut residual = Array2::zeros((self.x.nrows(), 1));
            for (i, (&zi, &yi)) in z.column(0).iter().zip(self.y.iter()).enumerate() {
                let target = yi as f64;
                loss += softplus(zi) - target * zi;
                residual[[i, 0]] = sigmoid(zi) - target;
            }
            (loss / n, residual)
        } else {
            let mut loss = 0.0;
            let mut residual = softmax_rows(&z);
            for (i, (row, &yi)) in z.rows().into_iter().zip(self.y.iter()).enumerate() {
                loss += log_sum_exp(row.iter().copied()) - row[yi];
                residual[[i, yi]] -= 1.0;
            }
            (loss / n, residual)
        };

        let penalty = 0.5 * self.lambda * w.iter().map(|v| v * v).sum::<f64>();
        let grad_w = residual.t().dot(self.x) / n + &(self.lambda * &w);
        let grad_b = residual.sum_axis(Axis(0)) / n;

        (data_loss + penalty, pack(&grad_w, &grad_b))
    }
}

/// Flat parameter vector -> (weights, intercepts); weights first, row-major
fn unpack(params: &Array1<f64>, n_outputs: usize, n_features: usize) -> (Array2<f64>, Array1<f64>) {
    let split = n_outputs * n_features;
    let w = Array2::from_shape_fn((n_outputs, n_features), |(k, j)| params[k * n_features + j]);
    let b = Array1::from_iter(params.iter().skip(split).copied());
    (w, b)
}

fn pack(w: &Array2<f64>, b: &Array1<f64>) -> Array1<f64> {
    w.iter().chain(b.iter()).copied().collect()
}

fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

/// ln(1 + e^z) without overflow
fn softplus(z: f64) -> f64 {
    z.max(0.0) + (-z.abs()).exp().ln_1p()
}

fn log_sum_exp(values: impl Iterator<Item = f64> + Clone) -> f64 {
    let max = values.clone().fold(f64::NEG_INFINITY, f64::max);
    max + values.map(|v| (v - max).exp()).sum::<f64>().ln()
}

fn softmax_rows(z: &Array2<f64>) -> Array2<f64> {
    let mut out = z.clone();
    for mut row in out.rows_mut() {
        let max = row.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        row.mapv_inplace(|v| (v - max).exp());
        let total = row.sum();
        row.mapv_inplace(|v| v / total);
    }
    out
}

/// Index of the largest value; the first one wins ties
fn argmax(values: impl Iterator<Item = f64>) -> usize {
    let mut best = 0;
    let mut best_val = f64::NEG_INFINITY;
    for (i, v) in values.enumerate() {
        if v > best_val {
            best = i;
            best_val = v;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn labels(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    fn two_blobs() -> (Array2<f64>, Vec<String>) {
        let x = array![
            [-2.0, -1.5],
            [-1.5, -2.0],
            [-1.0, -1.2],
            [-1.8, -0.9],
            [1.2, 1.0],
            [2.0, 1.5],
            [1.5, 2.2],
            [0.9, 1.7]
        ];
        let y = labels(&["0", "0", "0", "0", "1", "1", "1", "1"]);
        (x, y)
    }

    #[test]
    fn test_binary_fit_predict() {
        let (x, y) = two_blobs();
        let mut model = LogisticRegression::new();
        model.fit(&x, &y).unwrap();

        assert!(model.is_fitted);
        assert_eq!(model.classes, labels(&["0", "1"]));
        assert_eq!(model.coefficients.as_ref().unwrap().nrows(), 1);
        assert_eq!(model.score(&x, &y).unwrap(), 1.0);
    }

    #[test]
    fn test_binary_proba_rows_sum_to_one() {
        let (x, y) = two_blobs();
        let mut model = LogisticRegression::new();
        model.fit(&x, &y).unwrap();

        let proba = model.predict_proba(&x).unwrap();
        assert_eq!(proba.shape(), &[8, 2]);
        for row in proba.rows() {
            assert!((row.sum() - 1.0).abs() < 1e-12);
        }
        assert!(proba[[7, 1]] > 0.5);
        assert!(proba[[0, 1]] < 0.5);
    }

    #[test]
    fn test_multiclass_softmax() {
        let x = array![
            [0.0, 0.0],
            [0.2, 0.1],
            [0.1, 0.3],
            [5.0, 0.0],
            [5.2, 0.3],
            [4.9, -0.2],
            [0.0, 5.0],
            [0.3, 5.1],
            [-0.2, 4.8]
        ];
        let y = labels(&["a", "a", "a", "b", "b", "b", "c", "c", "c"]);

        let mut model = LogisticRegression::new().with_max_iter(200);
        model.fit(&x, &y).unwrap();

        assert_eq!(model.coefficients.as_ref().unwrap().nrows(), 3);
        let proba = model.predict_proba(&x).unwrap();
        for row in proba.rows() {
            assert!((row.sum() - 1.0).abs() < 1e-10);
        }
        assert_eq!(model.predict_labels(&x).unwrap(), y);
    }

    #[test]
    fn test_strong_regularization_shrinks_weights() {
        let (x, y) = two_blobs();
        let mut weak = LogisticRegression::new().with_c(100.0);
        let mut strong = LogisticRegression::new().with_c(0.01);
        weak.fit(&x, &y).unwrap();
        strong.fit(&x, &y).unwrap();

        let norm = |m: &LogisticRegression| {
            m.coefficients.as_ref().unwrap().iter().map(|v| v * v).sum::<f64>()
        };
        assert!(norm(&strong) < norm(&weak));
    }

    #[test]
    fn test_single_class_rejected() {
        let x = array![[1.0], [2.0]];
        let err = LogisticRegression::new().fit(&x, &labels(&["a", "a"])).unwrap_err();
        assert!(matches!(err, PipelineError::NumericFitError(_)));
    }

    #[test]
    fn test_non_finite_input_rejected() {
        let x = array![[1.0], [f64::NAN]];
        let err = LogisticRegression::new().fit(&x, &labels(&["a", "b"])).unwrap_err();
        assert!(matches!(err, PipelineError::NumericFitError(_)));
    }

    #[test]
    fn test_iteration_bound_is_not_fatal() {
        let (x, y) = two_blobs();
        let mut model = LogisticRegression::new().with_max_iter(1);
        model.fit(&x, &y).unwrap();
        assert_eq!(model.n_iter, 1);
        assert!(model.is_fitted);
    }

    #[test]
    fn test_predict_before_fit() {
        let model = LogisticRegression::new();
        let err = model.predict(&array![[1.0]]).unwrap_err();
        assert!(matches!(err, PipelineError::ModelNotFitted));
    }

    #[test]
    fn test_numerical_helpers() {
        assert!((sigmoid(0.0) - 0.5).abs() < 1e-15);
        assert!(sigmoid(-800.0) >= 0.0);
        assert!((softplus(800.0) - 800.0).abs() < 1e-9);
        assert_eq!(argmax([0.2, 0.5, 0.5].into_iter()), 1);
    }
}
