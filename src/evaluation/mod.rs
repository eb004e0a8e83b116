//! Model evaluation on the validation partition
//!
//! Binary and multiclass problems share one code path, branching on
//! [`EvaluationStrategy`] where the two differ (ROC-AUC, curve plots).

pub mod metrics;

pub use metrics::{
    auc, confusion_matrix, precision_recall_curve, roc_auc_score, roc_curve, ClassMetrics,
    ClassificationReport, Curve,
};

use crate::error::{PipelineError, Result};
use crate::training::Classifier;
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// How results are summarized for a given class count
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EvaluationStrategy {
    /// Two classes; `positive` is the index of the second class
    Binary { positive: usize },
    /// Three or more classes, scored one-vs-rest
    Multiclass { n_classes: usize },
}

impl EvaluationStrategy {
    pub fn for_classes(n_classes: usize) -> Self {
        if n_classes == 2 {
            EvaluationStrategy::Binary { positive: 1 }
        } else {
            EvaluationStrategy::Multiclass { n_classes }
        }
    }

    pub fn is_binary(&self) -> bool {
        matches!(self, EvaluationStrategy::Binary { .. })
    }
}

/// Everything computed on the validation partition
#[derive(Debug, Clone)]
pub struct Evaluation {
    pub strategy: EvaluationStrategy,
    pub classes: Vec<String>,
    pub y_true: Array1<usize>,
    pub y_pred: Array1<usize>,
    /// Class probabilities, when the model provides them
    pub proba: Option<Array2<f64>>,
    pub confusion: Array2<usize>,
    pub report: ClassificationReport,
    /// Present only for binary problems with probability estimates
    pub roc_auc: Option<f64>,
}

impl Evaluation {
    /// Report text: `ROC-AUC: x.xxxx` and a blank line for binary problems,
    /// then the per-class table
    pub fn render_report(&self) -> String {
        match self.roc_auc {
            Some(auc) => format!("ROC-AUC: {:.4}\n\n{}", auc, self.report.render()),
            None => self.report.render(),
        }
    }

    pub fn accuracy(&self) -> f64 {
        self.report.accuracy
    }
}

/// Score a fitted classifier on validation features and encoded labels
pub fn evaluate(model: &dyn Classifier, x_val: &Array2<f64>, y_val: &Array1<usize>) -> Result<Evaluation> {
    if x_val.nrows() != y_val.len() {
        return Err(PipelineError::ShapeError {
            expected: format!("{} labels", x_val.nrows()),
            actual: format!("{} labels", y_val.len()),
        });
    }

    let classes = model.classes().to_vec();
    let strategy = EvaluationStrategy::for_classes(classes.len());

    let y_pred = model.predict(x_val)?;
    let proba = model.predict_proba(x_val)?;

    let y_true_vec = y_val.to_vec();
    let y_pred_vec = y_pred.to_vec();
    let confusion = confusion_matrix(&y_true_vec, &y_pred_vec, classes.len());
    let report = ClassificationReport::new(&y_true_vec, &y_pred_vec, &classes);
    info!(accuracy = report.accuracy, "Generated classification report");

    let roc_auc = match (strategy, &proba) {
        (EvaluationStrategy::Binary { positive }, Some(p)) => {
            let is_positive: Vec<bool> = y_val.iter().map(|&c| c == positive).collect();
            let scores = p.column(positive).to_vec();
            let auc = roc_auc_score(&is_positive, &scores)?;
            info!(roc_auc = format!("{:.4}", auc), "Validation ROC-AUC");
            Some(auc)
        }
        (EvaluationStrategy::Binary { .. }, None) => {
            warn!("Model provides no probability estimates; ROC-AUC omitted");
            None
        }
        (EvaluationStrategy::Multiclass { .. }, _) => None,
    };

    Ok(Evaluation {
        strategy,
        classes,
        y_true: y_val.clone(),
        y_pred,
        proba,
        confusion,
        report,
        roc_auc,
    })
}
