//! Classification metrics: confusion matrix, per-class report and ranking curves

use crate::error::{PipelineError, Result};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

/// Counts of true class (rows) against predicted class (columns)
pub fn confusion_matrix(y_true: &[usize], y_pred: &[usize], n_classes: usize) -> Array2<usize> {
    let mut cm = Array2::zeros((n_classes, n_classes));
    for (&t, &p) in y_true.iter().zip(y_pred.iter()) {
        if t < n_classes && p < n_classes {
            cm[[t, p]] += 1;
        }
    }
    cm
}

/// Precision, recall, F1 and support for one class or average
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassMetrics {
    pub label: String,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

/// Per-class metrics with accuracy and macro / weighted averages
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassificationReport {
    pub rows: Vec<ClassMetrics>,
    pub accuracy: f64,
    pub macro_avg: ClassMetrics,
    pub weighted_avg: ClassMetrics,
    pub total_support: usize,
}

impl ClassificationReport {
    /// Build the report over the classes that occur in `y_true` or `y_pred`.
    /// Zero divisions yield 0.0.
    pub fn new(y_true: &[usize], y_pred: &[usize], classes: &[String]) -> Self {
        let cm = confusion_matrix(y_true, y_pred, classes.len());
        let total = y_true.len();

        let rows: Vec<ClassMetrics> = (0..classes.len())
            .filter(|&k| cm.row(k).sum() + cm.column(k).sum() > 0)
            .map(|k| {
                let tp = cm[[k, k]] as f64;
                let support = cm.row(k).sum();
                let predicted = cm.column(k).sum();
                let precision = safe_div(tp, predicted as f64);
                let recall = safe_div(tp, support as f64);
                ClassMetrics {
                    label: classes[k].clone(),
                    precision,
                    recall,
                    f1: safe_div(2.0 * precision * recall, precision + recall),
                    support,
                }
            })
            .collect();

        let correct: usize = (0..classes.len()).map(|k| cm[[k, k]]).sum();
        let n_rows = rows.len() as f64;
        let macro_avg = ClassMetrics {
            label: "macro avg".to_string(),
            precision: safe_div(rows.iter().map(|r| r.precision).sum(), n_rows),
            recall: safe_div(rows.iter().map(|r| r.recall).sum(), n_rows),
            f1: safe_div(rows.iter().map(|r| r.f1).sum(), n_rows),
            support: total,
        };
        let weight = |f: fn(&ClassMetrics) -> f64| {
            safe_div(
                rows.iter().map(|r| f(r) * r.support as f64).sum(),
                total as f64,
            )
        };
        let weighted_avg = ClassMetrics {
            label: "weighted avg".to_string(),
            precision: weight(|r| r.precision),
            recall: weight(|r| r.recall),
            f1: weight(|r| r.f1),
            support: total,
        };

        Self {
            accuracy: safe_div(correct as f64, total as f64),
            rows,
            macro_avg,
            weighted_avg,
            total_support: total,
        }
    }

    /// Plain-text table with two decimals, right-aligned columns
    pub fn render(&self) -> String {
        let width = self
            .rows
            .iter()
            .map(|r| r.label.chars().count())
            .chain(std::iter::once("weighted avg".len()))
            .max()
            .unwrap_or(12);

        let mut out = String::new();
        let _ = writeln!(
            out,
            "{:>width$}  {:>9} {:>9} {:>9} {:>9}",
            "",
            "precision",
            "recall",
            "f1-score",
            "support",
            width = width
        );
        out.push('\n');

        for row in &self.rows {
            write_row(&mut out, row, width);
        }
        out.push('\n');

        let _ = writeln!(
            out,
            "{:>width$}  {:>9} {:>9} {:>9.2} {:>9}",
            "accuracy",
            "",
            "",
            self.accuracy,
            self.total_support,
            width = width
        );
        write_row(&mut out, &self.macro_avg, width);
        write_row(&mut out, &self.weighted_avg, width);
        out
    }
}

fn write_row(out: &mut String, row: &ClassMetrics, width: usize) {
    let _ = writeln!(
        out,
        "{:>width$}  {:>9.2} {:>9.2} {:>9.2} {:>9}",
        row.label,
        row.precision,
        row.recall,
        row.f1,
        row.support,
        width = width
    );
}

fn safe_div(num: f64, den: f64) -> f64 {
    if den == 0.0 {
        0.0
    } else {
        num / den
    }
}

/// Points of a ranking curve plus the score thresholds that produce them
#[derive(Debug, Clone, PartialEq)]
pub struct Curve {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub thresholds: Vec<f64>,
}

/// Cumulative false / true positive counts at each distinct score, high to low
fn binary_clf_curve(positive: &[bool], scores: &[f64]) -> (Vec<f64>, Vec<f64>, Vec<f64>) {
    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));

    let mut fps = Vec::new();
    let mut tps = Vec::new();
    let mut thresholds = Vec::new();
    let (mut tp, mut fp) = (0.0, 0.0);

    for (pos, &i) in order.iter().enumerate() {
        if positive[i] {
            tp += 1.0;
        } else {
            fp += 1.0;
        }
        let last_of_value = order
            .get(pos + 1)
            .map_or(true, |&next| scores[next] != scores[i]);
        if last_of_value {
            tps.push(tp);
            fps.push(fp);
            thresholds.push(scores[i]);
        }
    }
    (fps, tps, thresholds)
}

fn check_both_classes(positive: &[bool]) -> Result<()> {
    let n_pos = positive.iter().filter(|p| **p).count();
    if n_pos == 0 || n_pos == positive.len() {
        return Err(PipelineError::DataError(
            "only one class present in y_true; ranking metrics are undefined".to_string(),
        ));
    }
    Ok(())
}

/// Receiver operating characteristic: `x` is the false positive rate and
/// `y` the true positive rate. Collinear intermediate points are dropped.
pub fn roc_curve(positive: &[bool], scores: &[f64]) -> Result<Curve> {
    check_both_classes(positive)?;
    let (fps, tps, thr) = binary_clf_curve(positive, scores);

    // keep endpoints and every corner of the staircase
    let n = fps.len();
    let keep: Vec<usize> = (0..n)
        .filter(|&i| {
            i == 0
                || i == n - 1
                || (fps[i + 1] - 2.0 * fps[i] + fps[i - 1]) != 0.0
                || (tps[i + 1] - 2.0 * tps[i] + tps[i - 1]) != 0.0
        })
        .collect();

    let fp_total = fps[n - 1];
    let tp_total = tps[n - 1];
    let mut x = vec![0.0];
    let mut y = vec![0.0];
    let mut thresholds = vec![f64::INFINITY];
    for &i in &keep {
        x.push(fps[i] / fp_total);
        y.push(tps[i] / tp_total);
        thresholds.push(thr[i]);
    }

    Ok(Curve { x, y, thresholds })
}

/// Precision-recall pairs: `x` is recall and `y` precision, ordered by
/// decreasing threshold and ending at recall 0, precision 1.
pub fn precision_recall_curve(positive: &[bool], scores: &[f64]) -> Result<Curve> {
    check_both_classes(positive)?;
    let (fps, tps, thr) = binary_clf_curve(positive, scores);
    let tp_total = tps[tps.len() - 1];

    let mut x: Vec<f64> = tps.iter().rev().map(|tp| tp / tp_total).collect();
    let mut y: Vec<f64> = tps
        .iter()
        .zip(fps.iter())
        .rev()
        .map(|(tp, fp)| safe_div(*tp, tp + fp))
        .collect();
    let thresholds: Vec<f64> = thr.into_iter().rev().collect();
    x.push(0.0);
    y.push(1.0);

    Ok(Curve { x, y, thresholds })
}

/// Area under a curve by the trapezoidal rule
pub fn auc(x: &[f64], y: &[f64]) -> f64 {
    x.windows(2)
        .zip(y.windows(2))
        .map(|(xs, ys)| (xs[1] - xs[0]) * (ys[0] + ys[1]) / 2.0)
        .sum()
}

/// Area under the ROC curve for binary labels
pub fn roc_auc_score(positive: &[bool], scores: &[f64]) -> Result<f64> {
    let curve = roc_curve(positive, scores)?;
    Ok(auc(&curve.x, &curve.y))
}
