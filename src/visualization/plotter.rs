//! Diagnostic plots for a fitted classifier on the validation partition

use super::canvas::{text_width, Canvas, BLACK, GLYPH_H, GRAY, WHITE};
use super::chart::{Chart, LegendPosition, Stroke};
use super::colors::{blues, class_palette, contrast_text};
use crate::config::PLOT_FILE_NAMES;
use crate::error::{PipelineError, Result};
use crate::evaluation::{precision_recall_curve, roc_curve, EvaluationStrategy, Evaluation};
use crate::training::Classifier;
use crate::utils::{column_medians, linspace};
use ndarray::{Array1, Array2};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Grid resolution of the decision boundary along each axis
pub const GRID_SIZE: usize = 200;

/// Renders decision boundary, confusion matrix, ROC and precision-recall images
#[derive(Debug, Clone)]
pub struct ResultPlotter {
    feature_names: Vec<String>,
    plot_features: [String; 2],
    width: u32,
    height: u32,
}

impl ResultPlotter {
    /// `feature_names` gives the column order of the feature matrix; both
    /// `plot_features` must be among them
    pub fn new(feature_names: Vec<String>, plot_features: [String; 2]) -> Result<Self> {
        let missing: Vec<String> = plot_features
            .iter()
            .filter(|f| !feature_names.contains(f))
            .cloned()
            .collect();
        if !missing.is_empty() {
            return Err(PipelineError::SchemaError { missing });
        }
        Ok(Self {
            feature_names,
            plot_features,
            width: 800,
            height: 600,
        })
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Write every plot into `output_dir`; returns the paths written.
    /// ROC and precision-recall plots are skipped when the evaluation has no
    /// probability estimates.
    pub fn plot(
        &self,
        model: &dyn Classifier,
        x_val: &Array2<f64>,
        evaluation: &Evaluation,
        output_dir: &Path,
    ) -> Result<Vec<PathBuf>> {
        std::fs::create_dir_all(output_dir)?;
        let [boundary_name, confusion_name, roc_name, pr_name] = PLOT_FILE_NAMES;
        let mut written = Vec::with_capacity(4);

        let path = output_dir.join(boundary_name);
        self.decision_boundary(model, x_val, evaluation)?.save(&path)?;
        written.push(path);

        let path = output_dir.join(confusion_name);
        self.confusion_matrix(evaluation).save_png(&path)?;
        written.push(path);

        match &evaluation.proba {
            Some(proba) => {
                let path = output_dir.join(roc_name);
                self.roc_curve(evaluation, proba)?.save(&path)?;
                written.push(path);

                let path = output_dir.join(pr_name);
                self.precision_recall_curve(evaluation, proba)?.save(&path)?;
                written.push(path);
            }
            None => debug!("No probability estimates; skipping ROC and precision-recall plots"),
        }

        info!(dir = %output_dir.display(), plots = written.len(), "Plots written");
        Ok(written)
    }

    fn feature_index(&self, name: &str) -> Result<usize> {
        self.feature_names
            .iter()
            .position(|f| f == name)
            .ok_or_else(|| PipelineError::missing_column(name))
    }

    /// Predicted class over a grid spanning the two plot features, with the
    /// other features held at their validation medians
    pub fn decision_grid(
        &self,
        model: &dyn Classifier,
        x_val: &Array2<f64>,
    ) -> Result<(Vec<f64>, Vec<f64>, Array2<usize>)> {
        let i0 = self.feature_index(&self.plot_features[0])?;
        let i1 = self.feature_index(&self.plot_features[1])?;
        if x_val.nrows() == 0 {
            return Err(PipelineError::PlotError("empty validation set".to_string()));
        }

        let (x_min, x_max) = min_max(x_val.column(i0).iter().copied());
        let (y_min, y_max) = min_max(x_val.column(i1).iter().copied());
        let gx = linspace(x_min - 1.0, x_max + 1.0, GRID_SIZE);
        let gy = linspace(y_min - 1.0, y_max + 1.0, GRID_SIZE);

        let medians = column_medians(x_val);
        let n_features = x_val.ncols();
        let grid = Array2::from_shape_fn((GRID_SIZE * GRID_SIZE, n_features), |(r, c)| {
            let (row, col) = (r / GRID_SIZE, r % GRID_SIZE);
            if c == i0 {
                gx[col]
            } else if c == i1 {
                gy[row]
            } else {
                medians[c]
            }
        });

        let predicted: Array1<usize> = model.predict(&grid)?;
        let z = predicted.into_shape_with_order((GRID_SIZE, GRID_SIZE))?;
        Ok((gx, gy, z))
    }

    fn decision_boundary(
        &self,
        model: &dyn Classifier,
        x_val: &Array2<f64>,
        evaluation: &Evaluation,
    ) -> Result<Chart> {
        let (gx, gy, z) = self.decision_grid(model, x_val)?;
        let palette = class_palette(evaluation.classes.len());

        let [f0, f1] = &self.plot_features;
        let title = format!("Decision Boundary on {} vs {}", f0, f1);
        let x_range = (gx[0], gx[GRID_SIZE - 1]);
        let y_range = (gy[0], gy[GRID_SIZE - 1]);
        let mut chart = Chart::new(self.width, self.height, &title, f0, f1, x_range, y_range);

        let step_x = (x_range.1 - x_range.0) / (GRID_SIZE - 1) as f64;
        let step_y = (y_range.1 - y_range.0) / (GRID_SIZE - 1) as f64;
        chart.shade(0.2, |x, y| {
            let col = nearest_index(x, x_range.0, step_x);
            let row = nearest_index(y, y_range.0, step_y);
            palette.get(z[[row, col]]).copied()
        });

        let i0 = self.feature_index(f0)?;
        let i1 = self.feature_index(f1)?;
        let xs: Vec<f64> = x_val.column(i0).to_vec();
        let ys: Vec<f64> = x_val.column(i1).to_vec();
        let colors: Vec<_> = evaluation
            .y_true
            .iter()
            .map(|&c| palette.get(c).copied().unwrap_or(GRAY))
            .collect();
        chart.scatter(&xs, &ys, &colors);
        chart.axes();

        let entries: Vec<_> = evaluation
            .classes
            .iter()
            .zip(palette.iter())
            .map(|(label, &color)| (label.clone(), color, Stroke::Solid))
            .collect();
        chart.legend(&entries, LegendPosition::UpperRight);

        Ok(chart)
    }

    /// True labels on rows, predicted labels on columns, shaded by count
    fn confusion_matrix(&self, evaluation: &Evaluation) -> Canvas {
        let mut canvas = Canvas::new(self.width, self.height, WHITE);
        let cm = &evaluation.confusion;
        let k = cm.nrows().max(1) as i64;
        let max = cm.iter().copied().max().unwrap_or(0).max(1) as f64;

        let (w, h) = (self.width as i64, self.height as i64);
        let side = (w - 200).min(h - 170).max(k);
        let cell = side / k;
        let left = (w - cell * k) / 2;
        let top = 70;

        canvas.text_centered(w / 2, 20, "Confusion Matrix", BLACK, 2);

        for t in 0..cm.nrows() {
            for p in 0..cm.ncols() {
                let count = cm[[t, p]];
                let fill = blues(count as f64 / max);
                let x0 = left + p as i64 * cell;
                let y0 = top + t as i64 * cell;
                canvas.fill_rect(x0, y0, x0 + cell, y0 + cell, fill);
                canvas.text_centered(
                    x0 + cell / 2,
                    y0 + cell / 2 - GLYPH_H as i64,
                    &count.to_string(),
                    contrast_text(fill),
                    2,
                );
            }
        }
        canvas.stroke_rect(left, top, left + cell * k, top + cell * k, BLACK);

        for (i, label) in evaluation.classes.iter().enumerate() {
            let center = i as i64 * cell + cell / 2;
            canvas.text_centered(left + center, top + cell * k + 10, label, BLACK, 1);
            let lw = text_width(label, 1) as i64;
            canvas.text(left - 10 - lw, top + center - GLYPH_H as i64 / 2, label, BLACK, 1);
        }
        canvas.text_centered(left + cell * k / 2, top + cell * k + 35, "Predicted label", BLACK, 2);
        canvas.text(left, top - 18, "True label", BLACK, 1);

        canvas
    }

    fn roc_curve(&self, evaluation: &Evaluation, proba: &Array2<f64>) -> Result<Chart> {
        let axes = ("False Positive Rate", "True Positive Rate");
        let mut entries = Vec::new();

        let mut chart = match evaluation.strategy {
            EvaluationStrategy::Binary { positive } => {
                let truth = one_vs_rest(&evaluation.y_true, positive);
                let curve = roc_curve(&truth, &proba.column(positive).to_vec())?;
                let auc = evaluation
                    .roc_auc
                    .unwrap_or_else(|| crate::evaluation::auc(&curve.x, &curve.y));
                let title = format!("ROC Curve (AUC = {:.2})", auc);
                let mut chart = self.unit_chart(&title, axes);
                let color = class_palette(2)[1];
                chart.series(&curve.x, &curve.y, color, Stroke::Solid);
                entries.push((format!("Classifier (AUC = {:.2})", auc), color, Stroke::Solid));
                chart
            }
            EvaluationStrategy::Multiclass { n_classes } => {
                let mut chart = self.unit_chart("Multiclass ROC Curves", axes);
                let palette = class_palette(n_classes);
                for (k, label) in evaluation.classes.iter().enumerate() {
                    let truth = one_vs_rest(&evaluation.y_true, k);
                    match roc_curve(&truth, &proba.column(k).to_vec()) {
                        Ok(curve) => {
                            let auc = crate::evaluation::auc(&curve.x, &curve.y);
                            chart.series(&curve.x, &curve.y, palette[k], Stroke::Solid);
                            entries.push((
                                format!("Class {} (AUC = {:.2})", label, auc),
                                palette[k],
                                Stroke::Solid,
                            ));
                        }
                        Err(e) => debug!(class = %label, error = %e, "Skipping ROC curve"),
                    }
                }
                chart
            }
        };

        chart.series(&[0.0, 1.0], &[0.0, 1.0], GRAY, Stroke::Dashed);
        entries.push(("Chance".to_string(), GRAY, Stroke::Dashed));
        chart.axes();
        chart.legend(&entries, LegendPosition::LowerRight);
        Ok(chart)
    }

    fn precision_recall_curve(&self, evaluation: &Evaluation, proba: &Array2<f64>) -> Result<Chart> {
        let axes = ("Recall", "Precision");
        let mut entries = Vec::new();

        let mut chart = match evaluation.strategy {
            EvaluationStrategy::Binary { positive } => {
                let truth = one_vs_rest(&evaluation.y_true, positive);
                let curve = precision_recall_curve(&truth, &proba.column(positive).to_vec())?;
                let mut chart = self.unit_chart("Precision-Recall Curve", axes);
                let color = class_palette(2)[1];
                chart.step_series(&curve.x, &curve.y, color);
                entries.push(("Classifier".to_string(), color, Stroke::Solid));
                chart
            }
            EvaluationStrategy::Multiclass { n_classes } => {
                let mut chart = self.unit_chart("Multiclass Precision-Recall Curves", axes);
                let palette = class_palette(n_classes);
                for (k, label) in evaluation.classes.iter().enumerate() {
                    let truth = one_vs_rest(&evaluation.y_true, k);
                    match precision_recall_curve(&truth, &proba.column(k).to_vec()) {
                        Ok(curve) => {
                            chart.step_series(&curve.x, &curve.y, palette[k]);
                            entries.push((format!("Class {}", label), palette[k], Stroke::Solid));
                        }
                        Err(e) => debug!(class = %label, error = %e, "Skipping precision-recall curve"),
                    }
                }
                chart
            }
        };

        chart.axes();
        chart.legend(&entries, LegendPosition::LowerLeft);
        Ok(chart)
    }

    fn unit_chart(&self, title: &str, (x_label, y_label): (&str, &str)) -> Chart {
        Chart::new(
            self.width,
            self.height,
            title,
            x_label,
            y_label,
            (-0.02, 1.02),
            (-0.02, 1.02),
        )
    }
}

fn one_vs_rest(y: &Array1<usize>, class: usize) -> Vec<bool> {
    y.iter().map(|&c| c == class).collect()
}

fn min_max(values: impl Iterator<Item = f64>) -> (f64, f64) {
    values
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)))
}

fn nearest_index(value: f64, start: f64, step: f64) -> usize {
    if step <= 0.0 || !value.is_finite() {
        return 0;
    }
    let idx = ((value - start) / step).round();
    idx.clamp(0.0, (GRID_SIZE - 1) as f64) as usize
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluation::evaluate;
    use crate::training::LogisticRegression;
    use ndarray::array;

    fn names(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    fn fitted() -> (LogisticRegression, Array2<f64>, Array1<usize>) {
        let x = array![
            [-2.0, -1.0, 0.5],
            [-1.5, -2.0, 0.1],
            [-1.0, -1.5, 0.3],
            [1.0, 1.5, 0.2],
            [1.5, 1.0, 0.4],
            [2.0, 2.0, 0.6]
        ];
        let y = names(&["0", "0", "0", "1", "1", "1"]);
        let mut model = LogisticRegression::new();
        model.fit(&x, &y).unwrap();
        (model, x, array![0, 0, 0, 1, 1, 1])
    }

    #[test]
    fn test_unknown_plot_feature_rejected() {
        let err = ResultPlotter::new(names(&["a", "b"]), ["a".to_string(), "z".to_string()])
            .unwrap_err();
        assert!(matches!(err, PipelineError::SchemaError { .. }));
    }

    #[test]
    fn test_decision_grid_shape_and_extent() {
        let (model, x, _) = fitted();
        let plotter =
            ResultPlotter::new(names(&["a", "b", "c"]), ["a".to_string(), "b".to_string()]).unwrap();
        let (gx, gy, z) = plotter.decision_grid(&model, &x).unwrap();

        assert_eq!(z.shape(), &[GRID_SIZE, GRID_SIZE]);
        assert_eq!(gx[0], -3.0);
        assert_eq!(gx[GRID_SIZE - 1], 3.0);
        assert_eq!(gy[0], -3.0);
        // opposite corners fall on opposite sides of the boundary
        assert_eq!(z[[0, 0]], 0);
        assert_eq!(z[[GRID_SIZE - 1, GRID_SIZE - 1]], 1);
    }

    #[test]
    fn test_plot_writes_four_images() {
        let (model, x, y) = fitted();
        let evaluation = evaluate(&model, &x, &y).unwrap();
        let plotter =
            ResultPlotter::new(names(&["a", "b", "c"]), ["a".to_string(), "b".to_string()])
                .unwrap()
                .with_size(320, 240);

        let dir = tempfile::tempdir().unwrap();
        let written = plotter.plot(&model, &x, &evaluation, dir.path()).unwrap();

        assert_eq!(written.len(), 4);
        for name in PLOT_FILE_NAMES {
            assert!(dir.path().join(name).is_file(), "missing {name}");
        }
    }

    #[test]
    fn test_confusion_matrix_is_grid_only() {
        let (model, x, y) = fitted();
        let evaluation = evaluate(&model, &x, &y).unwrap();
        let plotter =
            ResultPlotter::new(names(&["a", "b", "c"]), ["a".to_string(), "b".to_string()])
                .unwrap()
                .with_size(320, 240);

        let canvas = plotter.confusion_matrix(&evaluation);

        // 2x2 grid of 35 px cells starting at (125, 70); the diagonal holds the max count
        assert_ne!(canvas.pixel(127, 72), WHITE);
        assert!((70..140).all(|py| canvas.pixel(240, py) == WHITE));
    }

    #[test]
    fn test_no_probabilities_skips_curves() {
        let (model, x, y) = fitted();
        let mut evaluation = evaluate(&model, &x, &y).unwrap();
        evaluation.proba = None;
        let plotter =
            ResultPlotter::new(names(&["a", "b", "c"]), ["a".to_string(), "b".to_string()])
                .unwrap()
                .with_size(320, 240);

        let dir = tempfile::tempdir().unwrap();
        let written = plotter.plot(&model, &x, &evaluation, dir.path()).unwrap();

        assert_eq!(written.len(), 2);
        assert!(!dir.path().join("roc_curve.png").exists());
    }
}
