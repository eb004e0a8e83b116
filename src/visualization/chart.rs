//! Cartesian chart frame: data-to-pixel mapping, axes, labels and legend

use super::canvas::{text_width, Canvas, Color, BLACK, GLYPH_H, GRAY, WHITE};
use crate::error::Result;
use std::path::Path;

const MARGIN_LEFT: i64 = 90;
const MARGIN_RIGHT: i64 = 30;
const MARGIN_TOP: i64 = 60;
const MARGIN_BOTTOM: i64 = 70;
const N_TICKS: usize = 6;

/// Where a legend box is anchored inside the plot area
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LegendPosition {
    LowerRight,
    LowerLeft,
    UpperRight,
}

/// Line style for series
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stroke {
    Solid,
    Dashed,
}

/// A chart with a rectangular plot area and linear axes
pub struct Chart {
    canvas: Canvas,
    left: i64,
    top: i64,
    right: i64,
    bottom: i64,
    x_range: (f64, f64),
    y_range: (f64, f64),
}

impl Chart {
    /// Create a chart and draw its title and axis labels
    pub fn new(
        width: u32,
        height: u32,
        title: &str,
        x_label: &str,
        y_label: &str,
        x_range: (f64, f64),
        y_range: (f64, f64),
    ) -> Self {
        let mut canvas = Canvas::new(width, height, WHITE);
        let (w, h) = (width as i64, height as i64);
        let (left, top, right, bottom) = (MARGIN_LEFT, MARGIN_TOP, w - MARGIN_RIGHT, h - MARGIN_BOTTOM);

        canvas.text_centered((left + right) / 2, 20, title, BLACK, 2);
        canvas.text_centered((left + right) / 2, h - 28, x_label, BLACK, 2);
        canvas.text(left, top - 18, y_label, BLACK, 1);

        Self {
            canvas,
            left,
            top,
            right,
            bottom,
            x_range: widen(x_range),
            y_range: widen(y_range),
        }
    }

    /// Data coordinates to pixel coordinates
    pub fn map(&self, x: f64, y: f64) -> (i64, i64) {
        let fx = (x - self.x_range.0) / (self.x_range.1 - self.x_range.0);
        let fy = (y - self.y_range.0) / (self.y_range.1 - self.y_range.0);
        let px = self.left as f64 + fx * (self.right - self.left) as f64;
        let py = self.bottom as f64 - fy * (self.bottom - self.top) as f64;
        (px.round() as i64, py.round() as i64)
    }

    /// Pixel coordinates to data coordinates
    pub fn unmap(&self, px: i64, py: i64) -> (f64, f64) {
        let fx = (px - self.left) as f64 / (self.right - self.left) as f64;
        let fy = (self.bottom - py) as f64 / (self.bottom - self.top) as f64;
        (
            self.x_range.0 + fx * (self.x_range.1 - self.x_range.0),
            self.y_range.0 + fy * (self.y_range.1 - self.y_range.0),
        )
    }

    /// Shade every pixel of the plot area with the colour returned for its
    /// data coordinates, blended at `alpha`
    pub fn shade<F>(&mut self, alpha: f64, mut color_at: F)
    where
        F: FnMut(f64, f64) -> Option<Color>,
    {
        for py in self.top..self.bottom {
            for px in self.left..self.right {
                let (x, y) = self.unmap(px, py);
                if let Some(color) = color_at(x, y) {
                    self.canvas.blend_rect(px, py, px + 1, py + 1, color, alpha);
                }
            }
        }
    }

    /// Draw a line series through data points
    pub fn series(&mut self, xs: &[f64], ys: &[f64], color: Color, stroke: Stroke) {
        let points: Vec<(i64, i64)> = xs.iter().zip(ys.iter()).map(|(&x, &y)| self.map(x, y)).collect();
        for pair in points.windows(2) {
            let dash = match stroke {
                Stroke::Solid => None,
                Stroke::Dashed => Some(6),
            };
            let ((x0, y0), (x1, y1)) = (pair[0], pair[1]);
            self.canvas.dashed_line(x0, y0, x1, y1, color, 2, dash);
        }
    }

    /// Draw a post-step series: each value holds until the next x
    pub fn step_series(&mut self, xs: &[f64], ys: &[f64], color: Color) {
        let mut sx = Vec::with_capacity(xs.len() * 2);
        let mut sy = Vec::with_capacity(ys.len() * 2);
        for i in 0..xs.len().min(ys.len()) {
            if i > 0 {
                sx.push(xs[i]);
                sy.push(ys[i - 1]);
            }
            sx.push(xs[i]);
            sy.push(ys[i]);
        }
        self.series(&sx, &sy, color, Stroke::Solid);
    }

    /// Scatter markers with a black edge
    pub fn scatter(&mut self, xs: &[f64], ys: &[f64], colors: &[Color]) {
        for ((&x, &y), &c) in xs.iter().zip(ys.iter()).zip(colors.iter()) {
            let (px, py) = self.map(x, y);
            self.canvas.circle(px, py, 5, c, Some(BLACK));
        }
    }

    /// Frame, tick marks and tick labels
    pub fn axes(&mut self) {
        self.canvas.stroke_rect(self.left, self.top, self.right, self.bottom, BLACK);

        let x_decimals = tick_decimals(self.x_range);
        let y_decimals = tick_decimals(self.y_range);
        for i in 0..N_TICKS {
            let t = i as f64 / (N_TICKS - 1) as f64;

            let xv = self.x_range.0 + t * (self.x_range.1 - self.x_range.0);
            let (px, _) = self.map(xv, self.y_range.0);
            self.canvas.line(px, self.bottom, px, self.bottom + 5, BLACK, 1);
            let label = format!("{:.*}", x_decimals, xv);
            self.canvas.text_centered(px, self.bottom + 10, &label, BLACK, 1);

            let yv = self.y_range.0 + t * (self.y_range.1 - self.y_range.0);
            let (_, py) = self.map(self.x_range.0, yv);
            self.canvas.line(self.left - 5, py, self.left, py, BLACK, 1);
            let label = format!("{:.*}", y_decimals, yv);
            let w = text_width(&label, 1) as i64;
            self.canvas.text(self.left - 10 - w, py - GLYPH_H as i64 / 2, &label, BLACK, 1);
        }
    }

    /// Legend box listing `(label, colour, stroke)` entries
    pub fn legend(&mut self, entries: &[(String, Color, Stroke)], position: LegendPosition) {
        if entries.is_empty() {
            return;
        }
        let line_h = 16;
        let swatch = 24;
        let text_w = entries
            .iter()
            .map(|(label, _, _)| text_width(label, 1) as i64)
            .max()
            .unwrap_or(0);
        let box_w = swatch + 18 + text_w;
        let box_h = entries.len() as i64 * line_h + 8;

        let (x0, y0) = match position {
            LegendPosition::LowerRight => (self.right - box_w - 10, self.bottom - box_h - 10),
            LegendPosition::LowerLeft => (self.left + 10, self.bottom - box_h - 10),
            LegendPosition::UpperRight => (self.right - box_w - 10, self.top + 10),
        };

        self.canvas.fill_rect(x0, y0, x0 + box_w, y0 + box_h, WHITE);
        self.canvas.stroke_rect(x0, y0, x0 + box_w, y0 + box_h, GRAY);
        for (i, (label, color, stroke)) in entries.iter().enumerate() {
            let cy = y0 + 4 + i as i64 * line_h + line_h / 2;
            let dash = match stroke {
                Stroke::Solid => None,
                Stroke::Dashed => Some(4),
            };
            self.canvas.dashed_line(x0 + 6, cy, x0 + 6 + swatch, cy, *color, 2, dash);
            self.canvas.text(x0 + 12 + swatch, cy - GLYPH_H as i64 / 2, label, BLACK, 1);
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        self.canvas.save_png(path)
    }
}

/// Guard against empty or inverted ranges
fn widen((lo, hi): (f64, f64)) -> (f64, f64) {
    if !(lo.is_finite() && hi.is_finite()) {
        (0.0, 1.0)
    } else if hi - lo > f64::EPSILON {
        (lo, hi)
    } else {
        (lo - 0.5, hi + 0.5)
    }
}

fn tick_decimals((lo, hi): (f64, f64)) -> usize {
    let span = (hi - lo).abs();
    if span >= 50.0 {
        0
    } else if span >= 5.0 {
        1
    } else {
        2
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chart() -> Chart {
        Chart::new(400, 300, "t", "x", "y", (0.0, 1.0), (0.0, 1.0))
    }

    #[test]
    fn test_map_corners() {
        let c = chart();
        assert_eq!(c.map(0.0, 0.0), (MARGIN_LEFT, 300 - MARGIN_BOTTOM));
        assert_eq!(c.map(1.0, 1.0), (400 - MARGIN_RIGHT, MARGIN_TOP));
    }

    #[test]
    fn test_unmap_inverts_map() {
        let c = chart();
        let (px, py) = c.map(0.25, 0.75);
        let (x, y) = c.unmap(px, py);
        assert!((x - 0.25).abs() < 0.01);
        assert!((y - 0.75).abs() < 0.01);
    }

    #[test]
    fn test_degenerate_range_widened() {
        assert_eq!(widen((2.0, 2.0)), (1.5, 2.5));
        assert_eq!(widen((f64::NAN, 1.0)), (0.0, 1.0));
    }

    #[test]
    fn test_tick_decimals() {
        assert_eq!(tick_decimals((0.0, 1.0)), 2);
        assert_eq!(tick_decimals((-4.0, 6.0)), 1);
        assert_eq!(tick_decimals((0.0, 100.0)), 0);
    }
}
