//! Visualization module: PNG diagnostics for a fitted classifier.

pub mod canvas;
pub mod chart;
pub mod colors;
mod plotter;

pub use canvas::{Canvas, Color};
pub use chart::{Chart, LegendPosition, Stroke};
pub use colors::{blues, class_palette};
pub use plotter::{ResultPlotter, GRID_SIZE};
