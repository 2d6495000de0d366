use super::config::ColoringMode;
use crate::core::color::gradient::{Gradient, Rgb};
use crate::core::models::fold::PerBaseStats;

/// The scalar a residue is colored by, before clamping.
pub fn coloring_value(mode: ColoringMode, pi: f64, paired: bool) -> f64 {
    match mode {
        ColoringMode::PairedOnly if !paired => 1.0 - pi,
        _ => pi,
    }
}

/// Per-residue coloring decisions, indexed 0-based.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorAssignment {
    /// Mode-adjusted values as written to the renderer's data block; may lie outside `[0, 1]`.
    pub values: Vec<f64>,
    pub colors: Vec<Rgb>,
}

impl ColorAssignment {
    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }
}

/// Colors every residue through `gradient`, clamping values into `[0, 1]` before lookup.
pub fn assign_colors(stats: &PerBaseStats, mode: ColoringMode, gradient: &Gradient) -> ColorAssignment {
    let values: Vec<f64> = stats
        .pi
        .iter()
        .zip(&stats.paired)
        .map(|(&pi, &paired)| coloring_value(mode, pi, paired))
        .collect();
    let colors = values
        .iter()
        .map(|&value| gradient.sample(value.clamp(0.0, 1.0)))
        .collect();
    ColorAssignment { values, colors }
}
