//! Spectrum data points.
//!
//! A spectrum is an ordered slice of [`Point`]s, sorted ascending by `x`.
//! Every operation in this crate borrows the slice and returns freshly
//! allocated results that are index-aligned with it.

use serde::{Deserialize, Serialize};

/// A single `(x, y)` sample of a spectrum.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Abscissa (wavenumber, energy, angle, ...)
    pub x: f64,
    /// Intensity
    pub y: f64,
}

impl Point {
    /// Create a new point.
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

/// Collect the x values of a spectrum.
pub fn xs(points: &[Point]) -> Vec<f64> {
    points.iter().map(|p| p.x).collect()
}

/// Collect the y values of a spectrum.
pub fn ys(points: &[Point]) -> Vec<f64> {
    points.iter().map(|p| p.y).collect()
}
