//! Peak profile models.
//!
//! Pure line-shape mathematics shared by detection seeding, fitting and
//! metrics extraction.

mod peak;

pub use peak::{
    gaussian, gaussian_area, lorentzian, lorentzian_area, pseudo_voigt, pseudo_voigt_area,
    PeakParameters, PeakShape, DEFAULT_ETA, PARAMETER_FLOOR,
};

/// Evaluate the sum of `peaks` of the given shape at every x value.
///
/// The result is index-aligned with `xs`.
pub fn evaluate_sum(xs: &[f64], peaks: &[PeakParameters], shape: PeakShape) -> Vec<f64> {
    xs.iter()
        .map(|&x| peaks.iter().map(|p| shape.evaluate(x, p)).sum())
        .collect()
}
