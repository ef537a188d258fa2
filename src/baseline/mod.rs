//! Baseline (background) estimation.
//!
//! Two families are available:
//!
//! - **Polynomial** ([`BaselineMethod::Linear`], [`BaselineMethod::Polynomial`]):
//!   a least-squares polynomial through basis points that carry no signal.
//! - **AsLS** ([`BaselineMethod::Asls`]): asymmetric reweighted smoothing that
//!   follows curved backgrounds underneath the peaks.
//!
//! [`compute_baseline`] returns the background curve, [`correct_baseline`] the
//! background-subtracted spectrum. Neither mutates its input.

mod asls;
mod polynomial;

pub use asls::{
    second_difference_penalty, CG_DENOMINATOR_EPSILON, CG_MAX_ITERATIONS, CG_MIN_ITERATIONS,
    CG_RESIDUAL_TOLERANCE,
};
pub use polynomial::{
    auto_basis_points, poly_eval, poly_fit, AUTO_BASELINE_FRACTION, POLY_PIVOT_EPSILON,
};

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::error::{PeakForgeError, Result};
use crate::spectrum::Point;
use asls::AslsParams;

/// Baseline family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BaselineMethod {
    /// Straight line (polynomial of degree 1)
    #[default]
    Linear,
    /// Polynomial of [`BaselineConfig::degree`]
    Polynomial,
    /// Asymmetric least squares smoothing
    Asls,
}

/// Baseline estimation options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BaselineConfig {
    /// Baseline family. Default: Linear
    pub method: BaselineMethod,

    /// Polynomial degree, used by [`BaselineMethod::Polynomial`] only. Default: 2
    pub degree: usize,

    /// Indices of points to fit the polynomial through. Fewer than two falls
    /// back to automatic selection of the lowest-intensity points. Default: None
    pub anchor_indices: Option<Vec<usize>>,

    /// AsLS smoothness weight, floored at 1. Default: 1e5
    pub lambda: f64,

    /// AsLS asymmetry, clamped to `[1e-6, 0.499]`. Default: 0.001
    pub p: f64,

    /// AsLS reweighting passes, floored at 1. Default: 10
    pub iterations: usize,
}

impl Default for BaselineConfig {
    fn default() -> Self {
        Self {
            method: BaselineMethod::Linear,
            degree: 2,
            anchor_indices: None,
            lambda: 1e5,
            p: 0.001,
            iterations: 10,
        }
    }
}

impl BaselineConfig {
    /// Linear baseline through automatically selected points.
    pub fn linear() -> Self {
        Self::default()
    }

    /// Polynomial baseline of the given degree.
    pub fn polynomial(degree: usize) -> Self {
        Self {
            method: BaselineMethod::Polynomial,
            degree,
            ..Self::default()
        }
    }

    /// AsLS baseline with default smoothing parameters.
    pub fn asls() -> Self {
        Self {
            method: BaselineMethod::Asls,
            ..Self::default()
        }
    }

    /// Fit through the given point indices instead of automatic selection.
    pub fn with_anchor_indices(mut self, anchors: Vec<usize>) -> Self {
        self.anchor_indices = Some(anchors);
        self
    }

    /// Set the AsLS smoothness weight.
    pub fn with_lambda(mut self, lambda: f64) -> Self {
        self.lambda = lambda;
        self
    }

    /// Set the AsLS asymmetry.
    pub fn with_p(mut self, p: f64) -> Self {
        self.p = p;
        self
    }

    /// Set the number of AsLS reweighting passes.
    pub fn with_iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }

    /// Degree actually fitted by the polynomial family.
    fn effective_degree(&self) -> usize {
        match self.method {
            BaselineMethod::Linear => 1,
            BaselineMethod::Polynomial | BaselineMethod::Asls => self.degree,
        }
    }
}

/// Estimate the background under a spectrum.
///
/// The result has one value per input point.
///
/// # Errors
///
/// [`PeakForgeError::InvalidAnchorIndex`] if a polynomial baseline is given an
/// anchor index outside the spectrum.
pub fn compute_baseline(points: &[Point], config: &BaselineConfig) -> Result<Vec<f64>> {
    match config.method {
        BaselineMethod::Linear | BaselineMethod::Polynomial => polynomial_baseline(points, config),
        BaselineMethod::Asls => {
            let params = AslsParams::clamped(config.lambda, config.p, config.iterations);
            let y: Vec<f64> = points.iter().map(|p| p.y).collect();
            Ok(asls::asls_baseline(&y, params))
        }
    }
}

/// Subtract the estimated background from a spectrum.
///
/// Returns new points with the same x values and `y - baseline`.
pub fn correct_baseline(points: &[Point], config: &BaselineConfig) -> Result<Vec<Point>> {
    let baseline = compute_baseline(points, config)?;
    Ok(points
        .iter()
        .zip(baseline)
        .map(|(p, b)| Point::new(p.x, p.y - b))
        .collect())
}

fn polynomial_baseline(points: &[Point], config: &BaselineConfig) -> Result<Vec<f64>> {
    let degree = config.effective_degree();

    let basis: Vec<Point> = match config.anchor_indices.as_deref() {
        Some(anchors) => {
            if let Some(&index) = anchors.iter().find(|&&i| i >= points.len()) {
                return Err(PeakForgeError::InvalidAnchorIndex {
                    index,
                    len: points.len(),
                });
            }
            if anchors.len() >= 2 {
                anchors.iter().map(|&i| points[i]).collect()
            } else {
                warn!(
                    "only {} anchor indices given, need at least 2; selecting baseline points automatically",
                    anchors.len()
                );
                auto_basis_points(points)
            }
        }
        None => auto_basis_points(points),
    };

    debug!(
        "Polynomial baseline: degree {}, {} basis points of {}",
        degree,
        basis.len(),
        points.len()
    );

    let coeffs = poly_fit(&basis, degree);
    Ok(points.iter().map(|p| poly_eval(&coeffs, p.x)).collect())
}
