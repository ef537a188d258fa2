//! Multi-peak fitting.
//!
//! The model is a sum of peaks of one caller-selected [`PeakShape`]. Peak
//! parameters are packed into a flat vector of `(x0, height, fwhm)` triplets,
//! with `eta` appended per peak for pseudo-Voigt, and refined by
//! [`LevenbergMarquardt`] against the data.
//!
//! Unpacking always floors height and FWHM at [`PARAMETER_FLOOR`] and clamps
//! eta to `[0, 1]`, so every trial vector the optimizer proposes describes a
//! valid model.
//!
//! # Example
//!
//! ```
//! use peakforge_rs::fitting::{fit_peaks, FitConfig};
//! use peakforge_rs::models::{gaussian, PeakParameters};
//! use peakforge_rs::spectrum::Point;
//!
//! let points: Vec<Point> = (0..200)
//!     .map(|i| {
//!         let x = i as f64 * 0.5;
//!         Point::new(x, gaussian(x, 10.0, 50.0, 5.0))
//!     })
//!     .collect();
//!
//! let initial = [PeakParameters::new(48.0, 8.0, 6.0)];
//! let result = fit_peaks(&points, &initial, &FitConfig::default()).unwrap();
//!
//! assert!(result.r_squared > 0.99);
//! assert!((result.peaks[0].x0 - 50.0).abs() < 0.5);
//! ```

use log::debug;
use ndarray::Array1;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{PeakForgeError, Result};
use crate::lm::{LevenbergMarquardt, LmConfig};
use crate::models::{evaluate_sum, PeakParameters, PeakShape, DEFAULT_ETA, PARAMETER_FLOOR};
use crate::problem::Problem;
use crate::spectrum::{self, Point};

/// Peak fitting options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FitConfig {
    /// Line shape of every peak. Default: Gaussian
    pub shape: PeakShape,

    /// Maximum number of optimizer iterations, accepted or rejected. Default: 200
    pub max_iterations: usize,

    /// Relative chi-square improvement that counts as converged. Default: 1e-6
    pub tolerance: f64,
}

impl Default for FitConfig {
    fn default() -> Self {
        Self {
            shape: PeakShape::Gaussian,
            max_iterations: 200,
            tolerance: 1e-6,
        }
    }
}

impl FitConfig {
    /// Default options for the given shape.
    pub fn new(shape: PeakShape) -> Self {
        Self {
            shape,
            ..Self::default()
        }
    }

    /// Set the maximum number of iterations.
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Set the convergence tolerance.
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    fn lm_config(&self) -> LmConfig {
        LmConfig {
            max_iterations: self.max_iterations,
            tolerance: self.tolerance,
            ..LmConfig::default()
        }
    }
}

/// Outcome of a fit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FitResult {
    /// Refined peaks, in the order they were supplied
    pub peaks: Vec<PeakParameters>,
    /// Line shape used
    pub shape: PeakShape,
    /// Coefficient of determination
    pub r_squared: f64,
    /// `y - fitted_y` per input point
    pub residuals: Vec<f64>,
    /// Model value per input point
    pub fitted_y: Vec<f64>,
    /// Optimizer iterations used
    pub iterations: usize,
}

impl fmt::Display for FitResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Fit Result ({}):", self.shape)?;
        writeln!(f, "  R²: {:.6}", self.r_squared)?;
        writeln!(f, "  Iterations: {}", self.iterations)?;
        for (i, peak) in self.peaks.iter().enumerate() {
            write!(
                f,
                "  Peak {}: x0 = {:.4}, height = {:.4}, fwhm = {:.4}",
                i + 1,
                peak.x0,
                peak.height,
                peak.fwhm
            )?;
            if self.shape == PeakShape::PseudoVoigt {
                write!(f, ", eta = {:.4}", peak.eta)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Least-squares problem of a sum of peaks against observed data.
pub struct MultiPeakProblem {
    xs: Vec<f64>,
    ys: Array1<f64>,
    shape: PeakShape,
    n_peaks: usize,
}

impl MultiPeakProblem {
    /// Create a problem fitting `n_peaks` peaks of `shape` to `points`.
    pub fn new(points: &[Point], shape: PeakShape, n_peaks: usize) -> Self {
        Self {
            xs: spectrum::xs(points),
            ys: Array1::from(spectrum::ys(points)),
            shape,
            n_peaks,
        }
    }

    /// Flatten peaks into a parameter vector.
    ///
    /// Values are taken as given; the floors only apply on [`unpack`](Self::unpack).
    pub fn pack(&self, peaks: &[PeakParameters]) -> Array1<f64> {
        let mut params = Vec::with_capacity(peaks.len() * self.shape.stride());
        for peak in peaks {
            params.extend_from_slice(&[peak.x0, peak.height, peak.fwhm]);
            if self.shape == PeakShape::PseudoVoigt {
                params.push(peak.eta);
            }
        }
        Array1::from(params)
    }

    /// Rebuild clamped peaks from a parameter vector.
    pub fn unpack(&self, params: &Array1<f64>) -> Result<Vec<PeakParameters>> {
        let stride = self.shape.stride();
        if params.len() != self.n_peaks * stride {
            return Err(PeakForgeError::DimensionMismatch(format!(
                "Expected {} parameters for {} peaks, got {}",
                self.n_peaks * stride,
                self.n_peaks,
                params.len()
            )));
        }

        let values = params.to_vec();
        let peaks = values
            .chunks(stride)
            .map(|chunk| {
                let eta = if stride == 4 { chunk[3] } else { DEFAULT_ETA };
                PeakParameters {
                    x0: chunk[0],
                    height: chunk[1].max(PARAMETER_FLOOR),
                    fwhm: chunk[2].max(PARAMETER_FLOOR),
                    eta: eta.clamp(0.0, 1.0),
                }
            })
            .collect();
        Ok(peaks)
    }

    /// Model values at every x for the given parameter vector.
    pub fn model(&self, params: &Array1<f64>) -> Result<Vec<f64>> {
        let peaks = self.unpack(params)?;
        Ok(evaluate_sum(&self.xs, &peaks, self.shape))
    }
}

impl Problem for MultiPeakProblem {
    fn eval(&self, params: &Array1<f64>) -> Result<Array1<f64>> {
        let model = Array1::from(self.model(params)?);
        Ok(&self.ys - &model)
    }

    fn parameter_count(&self) -> usize {
        self.n_peaks * self.shape.stride()
    }

    fn residual_count(&self) -> usize {
        self.ys.len()
    }
}

/// Coefficient of determination of `residuals` against `ys`.
///
/// Constant (or empty) data has no variance to explain and yields 1.
pub fn r_squared(ys: &[f64], residuals: &[f64]) -> f64 {
    if ys.is_empty() {
        return 1.0;
    }
    let mean = ys.iter().sum::<f64>() / ys.len() as f64;
    let ss_tot: f64 = ys.iter().map(|y| (y - mean).powi(2)).sum();
    if ss_tot == 0.0 {
        return 1.0;
    }
    let chi2: f64 = residuals.iter().map(|r| r * r).sum();
    1.0 - chi2 / ss_tot
}

/// Refine `initial` peaks against `points`.
///
/// Not converging within the iteration budget is not an error: the best
/// state found is returned and its quality shows in `r_squared`.
///
/// # Errors
///
/// Only a malformed problem (parameter or residual count mismatch) fails.
pub fn fit_peaks(points: &[Point], initial: &[PeakParameters], config: &FitConfig) -> Result<FitResult> {
    let problem = MultiPeakProblem::new(points, config.shape, initial.len());
    let start = problem.pack(initial);

    let (params, iterations) = if initial.is_empty() {
        (start, 0)
    } else {
        let result = LevenbergMarquardt::with_config(config.lm_config()).minimize(&problem, start)?;
        debug!(
            "Fitted {} {} peaks to {} points: {} ({} iterations)",
            initial.len(),
            config.shape,
            points.len(),
            result.status.description(),
            result.iterations
        );
        (result.params, result.iterations)
    };

    let peaks = problem.unpack(&params)?;
    let fitted_y = evaluate_sum(&spectrum::xs(points), &peaks, config.shape);
    let residuals: Vec<f64> = points.iter().zip(&fitted_y).map(|(p, f)| p.y - f).collect();

    Ok(FitResult {
        r_squared: r_squared(&spectrum::ys(points), &residuals),
        peaks,
        shape: config.shape,
        residuals,
        fitted_y,
        iterations,
    })
}
