//! Per-peak metrics and tabular export of fit results.
//!
//! Everything here formats values already computed by [`fit_peaks`]; no
//! fitting or I/O happens in this module. Writing the returned strings to a
//! file is left to the caller.
//!
//! [`fit_peaks`]: crate::fitting::fit_peaks

use serde::{Deserialize, Serialize};

use crate::error::{PeakForgeError, Result};
use crate::fitting::FitResult;
use crate::models::{evaluate_sum, PeakParameters, PeakShape};
use crate::spectrum::Point;

/// Header of [`metrics_to_csv`].
pub const METRICS_CSV_HEADER: &str = "Peak#,Position,Height,FWHM,Area,Shape";

/// Header of [`fitted_curve_to_csv`].
pub const CURVE_CSV_HEADER: &str = "x,y_raw,y_fitted,residual";

/// Summary of one fitted peak.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeakMetric {
    /// 1-based peak number
    pub peak_number: usize,
    pub position: f64,
    pub height: f64,
    pub fwhm: f64,
    /// Closed-form integrated area
    pub area: f64,
    pub shape: PeakShape,
    /// Lorentzian fraction, pseudo-Voigt only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eta: Option<f64>,
}

/// Summarize every peak of a fit.
pub fn extract_metrics(result: &FitResult) -> Vec<PeakMetric> {
    result
        .peaks
        .iter()
        .enumerate()
        .map(|(i, peak)| PeakMetric {
            peak_number: i + 1,
            position: peak.x0,
            height: peak.height,
            fwhm: peak.fwhm,
            area: result.shape.area(peak),
            shape: result.shape,
            eta: (result.shape == PeakShape::PseudoVoigt).then_some(peak.eta),
        })
        .collect()
}

/// Sum of all peaks at each x, without the data.
pub fn compute_envelope(xs: &[f64], peaks: &[PeakParameters], shape: PeakShape) -> Vec<f64> {
    evaluate_sum(xs, peaks, shape)
}

/// Render metrics as CSV with four decimals per value.
///
/// Lines are separated by `\n` with no trailing newline.
pub fn metrics_to_csv(metrics: &[PeakMetric]) -> String {
    let rows = metrics.iter().map(|m| {
        format!(
            "{},{:.4},{:.4},{:.4},{:.4},{}",
            m.peak_number, m.position, m.height, m.fwhm, m.area, m.shape
        )
    });
    std::iter::once(METRICS_CSV_HEADER.to_string())
        .chain(rows)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Render the data, fitted curve and residuals as CSV with four decimals per
/// value.
///
/// # Errors
///
/// [`PeakForgeError::DimensionMismatch`] unless all three inputs have the
/// same length.
pub fn fitted_curve_to_csv(points: &[Point], fitted_y: &[f64], residuals: &[f64]) -> Result<String> {
    if fitted_y.len() != points.len() || residuals.len() != points.len() {
        return Err(PeakForgeError::DimensionMismatch(format!(
            "{} points, {} fitted values, {} residuals",
            points.len(),
            fitted_y.len(),
            residuals.len()
        )));
    }

    let rows = points
        .iter()
        .zip(fitted_y)
        .zip(residuals)
        .map(|((p, f), r)| format!("{:.4},{:.4},{:.4},{:.4}", p.x, p.y, f, r));
    Ok(std::iter::once(CURVE_CSV_HEADER.to_string())
        .chain(rows)
        .collect::<Vec<_>>()
        .join("\n"))
}

/// Render metrics as a pretty-printed JSON array.
pub fn metrics_to_json(metrics: &[PeakMetric]) -> Result<String> {
    Ok(serde_json::to_string_pretty(metrics)?)
}
