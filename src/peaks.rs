//! Peak detection.
//!
//! Candidate peaks are local maxima that clear a noise threshold and stand
//! out from their surroundings by a minimum prominence. Each accepted peak
//! carries a FWHM estimate read off the data, which makes it a ready starting
//! point for [`fit_peaks`](crate::fitting::fit_peaks).
//!
//! 1. Noise is the median absolute deviation of all intensities, scaled by
//!    1.4826 to a Gaussian-equivalent standard deviation.
//! 2. Interior index `i` is a local maximum when `y[i-1] <= y[i] > y[i+1]`,
//!    so a flat top is reported once.
//! 3. Prominence is the peak value minus the higher of the two lowest values
//!    found scanning outward until a taller point or the end of the data.
//! 4. With `detect_edges`, the first and last points may also be peaks,
//!    judged on their single side.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::models::{PeakParameters, DEFAULT_ETA};
use crate::spectrum::Point;

/// Scale factor turning a median absolute deviation into a standard deviation.
pub const MAD_TO_SIGMA: f64 = 1.4826;

/// Peak detection options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DetectConfig {
    /// Minimum peak value in units of the noise estimate. Default: 3
    pub noise_multiplier: f64,

    /// Minimum prominence as a fraction of the largest intensity. Default: 0.05
    pub min_prominence_fraction: f64,

    /// Whether the first and last points may be reported as peaks. Default: true
    pub detect_edges: bool,
}

impl Default for DetectConfig {
    fn default() -> Self {
        Self {
            noise_multiplier: 3.0,
            min_prominence_fraction: 0.05,
            detect_edges: true,
        }
    }
}

impl DetectConfig {
    /// Set the noise multiplier.
    pub fn with_noise_multiplier(mut self, multiplier: f64) -> Self {
        self.noise_multiplier = multiplier;
        self
    }

    /// Set the minimum prominence fraction.
    pub fn with_min_prominence_fraction(mut self, fraction: f64) -> Self {
        self.min_prominence_fraction = fraction;
        self
    }

    /// Enable or disable edge peaks.
    pub fn with_detect_edges(mut self, detect_edges: bool) -> Self {
        self.detect_edges = detect_edges;
        self
    }
}

/// A peak found in the data.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DetectedPeak {
    /// Index into the spectrum used for detection
    pub index: usize,
    /// Position of the maximum
    pub x: f64,
    /// Intensity at the maximum
    pub y: f64,
    /// Full width at half maximum read off the data
    #[serde(rename = "estimatedFWHM")]
    pub estimated_fwhm: f64,
}

impl From<&DetectedPeak> for PeakParameters {
    /// Seed fit parameters from a detected peak.
    fn from(peak: &DetectedPeak) -> Self {
        PeakParameters::new(peak.x, peak.y, peak.estimated_fwhm)
            .with_eta(DEFAULT_ETA)
            .clamped()
    }
}

/// Estimate the noise level as `1.4826 * MAD` of the intensities.
///
/// Returns 0 for an empty spectrum.
pub fn estimate_noise(points: &[Point]) -> f64 {
    let values: Vec<f64> = points.iter().map(|p| p.y).collect();
    let center = median(&values);
    let deviations: Vec<f64> = values.iter().map(|v| (v - center).abs()).collect();
    MAD_TO_SIGMA * median(&deviations)
}

fn median(values: &[f64]) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let n = sorted.len();
    if n == 0 {
        return 0.0;
    }
    let mid = n / 2;
    if n % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

/// Lowest value met scanning from `peak` over `indices` until a taller point.
///
/// `None` when there is nothing to scan on that side.
fn valley<I>(values: &[f64], peak: usize, mut indices: I) -> Option<f64>
where
    I: Iterator<Item = usize>,
{
    let peak_value = values[peak];
    let first = indices.next()?;

    let mut lowest = peak_value;
    for i in std::iter::once(first).chain(indices) {
        if values[i] > peak_value {
            break;
        }
        lowest = lowest.min(values[i]);
    }
    Some(lowest)
}

/// Prominence of the peak at `index`.
///
/// Edge points only have one side to scan and are judged on it alone.
fn prominence(values: &[f64], index: usize) -> f64 {
    let left = valley(values, index, (0..index).rev());
    let right = valley(values, index, index + 1..values.len());

    let reference = match (left, right) {
        (Some(l), Some(r)) => l.max(r),
        (Some(l), None) => l,
        (None, Some(r)) => r,
        (None, None) => values[index],
    };
    values[index] - reference
}

/// Estimate the FWHM of the peak at `index`.
///
/// Each side walks outward to the first sample at or below half the peak
/// value and interpolates the crossing. A side that reaches the end of the
/// data first is extrapolated to `max(2 * distance to the end, local spacing)`.
/// A peak at or below zero has no meaningful half maximum and uses the
/// extrapolation on both sides, so the result is always finite and positive
/// for spectra with distinct x values.
fn estimate_fwhm(points: &[Point], index: usize) -> f64 {
    let n = points.len();
    let peak = points[index];
    let half_max = peak.y / 2.0;

    let spacing = if index + 1 < n {
        (points[index + 1].x - peak.x).abs()
    } else if index > 0 {
        (peak.x - points[index - 1].x).abs()
    } else {
        0.0
    };
    let resolvable = peak.y > 0.0;

    let left = (0..index)
        .rev()
        .find(|&i| resolvable && points[i].y <= half_max)
        .map(|i| {
            let (lo, hi) = (points[i], points[i + 1]);
            let frac = (half_max - lo.y) / (hi.y - lo.y);
            peak.x - (lo.x + frac * (hi.x - lo.x))
        })
        .unwrap_or_else(|| (2.0 * (peak.x - points[0].x).abs()).max(spacing));

    let right = (index + 1..n)
        .find(|&i| resolvable && points[i].y <= half_max)
        .map(|i| {
            let (hi, lo) = (points[i - 1], points[i]);
            let frac = (half_max - lo.y) / (hi.y - lo.y);
            (lo.x - frac * (lo.x - hi.x)) - peak.x
        })
        .unwrap_or_else(|| (2.0 * (points[n - 1].x - peak.x).abs()).max(spacing));

    (left + right).abs()
}

/// Find peaks in a spectrum.
///
/// Returns peaks sorted ascending by x. Spectra with fewer than three points
/// have no peaks.
pub fn detect_peaks(points: &[Point], config: &DetectConfig) -> Vec<DetectedPeak> {
    let n = points.len();
    if n < 3 {
        return Vec::new();
    }

    let values: Vec<f64> = points.iter().map(|p| p.y).collect();
    let noise = estimate_noise(points);
    let threshold = noise * config.noise_multiplier;
    let max_y = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let min_prominence = max_y * config.min_prominence_fraction;

    let accept = |i: usize| values[i] >= threshold && prominence(&values, i) >= min_prominence;

    let mut candidates: Vec<usize> = (1..n - 1)
        .filter(|&i| values[i] >= values[i - 1] && values[i] > values[i + 1])
        .collect();
    if config.detect_edges {
        if values[0] > values[1] {
            candidates.push(0);
        }
        if values[n - 1] > values[n - 2] {
            candidates.push(n - 1);
        }
    }

    let mut peaks: Vec<DetectedPeak> = candidates
        .into_iter()
        .filter(|&i| accept(i))
        .map(|i| DetectedPeak {
            index: i,
            x: points[i].x,
            y: points[i].y,
            estimated_fwhm: estimate_fwhm(points, i),
        })
        .collect();
    peaks.sort_by(|a, b| a.x.total_cmp(&b.x));

    debug!(
        "Detected {} peaks (noise = {:.4e}, threshold = {:.4e}, min prominence = {:.4e})",
        peaks.len(),
        noise,
        threshold,
        min_prominence
    );

    peaks
}
