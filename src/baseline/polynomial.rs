//! Least-squares polynomial baselines.
//!
//! The baseline is a polynomial fitted to a subset of "basis" points that are
//! assumed to carry no signal: either caller-chosen anchors or, by default,
//! the lowest-intensity fifth of the spectrum.

use ndarray::{Array1, Array2};

use crate::spectrum::Point;
use crate::utils::linalg::solve_partial_pivot;

/// Pivot magnitude below which a normal-equations column is singular and its
/// coefficient is set to zero.
pub const POLY_PIVOT_EPSILON: f64 = 1e-15;

/// Fraction of the spectrum, by ascending intensity, used as automatic basis.
pub const AUTO_BASELINE_FRACTION: f64 = 0.2;

/// Select the lowest-intensity points as baseline basis.
///
/// Takes `max(2, floor(0.2 n))` points (never more than `n`) after a stable
/// ascending sort on y. Ties keep their input order; that ordering is an
/// implementation detail, not a guarantee.
pub fn auto_basis_points(points: &[Point]) -> Vec<Point> {
    let mut sorted = points.to_vec();
    sorted.sort_by(|a, b| a.y.total_cmp(&b.y));

    let count = ((points.len() as f64 * AUTO_BASELINE_FRACTION).floor() as usize).max(2);
    sorted.truncate(count.min(points.len()));
    sorted
}

/// Fit polynomial coefficients (constant term first) to `points`.
///
/// Solves the normal equations `(XᵀX) c = Xᵀy` of the Vandermonde basis in x.
/// Singular pivots zero their coefficient instead of failing, so the result
/// always has `degree + 1` finite-or-zero entries.
pub fn poly_fit(points: &[Point], degree: usize) -> Array1<f64> {
    let m = degree + 1;
    let mut xtx = Array2::zeros((m, m));
    let mut xty = Array1::zeros(m);

    let mut powers = vec![0.0; m];
    for p in points {
        powers[0] = 1.0;
        for j in 1..m {
            powers[j] = powers[j - 1] * p.x;
        }
        for i in 0..m {
            for j in 0..m {
                xtx[[i, j]] += powers[i] * powers[j];
            }
            xty[i] += powers[i] * p.y;
        }
    }

    solve_partial_pivot(xtx, xty, POLY_PIVOT_EPSILON)
}

/// Evaluate a polynomial (constant term first) at `x`.
pub fn poly_eval(coeffs: &Array1<f64>, x: f64) -> f64 {
    let mut value = 0.0;
    let mut x_power = 1.0;
    for &c in coeffs.iter() {
        value += c * x_power;
        x_power *= x;
    }
    value
}
