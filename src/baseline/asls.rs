//! Asymmetric least squares (AsLS) baselines.
//!
//! Minimizes `Σ wᵢ (yᵢ - zᵢ)² + λ Σ (Δ²z)ᵢ²` over the background `z` by
//! iterative reweighting. Points above the current background get the small
//! weight `p`, points on or below it get `1 - p`, so the background settles
//! under the peaks along the lower envelope of the data.
//!
//! Each reweighting pass solves `(W + λ DᵀD) z = W y` with conjugate gradients.
//! `DᵀD` is applied through its five-point stencil; no matrix is formed.

use log::{debug, trace};
use ndarray::Array1;

/// Minimum number of conjugate-gradient iterations per solve.
pub const CG_MIN_ITERATIONS: usize = 60;

/// Maximum number of conjugate-gradient iterations per solve.
pub const CG_MAX_ITERATIONS: usize = 500;

/// Residual norm, normalized by `sqrt(n)`, at which the solve stops.
pub const CG_RESIDUAL_TOLERANCE: f64 = 1e-8;

/// Search-direction curvature below which the solve stops.
pub const CG_DENOMINATOR_EPSILON: f64 = 1e-20;

/// Clamped AsLS parameters.
#[derive(Debug, Clone, Copy)]
pub(crate) struct AslsParams {
    pub lambda: f64,
    pub p: f64,
    pub iterations: usize,
}

impl AslsParams {
    /// Apply the parameter floors and clamps.
    pub fn clamped(lambda: f64, p: f64, iterations: usize) -> Self {
        Self {
            lambda: lambda.max(1.0),
            p: p.clamp(1e-6, 0.499),
            iterations: iterations.max(1),
        }
    }
}

/// Multiply `v` by `DᵀD`, where `D` is the second-difference operator.
///
/// Interior rows use `v[i-2] - 4v[i-1] + 6v[i] - 4v[i+1] + v[i+2]`; the two
/// rows at each end use the truncated coefficients of a second difference
/// that does not extend past the data. Fewer than three points have no
/// second difference and yield zeros.
pub fn second_difference_penalty(v: &Array1<f64>) -> Array1<f64> {
    let n = v.len();
    let mut out = Array1::zeros(n);

    match n {
        0..=2 => {}
        3 => {
            let d = v[0] - 2.0 * v[1] + v[2];
            out[0] = d;
            out[1] = -2.0 * d;
            out[2] = d;
        }
        _ => {
            out[0] = v[0] - 2.0 * v[1] + v[2];
            out[1] = -2.0 * v[0] + 5.0 * v[1] - 4.0 * v[2] + v[3];
            for i in 2..n - 2 {
                out[i] = v[i - 2] - 4.0 * v[i - 1] + 6.0 * v[i] - 4.0 * v[i + 1] + v[i + 2];
            }
            out[n - 2] = v[n - 4] - 4.0 * v[n - 3] + 5.0 * v[n - 2] - 2.0 * v[n - 1];
            out[n - 1] = v[n - 3] - 2.0 * v[n - 2] + v[n - 1];
        }
    }

    out
}

/// Apply `W + λ DᵀD` to `v`.
fn apply_system(weights: &Array1<f64>, lambda: f64, v: &Array1<f64>) -> Array1<f64> {
    let mut out = second_difference_penalty(v);
    out *= lambda;
    out += &(weights * v);
    out
}

/// Solve `(W + λ DᵀD) z = W y` by conjugate gradients, starting from `seed`.
///
/// Returns the solution and the number of iterations used.
pub(crate) fn solve_penalized(
    y: &Array1<f64>,
    weights: &Array1<f64>,
    lambda: f64,
    seed: Array1<f64>,
) -> (Array1<f64>, usize) {
    let n = y.len();
    let b = weights * y;
    let mut x = seed;

    let mut r = &b - &apply_system(weights, lambda, &x);
    let mut p = r.clone();
    let mut rs_old = r.dot(&r);
    if rs_old < CG_DENOMINATOR_EPSILON {
        return (x, 0);
    }

    let max_iterations = n.max(CG_MIN_ITERATIONS).min(CG_MAX_ITERATIONS);
    let mut used = 0;
    for _ in 0..max_iterations {
        let ap = apply_system(weights, lambda, &p);
        let denom = p.dot(&ap);
        if denom.abs() < CG_DENOMINATOR_EPSILON {
            break;
        }
        used += 1;

        let alpha = rs_old / denom;
        x.scaled_add(alpha, &p);
        r.scaled_add(-alpha, &ap);

        let rs_new = r.dot(&r);
        if (rs_new / n as f64).sqrt() < CG_RESIDUAL_TOLERANCE {
            break;
        }

        let beta = rs_new / rs_old;
        p = &r + &(p * beta);
        rs_old = rs_new;
    }

    (x, used)
}

/// Estimate an AsLS background for `y`.
///
/// Fewer than three points are returned unchanged.
pub(crate) fn asls_baseline(y: &[f64], params: AslsParams) -> Vec<f64> {
    let n = y.len();
    if n < 3 {
        return y.to_vec();
    }

    debug!(
        "AsLS baseline: n = {}, lambda = {:e}, p = {}, iterations = {}",
        n, params.lambda, params.p, params.iterations
    );

    let y = Array1::from(y.to_vec());
    let mut weights = Array1::ones(n);
    let mut baseline = y.clone();

    for iter in 0..params.iterations {
        let (solution, cg_iterations) = solve_penalized(&y, &weights, params.lambda, baseline);
        baseline = solution;

        let mut above = 0;
        for i in 0..n {
            weights[i] = if y[i] > baseline[i] {
                above += 1;
                params.p
            } else {
                1.0 - params.p
            };
        }
        trace!(
            "AsLS pass {}: {} conjugate-gradient iterations, {} points above baseline",
            iter + 1,
            cg_iterations,
            above
        );
    }

    baseline.to_vec()
}
