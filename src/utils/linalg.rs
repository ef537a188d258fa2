//! Dense linear solves for small systems.
//!
//! Both the polynomial baseline (normal equations of a Vandermonde basis) and
//! the Levenberg-Marquardt step solve small dense systems. They share one
//! Gaussian elimination with partial pivoting whose singular pivots are
//! skipped instead of reported: the matching unknown is set to zero.

use ndarray::{s, Array1, Array2};

/// Solve `a * x = b` by Gaussian elimination with partial pivoting.
///
/// Any pivot with magnitude below `pivot_epsilon` marks its column as
/// singular: elimination skips that column and back-substitution sets the
/// corresponding unknown to zero. The system is always solved; it never fails.
///
/// # Arguments
///
/// * `a` - Square coefficient matrix (consumed as scratch space)
/// * `b` - Right-hand side with `a.nrows()` entries
/// * `pivot_epsilon` - Pivot magnitude below which a column is singular
pub fn solve_partial_pivot(a: Array2<f64>, b: Array1<f64>, pivot_epsilon: f64) -> Array1<f64> {
    let m = b.len();
    debug_assert_eq!(a.nrows(), m);
    debug_assert_eq!(a.ncols(), m);

    // Augmented matrix [A | b]
    let mut aug = Array2::zeros((m, m + 1));
    aug.slice_mut(s![.., ..m]).assign(&a);
    aug.slice_mut(s![.., m]).assign(&b);

    for col in 0..m {
        let mut max_row = col;
        for row in col + 1..m {
            if aug[[row, col]].abs() > aug[[max_row, col]].abs() {
                max_row = row;
            }
        }
        if max_row != col {
            for j in 0..=m {
                aug.swap([col, j], [max_row, j]);
            }
        }

        let pivot = aug[[col, col]];
        if pivot.abs() < pivot_epsilon {
            continue;
        }
        for row in col + 1..m {
            let factor = aug[[row, col]] / pivot;
            for j in col..=m {
                aug[[row, j]] -= factor * aug[[col, j]];
            }
        }
    }

    let mut x = Array1::zeros(m);
    for i in (0..m).rev() {
        let mut sum = aug[[i, m]];
        for j in i + 1..m {
            sum -= aug[[i, j]] * x[j];
        }
        x[i] = if aug[[i, i]].abs() > pivot_epsilon {
            sum / aug[[i, i]]
        } else {
            0.0
        };
    }

    x
}
