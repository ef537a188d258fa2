//! Finite difference methods for numerical differentiation.
//!
//! This module provides the forward-difference Jacobian used by the
//! Levenberg-Marquardt optimizer when a problem has no analytical derivatives.

use crate::error::{PeakForgeError, Result};
use crate::problem::Problem;
use ndarray::{Array1, Array2};

/// Relative (and minimum absolute) step size for forward differences.
pub const FINITE_DIFFERENCE_STEP: f64 = 1e-7;

/// Compute the Jacobian matrix using forward finite differences.
///
/// The Jacobian is the matrix of partial derivatives of the residuals with
/// respect to the parameters: J[i,j] = ∂residual[i]/∂param[j]. Each parameter
/// is perturbed by `h = max(epsilon, |param| * epsilon)`, costing one extra
/// residual evaluation per parameter.
///
/// # Arguments
///
/// * `problem` - The problem to evaluate
/// * `params` - The parameter values at which to evaluate the Jacobian
/// * `epsilon` - The step size for finite differences (optional)
///
/// # Returns
///
/// * `Result<Array2<f64>>` - The Jacobian matrix
pub fn jacobian(
    problem: &dyn Problem,
    params: &Array1<f64>,
    epsilon: Option<f64>,
) -> Result<Array2<f64>> {
    let eps = epsilon.unwrap_or(FINITE_DIFFERENCE_STEP);
    let n_params = params.len();
    let n_residuals = problem.residual_count();

    // Evaluate residuals at the initial point
    let residuals = problem.eval(params)?;

    if residuals.len() != n_residuals {
        return Err(PeakForgeError::DimensionMismatch(format!(
            "Expected {} residuals, got {}",
            n_residuals,
            residuals.len()
        )));
    }

    let mut jac = Array2::zeros((n_residuals, n_params));

    for j in 0..n_params {
        let mut params_perturbed = params.clone();

        // Adapt epsilon to parameter scale
        let h = eps.max(params[j].abs() * eps);
        params_perturbed[j] += h;

        let residuals_perturbed = problem.eval(&params_perturbed)?;

        for i in 0..n_residuals {
            jac[[i, j]] = (residuals_perturbed[i] - residuals[i]) / h;
        }
    }

    Ok(jac)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    // Test problem: r1 = x^2 - 1, r2 = y^2 - 2
    struct TestProblem;

    impl Problem for TestProblem {
        fn eval(&self, params: &Array1<f64>) -> Result<Array1<f64>> {
            let x = params[0];
            let y = params[1];
            Ok(array![x.powi(2) - 1.0, y.powi(2) - 2.0])
        }

        fn parameter_count(&self) -> usize {
            2
        }

        fn residual_count(&self) -> usize {
            2
        }
    }

    // Reports one residual more than it returns
    struct Miscounted;

    impl Problem for Miscounted {
        fn eval(&self, _params: &Array1<f64>) -> Result<Array1<f64>> {
            Ok(array![0.0])
        }

        fn parameter_count(&self) -> usize {
            1
        }

        fn residual_count(&self) -> usize {
            2
        }
    }

    #[test]
    fn test_jacobian() {
        // Analytical Jacobian at (2, 3): [[4, 0], [0, 6]]
        let params = array![2.0, 3.0];
        let jac = jacobian(&TestProblem, &params, None).unwrap();

        assert_eq!(jac.shape(), &[2, 2]);
        assert_relative_eq!(jac[[0, 0]], 4.0, epsilon = 1e-5);
        assert_relative_eq!(jac[[0, 1]], 0.0, epsilon = 1e-5);
        assert_relative_eq!(jac[[1, 0]], 0.0, epsilon = 1e-5);
        assert_relative_eq!(jac[[1, 1]], 6.0, epsilon = 1e-5);
    }

    #[test]
    fn test_jacobian_at_zero_uses_absolute_step() {
        // d(x^2)/dx at 0 is 0, but a forward step of h = 1e-7 reports h
        let jac = jacobian(&TestProblem, &array![0.0, 0.0], None).unwrap();
        assert_relative_eq!(jac[[0, 0]], FINITE_DIFFERENCE_STEP, epsilon = 1e-8);
    }

    #[test]
    fn test_dimension_mismatch() {
        let err = jacobian(&Miscounted, &array![1.0], None).unwrap_err();
        assert!(matches!(err, PeakForgeError::DimensionMismatch(_)));
    }
}
