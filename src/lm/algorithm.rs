//! Implementation of the Levenberg-Marquardt algorithm.
//!
//! Each iteration evaluates the Jacobian at the current parameters, solves the
//! damped normal equations `(JᵀJ + λI) δ = -Jᵀr` and tries the step. A step
//! that lowers chi-square is accepted and halves the damping; a step that does
//! not is discarded and the damping grows fivefold. The loop ends when an
//! accepted step improves chi-square by less than the relative tolerance, or
//! when the iteration budget is spent. Both outcomes return the best state.

use log::{debug, trace};
use ndarray::{Array1, Array2};
use std::fmt;

use crate::error::{PeakForgeError, Result};
use crate::problem::Problem;
use crate::utils::linalg::solve_partial_pivot;

use super::config::LmConfig;
use super::convergence::{relative_improvement, ConvergenceStatus};

/// Pivot magnitude below which a column of the damped normal equations is
/// treated as singular.
pub const LM_PIVOT_EPSILON: f64 = 1e-20;

/// Result of the Levenberg-Marquardt optimization.
#[derive(Debug, Clone)]
pub struct LmResult {
    /// Optimized parameter values
    pub params: Array1<f64>,

    /// Residuals at the solution
    pub residuals: Array1<f64>,

    /// Sum of squared residuals
    pub cost: f64,

    /// Number of iterations performed, counting rejected steps
    pub iterations: usize,

    /// Number of residual evaluations
    pub func_evals: usize,

    /// Why the optimization stopped
    pub status: ConvergenceStatus,
}

impl fmt::Display for LmResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Optimization Result:")?;
        writeln!(f, "  Status: {}", self.status.description())?;
        writeln!(f, "  Cost: {:.6e}", self.cost)?;
        writeln!(f, "  Iterations: {}", self.iterations)?;
        writeln!(f, "  Function evaluations: {}", self.func_evals)?;
        writeln!(f, "  Parameters: {:?}", self.params)?;
        Ok(())
    }
}

/// The Levenberg-Marquardt optimizer.
#[derive(Debug, Clone, Default)]
pub struct LevenbergMarquardt {
    /// Configuration options
    config: LmConfig,
}

impl LevenbergMarquardt {
    /// Create a new Levenberg-Marquardt optimizer with default configuration.
    pub fn new() -> Self {
        Self {
            config: LmConfig::default(),
        }
    }

    /// Create a new Levenberg-Marquardt optimizer with the given configuration.
    pub fn with_config(config: LmConfig) -> Self {
        Self { config }
    }

    /// The active configuration.
    pub fn config(&self) -> &LmConfig {
        &self.config
    }

    /// Set the maximum number of iterations.
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.config.max_iterations = max_iterations;
        self
    }

    /// Set the relative chi-square tolerance.
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.config.tolerance = tolerance;
        self
    }

    /// Set the initial value for the damping parameter.
    pub fn with_lambda(mut self, lambda: f64) -> Self {
        self.config.initial_lambda = lambda;
        self
    }

    /// Set the factor by which to increase lambda.
    pub fn with_lambda_up_factor(mut self, factor: f64) -> Self {
        self.config.lambda_up_factor = factor;
        self
    }

    /// Set the factor by which to decrease lambda.
    pub fn with_lambda_down_factor(mut self, factor: f64) -> Self {
        self.config.lambda_down_factor = factor;
        self
    }

    /// Minimize the sum of squared residuals for the given problem.
    ///
    /// # Arguments
    ///
    /// * `problem` - The problem to solve
    /// * `initial_params` - Initial guess for the parameter values
    ///
    /// # Returns
    ///
    /// * `Result<LmResult>` - The best state found. Errors only come from the
    ///   problem itself (for example a dimension mismatch), never from a
    ///   failure to converge.
    pub fn minimize<P: Problem>(&self, problem: &P, initial_params: Array1<f64>) -> Result<LmResult> {
        let n_params = problem.parameter_count();
        if initial_params.len() != n_params {
            return Err(PeakForgeError::DimensionMismatch(format!(
                "Expected {} parameters, got {}",
                n_params,
                initial_params.len()
            )));
        }

        let mut params = initial_params;
        let mut lambda = self.config.initial_lambda;

        let mut residuals = problem.eval(&params)?;
        if residuals.len() != problem.residual_count() {
            return Err(PeakForgeError::DimensionMismatch(format!(
                "Expected {} residuals, got {}",
                problem.residual_count(),
                residuals.len()
            )));
        }
        let mut cost = sum_of_squares(&residuals);
        let mut func_evals = 1;

        let mut iterations = 0;
        let mut status = ConvergenceStatus::MaxIterationsReached;

        for iter in 0..self.config.max_iterations {
            iterations = iter + 1;

            let jacobian = problem.jacobian(&params)?;
            // Forward differences: the base point plus one evaluation per parameter
            func_evals += n_params + 1;

            let step = Self::calculate_step(&jacobian, &residuals, lambda);
            let new_params = &params + &step;

            let new_residuals = problem.eval(&new_params)?;
            func_evals += 1;
            let new_cost = sum_of_squares(&new_residuals);

            if new_cost < cost {
                let improvement = relative_improvement(cost, new_cost);
                params = new_params;
                residuals = new_residuals;
                cost = new_cost;
                lambda *= self.config.lambda_down_factor;
                trace!(
                    "iteration {}: accepted, cost = {:.6e}, lambda = {:.3e}",
                    iterations,
                    cost,
                    lambda
                );

                if improvement < self.config.tolerance {
                    status = ConvergenceStatus::Converged;
                    break;
                }
            } else {
                lambda *= self.config.lambda_up_factor;
                trace!(
                    "iteration {}: rejected, cost = {:.6e}, lambda = {:.3e}",
                    iterations,
                    new_cost,
                    lambda
                );
            }
        }

        debug!(
            "Levenberg-Marquardt finished after {} iterations ({}), cost = {:.6e}",
            iterations,
            status.description(),
            cost
        );

        Ok(LmResult {
            params,
            residuals,
            cost,
            iterations,
            func_evals,
            status,
        })
    }

    /// Calculate the Levenberg-Marquardt step.
    ///
    /// Solves `(JᵀJ + λI) δ = -Jᵀr`, where `J` is the Jacobian of the residuals
    /// `r`. Since residuals are `observed - model`, `-Jᵀr` equals `Jₘᵀr` for the
    /// model Jacobian `Jₘ`.
    fn calculate_step(jacobian: &Array2<f64>, residuals: &Array1<f64>, lambda: f64) -> Array1<f64> {
        let jt = jacobian.t();

        let mut a = jt.dot(jacobian);
        for i in 0..a.nrows() {
            a[[i, i]] += lambda;
        }

        let rhs = -jt.dot(residuals);

        solve_partial_pivot(a, rhs, LM_PIVOT_EPSILON)
    }
}

fn sum_of_squares(values: &Array1<f64>) -> f64 {
    values.iter().map(|r| r * r).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::problem::Problem;
    use approx::assert_relative_eq;
    use ndarray::array;

    /// A simple linear model for testing: f(x) = a * x + b
    struct LinearModel {
        x_data: Array1<f64>,
        y_data: Array1<f64>,
    }

    impl Problem for LinearModel {
        fn eval(&self, params: &Array1<f64>) -> Result<Array1<f64>> {
            let (a, b) = (params[0], params[1]);
            Ok(&self.y_data - &self.x_data.mapv(|x| a * x + b))
        }

        fn parameter_count(&self) -> usize {
            2
        }

        fn residual_count(&self) -> usize {
            self.x_data.len()
        }
    }

    /// Exponential decay: f(t) = a * exp(-k t)
    struct DecayModel {
        t: Array1<f64>,
        y: Array1<f64>,
    }

    impl Problem for DecayModel {
        fn eval(&self, params: &Array1<f64>) -> Result<Array1<f64>> {
            let (a, k) = (params[0], params[1]);
            Ok(&self.y - &self.t.mapv(|t| a * (-k * t).exp()))
        }

        fn parameter_count(&self) -> usize {
            2
        }

        fn residual_count(&self) -> usize {
            self.t.len()
        }
    }

    fn noisy_line() -> LinearModel {
        LinearModel {
            x_data: array![1.0, 2.0, 3.0, 4.0, 5.0],
            y_data: array![5.1, 7.0, 8.9, 11.2, 13.0], // Approximately 2x + 3
        }
    }

    #[test]
    fn test_linear_fit() {
        let lm = LevenbergMarquardt::new();
        let result = lm.minimize(&noisy_line(), array![1.0, 1.0]).unwrap();

        assert!(result.status.is_converged());
        assert_relative_eq!(result.params[0], 2.0, epsilon = 0.1);
        assert_relative_eq!(result.params[1], 3.0, epsilon = 0.1);
        assert!(result.cost < 0.1);
        assert_eq!(result.residuals.len(), 5);
    }

    #[test]
    fn test_decay_fit() {
        let t = Array1::<f64>::linspace(0.0, 5.0, 40);
        let y = t.mapv(|t| 3.0 * (-0.7 * t).exp());
        let problem = DecayModel { t, y };

        let result = LevenbergMarquardt::new()
            .minimize(&problem, array![1.0, 0.3])
            .unwrap();

        assert_relative_eq!(result.params[0], 3.0, epsilon = 1e-3);
        assert_relative_eq!(result.params[1], 0.7, epsilon = 1e-3);
    }

    #[test]
    fn test_iteration_budget_returns_best_state() {
        let problem = noisy_line();
        let start = problem.eval_cost(&array![1.0, 1.0]).unwrap();

        let result = LevenbergMarquardt::new()
            .with_max_iterations(1)
            .minimize(&problem, array![1.0, 1.0])
            .unwrap();

        assert_eq!(result.iterations, 1);
        assert_eq!(result.status, ConvergenceStatus::MaxIterationsReached);
        assert!(result.cost < start);
    }

    #[test]
    fn test_zero_iterations() {
        let result = LevenbergMarquardt::new()
            .with_max_iterations(0)
            .minimize(&noisy_line(), array![1.0, 1.0])
            .unwrap();

        assert_eq!(result.iterations, 0);
        assert_eq!(result.params, array![1.0, 1.0]);
    }

    #[test]
    fn test_parameter_count_mismatch() {
        let err = LevenbergMarquardt::new()
            .minimize(&noisy_line(), array![1.0])
            .unwrap_err();
        assert!(matches!(err, PeakForgeError::DimensionMismatch(_)));
    }

    #[test]
    fn test_display() {
        let result = LevenbergMarquardt::new()
            .minimize(&noisy_line(), array![1.0, 1.0])
            .unwrap();
        let text = format!("{}", result);
        assert!(text.contains("Iterations:"));
        assert!(text.contains("Cost:"));
    }
}
