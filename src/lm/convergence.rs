//! Convergence reporting for the Levenberg-Marquardt optimizer.
//!
//! Running out of iterations is a normal outcome, not an error: the best
//! state found so far is returned together with the status that ended the
//! loop.

use serde::{Deserialize, Serialize};

/// Why the optimizer stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ConvergenceStatus {
    /// An accepted step improved chi-square by less than the tolerance.
    Converged,

    /// The iteration budget ran out first.
    MaxIterationsReached,
}

impl ConvergenceStatus {
    /// Returns true if the optimization has converged.
    pub fn is_converged(&self) -> bool {
        matches!(self, ConvergenceStatus::Converged)
    }

    /// Returns a description of the convergence status.
    pub fn description(&self) -> &'static str {
        match self {
            ConvergenceStatus::Converged => "Converged: small relative chi-square change",
            ConvergenceStatus::MaxIterationsReached => "Terminated: maximum iterations reached",
        }
    }
}

/// Relative chi-square improvement of an accepted step.
pub fn relative_improvement(cost: f64, new_cost: f64) -> f64 {
    (cost - new_cost).abs() / (cost + 1e-20)
}
