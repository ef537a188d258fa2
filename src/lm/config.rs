//! Configuration options for the Levenberg-Marquardt algorithm.

use serde::{Deserialize, Serialize};

/// Configuration options for the Levenberg-Marquardt algorithm.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LmConfig {
    /// Maximum number of iterations, accepted or rejected. Default: 200
    pub max_iterations: usize,

    /// Relative chi-square improvement below which an accepted step
    /// ends the optimization. Default: 1e-6
    pub tolerance: f64,

    /// Initial value for the damping parameter. Default: 1e-3
    pub initial_lambda: f64,

    /// Factor by which to increase lambda after a rejected step. Default: 5.0
    pub lambda_up_factor: f64,

    /// Factor by which to decrease lambda after an accepted step. Default: 0.5
    pub lambda_down_factor: f64,
}

impl Default for LmConfig {
    fn default() -> Self {
        Self {
            max_iterations: 200,
            tolerance: 1e-6,
            initial_lambda: 1e-3,
            lambda_up_factor: 5.0,
            lambda_down_factor: 0.5,
        }
    }
}
