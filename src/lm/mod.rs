//! Levenberg-Marquardt algorithm implementation.
//!
//! This module provides a damped Gauss-Newton optimizer for nonlinear
//! least-squares problems described by the [`Problem`](crate::problem::Problem)
//! trait. Peak fitting is built on top of it.

pub mod algorithm;
pub mod config;
pub mod convergence;

// Re-export key types
pub use algorithm::{LevenbergMarquardt, LmResult, LM_PIVOT_EPSILON};
pub use config::LmConfig;
pub use convergence::ConvergenceStatus;
