//! Utility functions and helpers for the peakforge-rs library.

pub mod finite_difference;
pub mod linalg;

pub use finite_difference::jacobian;
pub use linalg::solve_partial_pivot;
