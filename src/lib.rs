//! # peakforge-rs
//!
//! `peakforge-rs` analyses one-dimensional spectra: it estimates the slowly
//! varying background under a signal, locates the peaks standing on it and
//! refines them into a least-squares multi-peak model.
//!
//! The library provides:
//! - Gaussian, Lorentzian and pseudo-Voigt profiles with closed-form areas
//! - Polynomial and asymmetric least squares (AsLS) baselines
//! - Noise-aware peak detection with prominence filtering and FWHM estimates
//! - Multi-peak fitting on a reusable Levenberg-Marquardt optimizer
//! - CSV/JSON export of fit metrics
//!
//! Every operation is a pure function of its inputs. Nothing is cached and
//! nothing is mutated, so independent calls may run on any number of threads.
//!
//! ## Basic Usage
//!
//! ```
//! use peakforge_rs::{
//!     correct_baseline, detect_peaks, fit_peaks, BaselineConfig, DetectConfig, FitConfig,
//!     PeakParameters, Point,
//! };
//! use peakforge_rs::models::gaussian;
//!
//! let points: Vec<Point> = (0..300)
//!     .map(|i| {
//!         let x = i as f64 / 3.0;
//!         Point::new(x, 0.05 * x + 2.0 + gaussian(x, 10.0, 50.0, 5.0))
//!     })
//!     .collect();
//!
//! let corrected = correct_baseline(&points, &BaselineConfig::linear())?;
//! let detected = detect_peaks(&corrected, &DetectConfig::default());
//! let initial: Vec<PeakParameters> = detected.iter().map(PeakParameters::from).collect();
//! let fit = fit_peaks(&corrected, &initial, &FitConfig::default())?;
//!
//! assert!(fit.r_squared > 0.99);
//! # Ok::<(), peakforge_rs::PeakForgeError>(())
//! ```

pub mod baseline;
pub mod error;
pub mod fitting;
pub mod lm;
pub mod metrics;
pub mod models;
pub mod peaks;
pub mod problem;
pub mod spectrum;
pub mod utils;

// Re-exports for convenience
pub use baseline::{compute_baseline, correct_baseline, BaselineConfig, BaselineMethod};
pub use error::{PeakForgeError, Result};
pub use fitting::{fit_peaks, FitConfig, FitResult};
pub use lm::LevenbergMarquardt;
pub use metrics::{extract_metrics, PeakMetric};
pub use models::{PeakParameters, PeakShape};
pub use peaks::{detect_peaks, estimate_noise, DetectConfig, DetectedPeak};
pub use problem::Problem;
pub use spectrum::Point;

/// Version of the library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
