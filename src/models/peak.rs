//! Peak profile functions.
//!
//! Three line shapes parameterized by height `H`, center `x0` and full width
//! at half maximum `w`:
//!
//! - Gaussian: `G(x) = H * exp(-4 ln2 ((x - x0) / w)²)`
//! - Lorentzian: `L(x) = H * w² / (4 (x - x0)² + w²)`
//! - Pseudo-Voigt: `V(x) = η L(x) + (1 - η) G(x)`
//!
//! All three reach `H` at `x0` and `H / 2` at `x0 ± w / 2`, so the same
//! `(x0, height, fwhm)` triple means the same thing for every shape. Areas are
//! closed-form.

use serde::{Deserialize, Serialize};
use std::f64::consts::{LN_2, PI};
use std::fmt;

/// Lower bound applied to height and FWHM of every returned peak.
pub const PARAMETER_FLOOR: f64 = 0.001;

/// Mixing fraction used when none is given.
pub const DEFAULT_ETA: f64 = 0.5;

/// Gaussian peak value at `x`.
pub fn gaussian(x: f64, height: f64, x0: f64, fwhm: f64) -> f64 {
    let t = (x - x0) / fwhm;
    height * (-4.0 * LN_2 * t * t).exp()
}

/// Lorentzian peak value at `x`.
pub fn lorentzian(x: f64, height: f64, x0: f64, fwhm: f64) -> f64 {
    let dx = x - x0;
    height * fwhm * fwhm / (4.0 * dx * dx + fwhm * fwhm)
}

/// Pseudo-Voigt peak value at `x`; `eta` is the Lorentzian fraction.
pub fn pseudo_voigt(x: f64, height: f64, x0: f64, fwhm: f64, eta: f64) -> f64 {
    eta * lorentzian(x, height, x0, fwhm) + (1.0 - eta) * gaussian(x, height, x0, fwhm)
}

/// Area under a Gaussian peak: `H * w * sqrt(π / (4 ln2))`.
pub fn gaussian_area(height: f64, fwhm: f64) -> f64 {
    height * fwhm * (PI / (4.0 * LN_2)).sqrt()
}

/// Area under a Lorentzian peak: `H * w * π / 2`.
pub fn lorentzian_area(height: f64, fwhm: f64) -> f64 {
    height * fwhm * PI / 2.0
}

/// Area under a pseudo-Voigt peak.
pub fn pseudo_voigt_area(height: f64, fwhm: f64, eta: f64) -> f64 {
    eta * lorentzian_area(height, fwhm) + (1.0 - eta) * gaussian_area(height, fwhm)
}

/// Peak line shape, selected by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PeakShape {
    /// Gaussian profile
    #[default]
    Gaussian,
    /// Lorentzian (Cauchy) profile
    Lorentzian,
    /// Linear blend of Lorentzian and Gaussian, mixed by `eta`
    PseudoVoigt,
}

impl PeakShape {
    /// Evaluate a single peak of this shape at `x`.
    ///
    /// `eta` is only read for [`PeakShape::PseudoVoigt`].
    pub fn evaluate(self, x: f64, peak: &PeakParameters) -> f64 {
        match self {
            PeakShape::Gaussian => gaussian(x, peak.height, peak.x0, peak.fwhm),
            PeakShape::Lorentzian => lorentzian(x, peak.height, peak.x0, peak.fwhm),
            PeakShape::PseudoVoigt => pseudo_voigt(x, peak.height, peak.x0, peak.fwhm, peak.eta),
        }
    }

    /// Closed-form area of a single peak of this shape.
    pub fn area(self, peak: &PeakParameters) -> f64 {
        match self {
            PeakShape::Gaussian => gaussian_area(peak.height, peak.fwhm),
            PeakShape::Lorentzian => lorentzian_area(peak.height, peak.fwhm),
            PeakShape::PseudoVoigt => pseudo_voigt_area(peak.height, peak.fwhm, peak.eta),
        }
    }

    /// Number of free parameters per peak: `(x0, height, fwhm[, eta])`.
    pub fn stride(self) -> usize {
        match self {
            PeakShape::Gaussian | PeakShape::Lorentzian => 3,
            PeakShape::PseudoVoigt => 4,
        }
    }

    /// Name used in exported tables.
    pub fn name(self) -> &'static str {
        match self {
            PeakShape::Gaussian => "gaussian",
            PeakShape::Lorentzian => "lorentzian",
            PeakShape::PseudoVoigt => "pseudoVoigt",
        }
    }
}

impl fmt::Display for PeakShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Parameters of one peak.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PeakParameters {
    /// Center position
    pub x0: f64,
    /// Peak height above zero
    pub height: f64,
    /// Full width at half maximum
    pub fwhm: f64,
    /// Lorentzian fraction in `[0, 1]`; meaningful for pseudo-Voigt only
    pub eta: f64,
}

impl PeakParameters {
    /// Create peak parameters with the default mixing fraction.
    pub fn new(x0: f64, height: f64, fwhm: f64) -> Self {
        Self {
            x0,
            height,
            fwhm,
            eta: DEFAULT_ETA,
        }
    }

    /// Set the Lorentzian fraction.
    pub fn with_eta(mut self, eta: f64) -> Self {
        self.eta = eta;
        self
    }

    /// Copy with height and FWHM floored at [`PARAMETER_FLOOR`] and eta
    /// clamped to `[0, 1]`.
    pub fn clamped(&self) -> Self {
        Self {
            x0: self.x0,
            height: self.height.max(PARAMETER_FLOOR),
            fwhm: self.fwhm.max(PARAMETER_FLOOR),
            eta: self.eta.clamp(0.0, 1.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn integrate<F: Fn(f64) -> f64>(f: F, from: f64, to: f64, steps: usize) -> f64 {
        let dx = (to - from) / steps as f64;
        let mut sum = 0.5 * (f(from) + f(to));
        for i in 1..steps {
            sum += f(from + i as f64 * dx);
        }
        sum * dx
    }

    #[test]
    fn test_gaussian_identities() {
        assert_eq!(gaussian(3.0, 7.0, 3.0, 2.5), 7.0);
        assert_relative_eq!(gaussian(3.0 - 1.25, 7.0, 3.0, 2.5), 3.5, epsilon = 1e-5);
        assert_relative_eq!(gaussian(3.0 + 1.25, 7.0, 3.0, 2.5), 3.5, epsilon = 1e-5);
    }

    #[test]
    fn test_lorentzian_identities() {
        assert_eq!(lorentzian(-4.0, 2.0, -4.0, 0.8), 2.0);
        assert_relative_eq!(lorentzian(-4.4, 2.0, -4.0, 0.8), 1.0, epsilon = 1e-5);
        assert_relative_eq!(lorentzian(-3.6, 2.0, -4.0, 0.8), 1.0, epsilon = 1e-5);
    }

    #[test]
    fn test_pseudo_voigt_limits() {
        for &x in &[-3.0, -0.5, 0.0, 0.7, 4.2] {
            assert_relative_eq!(
                pseudo_voigt(x, 5.0, 0.0, 2.0, 0.0),
                gaussian(x, 5.0, 0.0, 2.0),
                epsilon = 1e-12
            );
            assert_relative_eq!(
                pseudo_voigt(x, 5.0, 0.0, 2.0, 1.0),
                lorentzian(x, 5.0, 0.0, 2.0),
                epsilon = 1e-12
            );
        }
    }

    #[test]
    fn test_closed_form_areas() {
        let numeric = integrate(|x| gaussian(x, 4.0, 10.0, 3.0), -40.0, 60.0, 20_000);
        assert_relative_eq!(numeric, gaussian_area(4.0, 3.0), max_relative = 0.01);

        // Lorentzian tails are heavy; integrate far out
        let numeric = integrate(|x| lorentzian(x, 4.0, 10.0, 2.0), -390.0, 410.0, 80_000);
        assert_relative_eq!(numeric, lorentzian_area(4.0, 2.0), max_relative = 0.01);

        assert_relative_eq!(
            pseudo_voigt_area(4.0, 2.0, 0.3),
            0.3 * lorentzian_area(4.0, 2.0) + 0.7 * gaussian_area(4.0, 2.0)
        );
    }

    #[test]
    fn test_shape_dispatch() {
        let peak = PeakParameters::new(1.0, 2.0, 0.5).with_eta(0.25);

        assert_eq!(PeakShape::Gaussian.evaluate(1.3, &peak), gaussian(1.3, 2.0, 1.0, 0.5));
        assert_eq!(PeakShape::Lorentzian.evaluate(1.3, &peak), lorentzian(1.3, 2.0, 1.0, 0.5));
        assert_eq!(
            PeakShape::PseudoVoigt.evaluate(1.3, &peak),
            pseudo_voigt(1.3, 2.0, 1.0, 0.5, 0.25)
        );
        assert_eq!(PeakShape::PseudoVoigt.area(&peak), pseudo_voigt_area(2.0, 0.5, 0.25));
        assert_eq!(PeakShape::Gaussian.stride(), 3);
        assert_eq!(PeakShape::PseudoVoigt.stride(), 4);
        assert_eq!(PeakShape::default(), PeakShape::Gaussian);
    }

    #[test]
    fn test_clamped() {
        let peak = PeakParameters::new(5.0, -1.0, 0.0).with_eta(1.7).clamped();
        assert_eq!(peak.x0, 5.0);
        assert_eq!(peak.height, PARAMETER_FLOOR);
        assert_eq!(peak.fwhm, PARAMETER_FLOOR);
        assert_eq!(peak.eta, 1.0);
    }

    #[test]
    fn test_shape_names() {
        assert_eq!(PeakShape::PseudoVoigt.to_string(), "pseudoVoigt");
        let json = serde_json::to_string(&PeakShape::PseudoVoigt).unwrap();
        assert_eq!(json, "\"pseudoVoigt\"");
    }
}
