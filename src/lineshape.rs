//! Line-shape model library.
//!
//! Pure, stateless functions of `x` and named parameters. The Gaussian and
//! Lorentzian are area-normalized: for FWHM > 0 the integral over all x
//! equals `area`, so fitted areas are directly comparable across shapes.
//!
//! FWHM values must be positive; the fit engine enforces this through the
//! optimizer's bound mechanism rather than guards in these functions.

use std::f64::consts::PI;

/// Area-normalized Gaussian:
/// `area * exp(-4 ln2 ((x-center)/fwhm)^2) / (fwhm * sqrt(pi / (4 ln2)))`.
pub fn gaussian(x: f64, area: f64, center: f64, fwhm: f64) -> f64 {
    let ln2_4 = 4.0 * std::f64::consts::LN_2;
    let arg = (x - center) / fwhm;
    area * (-ln2_4 * arg * arg).exp() / (fwhm * (PI / ln2_4).sqrt())
}

/// Area-normalized Lorentzian:
/// `area * (2/pi) * fwhm / (4 (x-center)^2 + fwhm^2)`.
pub fn lorentzian(x: f64, area: f64, center: f64, fwhm: f64) -> f64 {
    let diff = x - center;
    area * 2.0 / PI * fwhm / (4.0 * diff * diff + fwhm * fwhm)
}

/// Pseudo-Voigt: linear mix of a Gaussian and a Lorentzian sharing an area
/// and center, `ratio` in [0, 1]. `ratio == 1` is the pure Gaussian,
/// `ratio == 0` the pure Lorentzian.
pub fn pseudo_voigt(
    x: f64,
    area: f64,
    center: f64,
    ratio: f64,
    g_fwhm: f64,
    l_fwhm: f64,
) -> f64 {
    ratio * gaussian(x, area, center, g_fwhm) + (1.0 - ratio) * lorentzian(x, area, center, l_fwhm)
}

/// Polynomial background `sum_i coeffs[i] * x^i`, evaluated by Horner's
/// method.
pub fn polynomial(x: f64, coeffs: &[f64]) -> f64 {
    coeffs.iter().rev().fold(0.0, |acc, &c| acc * x + c)
}
