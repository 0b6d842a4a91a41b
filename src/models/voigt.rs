//! Voigt lineshape.
//!
//! The Voigt profile is the convolution of a Gaussian (width `sigma`) and a
//! Lorentzian (half width `gamma`). It is evaluated through the real part of
//! the Faddeeva function `w(z) = exp(-z²) erfc(-iz)`:
//!
//! f(x) = amplitude * Re[w(z)] / (sigma * sqrt(2π)),  z = (x - center + iγ) / (sigma * sqrt(2))
//!
//! which integrates to `amplitude` over the real line, as lmfit's `voigt` does.

use ndarray::Array1;
use num_complex::Complex64;
use std::f64::consts::{PI, SQRT_2};

const SQRT_2PI: f64 = 2.506_628_274_631_000_5;

/// Faddeeva function `w(z)` for `Im(z) >= 0`.
///
/// Humlíček's W4 rational approximation (JQSRT 27, 437, 1982). The relative
/// error stays below 1e-4 over the upper half plane.
pub fn faddeeva(z: Complex64) -> Complex64 {
    let x = z.re;
    let y = z.im.max(0.0);
    let t = Complex64::new(y, -x);
    let s = x.abs() + y;

    if s >= 15.0 {
        // Region I
        let u = t * t;
        t * 0.564_189_6 / (0.5 + u)
    } else if s >= 5.5 {
        // Region II
        let u = t * t;
        t * (1.410_474 + u * 0.564_189_6) / (0.75 + u * (3.0 + u))
    } else if y >= 0.195 * x.abs() - 0.176 {
        // Region III
        let numerator =
            16.4955 + t * (20.209_33 + t * (11.964_82 + t * (3.778_987 + t * 0.564_223_6)));
        let denominator = 16.4955
            + t * (38.823_63 + t * (39.271_21 + t * (21.692_74 + t * (6.699_398 + t))));
        numerator / denominator
    } else {
        // Region IV
        let u = t * t;
        let numerator = t
            * (36_183.31
                - u * (3_321.990_5
                    - u * (1_540.787 - u * (219.031_3 - u * (35.766_83 - u * (1.320_522 - u * 0.564_19))))));
        let denominator = 32_066.6
            - u * (24_322.84
                - u * (9_022.228
                    - u * (2_186.181 - u * (364.219_1 - u * (61.570_37 - u * (1.841_439 - u))))));
        u.exp() - numerator / denominator
    }
}

/// Area-normalized Voigt profile at a single energy.
///
/// A vanishing Gaussian width degenerates to a Lorentzian; with both widths
/// zero the line has no extent and evaluates to zero.
pub fn voigt(x: f64, amplitude: f64, center: f64, sigma: f64, gamma: f64) -> f64 {
    let gamma = gamma.max(0.0);
    if sigma <= f64::EPSILON {
        if gamma <= f64::EPSILON {
            return 0.0;
        }
        let dx = x - center;
        return amplitude * gamma / (PI * (dx * dx + gamma * gamma));
    }

    let scale = sigma * SQRT_2;
    let z = Complex64::new((x - center) / scale, gamma / scale);
    amplitude * faddeeva(z).re / (sigma * SQRT_2PI)
}

/// Voigt profile over an energy grid.
pub fn voigt_profile(
    energies: &Array1<f64>,
    amplitude: f64,
    center: f64,
    sigma: f64,
    gamma: f64,
) -> Array1<f64> {
    energies.mapv(|x| voigt(x, amplitude, center, sigma, gamma))
}
