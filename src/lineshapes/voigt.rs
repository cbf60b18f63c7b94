//! Voigt peak in the Thompson–Cox–Hastings pseudo-Voigt approximation.

use ndarray::{Array1, ArrayView1};
use std::f64::consts::{LN_2, PI};

/// Lorentzian and Gaussian mixture `(fwhm, eta)` for the given widths.
///
/// `sigma` is the Gaussian standard deviation, `gamma` the Lorentzian
/// half width.
fn mixture(sigma: f64, gamma: f64) -> (f64, f64) {
    let fg = 2.0 * sigma.abs() * (2.0 * LN_2).sqrt();
    let fl = 2.0 * gamma.abs();

    let f = (fg.powi(5)
        + 2.69269 * fg.powi(4) * fl
        + 2.42843 * fg.powi(3) * fl.powi(2)
        + 4.47163 * fg.powi(2) * fl.powi(3)
        + 0.07842 * fg * fl.powi(4)
        + fl.powi(5))
    .powf(0.2);

    if f <= 0.0 {
        return (0.0, 0.0);
    }
    let r = fl / f;
    let eta = 1.36603 * r - 0.47719 * r * r + 0.11116 * r * r * r;
    (f, eta.clamp(0.0, 1.0))
}

fn unit_profile(d: f64, f: f64, eta: f64) -> f64 {
    let hw = 0.5 * f;
    let lorentz = hw / (PI * (d * d + hw * hw));
    let gauss = (4.0 * LN_2 / PI).sqrt() / f * (-4.0 * LN_2 * d * d / (f * f)).exp();
    eta * lorentz + (1.0 - eta) * gauss
}

/// Area-normalised pseudo-Voigt scaled by `amplitude`.
pub fn voigt(x: ArrayView1<f64>, amplitude: f64, center: f64, sigma: f64, gamma: f64) -> Array1<f64> {
    let (f, eta) = mixture(sigma, gamma);
    if f <= 0.0 {
        return Array1::zeros(x.len());
    }
    x.mapv(|xi| amplitude * unit_profile(xi - center, f, eta))
}

/// Full width at half maximum (Olivero–Longbothum).
pub fn fwhm(sigma: f64, gamma: f64) -> f64 {
    let g = gamma.abs();
    1.0692 * g + (0.8664 * g * g + 5.545083 * sigma * sigma).sqrt()
}

/// Peak height at the centre.
pub fn height(amplitude: f64, sigma: f64, gamma: f64) -> f64 {
    let (f, eta) = mixture(sigma, gamma);
    if f <= 0.0 {
        return 0.0;
    }
    amplitude * unit_profile(0.0, f, eta)
}
