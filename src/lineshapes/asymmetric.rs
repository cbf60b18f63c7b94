//! Asymmetric peak: split-width Lorentzian convolved with a Gaussian.
//!
//! This mimics the CasaXPS `LA(alpha, beta, m)` line shape. The Lorentzian
//! has half-width `sigma` below the centre and `sigma_r` above it; the
//! Gaussian kernel of width `gaussian_sigma` models instrumental broadening.
//! The convolved curve is rescaled so its maximum equals `amplitude`.

use ndarray::{Array1, ArrayView1};
use std::f64::consts::PI;

/// Smallest width used in place of zero.
const TINY: f64 = 1e-15;

/// The Gaussian kernel is truncated at this many standard deviations.
const KERNEL_HALF_WIDTH_SIGMAS: f64 = 5.0;

/// FWHM of a unit-sigma Gaussian divided by two.
pub const GAUSSIAN_HWHM_FACTOR: f64 = 1.17741;

/// Orientation of the energy axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnergyAxis {
    /// Energy increases with index (kinetic energy convention)
    Ascending,
    /// Energy decreases with index (binding energy convention)
    Descending,
}

impl EnergyAxis {
    /// Detect the axis orientation from the first and last samples.
    pub fn detect(x: ArrayView1<f64>) -> Self {
        match (x.first(), x.last()) {
            (Some(first), Some(last)) if last < first => EnergyAxis::Descending,
            _ => EnergyAxis::Ascending,
        }
    }

    fn sign(self) -> f64 {
        match self {
            EnergyAxis::Ascending => 1.0,
            EnergyAxis::Descending => -1.0,
        }
    }
}

/// Area-normalised split Lorentzian.
pub fn split_lorentzian(x: ArrayView1<f64>, center: f64, sigma: f64, sigma_r: f64) -> Array1<f64> {
    let s = sigma.abs().max(TINY);
    let r = sigma_r.abs().max(TINY);
    let norm = 2.0 / (PI * (s + r));

    x.mapv(|xi| {
        let d2 = (xi - center).powi(2);
        if xi < center {
            norm * s * s / (s * s + d2)
        } else {
            norm * r * r / (r * r + d2)
        }
    })
}

/// Convolve `signal`, sampled on `x`, with a centred Gaussian of width
/// `gaussian_sigma`.
///
/// The grid is treated as uniform with the mean step of `x`. Samples past
/// either end take the boundary value. `axis` fixes the sign of the energy
/// offset between neighbouring samples so the kernel is oriented along
/// energy rather than along the array index.
pub fn gaussian_convolve(
    signal: ArrayView1<f64>,
    x: ArrayView1<f64>,
    gaussian_sigma: f64,
    axis: EnergyAxis,
) -> Array1<f64> {
    let n = signal.len();
    if n < 2 || !(gaussian_sigma > 0.0) {
        return signal.to_owned();
    }

    let step = (x[n - 1] - x[0]).abs() / (n - 1) as f64;
    if step == 0.0 {
        return signal.to_owned();
    }
    let signed_step = axis.sign() * step;

    let half_width = ((KERNEL_HALF_WIDTH_SIGMAS * gaussian_sigma / step).ceil() as usize).min(n);
    let offsets: Vec<isize> = (-(half_width as isize)..=half_width as isize).collect();
    let mut weights: Vec<f64> = offsets
        .iter()
        .map(|&k| {
            let de = k as f64 * signed_step;
            (-0.5 * (de / gaussian_sigma).powi(2)).exp()
        })
        .collect();
    let total: f64 = weights.iter().sum();
    weights.iter_mut().for_each(|w| *w /= total);

    let last = (n - 1) as isize;
    Array1::from_shape_fn(n, |i| {
        offsets
            .iter()
            .zip(weights.iter())
            .map(|(&k, &w)| {
                // out(E_i) = sum_j g(E_i - E_j) s(E_j), with E_i - E_j = k * signed_step
                let j = (i as isize - k).clamp(0, last) as usize;
                w * signal[j]
            })
            .sum()
    })
}

/// Split Lorentzian convolved with a Gaussian, scaled so that its maximum
/// equals `amplitude`.
///
/// # Examples
///
/// ```
/// use ndarray::Array1;
/// use xpsfit_rs::lineshapes::asymmetric::split_lorentz_conv_gauss;
///
/// let x = Array1::linspace(280.0, 290.0, 201);
/// let y = split_lorentz_conv_gauss(x.view(), 50.0, 285.0, 0.3, 0.6, 0.2);
/// let max = y.iter().cloned().fold(f64::MIN, f64::max);
/// assert!((max - 50.0).abs() < 1e-9);
/// ```
pub fn split_lorentz_conv_gauss(
    x: ArrayView1<f64>,
    amplitude: f64,
    center: f64,
    sigma: f64,
    sigma_r: f64,
    gaussian_sigma: f64,
) -> Array1<f64> {
    let axis = EnergyAxis::detect(x);
    let lorentz = split_lorentzian(x, center, sigma, sigma_r);
    let convolved = gaussian_convolve(lorentz.view(), x, gaussian_sigma, axis);

    let peak = convolved.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    if !(peak > 0.0) || !peak.is_finite() {
        log::warn!("asymmetric peak at {center} has no positive maximum on the grid");
        return Array1::zeros(x.len());
    }

    convolved.mapv(|v| amplitude * v / peak)
}

/// FWHM of the Gaussian kernel.
pub fn gaussian_fwhm(gaussian_sigma: f64) -> f64 {
    2.0 * gaussian_sigma * GAUSSIAN_HWHM_FACTOR
}
