//! Peak guessing
//!
//! A quick estimate of the dominant peak in a spectrum, used to seed
//! component parameters before a fit. The curve is smoothed with a moving
//! average, local maxima are located on the smoothed curve, and the one with
//! the largest raw intensity wins. Its half-widths are found by walking
//! outwards on the raw data until the intensity drops to half the peak.

use ndarray::{Array1, ArrayView1};
use serde::{Deserialize, Serialize};

/// The dominant peak of a spectrum.
///
/// All fields are zero when no local maximum exists.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PeakEstimate {
    /// Raw intensity at the peak
    pub amplitude: f64,
    /// Energy of the peak
    pub center: f64,
    /// Left half of the FWHM: energy distance from the centre to the
    /// half-maximum crossing on the low-index side. Not a full width.
    pub fwhm_left: f64,
    /// Right half of the FWHM, measured on the high-index side. Not a full width.
    pub fwhm_right: f64,
}

impl PeakEstimate {
    /// Whether a peak was found.
    pub fn is_found(&self) -> bool {
        *self != PeakEstimate::default()
    }

    /// Full width at half maximum.
    pub fn fwhm(&self) -> f64 {
        self.fwhm_left + self.fwhm_right
    }
}

/// Default smoothing window: `floor(min(len / 50, 5))`, at least 1.
pub fn default_window(len: usize) -> usize {
    (len / 50).min(5).max(1)
}

/// Centred moving average of width `window`.
///
/// Near the ends the average runs over the samples that exist, so a flat
/// curve stays flat.
pub fn moving_average(y: ArrayView1<f64>, window: usize) -> Array1<f64> {
    let n = y.len();
    let window = window.max(1);
    if window == 1 || n == 0 {
        return y.to_owned();
    }

    let half = window / 2;
    Array1::from_shape_fn(n, |i| {
        let lo = i.saturating_sub(half);
        let hi = (lo + window).min(n).max(i + 1);
        let slice = y.slice(ndarray::s![lo..hi]);
        slice.sum() / slice.len() as f64
    })
}

/// Indices of local maxima. A flat top counts once, at its midpoint.
/// The first and last samples are never maxima.
pub fn local_maxima(y: ArrayView1<f64>) -> Vec<usize> {
    let n = y.len();
    let mut peaks = Vec::new();
    if n < 3 {
        return peaks;
    }

    let i_max = n - 1;
    let mut i = 1;
    while i < i_max {
        if y[i - 1] < y[i] {
            let mut ahead = i + 1;
            while ahead < i_max && y[ahead] == y[i] {
                ahead += 1;
            }
            if y[ahead] < y[i] {
                peaks.push((i + ahead - 1) / 2);
                i = ahead;
            }
        }
        i += 1;
    }
    peaks
}

/// Indices where the raw curve first drops to half of `y[peak]` on each side.
pub fn half_maximum_indices(y: ArrayView1<f64>, peak: usize) -> (usize, usize) {
    let half = y[peak] / 2.0;

    let mut left = peak;
    while left > 0 && y[left] > half {
        left -= 1;
    }

    let mut right = peak;
    while right < y.len() - 1 && y[right] > half {
        right += 1;
    }

    (left, right)
}

/// Estimate the dominant peak of `(x, y)`.
///
/// # Examples
///
/// ```
/// use ndarray::Array1;
/// use xpsfit_rs::guess::estimate;
///
/// let x = Array1::linspace(0.0, 10.0, 101);
/// let y = x.mapv(|v: f64| 50.0 * (-(v - 4.0).powi(2) / 0.5).exp());
/// let est = estimate(x.view(), y.view(), None);
/// assert!((est.center - 4.0).abs() < 1e-9);
/// assert!((est.amplitude - 50.0).abs() < 1e-9);
/// ```
pub fn estimate(x: ArrayView1<f64>, y: ArrayView1<f64>, window: Option<usize>) -> PeakEstimate {
    let n = y.len().min(x.len());
    if n == 0 {
        return PeakEstimate::default();
    }
    let x = x.slice(ndarray::s![..n]);
    let y = y.slice(ndarray::s![..n]);

    let smoothed = moving_average(y, window.unwrap_or_else(|| default_window(n)));
    let best = local_maxima(smoothed.view())
        .into_iter()
        .filter(|&i| y[i].is_finite())
        .fold(None, |best: Option<usize>, i| match best {
            Some(b) if y[b] >= y[i] => Some(b),
            _ => Some(i),
        });

    let Some(peak) = best else {
        log::debug!("no local maximum in {} samples", n);
        return PeakEstimate::default();
    };

    let (left, right) = half_maximum_indices(y, peak);
    PeakEstimate {
        amplitude: y[peak],
        center: x[peak],
        fwhm_left: (x[peak] - x[left]).abs(),
        fwhm_right: (x[right] - x[peak]).abs(),
    }
}
