//! Iterative Shirley background
//!
//! The background at each point is proportional to the integrated
//! peak intensity lying above it on the energy axis:
//!
//! ```text
//! B(x) = B_end + (B_start - B_end) * A(x) / A_total
//! A(x) = ∫_x^{x_end} (y - B) dx
//! ```
//!
//! `B` appears on both sides, so it is solved by fixed-point iteration
//! starting from the straight line between the two endpoint intensities.

use ndarray::{s, Array1, ArrayView1};

use crate::error::{PeakFitError, Result};

/// Iteration limits for the Shirley fixed point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShirleyConfig {
    /// Stop once the largest pointwise change falls below this
    pub tolerance: f64,

    /// Hard cap on the number of iterations
    pub max_iterations: usize,
}

impl ShirleyConfig {
    /// Tolerance `1e-6`, at most 100 iterations.
    pub const DEFAULT: ShirleyConfig = ShirleyConfig {
        tolerance: 1e-6,
        max_iterations: 100,
    };

    /// Set the convergence tolerance.
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Set the iteration cap.
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }
}

impl Default for ShirleyConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Number of samples averaged at each end for a requested `avg_width`.
pub fn averaging_samples(avg_width: f64, n: usize) -> usize {
    let w = if avg_width.is_finite() {
        avg_width.round().max(1.0) as usize
    } else {
        1
    };
    if w >= n {
        (n / 3).max(1)
    } else {
        w
    }
}

/// Shirley background of `y` on the grid `x`.
///
/// `offset_low` shifts the endpoint intensity taken from the first samples,
/// `offset_high` the one taken from the last samples. Both endpoints are the
/// mean of `avg_width` samples.
pub fn shirley_background(
    x: ArrayView1<f64>,
    y: ArrayView1<f64>,
    offset_low: f64,
    offset_high: f64,
    avg_width: f64,
    config: &ShirleyConfig,
) -> Result<Array1<f64>> {
    let n = x.len();
    if y.len() != n {
        return Err(PeakFitError::DimensionMismatch(format!(
            "Shirley background needs x and y of equal length, got {} and {}",
            n,
            y.len()
        )));
    }
    if n == 0 {
        return Ok(Array1::zeros(0));
    }

    let w = averaging_samples(avg_width, n);
    let b_start = y.slice(s![..w]).mean().unwrap_or(0.0) + offset_low;
    let b_end = y.slice(s![n - w..]).mean().unwrap_or(0.0) + offset_high;

    let span = x[n - 1] - x[0];
    let mut background = Array1::from_shape_fn(n, |i| {
        let t = if span != 0.0 {
            (x[i] - x[0]) / span
        } else if n > 1 {
            i as f64 / (n - 1) as f64
        } else {
            0.0
        };
        b_start + (b_end - b_start) * t
    });
    if n < 2 {
        return Ok(background);
    }

    let mut tail = Array1::<f64>::zeros(n);
    for iteration in 0..config.max_iterations {
        // tail[i] = ∫_{x_i}^{x_end} (y - B), trapezoid rule
        tail[n - 1] = 0.0;
        for i in (0..n - 1).rev() {
            let d0 = y[i] - background[i];
            let d1 = y[i + 1] - background[i + 1];
            tail[i] = tail[i + 1] + 0.5 * (d0 + d1) * (x[i + 1] - x[i]).abs();
        }

        let total = tail[0];
        if !total.is_finite() || total.abs() <= f64::MIN_POSITIVE {
            log::warn!("Shirley background: integrated signal vanished after {iteration} iterations");
            break;
        }

        let mut delta = 0.0_f64;
        for i in 0..n {
            let updated = b_end + (b_start - b_end) * tail[i] / total;
            delta = delta.max((updated - background[i]).abs());
            background[i] = updated;
        }

        if delta < config.tolerance {
            log::debug!("Shirley background converged after {} iterations", iteration + 1);
            break;
        }
    }

    Ok(background)
}
