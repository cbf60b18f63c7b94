//! Parameter bounds transformation
//!
//! The solver works on unconstrained internal coordinates. This module maps
//! them onto the bounded external values with Minuit-style transformations,
//! so every trial point the solver visits respects the `[min, max]` box.

use std::f64::consts::FRAC_PI_2;

use thiserror::Error;

/// Smallest internal distance a solver start keeps from a bound.
pub const BOUNDARY_NUDGE: f64 = 1e-3;

/// Errors that can occur when working with parameter bounds
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BoundsError {
    #[error("Invalid bounds: min ({min}) must be less than max ({max})")]
    InvalidBounds { min: f64, max: f64 },

    #[error("Parameter value {value} is outside bounds: [{min}, {max}]")]
    ValueOutsideBounds { value: f64, min: f64, max: f64 },

    #[error("Infinite parameter value is not allowed")]
    InfiniteValue,
}

/// Implements the Minuit-style parameter transformations for handling bounds constraints
///
/// This allows the optimizer to work with unbounded parameters internally, while the
/// external values are constrained to be within the specified bounds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundsTransform {
    min: f64,
    max: f64,
}

impl BoundsTransform {
    /// Create a new bounds transform for the box `[min, max]`.
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    fn has_lower_bound(&self) -> bool {
        self.min.is_finite()
    }

    fn has_upper_bound(&self) -> bool {
        self.max.is_finite()
    }

    /// Transform an internal parameter value to an external value
    ///
    /// # Arguments
    ///
    /// * `internal_value` - The internal parameter value
    ///
    /// # Returns
    ///
    /// The corresponding external value, constrained to be within bounds
    pub fn to_external(&self, internal_value: f64) -> f64 {
        match (self.has_lower_bound(), self.has_upper_bound()) {
            (false, false) => internal_value,
            (true, false) => self.min - 1.0 + (internal_value * internal_value + 1.0).sqrt(),
            (false, true) => self.max + 1.0 - (internal_value * internal_value + 1.0).sqrt(),
            (true, true) => {
                let value = self.min + (internal_value.sin() + 1.0) * (self.max - self.min) / 2.0;
                // sin() rounding can step a hair outside the box
                value.clamp(self.min, self.max)
            }
        }
    }

    /// Transform an external parameter value to an internal value
    ///
    /// # Arguments
    ///
    /// * `external_value` - The external parameter value
    ///
    /// # Returns
    ///
    /// The corresponding internal value, or an error if the external value is outside bounds
    pub fn to_internal(&self, external_value: f64) -> Result<f64, BoundsError> {
        if !external_value.is_finite() {
            return Err(BoundsError::InfiniteValue);
        }

        if external_value < self.min || external_value > self.max {
            return Err(BoundsError::ValueOutsideBounds {
                value: external_value,
                min: self.min,
                max: self.max,
            });
        }

        let internal = match (self.has_lower_bound(), self.has_upper_bound()) {
            (false, false) => external_value,
            (true, false) => ((external_value - self.min + 1.0).powi(2) - 1.0).sqrt(),
            (false, true) => ((self.max - external_value + 1.0).powi(2) - 1.0).sqrt(),
            (true, true) => {
                let scaled = 2.0 * (external_value - self.min) / (self.max - self.min) - 1.0;
                scaled.clamp(-1.0, 1.0).asin()
            }
        };

        Ok(internal)
    }

    /// Internal starting point for a solver.
    ///
    /// On a bound the mapping has zero slope, so a value sitting there is
    /// moved [`BOUNDARY_NUDGE`] inward in internal coordinates.
    pub fn to_internal_start(&self, external_value: f64) -> Result<f64, BoundsError> {
        let internal = self.to_internal(external_value)?;
        Ok(match (self.has_lower_bound(), self.has_upper_bound()) {
            (false, false) => internal,
            (true, false) | (false, true) => internal.max(BOUNDARY_NUDGE),
            (true, true) => internal.clamp(-FRAC_PI_2 + BOUNDARY_NUDGE, FRAC_PI_2 - BOUNDARY_NUDGE),
        })
    }
}
