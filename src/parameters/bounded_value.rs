//! Clamped scalar values
//!
//! [`BoundedValue`] is the building block of every tunable quantity in a
//! component: a value that always lies inside its `[min, max]` interval.
//! Construction from a partial specification follows a fixed set of
//! defaulting rules so that a line shape only needs to say what it knows
//! about a parameter.

use serde::{Deserialize, Serialize};

use crate::error::{PeakFitError, Result};
use crate::parameters::bounds::BoundsError;

/// A partial description of a bounded value.
///
/// Any subset of the three fields may be given; [`BoundedValue::from_spec`]
/// fills in the rest.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BoundedSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
}

impl BoundedSpec {
    /// Specification with only a value.
    pub fn value(value: f64) -> Self {
        Self {
            value: Some(value),
            ..Self::default()
        }
    }

    /// Set the lower bound.
    pub fn with_min(mut self, min: f64) -> Self {
        self.min = Some(min);
        self
    }

    /// Set the upper bound.
    pub fn with_max(mut self, max: f64) -> Self {
        self.max = Some(max);
        self
    }
}

/// A scalar clamped into `[min, max]` with `min < max`.
///
/// Every mutation keeps the invariant; rejected bound changes leave the
/// value untouched.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "BoundedSpec")]
pub struct BoundedValue {
    value: f64,
    min: f64,
    max: f64,
}

impl BoundedValue {
    /// Create a bounded value, clamping `value` into `[min, max]`.
    ///
    /// # Examples
    ///
    /// ```
    /// use xpsfit_rs::parameters::BoundedValue;
    ///
    /// let bv = BoundedValue::new(15.0, 0.0, 10.0).unwrap();
    /// assert_eq!(bv.value(), 10.0);
    /// assert!(BoundedValue::new(1.0, 2.0, 2.0).is_err());
    /// ```
    pub fn new(value: f64, min: f64, max: f64) -> std::result::Result<Self, BoundsError> {
        if !(min < max) {
            return Err(BoundsError::InvalidBounds { min, max });
        }
        if value.is_nan() {
            return Err(BoundsError::InfiniteValue);
        }

        Ok(Self {
            value: value.clamp(min, max),
            min,
            max,
        })
    }

    /// Build a bounded value from a partial specification.
    ///
    /// | given        | derived                                                    |
    /// |--------------|------------------------------------------------------------|
    /// | value        | `[min(0, 2v), max(0, 2v)]`, or `[-1, 1]` for `v == 0`      |
    /// | value, max   | `min = max - abs(2v)`                                      |
    /// | value, min   | `max = min + abs(2v)`                                      |
    /// | min, max     | value at the midpoint                                      |
    /// | min          | `max = 2·min + 1` (`0` when `min < 0`), value at midpoint  |
    /// | max          | `min = (max - 1) / 2` (`2·max` when `max < 0`), midpoint   |
    ///
    /// # Examples
    ///
    /// ```
    /// use xpsfit_rs::parameters::{BoundedSpec, BoundedValue};
    ///
    /// let bv = BoundedValue::from_spec(BoundedSpec::value(0.0)).unwrap();
    /// assert_eq!((bv.min(), bv.value(), bv.max()), (-1.0, 0.0, 1.0));
    ///
    /// let bv = BoundedValue::from_spec(BoundedSpec::default().with_min(2.0).with_max(6.0)).unwrap();
    /// assert_eq!(bv.value(), 4.0);
    /// ```
    pub fn from_spec(spec: BoundedSpec) -> Result<Self> {
        let fields = [spec.value, spec.min, spec.max];
        if fields.iter().flatten().any(|v| v.is_nan()) {
            return Err(PeakFitError::InvalidSpecification(format!(
                "NaN in bounded value specification {:?}",
                spec
            )));
        }

        let (value, min, max) = match (spec.value, spec.min, spec.max) {
            (Some(v), None, None) if v == 0.0 => (v, -1.0, 1.0),
            (Some(v), None, None) => (v, f64::min(0.0, 2.0 * v), f64::max(0.0, 2.0 * v)),
            (Some(v), None, Some(max)) => (v, max - (2.0 * v).abs(), max),
            (Some(v), Some(min), None) => (v, min, min + (2.0 * v).abs()),
            (Some(v), Some(min), Some(max)) => (v, min, max),
            (None, Some(min), max) => {
                let max = max.unwrap_or(if min >= 0.0 { (min + 0.5) * 2.0 } else { 0.0 });
                (0.5 * (min + max), min, max)
            }
            (None, None, Some(max)) => {
                let min = if max >= 0.0 { (max - 1.0) / 2.0 } else { 2.0 * max };
                (0.5 * (min + max), min, max)
            }
            (None, None, None) => {
                return Err(PeakFitError::InvalidSpecification(
                    "specification has none of \"value\", \"min\" or \"max\"".to_string(),
                ))
            }
        };

        Self::new(value, min, max).map_err(|e| {
            PeakFitError::InvalidSpecification(format!("{:?} does not yield valid bounds: {}", spec, e))
        })
    }

    /// Current value.
    pub fn value(&self) -> f64 {
        self.value
    }

    /// Lower bound.
    pub fn min(&self) -> f64 {
        self.min
    }

    /// Upper bound.
    pub fn max(&self) -> f64 {
        self.max
    }

    /// Set the value, clamping it into the bounds. NaN is ignored.
    pub fn set_value(&mut self, value: f64) {
        if !value.is_nan() {
            self.value = value.clamp(self.min, self.max);
        }
    }

    /// Copy with a new (clamped) value.
    pub fn with_value(mut self, value: f64) -> Self {
        self.set_value(value);
        self
    }

    /// Move the lower bound. Rejected unless `min < max`.
    pub fn set_min(&mut self, min: f64) -> std::result::Result<(), BoundsError> {
        self.set_bounds(min, self.max)
    }

    /// Move the upper bound. Rejected unless `max > min`.
    pub fn set_max(&mut self, max: f64) -> std::result::Result<(), BoundsError> {
        self.set_bounds(self.min, max)
    }

    /// Replace both bounds and re-clamp the value.
    pub fn set_bounds(&mut self, min: f64, max: f64) -> std::result::Result<(), BoundsError> {
        if !(min < max) {
            return Err(BoundsError::InvalidBounds { min, max });
        }
        self.min = min;
        self.max = max;
        self.value = self.value.clamp(min, max);
        Ok(())
    }

    /// Whether `v` lies inside the bounds.
    pub fn contains(&self, v: f64) -> bool {
        v >= self.min && v <= self.max
    }
}

impl TryFrom<BoundedSpec> for BoundedValue {
    type Error = PeakFitError;

    fn try_from(spec: BoundedSpec) -> Result<Self> {
        Self::from_spec(spec)
    }
}
