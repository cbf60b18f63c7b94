//! Named spectral components.
//!
//! A [`ComponentModel`] pairs a [`LineShape`] with one [`BoundedValue`] per
//! shape parameter. The component name is both its label and the prefix of
//! its parameter keys: component `"C1s"` owns `"C1s_amplitude"`,
//! `"C1s_center"`, and so on.

use ndarray::{Array1, ArrayView1};

use crate::error::{PeakFitError, Result};
use crate::events::ComponentEvent;
use crate::guess;
use crate::lineshapes::{IndependentVar, LineShape};
use crate::model::Model;
use crate::parameters::{BoundedValue, ParameterSet};

/// One parameter of a component.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ComponentParameter {
    /// Unprefixed name from the shape's hint table
    pub name: &'static str,
    /// Value and bounds
    pub bounded: BoundedValue,
    /// Whether a fit may change it
    pub vary: bool,
}

/// A named line shape with its parameter values.
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentModel {
    name: String,
    shape: LineShape,
    params: Vec<ComponentParameter>,
}

fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() || name.chars().any(char::is_whitespace) {
        return Err(PeakFitError::InvalidName(name.to_string()));
    }
    Ok(())
}

impl ComponentModel {
    /// Create a component with the shape's default parameters.
    ///
    /// Names must be non-empty and free of whitespace.
    ///
    /// # Examples
    ///
    /// ```
    /// use xpsfit_rs::component::ComponentModel;
    /// use xpsfit_rs::lineshapes::LineShape;
    ///
    /// let peak = ComponentModel::new("C1s", LineShape::AsymmetricConvolvedPeak).unwrap();
    /// assert_eq!(peak.get_parameter("C1s_amplitude").unwrap().value(), 100.0);
    /// assert!(ComponentModel::new("C 1s", LineShape::Voigt).is_err());
    /// ```
    pub fn new(name: &str, shape: LineShape) -> Result<Self> {
        validate_name(name)?;

        let params = shape
            .param_hints()
            .iter()
            .map(|hint| {
                Ok(ComponentParameter {
                    name: hint.name,
                    bounded: BoundedValue::from_spec(hint.spec)?,
                    vary: hint.vary,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            name: name.to_string(),
            shape,
            params,
        })
    }

    /// Create a component from a registry name such as `"CasaLA"`.
    pub fn from_shape_name(name: &str, shape_name: &str) -> Result<Self> {
        Self::new(name, LineShape::from_name(shape_name)?)
    }

    /// The component name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The line shape.
    pub fn shape(&self) -> LineShape {
        self.shape
    }

    /// Prefix of every parameter key.
    pub fn prefix(&self) -> String {
        format!("{}_", self.name)
    }

    /// Full key of a parameter.
    fn key(&self, short: &str) -> String {
        format!("{}_{}", self.name, short)
    }

    /// Index of the parameter addressed by a full key.
    fn position(&self, key: &str) -> Result<usize> {
        key.strip_prefix(self.name.as_str())
            .and_then(|rest| rest.strip_prefix('_'))
            .and_then(|short| self.params.iter().position(|p| p.name == short))
            .ok_or_else(|| PeakFitError::ParameterNotFound(key.to_string()))
    }

    /// Parameters in evaluation order.
    pub fn parameters(&self) -> &[ComponentParameter] {
        &self.params
    }

    /// Full keys in evaluation order.
    pub fn parameter_names(&self) -> Vec<String> {
        self.params.iter().map(|p| self.key(p.name)).collect()
    }

    /// Current values in evaluation order.
    pub fn values(&self) -> Vec<f64> {
        self.params.iter().map(|p| p.bounded.value()).collect()
    }

    /// Look up a parameter by full key.
    pub fn get_parameter(&self, key: &str) -> Result<BoundedValue> {
        Ok(self.params[self.position(key)?].bounded)
    }

    /// Replace a parameter value and bounds.
    pub fn set_parameter(&mut self, key: &str, value: BoundedValue) -> Result<ComponentEvent> {
        let i = self.position(key)?;
        self.params[i].bounded = value;
        Ok(ComponentEvent::ParameterChanged {
            component: self.name.clone(),
            parameter: key.to_string(),
            value,
        })
    }

    /// Whether a parameter is free in a fit.
    pub fn is_varying(&self, key: &str) -> Result<bool> {
        Ok(self.params[self.position(key)?].vary)
    }

    /// Free or fix a parameter.
    pub fn set_vary(&mut self, key: &str, vary: bool) -> Result<()> {
        let i = self.position(key)?;
        self.params[i].vary = vary;
        Ok(())
    }

    /// Independent variables needed by [`evaluate`](Self::evaluate).
    pub fn required_independent_variables(&self) -> &'static [IndependentVar] {
        self.shape.required_vars()
    }

    /// Rename the component. Parameter keys follow the new name.
    pub fn rename(&mut self, new_name: &str) -> Result<ComponentEvent> {
        validate_name(new_name)?;
        let old = std::mem::replace(&mut self.name, new_name.to_string());
        Ok(ComponentEvent::ComponentRenamed {
            old,
            new: self.name.clone(),
        })
    }

    /// Evaluate with the current parameter values.
    pub fn evaluate(&self, x: ArrayView1<f64>, y: Option<ArrayView1<f64>>) -> Result<Array1<f64>> {
        self.evaluate_with(&self.values(), x, y)
    }

    /// Evaluate with trial values (evaluation order) instead of the stored ones.
    pub fn evaluate_with(
        &self,
        values: &[f64],
        x: ArrayView1<f64>,
        y: Option<ArrayView1<f64>>,
    ) -> Result<Array1<f64>> {
        let needs_y = self.shape.required_vars().contains(&IndependentVar::Y);
        let y = match y {
            Some(y) if y.len() != x.len() => {
                return Err(PeakFitError::DimensionMismatch(format!(
                    "component '{}': y has {} samples, x has {}",
                    self.name,
                    y.len(),
                    x.len()
                )))
            }
            Some(y) if needs_y => Some(y),
            None if needs_y => {
                return Err(PeakFitError::MissingIndependentVariable {
                    component: self.name.clone(),
                    variable: IndependentVar::Y.name().to_string(),
                })
            }
            _ => None,
        };

        self.shape.evaluate(values, x, y)
    }

    /// Flatten into a new parameter set.
    pub fn to_parameter_set(&self) -> Result<ParameterSet> {
        let mut set = ParameterSet::new();
        self.append_to(&mut set)?;
        Ok(set)
    }

    /// Append this component's parameters to `set`.
    ///
    /// Fails with `DuplicateName` without touching `set` if any key is taken.
    pub fn append_to(&self, set: &mut ParameterSet) -> Result<()> {
        let keys = self.parameter_names();
        if let Some(taken) = keys.iter().find(|k| set.contains(k)) {
            return Err(PeakFitError::DuplicateName(taken.clone()));
        }
        for (key, p) in keys.iter().zip(self.params.iter()) {
            set.add(key, p.bounded, p.vary)?;
        }
        Ok(())
    }

    /// Read this component's values out of a flat set, in evaluation order.
    pub fn values_from(&self, set: &ParameterSet) -> Result<Vec<f64>> {
        self.params
            .iter()
            .map(|p| {
                let key = self.key(p.name);
                set.value(&key)
                    .ok_or(PeakFitError::ParameterNotFound(key))
            })
            .collect()
    }

    /// Copy values from a flat set into this component. Bounds and `vary`
    /// flags stay as they are.
    pub fn update_from_set(&mut self, set: &ParameterSet) -> Result<Vec<ComponentEvent>> {
        let values = self.values_from(set)?;
        let mut events = Vec::new();
        for (p, v) in self.params.iter_mut().zip(values) {
            if p.bounded.value() != v {
                p.bounded.set_value(v);
                events.push(ComponentEvent::ParameterChanged {
                    component: self.name.clone(),
                    parameter: format!("{}_{}", self.name, p.name),
                    value: p.bounded,
                });
            }
        }
        Ok(events)
    }

    /// Read-only quantities derived from the current values, with full keys.
    pub fn derived_values(&self) -> Vec<(String, f64)> {
        self.shape
            .derived(&self.values())
            .into_iter()
            .map(|(name, v)| (self.key(name), v))
            .collect()
    }

    /// Seed the parameters from the dominant peak of `(x, y)`.
    ///
    /// Each parameter's bounds are widened to cover the search box around
    /// its seed; bounds already wider are kept. Background shapes and
    /// spectra without a peak are left unchanged.
    pub fn guess(
        &mut self,
        x: ArrayView1<f64>,
        y: ArrayView1<f64>,
        window: Option<usize>,
    ) -> Result<Vec<ComponentEvent>> {
        if self.shape.is_background() {
            return Ok(Vec::new());
        }
        let estimate = guess::estimate(x, y, window);
        if !estimate.is_found() {
            log::warn!("component '{}': no peak found to guess from", self.name);
            return Ok(Vec::new());
        }

        // compute every new value before touching the component
        let mut updated = self.params.clone();
        for seed in self.shape.seed(&estimate) {
            let Some(p) = updated.iter_mut().find(|p| p.name == seed.name) else {
                continue;
            };
            if !seed.is_valid() {
                continue;
            }
            // existing bounds only ever grow
            let lo = p.bounded.min().min(seed.min);
            let hi = p.bounded.max().max(seed.max);
            p.bounded.set_bounds(lo, hi)?;
            p.bounded.set_value(seed.value);
        }

        let events = updated
            .iter()
            .zip(self.params.iter())
            .filter(|(new, old)| new != old)
            .map(|(new, _)| ComponentEvent::ParameterChanged {
                component: self.name.clone(),
                parameter: self.key(new.name),
                value: new.bounded,
            })
            .collect();
        self.params = updated;
        Ok(events)
    }
}

impl Model for ComponentModel {
    fn parameter_names(&self) -> Vec<String> {
        ComponentModel::parameter_names(self)
    }

    fn eval(&self, x: ArrayView1<f64>, y: Option<ArrayView1<f64>>) -> Result<Array1<f64>> {
        self.evaluate(x, y)
    }
}
