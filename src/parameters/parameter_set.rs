//! Flat parameter set shared by all components of a joint fit
//!
//! Components flatten their bounded values into a [`ParameterSet`] keyed by
//! prefixed names (`"C1s_center"`). The solver sees only the varying entries,
//! mapped through [`BoundsTransform`] so that every trial point stays inside
//! the box constraints.

use ndarray::Array1;
use serde::{Deserialize, Serialize};

use crate::error::{PeakFitError, Result};
use crate::parameters::bounded_value::BoundedValue;
use crate::parameters::bounds::BoundsTransform;

/// One entry of a flat parameter set.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParameterEntry {
    /// Current value and bounds
    pub bounded: BoundedValue,

    /// Whether the solver may change this parameter
    pub vary: bool,
}

impl ParameterEntry {
    /// Current value.
    pub fn value(&self) -> f64 {
        self.bounded.value()
    }

    fn transform(&self) -> BoundsTransform {
        BoundsTransform::new(self.bounded.min(), self.bounded.max())
    }
}

/// An insertion-ordered collection of named parameter entries.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawParameterSet")]
pub struct ParameterSet {
    entries: Vec<(String, ParameterEntry)>,
}

// Serialized layout before names are checked
#[derive(Deserialize)]
struct RawParameterSet {
    entries: Vec<(String, ParameterEntry)>,
}

impl TryFrom<RawParameterSet> for ParameterSet {
    type Error = PeakFitError;

    fn try_from(raw: RawParameterSet) -> Result<Self> {
        let mut set = ParameterSet::new();
        for (name, entry) in raw.entries {
            set.add(&name, entry.bounded, entry.vary)?;
        }
        Ok(set)
    }
}

impl ParameterSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a parameter. Fails with `DuplicateName` if the key is taken.
    ///
    /// # Examples
    ///
    /// ```
    /// use xpsfit_rs::parameters::{BoundedValue, ParameterSet};
    ///
    /// let mut set = ParameterSet::new();
    /// set.add("p1_center", BoundedValue::new(284.8, 280.0, 290.0).unwrap(), true).unwrap();
    /// assert!(set.add("p1_center", BoundedValue::new(1.0, 0.0, 2.0).unwrap(), true).is_err());
    /// assert_eq!(set.len(), 1);
    /// ```
    pub fn add(&mut self, name: &str, bounded: BoundedValue, vary: bool) -> Result<()> {
        if self.contains(name) {
            return Err(PeakFitError::DuplicateName(name.to_string()));
        }
        self.entries
            .push((name.to_string(), ParameterEntry { bounded, vary }));
        Ok(())
    }

    /// Look up an entry.
    pub fn get(&self, name: &str) -> Option<&ParameterEntry> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, e)| e)
    }

    /// Current value of an entry.
    pub fn value(&self, name: &str) -> Option<f64> {
        self.get(name).map(ParameterEntry::value)
    }

    /// Whether the set contains `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|(n, _)| n == name)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry names in insertion order.
    pub fn names(&self) -> Vec<String> {
        self.entries.iter().map(|(n, _)| n.clone()).collect()
    }

    /// Iterate over `(name, entry)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParameterEntry)> {
        self.entries.iter().map(|(n, e)| (n.as_str(), e))
    }

    /// All values in insertion order.
    pub fn values(&self) -> Vec<f64> {
        self.entries.iter().map(|(_, e)| e.value()).collect()
    }

    /// Names of the varying entries, in solver order.
    pub fn varying_names(&self) -> Vec<String> {
        self.entries
            .iter()
            .filter(|(_, e)| e.vary)
            .map(|(n, _)| n.clone())
            .collect()
    }

    /// Number of varying entries.
    pub fn varying_count(&self) -> usize {
        self.entries.iter().filter(|(_, e)| e.vary).count()
    }

    /// Internal (unbounded) coordinates of the varying entries, usable as a
    /// solver start. Values sitting on a bound start just inside it.
    pub fn varying_internal_values(&self) -> Result<Array1<f64>> {
        self.entries
            .iter()
            .filter(|(_, e)| e.vary)
            .map(|(_, e)| e.transform().to_internal_start(e.value()).map_err(PeakFitError::from))
            .collect::<Result<Vec<f64>>>()
            .map(Array1::from_vec)
    }

    /// A copy of this set with the varying entries moved to the given
    /// internal coordinates. `self` is not modified.
    pub fn with_internal_values(&self, internal: &[f64]) -> Result<Self> {
        let n_varying = self.varying_count();
        if internal.len() != n_varying {
            return Err(PeakFitError::DimensionMismatch(format!(
                "Expected {} values for varying parameters, got {}",
                n_varying,
                internal.len()
            )));
        }

        let mut updated = self.clone();
        let mut values = internal.iter();
        for (_, entry) in updated.entries.iter_mut().filter(|(_, e)| e.vary) {
            if let Some(&v) = values.next() {
                let external = entry.transform().to_external(v);
                entry.bounded.set_value(external);
            }
        }
        Ok(updated)
    }

    /// Replace the value of an existing entry, keeping its bounds.
    pub fn set_value(&mut self, name: &str, value: f64) -> Result<()> {
        let entry = self
            .entries
            .iter_mut()
            .find(|(n, _)| n == name)
            .map(|(_, e)| e)
            .ok_or_else(|| PeakFitError::ParameterNotFound(name.to_string()))?;
        entry.bounded.set_value(value);
        Ok(())
    }

    /// Serialize the set to a JSON string.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Deserialize a set from a JSON string.
    ///
    /// Fails with `DuplicateName` if a name appears twice.
    pub fn from_json(json: &str) -> Result<Self> {
        let raw: RawParameterSet = serde_json::from_str(json)?;
        Self::try_from(raw)
    }
}
