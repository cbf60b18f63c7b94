//! Composite envelope
//!
//! [`CompositeCollection`] keeps an ordered set of uniquely named
//! components. Insertion order is drawing order. Evaluating the collection
//! sums every component into the envelope.
//!
//! After [`refresh`](CompositeCollection::refresh) the collection also
//! caches each component's curve and the envelope for one data set. A
//! parameter change then re-evaluates only the affected component and
//! patches the envelope with the difference. Adding, removing and renaming
//! keep the cache consistent the same way.

use std::collections::HashSet;

use ndarray::{Array1, ArrayView1};

use crate::component::ComponentModel;
use crate::error::{PeakFitError, Result};
use crate::events::{ComponentEvent, ObserverId, Observers};
use crate::model::Model;
use crate::parameters::{BoundedValue, ParameterSet};

#[derive(Debug, Clone)]
struct EnvelopeCache {
    x: Array1<f64>,
    y: Option<Array1<f64>>,
    curves: Vec<Array1<f64>>,
    envelope: Array1<f64>,
}

impl EnvelopeCache {
    fn evaluate(&self, component: &ComponentModel) -> Result<Array1<f64>> {
        component.evaluate(self.x.view(), self.y.as_ref().map(|y| y.view()))
    }
}

/// Ordered collection of uniquely named components.
#[derive(Debug, Default)]
pub struct CompositeCollection {
    components: Vec<ComponentModel>,
    // curves[i] belongs to components[i]
    cache: Option<EnvelopeCache>,
    observers: Observers,
}

impl CompositeCollection {
    /// Create an empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of components.
    pub fn len(&self) -> usize {
        self.components.len()
    }

    /// Whether the collection is empty.
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Component names in drawing order.
    pub fn names(&self) -> Vec<&str> {
        self.components.iter().map(ComponentModel::name).collect()
    }

    /// Components in drawing order.
    pub fn components(&self) -> &[ComponentModel] {
        &self.components
    }

    /// Look up a component.
    pub fn get(&self, name: &str) -> Option<&ComponentModel> {
        self.components.iter().find(|c| c.name() == name)
    }

    fn position(&self, name: &str) -> Result<usize> {
        self.components
            .iter()
            .position(|c| c.name() == name)
            .ok_or_else(|| PeakFitError::NotFound(name.to_string()))
    }

    // first key `component` would own under `name` that another component already owns
    fn colliding_key(&self, name: &str, component: &ComponentModel, skip: Option<usize>) -> Option<String> {
        let taken: HashSet<String> = self
            .components
            .iter()
            .enumerate()
            .filter(|(j, _)| Some(*j) != skip)
            .flat_map(|(_, c)| c.parameter_names())
            .collect();
        component
            .parameters()
            .iter()
            .map(|p| format!("{}_{}", name, p.name))
            .find(|key| taken.contains(key))
    }

    /// Register a change observer.
    pub fn subscribe<F>(&mut self, callback: F) -> ObserverId
    where
        F: FnMut(&ComponentEvent) + 'static,
    {
        self.observers.subscribe(callback)
    }

    /// Remove a change observer.
    pub fn unsubscribe(&mut self, id: ObserverId) -> bool {
        self.observers.unsubscribe(id)
    }

    /// Append a component.
    pub fn add(&mut self, component: ComponentModel) -> Result<()> {
        if self.get(component.name()).is_some() {
            return Err(PeakFitError::DuplicateName(component.name().to_string()));
        }
        if let Some(key) = self.colliding_key(component.name(), &component, None) {
            return Err(PeakFitError::DuplicateName(key));
        }

        if let Some(cache) = self.cache.as_mut() {
            match cache.evaluate(&component) {
                Ok(curve) => {
                    cache.envelope += &curve;
                    cache.curves.push(curve);
                }
                Err(e) => {
                    log::warn!("dropping cached envelope: {}", e);
                    self.cache = None;
                }
            }
        }

        let event = ComponentEvent::ComponentAdded {
            component: component.name().to_string(),
        };
        self.components.push(component);
        self.observers.notify(&event);
        Ok(())
    }

    /// Remove and return a component.
    pub fn remove(&mut self, name: &str) -> Result<ComponentModel> {
        let i = self.position(name)?;
        let component = self.components.remove(i);

        if let Some(cache) = self.cache.as_mut() {
            let curve = cache.curves.remove(i);
            cache.envelope -= &curve;
        }

        self.observers.notify(&ComponentEvent::ComponentRemoved {
            component: name.to_string(),
        });
        Ok(component)
    }

    /// Rename a component, keeping its position.
    pub fn rename(&mut self, old: &str, new: &str) -> Result<()> {
        let i = self.position(old)?;
        if old != new && self.get(new).is_some() {
            return Err(PeakFitError::DuplicateName(new.to_string()));
        }
        if let Some(key) = self.colliding_key(new, &self.components[i], Some(i)) {
            return Err(PeakFitError::DuplicateName(key));
        }
        let event = self.components[i].rename(new)?;
        self.observers.notify(&event);
        Ok(())
    }

    /// Replace one parameter of one component.
    ///
    /// With a cached envelope only this component is re-evaluated.
    pub fn set_parameter(&mut self, component: &str, key: &str, value: BoundedValue) -> Result<()> {
        let i = self.position(component)?;

        // evaluate on a copy first so a failure leaves everything untouched
        let mut updated = self.components[i].clone();
        let event = updated.set_parameter(key, value)?;
        let curve = match self.cache.as_ref() {
            Some(cache) => Some(cache.evaluate(&updated)?),
            None => None,
        };

        self.components[i] = updated;
        if let (Some(cache), Some(curve)) = (self.cache.as_mut(), curve) {
            cache.envelope += &(&curve - &cache.curves[i]);
            cache.curves[i] = curve;
        }

        self.observers.notify(&event);
        Ok(())
    }

    /// Free or fix one parameter. The curves do not change.
    pub fn set_vary(&mut self, component: &str, key: &str, vary: bool) -> Result<()> {
        let i = self.position(component)?;
        self.components[i].set_vary(key, vary)
    }

    /// Seed one component from the dominant peak of `(x, y)`.
    pub fn guess(
        &mut self,
        component: &str,
        x: ArrayView1<f64>,
        y: ArrayView1<f64>,
        window: Option<usize>,
    ) -> Result<()> {
        let i = self.position(component)?;
        let events = self.components[i].guess(x, y, window)?;
        self.refresh_one(i)?;
        for event in &events {
            self.observers.notify(event);
        }
        Ok(())
    }

    /// Sum of all components at `x`. Each component gets `y` only if it needs it.
    pub fn evaluate_envelope(
        &self,
        x: ArrayView1<f64>,
        y: Option<ArrayView1<f64>>,
    ) -> Result<Array1<f64>> {
        let mut envelope = Array1::zeros(x.len());
        for component in &self.components {
            envelope += &component.evaluate(x, y)?;
        }
        Ok(envelope)
    }

    /// Curve of a single component.
    pub fn evaluate_one(
        &self,
        name: &str,
        x: ArrayView1<f64>,
        y: Option<ArrayView1<f64>>,
    ) -> Result<Array1<f64>> {
        self.components[self.position(name)?].evaluate(x, y)
    }

    /// Re-evaluate everything at `(x, y)` and cache the result.
    pub fn refresh(&mut self, x: ArrayView1<f64>, y: Option<ArrayView1<f64>>) -> Result<&Array1<f64>> {
        let curves = self
            .components
            .iter()
            .map(|c| c.evaluate(x, y))
            .collect::<Result<Vec<_>>>()?;
        let mut envelope = Array1::zeros(x.len());
        for curve in &curves {
            envelope += curve;
        }

        let cache = self.cache.insert(EnvelopeCache {
            x: x.to_owned(),
            y: y.map(|y| y.to_owned()),
            curves,
            envelope,
        });
        Ok(&cache.envelope)
    }

    fn refresh_one(&mut self, i: usize) -> Result<()> {
        if let Some(cache) = self.cache.as_mut() {
            let curve = cache.evaluate(&self.components[i])?;
            cache.envelope += &(&curve - &cache.curves[i]);
            cache.curves[i] = curve;
        }
        Ok(())
    }

    /// Cached envelope from the last [`refresh`](Self::refresh), kept current since.
    pub fn cached_envelope(&self) -> Option<&Array1<f64>> {
        self.cache.as_ref().map(|c| &c.envelope)
    }

    /// Cached curve of one component.
    pub fn cached_curve(&self, name: &str) -> Option<&Array1<f64>> {
        let i = self.position(name).ok()?;
        self.cache.as_ref().map(|c| &c.curves[i])
    }

    /// Drop the cached curves.
    pub fn invalidate(&mut self) {
        self.cache = None;
    }

    /// Flatten all components into one parameter set.
    pub fn to_parameter_set(&self) -> Result<ParameterSet> {
        let mut set = ParameterSet::new();
        for component in &self.components {
            component.append_to(&mut set)?;
        }
        Ok(set)
    }

    /// Copy values from a flat set into every component.
    ///
    /// All components must be present in `set`; nothing changes otherwise.
    pub fn apply_parameter_set(&mut self, set: &ParameterSet) -> Result<()> {
        for component in &self.components {
            component.values_from(set)?;
        }

        let mut events = Vec::new();
        for i in 0..self.components.len() {
            events.extend(self.components[i].update_from_set(set)?);
        }
        if let Some(cache) = self.cache.as_ref() {
            let (x, y) = (cache.x.clone(), cache.y.clone());
            self.refresh(x.view(), y.as_ref().map(|y| y.view()))?;
        }

        for event in &events {
            self.observers.notify(event);
        }
        Ok(())
    }
}

impl Model for CompositeCollection {
    fn parameter_names(&self) -> Vec<String> {
        self.components
            .iter()
            .flat_map(|c| c.parameter_names())
            .collect()
    }

    fn eval(&self, x: ArrayView1<f64>, y: Option<ArrayView1<f64>>) -> Result<Array1<f64>> {
        self.evaluate_envelope(x, y)
    }
}
