//! A spectrum together with the components describing it.

use ndarray::{Array1, ArrayView1};

use crate::component::ComponentModel;
use crate::composite::CompositeCollection;
use crate::error::{PeakFitError, Result};
use crate::fit::{self, FitOptions, FitResult};
use crate::lineshapes::EnergyAxis;
use crate::loader::SpectrumData;

/// Measured data plus the component collection fitted to it.
///
/// `fit` takes `&mut self`, so no component can change while a fit runs
/// and a second fit cannot start on the same session.
#[derive(Debug)]
pub struct FitSession {
    x: Array1<f64>,
    y: Array1<f64>,
    weights: Option<Array1<f64>>,
    components: CompositeCollection,
    options: FitOptions,
}

impl FitSession {
    /// Create a session. `x` and `y` must have equal length.
    pub fn new(x: Array1<f64>, y: Array1<f64>) -> Result<Self> {
        if x.len() != y.len() {
            return Err(PeakFitError::DimensionMismatch(format!(
                "x has {} samples, y has {}",
                x.len(),
                y.len()
            )));
        }
        Ok(Self {
            x,
            y,
            weights: None,
            components: CompositeCollection::new(),
            options: FitOptions::default(),
        })
    }

    /// Create a session from loaded data.
    pub fn from_spectrum(data: SpectrumData) -> Result<Self> {
        Self::new(data.energy, data.intensity)
    }

    /// Attach per-point weights.
    pub fn with_weights(mut self, weights: Array1<f64>) -> Result<Self> {
        if weights.len() != self.x.len() {
            return Err(PeakFitError::DimensionMismatch(format!(
                "{} weights for {} data points",
                weights.len(),
                self.x.len()
            )));
        }
        self.weights = Some(weights);
        Ok(self)
    }

    /// Replace the fit options.
    pub fn with_options(mut self, options: FitOptions) -> Self {
        self.options = options;
        self
    }

    /// Energy axis.
    pub fn x(&self) -> ArrayView1<'_, f64> {
        self.x.view()
    }

    /// Measured intensity.
    pub fn y(&self) -> ArrayView1<'_, f64> {
        self.y.view()
    }

    /// Per-point weights, if any.
    pub fn weights(&self) -> Option<ArrayView1<'_, f64>> {
        self.weights.as_ref().map(|w| w.view())
    }

    /// Orientation of the energy axis.
    pub fn axis(&self) -> EnergyAxis {
        EnergyAxis::detect(self.x.view())
    }

    /// The component collection.
    pub fn components(&self) -> &CompositeCollection {
        &self.components
    }

    /// Mutable access to the component collection.
    pub fn components_mut(&mut self) -> &mut CompositeCollection {
        &mut self.components
    }

    /// Add a component and bring the cached envelope up to date.
    pub fn add(&mut self, component: ComponentModel) -> Result<()> {
        self.components.add(component)?;
        self.refresh()?;
        Ok(())
    }

    /// Remove a component.
    pub fn remove(&mut self, name: &str) -> Result<ComponentModel> {
        self.components.remove(name)
    }

    /// Seed a component from the data.
    pub fn guess(&mut self, name: &str) -> Result<()> {
        self.components
            .guess(name, self.x.view(), self.y.view(), None)
    }

    /// Recompute every curve at the session data.
    pub fn refresh(&mut self) -> Result<&Array1<f64>> {
        self.components.refresh(self.x.view(), Some(self.y.view()))
    }

    /// Envelope at the session data.
    pub fn envelope(&self) -> Result<Array1<f64>> {
        match self.components.cached_envelope() {
            Some(envelope) if envelope.len() == self.x.len() => Ok(envelope.clone()),
            _ => self
                .components
                .evaluate_envelope(self.x.view(), Some(self.y.view())),
        }
    }

    /// Data minus envelope.
    pub fn residual(&self) -> Result<Array1<f64>> {
        Ok(&self.y - &self.envelope()?)
    }

    /// Fit all components to the data and write the solution back.
    ///
    /// On error the components are left as they were.
    pub fn fit(&mut self) -> Result<FitResult> {
        let result = fit::fit(
            self.components.components(),
            self.x.view(),
            self.y.view(),
            self.weights.as_ref().map(|w| w.view()),
            &self.options,
        )?;
        fit::apply_result(&mut self.components, &result)?;
        self.refresh()?;
        Ok(result)
    }
}
