//! Model trait.
//!
//! Anything that produces a curve over the energy axis from its own
//! parameters: a single [`ComponentModel`](crate::component::ComponentModel)
//! or a whole [`CompositeCollection`](crate::composite::CompositeCollection).

use crate::error::{PeakFitError, Result};
use ndarray::{Array1, ArrayView1};

/// A curve that can be evaluated and compared to data.
pub trait Model {
    /// Full keys of all parameters.
    fn parameter_names(&self) -> Vec<String>;

    /// Evaluates the model at the given x values using the current parameter values.
    ///
    /// # Arguments
    ///
    /// * `x` - The energy axis
    /// * `y` - The observed intensity, for shapes that depend on it
    fn eval(&self, x: ArrayView1<f64>, y: Option<ArrayView1<f64>>) -> Result<Array1<f64>>;

    /// Calculates the residuals (y_obs - y_pred) using the current parameter values.
    fn residuals(&self, x: ArrayView1<f64>, y: ArrayView1<f64>) -> Result<Array1<f64>> {
        let y_pred = self.eval(x, Some(y))?;

        if y.len() != y_pred.len() {
            return Err(PeakFitError::DimensionMismatch(format!(
                "Expected {} observed values, got {}",
                y_pred.len(),
                y.len()
            )));
        }

        Ok(&y - &y_pred)
    }
}
