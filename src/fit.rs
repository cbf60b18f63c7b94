//! Joint fitting of components to a spectrum.
//!
//! All components are flattened into one [`ParameterSet`]. The solver works
//! on the varying entries in bounded-to-unbounded coordinates, so every
//! trial point honours the `[min, max]` box of every parameter. Fixed
//! entries keep their values.
//!
//! The minimised quantity is `Σ w·(model − y)²`. Residuals handed to the
//! solver are `(model − y)·sqrt(w)`.

use ndarray::{Array1, ArrayView1};
use serde::{Deserialize, Serialize};
use std::ops::Range;

use crate::component::ComponentModel;
use crate::composite::CompositeCollection;
use crate::error::{PeakFitError, Result};
use crate::lm::{LevenbergMarquardt, LmConfig};
use crate::parameters::ParameterSet;
use crate::problem::Problem;

/// Options for a fit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FitOptions {
    /// Solver configuration
    pub solver: LmConfig,
}

impl FitOptions {
    /// Default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the solver configuration.
    pub fn with_solver(mut self, solver: LmConfig) -> Self {
        self.solver = solver;
        self
    }

    /// Set the solver iteration limit.
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.solver.max_iterations = max_iterations;
        self
    }
}

/// Outcome of a successful fit.
#[derive(Debug, Clone)]
pub struct FitResult {
    /// Solved parameters, bounds and `vary` flags unchanged
    pub params: ParameterSet,
    /// Solver status message
    pub message: String,
    /// Accepted solver iterations
    pub iterations: usize,
    /// Model evaluations
    pub nfev: usize,
    /// Number of data points
    pub ndata: usize,
    /// Number of varying parameters
    pub nvarys: usize,
    /// Weighted sum of squared residuals
    pub chisqr: f64,
    /// `chisqr / (ndata - nvarys)`, NaN when not positive
    pub redchi: f64,
    /// Envelope at the solution
    pub best_fit: Array1<f64>,
    /// Weighted residuals `(best_fit − y)·sqrt(w)`
    pub residuals: Array1<f64>,
}

/// Sum of components evaluated from a flat parameter set.
#[derive(Debug, Clone)]
pub struct JointModel<'a> {
    components: &'a [ComponentModel],
    // entries of components[i] in the flat set
    ranges: Vec<Range<usize>>,
}

impl<'a> JointModel<'a> {
    /// Components in evaluation order.
    pub fn components(&self) -> &'a [ComponentModel] {
        self.components
    }

    /// Evaluate the sum with the values in `set`.
    pub fn evaluate(
        &self,
        set: &ParameterSet,
        x: ArrayView1<f64>,
        y: Option<ArrayView1<f64>>,
    ) -> Result<Array1<f64>> {
        let values = set.values();
        let expected = self.ranges.last().map_or(0, |r| r.end);
        if values.len() != expected {
            return Err(PeakFitError::DimensionMismatch(format!(
                "joint model takes {} parameters, set has {}",
                expected,
                values.len()
            )));
        }

        let mut total = Array1::zeros(x.len());
        for (component, range) in self.components.iter().zip(self.ranges.iter()) {
            total += &component.evaluate_with(&values[range.clone()], x, y)?;
        }
        Ok(total)
    }
}

/// Combine components into one model and one flat parameter set.
///
/// Fails with `DuplicateName` if two components produce the same key.
pub fn build_joint_model(components: &[ComponentModel]) -> Result<(JointModel<'_>, ParameterSet)> {
    let mut set = ParameterSet::new();
    let mut ranges = Vec::with_capacity(components.len());
    for component in components {
        let start = set.len();
        component.append_to(&mut set)?;
        ranges.push(start..set.len());
    }
    Ok((JointModel { components, ranges }, set))
}

struct FitProblem<'m, 'c, 'd> {
    model: &'m JointModel<'c>,
    template: &'m ParameterSet,
    x: ArrayView1<'d, f64>,
    y: ArrayView1<'d, f64>,
    sqrt_weights: Option<Array1<f64>>,
}

impl FitProblem<'_, '_, '_> {
    fn residuals_for(&self, set: &ParameterSet) -> Result<(Array1<f64>, Array1<f64>)> {
        let model = self.model.evaluate(set, self.x, Some(self.y))?;
        let mut residuals = &model - &self.y;
        if let Some(sw) = &self.sqrt_weights {
            residuals *= sw;
        }
        Ok((model, residuals))
    }
}

impl Problem for FitProblem<'_, '_, '_> {
    fn eval(&self, params: &Array1<f64>) -> Result<Array1<f64>> {
        let internal = params.to_vec();
        let set = self.template.with_internal_values(&internal)?;
        Ok(self.residuals_for(&set)?.1)
    }

    fn parameter_count(&self) -> usize {
        self.template.varying_count()
    }

    fn residual_count(&self) -> usize {
        self.x.len()
    }
}

fn check_weights(weights: ArrayView1<f64>, n: usize) -> Result<Array1<f64>> {
    if weights.len() != n {
        return Err(PeakFitError::DimensionMismatch(format!(
            "{} weights for {} data points",
            weights.len(),
            n
        )));
    }
    if let Some(bad) = weights.iter().find(|w| !w.is_finite() || **w < 0.0) {
        return Err(PeakFitError::InvalidWeights(format!(
            "weights must be finite and non-negative, found {}",
            bad
        )));
    }
    Ok(weights.mapv(f64::sqrt))
}

/// Fit `components` jointly to `(x, y)`.
///
/// The components are not modified; use [`apply_result`] to write the
/// solution back. A solver that fails to converge yields
/// `SolverDidNotConverge`.
pub fn fit(
    components: &[ComponentModel],
    x: ArrayView1<f64>,
    y: ArrayView1<f64>,
    weights: Option<ArrayView1<f64>>,
    options: &FitOptions,
) -> Result<FitResult> {
    if x.is_empty() {
        return Err(PeakFitError::NoData);
    }
    if y.len() != x.len() {
        return Err(PeakFitError::DimensionMismatch(format!(
            "x has {} samples, y has {}",
            x.len(),
            y.len()
        )));
    }
    let sqrt_weights = weights.map(|w| check_weights(w, x.len())).transpose()?;

    let (model, template) = build_joint_model(components)?;
    let problem = FitProblem {
        model: &model,
        template: &template,
        x: x.view(),
        y: y.view(),
        sqrt_weights,
    };

    let ndata = x.len();
    let nvarys = template.varying_count();
    let (params, message, iterations, nfev) = if nvarys == 0 {
        (template.clone(), "no varying parameters".to_string(), 0, 1)
    } else {
        let solver = LevenbergMarquardt::with_config(options.solver.clone());
        let start = template.varying_internal_values()?;
        let outcome = solver.minimize(&problem, start)?;
        if !outcome.success {
            return Err(PeakFitError::SolverDidNotConverge(outcome.message));
        }
        let internal = outcome.params.to_vec();
        (
            template.with_internal_values(&internal)?,
            outcome.message,
            outcome.iterations,
            outcome.func_evals,
        )
    };

    let (best_fit, residuals) = problem.residuals_for(&params)?;
    let chisqr = residuals.dot(&residuals);
    let redchi = if ndata > nvarys {
        chisqr / (ndata - nvarys) as f64
    } else {
        f64::NAN
    };

    log::info!(
        "fit of {} components finished: {} ({} iterations, chi-square {:.6e})",
        components.len(),
        message,
        iterations,
        chisqr
    );

    Ok(FitResult {
        params,
        message,
        iterations,
        nfev,
        ndata,
        nvarys,
        chisqr,
        redchi,
        best_fit,
        residuals,
    })
}

/// Write solved values back into the collection. Bounds are unchanged.
pub fn apply_result(collection: &mut CompositeCollection, result: &FitResult) -> Result<()> {
    collection.apply_parameter_set(&result.params)
}
