//! Implementation of the Levenberg-Marquardt algorithm.
//!
//! Each iteration solves the damped normal equations
//!
//! ```text
//! (JᵀJ + λ·D) δ = -Jᵀr,    D = diag(JᵀJ)
//! ```
//!
//! by Cholesky factorisation. If the matrix is not numerically positive
//! definite the same step is obtained from a Householder QR of the augmented
//! system `[J; sqrt(λ·D)] δ ≈ [-r; 0]`. A step is accepted only if it lowers
//! the cost; otherwise λ grows and the step is recomputed.

use ndarray::{s, Array1, Array2};
use std::fmt;

use crate::error::{PeakFitError, Result};
use crate::problem::Problem;
use crate::utils::finite_difference;

use super::config::LmConfig;
use super::convergence::ConvergenceStatus;

/// Floor for the scaling diagonal so flat directions are still damped.
const MIN_SCALE: f64 = 1e-12;

/// Result of the Levenberg-Marquardt optimization.
#[derive(Debug, Clone)]
pub struct LmResult {
    /// Optimized parameter values
    pub params: Array1<f64>,

    /// Residuals at the solution
    pub residuals: Array1<f64>,

    /// Sum of squared residuals
    pub cost: f64,

    /// Number of accepted iterations
    pub iterations: usize,

    /// Number of residual evaluations
    pub func_evals: usize,

    /// Why the iteration stopped
    pub status: ConvergenceStatus,

    /// Whether the optimization succeeded
    pub success: bool,

    /// A message describing the result
    pub message: String,
}

impl fmt::Display for LmResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Optimization Result:")?;
        writeln!(f, "  Success: {}", self.success)?;
        writeln!(f, "  Message: {}", self.message)?;
        writeln!(f, "  Cost: {:.6e}", self.cost)?;
        writeln!(f, "  Iterations: {}", self.iterations)?;
        writeln!(f, "  Function evaluations: {}", self.func_evals)?;
        writeln!(f, "  Parameters: {:?}", self.params)?;
        Ok(())
    }
}

/// The Levenberg-Marquardt optimizer.
#[derive(Debug, Clone, Default)]
pub struct LevenbergMarquardt {
    /// Configuration options
    config: LmConfig,
}

impl LevenbergMarquardt {
    /// Create a new Levenberg-Marquardt optimizer with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new Levenberg-Marquardt optimizer with the given configuration.
    pub fn with_config(config: LmConfig) -> Self {
        Self { config }
    }

    /// The active configuration.
    pub fn config(&self) -> &LmConfig {
        &self.config
    }

    /// Set the maximum number of iterations.
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.config.max_iterations = max_iterations;
        self
    }

    /// Set the tolerance for change in residual norm.
    pub fn with_ftol(mut self, ftol: f64) -> Self {
        self.config.ftol = ftol;
        self
    }

    /// Set the tolerance for change in parameter values.
    pub fn with_xtol(mut self, xtol: f64) -> Self {
        self.config.xtol = xtol;
        self
    }

    /// Set the tolerance for gradient norm.
    pub fn with_gtol(mut self, gtol: f64) -> Self {
        self.config.gtol = gtol;
        self
    }

    /// Set the initial value for the damping parameter.
    pub fn with_lambda(mut self, lambda: f64) -> Self {
        self.config.initial_lambda = lambda;
        self
    }

    /// Set the factor by which to increase lambda.
    pub fn with_lambda_up_factor(mut self, factor: f64) -> Self {
        self.config.lambda_up_factor = factor;
        self
    }

    /// Set the factor by which to decrease lambda.
    pub fn with_lambda_down_factor(mut self, factor: f64) -> Self {
        self.config.lambda_down_factor = factor;
        self
    }

    /// Set the step size of the finite-difference Jacobian.
    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.config.epsilon = epsilon;
        self
    }

    fn finish(
        &self,
        params: Array1<f64>,
        residuals: Array1<f64>,
        cost: f64,
        iterations: usize,
        func_evals: usize,
        status: ConvergenceStatus,
    ) -> LmResult {
        let success = status.is_converged();
        let message = status.description().to_string();
        if success {
            log::debug!("LM finished after {iterations} iterations: {message} (cost {cost:.6e})");
        } else {
            log::warn!("LM stopped after {iterations} iterations: {message} (cost {cost:.6e})");
        }
        LmResult {
            params,
            residuals,
            cost,
            iterations,
            func_evals,
            status,
            success,
            message,
        }
    }

    /// Minimize the sum of squared residuals for the given problem.
    ///
    /// # Arguments
    ///
    /// * `problem` - The problem to solve
    /// * `initial_params` - Initial guess for the parameter values
    ///
    /// # Returns
    ///
    /// * `Result<LmResult>` - The result of the optimization. Failure to
    ///   converge is reported through `success`, not as an error.
    pub fn minimize<P: Problem>(&self, problem: &P, initial_params: Array1<f64>) -> Result<LmResult> {
        let n_params = problem.parameter_count();
        if initial_params.len() != n_params {
            return Err(PeakFitError::DimensionMismatch(format!(
                "Expected {} parameters, got {}",
                n_params,
                initial_params.len()
            )));
        }

        let criteria = self.config.criteria();
        let mut params = initial_params;
        let mut lambda = self.config.initial_lambda;
        let mut residuals = problem.eval(&params)?;
        let mut cost = sum_of_squares(&residuals);
        let mut func_evals = 1;
        let mut iterations = 0;

        if !cost.is_finite() {
            return Err(PeakFitError::FunctionEvaluation(
                "non-finite residuals at the starting point".to_string(),
            ));
        }

        loop {
            if cost == 0.0 {
                let status = ConvergenceStatus::FunctionValueConvergence;
                return Ok(self.finish(params, residuals, cost, iterations, func_evals, status));
            }

            let jac = if problem.has_custom_jacobian() {
                problem.jacobian(&params)?
            } else {
                func_evals += n_params + 1;
                finite_difference::jacobian(problem, &params, Some(self.config.epsilon))?
            };

            let gradient = jac.t().dot(&residuals);
            let gradient_norm = gradient.dot(&gradient).sqrt();
            if gradient_norm < self.config.gtol {
                let status = ConvergenceStatus::GradientConvergence;
                return Ok(self.finish(params, residuals, cost, iterations, func_evals, status));
            }

            let jtj = jac.t().dot(&jac);
            let scale = jtj.diag().mapv(|d| d.max(MIN_SCALE));

            // Raise the damping until a step lowers the cost
            loop {
                let step = match solve_damped(&jtj, &gradient, &scale, lambda)
                    .or_else(|| solve_augmented_qr(&jac, &residuals, &scale, lambda))
                {
                    Some(step) => step,
                    None => {
                        lambda *= self.config.lambda_up_factor;
                        if lambda > self.config.max_lambda {
                            let status = ConvergenceStatus::NumericalError;
                            return Ok(self.finish(params, residuals, cost, iterations, func_evals, status));
                        }
                        continue;
                    }
                };

                let new_params = &params + &step;
                let new_residuals = problem.eval(&new_params)?;
                func_evals += 1;
                let new_cost = sum_of_squares(&new_residuals);

                if new_cost.is_finite() && new_cost < cost {
                    iterations += 1;
                    let status = criteria.check(
                        &params,
                        &new_params,
                        cost,
                        new_cost,
                        gradient_norm,
                        iterations,
                    );
                    log::debug!(
                        "LM iteration {iterations}: cost {cost:.6e} -> {new_cost:.6e}, lambda {lambda:.1e}"
                    );

                    params = new_params;
                    residuals = new_residuals;
                    cost = new_cost;
                    lambda = (lambda * self.config.lambda_down_factor).max(self.config.min_lambda);

                    if status.is_terminated() {
                        return Ok(self.finish(params, residuals, cost, iterations, func_evals, status));
                    }
                    break;
                }

                // Rejected. A step too small to change the cost means we are at the minimum.
                if new_cost.is_finite() && (new_cost - cost).abs() <= self.config.ftol * cost {
                    let status = ConvergenceStatus::FunctionValueConvergence;
                    return Ok(self.finish(params, residuals, cost, iterations, func_evals, status));
                }

                lambda *= self.config.lambda_up_factor;
                if lambda > self.config.max_lambda {
                    let status = ConvergenceStatus::DampingExhausted;
                    return Ok(self.finish(params, residuals, cost, iterations, func_evals, status));
                }
            }
        }
    }
}

fn sum_of_squares(residuals: &Array1<f64>) -> f64 {
    residuals.iter().map(|r| r * r).sum()
}

/// Solve `(JᵀJ + λ·D) δ = -g` by Cholesky factorisation.
fn solve_damped(
    jtj: &Array2<f64>,
    gradient: &Array1<f64>,
    scale: &Array1<f64>,
    lambda: f64,
) -> Option<Array1<f64>> {
    let n = jtj.nrows();
    let mut a = jtj.clone();
    for i in 0..n {
        a[[i, i]] += lambda * scale[i];
    }

    // Lower-triangular factor, computed in place
    for k in 0..n {
        for j in 0..k {
            a[[k, k]] -= a[[k, j]] * a[[k, j]];
        }
        if !(a[[k, k]] > 0.0) {
            return None;
        }
        let akk = a[[k, k]].sqrt();
        a[[k, k]] = akk;
        for i in k + 1..n {
            for j in 0..k {
                a[[i, k]] -= a[[i, j]] * a[[k, j]];
            }
            a[[i, k]] /= akk;
        }
    }

    // L z = -g
    let mut z = gradient.mapv(|g| -g);
    for i in 0..n {
        for j in 0..i {
            z[i] -= a[[i, j]] * z[j];
        }
        z[i] /= a[[i, i]];
    }

    // Lᵀ δ = z
    let mut step = Array1::zeros(n);
    for i in (0..n).rev() {
        step[i] = z[i];
        for j in i + 1..n {
            step[i] -= a[[j, i]] * step[j];
        }
        step[i] /= a[[i, i]];
    }

    step.iter().all(|v: &f64| v.is_finite()).then_some(step)
}

/// Least-squares solution of `[J; sqrt(λ·D)] δ ≈ [-r; 0]` by Householder QR.
fn solve_augmented_qr(
    jac: &Array2<f64>,
    residuals: &Array1<f64>,
    scale: &Array1<f64>,
    lambda: f64,
) -> Option<Array1<f64>> {
    let (m, n) = jac.dim();
    let rows = m + n;

    let mut a = Array2::zeros((rows, n));
    a.slice_mut(s![..m, ..]).assign(jac);
    for i in 0..n {
        a[[m + i, i]] = (lambda * scale[i]).sqrt();
    }
    let mut b = Array1::zeros(rows);
    b.slice_mut(s![..m]).assign(&residuals.mapv(|r| -r));

    for k in 0..n {
        let norm = a.slice(s![k.., k]).dot(&a.slice(s![k.., k])).sqrt();
        if norm == 0.0 {
            continue;
        }
        let alpha = if a[[k, k]] > 0.0 { -norm } else { norm };
        let mut v = a.slice(s![k.., k]).to_owned();
        v[0] -= alpha;
        let v_norm2 = v.dot(&v);
        if v_norm2 == 0.0 {
            continue;
        }

        for j in k..n {
            let proj = 2.0 * v.dot(&a.slice(s![k.., j])) / v_norm2;
            a.slice_mut(s![k.., j]).scaled_add(-proj, &v);
        }
        let proj = 2.0 * v.dot(&b.slice(s![k..])) / v_norm2;
        b.slice_mut(s![k..]).scaled_add(-proj, &v);
    }

    // Back substitution on the upper triangle
    let mut step = Array1::zeros(n);
    for i in (0..n).rev() {
        let rii = a[[i, i]];
        if rii.abs() < f64::EPSILON {
            return None;
        }
        let mut acc = b[i];
        for j in i + 1..n {
            acc -= a[[i, j]] * step[j];
        }
        step[i] = acc / rii;
    }

    step.iter().all(|v: &f64| v.is_finite()).then_some(step)
}
