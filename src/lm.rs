//! Levenberg-Marquardt optimizer.
//!
//! Damped normal-equations implementation: each iteration solves
//! `(J^T J + lambda I) delta = -J^T r` for the step, accepting it when the
//! cost decreases and otherwise raising the damping and retrying. Bounds are
//! not handled here; callers map bounded parameters into an unconstrained
//! internal space first.

use crate::error::{PeakFitError, Result};
use crate::problem::Problem;
use crate::utils::linalg;
use log::{debug, trace};
use ndarray::{Array1, Array2};

/// Configuration options for the Levenberg-Marquardt algorithm.
#[derive(Debug, Clone)]
pub struct LmConfig {
    /// Maximum number of iterations. Default: 100
    pub max_iterations: usize,

    /// Tolerance for relative change in cost. Default: 1e-8
    pub ftol: f64,

    /// Tolerance for change in parameter values. Default: 1e-8
    pub xtol: f64,

    /// Tolerance for gradient norm. Default: 1e-8
    pub gtol: f64,

    /// Initial value for the damping parameter. Default: 1e-3
    pub initial_lambda: f64,

    /// Factor by which to increase/decrease lambda. Default: 10.0
    pub lambda_factor: f64,

    /// Minimum value for lambda. Default: 1e-10
    pub min_lambda: f64,

    /// Maximum value for lambda. Default: 1e10
    pub max_lambda: f64,
}

impl Default for LmConfig {
    fn default() -> Self {
        Self {
            max_iterations: 100,
            ftol: 1e-8,
            xtol: 1e-8,
            gtol: 1e-8,
            initial_lambda: 1e-3,
            lambda_factor: 10.0,
            min_lambda: 1e-10,
            max_lambda: 1e10,
        }
    }
}

/// Result of a Levenberg-Marquardt minimization.
#[derive(Debug, Clone)]
pub struct LmResult {
    /// Optimized parameter values.
    pub params: Array1<f64>,

    /// Residuals at the solution.
    pub residuals: Array1<f64>,

    /// Sum of squared residuals at the solution.
    pub cost: f64,

    /// Number of accepted iterations.
    pub iterations: usize,

    /// Whether a convergence criterion was met.
    pub success: bool,

    /// A message describing how the run ended.
    pub message: String,

    /// The Jacobian at the solution.
    pub jacobian: Option<Array2<f64>>,
}

/// The Levenberg-Marquardt optimizer.
#[derive(Debug, Clone)]
pub struct LevenbergMarquardt {
    config: LmConfig,
}

impl LevenbergMarquardt {
    /// Create an optimizer with the given configuration.
    pub fn new(config: LmConfig) -> Self {
        Self { config }
    }

    /// Create an optimizer with the default configuration.
    pub fn with_default_config() -> Self {
        Self {
            config: LmConfig::default(),
        }
    }

    /// Minimize the sum of squared residuals of `problem` starting from
    /// `initial_params`.
    pub fn minimize<P: Problem>(
        &self,
        problem: &P,
        initial_params: Array1<f64>,
    ) -> Result<LmResult> {
        let n_params = problem.parameter_count();
        if initial_params.len() != n_params {
            return Err(PeakFitError::DimensionMismatch(format!(
                "expected {} parameters, got {}",
                n_params,
                initial_params.len()
            )));
        }

        let mut params = initial_params;
        let mut lambda = self.config.initial_lambda;

        let mut residuals = problem.eval(&params)?;
        let mut cost: f64 = residuals.iter().map(|r| r * r).sum();
        debug!("starting minimization: {} parameters, {} residuals, initial cost {:.6e}",
            n_params, residuals.len(), cost);

        let mut iterations = 0;
        loop {
            let jacobian = problem.jacobian(&params)?;

            // Gradient g = J^T r
            let gradient = jacobian.t().dot(&residuals);
            let gradient_norm = gradient.iter().map(|g| g * g).sum::<f64>().sqrt();
            if gradient_norm < self.config.gtol {
                return Ok(self.finish(
                    params,
                    residuals,
                    cost,
                    iterations,
                    true,
                    format!(
                        "Gradient convergence: ||g|| = {:.2e} < {:.2e}",
                        gradient_norm, self.config.gtol
                    ),
                    Some(jacobian),
                ));
            }

            // Solve the damped normal equations for the step. An indefinite
            // system means lambda is too small for the current curvature.
            let step = match self.calculate_step(&jacobian, &gradient, lambda) {
                Some(s) => s,
                None => {
                    if lambda >= self.config.max_lambda {
                        return Err(PeakFitError::FitConvergence(
                            "normal equations remained singular at maximum damping".to_string(),
                        ));
                    }
                    lambda = (lambda * self.config.lambda_factor).min(self.config.max_lambda);
                    trace!("singular step, raising lambda to {:.2e}", lambda);
                    continue;
                }
            };

            let new_params = &params + &step;
            let new_residuals = problem.eval(&new_params)?;
            let new_cost: f64 = new_residuals.iter().map(|r| r * r).sum();

            if new_cost < cost {
                let param_change = step.iter().fold(0.0_f64, |a, s| a.max(s.abs()));
                let cost_change = (cost - new_cost) / cost.max(1e-10);
                trace!(
                    "iteration {}: cost {:.6e} -> {:.6e}, lambda {:.2e}",
                    iterations, cost, new_cost, lambda
                );

                params = new_params;
                residuals = new_residuals;
                cost = new_cost;
                lambda = (lambda / self.config.lambda_factor).max(self.config.min_lambda);
                iterations += 1;

                if param_change < self.config.xtol {
                    return Ok(self.finish(
                        params,
                        residuals,
                        cost,
                        iterations,
                        true,
                        format!(
                            "Parameter convergence: |dx| = {:.2e} < {:.2e}",
                            param_change, self.config.xtol
                        ),
                        None,
                    ));
                }
                if cost_change < self.config.ftol {
                    return Ok(self.finish(
                        params,
                        residuals,
                        cost,
                        iterations,
                        true,
                        format!(
                            "Cost convergence: |df|/|f| = {:.2e} < {:.2e}",
                            cost_change, self.config.ftol
                        ),
                        None,
                    ));
                }
                if iterations >= self.config.max_iterations {
                    return Ok(self.finish(
                        params,
                        residuals,
                        cost,
                        iterations,
                        false,
                        format!("Maximum iterations ({}) reached", self.config.max_iterations),
                        None,
                    ));
                }
            } else {
                // Step rejected
                if lambda >= self.config.max_lambda {
                    return Ok(self.finish(
                        params,
                        residuals,
                        cost,
                        iterations,
                        false,
                        "Failed to decrease cost at maximum damping".to_string(),
                        None,
                    ));
                }
                lambda = (lambda * self.config.lambda_factor).min(self.config.max_lambda);
                trace!("step rejected, raising lambda to {:.2e}", lambda);
            }
        }
    }

    fn finish(
        &self,
        params: Array1<f64>,
        residuals: Array1<f64>,
        cost: f64,
        iterations: usize,
        success: bool,
        message: String,
        jacobian: Option<Array2<f64>>,
    ) -> LmResult {
        debug!(
            "minimization finished after {} iterations: {} (cost {:.6e})",
            iterations, message, cost
        );
        LmResult {
            params,
            residuals,
            cost,
            iterations,
            success,
            message,
            jacobian,
        }
    }

    /// Solve `(J^T J + lambda I) delta = -J^T r`. Returns `None` if the
    /// damped matrix is not positive definite.
    fn calculate_step(
        &self,
        jacobian: &Array2<f64>,
        gradient: &Array1<f64>,
        lambda: f64,
    ) -> Option<Array1<f64>> {
        let n = jacobian.ncols();
        let mut a = jacobian.t().dot(jacobian);
        for i in 0..n {
            a[[i, i]] += lambda;
        }

        let l = linalg::cholesky_factor(&a)?;
        let step = linalg::cholesky_solve(&l, gradient).ok()?;
        Some(-step)
    }
}
