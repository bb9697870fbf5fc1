//! Forward finite-difference Jacobian approximation.

use crate::error::{PeakFitError, Result};
use crate::problem::Problem;
use ndarray::{Array1, Array2};

/// Default relative step size.
const DEFAULT_EPSILON: f64 = 1e-8;

/// Step size adapted to the magnitude of the parameter.
fn step_for(value: f64, eps: f64) -> f64 {
    if value.abs() > eps {
        value.abs() * eps
    } else {
        eps
    }
}

/// Compute the Jacobian `J[i, j] = d residual[i] / d param[j]` using forward
/// differences. `epsilon` overrides the default relative step size.
pub fn jacobian(
    problem: &dyn Problem,
    params: &Array1<f64>,
    epsilon: Option<f64>,
) -> Result<Array2<f64>> {
    let eps = epsilon.unwrap_or(DEFAULT_EPSILON);
    let n_params = params.len();
    let n_residuals = problem.residual_count();

    let residuals = problem.eval(params)?;
    if residuals.len() != n_residuals {
        return Err(PeakFitError::DimensionMismatch(format!(
            "expected {} residuals, got {}",
            n_residuals,
            residuals.len()
        )));
    }

    let mut jac = Array2::zeros((n_residuals, n_params));
    for j in 0..n_params {
        let eps_j = step_for(params[j], eps);

        let mut perturbed = params.clone();
        perturbed[j] += eps_j;

        let residuals_perturbed = problem.eval(&perturbed)?;
        for i in 0..n_residuals {
            jac[[i, j]] = (residuals_perturbed[i] - residuals[i]) / eps_j;
        }
    }

    Ok(jac)
}

/// Compute the Jacobian of an arbitrary vector-valued function with a known
/// output length, using forward differences.
pub fn jacobian_fn<F>(f: F, params: &Array1<f64>, n_outputs: usize) -> Result<Array2<f64>>
where
    F: Fn(&Array1<f64>) -> Result<Array1<f64>>,
{
    let eps = DEFAULT_EPSILON;
    let n_params = params.len();

    let base = f(params)?;
    if base.len() != n_outputs {
        return Err(PeakFitError::DimensionMismatch(format!(
            "expected {} outputs, got {}",
            n_outputs,
            base.len()
        )));
    }

    let mut jac = Array2::zeros((n_outputs, n_params));
    for j in 0..n_params {
        let eps_j = step_for(params[j], eps);

        let mut perturbed = params.clone();
        perturbed[j] += eps_j;

        let out = f(&perturbed)?;
        for i in 0..n_outputs {
            jac[[i, j]] = (out[i] - base[i]) / eps_j;
        }
    }

    Ok(jac)
}
