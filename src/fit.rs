//! Fit orchestration.
//!
//! `fit` wires the pieces together: restrict the dataset to the requested
//! range, compose the model, hand the weighted residual problem to the
//! Levenberg-Marquardt optimizer in the bounds-transformed internal space,
//! and attach goodness-of-fit numbers and standard errors to the result.

use crate::data::Dataset;
use crate::error::{PeakFitError, Result};
use crate::lm::{LevenbergMarquardt, LmConfig};
use crate::model::{BackgroundDefinition, PeakDefinition, PeakModel};
use crate::parameters::Parameters;
use crate::problem::Problem;
use crate::uncertainty;
use crate::utils::finite_difference;
use log::{debug, info};
use ndarray::Array1;

/// Inclusive x-range restriction for a fit.
#[derive(Debug, Clone, Copy)]
pub struct FitRange {
    pub min: f64,
    pub max: f64,
}

impl FitRange {
    pub fn new(min: f64, max: f64) -> Result<Self> {
        if !min.is_finite() || !max.is_finite() || min > max {
            return Err(PeakFitError::Configuration(format!(
                "invalid fit range [{}, {}]",
                min, max
            )));
        }
        Ok(Self { min, max })
    }

    /// Whether x lies inside the range, both ends inclusive.
    pub fn contains(&self, x: f64) -> bool {
        x >= self.min && x <= self.max
    }
}

/// The outcome of a successful fit: the model with updated parameter values
/// and standard errors, plus goodness-of-fit statistics.
#[derive(Debug, Clone)]
pub struct FitResult {
    model: PeakModel,

    /// Sum of squared weighted residuals at the solution.
    pub chisqr: f64,

    /// Chi-square divided by the degrees of freedom.
    pub redchi: f64,

    /// Number of fitted data points.
    pub ndata: usize,

    /// Number of free parameters.
    pub nvarys: usize,

    /// Degrees of freedom, `ndata - nvarys`.
    pub dof: usize,

    /// Accepted optimizer iterations.
    pub iterations: usize,

    /// Convergence message from the optimizer.
    pub message: String,
}

impl FitResult {
    /// The fitted model.
    pub fn model(&self) -> &PeakModel {
        &self.model
    }

    /// The fitted parameters, in canonical order, with standard errors on
    /// the free ones.
    pub fn parameters(&self) -> &Parameters {
        self.model.parameters()
    }
}

/// Weighted residuals of a peak model against a dataset, as a function of
/// the free parameters in internal space.
struct ResidualProblem<'a> {
    model: &'a PeakModel,
    template: Parameters,
    dataset: &'a Dataset,
}

impl<'a> ResidualProblem<'a> {
    fn new(model: &'a PeakModel, dataset: &'a Dataset) -> Self {
        Self {
            model,
            template: model.parameters().clone(),
            dataset,
        }
    }

    fn weighted_residuals(&self, params: &Parameters) -> Result<Array1<f64>> {
        let model_y = self.model.eval_with(params, self.dataset.x())?;
        Ok((self.dataset.y() - &model_y) / self.dataset.y_err())
    }
}

impl Problem for ResidualProblem<'_> {
    fn eval(&self, internal: &Array1<f64>) -> Result<Array1<f64>> {
        let mut params = self.template.clone();
        params.update_from_internal(&internal.to_vec())?;
        self.weighted_residuals(&params)
    }

    fn parameter_count(&self) -> usize {
        self.template.varying_count()
    }

    fn residual_count(&self) -> usize {
        self.dataset.len()
    }
}

/// Fit the model with the default optimizer configuration.
pub fn fit(
    dataset: &Dataset,
    background: &BackgroundDefinition,
    peaks: &[PeakDefinition],
    range: Option<FitRange>,
) -> Result<FitResult> {
    fit_with_config(dataset, background, peaks, range, LmConfig::default())
}

/// Fit the model. A failed optimization (no convergence criterion met)
/// surfaces as a `FitConvergence` error; the caller's dataset and
/// definitions are untouched either way.
pub fn fit_with_config(
    dataset: &Dataset,
    background: &BackgroundDefinition,
    peaks: &[PeakDefinition],
    range: Option<FitRange>,
    config: LmConfig,
) -> Result<FitResult> {
    let restricted;
    let data = match range {
        Some(r) => {
            restricted = dataset.restrict(r)?;
            &restricted
        }
        None => dataset,
    };

    let mut model = PeakModel::new(background, peaks)?;

    let nvarys = model.parameters().varying_count();
    if nvarys == 0 {
        return Err(PeakFitError::Configuration(
            "no free parameters to optimize".to_string(),
        ));
    }
    let ndata = data.len();
    if ndata <= nvarys {
        return Err(PeakFitError::Configuration(format!(
            "{} data points cannot constrain {} free parameters",
            ndata, nvarys
        )));
    }
    let dof = ndata - nvarys;
    debug!("fitting {} free parameters to {} points", nvarys, ndata);

    let problem = ResidualProblem::new(&model, data);
    let initial: Vec<f64> = model.parameters().varying_internal_values()?;
    let lm = LevenbergMarquardt::new(config);
    let lm_result = lm.minimize(&problem, Array1::from(initial))?;

    if !lm_result.success {
        return Err(PeakFitError::FitConvergence(lm_result.message));
    }

    let mut params = model.parameters().clone();
    params.update_from_internal(&lm_result.params.to_vec())?;

    let chisqr = lm_result.cost;
    let redchi = chisqr / dof as f64;

    // Standard errors come from the Jacobian in external (bounded) space at
    // the solution, so they refer to the reported parameter values. At an
    // active bound the perturbed value is clamped back inside.
    let external: Array1<f64> = params.varying().iter().map(|p| p.value()).collect();
    let residual_fn = |values: &Array1<f64>| -> Result<Array1<f64>> {
        let mut trial = params.clone();
        let varying_names = trial.varying_names();
        for (name, &v) in varying_names.iter().zip(values.iter()) {
            if let Some(p) = trial.get_mut(name) {
                let clamped = p.bounds().clamp(v);
                p.set_value(clamped)?;
            }
        }
        let model_y = model.eval_with(&trial, data.x())?;
        Ok((data.y() - &model_y) / data.y_err())
    };
    let jacobian = finite_difference::jacobian_fn(residual_fn, &external, ndata)?;
    let covariance = uncertainty::covariance_matrix(&jacobian, redchi)?;
    let stderr = uncertainty::standard_errors(&covariance);

    params.clear_stderr();
    let varying_names = params.varying_names();
    for (name, &err) in varying_names.iter().zip(stderr.iter()) {
        if let Some(p) = params.get_mut(name) {
            p.set_stderr(Some(err));
        }
    }
    *model.parameters_mut() = params;

    info!(
        "fit converged in {} iterations: chisqr {:.6e}, redchi {:.6e}",
        lm_result.iterations, chisqr, redchi
    );

    Ok(FitResult {
        model,
        chisqr,
        redchi,
        ndata,
        nvarys,
        dof,
        iterations: lm_result.iterations,
        message: lm_result.message,
    })
}
