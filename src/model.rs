//! Model trait and the fitting entry point.
//!
//! This module defines the Model trait, which provides a common interface for
//! fitting models to a spectrum, and the [`fit`] function that adapts a model to
//! the Levenberg-Marquardt optimizer and collects the result.

use ndarray::{Array1, Array2};
use std::collections::BTreeMap;

use crate::error::{Result, XpsFitError};
use crate::lm::{ConvergenceStatus, LevenbergMarquardt, LmConfig};
use crate::parameters::{ComponentLabel, Line, ParamKey, Parameters};
use crate::problem::Problem;
use crate::spectrum::Spectrum;
use crate::uncertainty;

/// Per-line curves keyed by component and line.
pub type ComponentCurves = BTreeMap<(ComponentLabel, Line), Array1<f64>>;

/// A trait representing a model that can be fit to a spectrum.
///
/// Models evaluate a sum of lineshapes for a given parameter set. Evaluation
/// takes the parameters explicitly so the optimizer can try candidate values
/// without touching the model's own parameters.
pub trait Model {
    /// Returns a reference to the model's parameters.
    fn parameters(&self) -> &Parameters;

    /// Returns a mutable reference to the model's parameters.
    fn parameters_mut(&mut self) -> &mut Parameters;

    /// Evaluates every line of the model for the given parameters.
    fn eval_components_with(&self, params: &Parameters, x: &Array1<f64>) -> Result<ComponentCurves>;

    /// Evaluates the model for the given parameters.
    fn eval_with(&self, params: &Parameters, x: &Array1<f64>) -> Result<Array1<f64>> {
        let mut total = Array1::zeros(x.len());
        for curve in self.eval_components_with(params, x)?.values() {
            total += curve;
        }
        Ok(total)
    }

    /// Evaluates the model at the given energies using the current parameter values.
    fn eval(&self, x: &Array1<f64>) -> Result<Array1<f64>> {
        self.eval_with(self.parameters(), x)
    }

    /// Evaluates every line at the given energies using the current parameter values.
    fn eval_components(&self, x: &Array1<f64>) -> Result<ComponentCurves> {
        self.eval_components_with(self.parameters(), x)
    }

    /// Calculates the residuals (y_obs - y_pred) using the current parameter values.
    fn residuals(&self, x: &Array1<f64>, y: &Array1<f64>) -> Result<Array1<f64>> {
        let y_pred = self.eval(x)?;

        if y.len() != y_pred.len() {
            return Err(XpsFitError::DimensionMismatch(format!(
                "Expected {} observed values, got {}",
                y_pred.len(),
                y.len()
            )));
        }

        Ok(y - &y_pred)
    }
}

/// An adapter that implements [`Problem`] for a [`Model`] and a spectrum.
///
/// The optimizer works on internal coordinates of the free parameters. Each
/// evaluation maps them onto a scratch copy of the model parameters, resolves
/// the derived ones and returns `data - model`.
pub struct ModelProblem<'a, M: Model> {
    model: &'a M,
    spectrum: &'a Spectrum,
    free_count: usize,
}

impl<'a, M: Model> ModelProblem<'a, M> {
    /// Create a new ModelProblem adapter for a Model implementation
    pub fn new(model: &'a M, spectrum: &'a Spectrum) -> Self {
        Self {
            model,
            spectrum,
            free_count: model.parameters().free_count(),
        }
    }

    /// Parameters corresponding to the given internal coordinates.
    pub fn parameters_at(&self, internal: &Array1<f64>) -> Result<Parameters> {
        let mut params = self.model.parameters().clone();
        params.update_from_internal(&internal.to_vec())?;
        Ok(params)
    }

    /// Get the number of data points
    pub fn ndata(&self) -> usize {
        self.spectrum.len()
    }
}

impl<'a, M: Model> Problem for ModelProblem<'a, M> {
    fn eval(&self, params: &Array1<f64>) -> Result<Array1<f64>> {
        let params = self.parameters_at(params)?;
        let y_pred = self.model.eval_with(&params, self.spectrum.energies())?;
        Ok(self.spectrum.intensities() - &y_pred)
    }

    fn parameter_count(&self) -> usize {
        self.free_count
    }

    fn residual_count(&self) -> usize {
        self.spectrum.len()
    }
}

/// Result of fitting a model to a spectrum
#[derive(Debug, Clone)]
pub struct FitOutcome {
    /// Final parameters, with standard errors where they could be estimated
    pub params: Parameters,

    /// Energies of the fit domain
    pub energies: Array1<f64>,

    /// Background-subtracted data that was fitted
    pub data: Array1<f64>,

    /// Model evaluated at the final parameters
    pub best_fit: Array1<f64>,

    /// `data - best_fit`
    pub residuals: Array1<f64>,

    /// Each line of the model evaluated at the final parameters
    pub component_curves: ComponentCurves,

    /// Sum of squared residuals
    pub chisqr: f64,

    /// Chi-square divided by the degrees of freedom
    pub redchi: f64,

    /// Number of data points
    pub ndata: usize,

    /// Number of free parameters
    pub nvarys: usize,

    /// Number of iterations performed
    pub iterations: usize,

    /// Number of function evaluations
    pub func_evals: usize,

    /// How the optimizer terminated
    pub status: ConvergenceStatus,

    /// Whether the fit converged
    pub success: bool,

    /// A message describing the result
    pub message: String,

    /// Free parameters in the order of the covariance rows
    pub var_names: Vec<ParamKey>,

    /// Covariance of the free parameters, if `J^T J` could be inverted
    pub covariance: Option<Array2<f64>>,
}

impl FitOutcome {
    /// Number of degrees of freedom (`ndata - nvarys`).
    pub fn nfree(&self) -> usize {
        self.ndata.saturating_sub(self.nvarys)
    }

    /// Fitted value of a parameter.
    pub fn value(&self, key: ParamKey) -> Result<f64> {
        Ok(self.params.value(key)?)
    }

    /// Correlation matrix of the free parameters.
    pub fn correlation(&self) -> Option<Array2<f64>> {
        self.covariance
            .as_ref()
            .map(uncertainty::calculate_correlation)
    }
}

/// Fit a model to a spectrum
///
/// The model's parameters are updated in place to the best-fit values. A
/// run that does not converge still returns `Ok`; check
/// [`FitOutcome::success`] or [`FitOutcome::status`].
///
/// # Arguments
///
/// * `model` - The model to fit
/// * `spectrum` - The background-subtracted data
/// * `config` - Optimizer settings
pub fn fit<M: Model>(model: &mut M, spectrum: &Spectrum, config: &LmConfig) -> Result<FitOutcome> {
    model.parameters_mut().resolve()?;

    let var_names = model.parameters().free_keys();
    let initial = Array1::from(model.parameters().to_internal()?);

    let (result, mut params) = {
        let problem = ModelProblem::new(&*model, spectrum);
        let lm = LevenbergMarquardt::with_config(config.clone());
        let result = lm.minimize(&problem, initial)?;
        let params = problem.parameters_at(&result.params)?;
        (result, params)
    };

    let ndata = spectrum.len();
    let nvarys = var_names.len();
    let chisqr = result.cost;
    let redchi = chisqr / (ndata.saturating_sub(nvarys).max(1) as f64);

    let covariance = if nvarys == 0 {
        None
    } else {
        // Chain rule from internal to external coordinates
        let internal = result.params.to_vec();
        let derivatives = params.internal_derivatives(&internal)?;
        let mut jacobian = result.jacobian.clone();
        for (mut column, &derivative) in jacobian.columns_mut().into_iter().zip(&derivatives) {
            if derivative != 0.0 {
                column /= derivative;
            } else {
                column.fill(0.0);
            }
        }

        match uncertainty::calculate_covariance(&jacobian, redchi) {
            Ok(covariance) => Some(covariance),
            Err(XpsFitError::SingularMatrix) => {
                log::warn!("Covariance matrix is singular; standard errors are unavailable");
                None
            }
            Err(err) => return Err(err),
        }
    };

    let errors: Vec<(ParamKey, f64)> = match &covariance {
        Some(covariance) => {
            let stderrs = uncertainty::standard_errors_from_covariance(covariance);
            var_names.iter().copied().zip(stderrs.iter().copied()).collect()
        }
        None => Vec::new(),
    };
    params.set_standard_errors(&errors)?;

    *model.parameters_mut() = params.clone();

    let energies = spectrum.energies().clone();
    let data = spectrum.intensities().clone();
    let best_fit = model.eval(&energies)?;
    let residuals = &data - &best_fit;
    let component_curves = model.eval_components(&energies)?;

    Ok(FitOutcome {
        params,
        energies,
        data,
        best_fit,
        residuals,
        component_curves,
        chisqr,
        redchi,
        ndata,
        nvarys,
        iterations: result.iterations,
        func_evals: result.func_evals,
        status: result.status,
        success: result.success,
        message: result.message,
        var_names,
        covariance,
    })
}
