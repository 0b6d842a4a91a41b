//! Implementation of the Levenberg-Marquardt algorithm.
//!
//! This module contains the core implementation of the Levenberg-Marquardt algorithm
//! for nonlinear least-squares optimization.

use ndarray::{Array1, Array2};
use std::fmt;

use crate::error::{Result, XpsFitError};
use crate::problem::Problem;

use super::config::LmConfig;
use super::convergence::{ConvergenceCriteria, ConvergenceStatus};
use super::step::LmStep;

/// Result of the Levenberg-Marquardt optimization.
#[derive(Debug, Clone)]
pub struct LmResult {
    /// Optimized parameter values
    pub params: Array1<f64>,

    /// Residuals at the solution
    pub residuals: Array1<f64>,

    /// Sum of squared residuals
    pub cost: f64,

    /// Number of iterations performed
    pub iterations: usize,

    /// Number of function evaluations
    pub func_evals: usize,

    /// How the run terminated
    pub status: ConvergenceStatus,

    /// Whether the optimization converged
    pub success: bool,

    /// A message describing the result
    pub message: String,

    /// The Jacobian matrix at the solution
    pub jacobian: Array2<f64>,
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
    /// Create a new Levenberg-Marquardt optimizer with the given configuration.
    pub fn with_config(config: LmConfig) -> Self {
        Self { config }
    }

    /// Create a new Levenberg-Marquardt optimizer with default configuration.
    pub fn with_default_config() -> Self {
        Self::default()
    }

    /// The configuration in use.
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

    /// Minimize the sum of squared residuals for the given problem.
    ///
    /// Failing to converge is not an error here: the returned result carries
    /// the terminal [`ConvergenceStatus`] and callers decide what to do with it.
    /// Errors are reserved for invalid dimensions and failed evaluations.
    ///
    /// # Arguments
    ///
    /// * `problem` - The problem to solve
    /// * `initial_params` - Initial guess for the parameter values
    pub fn minimize<P: Problem>(&self, problem: &P, initial_params: Array1<f64>) -> Result<LmResult> {
        let n_params = problem.parameter_count();
        if initial_params.len() != n_params {
            return Err(XpsFitError::DimensionMismatch(format!(
                "Expected {} parameters, got {}",
                n_params,
                initial_params.len()
            )));
        }

        let mut params = initial_params;
        let mut residuals = problem.eval(&params)?;
        let mut func_evals = 1;
        if residuals.len() != problem.residual_count() {
            return Err(XpsFitError::DimensionMismatch(format!(
                "Expected {} residuals, got {}",
                problem.residual_count(),
                residuals.len()
            )));
        }
        let mut cost: f64 = residuals.iter().map(|r| r.powi(2)).sum();
        if !cost.is_finite() {
            return Err(XpsFitError::FunctionEvaluation(
                "Initial residuals are not finite".to_string(),
            ));
        }

        if n_params == 0 {
            log::debug!("No free parameters; evaluating once");
            return Ok(LmResult {
                params,
                cost,
                iterations: 0,
                func_evals,
                status: ConvergenceStatus::NoFreeParameters,
                success: true,
                message: ConvergenceStatus::NoFreeParameters.description().to_string(),
                jacobian: Array2::zeros((residuals.len(), 0)),
                residuals,
            });
        }

        let criteria = ConvergenceCriteria::from(&self.config);
        let mut lambda = self.config.initial_lambda;
        let mut iterations = 0;
        let mut status = ConvergenceStatus::Running;

        while !status.is_terminated() {
            if iterations >= self.config.max_iterations {
                status = ConvergenceStatus::MaxIterationsReached;
                break;
            }
            if cost == 0.0 {
                status = ConvergenceStatus::FunctionValueConvergence;
                break;
            }

            let jacobian = problem.jacobian(&params)?;
            func_evals += n_params;

            let gradient = jacobian.t().dot(&residuals);
            let gradient_norm = gradient.dot(&gradient).sqrt();
            if gradient_norm < self.config.gtol {
                status = ConvergenceStatus::GradientConvergence;
                break;
            }

            iterations += 1;

            // Raise damping until a step lowers the cost
            loop {
                let step = LmStep::calculate_step(&jacobian, &residuals, lambda);
                let new_params = &params + &step.step;

                let candidate = if new_params.iter().all(|p| p.is_finite()) {
                    func_evals += 1;
                    let new_residuals = problem.eval(&new_params)?;
                    let new_cost: f64 = new_residuals.iter().map(|r| r.powi(2)).sum();
                    Some((new_residuals, new_cost))
                } else {
                    None
                };

                match candidate {
                    Some((new_residuals, new_cost)) if new_cost.is_finite() && new_cost < cost => {
                        status = criteria.check(
                            &params,
                            &new_params,
                            cost,
                            new_cost,
                            gradient_norm,
                            iterations,
                        );
                        log::trace!(
                            "iteration {}: cost {:.6e} -> {:.6e}, lambda {:.3e}",
                            iterations,
                            cost,
                            new_cost,
                            lambda
                        );
                        params = new_params;
                        residuals = new_residuals;
                        cost = new_cost;
                        lambda = (lambda * self.config.lambda_down_factor)
                            .max(self.config.min_lambda);
                        break;
                    }
                    _ => {
                        log::debug!(
                            "iteration {}: step rejected at lambda {:.3e}",
                            iterations,
                            lambda
                        );
                        // A rejected step this small means we are sitting on the minimum
                        if ConvergenceCriteria::relative_step(&params, &new_params) < self.config.xtol
                        {
                            status = ConvergenceStatus::ParameterConvergence;
                            break;
                        }
                        if lambda >= self.config.max_lambda {
                            status = ConvergenceStatus::DampingExhausted;
                            break;
                        }
                        lambda = (lambda * self.config.lambda_up_factor).min(self.config.max_lambda);
                    }
                }
            }
        }

        let jacobian = problem.jacobian(&params)?;
        func_evals += n_params;

        let success = status.is_converged();
        let message = status.description().to_string();
        log::debug!(
            "Levenberg-Marquardt finished after {} iterations ({} evaluations): {}",
            iterations,
            func_evals,
            message
        );

        Ok(LmResult {
            params,
            residuals,
            cost,
            iterations,
            func_evals,
            status,
            success,
            message,
            jacobian,
        })
    }
}
