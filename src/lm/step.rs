//! Step calculation for the Levenberg-Marquardt algorithm.
//!
//! This module provides functionality for computing the Levenberg-Marquardt step,
//! which blends the Gauss-Newton and gradient descent steps.

use faer::linalg::solvers::Solve;
use faer::Side;
use ndarray::{Array1, Array2};

use crate::error::{Result, XpsFitError};
use crate::utils::matrix_convert::{faer_vec_to_ndarray, ndarray_to_faer, ndarray_vec_to_faer};

/// Floor applied to diagonal entries of J^T J before scaling by lambda.
const DIAGONAL_FLOOR: f64 = 1e-10;

/// Result of a Levenberg-Marquardt step calculation.
#[derive(Debug, Clone)]
pub struct StepResult {
    /// The calculated step vector
    pub step: Array1<f64>,

    /// The predicted reduction in cost function value
    pub predicted_reduction: f64,

    /// The damping parameter used to calculate the step
    pub lambda: f64,
}

/// Handles step calculation for the Levenberg-Marquardt algorithm.
pub struct LmStep;

impl LmStep {
    /// Calculates the Levenberg-Marquardt step for the given damping.
    ///
    /// Solves `(J^T J + lambda * diag(J^T J)) * step = -J^T r`. If the
    /// augmented matrix is not positive definite the step falls back to
    /// scaled gradient descent.
    ///
    /// # Arguments
    ///
    /// * `jacobian` - The Jacobian matrix at the current position
    /// * `residuals` - The residuals at the current position
    /// * `lambda` - The damping parameter
    pub fn calculate_step(
        jacobian: &Array2<f64>,
        residuals: &Array1<f64>,
        lambda: f64,
    ) -> StepResult {
        let j_t_j = jacobian.t().dot(jacobian);
        let j_t_r = jacobian.t().dot(residuals);

        let mut augmented_j_t_j = j_t_j.clone();
        for i in 0..augmented_j_t_j.nrows() {
            augmented_j_t_j[[i, i]] += lambda * j_t_j[[i, i]].max(DIAGONAL_FLOOR);
        }

        let rhs = j_t_r.mapv(|g| -g);
        let step = match LmStep::solve_cholesky(&augmented_j_t_j, &rhs) {
            Ok(step) => step,
            Err(_) => {
                log::trace!("Cholesky solve failed at lambda = {:.3e}, using gradient step", lambda);
                rhs * (1.0 / (lambda + 1.0))
            }
        };

        let predicted_reduction = LmStep::predicted_reduction(&j_t_j, &j_t_r, &step);

        StepResult {
            step,
            predicted_reduction,
            lambda,
        }
    }

    /// Solves the symmetric positive definite system `A * x = b` with faer's
    /// Cholesky (LLT) factorization.
    pub fn solve_cholesky(a: &Array2<f64>, b: &Array1<f64>) -> Result<Array1<f64>> {
        let n = a.nrows();
        if a.ncols() != n || b.len() != n {
            return Err(XpsFitError::DimensionMismatch(format!(
                "Cannot solve a {}x{} system with a right-hand side of length {}",
                a.nrows(),
                a.ncols(),
                b.len()
            )));
        }

        let llt = ndarray_to_faer(a)
            .as_ref()
            .llt(Side::Lower)
            .map_err(|_| XpsFitError::SingularMatrix)?;
        let mut x = ndarray_vec_to_faer(b);
        llt.solve_in_place(x.as_mut());

        let x = faer_vec_to_ndarray(&x);
        if x.iter().any(|v| !v.is_finite()) {
            return Err(XpsFitError::SingularMatrix);
        }
        Ok(x)
    }

    /// Calculates the reduction in cost predicted by the local linear model.
    ///
    /// For cost `r^T r`, the model change along `step` is
    /// `2 step^T J^T r + step^T J^T J step`; the reduction is its negation.
    fn predicted_reduction(j_t_j: &Array2<f64>, j_t_r: &Array1<f64>, step: &Array1<f64>) -> f64 {
        -(2.0 * step.dot(j_t_r) + step.dot(&j_t_j.dot(step)))
    }
}
