//! # Covariance Matrix Calculations
//!
//! This module provides functions for calculating and manipulating covariance
//! matrices from Jacobian matrices in nonlinear least-squares optimization.

use faer::linalg::solvers::Solve;
use faer::{Mat, Side};
use ndarray::{Array1, Array2};

use crate::error::{Result, XpsFitError};
use crate::utils::matrix_convert::{faer_to_ndarray, ndarray_to_faer};

/// Reciprocal condition estimate below which a matrix is treated as singular.
const PIVOT_TOLERANCE: f64 = 1e-14;

/// Invert a symmetric positive definite matrix through its Cholesky factor.
///
/// Matrices that are not positive definite, or whose condition estimate
/// `max|A| * max|A^-1|` exceeds `1 / PIVOT_TOLERANCE`, are reported as
/// [`XpsFitError::SingularMatrix`].
pub fn invert(matrix: &Array2<f64>) -> Result<Array2<f64>> {
    let n = matrix.nrows();
    if matrix.ncols() != n {
        return Err(XpsFitError::DimensionMismatch(format!(
            "Cannot invert a {}x{} matrix",
            n,
            matrix.ncols()
        )));
    }
    if n == 0 {
        return Ok(Array2::zeros((0, 0)));
    }

    let scale = matrix.iter().fold(0.0_f64, |acc, v| acc.max(v.abs()));
    if scale == 0.0 || !scale.is_finite() {
        return Err(XpsFitError::SingularMatrix);
    }

    let llt = ndarray_to_faer(matrix)
        .as_ref()
        .llt(Side::Lower)
        .map_err(|_| XpsFitError::SingularMatrix)?;
    let mut inv = Mat::<f64>::identity(n, n);
    llt.solve_in_place(inv.as_mut());
    let inv = faer_to_ndarray(&inv);

    let inv_scale = inv.iter().fold(0.0_f64, |acc, v| acc.max(v.abs()));
    if !inv_scale.is_finite() || inv_scale * scale * PIVOT_TOLERANCE > 1.0 {
        return Err(XpsFitError::SingularMatrix);
    }
    Ok(inv)
}

/// Calculate covariance matrix from Jacobian matrix.
///
/// For nonlinear least-squares problems, the covariance matrix is estimated as:
///   covar = redchi * inv(J^T * J)
/// where:
///   - J is the Jacobian matrix
///   - redchi is the reduced chi-square (chi^2 / dof)
pub fn calculate_covariance(jacobian: &Array2<f64>, redchi: f64) -> Result<Array2<f64>> {
    let jtj = jacobian.t().dot(jacobian);
    let inv = invert(&jtj)?;
    Ok(inv * redchi)
}

/// Calculate correlation matrix from covariance matrix.
///
/// The correlation matrix is calculated as:
///   correl[i,j] = covar[i,j] / sqrt(covar[i,i] * covar[j,j])
pub fn calculate_correlation(covar: &Array2<f64>) -> Array2<f64> {
    let n = covar.nrows();
    let mut correl = Array2::zeros((n, n));

    for i in 0..n {
        for j in 0..n {
            if i == j {
                correl[[i, j]] = 1.0;
            } else {
                let denom = (covar[[i, i]] * covar[[j, j]]).sqrt();
                if denom > 0.0 {
                    correl[[i, j]] = covar[[i, j]] / denom;
                }
            }
        }
    }

    correl
}

/// Extract standard errors from the covariance matrix.
///
/// Standard errors are the square roots of the diagonal elements
/// of the covariance matrix.
pub fn standard_errors_from_covariance(covar: &Array2<f64>) -> Array1<f64> {
    covar
        .diag()
        .mapv(|v| if v > 0.0 { v.sqrt() } else { 0.0 })
}
