//! # Uncertainty Calculation
//!
//! This module estimates uncertainties of fitted parameters from the Jacobian
//! at the solution of a least-squares fit:
//!
//! - Covariance matrix estimation from Jacobian matrices
//! - Standard error calculation for parameter estimates
//! - Correlation coefficients between free parameters
//!
//! The approach follows lmfit-py: the covariance is scaled by the reduced
//! chi-square of the fit.

mod covariance;

pub use covariance::{
    calculate_correlation, calculate_covariance, invert, standard_errors_from_covariance,
};
