//! Integration tests for the Levenberg-Marquardt optimizer and the
//! covariance estimate at its solution.

use approx::assert_relative_eq;
use ndarray::{Array1, Array2};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};
use xps_fit::lm::{ConvergenceStatus, LevenbergMarquardt, LmConfig};
use xps_fit::models::voigt_profile;
use xps_fit::uncertainty::{calculate_correlation, calculate_covariance, standard_errors_from_covariance};
use xps_fit::{Problem, Result};

/// A single Voigt line with fixed widths: params are amplitude and center.
struct VoigtLine {
    x: Array1<f64>,
    y: Array1<f64>,
    sigma: f64,
    gamma: f64,
}

impl Problem for VoigtLine {
    fn eval(&self, params: &Array1<f64>) -> Result<Array1<f64>> {
        let model = voigt_profile(&self.x, params[0], params[1], self.sigma, self.gamma);
        Ok(&model - &self.y)
    }

    fn parameter_count(&self) -> usize {
        2
    }

    fn residual_count(&self) -> usize {
        self.x.len()
    }
}

/// Straight line y = m*x + b with an analytic Jacobian.
struct Line {
    x: Array1<f64>,
    y: Array1<f64>,
}

impl Problem for Line {
    fn eval(&self, params: &Array1<f64>) -> Result<Array1<f64>> {
        Ok(self.x.mapv(|x| params[0] * x + params[1]) - &self.y)
    }

    fn parameter_count(&self) -> usize {
        2
    }

    fn residual_count(&self) -> usize {
        self.x.len()
    }

    fn jacobian(&self, _params: &Array1<f64>) -> Result<Array2<f64>> {
        let mut jac = Array2::ones((self.x.len(), 2));
        jac.column_mut(0).assign(&self.x);
        Ok(jac)
    }
}

#[test]
fn test_voigt_line_with_noise() {
    let mut rng = ChaCha8Rng::seed_from_u64(42);
    let noise = Normal::new(0.0, 0.5).unwrap();

    let x = Array1::linspace(125.0, 135.0, 401);
    let truth = voigt_profile(&x, 80.0, 130.2, 0.35, 0.15);
    let y = truth.mapv(|v| v + noise.sample(&mut rng));
    let problem = VoigtLine {
        x,
        y,
        sigma: 0.35,
        gamma: 0.15,
    };

    let result = LevenbergMarquardt::with_default_config()
        .minimize(&problem, Array1::from(vec![50.0, 129.8]))
        .unwrap();

    assert!(result.success, "{}", result.message);
    assert_relative_eq!(result.params[0], 80.0, epsilon = 1.0);
    assert_relative_eq!(result.params[1], 130.2, epsilon = 0.01);
    assert_eq!(result.jacobian.dim(), (401, 2));
}

#[test]
fn test_line_covariance_matches_closed_form() {
    let mut rng = ChaCha8Rng::seed_from_u64(7);
    let noise = Normal::new(0.0, 0.2).unwrap();

    let x = Array1::linspace(0.0, 10.0, 50);
    let y = x.mapv(|x| 1.5 * x - 2.0 + noise.sample(&mut rng));
    let problem = Line { x: x.clone(), y };

    let result = LevenbergMarquardt::with_default_config()
        .minimize(&problem, Array1::from(vec![0.0, 0.0]))
        .unwrap();
    assert!(result.success);

    let n = x.len() as f64;
    let redchi = result.cost / (n - 2.0);
    let covariance = calculate_covariance(&result.jacobian, redchi).unwrap();

    // (X^T X)^-1 for a straight line
    let sx: f64 = x.sum();
    let sxx: f64 = x.mapv(|v| v * v).sum();
    let det = n * sxx - sx * sx;
    assert_relative_eq!(covariance[[0, 0]], redchi * n / det, max_relative = 1e-8);
    assert_relative_eq!(covariance[[1, 1]], redchi * sxx / det, max_relative = 1e-8);
    assert_relative_eq!(covariance[[0, 1]], -redchi * sx / det, max_relative = 1e-8);

    let errors = standard_errors_from_covariance(&covariance);
    assert_relative_eq!(errors[0], (redchi * n / det).sqrt(), max_relative = 1e-8);

    let correlation = calculate_correlation(&covariance);
    assert_relative_eq!(correlation[[0, 0]], 1.0, epsilon = 1e-12);
    assert!(correlation[[0, 1]] < 0.0);
}

#[test]
fn test_iteration_limit_is_not_success() {
    let x = Array1::linspace(125.0, 135.0, 201);
    let y = voigt_profile(&x, 80.0, 130.2, 0.35, 0.15);
    let problem = VoigtLine {
        x,
        y,
        sigma: 0.35,
        gamma: 0.15,
    };

    let config = LmConfig {
        max_iterations: 2,
        ..LmConfig::default()
    };
    let result = LevenbergMarquardt::with_config(config)
        .minimize(&problem, Array1::from(vec![30.0, 129.0]))
        .unwrap();

    assert_eq!(result.status, ConvergenceStatus::MaxIterationsReached);
    assert!(!result.success);
    assert_eq!(result.iterations, 2);
}
