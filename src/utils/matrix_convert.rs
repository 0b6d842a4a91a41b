//! Conversions between ndarray and faer.
//!
//! Spectra, residuals and Jacobians live in ndarray; dense factorizations run
//! on faer. ndarray is row-major and faer column-major, so the data is copied
//! element by element.

use faer::Mat;
use ndarray::{Array1, Array2};

/// Convert an ndarray Array2 to a faer Mat.
pub fn ndarray_to_faer(arr: &Array2<f64>) -> Mat<f64> {
    Mat::from_fn(arr.nrows(), arr.ncols(), |i, j| arr[[i, j]])
}

/// Convert an ndarray Array1 to a single-column faer Mat.
pub fn ndarray_vec_to_faer(arr: &Array1<f64>) -> Mat<f64> {
    Mat::from_fn(arr.len(), 1, |i, _| arr[i])
}

/// Convert a faer Mat to an ndarray Array2.
pub fn faer_to_ndarray(mat: &Mat<f64>) -> Array2<f64> {
    Array2::from_shape_fn((mat.nrows(), mat.ncols()), |(i, j)| mat[(i, j)])
}

/// Convert the first column of a faer Mat to an ndarray Array1.
pub fn faer_vec_to_ndarray(mat: &Mat<f64>) -> Array1<f64> {
    Array1::from_shape_fn(mat.nrows(), |i| mat[(i, 0)])
}
