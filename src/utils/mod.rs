//! Utility functions and helpers for the xps-fit library.

pub mod finite_difference;
pub mod matrix_convert;
