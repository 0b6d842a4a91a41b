//! # xps-fit
//!
//! `xps-fit` fits spin-orbit doublets to X-ray photoelectron spectra and
//! reports how much of the signal each chemical species carries.
//!
//! The library provides:
//! - A Levenberg-Marquardt optimizer with lmfit-style bounded parameters
//! - Voigt doublet models whose satellite lines are derived from the main line
//! - Extraction of the fit window and background from instrument exports
//! - A three-stage pipeline that recalibrates the energy axis against a
//!   reference component before the final fit
//! - Area fractions and peak distances of the final fit
//!
//! ## Basic Usage
//!
//! ```
//! use ndarray::Array1;
//! use xps_fit::config::DoubletShape;
//! use xps_fit::model::Model;
//! use xps_fit::models::CompositeModel;
//! use xps_fit::spectrum::RawTable;
//! use xps_fit::{DoubletFitPipeline, PipelineConfig};
//!
//! // A single doublet at 128.5 eV on a flat background
//! let energy = Array1::linspace(140.0, 120.0, 201);
//! let truth = CompositeModel::build(&[128.5], &[500.0], &DoubletShape::default()).unwrap();
//! let counts = truth.eval(&energy).unwrap() + 10.0;
//! let window = energy.iter().map(|&e| Some(e)).collect();
//! let background = vec![Some(10.0); energy.len()];
//! let table = RawTable::new(energy, counts, window, background).unwrap();
//!
//! let config = PipelineConfig::with_peaks(1).with_guesses(vec![128.0], vec![1.0]);
//! let outcome = DoubletFitPipeline::new(config).run(&table).unwrap();
//!
//! assert!((outcome.shift - 1.5).abs() < 1e-3);
//! assert_eq!(outcome.report.formatted_fractions().values().next().unwrap(), "100.00%");
//! ```

pub mod analysis;
pub mod config;
pub mod error;
pub mod lm;
pub mod model;
pub mod models;
pub mod parameters;
pub mod pipeline;
pub mod problem;
pub mod spectrum;
pub mod table;
pub mod uncertainty;
pub mod utils;

// Re-exports for convenience
pub use analysis::{component_fractions, peak_distances, FitReport};
pub use config::{DoubletShape, PipelineConfig};
pub use error::{Result, XpsFitError};
pub use lm::{LevenbergMarquardt, LmConfig};
pub use model::{fit, FitOutcome, Model};
pub use parameters::{ComponentLabel, ParamKey, ParamKind, Parameters};
pub use pipeline::{DoubletFitPipeline, PipelineOutcome};
pub use problem::Problem;
pub use spectrum::{RawTable, Spectrum};

/// Version of the library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
