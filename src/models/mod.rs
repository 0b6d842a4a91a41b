//! Built-in models for XPS doublet fitting.
//!
//! This module provides the Voigt lineshape, the two-line doublet component
//! built from it, and the composite model that sums up to five doublets.

mod composite;
mod doublet;
pub mod voigt;

// Re-export the models
pub use composite::{validate_guesses, CompositeModel};
pub use doublet::{doublet_parameters, line_profile, DoubletModel};
pub use voigt::{faddeeva, voigt, voigt_profile};
