//! Parameter definition and implementation
//!
//! A [`Parameter`] is one named value of a fit. How the optimizer treats it is
//! decided by its [`Binding`]: it is either varied, held fixed, or derived from
//! other parameters through a [`Derivation`]. Derived parameters are recomputed
//! from their sources before every model evaluation, so they can never be varied
//! independently.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use super::bounds::{Bounds, BoundsError};
use super::key::ParamKey;

/// Errors that can occur when working with parameters
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParameterError {
    #[error("Invalid component label '{label}': expected a-e")]
    InvalidLabel { label: String },

    #[error("Parameter '{key}' not found")]
    ParameterNotFound { key: String },

    #[error("Parameter '{key}' already exists")]
    DuplicateParameter { key: String },

    #[error("Parameter '{key}' is derived and cannot be assigned directly")]
    DerivedNotAssignable { key: String },

    #[error("Circular dependency in derivation of parameter '{key}'")]
    CircularDependency { key: String },

    #[error("Cannot evaluate derivation for parameter '{key}': {message}")]
    DerivationEvaluation { key: String, message: String },

    #[error("Invalid value {value} for parameter '{key}'")]
    InvalidValue { key: String, value: f64 },

    #[error("Expected {expected} values for varying parameters, got {got}")]
    CountMismatch { expected: usize, got: usize },

    #[error("Bounds error: {0}")]
    Bounds(#[from] BoundsError),
}

/// Rule computing a derived parameter from other parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Derivation {
    /// `value = source`
    SameAs(ParamKey),
    /// `value = minuend - subtrahend`
    Difference(ParamKey, ParamKey),
    /// `value = numerator / denominator`
    Quotient(ParamKey, ParamKey),
}

impl Derivation {
    /// Parameters this derivation reads.
    pub fn sources(&self) -> Vec<ParamKey> {
        match *self {
            Derivation::SameAs(source) => vec![source],
            Derivation::Difference(a, b) | Derivation::Quotient(a, b) => vec![a, b],
        }
    }

    /// Evaluate the rule, looking source values up through `value_of`.
    pub fn evaluate<F>(&self, target: ParamKey, value_of: F) -> Result<f64, ParameterError>
    where
        F: Fn(ParamKey) -> Result<f64, ParameterError>,
    {
        match *self {
            Derivation::SameAs(source) => value_of(source),
            Derivation::Difference(a, b) => Ok(value_of(a)? - value_of(b)?),
            Derivation::Quotient(a, b) => {
                let denominator = value_of(b)?;
                if denominator == 0.0 {
                    return Err(ParameterError::DerivationEvaluation {
                        key: target.to_string(),
                        message: format!("division by zero ({} = 0)", b),
                    });
                }
                Ok(value_of(a)? / denominator)
            }
        }
    }

    /// Partial derivatives of the rule with respect to each source.
    pub fn partials<F>(&self, value_of: F) -> Result<Vec<(ParamKey, f64)>, ParameterError>
    where
        F: Fn(ParamKey) -> Result<f64, ParameterError>,
    {
        Ok(match *self {
            Derivation::SameAs(source) => vec![(source, 1.0)],
            Derivation::Difference(a, b) => vec![(a, 1.0), (b, -1.0)],
            Derivation::Quotient(a, b) => {
                let numerator = value_of(a)?;
                let denominator = value_of(b)?;
                vec![
                    (a, 1.0 / denominator),
                    (b, -numerator / (denominator * denominator)),
                ]
            }
        })
    }
}

impl fmt::Display for Derivation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Derivation::SameAs(source) => write!(f, "{}", source),
            Derivation::Difference(a, b) => write!(f, "{} - {}", a, b),
            Derivation::Quotient(a, b) => write!(f, "{} / {}", a, b),
        }
    }
}

/// How the optimizer treats a parameter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Binding {
    /// Varied by the optimizer.
    Free,
    /// Held at its current value.
    Fixed,
    /// Recomputed from other parameters before each evaluation.
    Derived(Derivation),
}

/// A parameter for the doublet fit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    key: ParamKey,
    value: f64,
    binding: Binding,
    bounds: Bounds,
    /// Standard error of the parameter (set after fitting)
    pub stderr: Option<f64>,
}

impl Parameter {
    /// Create a free, unbounded parameter.
    ///
    /// # Examples
    ///
    /// ```
    /// use xps_fit::parameters::{ComponentLabel, ParamKey, ParamKind, Parameter};
    ///
    /// let key = ParamKey::main(ComponentLabel::REFERENCE, ParamKind::Center);
    /// let param = Parameter::free(key, 130.0);
    /// assert_eq!(param.value(), 130.0);
    /// assert!(param.is_free());
    /// ```
    pub fn free(key: ParamKey, value: f64) -> Self {
        Self {
            key,
            value,
            binding: Binding::Free,
            bounds: Bounds::unbounded(),
            stderr: None,
        }
    }

    /// Create a parameter held at `value`.
    pub fn fixed(key: ParamKey, value: f64) -> Self {
        Self {
            binding: Binding::Fixed,
            ..Self::free(key, value)
        }
    }

    /// Create a derived parameter. `value` is a placeholder until the owning
    /// collection resolves it.
    pub fn derived(key: ParamKey, value: f64, derivation: Derivation) -> Self {
        Self {
            binding: Binding::Derived(derivation),
            ..Self::free(key, value)
        }
    }

    /// Attach bounds, clamping the current value into them.
    pub fn with_bounds(mut self, bounds: Bounds) -> Self {
        self.bounds = bounds;
        self.value = bounds.clamp(self.value);
        self
    }

    pub fn key(&self) -> ParamKey {
        self.key
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn binding(&self) -> &Binding {
        &self.binding
    }

    pub fn bounds(&self) -> &Bounds {
        &self.bounds
    }

    pub fn is_free(&self) -> bool {
        matches!(self.binding, Binding::Free)
    }

    pub fn is_fixed(&self) -> bool {
        matches!(self.binding, Binding::Fixed)
    }

    pub fn is_derived(&self) -> bool {
        matches!(self.binding, Binding::Derived(_))
    }

    /// The derivation rule, if this parameter is derived.
    pub fn derivation(&self) -> Option<&Derivation> {
        match &self.binding {
            Binding::Derived(derivation) => Some(derivation),
            _ => None,
        }
    }

    /// Set the value of a free or fixed parameter.
    ///
    /// The value is clamped into the parameter bounds. Derived parameters
    /// reject assignment.
    pub fn set_value(&mut self, value: f64) -> Result<(), ParameterError> {
        if self.is_derived() {
            return Err(ParameterError::DerivedNotAssignable {
                key: self.key.to_string(),
            });
        }
        self.assign(value)
    }

    /// Hold the parameter at `value`, dropping any derivation.
    pub fn fix(&mut self, value: f64) -> Result<(), ParameterError> {
        self.binding = Binding::Fixed;
        self.assign(value)
    }

    /// Let the optimizer vary the parameter from its current value.
    pub fn set_free(&mut self) {
        self.binding = Binding::Free;
    }

    pub fn set_bounds(&mut self, bounds: Bounds) {
        self.bounds = bounds;
        self.value = bounds.clamp(self.value);
    }

    pub(crate) fn set_derivation(&mut self, derivation: Derivation) {
        self.binding = Binding::Derived(derivation);
    }

    pub(crate) fn assign(&mut self, value: f64) -> Result<(), ParameterError> {
        if !value.is_finite() {
            return Err(ParameterError::InvalidValue {
                key: self.key.to_string(),
                value,
            });
        }
        self.value = self.bounds.clamp(value);
        Ok(())
    }

    /// Internal (optimizer) coordinate of the current value.
    pub fn to_internal(&self) -> Result<f64, ParameterError> {
        Ok(self.bounds.to_internal(self.value)?)
    }

    /// Set the value from an internal (optimizer) coordinate.
    pub fn set_from_internal(&mut self, internal: f64) -> Result<(), ParameterError> {
        let external = self.bounds.to_external(internal);
        self.assign(external)
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {:.6}", self.key, self.value)?;
        if let Some(stderr) = self.stderr {
            write!(f, " +/- {:.6}", stderr)?;
        }
        match &self.binding {
            Binding::Free => Ok(()),
            Binding::Fixed => write!(f, " (fixed)"),
            Binding::Derived(derivation) => write!(f, " (== {})", derivation),
        }
    }
}
