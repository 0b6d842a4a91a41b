//! Parameter bounds implementation
//!
//! Bounds are enforced with the Minuit-style transformation used by lmfit-py:
//! the optimizer moves an unbounded internal value and the external value seen
//! by the model is mapped back into `[min, max]`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur when working with parameter bounds
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BoundsError {
    #[error("Invalid bounds: min ({min}) must be less than max ({max})")]
    InvalidBounds { min: f64, max: f64 },

    #[error("Parameter value {value} is outside bounds: [{min:?}, {max:?}]")]
    ValueOutsideBounds {
        value: f64,
        min: Option<f64>,
        max: Option<f64>,
    },

    #[error("Non-finite parameter value is not allowed")]
    NonFiniteValue,
}

/// Optional lower and upper limits on a parameter value
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Bounds {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl Bounds {
    /// Create bounds with both limits.
    ///
    /// # Examples
    ///
    /// ```
    /// use xps_fit::parameters::Bounds;
    ///
    /// let bounds = Bounds::new(0.0, 1.0).unwrap();
    /// assert!(bounds.contains(0.5));
    /// assert!(Bounds::new(1.0, 0.0).is_err());
    /// ```
    pub fn new(min: f64, max: f64) -> Result<Self, BoundsError> {
        if min >= max {
            return Err(BoundsError::InvalidBounds { min, max });
        }
        Ok(Self {
            min: Some(min),
            max: Some(max),
        })
    }

    pub fn unbounded() -> Self {
        Self::default()
    }

    /// Lower limit only, e.g. non-negative widths.
    pub fn min_only(min: f64) -> Self {
        Self {
            min: Some(min),
            max: None,
        }
    }

    pub fn max_only(max: f64) -> Self {
        Self {
            min: None,
            max: Some(max),
        }
    }

    pub fn is_unbounded(&self) -> bool {
        self.min.is_none() && self.max.is_none()
    }

    pub fn contains(&self, value: f64) -> bool {
        self.min.map_or(true, |m| value >= m) && self.max.map_or(true, |m| value <= m)
    }

    pub fn clamp(&self, value: f64) -> f64 {
        let value = self.min.map_or(value, |m| value.max(m));
        self.max.map_or(value, |m| value.min(m))
    }

    /// Map an internal (optimizer) value to the external (model) value.
    pub fn to_external(&self, internal: f64) -> f64 {
        match (self.min, self.max) {
            (None, None) => internal,
            (Some(min), None) => min - 1.0 + (internal * internal + 1.0).sqrt(),
            (None, Some(max)) => max + 1.0 - (internal * internal + 1.0).sqrt(),
            (Some(min), Some(max)) => min + (internal.sin() + 1.0) * (max - min) / 2.0,
        }
    }

    /// Map an external value to the internal value the optimizer works with.
    pub fn to_internal(&self, external: f64) -> Result<f64, BoundsError> {
        if !external.is_finite() {
            return Err(BoundsError::NonFiniteValue);
        }
        if !self.contains(external) {
            return Err(BoundsError::ValueOutsideBounds {
                value: external,
                min: self.min,
                max: self.max,
            });
        }

        Ok(match (self.min, self.max) {
            (None, None) => external,
            (Some(min), None) => ((external - min + 1.0).powi(2) - 1.0).sqrt(),
            (None, Some(max)) => ((max - external + 1.0).powi(2) - 1.0).sqrt(),
            (Some(min), Some(max)) => {
                let scaled = 2.0 * (external - min) / (max - min) - 1.0;
                scaled.clamp(-1.0, 1.0).asin()
            }
        })
    }

    /// Derivative d(external)/d(internal) at the given internal value.
    ///
    /// Used to carry covariances from internal to external coordinates.
    pub fn external_derivative(&self, internal: f64) -> f64 {
        match (self.min, self.max) {
            (None, None) => 1.0,
            (Some(_), None) => internal / (internal * internal + 1.0).sqrt(),
            (None, Some(_)) => -internal / (internal * internal + 1.0).sqrt(),
            (Some(min), Some(max)) => internal.cos() * (max - min) / 2.0,
        }
    }
}
