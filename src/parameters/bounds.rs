//! Parameter bounds and the internal/external transform.
//!
//! Bounds constrain a parameter to an interval. During optimization the
//! Levenberg-Marquardt core works in an unbounded internal space; the
//! Minuit-style transform implemented here maps internal values onto the
//! bounded interval so the solver never produces an out-of-bounds value.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur when working with parameter bounds.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BoundsError {
    #[error("Invalid bounds: min ({min}) must be less than max ({max})")]
    InvalidBounds { min: f64, max: f64 },

    #[error("Parameter value {value} is outside bounds: [{min}, {max}]")]
    ValueOutsideBounds { value: f64, min: f64, max: f64 },

    #[error("Infinite parameter value is not allowed")]
    InfiniteValue,
}

/// The bounds constraints on a parameter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    /// Minimum allowed value for the parameter.
    pub min: f64,

    /// Maximum allowed value for the parameter.
    pub max: f64,
}

impl Default for Bounds {
    fn default() -> Self {
        Self {
            min: f64::NEG_INFINITY,
            max: f64::INFINITY,
        }
    }
}

impl Bounds {
    /// Create new bounds, failing if `min > max`.
    pub fn new(min: f64, max: f64) -> Result<Self, BoundsError> {
        if min > max {
            return Err(BoundsError::InvalidBounds { min, max });
        }
        Ok(Self { min, max })
    }

    /// An unbounded constraint (negative infinity to positive infinity).
    pub fn unbounded() -> Self {
        Self::default()
    }

    /// A constraint with only a minimum value.
    pub fn min_only(min: f64) -> Self {
        Self {
            min,
            max: f64::INFINITY,
        }
    }

    /// A constraint with only a maximum value.
    pub fn max_only(max: f64) -> Self {
        Self {
            min: f64::NEG_INFINITY,
            max,
        }
    }

    /// Check if a value is within the bounds.
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    /// Check if the parameter is bounded from below.
    pub fn has_lower_bound(&self) -> bool {
        self.min.is_finite()
    }

    /// Check if the parameter is bounded from above.
    pub fn has_upper_bound(&self) -> bool {
        self.max.is_finite()
    }

    /// Clamp a value to be within the bounds.
    pub fn clamp(&self, value: f64) -> f64 {
        value.clamp(self.min, self.max)
    }

    /// Transform an internal (unbounded) value to an external value within
    /// the bounds.
    pub fn to_external(&self, internal: f64) -> f64 {
        match (self.has_lower_bound(), self.has_upper_bound()) {
            (false, false) => internal,
            (true, false) => self.min - 1.0 + (internal * internal + 1.0).sqrt(),
            (false, true) => self.max + 1.0 - (internal * internal + 1.0).sqrt(),
            (true, true) => {
                let range = self.max - self.min;
                self.min + (internal.sin() + 1.0) * range / 2.0
            }
        }
    }

    /// Transform an external value to the internal space seen by the
    /// optimizer. Fails if the value is infinite or outside the bounds.
    pub fn to_internal(&self, external: f64) -> Result<f64, BoundsError> {
        if !external.is_finite() {
            return Err(BoundsError::InfiniteValue);
        }
        if !self.contains(external) {
            return Err(BoundsError::ValueOutsideBounds {
                value: external,
                min: self.min,
                max: self.max,
            });
        }

        Ok(match (self.has_lower_bound(), self.has_upper_bound()) {
            (false, false) => external,
            (true, false) => ((external - self.min + 1.0).powi(2) - 1.0).sqrt(),
            (false, true) => ((self.max - external + 1.0).powi(2) - 1.0).sqrt(),
            (true, true) => {
                let range = self.max - self.min;
                let scaled = 2.0 * (external - self.min) / range - 1.0;
                // Guard asin's domain against rounding at the bound.
                scaled.clamp(-1.0, 1.0).asin()
            }
        })
    }
}
