//! Parameter definition and implementation.
//!
//! A [`Parameter`] is one named scalar of the fit: it carries a value, a
//! vary/fixed flag, optional bounds, and (after a fit) a standard error.
//! Fixed parameters are held at their supplied value throughout optimization.

use crate::parameters::bounds::{Bounds, BoundsError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur when working with parameters.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParameterError {
    #[error("Bounds error: {0}")]
    Bounds(#[from] BoundsError),

    #[error("Parameter '{name}' not found")]
    NotFound { name: String },

    #[error("Duplicate parameter name '{name}'")]
    DuplicateName { name: String },

    #[error("Expected {expected} varying parameter values, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },
}

/// A named scalar fit parameter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Parameter {
    /// Name of the parameter.
    name: String,

    /// Current value of the parameter.
    value: f64,

    /// Value the parameter was created with (the optimizer seed).
    init_value: f64,

    /// Whether this parameter is varied during optimization. `false` means
    /// the parameter is a constant in the model.
    vary: bool,

    /// Bounds constraint on the value.
    bounds: Bounds,

    /// Standard error of the parameter, set after a successful fit. Fixed
    /// parameters report no error.
    stderr: Option<f64>,
}

impl Parameter {
    /// Create a new free, unbounded parameter.
    pub fn new(name: &str, value: f64) -> Self {
        Self {
            name: name.to_string(),
            value,
            init_value: value,
            vary: true,
            bounds: Bounds::default(),
            stderr: None,
        }
    }

    /// Create a new free parameter with bounds. The value is clamped into
    /// the bounds.
    pub fn with_bounds(name: &str, value: f64, min: f64, max: f64) -> Result<Self, ParameterError> {
        let bounds = Bounds::new(min, max)?;
        let value = bounds.clamp(value);

        Ok(Self {
            name: name.to_string(),
            value,
            init_value: value,
            vary: true,
            bounds,
            stderr: None,
        })
    }

    /// Create a fixed parameter: the optimizer will not vary it.
    pub fn fixed(name: &str, value: f64) -> Self {
        Self {
            name: name.to_string(),
            value,
            init_value: value,
            vary: false,
            bounds: Bounds::default(),
            stderr: None,
        }
    }

    /// Get the current value of the parameter.
    pub fn value(&self) -> f64 {
        self.value
    }

    /// Set the value of the parameter, failing if it lies outside the bounds.
    pub fn set_value(&mut self, value: f64) -> Result<(), ParameterError> {
        if !self.bounds.contains(value) {
            return Err(ParameterError::Bounds(BoundsError::ValueOutsideBounds {
                value,
                min: self.bounds.min,
                max: self.bounds.max,
            }));
        }
        self.value = value;
        Ok(())
    }

    /// Get the initial value the parameter was created with.
    pub fn init_value(&self) -> f64 {
        self.init_value
    }

    /// Reset the parameter to its initial value (clamped into the current
    /// bounds) and clear any standard error.
    pub fn reset(&mut self) {
        self.value = self.bounds.clamp(self.init_value);
        self.stderr = None;
    }

    /// Get the name of the parameter.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the parameter is varied during optimization.
    pub fn vary(&self) -> bool {
        self.vary
    }

    /// Set whether the parameter is varied during optimization.
    pub fn set_vary(&mut self, vary: bool) {
        self.vary = vary;
    }

    /// Minimum allowed value.
    pub fn min(&self) -> f64 {
        self.bounds.min
    }

    /// Maximum allowed value.
    pub fn max(&self) -> f64 {
        self.bounds.max
    }

    /// Set the bounds, clamping the current value into them.
    pub fn set_bounds(&mut self, min: f64, max: f64) -> Result<(), ParameterError> {
        let bounds = Bounds::new(min, max)?;
        self.bounds = bounds;
        self.value = bounds.clamp(self.value);
        Ok(())
    }

    /// The bounds constraint.
    pub fn bounds(&self) -> &Bounds {
        &self.bounds
    }

    /// Standard error of the parameter, if a fit produced one.
    pub fn stderr(&self) -> Option<f64> {
        self.stderr
    }

    /// Set or clear the standard error.
    pub fn set_stderr(&mut self, stderr: Option<f64>) {
        self.stderr = stderr;
    }

    /// The current value mapped into the optimizer's internal space.
    pub fn to_internal(&self) -> Result<f64, ParameterError> {
        Ok(self.bounds.to_internal(self.value)?)
    }

    /// Map an internal optimizer value back to a bounded external value.
    /// The result is clamped so rounding at a bound cannot escape it.
    pub fn from_internal(&self, internal: f64) -> f64 {
        self.bounds.clamp(self.bounds.to_external(internal))
    }
}
