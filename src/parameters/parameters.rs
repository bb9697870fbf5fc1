//! Parameters collection implementation.
//!
//! [`Parameters`] is an insertion-ordered collection of named [`Parameter`]
//! objects. The order is deterministic so that display and export columns
//! always line up with the order in which a model added its parameters.
//! The varying (free) subset round-trips to and from the optimizer's
//! internal vector representation.

use crate::parameters::parameter::{Parameter, ParameterError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// An insertion-ordered collection of named parameters.
///
/// Serializes as a plain list; the name index is rebuilt on
/// deserialization, rejecting duplicate names.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(try_from = "Vec<Parameter>", into = "Vec<Parameter>")]
pub struct Parameters {
    /// Parameters in insertion order.
    params: Vec<Parameter>,

    /// Map of parameter names to their position in `params`.
    index: HashMap<String, usize>,
}

impl Parameters {
    /// Create a new empty parameters collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a parameter to the collection, failing on a duplicate name.
    pub fn add(&mut self, param: Parameter) -> Result<(), ParameterError> {
        let name = param.name().to_string();
        if self.index.contains_key(&name) {
            return Err(ParameterError::DuplicateName { name });
        }
        self.index.insert(name, self.params.len());
        self.params.push(param);
        Ok(())
    }

    /// Add a new free, unbounded parameter with the given name and value.
    pub fn add_param(&mut self, name: &str, value: f64) -> Result<(), ParameterError> {
        self.add(Parameter::new(name, value))
    }

    /// Add a new free parameter with bounds.
    pub fn add_param_with_bounds(
        &mut self,
        name: &str,
        value: f64,
        min: f64,
        max: f64,
    ) -> Result<(), ParameterError> {
        self.add(Parameter::with_bounds(name, value, min, max)?)
    }

    /// Get a parameter by name.
    pub fn get(&self, name: &str) -> Option<&Parameter> {
        self.index.get(name).map(|&i| &self.params[i])
    }

    /// Get a mutable reference to a parameter by name.
    pub fn get_mut(&mut self, name: &str) -> Option<&mut Parameter> {
        let i = *self.index.get(name)?;
        Some(&mut self.params[i])
    }

    /// Check if the collection contains a parameter with the given name.
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// The number of parameters in the collection.
    pub fn len(&self) -> usize {
        self.params.len()
    }

    /// Check if the collection is empty.
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Iterate over the parameters in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Parameter> {
        self.params.iter()
    }

    /// Iterate mutably over the parameters in insertion order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Parameter> {
        self.params.iter_mut()
    }

    /// The parameter names in insertion order.
    pub fn names(&self) -> Vec<String> {
        self.params.iter().map(|p| p.name().to_string()).collect()
    }

    /// The varying (free) parameters in insertion order.
    pub fn varying(&self) -> Vec<&Parameter> {
        self.params.iter().filter(|p| p.vary()).collect()
    }

    /// The number of varying parameters.
    pub fn varying_count(&self) -> usize {
        self.params.iter().filter(|p| p.vary()).count()
    }

    /// The names of the varying parameters in insertion order.
    pub fn varying_names(&self) -> Vec<String> {
        self.params
            .iter()
            .filter(|p| p.vary())
            .map(|p| p.name().to_string())
            .collect()
    }

    /// The varying parameters' current values in the optimizer's internal
    /// (bounds-transformed) space, in insertion order.
    pub fn varying_internal_values(&self) -> Result<Vec<f64>, ParameterError> {
        self.params
            .iter()
            .filter(|p| p.vary())
            .map(|p| p.to_internal())
            .collect()
    }

    /// Update the varying parameters from a vector of internal values. The
    /// slice length must equal the number of varying parameters; fixed
    /// parameters are untouched.
    pub fn update_from_internal(&mut self, internal: &[f64]) -> Result<(), ParameterError> {
        let n_varying = self.varying_count();
        if internal.len() != n_varying {
            return Err(ParameterError::LengthMismatch {
                expected: n_varying,
                actual: internal.len(),
            });
        }

        for (param, &v) in self
            .params
            .iter_mut()
            .filter(|p| p.vary())
            .zip(internal.iter())
        {
            let external = param.from_internal(v);
            param.set_value(external)?;
        }
        Ok(())
    }

    /// Clear all standard errors (e.g. before a new fit).
    pub fn clear_stderr(&mut self) {
        for p in self.params.iter_mut() {
            p.set_stderr(None);
        }
    }
}

impl TryFrom<Vec<Parameter>> for Parameters {
    type Error = ParameterError;

    fn try_from(params: Vec<Parameter>) -> Result<Self, ParameterError> {
        let mut collection = Parameters::new();
        for param in params {
            collection.add(param)?;
        }
        Ok(collection)
    }
}

impl From<Parameters> for Vec<Parameter> {
    fn from(collection: Parameters) -> Self {
        collection.params
    }
}

impl<'a> IntoIterator for &'a Parameters {
    type Item = &'a Parameter;
    type IntoIter = std::slice::Iter<'a, Parameter>;

    fn into_iter(self) -> Self::IntoIter {
        self.params.iter()
    }
}
