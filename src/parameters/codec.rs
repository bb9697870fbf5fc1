//! Text codec for the fixed-parameter entry convention.
//!
//! Entry fields accept either a plain float (free parameter) or a float
//! immediately followed by the letter `c` (fixed parameter, held constant
//! during the fit). `decode` turns such text into a [`ParamValue`];
//! `encode` formats a value for redisplay, with 4 decimal places and the
//! suffix re-appended when the parameter is fixed.

use crate::error::{PeakFitError, Result};
use serde::{Deserialize, Serialize};

/// Suffix character marking a fixed parameter in text form.
pub const FIXED_SUFFIX: char = 'c';

/// A decoded parameter entry: a value plus its free/fixed flag. This is the
/// internal representation; the `'c'` suffix exists only in the text
/// interchange format.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParamValue {
    /// The numeric value.
    pub value: f64,

    /// Whether the optimizer must hold the value constant.
    pub fixed: bool,
}

impl ParamValue {
    /// A free (optimizer-adjustable) value.
    pub fn free(value: f64) -> Self {
        Self {
            value,
            fixed: false,
        }
    }

    /// A fixed (held-constant) value.
    pub fn fixed(value: f64) -> Self {
        Self { value, fixed: true }
    }
}

/// Decode a parameter entry. A trailing `'c'` marks the value as fixed; the
/// remainder must parse as a float.
pub fn decode(text: &str) -> Result<ParamValue> {
    let text = text.trim();
    let (number, fixed) = match text.strip_suffix(FIXED_SUFFIX) {
        Some(rest) => (rest, true),
        None => (text, false),
    };

    let value: f64 = number
        .trim()
        .parse()
        .map_err(|_| PeakFitError::Parse(format!("invalid parameter entry '{}'", text)))?;

    Ok(ParamValue { value, fixed })
}

/// Encode a parameter entry for display: 4 decimal places, `'c'` appended
/// iff the value is fixed.
pub fn encode(param: ParamValue) -> String {
    if param.fixed {
        format!("{:.4}{}", param.value, FIXED_SUFFIX)
    } else {
        format!("{:.4}", param.value)
    }
}
