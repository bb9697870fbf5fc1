//! # Parameter System
//!
//! Named fit parameters with bounds and fix/vary flags, plus the text codec
//! for the `'c'` fixed-suffix entry convention.
//!
//! - [`Parameter`]: one named scalar with value, bounds, vary flag, and
//!   post-fit standard error
//! - [`Parameters`]: an insertion-ordered collection with a deterministic
//!   internal-vector round-trip for the optimizer
//! - [`Bounds`]: min/max constraints and the Minuit-style internal transform
//! - [`codec`]: text decode/encode of the `'c'` fixed-value convention

pub mod bounds;
pub mod codec;
pub mod parameter;
pub mod parameters;

pub use bounds::{Bounds, BoundsError};
pub use codec::{decode, encode, ParamValue, FIXED_SUFFIX};
pub use parameter::{Parameter, ParameterError};
pub use parameters::Parameters;
