//! Numerical utilities shared by the optimizer and the uncertainty estimate.

pub mod finite_difference;
pub mod linalg;
