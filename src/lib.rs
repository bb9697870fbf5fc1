//! # peakfit
//!
//! `peakfit` fits spectroscopic line-shape models (Gaussian, Lorentzian,
//! pseudo-Voigt) plus a polynomial background to `(x, y, y-error)` data
//! with a weighted Levenberg-Marquardt least-squares solver.
//!
//! The library provides:
//! - A parameter system with bounds, fix/vary flags, and the `'c'`
//!   fixed-value text convention
//! - Area-normalized peak shape functions and a multi-peak model composer
//! - A Levenberg-Marquardt fit engine with standard-error estimates
//! - Post-fit curve reconstruction and CSV import/export
//!
//! ## Basic Usage
//!
//! ```no_run
//! use peakfit::model::{BackgroundDefinition, PeakDefinition};
//! use peakfit::parameters::ParamValue;
//! use peakfit::{fit, Dataset};
//!
//! # fn main() -> peakfit::Result<()> {
//! let dataset = Dataset::from_csv_path("scan.csv", Default::default())?;
//!
//! let background = BackgroundDefinition::quadratic(
//!     ParamValue::free(0.0),
//!     ParamValue::free(0.0),
//!     ParamValue::free(0.0),
//! );
//! let peak = PeakDefinition::gaussian(
//!     1,
//!     ParamValue::free(40.0),
//!     ParamValue::free(5.0),
//!     ParamValue::free(2.0),
//! );
//!
//! let result = fit::fit(&dataset, &background, &[peak], None)?;
//! println!("redchi = {}", result.redchi);
//! # Ok(())
//! # }
//! ```

pub mod error;

// Parameter system
pub mod parameters;

// Model and shape functions
pub mod lineshape;
pub mod model;

// Fit engine
pub mod fit;
pub mod lm;
pub mod problem;
pub mod uncertainty;
mod utils;

// Data handling
pub mod curves;
pub mod data;
pub mod export;

// Re-exports for convenience
pub use data::{ColumnSelection, Dataset};
pub use error::{PeakFitError, Result};
pub use fit::{FitRange, FitResult};
pub use lm::LevenbergMarquardt;
pub use model::{BackgroundDefinition, PeakDefinition, PeakModel, PeakShape};
pub use problem::Problem;

/// Version of the library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
