use thiserror::Error;

/// Error types for the peakfit library.
#[derive(Error, Debug)]
pub enum PeakFitError {
    /// Malformed numeric or parameter text (e.g. a bad `'c'`-suffixed entry).
    #[error("Parse error: {0}")]
    Parse(String),

    /// Malformed or inconsistent dataset (bad column index, empty series,
    /// mismatched lengths).
    #[error("Data error: {0}")]
    Data(String),

    /// Invalid model configuration (enabled peak missing a required width,
    /// duplicate slot index, nothing to optimize).
    #[error("Invalid model configuration: {0}")]
    Configuration(String),

    /// The solver did not converge or the covariance could not be estimated.
    #[error("Fit did not converge: {0}")]
    FitConvergence(String),

    /// Error from the parameter system.
    #[error("Parameter error: {0}")]
    Parameter(String),

    /// Mismatch in vector or matrix dimensions.
    #[error("Dimension mismatch: {0}")]
    DimensionMismatch(String),

    /// I/O error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV read/write error wrapper.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl From<crate::parameters::parameter::ParameterError> for PeakFitError {
    fn from(err: crate::parameters::parameter::ParameterError) -> Self {
        PeakFitError::Parameter(format!("{}", err))
    }
}

impl From<crate::parameters::bounds::BoundsError> for PeakFitError {
    fn from(err: crate::parameters::bounds::BoundsError) -> Self {
        PeakFitError::Parameter(format!("{}", err))
    }
}

/// Result type alias for peakfit operations.
pub type Result<T> = std::result::Result<T, PeakFitError>;
