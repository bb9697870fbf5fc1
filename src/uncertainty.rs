//! Post-fit uncertainty estimates.
//!
//! Standard errors come from the covariance of the weighted least-squares
//! estimate: `cov = redchi * (J^T J)^-1`, where `J` is the Jacobian of the
//! weighted residuals with respect to the free parameters (in external,
//! bounded space) and `redchi` scales the errors to the observed residual
//! level.

use crate::error::{PeakFitError, Result};
use crate::utils::linalg;
use ndarray::{Array1, Array2};

/// Covariance matrix of the free parameters. Fails when `J^T J` is
/// singular, which happens for degenerate or unidentifiable models.
pub fn covariance_matrix(jacobian: &Array2<f64>, redchi: f64) -> Result<Array2<f64>> {
    let jtj = jacobian.t().dot(jacobian);
    let mut cov = linalg::spd_inverse(&jtj).map_err(|_| {
        PeakFitError::FitConvergence(
            "could not estimate uncertainties: J^T J is singular".to_string(),
        )
    })?;
    cov.mapv_inplace(|v| v * redchi);
    Ok(cov)
}

/// Standard errors: square roots of the covariance diagonal.
pub fn standard_errors(covariance: &Array2<f64>) -> Array1<f64> {
    covariance.diag().mapv(|v| if v > 0.0 { v.sqrt() } else { 0.0 })
}

/// Correlation matrix derived from a covariance matrix.
pub fn correlation_matrix(covariance: &Array2<f64>) -> Array2<f64> {
    let sigma = standard_errors(covariance);
    let n = covariance.nrows();
    let mut corr = Array2::zeros((n, n));
    for i in 0..n {
        for j in 0..n {
            let denom = sigma[i] * sigma[j];
            corr[[i, j]] = if denom > 0.0 {
                covariance[[i, j]] / denom
            } else {
                0.0
            };
        }
    }
    corr
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    #[test]
    fn test_covariance_for_orthogonal_jacobian() {
        // J^T J = diag(4, 9), inverse = diag(1/4, 1/9)
        let jacobian = array![[2.0, 0.0], [0.0, 3.0]];
        let cov = covariance_matrix(&jacobian, 1.0).unwrap();

        assert_relative_eq!(cov[[0, 0]], 0.25, epsilon = 1e-12);
        assert_relative_eq!(cov[[1, 1]], 1.0 / 9.0, epsilon = 1e-12);
        assert_relative_eq!(cov[[0, 1]], 0.0, epsilon = 1e-12);

        // redchi scales the whole matrix.
        let scaled = covariance_matrix(&jacobian, 4.0).unwrap();
        assert_relative_eq!(scaled[[0, 0]], 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_standard_errors() {
        let cov = array![[0.25, 0.0], [0.0, 0.04]];
        let errs = standard_errors(&cov);
        assert_relative_eq!(errs[0], 0.5, epsilon = 1e-12);
        assert_relative_eq!(errs[1], 0.2, epsilon = 1e-12);
    }

    #[test]
    fn test_correlation_matrix() {
        let cov = array![[4.0, 1.0], [1.0, 1.0]];
        let corr = correlation_matrix(&cov);
        assert_relative_eq!(corr[[0, 0]], 1.0, epsilon = 1e-12);
        assert_relative_eq!(corr[[1, 1]], 1.0, epsilon = 1e-12);
        assert_relative_eq!(corr[[0, 1]], 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_singular_jacobian_is_an_error() {
        // Two identical columns: parameters are unidentifiable.
        let jacobian = array![[1.0, 1.0], [2.0, 2.0], [3.0, 3.0]];
        assert!(covariance_matrix(&jacobian, 1.0).is_err());
    }
}
