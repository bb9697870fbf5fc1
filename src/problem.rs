//! Least-squares problem interface.
//!
//! [`Problem`] is the seam between a model and the optimizer: it evaluates a
//! residual vector as a function of the free parameters (in the optimizer's
//! internal space) and reports dimensions. The Jacobian defaults to a
//! forward finite-difference approximation.

use crate::error::Result;
use crate::utils::finite_difference;
use ndarray::{Array1, Array2};

/// A nonlinear least-squares problem.
pub trait Problem {
    /// Evaluate the residual vector at the given parameter values.
    fn eval(&self, params: &Array1<f64>) -> Result<Array1<f64>>;

    /// The number of free parameters.
    fn parameter_count(&self) -> usize;

    /// The number of residuals.
    fn residual_count(&self) -> usize;

    /// Evaluate the Jacobian `J[i, j] = d residual[i] / d param[j]` at the
    /// given parameter values. The default implementation uses forward
    /// finite differences.
    fn jacobian(&self, params: &Array1<f64>) -> Result<Array2<f64>>
    where
        Self: Sized,
    {
        finite_difference::jacobian(self, params, None)
    }

    /// Evaluate the sum of squared residuals.
    fn eval_cost(&self, params: &Array1<f64>) -> Result<f64> {
        let residuals = self.eval(params)?;
        Ok(residuals.iter().map(|r| r * r).sum())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PeakFitError;
    use approx::assert_relative_eq;
    use ndarray::array;

    /// f(x) = a * x + b
    struct LinearModel {
        x_data: Array1<f64>,
        y_data: Array1<f64>,
    }

    impl Problem for LinearModel {
        fn eval(&self, params: &Array1<f64>) -> Result<Array1<f64>> {
            if params.len() != 2 {
                return Err(PeakFitError::DimensionMismatch(format!(
                    "expected 2 parameters, got {}",
                    params.len()
                )));
            }
            let (a, b) = (params[0], params[1]);
            Ok(self
                .x_data
                .iter()
                .zip(self.y_data.iter())
                .map(|(x, y)| a * x + b - y)
                .collect())
        }

        fn parameter_count(&self) -> usize {
            2
        }

        fn residual_count(&self) -> usize {
            self.x_data.len()
        }
    }

    #[test]
    fn test_eval_and_cost() {
        let model = LinearModel {
            x_data: array![1.0, 2.0, 3.0, 4.0, 5.0],
            y_data: array![2.0, 4.0, 6.0, 8.0, 10.0],
        };

        let residuals = model.eval(&array![2.0, 0.0]).unwrap();
        for r in residuals.iter() {
            assert_relative_eq!(*r, 0.0, epsilon = 1e-10);
        }
        assert_relative_eq!(
            model.eval_cost(&array![2.0, 0.0]).unwrap(),
            0.0,
            epsilon = 1e-10
        );

        // a = 1: residual i is -(i+1), cost = 1 + 4 + ... + 25
        let cost = model.eval_cost(&array![1.0, 0.0]).unwrap();
        assert_relative_eq!(cost, 55.0, epsilon = 1e-10);
    }

    #[test]
    fn test_default_jacobian() {
        let model = LinearModel {
            x_data: array![1.0, 2.0, 3.0],
            y_data: array![2.0, 4.0, 6.0],
        };

        let jac = model.jacobian(&array![2.0, 1.0]).unwrap();
        assert_eq!(jac.shape(), &[3, 2]);
        for i in 0..3 {
            assert_relative_eq!(jac[[i, 0]], model.x_data[i], epsilon = 1e-5);
            assert_relative_eq!(jac[[i, 1]], 1.0, epsilon = 1e-5);
        }
    }

    #[test]
    fn test_dimension_mismatch() {
        let model = LinearModel {
            x_data: array![1.0],
            y_data: array![1.0],
        };
        assert!(model.eval(&array![1.0]).is_err());
    }
}
