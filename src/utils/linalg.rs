//! Dense symmetric linear algebra for the normal equations.
//!
//! The optimizer and the covariance estimate both work with small symmetric
//! positive definite systems (one row/column per free parameter), so a plain
//! Cholesky factorization without pivoting is sufficient.

use crate::error::{PeakFitError, Result};
use ndarray::{Array1, Array2};

/// Compute the lower Cholesky factor `L` of a symmetric positive definite
/// matrix `A = L L^T`. Returns `None` if the matrix is not positive
/// definite.
pub fn cholesky_factor(a: &Array2<f64>) -> Option<Array2<f64>> {
    let n = a.nrows();
    if a.ncols() != n {
        return None;
    }

    let mut l = Array2::zeros((n, n));
    for k in 0..n {
        let mut diag = a[[k, k]];
        for j in 0..k {
            diag -= l[[k, j]] * l[[k, j]];
        }
        if diag <= 0.0 || !diag.is_finite() {
            return None;
        }
        let diag_sqrt = diag.sqrt();
        l[[k, k]] = diag_sqrt;

        for i in k + 1..n {
            let mut v = a[[i, k]];
            for j in 0..k {
                v -= l[[i, j]] * l[[k, j]];
            }
            l[[i, k]] = v / diag_sqrt;
        }
    }
    Some(l)
}

/// Solve `L L^T x = b` given the lower Cholesky factor `L`.
pub fn cholesky_solve(l: &Array2<f64>, b: &Array1<f64>) -> Result<Array1<f64>> {
    let n = l.nrows();
    if b.len() != n {
        return Err(PeakFitError::DimensionMismatch(format!(
            "factor is {}x{} but right-hand side has length {}",
            n,
            n,
            b.len()
        )));
    }

    // Forward substitution: L y = b
    let mut y = b.clone();
    for i in 0..n {
        for j in 0..i {
            let yj = y[j];
            y[i] -= l[[i, j]] * yj;
        }
        y[i] /= l[[i, i]];
    }

    // Backward substitution: L^T x = y
    let mut x = Array1::zeros(n);
    for i in (0..n).rev() {
        x[i] = y[i];
        for j in i + 1..n {
            x[i] -= l[[j, i]] * x[j];
        }
        x[i] /= l[[i, i]];
    }

    Ok(x)
}

/// Invert a symmetric positive definite matrix via its Cholesky factor.
/// Returns an error if the matrix is singular or indefinite.
pub fn spd_inverse(a: &Array2<f64>) -> Result<Array2<f64>> {
    let n = a.nrows();
    let l = cholesky_factor(a).ok_or_else(|| {
        PeakFitError::Configuration("matrix is singular or not positive definite".to_string())
    })?;

    let mut inv = Array2::zeros((n, n));
    for k in 0..n {
        let mut e = Array1::zeros(n);
        e[k] = 1.0;
        let col = cholesky_solve(&l, &e)?;
        for i in 0..n {
            inv[[i, k]] = col[i];
        }
    }
    Ok(inv)
}
