//! Post-fit curve reconstruction.
//!
//! Rebuilds the total model curve, the background-only curve, and each
//! peak's curve on an arbitrary x-grid, typically either the original
//! dataset's x values or a denser grid for smooth plotting.

use crate::error::Result;
use crate::fit::FitResult;
use ndarray::Array1;

/// Default oversampling factor for [`dense_grid`].
pub const DEFAULT_OVERSAMPLE: usize = 10;

/// One reconstructed peak curve, tagged with its originating slot index.
#[derive(Debug, Clone)]
pub struct PeakCurve {
    pub index: usize,
    pub y: Array1<f64>,
}

/// The reconstructed curves of a fit.
#[derive(Debug, Clone)]
pub struct CurveSet {
    /// The grid the curves were evaluated on.
    pub x: Array1<f64>,

    /// Background plus all peaks.
    pub total: Array1<f64>,

    /// Background polynomial alone.
    pub background: Array1<f64>,

    /// One curve per enabled peak, ascending by slot index.
    pub peaks: Vec<PeakCurve>,
}

/// A dense evaluation grid spanning `[min(x), max(x)]` with `oversample`
/// times as many points as the input grid.
pub fn dense_grid(x: &Array1<f64>, oversample: usize) -> Array1<f64> {
    let oversample = oversample.max(1);
    let min = x.iter().fold(f64::INFINITY, |a, &b| a.min(b));
    let max = x.iter().fold(f64::NEG_INFINITY, |a, &b| a.max(b));
    if !min.is_finite() || !max.is_finite() || min == max {
        return x.clone();
    }
    Array1::linspace(min, max, x.len() * oversample)
}

/// Reconstruct all curves of a fit on the given grid. Peak curves include
/// the background when `with_background` is set, matching the two export
/// and plotting variants.
pub fn reconstruct(result: &FitResult, x: &Array1<f64>, with_background: bool) -> Result<CurveSet> {
    let model = result.model();
    let total = model.eval(x)?;
    let background = model.eval_background(x)?;

    let mut peaks = Vec::with_capacity(model.peaks().len());
    for &(index, _) in model.peaks() {
        peaks.push(PeakCurve {
            index,
            y: model.eval_peak(index, x, with_background)?,
        });
    }

    Ok(CurveSet {
        x: x.clone(),
        total,
        background,
        peaks,
    })
}
