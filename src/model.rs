//! Multi-peak model composition.
//!
//! A [`PeakModel`] is the sum of a polynomial background and any number of
//! independently defined peaks. Each peak's shape kind is decided once, at
//! model construction, from its mixing ratio: a ratio fixed at exactly 1
//! selects a pure Gaussian, exactly 0 a pure Lorentzian, anything else a
//! pseudo-Voigt. The model owns a [`Parameters`] collection whose insertion
//! order (background coefficients first, then enabled peaks ascending by
//! slot) is the canonical ordering for display and export.

use crate::error::{PeakFitError, Result};
use crate::lineshape;
use crate::parameters::{ParamValue, Parameter, Parameters};
use ndarray::Array1;
use serde::{Deserialize, Serialize};

/// The shape of one peak, decided at model construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeakShape {
    Gaussian,
    Lorentzian,
    PseudoVoigt,
}

/// One peak slot: seed values for its parameters plus an enabled flag.
///
/// `index` is the 1-based slot identifier; it is carried through parameter
/// names (`area_3`, `center_3`, ...) and export columns unchanged, so
/// results can be correlated back to the slot that produced them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeakDefinition {
    /// 1-based slot identifier.
    pub index: usize,

    /// Disabled peaks contribute no parameters and are excluded from the
    /// model and the residual.
    pub enabled: bool,

    /// Gaussian/Lorentzian mixing ratio. Fixed at 1 or 0 this degenerates
    /// the peak to a pure shape.
    pub ratio: ParamValue,

    /// Integrated peak area.
    pub area: ParamValue,

    /// Peak center position.
    pub center: ParamValue,

    /// Gaussian FWHM. Required unless the peak is pure Lorentzian.
    pub g_fwhm: Option<ParamValue>,

    /// Lorentzian FWHM. Required unless the peak is pure Gaussian.
    pub l_fwhm: Option<ParamValue>,
}

impl PeakDefinition {
    /// A pure Gaussian peak (ratio pinned at 1).
    pub fn gaussian(index: usize, area: ParamValue, center: ParamValue, fwhm: ParamValue) -> Self {
        Self {
            index,
            enabled: true,
            ratio: ParamValue::fixed(1.0),
            area,
            center,
            g_fwhm: Some(fwhm),
            l_fwhm: None,
        }
    }

    /// A pure Lorentzian peak (ratio pinned at 0).
    pub fn lorentzian(
        index: usize,
        area: ParamValue,
        center: ParamValue,
        fwhm: ParamValue,
    ) -> Self {
        Self {
            index,
            enabled: true,
            ratio: ParamValue::fixed(0.0),
            area,
            center,
            g_fwhm: None,
            l_fwhm: Some(fwhm),
        }
    }

    /// A pseudo-Voigt peak with both widths.
    pub fn pseudo_voigt(
        index: usize,
        area: ParamValue,
        center: ParamValue,
        ratio: ParamValue,
        g_fwhm: ParamValue,
        l_fwhm: ParamValue,
    ) -> Self {
        Self {
            index,
            enabled: true,
            ratio,
            area,
            center,
            g_fwhm: Some(g_fwhm),
            l_fwhm: Some(l_fwhm),
        }
    }

    /// Decide the shape kind from the mixing ratio, checking that the
    /// required width parameters are present.
    pub fn shape_kind(&self) -> Result<PeakShape> {
        let kind = if self.ratio.fixed && self.ratio.value == 1.0 {
            PeakShape::Gaussian
        } else if self.ratio.fixed && self.ratio.value == 0.0 {
            PeakShape::Lorentzian
        } else {
            PeakShape::PseudoVoigt
        };

        let missing = match kind {
            PeakShape::Gaussian => self.g_fwhm.is_none(),
            PeakShape::Lorentzian => self.l_fwhm.is_none(),
            PeakShape::PseudoVoigt => self.g_fwhm.is_none() || self.l_fwhm.is_none(),
        };
        if missing {
            return Err(PeakFitError::Configuration(format!(
                "peak {} is missing a required width parameter",
                self.index
            )));
        }
        Ok(kind)
    }
}

/// Seed values for the polynomial background coefficients, constant term
/// first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackgroundDefinition {
    pub coefficients: Vec<ParamValue>,
}

impl BackgroundDefinition {
    /// A degree-2 background.
    pub fn quadratic(a: ParamValue, b: ParamValue, c: ParamValue) -> Self {
        Self {
            coefficients: vec![a, b, c],
        }
    }

    /// A degree-4 background.
    pub fn quartic(
        a: ParamValue,
        b: ParamValue,
        c: ParamValue,
        d: ParamValue,
        e: ParamValue,
    ) -> Self {
        Self {
            coefficients: vec![a, b, c, d, e],
        }
    }

    /// The polynomial degree.
    pub fn degree(&self) -> usize {
        self.coefficients.len().saturating_sub(1)
    }
}

/// Name of the i-th background coefficient: `bg_a`, `bg_b`, ...
fn coefficient_name(i: usize) -> String {
    format!("bg_{}", (b'a' + i as u8) as char)
}

fn add_seed(params: &mut Parameters, name: &str, seed: ParamValue) -> Result<()> {
    if seed.fixed {
        params.add(Parameter::fixed(name, seed.value))?;
    } else {
        params.add_param(name, seed.value)?;
    }
    Ok(())
}

fn add_seed_with_bounds(
    params: &mut Parameters,
    name: &str,
    seed: ParamValue,
    min: f64,
    max: f64,
) -> Result<()> {
    if seed.fixed {
        params.add(Parameter::fixed(name, seed.value))?;
    } else {
        params.add_param_with_bounds(name, seed.value, min, max)?;
    }
    Ok(())
}

/// The composed background-plus-peaks model.
#[derive(Debug, Clone)]
pub struct PeakModel {
    n_background: usize,
    peaks: Vec<(usize, PeakShape)>,
    params: Parameters,
}

impl PeakModel {
    /// Build the model from a background definition and a set of peak
    /// definitions. Disabled peaks are dropped; enabled peaks are sorted
    /// ascending by slot index. Fails on duplicate slot indices, on an
    /// empty background, or on an enabled peak missing a required width.
    pub fn new(background: &BackgroundDefinition, peaks: &[PeakDefinition]) -> Result<Self> {
        if background.coefficients.is_empty() {
            return Err(PeakFitError::Configuration(
                "background must have at least one coefficient".to_string(),
            ));
        }

        let mut params = Parameters::new();
        for (i, &coeff) in background.coefficients.iter().enumerate() {
            add_seed(&mut params, &coefficient_name(i), coeff)?;
        }

        let mut enabled: Vec<&PeakDefinition> = peaks.iter().filter(|p| p.enabled).collect();
        enabled.sort_by_key(|p| p.index);
        for pair in enabled.windows(2) {
            if pair[0].index == pair[1].index {
                return Err(PeakFitError::Configuration(format!(
                    "duplicate peak slot index {}",
                    pair[0].index
                )));
            }
        }

        let mut shapes = Vec::with_capacity(enabled.len());
        for peak in enabled {
            let kind = peak.shape_kind()?;
            let i = peak.index;

            add_seed_with_bounds(&mut params, &format!("ratio_{i}"), peak.ratio, 0.0, 1.0)?;
            add_seed_with_bounds(&mut params, &format!("area_{i}"), peak.area, 0.0, f64::INFINITY)?;
            add_seed(&mut params, &format!("center_{i}"), peak.center)?;
            if let (PeakShape::Gaussian | PeakShape::PseudoVoigt, Some(w)) = (kind, peak.g_fwhm) {
                add_seed_with_bounds(&mut params, &format!("G_FWHM_{i}"), w, 0.0, f64::INFINITY)?;
            }
            if let (PeakShape::Lorentzian | PeakShape::PseudoVoigt, Some(w)) = (kind, peak.l_fwhm) {
                add_seed_with_bounds(&mut params, &format!("L_FWHM_{i}"), w, 0.0, f64::INFINITY)?;
            }
            shapes.push((i, kind));
        }

        Ok(Self {
            n_background: background.coefficients.len(),
            peaks: shapes,
            params,
        })
    }

    /// The model's parameter collection, in canonical order.
    pub fn parameters(&self) -> &Parameters {
        &self.params
    }

    /// Mutable access to the model's parameters.
    pub fn parameters_mut(&mut self) -> &mut Parameters {
        &mut self.params
    }

    /// The enabled peaks as `(slot index, shape)` pairs, ascending by slot.
    pub fn peaks(&self) -> &[(usize, PeakShape)] {
        &self.peaks
    }

    /// The number of background coefficients.
    pub fn background_len(&self) -> usize {
        self.n_background
    }

    fn value_of(params: &Parameters, name: &str) -> Result<f64> {
        params
            .get(name)
            .map(|p| p.value())
            .ok_or_else(|| PeakFitError::Parameter(format!("parameter '{}' not found", name)))
    }

    fn background_coeffs(&self, params: &Parameters) -> Result<Vec<f64>> {
        (0..self.n_background)
            .map(|i| Self::value_of(params, &coefficient_name(i)))
            .collect()
    }

    fn peak_value(
        &self,
        params: &Parameters,
        index: usize,
        kind: PeakShape,
        x: f64,
    ) -> Result<f64> {
        let area = Self::value_of(params, &format!("area_{index}"))?;
        let center = Self::value_of(params, &format!("center_{index}"))?;
        let y = match kind {
            PeakShape::Gaussian => {
                let fwhm = Self::value_of(params, &format!("G_FWHM_{index}"))?;
                lineshape::gaussian(x, area, center, fwhm)
            }
            PeakShape::Lorentzian => {
                let fwhm = Self::value_of(params, &format!("L_FWHM_{index}"))?;
                lineshape::lorentzian(x, area, center, fwhm)
            }
            PeakShape::PseudoVoigt => {
                let ratio = Self::value_of(params, &format!("ratio_{index}"))?;
                let g_fwhm = Self::value_of(params, &format!("G_FWHM_{index}"))?;
                let l_fwhm = Self::value_of(params, &format!("L_FWHM_{index}"))?;
                lineshape::pseudo_voigt(x, area, center, ratio, g_fwhm, l_fwhm)
            }
        };
        Ok(y)
    }

    /// Evaluate the full model (background plus all peaks) with an explicit
    /// parameter collection.
    pub fn eval_with(&self, params: &Parameters, x: &Array1<f64>) -> Result<Array1<f64>> {
        let coeffs = self.background_coeffs(params)?;
        let mut y = x.mapv(|xi| lineshape::polynomial(xi, &coeffs));
        for &(index, kind) in &self.peaks {
            for (yi, &xi) in y.iter_mut().zip(x.iter()) {
                *yi += self.peak_value(params, index, kind, xi)?;
            }
        }
        Ok(y)
    }

    /// Evaluate the full model with the model's own parameters.
    pub fn eval(&self, x: &Array1<f64>) -> Result<Array1<f64>> {
        self.eval_with(&self.params, x)
    }

    /// Evaluate the background polynomial alone.
    pub fn eval_background(&self, x: &Array1<f64>) -> Result<Array1<f64>> {
        let coeffs = self.background_coeffs(&self.params)?;
        Ok(x.mapv(|xi| lineshape::polynomial(xi, &coeffs)))
    }

    /// Evaluate one peak by slot index, optionally adding the background.
    pub fn eval_peak(
        &self,
        index: usize,
        x: &Array1<f64>,
        with_background: bool,
    ) -> Result<Array1<f64>> {
        let kind = self
            .peaks
            .iter()
            .find(|&&(i, _)| i == index)
            .map(|&(_, k)| k)
            .ok_or_else(|| {
                PeakFitError::Configuration(format!("no enabled peak in slot {}", index))
            })?;

        let mut y = if with_background {
            self.eval_background(x)?
        } else {
            Array1::zeros(x.len())
        };
        for (yi, &xi) in y.iter_mut().zip(x.iter()) {
            *yi += self.peak_value(&self.params, index, kind, xi)?;
        }
        Ok(y)
    }
}
