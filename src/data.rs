//! Dataset container and CSV import.
//!
//! A [`Dataset`] holds the `(x, y, y_err)` columns of one measurement.
//! CSV import is deliberately forgiving: cells that are missing or fail to
//! parse become NaN, and rows whose `y` is NaN are dropped. Uncertainties
//! at or below [`MIN_Y_ERR`] are coerced to 1 so they cannot blow up the
//! weighted residual.

use crate::error::{PeakFitError, Result};
use crate::fit::FitRange;
use log::warn;
use ndarray::Array1;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Uncertainties at or below this are treated as absent.
pub const MIN_Y_ERR: f64 = 1e-10;

/// Which 1-based CSV columns hold x, y, and the y uncertainty. A `None`
/// uncertainty column means every point gets `y_err = 1`.
#[derive(Debug, Clone, Copy)]
pub struct ColumnSelection {
    pub x: usize,
    pub y: usize,
    pub y_err: Option<usize>,
}

impl Default for ColumnSelection {
    fn default() -> Self {
        Self {
            x: 1,
            y: 2,
            y_err: Some(3),
        }
    }
}

/// One measurement: x positions, observed y values, and y uncertainties.
#[derive(Debug, Clone)]
pub struct Dataset {
    x: Array1<f64>,
    y: Array1<f64>,
    y_err: Array1<f64>,
}

impl Dataset {
    /// Build a dataset from equal-length, non-empty columns. Uncertainties
    /// at or below [`MIN_Y_ERR`] are replaced with 1.
    pub fn new(x: Array1<f64>, y: Array1<f64>, y_err: Array1<f64>) -> Result<Self> {
        if x.is_empty() {
            return Err(PeakFitError::Data("dataset is empty".to_string()));
        }
        if x.len() != y.len() || x.len() != y_err.len() {
            return Err(PeakFitError::Data(format!(
                "column lengths differ: x={}, y={}, y_err={}",
                x.len(),
                y.len(),
                y_err.len()
            )));
        }

        // The negated comparison also catches NaN uncertainties.
        let mut y_err = y_err;
        let coerced = y_err.iter().filter(|&&e| !(e > MIN_Y_ERR)).count();
        if coerced > 0 {
            warn!("{} uncertainties at or below {:e} coerced to 1", coerced, MIN_Y_ERR);
            y_err.mapv_inplace(|e| if e > MIN_Y_ERR { e } else { 1.0 });
        }

        Ok(Self { x, y, y_err })
    }

    /// Load a dataset from a CSV file with a header row.
    pub fn from_csv_path<P: AsRef<Path>>(path: P, columns: ColumnSelection) -> Result<Self> {
        let file = File::open(path)?;
        Self::from_csv_reader(file, columns)
    }

    /// Load a dataset from CSV text with a header row. Cells that are
    /// missing or unparseable become NaN; rows with NaN `y` are dropped.
    pub fn from_csv_reader<R: Read>(reader: R, columns: ColumnSelection) -> Result<Self> {
        if columns.x == 0 || columns.y == 0 || columns.y_err == Some(0) {
            return Err(PeakFitError::Configuration(
                "column selection is 1-based".to_string(),
            ));
        }

        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let cell = |record: &csv::StringRecord, col: usize| -> f64 {
            record
                .get(col - 1)
                .and_then(|s| s.trim().parse::<f64>().ok())
                .unwrap_or(f64::NAN)
        };

        let mut x = Vec::new();
        let mut y = Vec::new();
        let mut y_err = Vec::new();
        let mut dropped = 0usize;
        for record in csv_reader.records() {
            let record = record?;

            let yi = cell(&record, columns.y);
            if yi.is_nan() {
                dropped += 1;
                continue;
            }
            x.push(cell(&record, columns.x));
            y.push(yi);
            y_err.push(match columns.y_err {
                Some(col) => cell(&record, col),
                None => 1.0,
            });
        }
        if dropped > 0 {
            warn!("dropped {} rows without a usable y value", dropped);
        }

        if x.is_empty() {
            return Err(PeakFitError::Data(
                "no usable data rows in CSV input".to_string(),
            ));
        }

        Self::new(Array1::from(x), Array1::from(y), Array1::from(y_err))
    }

    pub fn x(&self) -> &Array1<f64> {
        &self.x
    }

    pub fn y(&self) -> &Array1<f64> {
        &self.y
    }

    pub fn y_err(&self) -> &Array1<f64> {
        &self.y_err
    }

    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    /// Smallest x value.
    pub fn x_min(&self) -> f64 {
        self.x.iter().fold(f64::INFINITY, |a, &b| a.min(b))
    }

    /// Largest x value.
    pub fn x_max(&self) -> f64 {
        self.x.iter().fold(f64::NEG_INFINITY, |a, &b| a.max(b))
    }

    /// Keep only the points whose x lies inside the range (inclusive on
    /// both ends). Fails if nothing survives.
    pub fn restrict(&self, range: FitRange) -> Result<Self> {
        let keep: Vec<usize> = self
            .x
            .iter()
            .enumerate()
            .filter(|(_, &xi)| range.contains(xi))
            .map(|(i, _)| i)
            .collect();
        if keep.is_empty() {
            return Err(PeakFitError::Data(format!(
                "no data points inside fit range [{}, {}]",
                range.min, range.max
            )));
        }

        Ok(Self {
            x: keep.iter().map(|&i| self.x[i]).collect(),
            y: keep.iter().map(|&i| self.y[i]).collect(),
            y_err: keep.iter().map(|&i| self.y_err[i]).collect(),
        })
    }
}
