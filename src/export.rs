//! CSV result export.
//!
//! One tabular artifact with two side-by-side sections: a parameter block
//! (`Parameter, Value, Error`, led by the reduced chi-square) and a curve
//! block (original data, reconstruction grid, total fit, background, one
//! column per peak). The sections usually differ in length; shorter columns
//! are padded with empty cells so rows stay aligned.

use crate::curves::CurveSet;
use crate::data::Dataset;
use crate::error::{PeakFitError, Result};
use crate::fit::FitResult;
use std::io::{Read, Write};
use std::path::Path;

fn number(v: f64) -> String {
    format!("{}", v)
}

/// Write the full result table to a CSV writer.
pub fn write_results<W: Write>(
    writer: W,
    result: &FitResult,
    dataset: &Dataset,
    curves: &CurveSet,
) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);

    let mut header = vec![
        "Parameter".to_string(),
        "Value".to_string(),
        "Error".to_string(),
        String::new(),
        "x_data".to_string(),
        "y_data".to_string(),
        "yerr_data".to_string(),
        "x_fit".to_string(),
        "y_fit".to_string(),
        "y_bg".to_string(),
    ];
    for peak in &curves.peaks {
        header.push(format!("peak_{}", peak.index));
    }
    csv_writer.write_record(&header)?;

    let params = result.parameters();
    let param_rows = 1 + params.len();
    let data_rows = dataset.len();
    let fit_rows = curves.x.len();
    let total_rows = param_rows.max(data_rows).max(fit_rows);

    let param_list: Vec<_> = params.iter().collect();
    for row in 0..total_rows {
        let mut record: Vec<String> = Vec::with_capacity(header.len());

        if row == 0 {
            record.push("Chi-squared".to_string());
            record.push(number(result.redchi));
            record.push(String::new());
        } else if let Some(p) = param_list.get(row - 1) {
            record.push(p.name().to_string());
            record.push(number(p.value()));
            record.push(p.stderr().map(number).unwrap_or_default());
        } else {
            record.extend([String::new(), String::new(), String::new()]);
        }

        record.push(String::new());

        if row < data_rows {
            record.push(number(dataset.x()[row]));
            record.push(number(dataset.y()[row]));
            record.push(number(dataset.y_err()[row]));
        } else {
            record.extend([String::new(), String::new(), String::new()]);
        }

        if row < fit_rows {
            record.push(number(curves.x[row]));
            record.push(number(curves.total[row]));
            record.push(number(curves.background[row]));
            for peak in &curves.peaks {
                record.push(number(peak.y[row]));
            }
        } else {
            record.extend(std::iter::repeat(String::new()).take(3 + curves.peaks.len()));
        }

        csv_writer.write_record(&record)?;
    }

    csv_writer.flush()?;
    Ok(())
}

/// Write the full result table to a CSV file.
pub fn save_results<P: AsRef<Path>>(
    path: P,
    result: &FitResult,
    dataset: &Dataset,
    curves: &CurveSet,
) -> Result<()> {
    let file = std::fs::File::create(path)?;
    write_results(file, result, dataset, curves)
}

/// Read back the parameter block of an exported result table: the reduced
/// chi-square plus `(name, value, standard error)` per parameter.
pub fn read_parameter_block<R: Read>(
    reader: R,
) -> Result<(f64, Vec<(String, f64, Option<f64>)>)> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let parse = |text: &str, what: &str| -> Result<f64> {
        text.trim()
            .parse::<f64>()
            .map_err(|_| PeakFitError::Parse(format!("invalid {} '{}'", what, text)))
    };

    let mut redchi = None;
    let mut entries = Vec::new();
    for record in csv_reader.records() {
        let record = record?;
        let name = record.get(0).unwrap_or("").trim();
        if name.is_empty() {
            break;
        }

        let value = parse(record.get(1).unwrap_or(""), "value")?;
        if redchi.is_none() && name == "Chi-squared" {
            redchi = Some(value);
            continue;
        }

        let stderr = match record.get(2).map(str::trim) {
            Some("") | None => None,
            Some(text) => Some(parse(text, "error")?),
        };
        entries.push((name.to_string(), value, stderr));
    }

    let redchi = redchi.ok_or_else(|| {
        PeakFitError::Parse("parameter block is missing the Chi-squared row".to_string())
    })?;
    Ok((redchi, entries))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curves;
    use crate::fit;
    use crate::model::{BackgroundDefinition, PeakDefinition};
    use crate::parameters::ParamValue;
    use ndarray::Array1;

    fn fitted() -> (Dataset, FitResult) {
        let x = Array1::linspace(0.0, 10.0, 60);
        let y = x.mapv(|xi| 3.0 + crate::lineshape::gaussian(xi, 20.0, 5.0, 2.0));
        let dataset = Dataset::new(x, y, Array1::ones(60)).unwrap();

        let background = BackgroundDefinition::quadratic(
            ParamValue::free(2.0),
            ParamValue::fixed(0.0),
            ParamValue::fixed(0.0),
        );
        let peak = PeakDefinition::gaussian(
            3,
            ParamValue::free(15.0),
            ParamValue::free(4.5),
            ParamValue::free(1.5),
        );
        let result = fit::fit(&dataset, &background, &[peak], None).unwrap();
        (dataset, result)
    }

    #[test]
    fn test_export_layout() {
        let (dataset, result) = fitted();
        let grid = curves::dense_grid(dataset.x(), 2);
        let curve_set = curves::reconstruct(&result, &grid, false).unwrap();

        let mut buffer = Vec::new();
        write_results(&mut buffer, &result, &dataset, &curve_set).unwrap();
        let text = String::from_utf8(buffer).unwrap();

        let mut lines = text.lines();
        let header = lines.next().unwrap();
        assert_eq!(
            header,
            "Parameter,Value,Error,,x_data,y_data,yerr_data,x_fit,y_fit,y_bg,peak_3"
        );
        assert!(lines.next().unwrap().starts_with("Chi-squared,"));

        // Grid (120 rows) is the longest section; plus header.
        assert_eq!(text.lines().count(), 1 + 120);

        // Last rows have an empty parameter block but a filled curve block.
        let last = text.lines().last().unwrap();
        assert!(last.starts_with(",,,,"));
        assert!(!last.ends_with(','));
    }

    #[test]
    fn test_parameter_round_trip() {
        let (dataset, result) = fitted();
        let curve_set = curves::reconstruct(&result, dataset.x(), false).unwrap();

        let mut buffer = Vec::new();
        write_results(&mut buffer, &result, &dataset, &curve_set).unwrap();

        let (redchi, entries) = read_parameter_block(buffer.as_slice()).unwrap();
        assert!((redchi - result.redchi).abs() < 1e-12);

        let params = result.parameters();
        assert_eq!(entries.len(), params.len());
        for (name, value, stderr) in &entries {
            let p = params.get(name).unwrap();
            assert!((p.value() - value).abs() < 1e-12);
            assert_eq!(p.stderr().is_some(), stderr.is_some());
        }
    }

    #[test]
    fn test_read_parameter_block_requires_chisq_row() {
        let text = "Parameter,Value,Error\nbg_a,1.0,0.1\n";
        assert!(read_parameter_block(text.as_bytes()).is_err());
    }
}
