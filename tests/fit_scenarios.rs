//! End-to-end fit scenarios: synthetic data in, fitted parameters and
//! exported tables out.

use ndarray::Array1;
use peakfit::curves;
use peakfit::export;
use peakfit::fit::{self, FitRange};
use peakfit::lineshape;
use peakfit::model::{BackgroundDefinition, PeakDefinition};
use peakfit::parameters::ParamValue;
use peakfit::{Dataset, PeakFitError};
use tempdir::TempDir;

/// Deterministic mean-zero noise with sample standard deviation exactly 1.
fn unit_noise(n: usize) -> Vec<f64> {
    // Sum of hashed uniforms, approximately normal.
    let mut noise: Vec<f64> = (0..n)
        .map(|i| {
            let mut sum = 0.0;
            for k in 0..12 {
                let raw = ((i * 12 + k) as f64 * 12.9898).sin() * 43758.5453;
                sum += raw - raw.floor();
            }
            sum - 6.0
        })
        .collect();

    let mean = noise.iter().sum::<f64>() / n as f64;
    let var = noise.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / n as f64;
    let std = var.sqrt();
    for v in noise.iter_mut() {
        *v = (*v - mean) / std;
    }
    noise
}

fn free_quadratic(a: f64, b: f64, c: f64) -> BackgroundDefinition {
    BackgroundDefinition::quadratic(
        ParamValue::free(a),
        ParamValue::free(b),
        ParamValue::free(c),
    )
}

/// Constant offset 5 plus one Gaussian with area 50, center 5, FWHM 2,
/// sampled at 200 points with unit noise.
fn noisy_gaussian_dataset() -> Dataset {
    let n = 200;
    let x = Array1::linspace(0.0, 10.0, n);
    let noise = unit_noise(n);
    let y: Array1<f64> = x
        .iter()
        .zip(noise.iter())
        .map(|(&xi, &ni)| 5.0 + lineshape::gaussian(xi, 50.0, 5.0, 2.0) + ni)
        .collect();
    Dataset::new(x, y, Array1::ones(n)).unwrap()
}

fn seed_peak(index: usize) -> PeakDefinition {
    PeakDefinition::gaussian(
        index,
        ParamValue::free(40.0),
        ParamValue::free(4.0),
        ParamValue::free(1.5),
    )
}

#[test]
fn gaussian_recovery_with_noise() {
    let dataset = noisy_gaussian_dataset();
    let result = fit::fit(&dataset, &free_quadratic(0.0, 0.0, 0.0), &[seed_peak(1)], None).unwrap();

    let params = result.parameters();
    let area = params.get("area_1").unwrap().value();
    let center = params.get("center_1").unwrap().value();
    let fwhm = params.get("G_FWHM_1").unwrap().value();
    let bg = params.get("bg_a").unwrap().value();

    assert!((area - 50.0).abs() / 50.0 < 0.05, "area = {}", area);
    assert!((center - 5.0).abs() / 5.0 < 0.05, "center = {}", center);
    assert!((fwhm - 2.0).abs() / 2.0 < 0.05, "fwhm = {}", fwhm);
    assert!((bg - 5.0).abs() / 5.0 < 0.05, "bg_a = {}", bg);

    // Noise has unit variance, so the reduced chi-square is near 1.
    assert!(
        (result.redchi - 1.0).abs() < 0.3,
        "redchi = {}",
        result.redchi
    );

    // Every free parameter carries an uncertainty.
    for p in params.iter().filter(|p| p.vary()) {
        assert!(p.stderr().is_some(), "{} has no stderr", p.name());
    }
}

#[test]
fn lorentzian_recovery() {
    let n = 200;
    let x = Array1::linspace(0.0, 10.0, n);
    let y: Array1<f64> = x.mapv(|xi| 3.0 + lineshape::lorentzian(xi, 40.0, 5.0, 1.5));
    let dataset = Dataset::new(x, y, Array1::ones(n)).unwrap();

    let peak = PeakDefinition::lorentzian(
        1,
        ParamValue::free(30.0),
        ParamValue::free(4.5),
        ParamValue::free(1.0),
    );
    let result = fit::fit(&dataset, &free_quadratic(0.0, 0.0, 0.0), &[peak], None).unwrap();

    let params = result.parameters();
    let area = params.get("area_1").unwrap().value();
    let center = params.get("center_1").unwrap().value();
    let fwhm = params.get("L_FWHM_1").unwrap().value();

    assert!((area - 40.0).abs() / 40.0 < 0.05, "area = {}", area);
    assert!((center - 5.0).abs() / 5.0 < 0.05, "center = {}", center);
    assert!((fwhm - 1.5).abs() / 1.5 < 0.05, "fwhm = {}", fwhm);
    assert!(params.get("G_FWHM_1").is_none());
    assert!(result.redchi < 1e-3, "redchi = {}", result.redchi);
}

#[test]
fn pseudo_voigt_free_ratio_recovery() {
    let n = 300;
    let x = Array1::linspace(0.0, 10.0, n);
    let y: Array1<f64> =
        x.mapv(|xi| 2.0 + lineshape::pseudo_voigt(xi, 40.0, 5.0, 0.6, 2.0, 2.0));
    let dataset = Dataset::new(x, y, Array1::ones(n)).unwrap();

    let peak = PeakDefinition::pseudo_voigt(
        1,
        ParamValue::free(30.0),
        ParamValue::free(4.5),
        ParamValue::free(0.5),
        ParamValue::free(2.0),
        ParamValue::free(2.0),
    );
    let result = fit::fit(&dataset, &free_quadratic(0.0, 0.0, 0.0), &[peak], None).unwrap();

    let params = result.parameters();
    let ratio = params.get("ratio_1").unwrap();
    let area = params.get("area_1").unwrap().value();
    let center = params.get("center_1").unwrap().value();

    assert!((area - 40.0).abs() / 40.0 < 0.05, "area = {}", area);
    assert!((center - 5.0).abs() / 5.0 < 0.05, "center = {}", center);
    // The free ratio stays inside its [0, 1] bound and lands near the
    // generating mix.
    assert!((0.0..=1.0).contains(&ratio.value()));
    assert!((ratio.value() - 0.6).abs() < 0.1, "ratio = {}", ratio.value());
    assert!(ratio.stderr().is_some());
    assert!(result.redchi < 1e-3, "redchi = {}", result.redchi);
}

#[test]
fn zero_free_parameters_is_rejected() {
    let x = Array1::from(vec![0.0, 1.0, 2.0, 3.0, 4.0]);
    let dataset = Dataset::new(x, Array1::ones(5), Array1::ones(5)).unwrap();
    let background = BackgroundDefinition::quadratic(
        ParamValue::fixed(0.0),
        ParamValue::fixed(0.0),
        ParamValue::fixed(0.0),
    );

    let err = fit::fit(&dataset, &background, &[], None).unwrap_err();
    assert!(matches!(err, PeakFitError::Configuration(_)));
}

#[test]
fn fixed_parameters_survive_the_fit_exactly() {
    let dataset = noisy_gaussian_dataset();
    let mut peak = seed_peak(1);
    peak.center = ParamValue::fixed(5.1);

    let background = BackgroundDefinition::quadratic(
        ParamValue::free(0.0),
        ParamValue::fixed(0.0),
        ParamValue::fixed(0.0),
    );
    let result = fit::fit(&dataset, &background, &[peak], None).unwrap();
    let params = result.parameters();

    assert_eq!(params.get("center_1").unwrap().value(), 5.1);
    assert!(params.get("center_1").unwrap().stderr().is_none());
    assert_eq!(params.get("bg_b").unwrap().value(), 0.0);
    assert_eq!(result.nvarys, 4);
}

#[test]
fn fit_range_restricts_the_data() {
    let dataset = noisy_gaussian_dataset();
    let range = FitRange::new(2.0, 8.0).unwrap();
    let result = fit::fit(
        &dataset,
        &free_quadratic(0.0, 0.0, 0.0),
        &[seed_peak(1)],
        Some(range),
    )
    .unwrap();

    assert!(result.ndata < 200);
    assert_eq!(result.dof, result.ndata - result.nvarys);

    let center = result.parameters().get("center_1").unwrap().value();
    assert!((center - 5.0).abs() / 5.0 < 0.05);
}

#[test]
fn disabled_peaks_are_excluded() {
    let dataset = noisy_gaussian_dataset();
    let mut second = seed_peak(2);
    second.enabled = false;

    let result = fit::fit(
        &dataset,
        &free_quadratic(0.0, 0.0, 0.0),
        &[seed_peak(1), second],
        None,
    )
    .unwrap();

    assert_eq!(result.model().peaks().len(), 1);
    assert!(result.parameters().get("area_2").is_none());

    let grid = curves::dense_grid(dataset.x(), 10);
    let curve_set = curves::reconstruct(&result, &grid, false).unwrap();
    assert_eq!(curve_set.peaks.len(), 1);
    assert_eq!(curve_set.peaks[0].index, 1);
    assert_eq!(grid.len(), 2000);
}

#[test]
fn export_and_reimport_round_trip() {
    let dir = TempDir::new("peakfit").unwrap();

    // Load the dataset through the CSV path.
    let data_path = dir.path().join("scan.csv");
    {
        let dataset = noisy_gaussian_dataset();
        let mut writer = csv::Writer::from_path(&data_path).unwrap();
        writer.write_record(["x", "y", "err"]).unwrap();
        for i in 0..dataset.len() {
            writer
                .write_record([
                    format!("{}", dataset.x()[i]),
                    format!("{}", dataset.y()[i]),
                    format!("{}", dataset.y_err()[i]),
                ])
                .unwrap();
        }
        writer.flush().unwrap();
    }
    let dataset = Dataset::from_csv_path(&data_path, Default::default()).unwrap();
    assert_eq!(dataset.len(), 200);

    let result = fit::fit(&dataset, &free_quadratic(0.0, 0.0, 0.0), &[seed_peak(1)], None).unwrap();
    let grid = curves::dense_grid(dataset.x(), 10);
    let curve_set = curves::reconstruct(&result, &grid, true).unwrap();

    let out_path = dir.path().join("result.csv");
    export::save_results(&out_path, &result, &dataset, &curve_set).unwrap();

    let file = std::fs::File::open(&out_path).unwrap();
    let (redchi, entries) = export::read_parameter_block(file).unwrap();
    assert!((redchi - result.redchi).abs() < 1e-9);
    assert_eq!(entries.len(), result.parameters().len());

    for (name, value, stderr) in &entries {
        let p = result.parameters().get(name).unwrap();
        assert!((p.value() - value).abs() < 1e-9, "{} diverged", name);
        assert_eq!(p.stderr().is_some(), stderr.is_some());
    }
}
