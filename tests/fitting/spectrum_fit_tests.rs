//! Fits of peaks and backgrounds to synthetic XPS data

use approx::assert_relative_eq;
use ndarray::Array1;
use xpsfit_rs::lineshapes::asymmetric::split_lorentz_conv_gauss;
use xpsfit_rs::lineshapes::voigt::voigt;
use xpsfit_rs::parameters::BoundedValue;
use xpsfit_rs::{apply_result, fit, ComponentModel, CompositeCollection, FitOptions, PeakFitError};

use crate::test_helpers::{binding_energy_grid, synthetic_c1s};

fn set(c: &mut ComponentModel, param: &str, value: f64, min: f64, max: f64) {
    let key = format!("{}_{}", c.name(), param);
    c.set_parameter(&key, BoundedValue::new(value, min, max).unwrap())
        .unwrap();
}

fn asymmetric_start() -> ComponentModel {
    let mut c = ComponentModel::from_shape_name("C1s", "CasaLA").unwrap();
    set(&mut c, "amplitude", 700.0, 0.0, 2000.0);
    set(&mut c, "center", 284.6, 283.0, 287.0);
    set(&mut c, "sigma", 0.3, 0.01, 2.0);
    set(&mut c, "sigma_r", 0.6, 0.01, 2.0);
    set(&mut c, "gaussian_sigma", 0.25, 0.01, 1.0);
    c
}

fn options() -> FitOptions {
    FitOptions::default().with_max_iterations(1000)
}

#[test]
fn test_asymmetric_peak_recovered() {
    let x = binding_energy_grid(601);
    let y = split_lorentz_conv_gauss(x.view(), 800.0, 284.8, 0.35, 0.55, 0.25);

    let mut start = asymmetric_start();
    start.set_vary("C1s_gaussian_sigma", false).unwrap();

    let result = fit(&[start], x.view(), y.view(), None, &options()).unwrap();
    assert_eq!(result.nvarys, 4);
    assert_eq!(result.ndata, 601);
    assert_relative_eq!(result.params.value("C1s_center").unwrap(), 284.8, epsilon = 1e-3);
    assert_relative_eq!(result.params.value("C1s_amplitude").unwrap(), 800.0, max_relative = 1e-3);
    assert_relative_eq!(result.params.value("C1s_sigma").unwrap(), 0.35, max_relative = 1e-2);
    assert_relative_eq!(result.params.value("C1s_sigma_r").unwrap(), 0.55, max_relative = 1e-2);
    assert!(result.chisqr < 1e-3, "chi-square {}", result.chisqr);
}

#[test]
fn test_asymmetric_peak_all_parameters_free() {
    let x = binding_energy_grid(601);
    let y = split_lorentz_conv_gauss(x.view(), 800.0, 284.8, 0.35, 0.55, 0.25);

    let mut start = asymmetric_start();
    set(&mut start, "gaussian_sigma", 0.3, 0.01, 1.0);

    let result = fit(&[start], x.view(), y.view(), None, &options()).unwrap();
    assert_eq!(result.nvarys, 5);
    assert_relative_eq!(result.params.value("C1s_center").unwrap(), 284.8, epsilon = 1e-3);
    assert_relative_eq!(result.params.value("C1s_amplitude").unwrap(), 800.0, max_relative = 1e-2);
    assert_relative_eq!(result.params.value("C1s_sigma").unwrap(), 0.35, max_relative = 3e-2);
    assert_relative_eq!(result.params.value("C1s_sigma_r").unwrap(), 0.55, max_relative = 3e-2);
    assert_relative_eq!(result.params.value("C1s_gaussian_sigma").unwrap(), 0.25, max_relative = 4e-2);
    assert!(result.chisqr < 1e-2, "chi-square {}", result.chisqr);
}

#[test]
fn test_two_overlapping_voigts() {
    let x = Array1::linspace(280.0, 292.0, 481);
    let y = voigt(x.view(), 400.0, 284.8, 0.4, 0.2) + voigt(x.view(), 150.0, 286.3, 0.45, 0.2);

    let mut a = ComponentModel::from_shape_name("CC", "Voigt").unwrap();
    set(&mut a, "amplitude", 300.0, 0.0, 2000.0);
    set(&mut a, "center", 284.6, 283.5, 285.5);
    set(&mut a, "sigma", 0.5, 0.05, 2.0);
    set(&mut a, "gamma", 0.2, 0.0, 1.0);
    a.set_vary("CC_gamma", false).unwrap();

    let mut b = ComponentModel::from_shape_name("CO", "Voigt").unwrap();
    set(&mut b, "amplitude", 200.0, 0.0, 2000.0);
    set(&mut b, "center", 286.0, 285.5, 287.5);
    set(&mut b, "sigma", 0.5, 0.05, 2.0);
    set(&mut b, "gamma", 0.2, 0.0, 1.0);
    b.set_vary("CO_gamma", false).unwrap();

    let result = fit(&[a, b], x.view(), y.view(), None, &options()).unwrap();
    assert_relative_eq!(result.params.value("CC_center").unwrap(), 284.8, epsilon = 1e-4);
    assert_relative_eq!(result.params.value("CO_center").unwrap(), 286.3, epsilon = 1e-4);
    assert_relative_eq!(result.params.value("CC_amplitude").unwrap(), 400.0, max_relative = 1e-4);
    assert_relative_eq!(result.params.value("CO_amplitude").unwrap(), 150.0, max_relative = 1e-4);
}

#[test]
fn test_noisy_peak_on_shirley_background() {
    let (x, y) = synthetic_c1s(601, 5.0, 42);

    let mut comps = CompositeCollection::new();
    comps
        .add(ComponentModel::from_shape_name("bg", "Shirley background").unwrap())
        .unwrap();
    comps.add(asymmetric_start()).unwrap();
    comps.set_vary("C1s", "C1s_gaussian_sigma", false).unwrap();
    comps.set_vary("bg", "bg_offset_low", false).unwrap();
    comps.set_vary("bg", "bg_offset_high", false).unwrap();

    let before = comps.evaluate_envelope(x.view(), Some(y.view())).unwrap();
    let chisqr_before = (&before - &y).mapv(|r| r * r).sum();

    let result = fit(comps.components(), x.view(), y.view(), None, &options()).unwrap();
    assert!(result.chisqr < chisqr_before);
    assert!(result.redchi.is_finite());
    assert_eq!(result.residuals.len(), 601);
    assert!((result.params.value("C1s_center").unwrap() - 284.8).abs() < 0.1);

    // the noise level shows up in the reduced chi-square
    assert!(result.redchi > 1.0, "redchi {}", result.redchi);

    apply_result(&mut comps, &result).unwrap();
    let center = comps.get("C1s").unwrap().get_parameter("C1s_center").unwrap();
    assert_eq!(center.value(), result.params.value("C1s_center").unwrap());
    // bounds survive the fit
    assert_eq!((center.min(), center.max()), (283.0, 287.0));
}

#[test]
fn test_weights_follow_error_bars() {
    let x = binding_energy_grid(301);
    let y = voigt(x.view(), 300.0, 285.0, 0.4, 0.2);
    // Poisson-like error bars with a floor
    let weights = y.mapv(|v| 1.0 / (v + 1.0));

    let mut p = ComponentModel::from_shape_name("p", "Voigt").unwrap();
    set(&mut p, "amplitude", 250.0, 0.0, 1000.0);
    set(&mut p, "center", 285.2, 284.0, 286.0);
    set(&mut p, "sigma", 0.5, 0.05, 2.0);
    set(&mut p, "gamma", 0.2, 0.0, 1.0);

    let result = fit(&[p], x.view(), y.view(), Some(weights.view()), &options()).unwrap();
    assert_eq!(result.nvarys, 4);
    assert_relative_eq!(result.params.value("p_center").unwrap(), 285.0, epsilon = 1e-4);
    assert_relative_eq!(result.params.value("p_amplitude").unwrap(), 300.0, max_relative = 1e-3);
}

#[test]
fn test_nothing_to_fit() {
    let x = binding_energy_grid(50);
    let y = Array1::from_elem(50, 3.0);
    let mut bg = ComponentModel::from_shape_name("bg", "Shirley background").unwrap();
    for key in ["bg_offset_low", "bg_offset_high"] {
        bg.set_vary(key, false).unwrap();
    }

    let result = fit(&[bg], x.view(), y.view(), None, &options()).unwrap();
    assert_eq!(result.nvarys, 0);
    assert_eq!(result.iterations, 0);
    assert_relative_eq!(result.chisqr, 0.0, epsilon = 1e-18);

    assert!(matches!(
        fit(&[], x.view(), Array1::zeros(10).view(), None, &options()),
        Err(PeakFitError::DimensionMismatch(_))
    ));
}
