//! Tests for a single named component

use ndarray::Array1;
use xpsfit_rs::lineshapes::LineShape;
use xpsfit_rs::parameters::BoundedValue;
use xpsfit_rs::{ComponentEvent, ComponentModel, PeakFitError};

#[test]
fn test_defaults_from_hints() {
    let peak = ComponentModel::from_shape_name("C1s", "CasaLA").unwrap();
    assert_eq!(
        peak.parameter_names(),
        vec!["C1s_amplitude", "C1s_center", "C1s_sigma", "C1s_sigma_r", "C1s_gaussian_sigma"]
    );
    let amplitude = peak.get_parameter("C1s_amplitude").unwrap();
    assert_eq!((amplitude.min(), amplitude.value(), amplitude.max()), (0.0, 100.0, 200.0));
    assert!(peak.is_varying("C1s_center").unwrap());

    let bg = ComponentModel::from_shape_name("bg", "Shirley background").unwrap();
    assert!(!bg.is_varying("bg_avg_width").unwrap());
    assert!(bg.is_varying("bg_offset_low").unwrap());
}

#[test]
fn test_invalid_names() {
    assert!(matches!(
        ComponentModel::new("", LineShape::Voigt),
        Err(PeakFitError::InvalidName(_))
    ));
    assert!(ComponentModel::new("C 1s", LineShape::Voigt).is_err());
    assert!(matches!(
        ComponentModel::from_shape_name("p", "Gaussian"),
        Err(PeakFitError::NotFound(_))
    ));
}

#[test]
fn test_unknown_parameter() {
    let mut peak = ComponentModel::new("p", LineShape::Voigt).unwrap();
    let value = BoundedValue::new(1.0, 0.0, 2.0).unwrap();
    assert!(matches!(
        peak.set_parameter("p_sigma_r", value),
        Err(PeakFitError::ParameterNotFound(_))
    ));
    // the short name is not a key
    assert!(peak.get_parameter("sigma").is_err());
}

#[test]
fn test_rename_rekeys_parameters() {
    let mut peak = ComponentModel::new("p1", LineShape::Voigt).unwrap();
    let event = peak.rename("Au4f").unwrap();
    assert_eq!(
        event,
        ComponentEvent::ComponentRenamed {
            old: "p1".to_string(),
            new: "Au4f".to_string()
        }
    );
    assert!(peak.get_parameter("Au4f_center").is_ok());
    assert!(peak.get_parameter("p1_center").is_err());
    assert!(peak.rename("has space").is_err());
    assert_eq!(peak.name(), "Au4f");
}

#[test]
fn test_background_requires_intensity() {
    let bg = ComponentModel::from_shape_name("bg", "Shirley background").unwrap();
    let x = Array1::linspace(290.0, 280.0, 50);
    match bg.evaluate(x.view(), None) {
        Err(PeakFitError::MissingIndependentVariable { component, variable }) => {
            assert_eq!(component, "bg");
            assert_eq!(variable, "y");
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_guess_widens_bounds() {
    let x = Array1::linspace(295.0, 280.0, 301);
    let y = x.mapv(|e: f64| 900.0 / (1.0 + ((e - 284.8) / 0.5).powi(2)));

    let mut peak = ComponentModel::from_shape_name("C1s", "CasaLA").unwrap();
    let events = peak.guess(x.view(), y.view(), Some(1)).unwrap();
    assert!(!events.is_empty());

    let center = peak.get_parameter("C1s_center").unwrap();
    assert!((center.value() - 284.8).abs() < 0.05 + 1e-9);
    assert!(center.max() > 284.8);

    let amplitude = peak.get_parameter("C1s_amplitude").unwrap();
    assert!(amplitude.value() > 850.0);
    assert!(amplitude.max() >= 2.0 * amplitude.value() - 1e-9);

    // widths may grow to four times their seed
    for key in ["C1s_sigma", "C1s_sigma_r", "C1s_gaussian_sigma"] {
        let w = peak.get_parameter(key).unwrap();
        assert!(w.value() > 0.0);
        assert!(w.min() <= 0.0 && w.max() >= 4.0 * w.value() - 1e-9, "{key}: {w:?}");
    }
}

#[test]
fn test_guess_keeps_wider_bounds() {
    let x = Array1::linspace(295.0, 280.0, 301);
    let y = x.mapv(|e: f64| 900.0 / (1.0 + ((e - 284.8) / 0.5).powi(2)));

    let mut peak = ComponentModel::from_shape_name("C1s", "CasaLA").unwrap();
    peak.set_parameter("C1s_sigma", BoundedValue::new(1.0, 0.0, 50.0).unwrap())
        .unwrap();
    peak.guess(x.view(), y.view(), Some(1)).unwrap();
    let sigma = peak.get_parameter("C1s_sigma").unwrap();
    assert_eq!((sigma.min(), sigma.max()), (0.0, 50.0));
    assert!(sigma.value() < 1.0);
}

#[test]
fn test_guess_leaves_background_alone() {
    let x = Array1::linspace(295.0, 280.0, 301);
    let y = x.mapv(|e: f64| 900.0 / (1.0 + ((e - 284.8) / 0.5).powi(2)));
    let mut bg = ComponentModel::from_shape_name("bg", "Shirley background").unwrap();
    let before = bg.clone();
    assert!(bg.guess(x.view(), y.view(), None).unwrap().is_empty());
    assert_eq!(bg, before);
}

#[test]
fn test_reapplying_flat_values_is_bit_exact() {
    let mut peak = ComponentModel::from_shape_name("C1s", "CasaLA").unwrap();
    peak.set_parameter("C1s_center", BoundedValue::new(284.8, 283.0, 287.0).unwrap())
        .unwrap();
    let x = Array1::linspace(295.0, 280.0, 301);
    let before = peak.evaluate(x.view(), None).unwrap();

    let set = peak.to_parameter_set().unwrap();
    for (key, entry) in set.iter() {
        peak.set_parameter(key, entry.bounded).unwrap();
    }
    assert_eq!(peak.evaluate(x.view(), None).unwrap(), before);
}
