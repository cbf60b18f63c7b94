//! Tests for ParameterSet and the solver coordinate mapping

use approx::assert_relative_eq;
use xpsfit_rs::parameters::{BoundedValue, BoundsTransform, ParameterSet};
use xpsfit_rs::PeakFitError;

fn sample_set() -> ParameterSet {
    let mut set = ParameterSet::new();
    set.add("C1s_amplitude", BoundedValue::new(800.0, 0.0, 2000.0).unwrap(), true)
        .unwrap();
    set.add("C1s_center", BoundedValue::new(284.8, 283.0, 287.0).unwrap(), true)
        .unwrap();
    set.add("bg_avg_width", BoundedValue::new(5.0, 1.0, 10.0).unwrap(), false)
        .unwrap();
    set
}

#[test]
fn test_varying_entries() {
    let set = sample_set();
    assert_eq!(set.len(), 3);
    assert_eq!(set.varying_count(), 2);
    assert_eq!(set.varying_names(), vec!["C1s_amplitude", "C1s_center"]);
    assert_eq!(set.values(), vec![800.0, 284.8, 5.0]);
}

#[test]
fn test_internal_round_trip() {
    let set = sample_set();
    let internal = set.varying_internal_values().unwrap();
    let back = set.with_internal_values(internal.as_slice().unwrap()).unwrap();
    for (name, entry) in set.iter() {
        assert_relative_eq!(back.value(name).unwrap(), entry.value(), epsilon = 1e-9);
    }
}

#[test]
fn test_any_internal_point_is_inside_bounds() {
    let set = sample_set();
    for &(a, b) in &[(-1e6, 1e6), (3.0, -3.0), (0.0, 100.0), (f64::MAX, -7.5)] {
        let moved = set.with_internal_values(&[a, b]).unwrap();
        for (_, entry) in moved.iter() {
            assert!(entry.bounded.contains(entry.value()));
        }
        // fixed entries never move
        assert_eq!(moved.value("bg_avg_width"), Some(5.0));
    }
}

#[test]
fn test_wrong_internal_length() {
    let set = sample_set();
    assert!(matches!(
        set.with_internal_values(&[0.0]),
        Err(PeakFitError::DimensionMismatch(_))
    ));
}

#[test]
fn test_unknown_key() {
    let mut set = sample_set();
    assert!(matches!(
        set.set_value("C1s_gamma", 1.0),
        Err(PeakFitError::ParameterNotFound(_))
    ));
    set.set_value("C1s_center", 300.0).unwrap();
    assert_eq!(set.value("C1s_center"), Some(287.0));
}

#[test]
fn test_json_round_trip() {
    let set = sample_set();
    let json = set.to_json().unwrap();
    let back = ParameterSet::from_json(&json).unwrap();
    assert_eq!(back, set);
}

#[test]
fn test_transform_maps_midpoint_to_zero() {
    let t = BoundsTransform::new(283.0, 287.0);
    assert_relative_eq!(t.to_internal(285.0).unwrap(), 0.0, epsilon = 1e-12);
    assert_relative_eq!(t.to_external(0.0), 285.0, epsilon = 1e-12);
    assert!(t.to_internal(290.0).is_err());
}
