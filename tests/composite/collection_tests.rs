//! Tests for the ordered component collection and its cached envelope

use approx::assert_relative_eq;
use ndarray::Array1;
use std::cell::RefCell;
use std::rc::Rc;
use xpsfit_rs::model::Model;
use xpsfit_rs::parameters::BoundedValue;
use xpsfit_rs::{ComponentEvent, ComponentModel, CompositeCollection, PeakFitError};

use crate::test_helpers::synthetic_c1s;

fn peak(name: &str, center: f64) -> ComponentModel {
    let mut c = ComponentModel::from_shape_name(name, "Voigt").unwrap();
    c.set_parameter(
        &format!("{name}_center"),
        BoundedValue::new(center, 280.0, 295.0).unwrap(),
    )
    .unwrap();
    c
}

fn collection() -> CompositeCollection {
    let mut comps = CompositeCollection::new();
    comps
        .add(ComponentModel::from_shape_name("bg", "Shirley background").unwrap())
        .unwrap();
    comps.add(peak("C1s", 284.8)).unwrap();
    comps.add(peak("C_O", 286.5)).unwrap();
    comps
}

fn assert_cache_matches(comps: &CompositeCollection, x: &Array1<f64>, y: &Array1<f64>) {
    let fresh = comps.evaluate_envelope(x.view(), Some(y.view())).unwrap();
    let cached = comps.cached_envelope().unwrap();
    for i in 0..fresh.len() {
        assert_relative_eq!(cached[i], fresh[i], epsilon = 1e-9);
    }
}

#[test]
fn test_order_and_duplicates() {
    let mut comps = collection();
    assert_eq!(comps.names(), vec!["bg", "C1s", "C_O"]);
    assert!(matches!(
        comps.add(peak("C1s", 290.0)),
        Err(PeakFitError::DuplicateName(_))
    ));
    assert_eq!(comps.len(), 3);
    assert!(matches!(comps.remove("Si2p"), Err(PeakFitError::NotFound(_))));
}

#[test]
fn test_envelope_is_sum_of_components() {
    let comps = collection();
    let (x, y) = synthetic_c1s(301, 0.0, 0);
    let envelope = comps.eval(x.view(), Some(y.view())).unwrap();

    let mut sum = Array1::<f64>::zeros(x.len());
    for name in comps.names() {
        sum += &comps.evaluate_one(name, x.view(), Some(y.view())).unwrap();
    }
    for i in 0..x.len() {
        assert_relative_eq!(envelope[i], sum[i], epsilon = 1e-9);
    }
    assert_eq!(comps.parameter_names().len(), 3 + 4 + 4);
}

#[test]
fn test_cache_follows_every_mutation() {
    let mut comps = collection();
    let (x, y) = synthetic_c1s(301, 0.0, 0);
    comps.refresh(x.view(), Some(y.view())).unwrap();
    assert_cache_matches(&comps, &x, &y);

    comps
        .set_parameter("C1s", "C1s_amplitude", BoundedValue::new(350.0, 0.0, 1000.0).unwrap())
        .unwrap();
    assert_cache_matches(&comps, &x, &y);

    comps.add(peak("C_OO", 288.9)).unwrap();
    assert_cache_matches(&comps, &x, &y);

    comps.remove("C_O").unwrap();
    assert_cache_matches(&comps, &x, &y);

    comps.rename("C1s", "C_C").unwrap();
    assert_cache_matches(&comps, &x, &y);
    assert!(comps.cached_curve("C_C").is_some());
    assert!(comps.cached_curve("C1s").is_none());

    comps.invalidate();
    assert!(comps.cached_envelope().is_none());
}

#[test]
fn test_failed_update_changes_nothing() {
    let mut comps = collection();
    let (x, y) = synthetic_c1s(101, 0.0, 0);
    comps.refresh(x.view(), Some(y.view())).unwrap();
    let before = comps.cached_envelope().unwrap().clone();

    let value = BoundedValue::new(1.0, 0.0, 2.0).unwrap();
    assert!(comps.set_parameter("C1s", "C1s_sigma_r", value).is_err());
    assert!(comps.set_parameter("missing", "missing_sigma", value).is_err());
    assert_eq!(comps.cached_envelope().unwrap(), &before);
}

#[test]
fn test_observers_see_changes() {
    let mut comps = CompositeCollection::new();
    let seen: Rc<RefCell<Vec<ComponentEvent>>> = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    let id = comps.subscribe(move |event| sink.borrow_mut().push(event.clone()));

    comps.add(peak("p", 285.0)).unwrap();
    comps
        .set_parameter("p", "p_gamma", BoundedValue::new(0.3, 0.0, 1.0).unwrap())
        .unwrap();
    comps.rename("p", "q").unwrap();
    comps.remove("q").unwrap();

    {
        let events = seen.borrow();
        assert_eq!(events.len(), 4);
        assert!(matches!(&events[0], ComponentEvent::ComponentAdded { component } if component == "p"));
        assert!(matches!(
            &events[1],
            ComponentEvent::ParameterChanged { parameter, .. } if parameter == "p_gamma"
        ));
        assert_eq!(events[2].component(), "q");
        assert!(matches!(&events[3], ComponentEvent::ComponentRemoved { .. }));
    }

    assert!(comps.unsubscribe(id));
    comps.add(peak("r", 285.0)).unwrap();
    assert_eq!(seen.borrow().len(), 4);
}

#[test]
fn test_parameter_set_round_trip() {
    let mut comps = collection();
    let mut set = comps.to_parameter_set().unwrap();
    assert_eq!(set.len(), 11);

    set.set_value("C_O_center", 287.0).unwrap();
    comps.apply_parameter_set(&set).unwrap();
    let center = comps.get("C_O").unwrap().get_parameter("C_O_center").unwrap();
    assert_eq!(center.value(), 287.0);

    // a set missing a component is rejected as a whole
    let partial = comps.get("C1s").unwrap().to_parameter_set().unwrap();
    assert!(matches!(
        comps.apply_parameter_set(&partial),
        Err(PeakFitError::ParameterNotFound(_))
    ));
}
