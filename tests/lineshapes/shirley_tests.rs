//! Tests for the iterative Shirley background

use approx::assert_relative_eq;
use ndarray::Array1;
use xpsfit_rs::lineshapes::shirley::{shirley_background, ShirleyConfig};

use crate::test_helpers::synthetic_c1s;

#[test]
fn test_background_stays_below_peak() {
    let (x, y) = synthetic_c1s(601, 0.0, 0);
    let bg = shirley_background(x.view(), y.view(), 0.0, 0.0, 5.0, &ShirleyConfig::default()).unwrap();

    assert_eq!(bg.len(), y.len());
    // the endpoints are averages over a few samples, so skip them
    let n = y.len();
    for i in 10..n - 10 {
        assert!(bg[i] <= y[i], "background above data at {}", x[i]);
    }
}

#[test]
fn test_endpoints_follow_edge_means() {
    let (x, y) = synthetic_c1s(601, 0.0, 0);
    let bg = shirley_background(x.view(), y.view(), 0.0, 0.0, 3.0, &ShirleyConfig::default()).unwrap();
    let n = y.len();
    let start = (y[0] + y[1] + y[2]) / 3.0;
    let end = (y[n - 3] + y[n - 2] + y[n - 1]) / 3.0;
    assert_relative_eq!(bg[0], start, epsilon = 1e-6);
    assert_relative_eq!(bg[n - 1], end, epsilon = 1e-6);
}

#[test]
fn test_offsets_shift_endpoints() {
    let (x, y) = synthetic_c1s(301, 0.0, 0);
    let config = ShirleyConfig::default();
    let plain = shirley_background(x.view(), y.view(), 0.0, 0.0, 5.0, &config).unwrap();
    let shifted = shirley_background(x.view(), y.view(), 4.0, -2.0, 5.0, &config).unwrap();
    let n = y.len();
    assert_relative_eq!(shifted[0] - plain[0], 4.0, epsilon = 1e-6);
    assert_relative_eq!(shifted[n - 1] - plain[n - 1], -2.0, epsilon = 1e-6);
}

#[test]
fn test_flat_spectrum_gives_flat_background() {
    let x = Array1::linspace(295.0, 280.0, 100);
    let y = Array1::from_elem(100, 37.5);
    let bg = shirley_background(x.view(), y.view(), 0.0, 0.0, 5.0, &ShirleyConfig::default()).unwrap();
    for v in bg.iter() {
        assert_relative_eq!(*v, 37.5, epsilon = 1e-12);
    }
}

#[test]
fn test_iteration_limit_is_respected() {
    let (x, y) = synthetic_c1s(301, 0.0, 0);
    let one = ShirleyConfig::default().with_max_iterations(1);
    let many = ShirleyConfig::default();
    let coarse = shirley_background(x.view(), y.view(), 0.0, 0.0, 5.0, &one).unwrap();
    let fine = shirley_background(x.view(), y.view(), 0.0, 0.0, 5.0, &many).unwrap();
    assert_eq!(coarse.len(), fine.len());
    assert!(coarse.iter().zip(fine.iter()).any(|(a, b)| (a - b).abs() > 1e-6));
}
