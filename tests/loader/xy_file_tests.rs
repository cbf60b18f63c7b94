//! Tests that read `.xy` files from disk

use std::fs;
use std::path::PathBuf;

use approx::assert_relative_eq;
use xpsfit_rs::loader::{load, load_with_error_bars, ErrorBars, LoadOptions};
use xpsfit_rs::{FitSession, PeakFitError};

const C1S_EXPORT: &str = "\
# Created by:        SpecsLab Prodigy, Version 4.64.1
# Acquisition Date:  2023-03-14 10:12:31 UTC
# Separate Scan Data: no
# Separate Channel Data: no
# Transmission Function: none
#
# Region:            C1s
# Kinetic Energy:    1201.6
# ColumnLabels: energy counts/s
284.00  1520.5
284.05  1602.2
284.10  1733.9
284.15  1688.0
284.20  1575.4
";

const WITH_ERROR_BARS: &str = "\
# ColumnLabels: energy counts/s ErrorBar
290.0  100.0  10.0
289.9  110.0  10.5
";

/// Write `content` to a file in the temp dir unique to this test.
fn write_temp(name: &str, content: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("xpsfit_{}_{}.xy", std::process::id(), name));
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn test_load_prodigy_export() {
    let path = write_temp("c1s", C1S_EXPORT);
    let data = load(&path, &LoadOptions::default()).unwrap();
    fs::remove_file(&path).unwrap();

    assert_eq!(data.energy.len(), 5);
    assert_relative_eq!(data.energy[2], 284.10);
    assert_relative_eq!(data.intensity[3], 1688.0);
    assert!(data.error_bar.is_none());
}

#[test]
fn test_error_bar_policies() {
    let path = write_temp("no_errors", C1S_EXPORT);
    let (_, errors) = load_with_error_bars(&path, &LoadOptions::default(), ErrorBars::ZeroIfMissing).unwrap();
    assert_eq!(errors.to_vec(), vec![0.0; 5]);
    let strict = load_with_error_bars(&path, &LoadOptions::default(), ErrorBars::Required);
    fs::remove_file(&path).unwrap();
    assert!(matches!(strict, Err(PeakFitError::MissingColumn(c)) if c == "ErrorBar"));

    let path = write_temp("errors", WITH_ERROR_BARS);
    let (data, errors) = load_with_error_bars(&path, &LoadOptions::default(), ErrorBars::Required).unwrap();
    fs::remove_file(&path).unwrap();
    assert_eq!(errors.to_vec(), vec![10.0, 10.5]);
    assert_eq!(data.intensity.to_vec(), vec![100.0, 110.0]);
}

#[test]
fn test_missing_file() {
    let path = std::env::temp_dir().join("xpsfit_does_not_exist.xy");
    assert!(matches!(
        load(&path, &LoadOptions::default()),
        Err(PeakFitError::IoError(_))
    ));
}

#[test]
fn test_custom_comment_prefix() {
    let content = "% ColumnLabels: energy counts/s\n1.0 5.0\n2.0 6.0\n";
    let path = write_temp("percent", content);
    let options = LoadOptions::default().with_comment_prefix("%");
    let data = load(&path, &options).unwrap();
    fs::remove_file(&path).unwrap();
    assert_eq!(data.intensity.to_vec(), vec![5.0, 6.0]);
}

#[test]
fn test_session_from_loaded_spectrum() {
    let path = write_temp("session", C1S_EXPORT);
    let data = load(&path, &LoadOptions::default()).unwrap();
    fs::remove_file(&path).unwrap();

    let session = FitSession::from_spectrum(data).unwrap();
    assert_eq!(session.x().len(), 5);
    assert!(session.components().is_empty());
}
