//! End-to-end fits of synthetic spectra

pub mod spectrum_fit_tests;
