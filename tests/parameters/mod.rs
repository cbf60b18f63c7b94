//! Tests for bounded values and flat parameter sets

pub mod parameter_set_tests;
