//! Tests for components and the composite collection

pub mod collection_tests;
pub mod component_tests;
