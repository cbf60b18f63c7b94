//! Levenberg-Marquardt algorithm implementation.
//!
//! This module provides a damped Gauss-Newton solver for nonlinear
//! least-squares problems expressed through the [`Problem`](crate::problem::Problem)
//! trait.

pub mod algorithm;
pub mod config;
pub mod convergence;

// Re-export key types
pub use algorithm::{LevenbergMarquardt, LmResult};
pub use config::LmConfig;
pub use convergence::{ConvergenceCriteria, ConvergenceStatus};
