//! Numerical helpers shared by the solver.

pub mod finite_difference;

pub use finite_difference::jacobian;
