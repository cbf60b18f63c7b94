//! # xpsfit-rs
//!
//! `xpsfit-rs` decomposes photoelectron spectra into peaks and backgrounds
//! and fits them to measured data with a bounded Levenberg-Marquardt solver.
//!
//! The library provides:
//! - Line shapes: an asymmetric Lorentzian convolved with a Gaussian, an
//!   iterative Shirley background and a pseudo-Voigt
//! - Bounded parameters with deterministic defaulting of missing bounds
//! - Named components gathered into a collection with a cached envelope
//!   and change notifications
//! - Peak estimation for seeding fits from the data
//! - Import of SpecsLab Prodigy `.xy` exports
//!
//! ## Basic Usage
//!
//! ```
//! use ndarray::Array1;
//! use xpsfit_rs::{ComponentModel, FitSession};
//!
//! let x = Array1::linspace(280.0, 290.0, 201);
//! let y = x.mapv(|e: f64| 500.0 / (1.0 + ((e - 285.0) / 0.4).powi(2)) + 20.0);
//!
//! let mut session = FitSession::new(x, y).unwrap();
//! session
//!     .add(ComponentModel::from_shape_name("bg", "Shirley background").unwrap())
//!     .unwrap();
//! session
//!     .add(ComponentModel::from_shape_name("C1s", "CasaLA").unwrap())
//!     .unwrap();
//! session.guess("C1s").unwrap();
//!
//! let center = session.components().get("C1s").unwrap().get_parameter("C1s_center").unwrap();
//! assert!((center.value() - 285.0).abs() < 0.1);
//! ```

pub mod component;
pub mod composite;
pub mod error;
pub mod events;
pub mod fit;
pub mod guess;
pub mod lineshapes;
pub mod lm;
pub mod loader;
pub mod model;
pub mod parameters;
pub mod problem;
pub mod session;
pub mod utils;

// Re-exports for convenience
pub use component::ComponentModel;
pub use composite::CompositeCollection;
pub use error::{PeakFitError, Result};
pub use events::ComponentEvent;
pub use fit::{apply_result, build_joint_model, fit, FitOptions, FitResult};
pub use guess::{estimate, PeakEstimate};
pub use lineshapes::{EnergyAxis, LineShape, ShirleyConfig};
pub use lm::{LevenbergMarquardt, LmConfig};
pub use loader::{LoadOptions, SpectrumData};
pub use model::Model;
pub use parameters::{BoundedSpec, BoundedValue, ParameterSet};
pub use problem::Problem;
pub use session::FitSession;

/// Version of the library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
