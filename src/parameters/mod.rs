//! # Parameter System
//!
//! Bounded, named parameters for spectral components.
//!
//! ## Core Components
//!
//! - [`BoundedValue`]: a value clamped into movable `[min, max]` bounds
//! - [`BoundedSpec`]: a partial specification with deterministic defaulting
//! - [`ParameterSet`]: the flat, prefixed parameter set handed to the solver
//! - [`BoundsTransform`]: maps solver coordinates onto the bounded box
//!
//! ## Example Usage
//!
//! ```rust
//! use xpsfit_rs::parameters::{BoundedSpec, BoundedValue, ParameterSet};
//!
//! let sigma = BoundedValue::from_spec(BoundedSpec::value(0.2).with_min(0.0)).unwrap();
//! assert_eq!(sigma.max(), 0.4);
//!
//! let mut set = ParameterSet::new();
//! set.add("C1s_sigma", sigma, true).unwrap();
//! let internal = set.varying_internal_values().unwrap();
//! assert_eq!(internal.len(), 1);
//! ```

pub mod bounded_value;
pub mod bounds;
pub mod parameter_set;

// Re-export key types
pub use bounded_value::{BoundedSpec, BoundedValue};
pub use bounds::{BoundsError, BoundsTransform};
pub use parameter_set::{ParameterEntry, ParameterSet};
