//! # Parameter System
//!
//! Named fit parameters with bounds and derivation rules, modelled on
//! lmfit-py's `Parameters` but with structured names instead of strings and
//! a closed set of derivation rules instead of free-form expressions.
//!
//! ## Core Components
//!
//! - [`ParamKey`]: component label × line × quantity
//! - [`Parameter`]: a value with a [`Binding`] (free, fixed or derived) and [`Bounds`]
//! - [`Derivation`]: how a derived parameter follows its sources
//! - [`Parameters`]: the collection, resolving derived values in dependency order
//!
//! ## Example Usage
//!
//! ```rust
//! use xps_fit::parameters::{ComponentLabel, Derivation, ParamKey, ParamKind, Parameter, Parameters};
//!
//! let a = ComponentLabel::REFERENCE;
//! let center = ParamKey::main(a, ParamKind::Center);
//! let splitting = ParamKey::main(a, ParamKind::Splitting);
//!
//! let mut params = Parameters::new();
//! params.add(Parameter::free(center, 130.0)).unwrap();
//! params.add(Parameter::fixed(splitting, -0.84)).unwrap();
//! params
//!     .add(Parameter::derived(
//!         ParamKey::satellite(a, ParamKind::Center),
//!         0.0,
//!         Derivation::Difference(center, splitting),
//!     ))
//!     .unwrap();
//!
//! // Only the main center is handed to the optimizer
//! assert_eq!(params.free_keys(), vec![center]);
//!
//! params.update_from_internal(&[129.0]).unwrap();
//! let satellite = params.value(ParamKey::satellite(a, ParamKind::Center)).unwrap();
//! assert!((satellite - 129.84).abs() < 1e-12);
//! ```

pub mod bounds;
pub mod key;
pub mod parameter;
#[allow(clippy::module_inception)]
pub mod parameters;

// Re-export key types
pub use bounds::{Bounds, BoundsError};
pub use key::{ComponentLabel, Line, ParamKey, ParamKind, MAX_COMPONENTS};
pub use parameter::{Binding, Derivation, Parameter, ParameterError};
pub use parameters::Parameters;
