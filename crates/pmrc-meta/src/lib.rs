//! Key metadata for pmrc
//!
//! This crate holds everything that is known about config keys before any
//! source is loaded: the value type registry, key definitions and their
//! catalog, the location precedence table, registry-scoped ("nerfed") key
//! helpers and the runtime facts snapshot.

pub mod builtin;
pub mod catalog;
pub mod definition;
pub mod error;
pub mod facts;
pub mod location;
pub mod nerf;
pub mod types;

pub use catalog::Catalog;
pub use definition::{Definition, DefinitionSpec, EnvValue, Rejection, ShortValue, flat_key};
pub use error::{Error, Result};
pub use facts::RuntimeFacts;
pub use location::{Location, LocationOptions};
pub use types::{TypeContext, ValueType};
