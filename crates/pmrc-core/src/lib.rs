//! Layered config resolution for pmrc
//!
//! This crate composes the config of a package manager from ordered
//! locations:
//!
//! - **Layer stores**: one validated key/value store per [`Location`], loaded
//!   from command line tokens, the environment or rc files
//! - **Derived graph**: keys computed from other keys, memoized and
//!   invalidated when a dependency changes
//! - **Resolver**: precedence scanning over the stores, the only mutation
//!   path, and the flattened [`ResolvedView`]
//! - **Loader**: reads every location in dependency order
//!
//! # Example
//!
//! ```ignore
//! use pmrc_core::ConfigLoader;
//! use pmrc_meta::RuntimeFacts;
//!
//! let loaded = ConfigLoader::new(RuntimeFacts::detect()?)
//!     .args(["--loglevel", "warn"])
//!     .load()?;
//! assert_eq!(loaded.resolver.effective("loglevel"), Some("warn".into()));
//! ```
//!
//! [`Location`]: pmrc_meta::Location

pub mod args;
pub mod derived;
pub mod editor;
pub mod env;
pub mod error;
pub mod ini;
pub mod loader;
pub mod resolver;
pub mod store;
pub mod view;

pub use derived::{DerivedEntry, DerivedGraph, Inputs};
pub use env::EnvMap;
pub use error::{Error, Result};
pub use loader::{ConfigLoader, Loaded};
pub use resolver::ConfigResolver;
pub use store::{AuthAction, AuthProblem, LayerStore, Origin, Validation};
pub use view::ResolvedView;
