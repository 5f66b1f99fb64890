//! Filesystem helpers for pmrc
//!
//! Provides normalized path handling and the atomic, permission-aware
//! writes used when config files are saved.

pub mod error;
pub mod io;
pub mod path;

pub use error::{Error, Result};
pub use path::NormalizedPath;
