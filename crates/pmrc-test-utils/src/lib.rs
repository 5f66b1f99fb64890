//! Shared test utilities for the pmrc workspace.
//!
//! This crate provides a sandboxed machine layout so that loader, resolver
//! and CLI tests never touch the real home directory. It is a
//! dev-dependency only and never published.
//!
//! # Modules
//!
//! - [`sandbox`]: [`TestEnv`] with home, install prefix and project folders

pub mod sandbox;

pub use sandbox::TestEnv;
