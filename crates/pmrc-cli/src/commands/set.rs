//! The set and delete commands

use colored::Colorize;
use pmrc_core::ConfigResolver;
use pmrc_meta::nerf::is_dynamic_key;
use serde_json::Value;

use crate::error::{CliError, Result};

use super::{runtime, target_location};

fn check_key(resolver: &ConfigResolver, key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(CliError::user("empty key"));
    }
    if resolver.catalog().contains(key) || is_dynamic_key(key) {
        Ok(())
    } else {
        Err(CliError::user(format!("`{key}` is not a valid config key")))
    }
}

/// Apply `key=value` pairs to a file location and save it.
pub fn run_set(resolver: &mut ConfigResolver, pairs: &[String], location: Option<&str>) -> Result<()> {
    let location = target_location(resolver, location)?;
    for pair in pairs {
        let (key, value) = pair.split_once('=').unwrap_or((pair.as_str(), ""));
        let key = key.trim();
        check_key(resolver, key)?;
        resolver.set_data(location, key, Value::String(value.trim().to_string()))?;
        if !resolver.store(location).has(key) {
            return Err(CliError::user(format!("invalid value for `{key}`: {value}")));
        }
    }

    runtime()?.block_on(resolver.save(location))?;
    println!("{} {location} config", "Saved".green().bold());
    Ok(())
}

/// Remove keys from a file location and save it.
pub fn run_delete(resolver: &mut ConfigResolver, keys: &[String], location: Option<&str>) -> Result<()> {
    let location = target_location(resolver, location)?;
    for key in keys {
        if !resolver.delete_data(location, key)? {
            tracing::debug!(key = key.as_str(), %location, "key was not set");
        }
    }

    runtime()?.block_on(resolver.save(location))?;
    println!("{} {location} config", "Saved".green().bold());
    Ok(())
}
