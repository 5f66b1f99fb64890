//! The get command

use crate::error::Result;
use pmrc_core::ConfigResolver;

use super::{display_value, is_protected};

/// Print the effective value of each key, one per line.
pub fn run_get(resolver: &ConfigResolver, keys: &[String]) -> Result<()> {
    let view = resolver.resolved();
    for key in keys {
        let shown = match view.get(key).or_else(|| resolver.get_data(None, key)) {
            Some(_) if is_protected(key) => "(protected)".to_string(),
            Some(value) => display_value(&value),
            None => "undefined".to_string(),
        };
        if keys.len() > 1 {
            println!("{key}={shown}");
        } else {
            println!("{shown}");
        }
    }
    Ok(())
}
