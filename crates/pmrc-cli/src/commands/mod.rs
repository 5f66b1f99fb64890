//! Command implementations for pmrc-cli

pub mod auth;
pub mod edit;
pub mod env;
pub mod get;
pub mod list;
pub mod set;

pub use auth::{run_fix, run_validate};
pub use edit::run_edit;
pub use env::run_env;
pub use get::run_get;
pub use list::run_list;
pub use set::{run_delete, run_set};

use std::str::FromStr;

use pmrc_core::{ConfigLoader, ConfigResolver};
use pmrc_meta::{Location, RuntimeFacts};
use serde_json::Value;
use tokio::runtime::Runtime;

use crate::error::{CliError, Result};

/// Locations that commands may write to.
pub const WRITABLE: [Location; 3] = [Location::Global, Location::User, Location::Project];

/// Load every location. `--with KEY=VALUE` pairs become command line
/// tokens.
pub fn load(with: &[String]) -> Result<ConfigResolver> {
    let facts = RuntimeFacts::detect()?;
    let argv: Vec<String> = with.iter().map(|pair| format!("--{pair}")).collect();
    let loaded = ConfigLoader::new(facts).args(argv).load()?;
    let resolver = loaded.resolver;

    if let Some(color) = resolver.effective("color").and_then(|v| v.as_bool()) {
        colored::control::set_override(color);
    }
    Ok(resolver)
}

/// The location named on the command line, or the effective `location`.
pub fn target_location(resolver: &ConfigResolver, name: Option<&str>) -> Result<Location> {
    let name = match name {
        Some(name) => name.to_string(),
        None => resolver
            .effective("location")
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_else(|| "user".to_string()),
    };
    let location = Location::from_str(&name)?;
    if !WRITABLE.contains(&location) {
        return Err(CliError::user(format!(
            "invalid location `{name}`, expected one of: global, user, project"
        )));
    }
    Ok(location)
}

pub fn runtime() -> Result<Runtime> {
    Ok(tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?)
}

/// Plain strings print bare; everything else prints as JSON.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Secrets are never printed.
pub fn is_protected(key: &str) -> bool {
    key.starts_with('_') || key.contains(":_")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn display_value_prints_strings_bare() {
        assert_eq!(display_value(&json!("warn")), "warn");
        assert_eq!(display_value(&json!(["a", "b"])), r#"["a","b"]"#);
        assert_eq!(display_value(&Value::Null), "null");
    }

    #[test]
    fn secrets_are_protected() {
        assert!(is_protected("_authToken"));
        assert!(is_protected("//registry.npmjs.org/:_authToken"));
        assert!(!is_protected("registry"));
        assert!(!is_protected("@acme:registry"));
    }
}
