//! Environment variable handling
//!
//! Interpolation of `${NAME}` placeholders in loaded text, the mapping from
//! `npm_config_*` variables to config keys, and the naming rule used when
//! config values are exported back to child processes.

use std::sync::LazyLock;

use indexmap::IndexMap;
use regex::{Captures, Regex};
use serde_json::{Map, Value};

/// Process environment snapshot.
pub type EnvMap = IndexMap<String, String>;

const ENV_PREFIX: &str = "npm_config_";

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\\*)\$\{([^${}?]+)(\?)?\}").expect("Invalid env placeholder regex")
});

static EXPORT_INVALID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-zA-Z0-9_]").expect("Invalid export key regex"));

/// Replace `${NAME}` with the variable's value.
///
/// An odd number of preceding backslashes escapes the placeholder. Unknown
/// variables are left as written unless the placeholder ends in `?`, in
/// which case they expand to nothing.
pub fn replace_env(text: &str, env: &EnvMap) -> String {
    PLACEHOLDER
        .replace_all(text, |caps: &Captures<'_>| {
            let whole = &caps[0];
            let escapes = &caps[1];
            if escapes.len() % 2 == 1 {
                return whole[escapes.len().div_ceil(2)..].to_string();
            }
            let value = match env.get(&caps[2]) {
                Some(v) => v.as_str(),
                None if caps.get(3).is_some() => "",
                None => return whole.to_string(),
            };
            format!("{}{}", &escapes[escapes.len() / 2..], value)
        })
        .into_owned()
}

/// Interpolate every key and every string value of an object.
pub fn replace_env_in(data: Map<String, Value>, env: &EnvMap) -> Map<String, Value> {
    data.into_iter()
        .map(|(key, value)| {
            let value = match value {
                Value::String(s) => Value::String(replace_env(&s, env)),
                other => other,
            };
            (replace_env(&key, env), value)
        })
        .collect()
}

/// Config key for an `npm_config_*` variable name.
///
/// `npm_config_cache_max` → `cache-max`. Keys that start with `//` are
/// registry-scoped and kept verbatim.
pub fn env_key(name: &str) -> Option<String> {
    let prefix = name.get(..ENV_PREFIX.len())?;
    if !prefix.eq_ignore_ascii_case(ENV_PREFIX) {
        return None;
    }
    let rest = &name[ENV_PREFIX.len()..];
    if rest.is_empty() {
        return None;
    }
    if rest.starts_with("//") {
        return Some(rest.to_string());
    }
    let mut key = String::with_capacity(rest.len());
    for (i, c) in rest.chars().enumerate() {
        if i > 0 && c == '_' {
            key.push('-');
        } else {
            key.push(c.to_ascii_lowercase());
        }
    }
    Some(key)
}

/// The environment layer's data. Empty variables are ignored.
pub fn env_source(env: &EnvMap) -> Map<String, Value> {
    env.iter()
        .filter(|(_, value)| !value.is_empty())
        .filter_map(|(name, value)| env_key(name).map(|k| (k, Value::String(value.clone()))))
        .collect()
}

/// Variable name a key is exported under: `_authToken` → `npm_config_authtoken`.
pub fn export_key(key: &str) -> String {
    let trimmed = key.trim_start_matches('_');
    format!(
        "{ENV_PREFIX}{}",
        EXPORT_INVALID.replace_all(trimmed, "_").to_lowercase()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn env() -> EnvMap {
        let mut env = EnvMap::new();
        env.insert("TOKEN".into(), "s3cret".into());
        env
    }

    #[rstest]
    #[case("${TOKEN}", "s3cret")]
    #[case("pre-${TOKEN}-post", "pre-s3cret-post")]
    #[case("${MISSING}", "${MISSING}")]
    #[case("${MISSING?}", "")]
    #[case(r"\${TOKEN}", "${TOKEN}")]
    #[case(r"\\${TOKEN}", r"\s3cret")]
    fn interpolation(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(replace_env(input, &env()), expected);
    }

    #[rstest]
    #[case("npm_config_cache_max", Some("cache-max"))]
    #[case("NPM_CONFIG_LOGLEVEL", Some("loglevel"))]
    #[case("npm_config__authToken", Some("_authtoken"))]
    #[case("npm_config_//reg.example.com/:_authToken", Some("//reg.example.com/:_authToken"))]
    #[case("npm_config_", None)]
    #[case("HOME", None)]
    fn env_names_map_to_keys(#[case] name: &str, #[case] expected: Option<&str>) {
        assert_eq!(env_key(name).as_deref(), expected);
    }

    #[test]
    fn empty_variables_are_skipped() {
        let mut env = EnvMap::new();
        env.insert("npm_config_editor".into(), String::new());
        env.insert("npm_config_loglevel".into(), "silly".into());
        let data = env_source(&env);
        assert_eq!(data.len(), 1);
        assert_eq!(data["loglevel"], Value::String("silly".into()));
    }

    #[test]
    fn export_names() {
        assert_eq!(export_key("_authToken"), "npm_config_authtoken");
        assert_eq!(export_key("strict-ssl"), "npm_config_strict_ssl");
        assert_eq!(export_key("init.author.name"), "npm_config_init_author_name");
    }
}
