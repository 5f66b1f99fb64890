//! Registry-scoped ("nerf-darted") key helpers
//!
//! Auth settings are scoped to a registry by prefixing the key with the
//! registry URL stripped of its protocol: `//registry.example.com/:_authToken`.
//! Such keys, and `@scope:registry` keys, are dynamic and cannot be listed in
//! the static catalog.

use std::sync::LazyLock;

use regex::Regex;

use crate::{Error, Result};

static SCOPED_REGISTRY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^@[^:/]+:registry$").expect("Invalid scoped registry regex")
});

/// `//host/path:key`
pub fn is_nerfed(key: &str) -> bool {
    key.starts_with("//")
}

/// `@scope:registry`
pub fn is_scoped_registry(key: &str) -> bool {
    SCOPED_REGISTRY.is_match(key)
}

/// Keys accepted without a static definition.
pub fn is_dynamic_key(key: &str) -> bool {
    is_nerfed(key) || is_scoped_registry(key)
}

/// Reduce a registry URL to its scoping prefix.
///
/// The protocol, query and fragment are dropped and the path is cut back to
/// its last directory, so `https://reg.example.com/npm/pkg?x=1` becomes
/// `//reg.example.com/npm/`.
pub fn nerf_dart(registry: &str) -> Result<String> {
    let invalid = |message: String| Error::InvalidUrl {
        url: registry.to_string(),
        message,
    };
    let parsed = url::Url::parse(registry).map_err(|e| invalid(e.to_string()))?;
    let dir = parsed.join(".").map_err(|e| invalid(e.to_string()))?;
    let host = dir
        .host_str()
        .ok_or_else(|| invalid("url has no host".to_string()))?;
    let host = match dir.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    };
    Ok(format!("//{}{}", host, dir.path()))
}
