//! The standard derived entries

use std::path::Path;
use std::sync::LazyLock;

use indexmap::IndexMap;
use regex::Regex;
use serde_json::{Value, json};

use super::{DerivedEntry, Inputs};

const CERT_END: &str = "-----END CERTIFICATE-----";

static PRODUCTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^prod(uction)?$").expect("Invalid production regex"));

fn join(base: &str, parts: &[&str]) -> Value {
    let mut path = Path::new(base).to_path_buf();
    for part in parts {
        path.push(part);
    }
    Value::String(path.to_string_lossy().into_owned())
}

fn unique(items: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(items.len());
    for item in items {
        if !out.contains(&item) {
            out.push(item);
        }
    }
    out
}

/// Replace every ASCII-case-insensitive occurrence of `pattern`.
fn replace_ignore_case(text: &str, pattern: &str, with: &str) -> String {
    let lower = text.to_ascii_lowercase();
    let needle = pattern.to_ascii_lowercase();
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for (start, _) in lower.match_indices(&needle) {
        out.push_str(&text[last..start]);
        out.push_str(with);
        last = start + needle.len();
    }
    out.push_str(&text[last..]);
    out
}

fn global_location(inputs: &Inputs) -> IndexMap<String, Value> {
    let global = inputs.truthy("global") || inputs.str("location") == Some("global");
    let mut out = IndexMap::new();
    if global {
        out.insert("global".to_string(), json!(true));
        out.insert("location".to_string(), json!("global"));
    } else {
        out.insert("global".to_string(), inputs.get("global").clone());
        out.insert("location".to_string(), inputs.get("location").clone());
    }
    out
}

fn prefixes(inputs: &Inputs) -> IndexMap<String, Value> {
    let prefix = match inputs.get("prefix") {
        Value::Null => inputs.get("default-global-prefix").clone(),
        set => set.clone(),
    };
    let globalconfig = match (inputs.get("globalconfig"), prefix.as_str()) {
        (Value::Null, Some(p)) => join(p, &["etc", "npmrc"]),
        (set, _) => set.clone(),
    };
    let mut out = IndexMap::new();
    out.insert("prefix".to_string(), prefix.clone());
    out.insert("globalconfig".to_string(), globalconfig);
    out.insert("global-prefix".to_string(), prefix);
    out
}

fn omit(inputs: &Inputs) -> Value {
    let mut derived = inputs.strings("omit");
    let only = inputs.str("only").unwrap_or_default();
    if PRODUCTION.is_match(only) || inputs.truthy("production") {
        derived.push("dev".to_string());
    }
    if inputs.bool("optional") == Some(false) {
        derived.push("optional".to_string());
    }
    let include = inputs.strings("include");
    json!(
        unique(derived)
            .into_iter()
            .filter(|t| !include.contains(t))
            .collect::<Vec<_>>()
    )
}

fn include(inputs: &Inputs) -> Value {
    let mut derived = inputs.strings("include");
    if inputs.bool("production") == Some(false)
        || inputs.str("also").is_some_and(|a| a.starts_with("dev"))
        || inputs.truthy("dev")
    {
        derived.push("dev".to_string());
    }
    if inputs.bool("optional") == Some(true) {
        derived.push("optional".to_string());
    }
    json!(unique(derived))
}

fn local_prefix(inputs: &Inputs) -> Value {
    if !inputs.get("prefix").is_null() {
        return inputs.get("prefix").clone();
    }
    let root = inputs.str("local-prefix-root");
    let fallback = root.or(inputs.str("cwd"));
    let global = inputs.truthy("global") || inputs.str("location") == Some("global");
    if root.is_some() && (inputs.bool("workspaces") == Some(false) || global) {
        return json!(fallback);
    }
    json!(inputs.str("local-prefix-workspace").or(fallback))
}

fn cache_root(inputs: &Inputs) -> IndexMap<String, Value> {
    let root = inputs.get("cache").clone();
    let cache = match root.as_str() {
        Some(r) => join(r, &["_cacache"]),
        None => Value::Null,
    };
    let mut out = IndexMap::new();
    out.insert("cache-root".to_string(), root);
    out.insert("cache".to_string(), cache);
    out
}

fn under_cache_root(inputs: &Inputs, dir: &str) -> Value {
    match inputs.str("cache-root") {
        Some(root) => join(root, &[dir]),
        None => Value::Null,
    }
}

fn npx_cache(inputs: &Inputs) -> Value {
    under_cache_root(inputs, "_npx")
}

fn tuf_cache(inputs: &Inputs) -> Value {
    under_cache_root(inputs, "_tuf")
}

fn logs_dir(inputs: &Inputs) -> Value {
    match inputs.get("logs-dir") {
        Value::Null => under_cache_root(inputs, "_logs"),
        set => set.clone(),
    }
}

fn prefer_online(inputs: &Inputs) -> Value {
    if inputs.number("cache-max").is_some_and(|max| max <= 0.0) {
        json!(true)
    } else {
        inputs.get("prefer-online").clone()
    }
}

fn prefer_offline(inputs: &Inputs) -> Value {
    if inputs.number("cache-min").is_some_and(|min| min >= 9999.0) {
        json!(true)
    } else {
        inputs.get("prefer-offline").clone()
    }
}

/// Split a certificate bundle into individual certificates.
fn ca(inputs: &Inputs) -> Value {
    let Some(raw) = inputs.str("cafile-contents").filter(|s| !s.is_empty()) else {
        return inputs.get("ca").clone();
    };
    let certs: Vec<String> = raw
        .replace("\r\n", "\n")
        .split(CERT_END)
        .filter(|s| !s.trim().is_empty())
        .map(|s| format!("{}{CERT_END}", s.trim_start()))
        .collect();
    json!(certs)
}

fn color_for(inputs: &Inputs, tty: &str) -> Value {
    let color = match inputs.get("color") {
        Value::String(s) if s == "always" => true,
        _ if !inputs.truthy("color") => false,
        _ => inputs.truthy(tty),
    };
    json!(color)
}

fn color(inputs: &Inputs) -> Value {
    color_for(inputs, "stdout-tty")
}

fn log_color(inputs: &Inputs) -> Value {
    color_for(inputs, "stderr-tty")
}

fn search_limit(inputs: &Inputs) -> Value {
    inputs.get("searchlimit").clone()
}

fn search_description(inputs: &Inputs) -> Value {
    inputs.get("description").clone()
}

fn search_exclude(inputs: &Inputs) -> Value {
    json!(inputs.str("searchexclude").unwrap_or_default().to_lowercase())
}

fn search_opts(inputs: &Inputs) -> Value {
    inputs.get("searchopts").clone()
}

fn progress(inputs: &Inputs) -> Value {
    json!(inputs.truthy("progress") && inputs.truthy("stderr-tty") && inputs.str("term") != Some("dumb"))
}

fn save_bundle(inputs: &Inputs) -> Value {
    json!(inputs.truthy("save-bundle") && !inputs.truthy("save-peer"))
}

fn install_strategy(inputs: &Inputs) -> Value {
    if inputs.truthy("global-style") {
        json!("shallow")
    } else if inputs.truthy("legacy-bundling") {
        json!("nested")
    } else {
        inputs.get("install-strategy").clone()
    }
}

fn save_prefix(inputs: &Inputs) -> Value {
    if inputs.truthy("save-exact") {
        json!("")
    } else {
        inputs.get("save-prefix").clone()
    }
}

fn save_type(inputs: &Inputs) -> Value {
    let peer = inputs.truthy("save-peer");
    let optional = inputs.truthy("save-optional");
    if peer && optional {
        json!("peerOptional")
    } else if peer {
        json!("peer")
    } else if optional {
        json!("optional")
    } else if inputs.truthy("save-dev") {
        json!("dev")
    } else if inputs.truthy("save-prod") {
        json!("prod")
    } else {
        Value::Null
    }
}

fn project_scope(inputs: &Inputs) -> Value {
    inputs.get("scope").clone()
}

fn user_agent(inputs: &Inputs) -> Value {
    let workspaces =
        inputs.truthy("workspaces") || !inputs.strings("workspace").is_empty();
    let ci = inputs
        .str("ci-name")
        .map(|name| format!("ci/{name}"))
        .unwrap_or_default();
    let fields = [
        ("{node-version}", inputs.str("node-version").unwrap_or_default().to_string()),
        ("{npm-version}", inputs.str("npm-version").unwrap_or_default().to_string()),
        ("{platform}", inputs.str("platform").unwrap_or_default().to_string()),
        ("{arch}", inputs.str("arch").unwrap_or_default().to_string()),
        ("{workspaces}", workspaces.to_string()),
        ("{ci}", ci),
    ];
    let mut agent = inputs.str("user-agent").unwrap_or_default().to_string();
    for (field, value) in &fields {
        agent = replace_ignore_case(&agent, field, value);
    }
    json!(agent.trim())
}

fn silent(inputs: &Inputs) -> Value {
    json!(inputs.str("loglevel") == Some("silent"))
}

fn workspaces_enabled(inputs: &Inputs) -> Value {
    json!(inputs.bool("workspaces") != Some(false))
}

fn package_lock(inputs: &Inputs) -> Value {
    json!(inputs.truthy("package-lock") || inputs.truthy("package-lock-only"))
}

fn auth_type(inputs: &Inputs) -> Value {
    if inputs.truthy("otp") {
        json!("legacy")
    } else {
        inputs.get("auth-type").clone()
    }
}

/// Every standard derived entry.
pub fn entries() -> Vec<DerivedEntry> {
    vec![
        DerivedEntry::group(&["global", "location"], &[], global_location),
        DerivedEntry::group(
            &["prefix", "globalconfig", "global-prefix"],
            &["default-global-prefix"],
            prefixes,
        ),
        DerivedEntry::single(
            "omit",
            &["dev", "production", "optional", "only", "also", "include"],
            omit,
        ),
        DerivedEntry::single("include", &["dev", "production", "optional", "also"], include),
        DerivedEntry::single(
            "local-prefix",
            &[
                "prefix",
                "workspaces",
                "global",
                "location",
                "cwd",
                "local-prefix-root",
                "local-prefix-workspace",
            ],
            local_prefix,
        ),
        DerivedEntry::group(&["cache-root", "cache"], &[], cache_root),
        DerivedEntry::single("npx-cache", &["cache-root"], npx_cache),
        DerivedEntry::single("tuf-cache", &["cache-root"], tuf_cache),
        DerivedEntry::single("logs-dir", &["cache-root"], logs_dir),
        DerivedEntry::single("prefer-online", &["cache-max"], prefer_online),
        DerivedEntry::single("prefer-offline", &["cache-min"], prefer_offline),
        DerivedEntry::single("ca", &["cafile-contents"], ca),
        DerivedEntry::single("color", &["stdout-tty"], color),
        DerivedEntry::single("log-color", &["color", "stderr-tty"], log_color),
        DerivedEntry::single("search.limit", &["searchlimit"], search_limit),
        DerivedEntry::single("search.description", &["description"], search_description),
        DerivedEntry::single("search.exclude", &["searchexclude"], search_exclude),
        DerivedEntry::single("search.opts", &["searchopts"], search_opts),
        DerivedEntry::single("progress", &["stderr-tty", "term"], progress),
        DerivedEntry::single("save-bundle", &["save-peer"], save_bundle),
        DerivedEntry::single(
            "install-strategy",
            &["global-style", "legacy-bundling"],
            install_strategy,
        ),
        DerivedEntry::single("save-prefix", &["save-exact"], save_prefix),
        DerivedEntry::single(
            "save-type",
            &["save-dev", "save-optional", "save-peer", "save-prod"],
            save_type,
        ),
        DerivedEntry::single("project-scope", &["scope"], project_scope),
        DerivedEntry::single(
            "user-agent",
            &[
                "ci-name",
                "workspaces",
                "workspace",
                "npm-version",
                "node-version",
                "platform",
                "arch",
            ],
            user_agent,
        ),
        DerivedEntry::single("silent", &["loglevel"], silent),
        DerivedEntry::single("workspaces-enabled", &["workspaces"], workspaces_enabled),
        DerivedEntry::single("package-lock", &["package-lock-only"], package_lock),
        DerivedEntry::single("auth-type", &["otp"], auth_type),
    ]
}
