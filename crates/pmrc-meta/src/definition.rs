//! Key definitions
//!
//! A [`Definition`] describes one recognized config key: its default, the
//! types it accepts, where it may be set, how it is spelled on the command
//! line and under which names it is exposed to consumers. Definitions are
//! built from a [`DefinitionSpec`], either in code or from JSON, and
//! construction rejects specs that miss a required field.

use std::sync::LazyLock;

use indexmap::{IndexMap, IndexSet};
use regex::Regex;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::location::Location;
use crate::types::{TypeContext, ValueType};
use crate::{Error, Result};

/// Maps a config value to an environment/process value. `None` skips it.
pub type ValueTransform = fn(&Value) -> Option<String>;

/// How a key's value is mirrored into an environment variable or a
/// process setting.
#[derive(Debug, Clone, Copy)]
pub enum EnvValue {
    /// Export the value as its plain string form.
    Identity,
    Map(ValueTransform),
}

impl EnvValue {
    pub fn apply(&self, value: &Value) -> Option<String> {
        match self {
            Self::Identity => Some(value_to_env_string(value)),
            Self::Map(f) => f(value),
        }
    }
}

/// The string form of a value when placed into an environment variable.
pub fn value_to_env_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(value_to_env_string)
            .collect::<Vec<_>>()
            .join("\n\n"),
        other => other.to_string(),
    }
}

/// What a shorthand expands to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShortValue {
    /// `-x` means `--key`.
    Same,
    /// `-x` means `--no-key`.
    Negate,
    /// `-x` means `--key value`.
    Value(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shorthand {
    pub key: String,
    pub value: ShortValue,
}

/// Why a value was refused by a definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// The key may not be set at this location at all.
    NotAllowed,
    /// None of the key's types accepted the value.
    Invalid,
}

/// Unchecked definition fields.
///
/// Every field is optional here so that a missing required field surfaces
/// as a [`Error::MissingField`] from [`Definition::new`] instead of a
/// compile error or a panic.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct DefinitionSpec {
    #[serde(default, deserialize_with = "present")]
    pub default: Option<Value>,
    pub description: Option<String>,
    #[serde(rename = "type", default, deserialize_with = "type_list")]
    pub types: Option<Vec<ValueType>>,
    #[serde(default, deserialize_with = "shorthand_list")]
    pub alias: Vec<Shorthand>,
    #[serde(default, deserialize_with = "shorthand_list")]
    pub short: Vec<Shorthand>,
    pub default_description: Option<String>,
    pub deprecated: Option<String>,
    #[serde(default)]
    pub depends: Vec<String>,
    pub env_export: Option<bool>,
    #[serde(default)]
    pub exclusive: Vec<String>,
    #[serde(default, deserialize_with = "one_or_many")]
    pub flatten: Vec<String>,
    #[serde(default, deserialize_with = "one_or_many")]
    pub hint: Vec<String>,
    #[serde(default, deserialize_with = "location_list")]
    pub location: Vec<Location>,
    #[serde(default, deserialize_with = "env_mapping")]
    pub set_env: Vec<(String, EnvValue)>,
    #[serde(default, deserialize_with = "env_mapping")]
    pub set_process: Vec<(String, EnvValue)>,
    pub usage: Option<String>,
}

impl DefinitionSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn types(mut self, types: impl IntoIterator<Item = ValueType>) -> Self {
        self.types = Some(types.into_iter().collect());
        self
    }

    pub fn short(mut self, key: &str, value: ShortValue) -> Self {
        self.short.push(Shorthand {
            key: key.to_string(),
            value,
        });
        self
    }

    pub fn alias(mut self, key: &str, value: ShortValue) -> Self {
        self.alias.push(Shorthand {
            key: key.to_string(),
            value,
        });
        self
    }

    pub fn default_description(mut self, text: impl Into<String>) -> Self {
        self.default_description = Some(text.into());
        self
    }

    pub fn deprecated(mut self, text: impl Into<String>) -> Self {
        self.deprecated = Some(text.into());
        self
    }

    pub fn env_export(mut self, export: bool) -> Self {
        self.env_export = Some(export);
        self
    }

    pub fn depends(mut self, keys: &[&str]) -> Self {
        self.depends = keys.iter().map(|k| k.to_string()).collect();
        self
    }

    pub fn exclusive(mut self, keys: &[&str]) -> Self {
        self.exclusive = keys.iter().map(|k| k.to_string()).collect();
        self
    }

    pub fn flatten(mut self, name: &str) -> Self {
        self.flatten.push(name.to_string());
        self
    }

    pub fn hint(mut self, hint: &str) -> Self {
        self.hint.push(hint.to_string());
        self
    }

    pub fn location(mut self, locations: &[Location]) -> Self {
        self.location = locations.to_vec();
        self
    }

    pub fn set_env(mut self, name: &str, value: EnvValue) -> Self {
        self.set_env.push((name.to_string(), value));
        self
    }

    pub fn set_process(mut self, name: &str, value: EnvValue) -> Self {
        self.set_process.push((name.to_string(), value));
        self
    }

    pub fn usage(mut self, usage: impl Into<String>) -> Self {
        self.usage = Some(usage.into());
        self
    }
}

/// A validated, immutable key definition.
#[derive(Debug, Clone)]
pub struct Definition {
    key: String,
    default: Value,
    description: String,
    types: Vec<ValueType>,
    locations: Vec<Location>,
    short_keys: Vec<String>,
    alias_keys: Vec<String>,
    shorthands: Vec<(String, Vec<String>)>,
    flatten_to: IndexSet<String>,
    depends: Vec<String>,
    deprecated: Option<String>,
    env_export: bool,
    exclusive: Vec<String>,
    hint: Vec<String>,
    default_description: Option<String>,
    set_env: Vec<(String, EnvValue)>,
    set_process: Vec<(String, EnvValue)>,
}

static FLAT_KEY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"-(ssl|tty|[a-z])").expect("Invalid flat key regex"));

static INDENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n +").expect("Invalid indent regex"));

/// The consumer-facing spelling of a key: `cache-max` → `cacheMax`,
/// `strict-ssl` → `strictSSL`.
pub fn flat_key(key: &str) -> String {
    FLAT_KEY
        .replace_all(key, |caps: &regex::Captures<'_>| caps[1].to_uppercase())
        .into_owned()
}

fn unindent(text: &str) -> String {
    INDENT.replace_all(text.trim(), "\n").into_owned()
}

impl Definition {
    pub fn new(key: impl Into<String>, spec: DefinitionSpec) -> Result<Self> {
        let key = key.into();
        if key.is_empty() {
            return Err(Error::InvalidDefinition {
                key,
                message: "config lacks key".to_string(),
            });
        }

        let missing = |field| Error::MissingField {
            key: key.clone(),
            field,
        };
        let default = spec.default.ok_or_else(|| missing("default"))?;
        let description = spec.description.ok_or_else(|| missing("description"))?;
        let mut types = spec.types.ok_or_else(|| missing("type"))?;
        if types.is_empty() {
            return Err(Error::InvalidDefinition {
                key,
                message: "type list is empty".to_string(),
            });
        }
        if default.is_null() && !types.contains(&ValueType::Null) {
            types.insert(0, ValueType::Null);
        }

        let mut flatten_to = IndexSet::new();
        if spec.flatten.is_empty() {
            flatten_to.insert(flat_key(&key));
        }
        for name in &spec.flatten {
            flatten_to.insert(flat_key(name));
        }

        let mut short_keys = Vec::new();
        let mut alias_keys = Vec::new();
        let mut shorthands = Vec::new();
        for (list, keys) in [(&spec.short, &mut short_keys), (&spec.alias, &mut alias_keys)] {
            for s in list {
                if s.value == ShortValue::Same {
                    keys.push(s.key.clone());
                }
                let expansion = match &s.value {
                    ShortValue::Same => vec![format!("--{key}")],
                    ShortValue::Negate => vec![format!("--no-{key}")],
                    ShortValue::Value(v) => vec![format!("--{key}"), v.clone()],
                };
                shorthands.push((s.key.clone(), expansion));
            }
        }

        Ok(Self {
            default,
            description,
            types,
            locations: spec.location,
            short_keys,
            alias_keys,
            shorthands,
            flatten_to,
            depends: spec.depends,
            deprecated: spec.deprecated.as_deref().map(unindent),
            env_export: spec.env_export.unwrap_or(true),
            exclusive: spec.exclusive,
            hint: spec.hint,
            default_description: spec.default_description,
            set_env: spec.set_env,
            set_process: spec.set_process,
            key,
        })
    }

    /// Build a definition from its JSON form, rejecting unknown fields.
    pub fn from_json(key: impl Into<String>, value: &Value) -> Result<Self> {
        let key = key.into();
        let spec: DefinitionSpec =
            serde_json::from_value(value.clone()).map_err(|e| Error::InvalidDefinition {
                key: key.clone(),
                message: e.to_string(),
            })?;
        Self::new(key, spec)
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn default(&self) -> &Value {
        &self.default
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn types(&self) -> &[ValueType] {
        &self.types
    }

    pub fn locations(&self) -> &[Location] {
        &self.locations
    }

    pub fn deprecated(&self) -> Option<&str> {
        self.deprecated.as_deref()
    }

    pub fn env_export(&self) -> bool {
        self.env_export
    }

    /// Single-token short spellings (`-g` for `--global`).
    pub fn short(&self) -> &[String] {
        &self.short_keys
    }

    /// Single-token long aliases (`--ws` for `--workspaces`).
    pub fn alias(&self) -> &[String] {
        &self.alias_keys
    }

    /// Every shorthand with its token expansion, including multi-token ones.
    pub fn shorthands(&self) -> &[(String, Vec<String>)] {
        &self.shorthands
    }

    pub fn flatten_to(&self) -> impl Iterator<Item = &str> {
        self.flatten_to.iter().map(String::as_str)
    }

    /// Keys this definition's value is validated against.
    pub fn depends_on(&self) -> &[String] {
        &self.depends
    }

    pub fn set_env(&self) -> &[(String, EnvValue)] {
        &self.set_env
    }

    pub fn set_process(&self) -> &[(String, EnvValue)] {
        &self.set_process
    }

    pub fn is_boolean(&self) -> bool {
        self.types.iter().any(ValueType::is_boolean)
    }

    pub fn is_array(&self) -> bool {
        self.types.contains(&ValueType::Array)
    }

    /// Only settable in the internal facts layer.
    pub fn is_internal(&self) -> bool {
        self.locations == [Location::Internal]
    }

    /// A key is allowed everywhere unless it lists locations; defaults and
    /// the builtin file may always seed it.
    pub fn is_allowed(&self, location: Location) -> bool {
        self.locations.is_empty()
            || self.locations.contains(&location)
            || matches!(location, Location::Default | Location::Builtin)
    }

    /// Validate and normalize a raw value for `location`.
    pub fn coerce(
        &self,
        raw: &Value,
        location: Location,
        ctx: &TypeContext,
    ) -> std::result::Result<Value, Rejection> {
        if !self.is_allowed(location) {
            return Err(Rejection::NotAllowed);
        }

        let types = self.types.as_slice();
        if !self.is_array() {
            return coerce_scalar(raw, types, ctx).ok_or(Rejection::Invalid);
        }

        let items: Vec<Value> = match raw {
            Value::Null if types.contains(&ValueType::Null) => return Ok(Value::Null),
            Value::Array(items) => items.clone(),
            other => vec![other.clone()],
        };
        items
            .iter()
            .map(|item| coerce_scalar(item, types, ctx).ok_or(Rejection::Invalid))
            .collect::<std::result::Result<Vec<_>, _>>()
            .map(Value::Array)
    }

    /// Message fragment explaining which values are accepted.
    pub fn invalid_usage(&self) -> String {
        let allow_multiple = self.is_array();
        let types: Vec<&ValueType> = if self.types.contains(&ValueType::Url) {
            vec![&ValueType::Url]
        } else if self.types.contains(&ValueType::Path) {
            vec![&ValueType::Path]
        } else {
            self.types.iter().collect()
        };

        let mut must_be: IndexSet<String> = IndexSet::new();
        for t in types {
            if matches!(t, ValueType::Array | ValueType::Null) {
                continue;
            }
            match (t.values(), t.description()) {
                (Some(values), _) => must_be.extend(values),
                (None, Some(desc)) => {
                    must_be.insert(desc.to_string());
                }
                (None, None) => {
                    must_be.insert(t.type_description());
                }
            }
        }

        let single = must_be.len() == 1;
        let one_of = match (single, allow_multiple) {
            (true, true) => "one or more",
            (false, true) => "one or more of:",
            (false, false) => "one of:",
            (true, false) => "",
        };
        let list = must_be.into_iter().collect::<Vec<_>>().join(", ");
        collapse_spaces(&format!("Must be {one_of} {list}"))
    }

    /// Command line usage, e.g. `-g|--global` or `--loglevel <silent|error>`.
    pub fn describe_usage(&self) -> String {
        let mut usage: Vec<String> = self
            .short_keys
            .iter()
            .map(|s| format!("-{s}"))
            .chain(self.alias_keys.iter().map(|s| format!("--{s}")))
            .collect();

        if self.is_boolean() {
            match self.default {
                Value::Bool(true) => usage.push(format!("--no-{}", self.key)),
                Value::Bool(false) => usage.push(format!("--{}", self.key)),
                _ => {
                    usage.push(format!("--no-{}", self.key));
                    usage.push(format!("--{}", self.key));
                }
            }
        } else {
            usage.push(format!("--{}", self.key));
        }

        let descriptions: Vec<String> = if !self.hint.is_empty() {
            self.hint.clone()
        } else {
            self.types
                .iter()
                .filter(|t| !matches!(t, ValueType::Null | ValueType::Array | ValueType::Boolean))
                .flat_map(|t| t.hint().unwrap_or_else(|| vec![self.key.clone()]))
                .collect()
        };

        let desc = descriptions.join("|");
        let usage_desc = if desc.is_empty() {
            usage.join("|")
        } else {
            format!("{} <{}>", usage.join("|"), desc)
        };

        if self.is_array() {
            format!("{usage_desc} [{usage_desc} ...]")
        } else {
            usage_desc
        }
    }

    /// Human readable type summary: `a`, `a or b`, `a, b, or c`.
    pub fn describe_types(&self) -> String {
        let mut descriptions: Vec<String> = self
            .types
            .iter()
            .filter(|t| **t != ValueType::Array)
            .map(ValueType::type_description)
            .collect();

        let last = if descriptions.len() > 1 {
            descriptions.pop()
        } else {
            None
        };
        let oxford = if descriptions.len() > 1 { ", or " } else { " or " };
        let mut words = descriptions.join(", ");
        if let Some(last) = last {
            words = format!("{words}{oxford}{last}");
        }
        if self.is_array() {
            words.push_str(" (can be set multiple times)");
        }
        words
    }

    /// Markdown help block for this key.
    pub fn describe(&self) -> String {
        let default = self
            .default_description
            .clone()
            .unwrap_or_else(|| describe_value(&self.default));
        let mut lines = vec![
            format!("#### `{}`", self.key),
            String::new(),
            format!("* Default: {}", unindent(&default)),
            format!("* Type: {}", self.describe_types()),
        ];
        if let Some(dep) = &self.deprecated {
            lines.push(format!("* DEPRECATED: {dep}"));
        }
        lines.push(String::new());
        lines.push(unindent(&self.description));
        if !self.exclusive.is_empty() {
            lines.push(format!(
                "\nThis config can not be used with: `{}`",
                self.exclusive.join("`, `")
            ));
        }
        if !self.env_export {
            lines.push(String::new());
            lines.push(
                "This value is not exported to the environment for child processes.".to_string(),
            );
        }
        lines.join("\n")
    }
}

fn coerce_scalar(raw: &Value, types: &[ValueType], ctx: &TypeContext) -> Option<Value> {
    // literal matches win over any coercing type
    types
        .iter()
        .filter(|t| matches!(t, ValueType::Choice(_)))
        .chain(types.iter().filter(|t| !matches!(t, ValueType::Choice(_))))
        .find_map(|t| t.coerce(raw, ctx))
}

/// Quote strings, print everything else as-is.
pub fn describe_value(value: &Value) -> String {
    match value {
        Value::Array(items) => format!(
            "[{}]",
            items.iter().map(describe_value).collect::<Vec<_>>().join(",")
        ),
        Value::String(s) => format!("{s:?}"),
        other => other.to_string(),
    }
}

fn collapse_spaces(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

// serde helpers for the JSON form

fn present<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<Option<Value>, D::Error> {
    Value::deserialize(d).map(Some)
}

fn one_or_many<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<Vec<String>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        One(String),
        Many(Vec<String>),
    }
    Ok(match Raw::deserialize(d)? {
        Raw::One(s) => vec![s],
        Raw::Many(v) => v,
    })
}

fn location_list<'de, D: Deserializer<'de>>(
    d: D,
) -> std::result::Result<Vec<Location>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        One(Location),
        Many(Vec<Location>),
    }
    Ok(match Raw::deserialize(d)? {
        Raw::One(l) => vec![l],
        Raw::Many(v) => v,
    })
}

fn type_list<'de, D: Deserializer<'de>>(
    d: D,
) -> std::result::Result<Option<Vec<ValueType>>, D::Error> {
    let raw = Value::deserialize(d)?;
    let entries = match raw {
        Value::Array(items) => items,
        other => vec![other],
    };

    let mut types = Vec::new();
    let mut literals: Vec<String> = Vec::new();
    let mut literal_slot = None;
    for entry in entries {
        match entry {
            Value::Null => types.push(ValueType::Null),
            Value::String(name) => match ValueType::by_name(&name) {
                Some(t) => types.push(t),
                None => {
                    literal_slot.get_or_insert(types.len());
                    literals.push(name);
                }
            },
            other => {
                return Err(serde::de::Error::custom(format!(
                    "unsupported type entry: {other}"
                )));
            }
        }
    }
    if let Some(slot) = literal_slot {
        types.insert(slot, ValueType::Choice(literals));
    }
    Ok(Some(types))
}

fn shorthand_list<'de, D: Deserializer<'de>>(
    d: D,
) -> std::result::Result<Vec<Shorthand>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawValue {
        Flag(bool),
        Value(String),
    }
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        One(String),
        Many(Vec<String>),
        Map(IndexMap<String, RawValue>),
    }

    let same = |key: String| Shorthand {
        key,
        value: ShortValue::Same,
    };
    Ok(match Raw::deserialize(d)? {
        Raw::One(key) => vec![same(key)],
        Raw::Many(keys) => keys.into_iter().map(same).collect(),
        Raw::Map(map) => map
            .into_iter()
            .map(|(key, value)| Shorthand {
                key,
                value: match value {
                    RawValue::Flag(true) => ShortValue::Same,
                    RawValue::Flag(false) => ShortValue::Negate,
                    RawValue::Value(v) => ShortValue::Value(v),
                },
            })
            .collect(),
    })
}

fn env_mapping<'de, D: Deserializer<'de>>(
    d: D,
) -> std::result::Result<Vec<(String, EnvValue)>, D::Error> {
    let map = IndexMap::<String, bool>::deserialize(d)?;
    Ok(map
        .into_iter()
        .filter(|(_, enabled)| *enabled)
        .map(|(name, _)| (name, EnvValue::Identity))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn loglevel() -> Definition {
        Definition::new(
            "loglevel",
            DefinitionSpec::new()
                .default_value("notice")
                .types([ValueType::choice(["silent", "warn", "notice"])])
                .short("s", ShortValue::Value("silent".to_string()))
                .alias("quiet", ShortValue::Value("warn".to_string()))
                .description("What level of logs to report."),
        )
        .unwrap()
    }

    #[test]
    fn flat_key_camel_cases_with_acronyms() {
        assert_eq!(flat_key("cache-max"), "cacheMax");
        assert_eq!(flat_key("strict-ssl"), "strictSSL");
        assert_eq!(flat_key("search.limit"), "search.limit");
        assert_eq!(flat_key("_authToken"), "_authToken");
    }

    #[test]
    fn missing_required_fields_fail() {
        let err = Definition::new("x", DefinitionSpec::new().description("d")).unwrap_err();
        assert!(matches!(err, Error::MissingField { field: "default", .. }));

        let err = Definition::new(
            "x",
            DefinitionSpec::new().default_value(1).description("d"),
        )
        .unwrap_err();
        assert!(matches!(err, Error::MissingField { field: "type", .. }));
    }

    #[test]
    fn unknown_json_field_fails() {
        let err = Definition::from_json(
            "x",
            &json!({ "default": 1, "description": "d", "type": "Number", "colour": "red" }),
        )
        .unwrap_err();
        assert!(matches!(err, Error::InvalidDefinition { .. }));
    }

    #[test]
    fn json_null_default_counts_as_present() {
        let def = Definition::from_json(
            "otp",
            &json!({ "default": null, "description": "one-time password", "type": "String" }),
        )
        .unwrap();
        assert_eq!(def.types(), &[ValueType::Null, ValueType::String]);
    }

    #[test]
    fn multi_token_shorthands_are_not_canonical_spellings() {
        let def = loglevel();
        assert!(def.short().is_empty());
        assert!(def.alias().is_empty());
        assert_eq!(
            def.shorthands(),
            &[
                ("s".to_string(), vec!["--loglevel".to_string(), "silent".to_string()]),
                ("quiet".to_string(), vec!["--loglevel".to_string(), "warn".to_string()]),
            ]
        );
    }

    #[test]
    fn choice_invalid_usage_lists_values() {
        assert_eq!(
            loglevel().invalid_usage(),
            r#"Must be one of: "silent", "warn", "notice""#
        );
    }

    #[test]
    fn single_type_invalid_usage() {
        let def = Definition::new(
            "fetch-retries",
            DefinitionSpec::new()
                .default_value(2)
                .types([ValueType::Number])
                .description("retries"),
        )
        .unwrap();
        assert_eq!(def.invalid_usage(), "Must be numeric value");
        assert_eq!(def.describe_usage(), "--fetch-retries <number>");
    }

    #[test]
    fn array_invalid_usage_says_one_or_more() {
        let def = Definition::new(
            "omit",
            DefinitionSpec::new()
                .default_value(json!([]))
                .types([ValueType::Array, ValueType::choice(["dev", "optional", "peer"])])
                .description("omit"),
        )
        .unwrap();
        assert_eq!(
            def.invalid_usage(),
            r#"Must be one or more of: "dev", "optional", "peer""#
        );
        assert_eq!(
            def.describe_usage(),
            "--omit <dev|optional|peer> [--omit <dev|optional|peer> ...]"
        );
        assert_eq!(
            def.describe_types(),
            r#""dev", "optional", "peer" (can be set multiple times)"#
        );
    }

    #[test]
    fn boolean_usage_depends_on_default() {
        let def = Definition::new(
            "global",
            DefinitionSpec::new()
                .default_value(false)
                .types([ValueType::Boolean])
                .short("g", ShortValue::Same)
                .description("global mode"),
        )
        .unwrap();
        assert_eq!(def.describe_usage(), "-g|--global");
        assert_eq!(def.short(), &["g".to_string()]);
    }

    #[test]
    fn restricted_keys_become_not_allowed_elsewhere() {
        let def = Definition::new(
            "npm-version",
            DefinitionSpec::new()
                .default_value(Value::Null)
                .types([ValueType::String])
                .location(&[Location::Internal])
                .description("version"),
        )
        .unwrap();
        let ctx = TypeContext::default();
        assert!(def.is_internal());
        assert!(def.is_allowed(Location::Default));
        assert_eq!(
            def.coerce(&json!("1.0.0"), Location::Cli, &ctx),
            Err(Rejection::NotAllowed)
        );
        assert_eq!(
            def.coerce(&json!("1.0.0"), Location::Internal, &ctx),
            Ok(json!("1.0.0"))
        );
    }

    #[test]
    fn array_keys_wrap_scalars_and_reject_bad_items() {
        let def = Definition::new(
            "omit",
            DefinitionSpec::new()
                .default_value(json!([]))
                .types([ValueType::Array, ValueType::choice(["dev", "optional"])])
                .description("omit"),
        )
        .unwrap();
        let ctx = TypeContext::default();
        assert_eq!(def.coerce(&json!("dev"), Location::Cli, &ctx), Ok(json!(["dev"])));
        assert_eq!(
            def.coerce(&json!(["dev", "bogus"]), Location::Cli, &ctx),
            Err(Rejection::Invalid)
        );
    }

    #[test]
    fn literal_alternatives_win_over_coercion() {
        let def = Definition::new(
            "color",
            DefinitionSpec::new()
                .default_value(true)
                .types([ValueType::Boolean, ValueType::choice(["always"])])
                .description("color"),
        )
        .unwrap();
        let ctx = TypeContext::default();
        assert_eq!(def.coerce(&json!("always"), Location::Cli, &ctx), Ok(json!("always")));
        assert_eq!(def.coerce(&json!("false"), Location::Cli, &ctx), Ok(json!(false)));
    }

    #[test]
    fn deprecated_text_is_unindented() {
        let def = Definition::new(
            "init.author.name",
            DefinitionSpec::new()
                .default_value("")
                .types([ValueType::String])
                .deprecated("\n    Use `--init-author-name` instead.\n    It is shorter.\n")
                .description("author"),
        )
        .unwrap();
        assert_eq!(
            def.deprecated(),
            Some("Use `--init-author-name` instead.\nIt is shorter.")
        );
    }
}
