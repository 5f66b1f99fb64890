//! Value type registry
//!
//! Every config key declares an ordered list of accepted [`ValueType`]s.
//! Raw input (a string from a file or the command line, or an already typed
//! JSON value) is offered to each type in turn; the first type that accepts
//! it produces the stored, normalized value.

use std::path::{Component, Path, PathBuf};

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use serde_json::{Number, Value};

/// A named value type with a coercion rule and human readable descriptions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueType {
    /// Accepts only `null`.
    Null,
    Boolean,
    String,
    Number,
    /// A filesystem path, `~` expanded and made absolute.
    Path,
    /// An absolute URL with a host.
    Url,
    /// A date, normalized to RFC 3339.
    Date,
    /// A closed set of literal string values.
    Choice(Vec<String>),
    /// Marker: the key may be given several times and holds an array.
    Array,
    /// Accepts nothing. Substituted for every type of a key at a location
    /// that may not set it.
    NotAllowed,
}

/// Facts needed by coercions that depend on the running process.
#[derive(Debug, Clone, Default)]
pub struct TypeContext {
    pub home: Option<PathBuf>,
    pub cwd: PathBuf,
}

impl ValueType {
    /// Look a type up by its registered name.
    ///
    /// Names follow the type descriptions shown in help output
    /// (`Boolean`, `String`, `Number`, `Path`, `URL`, `Date`, `Array`).
    pub fn by_name(name: &str) -> Option<Self> {
        match name {
            "Boolean" => Some(Self::Boolean),
            "String" => Some(Self::String),
            "Number" => Some(Self::Number),
            "Path" => Some(Self::Path),
            "URL" | "Url" => Some(Self::Url),
            "Date" => Some(Self::Date),
            "Array" => Some(Self::Array),
            "null" => Some(Self::Null),
            _ => None,
        }
    }

    /// Build a choice type from literal values.
    pub fn choice<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Choice(values.into_iter().map(Into::into).collect())
    }

    pub fn is_boolean(&self) -> bool {
        matches!(self, Self::Boolean)
    }

    /// Short type name, used in generated documentation.
    pub fn type_description(&self) -> String {
        match self {
            Self::Null => "null".to_string(),
            Self::Boolean => "Boolean".to_string(),
            Self::String => "String".to_string(),
            Self::Number => "Number".to_string(),
            Self::Path => "Path".to_string(),
            Self::Url => "URL".to_string(),
            Self::Date => "Date".to_string(),
            Self::Array => "Array".to_string(),
            Self::NotAllowed => "NotAllowed".to_string(),
            Self::Choice(values) => quote_all(values).join(", "),
        }
    }

    /// Sentence fragment describing accepted input, used in error messages.
    pub fn description(&self) -> Option<&'static str> {
        match self {
            Self::Boolean => Some("boolean value (true or false)"),
            Self::String => Some("string"),
            Self::Number => Some("numeric value"),
            Self::Path => Some("valid filesystem path"),
            Self::Url => Some("full url with \"http://\""),
            Self::Date => Some("valid Date string"),
            Self::NotAllowed => Some("not allowed to be set"),
            Self::Null | Self::Array | Self::Choice(_) => None,
        }
    }

    /// The enumerated values of a closed-choice type, quoted for display.
    pub fn values(&self) -> Option<Vec<String>> {
        match self {
            Self::Choice(values) => Some(quote_all(values)),
            _ => None,
        }
    }

    /// Placeholder shown in usage strings (`--key <hint>`).
    pub fn hint(&self) -> Option<Vec<String>> {
        match self {
            Self::Number => Some(vec!["number".to_string()]),
            Self::Path => Some(vec!["path".to_string()]),
            Self::Url => Some(vec!["url".to_string()]),
            Self::Date => Some(vec!["date".to_string()]),
            Self::Choice(values) => Some(values.clone()),
            _ => None,
        }
    }

    /// Try to accept `raw` as this type, returning the normalized value.
    pub fn coerce(&self, raw: &Value, ctx: &TypeContext) -> Option<Value> {
        match self {
            Self::Null => raw.is_null().then_some(Value::Null),
            Self::Boolean => coerce_boolean(raw),
            Self::String => match raw {
                Value::String(_) => Some(raw.clone()),
                Value::Number(n) => Some(Value::String(n.to_string())),
                Value::Bool(b) => Some(Value::String(b.to_string())),
                _ => None,
            },
            Self::Number => coerce_number(raw),
            Self::Path => raw
                .as_str()
                .map(|s| Value::String(resolve_path(s, ctx).to_string_lossy().into_owned())),
            Self::Url => {
                let s = raw.as_str()?;
                let parsed = url::Url::parse(s).ok()?;
                parsed.has_host().then(|| Value::String(parsed.to_string()))
            }
            Self::Date => raw.as_str().and_then(parse_date).map(Value::String),
            Self::Choice(values) => match raw {
                Value::String(s) if values.iter().any(|v| v == s) => Some(raw.clone()),
                _ => None,
            },
            Self::Array | Self::NotAllowed => None,
        }
    }
}

fn quote_all(values: &[String]) -> Vec<String> {
    values.iter().map(|v| format!("{v:?}")).collect()
}

fn coerce_boolean(raw: &Value) -> Option<Value> {
    match raw {
        Value::Bool(_) => Some(raw.clone()),
        Value::String(s) => match s.as_str() {
            "true" => Some(Value::Bool(true)),
            "false" => Some(Value::Bool(false)),
            _ => None,
        },
        Value::Number(n) => match n.as_f64() {
            Some(f) if f == 0.0 => Some(Value::Bool(false)),
            Some(f) if f == 1.0 => Some(Value::Bool(true)),
            _ => None,
        },
        _ => None,
    }
}

fn coerce_number(raw: &Value) -> Option<Value> {
    match raw {
        Value::Number(_) => Some(raw.clone()),
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return None;
            }
            if let Ok(i) = trimmed.parse::<i64>() {
                return Some(Value::Number(i.into()));
            }
            let f = trimmed.parse::<f64>().ok()?;
            Number::from_f64(f).map(Value::Number)
        }
        _ => None,
    }
}

fn parse_date(s: &str) -> Option<String> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(
            dt.with_timezone(&Utc)
                .to_rfc3339_opts(SecondsFormat::Millis, true),
        );
    }
    let date = NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()?;
    let dt = date.and_hms_opt(0, 0, 0)?.and_utc();
    Some(dt.to_rfc3339_opts(SecondsFormat::Millis, true))
}

/// Expand a leading `~` and make the path absolute against the cwd.
pub fn resolve_path(raw: &str, ctx: &TypeContext) -> PathBuf {
    let expanded = match (raw.strip_prefix('~'), &ctx.home) {
        (Some(rest), Some(home)) if rest.is_empty() || rest.starts_with(['/', '\\']) => {
            home.join(rest.trim_start_matches(['/', '\\']))
        }
        _ => PathBuf::from(raw),
    };
    let absolute = if expanded.is_absolute() {
        expanded
    } else {
        ctx.cwd.join(expanded)
    };
    normalize_components(&absolute)
}

fn normalize_components(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    fn ctx() -> TypeContext {
        TypeContext {
            home: Some(PathBuf::from("/home/me")),
            cwd: PathBuf::from("/work/project"),
        }
    }

    #[rstest]
    #[case(json!(true), Some(json!(true)))]
    #[case(json!("false"), Some(json!(false)))]
    #[case(json!(1), Some(json!(true)))]
    #[case(json!("yes"), None)]
    #[case(json!(null), None)]
    fn boolean_coercion(#[case] raw: Value, #[case] expected: Option<Value>) {
        assert_eq!(ValueType::Boolean.coerce(&raw, &ctx()), expected);
    }

    #[rstest]
    #[case(json!("10"), Some(json!(10)))]
    #[case(json!("1.5"), Some(json!(1.5)))]
    #[case(json!(3), Some(json!(3)))]
    #[case(json!(""), None)]
    #[case(json!("ten"), None)]
    fn number_coercion(#[case] raw: Value, #[case] expected: Option<Value>) {
        assert_eq!(ValueType::Number.coerce(&raw, &ctx()), expected);
    }

    #[cfg(unix)]
    #[test]
    fn path_expands_home_and_resolves_relative() {
        let home = ValueType::Path.coerce(&json!("~/.npmrc"), &ctx());
        assert_eq!(home, Some(json!("/home/me/.npmrc")));

        let rel = ValueType::Path.coerce(&json!("../cache"), &ctx());
        assert_eq!(rel, Some(json!("/work/cache")));
    }

    #[test]
    fn url_requires_host_and_normalizes() {
        let ok = ValueType::Url.coerce(&json!("https://registry.example.com"), &ctx());
        assert_eq!(ok, Some(json!("https://registry.example.com/")));
        assert_eq!(ValueType::Url.coerce(&json!("not a url"), &ctx()), None);
        assert_eq!(ValueType::Url.coerce(&json!("mailto:me@example.com"), &ctx()), None);
    }

    #[test]
    fn date_accepts_plain_dates() {
        let date = ValueType::Date.coerce(&json!("2024-01-02"), &ctx());
        assert_eq!(date, Some(json!("2024-01-02T00:00:00.000Z")));
    }

    #[test]
    fn choice_matches_exact_literals_only() {
        let loglevel = ValueType::choice(["silent", "warn"]);
        assert_eq!(loglevel.coerce(&json!("warn"), &ctx()), Some(json!("warn")));
        assert_eq!(loglevel.coerce(&json!("WARN"), &ctx()), None);
        assert_eq!(loglevel.values().unwrap(), vec!["\"silent\"", "\"warn\""]);
    }

    #[test]
    fn not_allowed_accepts_nothing() {
        assert_eq!(ValueType::NotAllowed.coerce(&json!("x"), &ctx()), None);
        assert_eq!(ValueType::NotAllowed.coerce(&json!(null), &ctx()), None);
    }
}
