//! The rc file text format
//!
//! Flat `key=value` lines, `key[]=value` for repeated values, `;` or `#`
//! comments and optional `[section]` headers. Values `true`, `false` and
//! `null` are read as their JSON counterparts; everything else stays a
//! string until a definition coerces it.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value};

static LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\[([^\]]*)\]\s*$|^([^=]+)(=(.*))?$").expect("Invalid ini line regex")
});

/// Parse rc text into an object. Malformed lines are skipped.
pub fn parse(text: &str) -> Map<String, Value> {
    let mut out = Map::new();
    let mut section: Option<String> = None;

    for line in text.split(['\r', '\n']) {
        let line = line.trim_start();
        if line.is_empty() || line.starts_with(';') || line.starts_with('#') {
            continue;
        }
        let Some(caps) = LINE.captures(line) else {
            continue;
        };

        if let Some(name) = caps.get(1) {
            let name = unescape(name.as_str());
            out.entry(name.clone())
                .or_insert_with(|| Value::Object(Map::new()));
            section = Some(name);
            continue;
        }

        let Some(raw_key) = caps.get(2) else {
            continue;
        };
        let mut key = unescape(raw_key.as_str());
        let is_array = key.len() > 2 && key.ends_with("[]");
        if is_array {
            key.truncate(key.len() - 2);
        }
        let value = match caps.get(4) {
            Some(raw) => literal(unescape(raw.as_str())),
            None => Value::Bool(true),
        };

        let target = match &section {
            Some(name) => match out.get_mut(name) {
                Some(Value::Object(map)) => map,
                _ => continue,
            },
            None => &mut out,
        };

        if is_array {
            match target.get_mut(&key) {
                Some(Value::Array(items)) => items.push(value),
                Some(existing) => {
                    let first = existing.take();
                    *existing = Value::Array(vec![first, value]);
                }
                None => {
                    target.insert(key, Value::Array(vec![value]));
                }
            }
        } else {
            target.insert(key, value);
        }
    }
    out
}

/// Serialize an object back to rc text, one line per value, sections last.
pub fn stringify(data: &Map<String, Value>) -> String {
    let mut out = String::new();
    let mut sections = Vec::new();

    for (key, value) in data {
        match value {
            Value::Array(items) => {
                for item in items {
                    out.push_str(&format!("{}[]={}\n", escape(key), escape_value(item)));
                }
            }
            Value::Object(map) => sections.push((key, map)),
            other => out.push_str(&format!("{}={}\n", escape(key), escape_value(other))),
        }
    }

    for (name, map) in sections {
        let body = stringify(map);
        if !out.is_empty() {
            out.push('\n');
        }
        out.push_str(&format!("[{}]\n{}", escape(name), body));
    }
    out
}

fn literal(raw: String) -> Value {
    match raw.as_str() {
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        "null" => Value::Null,
        _ => Value::String(raw),
    }
}

fn is_quoted(s: &str) -> bool {
    s.len() > 1
        && ((s.starts_with('"') && s.ends_with('"')) || (s.starts_with('\'') && s.ends_with('\'')))
}

fn escape_value(value: &Value) -> String {
    match value {
        Value::String(s) => escape(s),
        other => other.to_string(),
    }
}

/// Quote strings that would not survive a round trip, escape backslashes
/// and comment characters in the rest.
fn escape(s: &str) -> String {
    let needs_quotes = s.contains(['=', '\r', '\n'])
        || s.starts_with('[')
        || is_quoted(s)
        || s != s.trim();
    if needs_quotes {
        return Value::String(s.to_string()).to_string();
    }
    s.replace('\\', "\\\\")
        .replace(';', "\\;")
        .replace('#', "\\#")
}

fn unescape(raw: &str) -> String {
    let s = raw.trim();
    if is_quoted(s) {
        let inner = if s.starts_with('\'') {
            s[1..s.len() - 1].to_string()
        } else {
            serde_json::from_str::<String>(s).unwrap_or_else(|_| s[1..s.len() - 1].to_string())
        };
        return inner;
    }

    let mut out = String::with_capacity(s.len());
    let mut escaping = false;
    for c in s.chars() {
        if escaping {
            if matches!(c, '\\' | ';' | '#') {
                out.push(c);
            } else {
                out.push('\\');
                out.push(c);
            }
            escaping = false;
        } else if matches!(c, ';' | '#') {
            break;
        } else if c == '\\' {
            escaping = true;
        } else {
            out.push(c);
        }
    }
    if escaping {
        out.push('\\');
    }
    out.trim().to_string()
}
