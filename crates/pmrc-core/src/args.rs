//! Command line token parsing
//!
//! Turns `--key value`, `--key=value`, `--no-key` and shorthand tokens into
//! a raw key/value object. Values stay uncoerced strings or booleans; the
//! store validates them like any other source.

use std::collections::VecDeque;

use pmrc_meta::Catalog;
use serde_json::{Map, Value};

/// Result of parsing a token sequence.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedArgs {
    pub data: Map<String, Value>,
    /// Tokens that are not options, in order.
    pub positional: Vec<String>,
}

pub fn parse<S: AsRef<str>>(tokens: &[S], catalog: &Catalog) -> ParsedArgs {
    let mut queue: VecDeque<String> = tokens.iter().map(|t| t.as_ref().to_string()).collect();
    let mut parsed = ParsedArgs::default();

    while let Some(token) = queue.pop_front() {
        if token == "--" {
            parsed.positional.extend(queue.drain(..));
            break;
        }
        if !token.starts_with('-') || token == "-" {
            parsed.positional.push(token);
            continue;
        }

        let long = token.starts_with("--");
        let body = token.trim_start_matches('-');
        let (name, inline) = match body.split_once('=') {
            Some((n, v)) => (n, Some(v.to_string())),
            None => (body, None),
        };

        if let Some(expansion) = expand(name, long, catalog) {
            let mut expanded = expansion;
            if let Some(v) = inline {
                if let Some(first) = expanded.first_mut() {
                    first.push('=');
                    first.push_str(&v);
                }
            }
            for t in expanded.into_iter().rev() {
                queue.push_front(t);
            }
            continue;
        }

        let (name, negated) = match (name.strip_prefix("no-"), &inline) {
            (Some(stripped), None) => (stripped, true),
            _ => (name, false),
        };
        let key = catalog.canonical(name).to_string();
        let def = catalog.get(&key);
        let is_bool = def.is_some_and(|d| d.is_boolean());

        let value = if negated {
            Value::Bool(false)
        } else if let Some(v) = inline {
            Value::String(v)
        } else if is_bool {
            match queue.front().map(String::as_str) {
                Some("true") | Some("false") => {
                    Value::String(queue.pop_front().unwrap_or_default())
                }
                _ => Value::Bool(true),
            }
        } else {
            match queue.front() {
                Some(next) if !next.starts_with('-') => {
                    Value::String(queue.pop_front().unwrap_or_default())
                }
                _ if def.is_some() => Value::String(String::new()),
                _ => Value::Bool(true),
            }
        };

        let repeats = def.is_some_and(|d| d.is_array());
        match parsed.data.get_mut(&key) {
            Some(Value::Array(items)) if repeats => items.push(value),
            Some(existing) if repeats => {
                let first = existing.take();
                *existing = Value::Array(vec![first, value]);
            }
            _ => {
                parsed.data.insert(key, value);
            }
        }
    }
    parsed
}

/// Expand a shorthand. Known keys are never expanded; `-abc` falls back to
/// one shorthand per character when every character is one.
fn expand(name: &str, long: bool, catalog: &Catalog) -> Option<Vec<String>> {
    if catalog.contains(name) || (name.starts_with("no-") && catalog.contains(&name[3..])) {
        return None;
    }
    if let Some(tokens) = catalog.shorthand(name) {
        return Some(tokens.to_vec());
    }
    if long || name.chars().count() < 2 {
        return None;
    }
    let mut out = Vec::new();
    for c in name.chars() {
        out.extend_from_slice(catalog.shorthand(c.encode_utf8(&mut [0; 4]))?);
    }
    Some(out)
}
