//! The list command

use colored::Colorize;
use pmrc_core::ConfigResolver;
use pmrc_meta::Location;
use serde_json::Value;

use crate::error::Result;

use super::is_protected;

fn shown(key: &str, value: &Value) -> String {
    if is_protected(key) {
        "(protected)".to_string()
    } else {
        value.to_string()
    }
}

/// Print each location's values, marking those shadowed by a higher
/// location. `long` includes the defaults; `json` prints the flattened
/// view instead.
pub fn run_list(resolver: &ConfigResolver, json: bool, long: bool) -> Result<()> {
    if json {
        let mut value = resolver.resolved().to_value();
        if let Value::Object(map) = &mut value {
            for (key, v) in map.iter_mut() {
                if is_protected(key) && !v.is_null() {
                    *v = Value::String("(protected)".to_string());
                }
            }
        }
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    let from = if long { Location::Default } else { Location::Builtin };
    for store in resolver.values(Some(from)) {
        let mut entries: Vec<(&String, &Value)> = store.data().iter().chain(store.flat_data()).collect();
        if entries.is_empty() {
            continue;
        }

        let header = format!(
            "; \"{}\" config from {}",
            store.location(),
            store.file().map_or_else(
                || store.source().unwrap_or_default().to_string(),
                |f| f.to_string()
            )
        );
        println!("{}", header.cyan());
        println!();

        entries.sort_by(|a, b| a.0.cmp(b.0));
        for (key, value) in entries {
            let line = format!("{key} = {}", shown(key, value));
            match resolver.find(None, key) {
                Some(winner) if winner != store.location() => {
                    println!("{}", format!("; {line} ; overridden by {winner}").dimmed());
                }
                _ => println!("{line}"),
            }
        }
        println!();
    }

    if let Some(cwd) = resolver.get_data(Some(Location::Internal), "cwd") {
        println!("; cwd = {}", super::display_value(&cwd));
    }
    if !long {
        println!();
        println!(
            "; Run {} to show all defaults.",
            "`pmrc list --long`".cyan()
        );
    }
    Ok(())
}
