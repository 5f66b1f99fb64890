//! The validate and fix commands

use colored::Colorize;
use pmrc_core::{AuthAction, AuthProblem, ConfigResolver, Validation};
use pmrc_meta::Location;

use crate::error::Result;

use super::runtime;

/// Locations whose files are checked for auth problems.
const CHECKED: [Location; 4] = [
    Location::Builtin,
    Location::Global,
    Location::User,
    Location::Project,
];

fn problems(resolver: &mut ConfigResolver) -> Result<Vec<AuthProblem>> {
    let mut all = Vec::new();
    for location in CHECKED {
        if let Validation::Problems(found) = resolver.validate(location)? {
            all.extend(found);
        }
    }
    Ok(all)
}

fn describe(problem: &AuthProblem) -> String {
    match &problem.action {
        AuthAction::Delete { key } => format!("`{key}` is not supported and should be removed"),
        AuthAction::Rename { from, to } => format!("`{from}` must be renamed to `{to}`"),
    }
}

pub fn run_validate(resolver: &mut ConfigResolver, json: bool) -> Result<()> {
    let found = problems(resolver)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&found)?);
        return Ok(());
    }
    if found.is_empty() {
        println!("{} no auth problems found", "ok:".green().bold());
        return Ok(());
    }
    for problem in &found {
        println!(
            "{} {} config: {}",
            "problem:".yellow().bold(),
            problem.location,
            describe(problem)
        );
    }
    println!();
    println!("Run {} to repair them.", "pmrc fix".cyan());
    Ok(())
}

/// Repair every problem and save the affected files.
pub fn run_fix(resolver: &mut ConfigResolver) -> Result<()> {
    let found = problems(resolver)?;
    if found.is_empty() {
        println!("{} nothing to fix", "ok:".green().bold());
        return Ok(());
    }

    let rt = runtime()?;
    for location in CHECKED {
        if !found.iter().any(|p| p.location == location) {
            continue;
        }
        resolver.repair(location, &found)?;
        rt.block_on(resolver.save(location))?;
        for problem in found.iter().filter(|p| p.location == location) {
            println!("{} {location} config: {}", "fixed:".green().bold(), describe(problem));
        }
    }
    Ok(())
}
