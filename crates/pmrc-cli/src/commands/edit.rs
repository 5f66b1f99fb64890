//! The edit command

use colored::Colorize;
use pmrc_core::ConfigResolver;

use crate::error::Result;

use super::{runtime, target_location};

pub fn run_edit(resolver: &mut ConfigResolver, location: Option<&str>) -> Result<()> {
    let location = target_location(resolver, location)?;
    runtime()?.block_on(resolver.edit(location))?;
    println!("{} {location} config", "Edited".green().bold());
    Ok(())
}
