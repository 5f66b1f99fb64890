//! The env command

use pmrc_core::ConfigResolver;

use crate::error::Result;

/// Print `NAME=value` for every exported variable. Values spanning lines
/// are printed as JSON strings.
pub fn run_env(resolver: &ConfigResolver) -> Result<()> {
    for (name, value) in resolver.env_exports() {
        if value.contains('\n') {
            println!("{name}={}", serde_json::to_string(&value)?);
        } else {
            println!("{name}={value}");
        }
    }
    Ok(())
}
