//! Full config loading
//!
//! Builds a [`ConfigResolver`] from runtime facts and command line tokens,
//! reading every rc file in the order later files depend on: the command
//! line and environment decide where the project, user and global files
//! live.

use std::sync::Arc;

use pmrc_fs::NormalizedPath;
use pmrc_meta::{Catalog, Location, RuntimeFacts};
use serde_json::Value;

use crate::env::env_source;
use crate::store::Origin;
use crate::{ConfigResolver, Result};

/// A loaded resolver and the command line tokens that were not options.
#[derive(Debug)]
pub struct Loaded {
    pub resolver: ConfigResolver,
    pub positional: Vec<String>,
}

#[derive(Debug)]
pub struct ConfigLoader {
    facts: RuntimeFacts,
    argv: Vec<String>,
    catalog: Option<Arc<Catalog>>,
}

impl ConfigLoader {
    pub fn new(facts: RuntimeFacts) -> Self {
        Self {
            facts,
            argv: Vec::new(),
            catalog: None,
        }
    }

    /// Command line tokens, without the program name.
    pub fn args<I, S>(mut self, argv: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.argv = argv.into_iter().map(Into::into).collect();
        self
    }

    /// Use `catalog` instead of the standard definitions.
    pub fn catalog(mut self, catalog: Arc<Catalog>) -> Self {
        self.catalog = Some(catalog);
        self
    }

    pub fn load(self) -> Result<Loaded> {
        let catalog = match self.catalog {
            Some(catalog) => catalog,
            None => Arc::new(Catalog::standard(&self.facts)?),
        };
        let mut resolver = ConfigResolver::new(catalog, &self.facts)?;

        match &self.facts.npm_bin {
            Some(bin) => {
                let dir = NormalizedPath::new(bin).parent().unwrap_or_else(|| NormalizedPath::new("."));
                load_file(&mut resolver, Location::Builtin, dir.join("npmrc"))?;
            }
            None => resolver.ignore(Location::Builtin, "install location unknown")?,
        }

        let positional = resolver.load(Location::Cli, Origin::Args(self.argv))?;
        resolver.load(
            Location::Env,
            Origin::Object {
                data: env_source(&self.facts.env),
                file: None,
            },
        )?;

        let userconfig = path_value(&resolver, "userconfig");
        let global = resolver
            .effective("global")
            .and_then(|v| v.as_bool())
            .unwrap_or(false);
        if global {
            resolver.ignore(Location::Project, "global mode enabled")?;
        } else {
            match path_value(&resolver, "local-prefix") {
                Some(prefix) => {
                    let file = prefix.join(".npmrc");
                    if userconfig.as_ref() == Some(&file) {
                        resolver.ignore(Location::Project, "same as \"user\" config")?;
                    } else {
                        load_file(&mut resolver, Location::Project, file)?;
                    }
                }
                None => resolver.ignore(Location::Project, "no local prefix")?,
            }
        }

        // The project file may move the user file, which may in turn move
        // the global file.
        match path_value(&resolver, "userconfig") {
            Some(file) => load_file(&mut resolver, Location::User, file)?,
            None => resolver.ignore(Location::User, "no userconfig")?,
        }
        match path_value(&resolver, "globalconfig") {
            Some(file) => load_file(&mut resolver, Location::Global, file)?,
            None => resolver.ignore(Location::Global, "no globalconfig")?,
        }

        load_cafile(&mut resolver)?;
        tracing::debug!(positional = positional.len(), "config loaded");
        Ok(Loaded {
            resolver,
            positional,
        })
    }
}

fn path_value(resolver: &ConfigResolver, key: &str) -> Option<NormalizedPath> {
    resolver
        .effective(key)
        .and_then(|v| v.as_str().map(NormalizedPath::new))
}

fn load_file(resolver: &mut ConfigResolver, location: Location, file: NormalizedPath) -> Result<()> {
    let origin = match pmrc_fs::io::read_text(&file) {
        Ok(text) => Origin::Text {
            text,
            file: Some(file),
        },
        Err(error) => Origin::Failed { file, error },
    };
    resolver.load(location, origin)?;
    Ok(())
}

/// Expose the effective cafile's text as the `cafile-contents` fact.
fn load_cafile(resolver: &mut ConfigResolver) -> Result<()> {
    let Some(file) = path_value(resolver, "cafile") else {
        return Ok(());
    };
    match pmrc_fs::io::read_text(&file) {
        Ok(text) => resolver.set_data(Location::Internal, "cafile-contents", Value::String(text)),
        Err(error) if error.is_not_found() => Ok(()),
        Err(error) => {
            tracing::warn!(file = %file, %error, "could not read cafile");
            Ok(())
        }
    }
}
