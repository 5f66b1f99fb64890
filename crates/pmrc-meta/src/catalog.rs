//! Key definition catalog
//!
//! The closed set of recognized keys, indexed by canonical name, with the
//! shorthand table used by the command line parser.

use std::collections::HashMap;

use indexmap::IndexMap;
use serde_json::{Map, Value};

use crate::builtin;
use crate::definition::{Definition, DefinitionSpec};
use crate::facts::RuntimeFacts;
use crate::location::Location;
use crate::{Error, Result};

#[derive(Debug, Clone, Default)]
pub struct Catalog {
    definitions: IndexMap<String, Definition>,
    /// Single-token alternate spellings mapped to canonical keys.
    aliases: HashMap<String, String>,
    shorthands: IndexMap<String, Vec<String>>,
}

impl Catalog {
    /// Build a catalog, failing on duplicate keys, duplicate shorthands or
    /// `depends` entries naming undefined keys.
    pub fn new(definitions: impl IntoIterator<Item = Definition>) -> Result<Self> {
        let mut catalog = Self::default();
        for def in definitions {
            catalog.insert(def)?;
        }
        for def in catalog.definitions.values() {
            if let Some(missing) = def.depends_on().iter().find(|d| !catalog.contains(d)) {
                return Err(Error::InvalidDefinition {
                    key: def.key().to_string(),
                    message: format!("depends on undefined key `{missing}`"),
                });
            }
        }
        tracing::debug!(keys = catalog.definitions.len(), "built definition catalog");
        Ok(catalog)
    }

    /// Build a catalog from unchecked specs.
    pub fn from_specs<K: Into<String>>(
        specs: impl IntoIterator<Item = (K, DefinitionSpec)>,
    ) -> Result<Self> {
        let definitions = specs
            .into_iter()
            .map(|(key, spec)| Definition::new(key, spec))
            .collect::<Result<Vec<_>>>()?;
        Self::new(definitions)
    }

    /// The standard package-manager catalog, with defaults computed from
    /// the given runtime facts.
    pub fn standard(facts: &RuntimeFacts) -> Result<Self> {
        Self::from_specs(builtin::definitions(facts))
    }

    fn insert(&mut self, def: Definition) -> Result<()> {
        let key = def.key().to_string();
        if self.definitions.contains_key(&key) {
            return Err(Error::DuplicateKey { key });
        }
        for alt in def.short().iter().chain(def.alias()) {
            self.aliases.insert(alt.clone(), key.clone());
        }
        for (token, expansion) in def.shorthands() {
            if self.shorthands.contains_key(token) {
                return Err(Error::InvalidDefinition {
                    key,
                    message: format!("shorthand `{token}` is already taken"),
                });
            }
            self.shorthands.insert(token.clone(), expansion.clone());
        }
        self.definitions.insert(key, def);
        Ok(())
    }

    /// Look a key up by canonical name or single-token alias.
    pub fn get(&self, key: &str) -> Option<&Definition> {
        self.definitions.get(self.canonical(key))
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Resolve an alias to its canonical key. Unknown keys come back as-is.
    pub fn canonical<'a>(&'a self, key: &'a str) -> &'a str {
        match self.aliases.get(key) {
            Some(canonical) if !self.definitions.contains_key(key) => canonical.as_str(),
            _ => key,
        }
    }

    /// Token expansion for a shorthand, e.g. `g` → `["--global"]`.
    pub fn shorthand(&self, token: &str) -> Option<&[String]> {
        self.shorthands.get(token).map(Vec::as_slice)
    }

    pub fn shorthands(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.shorthands
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.definitions.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Definition> {
        self.definitions.values()
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Keys only the internal facts layer may hold.
    pub fn internal_keys(&self) -> impl Iterator<Item = &str> {
        self.iter().filter(|d| d.is_internal()).map(Definition::key)
    }

    /// Default values for every non-internal key, used to seed the default
    /// layer.
    pub fn defaults(&self) -> Map<String, Value> {
        self.iter()
            .filter(|d| !d.is_internal())
            .map(|d| (d.key().to_string(), d.default().clone()))
            .collect()
    }

    /// Definitions that may be set at `location`, skipping internal keys.
    pub fn allowed_at(&self, location: Location) -> impl Iterator<Item = &Definition> {
        self.iter()
            .filter(move |d| !d.is_internal() && d.is_allowed(location))
    }
}
