//! The composed view over every location
//!
//! [`ConfigResolver`] owns one [`LayerStore`] per [`Location`] and the
//! [`DerivedGraph`]. All mutation goes through it so that derived values are
//! invalidated before the store changes.

use std::sync::Arc;

use indexmap::IndexMap;
use pmrc_meta::definition::value_to_env_string;
use pmrc_meta::{Catalog, Location, RuntimeFacts};
use serde_json::Value;

use crate::derived::{DerivedEntry, DerivedGraph, standard};
use crate::env::export_key;
use crate::store::{AuthAction, AuthProblem, LayerStore, Origin, Validation};
use crate::view::ResolvedView;
use crate::Result;

const DEFAULT_REGISTRY: &str = "https://registry.npmjs.org/";

#[derive(Debug)]
pub struct ConfigResolver {
    catalog: Arc<Catalog>,
    /// Indexed by [`Location::index`].
    stores: Vec<LayerStore>,
    derived: DerivedGraph,
}

impl ConfigResolver {
    /// A resolver with the standard derived entries. The internal and
    /// default locations are loaded; every other location starts empty.
    pub fn new(catalog: Arc<Catalog>, facts: &RuntimeFacts) -> Result<Self> {
        Self::with_entries(catalog, facts, standard::entries())
    }

    pub fn with_entries(
        catalog: Arc<Catalog>,
        facts: &RuntimeFacts,
        entries: Vec<DerivedEntry>,
    ) -> Result<Self> {
        let derived = DerivedGraph::new(entries, &catalog)?;
        let env = Arc::new(facts.env.clone());
        let ctx = facts.type_context();
        let stores = Location::ALL
            .iter()
            .map(|&loc| LayerStore::new(loc, Arc::clone(&catalog), ctx.clone(), Arc::clone(&env)))
            .collect();

        let mut resolver = Self {
            catalog,
            stores,
            derived,
        };
        resolver.load(
            Location::Internal,
            Origin::Object {
                data: facts.internals(),
                file: None,
            },
        )?;
        let defaults = resolver.catalog.defaults();
        resolver.load(
            Location::Default,
            Origin::Object {
                data: defaults,
                file: None,
            },
        )?;
        Ok(resolver)
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn store(&self, location: Location) -> &LayerStore {
        &self.stores[location.index()]
    }

    fn store_mut(&mut self, location: Location) -> &mut LayerStore {
        &mut self.stores[location.index()]
    }

    /// Stores from lowest to highest precedence, starting at `from`.
    pub fn values(&self, from: Option<Location>) -> impl Iterator<Item = &LayerStore> {
        let start = from.map_or(0, Location::index);
        self.stores[start..].iter()
    }

    /// Stores from highest to lowest precedence, starting at `from`.
    pub fn rev_values(&self, from: Option<Location>) -> impl Iterator<Item = &LayerStore> {
        let end = from.map_or(self.stores.len(), |loc| loc.index() + 1);
        self.stores[..end].iter().rev()
    }

    /// The highest location at or below `from` that has `key` set.
    pub fn find(&self, from: Option<Location>, key: &str) -> Option<Location> {
        self.rev_values(from)
            .find(|store| store.has(key))
            .map(LayerStore::location)
    }

    fn base(&self, key: &str) -> Option<Value> {
        self.rev_values(None)
            .find_map(|store| store.get(key))
            .cloned()
    }

    fn derive(&self, key: &str) -> Option<Value> {
        let base = |dep: &str| self.base(dep).unwrap_or(Value::Null);
        self.derived.resolve(key, &base)
    }

    /// Read `key`. With a location, only that store is read. Without one,
    /// the highest store that has the key wins, and derived values are
    /// consulted when no store has it.
    pub fn get_data(&self, location: Option<Location>, key: &str) -> Option<Value> {
        match location {
            Some(loc) => self.store(loc).get(key).cloned(),
            None => self.base(key).or_else(|| self.derive(key)),
        }
    }

    pub fn has_data(&self, location: Option<Location>, key: &str) -> bool {
        match location {
            Some(loc) => self.store(loc).has(key),
            None => self.find(None, key).is_some(),
        }
    }

    /// The value consumers should see: derived when an entry produces the
    /// key, precedence-resolved otherwise.
    pub fn effective(&self, key: &str) -> Option<Value> {
        let key = self.catalog.canonical(key);
        if self.derived.produces(key) {
            self.derive(key)
        } else {
            self.base(key)
        }
    }

    fn effective_str(&self, key: &str) -> Option<String> {
        self.effective(key)
            .and_then(|v| v.as_str().map(str::to_string))
    }

    pub fn set_data(&mut self, location: Location, key: &str, value: Value) -> Result<()> {
        self.derived.invalidate(self.catalog.canonical(key));
        self.store_mut(location).set(key, value)
    }

    pub fn delete_data(&mut self, location: Location, key: &str) -> Result<bool> {
        self.derived.invalidate(self.catalog.canonical(key));
        self.store_mut(location).delete(key)
    }

    /// Load a location. Returns positional tokens for [`Origin::Args`].
    pub fn load(&mut self, location: Location, origin: Origin) -> Result<Vec<String>> {
        self.derived.clear();
        self.store_mut(location).load(origin)
    }

    pub fn ignore(&mut self, location: Location, reason: &str) -> Result<()> {
        self.store_mut(location).ignore(reason)
    }

    fn registry(&self) -> String {
        self.effective_str("registry")
            .unwrap_or_else(|| DEFAULT_REGISTRY.to_string())
    }

    pub fn validate(&mut self, location: Location) -> Result<Validation> {
        let registry = self.registry();
        self.store_mut(location).validate(&registry)
    }

    /// Apply the problems found at `location` by [`validate`](Self::validate).
    pub fn repair(&mut self, location: Location, problems: &[AuthProblem]) -> Result<()> {
        for problem in problems.iter().filter(|p| p.location == location) {
            match &problem.action {
                AuthAction::Delete { key } => {
                    self.delete_data(location, key)?;
                }
                AuthAction::Rename { from, to } => {
                    let value = self.store(location).get(from).cloned();
                    self.delete_data(location, from)?;
                    if let Some(value) = value {
                        self.set_data(location, to, value)?;
                    }
                }
            }
            tracing::info!(%location, action = ?problem.action, "repaired auth config");
        }
        Ok(())
    }

    pub async fn save(&mut self, location: Location) -> Result<()> {
        let registry = self.registry();
        self.store_mut(location).save(&registry).await?;
        // Saving the user file may move a scoped email to `email`.
        self.derived.invalidate("email");
        Ok(())
    }

    pub async fn edit(&mut self, location: Location) -> Result<()> {
        let registry = self.registry();
        let editor = self
            .effective_str("editor")
            .unwrap_or_else(|| "vi".to_string());
        self.store_mut(location).edit(&editor, &registry).await?;
        self.derived.invalidate("email");
        Ok(())
    }

    /// The flattened view of internal facts, resolved values and derived
    /// values.
    pub fn resolved(&self) -> ResolvedView<'_> {
        ResolvedView::new(self)
    }

    /// Derived keys, in declaration order.
    pub fn derived_keys(&self) -> impl Iterator<Item = &str> {
        self.derived.keys()
    }

    /// Variables to place into the environment of child processes.
    pub fn env_exports(&self) -> IndexMap<String, String> {
        let defaults = self.store(Location::Default);
        let mut out = IndexMap::new();

        for def in self.catalog.iter().filter(|d| !d.is_internal()) {
            let Some(value) = self.base(def.key()) else {
                continue;
            };
            if def.env_export() && defaults.get(def.key()) != Some(&value) {
                out.insert(export_key(def.key()), value_to_env_string(&value));
            }
            for (name, transform) in def.set_env() {
                if value.is_null() {
                    continue;
                }
                if let Some(v) = transform.apply(&value) {
                    out.insert(name.clone(), v);
                }
            }
        }

        for (key, name) in [
            ("global-prefix", "npm_config_global_prefix"),
            ("local-prefix", "npm_config_local_prefix"),
        ] {
            if let Some(value) = self.effective(key).filter(|v| !v.is_null()) {
                out.insert(name.to_string(), value_to_env_string(&value));
            }
        }
        out
    }

    /// Process settings (such as the title) the caller should apply.
    pub fn process_updates(&self) -> Vec<(String, String)> {
        let mut out = Vec::new();
        for def in self.catalog.iter() {
            let Some(value) = self.base(def.key()).filter(|v| !v.is_null()) else {
                continue;
            };
            for (name, transform) in def.set_process() {
                if let Some(v) = transform.apply(&value) {
                    out.push((name.clone(), v));
                }
            }
        }
        out
    }
}
