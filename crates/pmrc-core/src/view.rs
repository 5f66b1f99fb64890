//! Flattened, read-only view of a resolver

use std::cell::RefCell;
use std::collections::HashMap;

use indexmap::IndexMap;
use pmrc_meta::{Location, flat_key};
use serde_json::{Map, Value};

use crate::ConfigResolver;

#[derive(Debug, Clone)]
enum Slot {
    /// Runtime fact from the internal location.
    Internal(String),
    /// Precedence-resolved value of a defined key.
    Base(String),
    Derived(String),
}

/// Every internal fact, resolved value and derived value under its flat
/// name. Values are computed on first read and cached for the life of the
/// view; the view borrows the resolver, so nothing can change underneath it.
#[derive(Debug)]
pub struct ResolvedView<'a> {
    resolver: &'a ConfigResolver,
    names: IndexMap<String, Slot>,
    cache: RefCell<HashMap<String, Option<Value>>>,
}

impl<'a> ResolvedView<'a> {
    pub(crate) fn new(resolver: &'a ConfigResolver) -> Self {
        let catalog = resolver.catalog();
        let mut names = IndexMap::new();

        for key in catalog.internal_keys() {
            names.insert(flat_key(key), Slot::Internal(key.to_string()));
        }
        for def in catalog.iter().filter(|d| !d.is_internal()) {
            for name in def.flatten_to() {
                names.insert(name.to_string(), Slot::Base(def.key().to_string()));
            }
        }
        for key in resolver.derived_keys() {
            names.insert(flat_key(key), Slot::Derived(key.to_string()));
        }

        Self {
            resolver,
            names,
            cache: RefCell::new(HashMap::new()),
        }
    }

    /// Flat names, internal facts first.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.keys().map(String::as_str)
    }

    fn slot(&self, name: &str) -> Option<Slot> {
        if let Some(slot) = self.names.get(name) {
            return Some(slot.clone());
        }
        let catalog = self.resolver.catalog();
        let key = catalog.canonical(name);
        if self.resolver.derived_keys().any(|k| k == key) {
            return Some(Slot::Derived(key.to_string()));
        }
        let def = catalog.get(key)?;
        if def.is_internal() {
            Some(Slot::Internal(key.to_string()))
        } else {
            Some(Slot::Base(key.to_string()))
        }
    }

    /// Value by flat name or canonical key.
    pub fn get(&self, name: &str) -> Option<Value> {
        if let Some(cached) = self.cache.borrow().get(name) {
            return cached.clone();
        }
        let value = match self.slot(name)? {
            Slot::Internal(key) => self.resolver.get_data(Some(Location::Internal), &key),
            Slot::Base(key) => self.resolver.get_data(None, &key),
            Slot::Derived(key) => self.resolver.effective(&key),
        };
        self.cache
            .borrow_mut()
            .insert(name.to_string(), value.clone());
        value
    }

    /// The whole view as one object. Dotted names nest.
    pub fn to_value(&self) -> Value {
        let mut root = Map::new();
        for name in self.names.keys() {
            let value = self.get(name).unwrap_or(Value::Null);
            insert_nested(&mut root, name, value);
        }
        Value::Object(root)
    }
}

fn insert_nested(root: &mut Map<String, Value>, name: &str, value: Value) {
    match name.split_once('.') {
        Some((parent, rest)) => {
            let child = root
                .entry(parent.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if !child.is_object() {
                *child = Value::Object(Map::new());
            }
            if let Value::Object(map) = child {
                insert_nested(map, rest, value);
            }
        }
        None => {
            root.insert(name.to_string(), value);
        }
    }
}
