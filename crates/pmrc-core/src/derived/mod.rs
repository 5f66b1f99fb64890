//! Derived values
//!
//! A derived entry computes one key, or a group of keys that must be
//! computed together, from a declared list of dependencies. Results are
//! memoized per entry. Mutating any key invalidates every entry that
//! depends on it, directly or through other derived keys.
//!
//! Dependency names are read as follows: a name with a static definition
//! reads that key's precedence-resolved value, a name only produced by
//! another entry reads the derived value, and a key produced by the entry
//! itself always reads its own resolved value.

pub mod standard;

use std::cell::RefCell;
use std::collections::{HashMap, HashSet, VecDeque};

use indexmap::IndexMap;
use pmrc_meta::Catalog;
use serde_json::Value;

use crate::{Error, Result};

/// Dependency values handed to a derive function.
#[derive(Debug, Default)]
pub struct Inputs {
    values: IndexMap<String, Value>,
}

static NULL: Value = Value::Null;

impl Inputs {
    pub fn new(values: IndexMap<String, Value>) -> Self {
        Self { values }
    }

    /// The dependency's value; undeclared or unset dependencies read as null.
    pub fn get(&self, key: &str) -> &Value {
        self.values.get(key).unwrap_or(&NULL)
    }

    pub fn str(&self, key: &str) -> Option<&str> {
        self.get(key).as_str()
    }

    pub fn bool(&self, key: &str) -> Option<bool> {
        self.get(key).as_bool()
    }

    pub fn number(&self, key: &str) -> Option<f64> {
        self.get(key).as_f64()
    }

    /// Loose truthiness: null, false, 0 and "" are false.
    pub fn truthy(&self, key: &str) -> bool {
        match self.get(key) {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
            Value::String(s) => !s.is_empty(),
            Value::Array(_) | Value::Object(_) => true,
        }
    }

    /// String items of an array dependency. A scalar string counts as one item.
    pub fn strings(&self, key: &str) -> Vec<String> {
        match self.get(key) {
            Value::Array(items) => items
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect(),
            Value::String(s) => vec![s.clone()],
            _ => Vec::new(),
        }
    }
}

pub type DeriveOne = fn(&Inputs) -> Value;
pub type DeriveMany = fn(&Inputs) -> IndexMap<String, Value>;

#[derive(Debug, Clone, Copy)]
pub enum Derivation {
    Single(DeriveOne),
    /// Produces every key of the entry in one call.
    Group(DeriveMany),
}

#[derive(Debug, Clone)]
pub struct DerivedEntry {
    produces: Vec<String>,
    depends: Vec<String>,
    derive: Derivation,
}

impl DerivedEntry {
    /// An entry producing `key`. The key's own resolved value is always an
    /// input; `depends` lists the others.
    pub fn single(key: &str, depends: &[&str], derive: DeriveOne) -> Self {
        let mut deps = vec![key.to_string()];
        deps.extend(depends.iter().map(|d| d.to_string()));
        Self {
            produces: vec![key.to_string()],
            depends: dedup(deps),
            derive: Derivation::Single(derive),
        }
    }

    /// An entry producing several keys at once. Every produced key is an
    /// input read from the stores, plus `depends`.
    pub fn group(keys: &[&str], depends: &[&str], derive: DeriveMany) -> Self {
        Self {
            produces: keys.iter().map(|k| k.to_string()).collect(),
            depends: dedup(
                keys.iter()
                    .chain(depends)
                    .map(|d| d.to_string())
                    .collect(),
            ),
            derive: Derivation::Group(derive),
        }
    }

    pub fn produces(&self) -> &[String] {
        &self.produces
    }

    pub fn depends(&self) -> &[String] {
        &self.depends
    }
}

fn dedup(keys: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    keys.into_iter().filter(|k| seen.insert(k.clone())).collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Read {
    /// Precedence-resolved value from the stores.
    Base,
    /// Value produced by another entry.
    Derived,
}

#[derive(Debug)]
pub struct DerivedGraph {
    entries: Vec<DerivedEntry>,
    /// How each entry reads each of its dependencies.
    reads: Vec<Vec<Read>>,
    producers: HashMap<String, usize>,
    /// Entries to invalidate when a key changes.
    dependents: HashMap<String, Vec<usize>>,
    memo: RefCell<HashMap<usize, IndexMap<String, Value>>>,
}

impl DerivedGraph {
    /// Build the graph, rejecting keys produced twice, unknown dependencies
    /// and cycles.
    pub fn new(entries: Vec<DerivedEntry>, catalog: &Catalog) -> Result<Self> {
        let mut producers = HashMap::new();
        for (idx, entry) in entries.iter().enumerate() {
            for key in &entry.produces {
                if producers.insert(key.clone(), idx).is_some() {
                    return Err(Error::DuplicateDerived { key: key.clone() });
                }
            }
        }

        let mut reads = Vec::with_capacity(entries.len());
        let mut dependents: HashMap<String, Vec<usize>> = HashMap::new();
        for (idx, entry) in entries.iter().enumerate() {
            let mut entry_reads = Vec::with_capacity(entry.depends.len());
            for dep in &entry.depends {
                let read = if entry.produces.contains(dep) || catalog.contains(dep) {
                    Read::Base
                } else if producers.contains_key(dep) {
                    Read::Derived
                } else {
                    return Err(Error::UnknownDependency {
                        key: entry.produces.join("+"),
                        dependency: dep.clone(),
                    });
                };
                entry_reads.push(read);
                dependents.entry(dep.clone()).or_default().push(idx);
            }
            reads.push(entry_reads);
        }

        let graph = Self {
            entries,
            reads,
            producers,
            dependents,
            memo: RefCell::new(HashMap::new()),
        };
        graph.check_cycles()?;
        tracing::debug!(entries = graph.entries.len(), "built derived graph");
        Ok(graph)
    }

    fn check_cycles(&self) -> Result<()> {
        #[derive(Clone, Copy, PartialEq)]
        enum Mark {
            Unvisited,
            Visiting,
            Done,
        }

        fn visit(graph: &DerivedGraph, idx: usize, marks: &mut [Mark]) -> Result<()> {
            match marks[idx] {
                Mark::Done => return Ok(()),
                Mark::Visiting => {
                    return Err(Error::DerivedCycle {
                        key: graph.entries[idx].produces.join("+"),
                    });
                }
                Mark::Unvisited => {}
            }
            marks[idx] = Mark::Visiting;
            let entry = &graph.entries[idx];
            for (dep, read) in entry.depends.iter().zip(&graph.reads[idx]) {
                if *read == Read::Derived {
                    if let Some(&next) = graph.producers.get(dep) {
                        visit(graph, next, marks)?;
                    }
                }
            }
            marks[idx] = Mark::Done;
            Ok(())
        }

        let mut marks = vec![Mark::Unvisited; self.entries.len()];
        for idx in 0..self.entries.len() {
            visit(self, idx, &mut marks)?;
        }
        Ok(())
    }

    /// Whether `key` is produced by an entry.
    pub fn produces(&self, key: &str) -> bool {
        self.producers.contains_key(key)
    }

    /// Every produced key, in declaration order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries
            .iter()
            .flat_map(|e| e.produces.iter().map(String::as_str))
    }

    /// The derived value of `key`, computing and memoizing its entry on
    /// first use. `base` supplies precedence-resolved values.
    pub fn resolve(&self, key: &str, base: &dyn Fn(&str) -> Value) -> Option<Value> {
        let idx = *self.producers.get(key)?;
        self.compute(idx, base).get(key).cloned()
    }

    fn compute(&self, idx: usize, base: &dyn Fn(&str) -> Value) -> IndexMap<String, Value> {
        if let Some(cached) = self.memo.borrow().get(&idx) {
            return cached.clone();
        }

        let entry = &self.entries[idx];
        let values = entry
            .depends
            .iter()
            .zip(&self.reads[idx])
            .map(|(dep, read)| {
                let value = match read {
                    Read::Base => base(dep),
                    Read::Derived => self.resolve(dep, base).unwrap_or(Value::Null),
                };
                (dep.clone(), value)
            })
            .collect();
        let inputs = Inputs::new(values);

        let outputs = match entry.derive {
            Derivation::Single(f) => {
                let mut out = IndexMap::new();
                out.insert(entry.produces[0].clone(), f(&inputs));
                out
            }
            Derivation::Group(f) => f(&inputs),
        };
        tracing::trace!(keys = ?entry.produces, "computed derived value");
        self.memo.borrow_mut().insert(idx, outputs.clone());
        outputs
    }

    /// Drop memoized values of every entry that depends on `key`, directly
    /// or transitively.
    pub fn invalidate(&self, key: &str) {
        let mut memo = self.memo.borrow_mut();
        let mut queue = VecDeque::from([key.to_string()]);
        let mut seen = HashSet::new();
        while let Some(changed) = queue.pop_front() {
            let Some(dependents) = self.dependents.get(&changed) else {
                continue;
            };
            for &idx in dependents {
                if seen.insert(idx) {
                    memo.remove(&idx);
                    queue.extend(self.entries[idx].produces.iter().cloned());
                }
            }
        }
    }

    /// Drop every memoized value.
    pub fn clear(&self) {
        self.memo.borrow_mut().clear();
    }

    pub fn is_cached(&self, key: &str) -> bool {
        self.producers
            .get(key)
            .is_some_and(|idx| self.memo.borrow().contains_key(idx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pmrc_meta::{DefinitionSpec, ValueType};
    use serde_json::json;
    use std::cell::Cell;

    fn catalog() -> Catalog {
        let number = || {
            DefinitionSpec::new()
                .default_value(0)
                .types([ValueType::Number])
                .description("n")
        };
        Catalog::from_specs([("a", number()), ("b", number())]).unwrap()
    }

    fn double(inputs: &Inputs) -> Value {
        json!(inputs.number("a").unwrap_or(0.0) * 2.0)
    }

    fn plus_one(inputs: &Inputs) -> Value {
        json!(inputs.number("doubled").unwrap_or(0.0) + 1.0)
    }

    fn entries() -> Vec<DerivedEntry> {
        vec![
            DerivedEntry::single("doubled", &["a"], double),
            DerivedEntry::single("plus-one", &["doubled"], plus_one),
        ]
    }

    #[test]
    fn derived_values_chain_and_memoize() {
        let graph = DerivedGraph::new(entries(), &catalog()).unwrap();
        let calls = Cell::new(0);
        let base = |key: &str| {
            calls.set(calls.get() + 1);
            if key == "a" { json!(3) } else { Value::Null }
        };

        assert_eq!(graph.resolve("plus-one", &base), Some(json!(7.0)));
        let after_first = calls.get();
        assert_eq!(graph.resolve("plus-one", &base), Some(json!(7.0)));
        assert_eq!(calls.get(), after_first);
        assert!(graph.is_cached("doubled"));
    }

    #[test]
    fn invalidation_is_transitive() {
        let graph = DerivedGraph::new(entries(), &catalog()).unwrap();
        let base = |_: &str| json!(1);
        graph.resolve("plus-one", &base);

        graph.invalidate("b");
        assert!(graph.is_cached("plus-one"));

        graph.invalidate("a");
        assert!(!graph.is_cached("doubled"));
        assert!(!graph.is_cached("plus-one"));
    }

    #[test]
    fn cycles_are_rejected() {
        let err = DerivedGraph::new(
            vec![
                DerivedEntry::single("x", &["y"], double),
                DerivedEntry::single("y", &["x"], double),
            ],
            &catalog(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::DerivedCycle { .. }));
    }

    #[test]
    fn keys_produced_twice_are_rejected() {
        let err = DerivedGraph::new(
            vec![
                DerivedEntry::single("x", &["a"], double),
                DerivedEntry::single("x", &["a"], plus_one),
            ],
            &catalog(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::DuplicateDerived { ref key } if key == "x"));
    }

    #[test]
    fn group_members_cannot_be_produced_again() {
        let err = DerivedGraph::new(
            vec![
                DerivedEntry::group(&["x", "y"], &["a"], |_| IndexMap::new()),
                DerivedEntry::single("y", &["b"], double),
            ],
            &catalog(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::DuplicateDerived { ref key } if key == "y"));
    }

    #[test]
    fn unknown_dependencies_are_rejected() {
        let err = DerivedGraph::new(
            vec![DerivedEntry::single("x", &["nowhere"], double)],
            &catalog(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::UnknownDependency { .. }));
    }
}
