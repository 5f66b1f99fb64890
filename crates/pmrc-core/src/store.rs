//! Per-location config stores
//!
//! A [`LayerStore`] holds the validated data of exactly one [`Location`].
//! It is loaded once, from command line tokens, a parsed object or rc
//! text, and afterwards only changes through `set`/`delete`. Those two are
//! crate-private: outside callers mutate through
//! [`ConfigResolver`](crate::ConfigResolver), which keeps derived values in
//! sync.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use pmrc_fs::NormalizedPath;
use pmrc_meta::nerf::{is_dynamic_key, nerf_dart};
use pmrc_meta::{Catalog, Location, LocationOptions, Rejection, TypeContext};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::env::{EnvMap, replace_env_in};
use crate::{Error, Result, args, editor, ini};

/// Legacy spellings kept at auth-validating locations so they can be
/// reported.
const LEGACY_AUTH_KEYS: [&str; 2] = ["_authtoken", "-authtoken"];

/// Keys that must be scoped to a registry.
const SCOPED_AUTH_KEYS: [&str; 4] = ["_auth", "_authToken", "username", "_password"];

/// Where a store's data comes from.
#[derive(Debug)]
pub enum Origin {
    /// Command line style tokens.
    Args(Vec<String>),
    /// An already structured object.
    Object {
        data: Map<String, Value>,
        file: Option<NormalizedPath>,
    },
    /// rc file text.
    Text {
        text: String,
        file: Option<NormalizedPath>,
    },
    /// Reading the file failed.
    Failed {
        file: NormalizedPath,
        error: pmrc_fs::Error,
    },
}

/// A remediation for an unsupported auth key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum AuthAction {
    Delete { key: String },
    Rename { from: String, to: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthProblem {
    #[serde(flatten)]
    pub action: AuthAction,
    pub location: Location,
}

/// Outcome of [`LayerStore::validate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Validation {
    Valid,
    Problems(Vec<AuthProblem>),
}

impl Validation {
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }
}

/// Result of checking one key against the location's policy.
enum Checked {
    /// A defined key, stored under its canonical name.
    Typed(String, Value),
    /// A dynamic key, stored unvalidated.
    Flat(Value),
}

#[derive(Debug)]
pub struct LayerStore {
    location: Location,
    options: LocationOptions,
    catalog: Arc<Catalog>,
    ctx: TypeContext,
    env: Arc<EnvMap>,
    data: IndexMap<String, Value>,
    flat: IndexMap<String, Value>,
    source: Option<String>,
    file: Option<NormalizedPath>,
    error: Option<pmrc_fs::Error>,
    valid: bool,
}

impl LayerStore {
    pub fn new(
        location: Location,
        catalog: Arc<Catalog>,
        ctx: TypeContext,
        env: Arc<EnvMap>,
    ) -> Self {
        Self {
            location,
            options: location.options(),
            catalog,
            ctx,
            env,
            data: IndexMap::new(),
            flat: IndexMap::new(),
            source: None,
            file: None,
            error: None,
            valid: true,
        }
    }

    pub fn location(&self) -> Location {
        self.location
    }

    /// Where the data came from, or why the location was ignored.
    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    pub fn file(&self) -> Option<&NormalizedPath> {
        self.file.as_ref()
    }

    pub fn error(&self) -> Option<&pmrc_fs::Error> {
        self.error.as_ref()
    }

    pub fn is_loaded(&self) -> bool {
        self.source.is_some()
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Validated values of defined keys.
    pub fn data(&self) -> &IndexMap<String, Value> {
        &self.data
    }

    /// Registry-scoped and other dynamic keys.
    pub fn flat_data(&self) -> &IndexMap<String, Value> {
        &self.flat
    }

    /// Value stored for `key` at this location. Aliases resolve first.
    pub fn get(&self, key: &str) -> Option<&Value> {
        let key = self.catalog.canonical(key);
        self.data.get(key).or_else(|| self.flat.get(key))
    }

    pub fn has(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Load the store. Returns positional tokens for [`Origin::Args`].
    pub fn load(&mut self, origin: Origin) -> Result<Vec<String>> {
        if let Some(source) = &self.source {
            return Err(Error::AlreadyLoaded {
                location: self.location,
                origin: source.clone(),
            });
        }

        let description = self.options.description;
        let mut positional = Vec::new();
        match origin {
            Origin::Args(tokens) => {
                self.source = Some(description.to_string());
                let parsed = args::parse(&tokens, &self.catalog);
                self.set_all(parsed.data)?;
                positional = parsed.positional;
            }
            Origin::Object { data, file } => {
                self.mark_file(file);
                let data = replace_env_in(data, &self.env);
                self.set_all(data)?;
            }
            Origin::Text { text, file } => {
                self.mark_file(file);
                let data = replace_env_in(ini::parse(&text), &self.env);
                self.set_all(data)?;
            }
            Origin::Failed { file, error } => {
                if !error.is_not_found() {
                    tracing::debug!(location = %self.location, %error, "error loading config");
                }
                self.mark_file(Some(file));
                self.error = Some(error);
            }
        }
        self.valid = false;
        tracing::debug!(
            location = %self.location,
            keys = self.data.len() + self.flat.len(),
            "loaded config layer"
        );
        Ok(positional)
    }

    /// Mark the location as loaded without data.
    pub fn ignore(&mut self, reason: &str) -> Result<()> {
        if let Some(source) = &self.source {
            return Err(Error::AlreadyLoaded {
                location: self.location,
                origin: source.clone(),
            });
        }
        self.source = Some(format!("{}, ignored: {reason}", self.options.description));
        tracing::debug!(location = %self.location, reason, "ignored config layer");
        Ok(())
    }

    fn mark_file(&mut self, file: Option<NormalizedPath>) {
        self.source = Some(match &file {
            Some(path) => format!("{}, file: {path}", self.options.description),
            None => self.options.description.to_string(),
        });
        self.file = file;
    }

    fn assert_loaded(&self) -> Result<()> {
        if self.is_loaded() {
            Ok(())
        } else {
            Err(Error::NotLoaded {
                location: self.location,
            })
        }
    }

    /// A load error other than a missing file blocks writing the file back.
    fn blocking_error(&self) -> Option<&pmrc_fs::Error> {
        self.error.as_ref().filter(|e| !e.is_not_found())
    }

    fn set_all(&mut self, data: Map<String, Value>) -> Result<()> {
        for (key, value) in data {
            self.insert(&key, value)?;
        }
        Ok(())
    }

    pub(crate) fn set(&mut self, key: &str, value: Value) -> Result<()> {
        self.assert_loaded()?;
        self.valid = false;
        self.insert(key, value)
    }

    pub(crate) fn delete(&mut self, key: &str) -> Result<bool> {
        self.assert_loaded()?;
        self.valid = false;
        let key = self.catalog.canonical(key).to_string();
        let removed = self.data.shift_remove(&key).is_some();
        Ok(self.flat.shift_remove(&key).is_some() || removed)
    }

    fn insert(&mut self, key: &str, value: Value) -> Result<()> {
        if let Some(dep) = self.catalog.get(key).and_then(|d| d.deprecated()) {
            if !self.options.allow_deprecated {
                tracing::warn!(key, "{dep}");
            }
        }

        match self.check(key, &value)? {
            Some(Checked::Typed(canonical, v)) => {
                self.data.insert(canonical, v);
            }
            Some(Checked::Flat(v)) => {
                self.flat.insert(key.to_string(), v);
            }
            None => {
                let canonical = self.catalog.canonical(key).to_string();
                self.data.shift_remove(&canonical);
                self.flat.shift_remove(key);
            }
        }
        Ok(())
    }

    /// Validate one key against its definition and this location's policy.
    /// `Ok(None)` means the value was rejected and dropped.
    fn check(&mut self, key: &str, value: &Value) -> Result<Option<Checked>> {
        let catalog = Arc::clone(&self.catalog);
        if let Some(def) = catalog.get(key) {
            return match def.coerce(value, self.location, &self.ctx) {
                Ok(v) => Ok(Some(Checked::Typed(def.key().to_string(), v))),
                Err(rejection) => {
                    let reason = match rejection {
                        Rejection::NotAllowed => format!(
                            "not allowed to be set on config layer `{}`",
                            self.location
                        ),
                        Rejection::Invalid => def.invalid_usage(),
                    };
                    self.reject(key, value, "invalid", &reason).map(|_| None)
                }
            };
        }

        let legacy = self.options.validate_auth && LEGACY_AUTH_KEYS.contains(&key);
        if is_dynamic_key(key) || legacy {
            return Ok(Some(Checked::Flat(value.clone())));
        }

        if !self.options.remove_unknown {
            return Err(Error::UnknownKey {
                location: self.location,
                key: key.to_string(),
            });
        }
        self.reject(key, value, "unknown", "not allowed to be set")
            .map(|_| None)
    }

    fn reject(&mut self, key: &str, value: &Value, kind: &str, reason: &str) -> Result<()> {
        self.valid = false;
        let shown = match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        let message = format!("{kind} item `{key}` set with `{shown}`, {reason}");
        if self.options.throw {
            return Err(Error::InvalidItem {
                location: self.location,
                key: key.to_string(),
                message,
            });
        }
        tracing::warn!(location = %self.location, "{message}");
        Ok(())
    }

    /// Re-check all data and, where the location asks for it, look for
    /// auth settings in shapes that are no longer supported.
    ///
    /// `registry` is the effective registry, used to suggest scoped names.
    pub fn validate(&mut self, registry: &str) -> Result<Validation> {
        self.assert_loaded()?;
        if self.valid {
            return Ok(Validation::Valid);
        }

        let data = std::mem::take(&mut self.data);
        for (key, value) in data {
            if let Some(Checked::Typed(canonical, v)) = self.check(&key, &value)? {
                self.data.insert(canonical, v);
            }
        }

        let mut problems = Vec::new();
        if self.options.validate_auth {
            for key in LEGACY_AUTH_KEYS {
                if self.get(key).is_some_and(truthy) {
                    problems.push(AuthAction::Delete {
                        key: key.to_string(),
                    });
                }
            }
            for key in SCOPED_AUTH_KEYS {
                if !self.get(key).is_some_and(truthy) {
                    continue;
                }
                let unpaired = match key {
                    "username" => !self.get("_password").is_some_and(truthy),
                    "_password" => !self.get("username").is_some_and(truthy),
                    _ => false,
                };
                if unpaired {
                    problems.push(AuthAction::Delete {
                        key: key.to_string(),
                    });
                } else {
                    let nerfed = nerf_dart(registry)?;
                    problems.push(AuthAction::Rename {
                        from: key.to_string(),
                        to: format!("{nerfed}:{key}"),
                    });
                }
            }
        }

        if problems.is_empty() {
            self.valid = true;
            return Ok(Validation::Valid);
        }
        Ok(Validation::Problems(
            problems
                .into_iter()
                .map(|action| AuthProblem {
                    action,
                    location: self.location,
                })
                .collect(),
        ))
    }

    /// Write the store back to its file.
    ///
    /// An empty store removes the file. A store whose file failed to load
    /// for a reason other than being missing is left untouched.
    pub async fn save(&mut self, registry: &str) -> Result<()> {
        self.assert_loaded()?;
        let file = self.file.clone().ok_or(Error::NotFileBacked {
            action: "save",
            location: self.location,
        })?;
        if let Some(error) = self.blocking_error() {
            tracing::debug!(location = %self.location, %error, "not saving config that failed to load");
            return Ok(());
        }

        if self.location == Location::User {
            let scoped = format!("{}:email", nerf_dart(registry)?);
            if let Some(email) = self.flat.get(&scoped).filter(|v| truthy(v)).cloned() {
                self.delete(&scoped)?;
                self.set("email", email)?;
            }
        }

        let text = self.to_string();
        if text.is_empty() {
            let removed = tokio::task::spawn_blocking(move || pmrc_fs::io::remove_file(&file))
                .await??;
            tracing::debug!(location = %self.location, removed, "removed empty config file");
            return Ok(());
        }
        write_file(file, &text, self.options.mode).await?;
        tracing::info!(location = %self.location, "saved config");
        Ok(())
    }

    /// Save, rewrite the file in an annotated form and open it in `editor`.
    pub async fn edit(&mut self, editor: &str, registry: &str) -> Result<()> {
        self.assert_loaded()?;
        let file = self.file.clone().ok_or(Error::NotFileBacked {
            action: "edit",
            location: self.location,
        })?;
        if let Some(error) = self.blocking_error() {
            return Err(Error::LoadErrored {
                location: self.location,
                message: error.to_string(),
            });
        }

        self.save(registry).await?;
        let annotated =
            editor::annotated(self.location, &file, &self.to_string(), &self.catalog);
        write_file(file.clone(), &annotated, self.options.mode).await?;
        editor::launch(editor, &file).await
    }
}

/// `toString` form: the rc text of all data, trailing whitespace trimmed.
impl fmt::Display for LayerStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut all = Map::new();
        for (k, v) in self.data.iter().chain(&self.flat) {
            all.insert(k.clone(), v.clone());
        }
        f.write_str(ini::stringify(&all).trim())
    }
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::String(s) => !s.is_empty(),
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Write text with host line endings and a trailing newline.
async fn write_file(file: NormalizedPath, text: &str, mode: u32) -> Result<()> {
    let eol = if cfg!(windows) { "\r\n" } else { "\n" };
    let mut content = text.trim().lines().collect::<Vec<_>>().join(eol);
    content.push_str(eol);
    tokio::task::spawn_blocking(move || pmrc_fs::io::write_atomic(&file, content.as_bytes(), mode))
        .await??;
    Ok(())
}
