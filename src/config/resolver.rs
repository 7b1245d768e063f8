//! The resolver: four sources behind one path-addressed read API.

use super::merge::merge_maps;
use crate::coerce::{self, Coerce};
use crate::env::{self, EnvSource, ProcessEnv};
use crate::error::{ConfigError, ConfigResult};
use crate::tree;
use crate::types::{Map, Value, ValueKind};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use tracing::{debug, warn};

/// Layered configuration resolver.
///
/// Sources, highest precedence first:
/// 1. Environment variables (`[PREFIX_]SEGMENT_SEGMENT...`), read live
/// 2. Overrides set with [`Config::set`]
/// 3. File data loaded with [`Config::read_config_file`] or [`Config::read_config`]
/// 4. Defaults registered with [`Config::set_default`]
///
/// Mutations take `&mut self` and drop the cached merged view; reads take
/// `&self` and rebuild the view on demand. Once setup is finished a `Config`
/// can be shared across threads for reading.
#[derive(Debug, Clone)]
pub struct Config {
    /// Configured file name, if any
    pub(super) name: Option<PathBuf>,
    /// Uppercased environment prefix, empty for none
    pub(super) env_prefix: String,
    /// Whether environment variables take part in resolution
    pub(super) use_env: bool,
    pub(super) env: Arc<dyn EnvSource>,
    pub(super) overrides: Map,
    pub(super) data: Map,
    /// Flat map keyed by full dotted path
    pub(super) defaults: BTreeMap<String, Value>,
    /// Cached merged view, empty until first read after a mutation
    pub(super) merged: OnceLock<Map>,
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

fn present(value: Option<&Value>) -> Option<&Value> {
    value.filter(|v| !v.is_null())
}

fn last_segment(path: &str) -> &str {
    path.rsplit('.').next().unwrap_or(path)
}

impl Config {
    /// Create an empty resolver reading the live process environment.
    pub fn new() -> Self {
        Self {
            name: None,
            env_prefix: String::new(),
            use_env: true,
            env: Arc::new(ProcessEnv),
            overrides: Map::new(),
            data: Map::new(),
            defaults: BTreeMap::new(),
            merged: OnceLock::new(),
        }
    }

    pub(super) fn invalidate(&mut self) {
        self.merged = OnceLock::new();
    }

    /// Read environment variables from `source` instead of the process.
    pub fn with_env_source<E: EnvSource + 'static>(&mut self, source: E) -> &mut Self {
        self.env = Arc::new(source);
        self.invalidate();
        self
    }

    /// Set the environment prefix. Stored uppercased.
    pub fn set_env_prefix(&mut self, prefix: &str) -> &mut Self {
        self.env_prefix = prefix.to_uppercase();
        self.invalidate();
        self
    }

    pub fn env_prefix(&self) -> &str {
        &self.env_prefix
    }

    /// Enable or disable the environment overlay (enabled by default).
    pub fn use_env(&mut self, enabled: bool) -> &mut Self {
        self.use_env = enabled;
        self.invalidate();
        self
    }

    pub fn env_enabled(&self) -> bool {
        self.use_env
    }

    /// Environment variable name a path projects to under this resolver's prefix.
    pub fn env_name(&self, path: &str) -> String {
        env::env_name(path, &self.env_prefix)
    }

    fn env_var(&self, path: &str) -> Option<String> {
        if !self.use_env {
            return None;
        }
        self.env.var(&self.env_name(path))
    }

    /// Set an override value.
    ///
    /// Fails if the path is malformed or would descend through an existing
    /// leaf (e.g. `a.b.c` after `a.b` was set to a scalar).
    pub fn set(&mut self, path: &str, value: impl Into<Value>) -> ConfigResult<&mut Self> {
        tree::set(&mut self.overrides, path, value.into())?;
        self.invalidate();
        Ok(self)
    }

    /// Register a default value for an exact path.
    ///
    /// Defaults never overwrite file or override data. Registering a scalar
    /// default beneath another scalar default (or the reverse) is a wiring
    /// error and fails with [`ConfigError::PathConflict`].
    pub fn set_default(&mut self, path: &str, value: impl Into<Value>) -> ConfigResult<&mut Self> {
        tree::segments(path)?;
        let value = value.into();
        self.check_default_conflict(path, &value)?;
        self.defaults.insert(path.to_string(), value);
        self.invalidate();
        Ok(self)
    }

    fn check_default_conflict(&self, path: &str, value: &Value) -> ConfigResult<()> {
        let is_leaf = |v: &Value| !v.is_container() && !v.is_null();
        for (existing, existing_value) in &self.defaults {
            let nests_under = path
                .strip_prefix(existing.as_str())
                .is_some_and(|rest| rest.starts_with('.'));
            if nests_under && is_leaf(existing_value) {
                return Err(ConfigError::conflict(
                    path,
                    last_segment(existing),
                    existing_value.kind(),
                ));
            }
            let shadows = existing
                .strip_prefix(path)
                .is_some_and(|rest| rest.starts_with('.'));
            if shadows && is_leaf(value) {
                return Err(ConfigError::conflict(existing.as_str(), last_segment(path), value.kind()));
            }
        }
        Ok(())
    }

    /// Raw value at `path`, or `None` if no source has it.
    ///
    /// Checks, in order: the environment variable the path projects to (present
    /// wins, even when empty), the merged view, override data, file data, and
    /// the default registered for exactly this path. Nulls count as absent.
    pub fn lookup(&self, path: &str) -> Option<Cow<'_, Value>> {
        if tree::segments(path).is_err() {
            return None;
        }
        if let Some(val) = self.env_var(path) {
            return Some(Cow::Owned(Value::String(val)));
        }
        present(tree::get(self.materialize_all(), path))
            .or_else(|| present(tree::get(&self.overrides, path)))
            .or_else(|| present(tree::get(&self.data, path)))
            .or_else(|| present(self.defaults.get(path)))
            .map(Cow::Borrowed)
    }

    /// Whether any source provides a value for `path`.
    pub fn is_set(&self, path: &str) -> bool {
        self.lookup(path).is_some()
    }

    /// Look up `path` and coerce it; missing values become `T`'s zero value.
    pub fn get<T: Coerce>(&self, path: &str) -> T {
        match self.lookup(path) {
            Some(value) => T::coerce(&value),
            None => T::coerce(&Value::Null),
        }
    }

    pub fn get_string(&self, path: &str) -> String {
        self.get(path)
    }

    pub fn get_bool(&self, path: &str) -> bool {
        self.get(path)
    }

    pub fn get_int(&self, path: &str) -> i64 {
        self.get(path)
    }

    pub fn get_uint(&self, path: &str) -> u64 {
        self.get(path)
    }

    pub fn get_float(&self, path: &str) -> f64 {
        self.get(path)
    }

    pub fn get_duration(&self, path: &str) -> Duration {
        self.get(path)
    }

    pub fn get_time(&self, path: &str) -> DateTime<Utc> {
        self.get(path)
    }

    pub fn get_string_slice(&self, path: &str) -> Vec<String> {
        self.get(path)
    }

    pub fn get_int_slice(&self, path: &str) -> Vec<i64> {
        self.get(path)
    }

    pub fn get_uint_slice(&self, path: &str) -> Vec<u64> {
        self.get(path)
    }

    pub fn get_float_slice(&self, path: &str) -> Vec<f64> {
        self.get(path)
    }

    /// String map at `path`, with per-key environment overrides.
    ///
    /// After coercing the stored value, each `key` is replaced by the variable
    /// projected from `path.key` if one is set, and every other variable under
    /// the projected `path` prefix is added as a lowercased key. A map can thus
    /// be defined entirely from the environment. A variable that already
    /// overrode a mixed-case key is not added again in lowercase.
    pub fn get_string_map(&self, path: &str) -> BTreeMap<String, String> {
        let mut map = self
            .lookup(path)
            .map(|value| coerce::to_string_map(&value))
            .unwrap_or_default();
        if !self.use_env || tree::segments(path).is_err() {
            return map;
        }
        // Projected variable name -> the key it overrides. Mixed-case keys win
        // over their lowercased twin, which can only have come from the env.
        let mut claimed: BTreeMap<String, String> = BTreeMap::new();
        for (key, value) in map.iter_mut() {
            let name = self.env_name(&format!("{}.{}", path, key));
            let Some(overridden) = self.env.var(&name) else {
                continue;
            };
            *value = overridden;
            let owner = claimed.entry(name).or_insert_with(|| key.clone());
            if *owner == owner.to_lowercase() {
                *owner = key.clone();
            }
        }
        let prefix = self.env_name(path);
        for (name, value) in self.env.vars() {
            let Some(rest) = env::strip_prefix(&name, &prefix) else {
                continue;
            };
            if rest.is_empty() {
                continue;
            }
            let key = rest.to_lowercase();
            match claimed.get(&name) {
                Some(owner) if *owner != key => {
                    map.remove(&key);
                }
                Some(_) => {}
                None => {
                    map.entry(key).or_insert(value);
                }
            }
        }
        map
    }

    /// The merged view of file data, overrides, defaults and (when a prefix
    /// is set) prefixed environment variables.
    ///
    /// Built on first use and cached until the next mutation; repeated calls
    /// return the same tree.
    pub fn materialize_all(&self) -> &Map {
        self.merged.get_or_init(|| self.build_merged())
    }

    fn build_merged(&self) -> Map {
        let mut merged = merge_maps(self.data.clone(), self.overrides.clone());

        for (path, value) in &self.defaults {
            if let Err(err) = tree::set_if_empty(&mut merged, path, value.clone()) {
                warn!(path = %path, error = %err, "Skipping default that conflicts with config data");
            }
        }

        // Without a prefix every process variable would land in the tree.
        if self.use_env && !self.env_prefix.is_empty() {
            for (path, value) in env::enumerate(self.env.as_ref(), &self.env_prefix) {
                if let Err(err) = tree::set(&mut merged, &path, Value::String(value)) {
                    warn!(path = %path, error = %err, "Skipping environment variable that conflicts with config data");
                }
            }
        }

        debug!(
            prefix = %self.env_prefix,
            keys = merged.len(),
            defaults = self.defaults.len(),
            "Materialized merged config"
        );
        merged
    }

    /// Every leaf of the merged view as `(dotted.path, string)`, sorted by path.
    pub fn flatten(&self) -> Vec<(String, String)> {
        let mut out = Vec::new();
        tree::walk(self.materialize_all(), "", &mut |path, value| {
            out.push((path.to_string(), coerce::to_string(value)));
        });
        out.sort();
        out
    }

    /// Decode the mapping at `path` (or the whole tree for `""`) into `T`.
    pub fn unmarshal<T: DeserializeOwned>(&self, path: &str) -> ConfigResult<T> {
        let merged = self.materialize_all();
        let json = if path.is_empty() {
            serde_json::Value::Object(merged.iter().map(|(k, v)| (k.clone(), v.to_json())).collect())
        } else {
            match tree::resolve(merged, path)? {
                node @ Value::Map(_) => node.to_json(),
                other => return Err(ConfigError::shape_mismatch(path, ValueKind::Map, other.kind())),
            }
        };
        serde_json::from_value(json).map_err(|source| ConfigError::Decode {
            path: path.to_string(),
            source,
        })
    }

    /// A resolver scoped to one element of a sequence.
    pub(super) fn scoped(&self, env_prefix: String, data: Map) -> Config {
        Config {
            name: None,
            env_prefix,
            use_env: self.use_env,
            env: Arc::clone(&self.env),
            overrides: Map::new(),
            data,
            defaults: BTreeMap::new(),
            merged: OnceLock::new(),
        }
    }
}
