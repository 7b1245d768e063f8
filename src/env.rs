//! Projection between dotted config paths and environment variable names.
//!
//! `server.read_timeout` with prefix `APP` projects to `APP_SERVER_READ_TIMEOUT`.
//! The reverse direction lowercases and turns every `_` into `.`, so it cannot
//! tell `a.b_c` from `a.b.c`: both project to `A_B_C` and come back as `a.b.c`.
//! Keys that contain underscores can therefore be overridden by their exact
//! projected name but are not reconstructed correctly when enumerating.

use std::collections::BTreeMap;
use std::fmt;

/// Where environment variables are read from.
///
/// The resolver reads through this trait so embedders and tests can supply a
/// fixed environment instead of the live process one.
pub trait EnvSource: fmt::Debug + Send + Sync {
    /// Value of a single variable, if set (possibly to the empty string).
    fn var(&self, name: &str) -> Option<String>;

    /// All variables as `(name, value)` pairs.
    fn vars(&self) -> Vec<(String, String)>;
}

/// The live process environment. Variables that are not valid UTF-8 are ignored.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn var(&self, name: &str) -> Option<String> {
        std::env::var_os(name).and_then(|v| v.into_string().ok())
    }

    fn vars(&self) -> Vec<(String, String)> {
        std::env::vars_os()
            .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
            .collect()
    }
}

/// A fixed set of variables.
#[derive(Debug, Clone, Default)]
pub struct StaticEnv {
    vars: BTreeMap<String, String>,
}

impl StaticEnv {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a variable, builder style.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(name.into(), value.into());
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.vars.insert(name.into(), value.into());
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for StaticEnv {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            vars: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

impl EnvSource for StaticEnv {
    fn var(&self, name: &str) -> Option<String> {
        self.vars.get(name).cloned()
    }

    fn vars(&self) -> Vec<(String, String)> {
        self.vars.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
    }
}

/// Project a dotted path to an environment variable name.
pub fn env_name(path: &str, prefix: &str) -> String {
    let key = path.to_uppercase().replace('.', "_");
    if prefix.is_empty() {
        key
    } else {
        format!("{}_{}", prefix, key)
    }
}

/// Strip `prefix` plus its `_` separator from a variable name.
///
/// An empty prefix matches every name unchanged. A name equal to the prefix
/// yields an empty remainder.
pub fn strip_prefix<'a>(name: &'a str, prefix: &str) -> Option<&'a str> {
    if prefix.is_empty() {
        return Some(name);
    }
    let rest = name.strip_prefix(prefix)?;
    if rest.is_empty() {
        return Some(rest);
    }
    rest.strip_prefix('_')
}

/// True if any variable lives at or under the projected `prefix`.
pub fn has_prefix(source: &dyn EnvSource, prefix: &str) -> bool {
    source
        .vars()
        .iter()
        .any(|(name, _)| strip_prefix(name, prefix).is_some())
}

/// Enumerate variables under `prefix` as `(dotted.path, value)` pairs.
///
/// The remainder after the prefix is lowercased and `_` becomes `.`. Variables
/// whose remainder is empty, or would yield an empty path segment, are skipped.
pub fn enumerate(source: &dyn EnvSource, prefix: &str) -> Vec<(String, String)> {
    let mut entries: Vec<(String, String)> = source
        .vars()
        .into_iter()
        .filter_map(|(name, value)| {
            let rest = strip_prefix(&name, prefix)?;
            let path = rest.to_lowercase().replace('_', ".");
            if path.is_empty() || path.split('.').any(str::is_empty) {
                return None;
            }
            Some((path, value))
        })
        .collect();
    entries.sort();
    entries
}
