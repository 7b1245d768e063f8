//! Per-element views over sequences of mappings.
//!
//! Each element of `workers` gets its own [`Config`] whose env prefix is the
//! projection of `workers.N`, so `WORKERS_0_NAME` overrides `name` in the first
//! element. Elements that exist only in the environment are picked up too,
//! continuing from the sequence length until the first index with no
//! variables.

use super::resolver::Config;
use crate::env;
use crate::error::{ConfigError, ConfigResult};
use crate::tree;
use crate::types::{Map, Value, ValueKind};
use tracing::debug;

impl Config {
    fn element_prefix(&self, path: &str, index: usize) -> String {
        self.env_name(&format!("{}.{}", path, index))
    }

    /// One scoped resolver per element of the sequence at `path`.
    ///
    /// Scoped resolvers hold the element as file data and have no overrides
    /// or defaults of their own. Fails if `path` is missing, is not a
    /// sequence, or holds an element that is not a mapping.
    pub fn sub_configs(&self, path: &str) -> ConfigResult<Vec<Config>> {
        let items = match tree::resolve(self.materialize_all(), path)? {
            Value::Seq(items) => items,
            other => return Err(ConfigError::shape_mismatch(path, ValueKind::Seq, other.kind())),
        };

        let mut scopes = Vec::with_capacity(items.len());
        for (index, item) in items.iter().enumerate() {
            let data = match item {
                Value::Map(map) => map.clone(),
                Value::Null => Map::new(),
                other => {
                    return Err(ConfigError::shape_mismatch(
                        format!("{}.{}", path, index),
                        ValueKind::Map,
                        other.kind(),
                    ));
                }
            };
            scopes.push(self.scoped(self.element_prefix(path, index), data));
        }

        if self.use_env {
            let mut index = items.len();
            loop {
                let prefix = self.element_prefix(path, index);
                if !env::has_prefix(self.env.as_ref(), &prefix) {
                    break;
                }
                debug!(path = %path, index, prefix = %prefix, "Adding environment-only element");
                scopes.push(self.scoped(prefix, Map::new()));
                index += 1;
            }
        }

        Ok(scopes)
    }

    /// Call `visit` with a scoped resolver for each element of the sequence
    /// at `path`, in order. Stops at the first error from `visit`.
    pub fn for_each<F, E>(&self, path: &str, mut visit: F) -> Result<(), E>
    where
        F: FnMut(&Config) -> Result<(), E>,
        E: From<ConfigError>,
    {
        for scope in self.sub_configs(path)? {
            visit(&scope)?;
        }
        Ok(())
    }
}
