//! `${NAME}` placeholder expansion against resolved config values.

use super::resolver::Config;
use crate::coerce;
use regex_lite::{Captures, Regex};
use std::sync::LazyLock;

static PLACEHOLDER: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"\$\{([^{}]+)\}").ok());

/// Config path a placeholder name refers to: `SERVER_PORT` becomes `server.port`.
pub fn placeholder_path(name: &str) -> String {
    name.trim().to_lowercase().replace('_', ".")
}

impl Config {
    /// Replace every `${NAME}` in `input` with the string form of the value at
    /// the path `NAME` maps to. Placeholders that resolve to nothing are left
    /// in place.
    pub fn expand(&self, input: &str) -> String {
        let Some(placeholder) = PLACEHOLDER.as_ref() else {
            return input.to_string();
        };
        placeholder
            .replace_all(input, |caps: &Captures<'_>| {
                match self.lookup(&placeholder_path(&caps[1])) {
                    Some(value) => coerce::to_string(&value),
                    None => caps[0].to_string(),
                }
            })
            .into_owned()
    }

    /// String at `path` with placeholders expanded.
    pub fn get_expanded(&self, path: &str) -> String {
        self.expand(&self.get_string(path))
    }
}
