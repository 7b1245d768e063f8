//! Layered configuration resolver.
//!
//! Resolves dotted paths (`server.port`, `workers.0.name`) against four sources:
//! 1. **Environment** - `[PREFIX_]SERVER_PORT`, read on every lookup
//! 2. **Overrides** - values set in code with [`Config::set`]
//! 3. **File** - a JSON or YAML document, see [`Config::read_config_file`]
//! 4. **Defaults** - per-path fallbacks registered with [`Config::set_default`]
//!
//! ## Merged View
//! [`Config::materialize_all`] builds one tree from file data, overrides and
//! defaults, and absorbs prefixed environment variables when a prefix is set.
//! The tree is cached until the next mutation.
//!
//! ## Environment Variables
//! - `[PREFIX_]CONFIG_FILE` - Config file to load when none is configured
//! - `[PREFIX_]<PATH>` - Value for `<path>`, with `.` written as `_`

mod interpolate;
mod loader;
mod merge;
mod resolver;
mod scope;

pub use interpolate::placeholder_path;
pub use loader::{CONFIG_FILE_KEY, DEFAULT_CONFIG_FILE, FileFormat};
pub use merge::{deep_merge, merge_maps};
pub use resolver::Config;
