//! Tiered Config Library
//!
//! Layered configuration: environment variables over code overrides over a
//! JSON/YAML file over registered defaults, addressed by dotted paths.

pub mod cli;
pub mod coerce;
pub mod config;
pub mod env;
pub mod error;
pub mod logging;
pub mod tree;
pub mod types;

pub use coerce::Coerce;
pub use config::{Config, FileFormat};
pub use env::{EnvSource, ProcessEnv, StaticEnv};
pub use error::{ConfigError, ConfigResult};
pub use types::{Map, Value, ValueKind};
