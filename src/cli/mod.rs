//! CLI command definitions for tiered-config
//!
//! This module defines the CLI structure using clap's derive macros.
//! The main entry point is the `Cli` struct which contains subcommands.

use crate::coerce;
use crate::config::{Config, FileFormat};
use crate::types::Value;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Type a looked-up value is coerced to before printing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ValueType {
    #[default]
    String,
    Bool,
    Int,
    Uint,
    Float,
    Duration,
    Time,
    /// Comma-joined string slice
    List,
    /// `key=value` lines
    Map,
    /// Uncoerced value as JSON
    Json,
}

impl ValueType {
    /// Look up `path` and render it as this type.
    pub fn render(self, config: &Config, path: &str) -> String {
        match self {
            ValueType::String => config.get_string(path),
            ValueType::Bool => config.get_bool(path).to_string(),
            ValueType::Int => config.get_int(path).to_string(),
            ValueType::Uint => config.get_uint(path).to_string(),
            ValueType::Float => config.get_float(path).to_string(),
            ValueType::Duration => coerce::to_string(&Value::Duration(config.get_duration(path))),
            ValueType::Time => coerce::to_string(&Value::Timestamp(config.get_time(path))),
            ValueType::List => config.get_string_slice(path).join(","),
            ValueType::Map => config
                .get_string_map(path)
                .iter()
                .map(|(k, v)| format!("{}={}", k, v))
                .collect::<Vec<_>>()
                .join("\n"),
            ValueType::Json => config
                .lookup(path)
                .map(|value| value.to_json().to_string())
                .unwrap_or_else(|| "null".to_string()),
        }
    }
}

/// Split a `path=value` argument.
pub fn parse_assignment(arg: &str) -> Result<(String, String), String> {
    match arg.split_once('=') {
        Some((path, value)) if !path.trim().is_empty() => {
            Ok((path.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected PATH=VALUE, got '{}'", arg)),
    }
}

/// Layered configuration inspector
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file (YAML if it ends in .yaml/.yml, JSON otherwise)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Environment variable prefix (e.g. APP reads APP_SERVER_PORT)
    #[arg(short = 'p', long, default_value = "", global = true)]
    pub env_prefix: String,

    /// Ignore environment variables when resolving values
    #[arg(long, global = true)]
    pub no_env: bool,

    /// Fail if the config file does not exist
    #[arg(long, global = true)]
    pub strict: bool,

    /// Override a value (repeatable)
    #[arg(long = "set", value_name = "PATH=VALUE", value_parser = parse_assignment, global = true)]
    pub overrides: Vec<(String, String)>,

    /// Register a default value (repeatable)
    #[arg(long = "default", value_name = "PATH=VALUE", value_parser = parse_assignment, global = true)]
    pub defaults: Vec<(String, String)>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Logging output: 0/off, 1/stdout, 2/stderr (default), or filename
    #[arg(short, long, default_value = "2", global = true)]
    pub log: String,

    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the resolved value at a path
    Get {
        path: String,
        /// Type to coerce the value to
        #[arg(long = "as", value_enum, default_value_t = ValueType::String)]
        kind: ValueType,
    },

    /// Print the merged configuration tree
    Dump {
        /// Print `path = value` lines instead of JSON
        #[arg(long)]
        flat: bool,
        /// Only print the mapping at this path
        #[arg(long)]
        path: Option<String>,
    },

    /// Print the environment variable name a path maps to
    EnvName { path: String },

    /// Expand ${NAME} placeholders in a template
    Expand { template: String },

    /// Print a key from every element of a sequence of mappings
    Each { path: String, key: String },
}

impl Cli {
    /// Build a resolver from the global options and load the config file.
    pub fn build_config(&self) -> Result<Config> {
        let mut config = Config::new();
        config.set_env_prefix(&self.env_prefix).use_env(!self.no_env);
        if let Some(path) = &self.config {
            config.set_config_name(path);
        }
        for (path, value) in &self.defaults {
            config
                .set_default(path, value.as_str())
                .with_context(|| format!("Invalid default for '{}'", path))?;
        }
        for (path, value) in &self.overrides {
            config
                .set(path, value.as_str())
                .with_context(|| format!("Invalid override for '{}'", path))?;
        }

        let name = config.config_name();
        let loaded = if self.strict {
            config.read_config_file_strict()
        } else {
            config.read_config_file()
        };
        loaded.with_context(|| {
            format!(
                "Failed to load {} config from {}",
                FileFormat::from_path(&name),
                name.display()
            )
        })?;
        Ok(config)
    }
}
