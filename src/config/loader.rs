//! Config file location and loading.
//!
//! The file is located in this order:
//! 1. The name set with [`Config::set_config_name`], if it is an existing file
//! 2. The path in `[PREFIX_]CONFIG_FILE`, if it is an existing file
//! 3. `config.json` in the working directory
//!
//! Files ending in `.yaml` or `.yml` are read as YAML, everything else as JSON.

use super::resolver::Config;
use crate::error::{ConfigError, ConfigResult};
use crate::types::{Map, Value, ValueKind};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// File used when neither a configured name nor the environment points at one.
pub const DEFAULT_CONFIG_FILE: &str = "config.json";

/// Path, projected with the env prefix, of the variable naming the config file.
pub const CONFIG_FILE_KEY: &str = "CONFIG_FILE";

/// Document formats the loader understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FileFormat {
    #[default]
    Json,
    Yaml,
}

impl std::fmt::Display for FileFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FileFormat::Json => write!(f, "json"),
            FileFormat::Yaml => write!(f, "yaml"),
        }
    }
}

impl FileFormat {
    /// Pick a format from the file extension.
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .as_deref()
        {
            Some("yaml" | "yml") => FileFormat::Yaml,
            _ => FileFormat::Json,
        }
    }

    /// Decode a document into a tree.
    ///
    /// An empty or null document yields an empty tree; any other non-mapping
    /// root is rejected.
    pub fn decode(self, buf: &[u8]) -> ConfigResult<Map> {
        let doc: serde_json::Value = match self {
            FileFormat::Json => serde_json::from_slice(buf).map_err(ConfigError::Json)?,
            FileFormat::Yaml => {
                if buf.iter().all(u8::is_ascii_whitespace) {
                    serde_json::Value::Null
                } else {
                    serde_yaml::from_slice(buf)?
                }
            }
        };
        match Value::from(doc) {
            Value::Map(map) => Ok(map),
            Value::Null => Ok(Map::new()),
            other => Err(ConfigError::shape_mismatch("", ValueKind::Map, other.kind())),
        }
    }
}

fn is_file(path: &Path) -> bool {
    std::fs::metadata(path).is_ok_and(|meta| !meta.is_dir())
}

impl Config {
    /// Set the config file name. Takes effect on the next file read.
    pub fn set_config_name(&mut self, name: impl Into<PathBuf>) -> &mut Self {
        self.name = Some(name.into());
        self
    }

    /// The file that [`Config::read_config_file`] would read right now.
    pub fn config_name(&self) -> PathBuf {
        if let Some(name) = &self.name
            && is_file(name)
        {
            return name.clone();
        }
        if let Some(name) = self.env.var(&self.env_name(CONFIG_FILE_KEY))
            && !name.is_empty()
            && is_file(Path::new(&name))
        {
            return PathBuf::from(name);
        }
        PathBuf::from(DEFAULT_CONFIG_FILE)
    }

    /// Load the config file, treating a missing file as empty.
    ///
    /// Unreadable or malformed files are still errors.
    pub fn read_config_file(&mut self) -> ConfigResult<()> {
        self.load_file(false)
    }

    /// Load the config file, failing with [`ConfigError::FileNotFound`] if it
    /// does not exist.
    pub fn read_config_file_strict(&mut self) -> ConfigResult<()> {
        self.load_file(true)
    }

    fn load_file(&mut self, strict: bool) -> ConfigResult<()> {
        let path = self.config_name();
        let buf = match std::fs::read(&path) {
            Ok(buf) => buf,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                if strict {
                    return Err(ConfigError::FileNotFound(path));
                }
                debug!(path = %path.display(), "No config file found, continuing without file data");
                return Ok(());
            }
            Err(source) => return Err(ConfigError::Read { path, source }),
        };
        let format = FileFormat::from_path(&path);
        self.read_config_as(&buf, format)?;
        info!(path = %path.display(), %format, "Loaded config file");
        Ok(())
    }

    /// Replace file data with a JSON document.
    pub fn read_config(&mut self, buf: &[u8]) -> ConfigResult<()> {
        self.read_config_as(buf, FileFormat::Json)
    }

    /// Replace file data with a document in `format`.
    ///
    /// On a decode error the previous file data is kept untouched.
    pub fn read_config_as(&mut self, buf: &[u8], format: FileFormat) -> ConfigResult<()> {
        let data = format.decode(buf)?;
        self.data = data;
        self.invalidate();
        // Build the merged view now so reads right after a load are cheap.
        self.materialize_all();
        Ok(())
    }
}
