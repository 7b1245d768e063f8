//! Error types for configuration loading, traversal and decoding.
//!
//! Scalar getters never produce these: unparsable or missing values degrade to
//! the target type's zero value. Errors are reserved for operations that need
//! structural presence (decode, iteration), for file loading, and for writes
//! that would turn a leaf into a subtree.

use crate::types::ValueKind;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    /// Empty path, or a path with an empty segment (`a..b`).
    #[error("Invalid config path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },

    /// Nothing is stored at the path.
    #[error("Missing config path '{path}'")]
    MissingPath { path: String },

    /// A node exists at the path but has the wrong shape for the operation.
    #[error("Expected {expected} at config path '{path}', found {found}")]
    ShapeMismatch {
        path: String,
        expected: ValueKind,
        found: ValueKind,
    },

    /// A write tried to descend through a leaf.
    #[error("Cannot set path '{path}': '{segment}' exists as {found}")]
    PathConflict {
        path: String,
        segment: String,
        found: ValueKind,
    },

    /// A numeric segment addressed past the end of a sequence.
    #[error("Index {index} out of range at config path '{path}' (length {len})")]
    IndexOutOfRange {
        path: String,
        index: usize,
        len: usize,
    },

    #[error("Configuration file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read configuration file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse JSON configuration: {0}")]
    Json(#[source] serde_json::Error),

    #[error("Failed to parse YAML configuration: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Structural decode into a caller-supplied type failed.
    #[error("Failed to decode config path '{path}': {source}")]
    Decode {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

impl ConfigError {
    pub fn invalid_path(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidPath {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub fn missing_path(path: impl Into<String>) -> Self {
        Self::MissingPath { path: path.into() }
    }

    pub fn shape_mismatch(path: impl Into<String>, expected: ValueKind, found: ValueKind) -> Self {
        Self::ShapeMismatch {
            path: path.into(),
            expected,
            found,
        }
    }

    pub fn conflict(path: impl Into<String>, segment: impl Into<String>, found: ValueKind) -> Self {
        Self::PathConflict {
            path: path.into(),
            segment: segment.into(),
            found,
        }
    }

    /// True for "nothing there" errors, as opposed to malformed paths or shapes.
    pub fn is_missing(&self) -> bool {
        matches!(self, Self::MissingPath { .. } | Self::IndexOutOfRange { .. })
    }
}

/// Result type for configuration operations.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conflict_message() {
        let err = ConfigError::conflict("a.b.c", "b", ValueKind::Int);
        assert_eq!(
            err.to_string(),
            "Cannot set path 'a.b.c': 'b' exists as integer"
        );
    }

    #[test]
    fn test_is_missing() {
        assert!(ConfigError::missing_path("x").is_missing());
        assert!(
            ConfigError::IndexOutOfRange {
                path: "x.3".into(),
                index: 3,
                len: 1
            }
            .is_missing()
        );
        assert!(!ConfigError::invalid_path("", "empty path").is_missing());
    }
}
