//! Integration tests for value resolution across sources.
//!
//! Covers precedence (environment > override > file > default), typed
//! getters, the cached merged view and structural decoding.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;
use tiered_config::{Config, ConfigError, StaticEnv, Value};

/// Helper to build a resolver over a fixed environment and a JSON document.
fn resolver(env: StaticEnv, prefix: &str, json: &str) -> Config {
    let mut config = Config::new();
    config.with_env_source(env).set_env_prefix(prefix);
    config
        .read_config(json.as_bytes())
        .expect("Failed to load test document");
    config
}

const SERVER_DOC: &str = r#"{
    "server": {
        "port": 8080,
        "hosts": ["a", "b"],
        "read_timeout": "1m30s",
        "debug": "TRUE",
        "ratio": 0.25,
        "started": "2024-03-01T12:00:00Z",
        "labels": {"team": "core", "tier": 1}
    }
}"#;

#[test]
fn test_precedence_chain() {
    let env = StaticEnv::new().with("APP_SERVER_PORT", "9090");
    let mut config = resolver(env, "APP", SERVER_DOC);
    config.set_default("server.port", 1).unwrap();
    config.set("server.port", 7000).unwrap();
    assert_eq!(config.get_int("server.port"), 9090);

    config.use_env(false);
    assert_eq!(config.get_int("server.port"), 7000);

    let mut config = resolver(StaticEnv::new(), "APP", SERVER_DOC);
    config.set_default("server.port", 1).unwrap();
    assert_eq!(config.get_int("server.port"), 8080);

    let mut config = resolver(StaticEnv::new(), "APP", "{}");
    config.set_default("server.port", 1).unwrap();
    assert_eq!(config.get_int("server.port"), 1);
}

#[test]
fn test_typed_getters() {
    let config = resolver(StaticEnv::new(), "", SERVER_DOC);
    assert_eq!(config.get_uint("server.port"), 8080);
    assert_eq!(config.get_float("server.ratio"), 0.25);
    assert!(config.get_bool("server.debug"));
    assert_eq!(config.get_duration("server.read_timeout"), Duration::from_secs(90));
    assert_eq!(config.get_time("server.started").timestamp(), 1_709_294_400);
    assert_eq!(config.get_string_slice("server.hosts"), vec!["a", "b"]);
    assert_eq!(config.get::<u16>("server.port"), 8080);

    let labels = config.get_string_map("server.labels");
    assert_eq!(labels.get("team").map(String::as_str), Some("core"));
    assert_eq!(labels.get("tier").map(String::as_str), Some("1"));
}

#[test]
fn test_env_strings_coerce_like_file_values() {
    let env = StaticEnv::new()
        .with("APP_SERVER_HOSTS", "x, y ,z")
        .with("APP_SERVER_PORTS", "1,2,oops")
        .with("APP_SERVER_READ_TIMEOUT", "250ms")
        .with("APP_SERVER_DEBUG", "t");
    let config = resolver(env, "APP", SERVER_DOC);
    assert_eq!(config.get_string_slice("server.hosts"), vec!["x", "y", "z"]);
    assert_eq!(config.get_int_slice("server.ports"), vec![1, 2, 0]);
    assert_eq!(config.get_duration("server.read_timeout"), Duration::from_millis(250));
    assert!(config.get_bool("server.debug"));
}

#[test]
fn test_missing_values_are_zero() {
    let config = resolver(StaticEnv::new(), "", "{}");
    assert_eq!(config.get_string("nope"), "");
    assert_eq!(config.get_int("nope"), 0);
    assert!(!config.get_bool("nope"));
    assert_eq!(config.get_duration("nope"), Duration::ZERO);
    assert_eq!(config.get_time("nope").timestamp(), 0);
    assert!(config.get_string_slice("nope").is_empty());
    assert!(config.get_string_map("nope").is_empty());
    assert!(!config.is_set("nope"));
}

#[test]
fn test_materialize_is_cached_and_invalidated() {
    let mut config = resolver(StaticEnv::new(), "", r#"{"a": 1}"#);
    let first = config.materialize_all() as *const _;
    assert!(std::ptr::eq(first, config.materialize_all()));

    config.set_default("b", 2).unwrap();
    assert_eq!(config.materialize_all().get("b"), Some(&Value::Int(2)));
}

#[test]
fn test_set_errors() {
    let mut config = resolver(StaticEnv::new(), "", "{}");
    config.set("a.b", "leaf").unwrap();
    let err = config.set("a.b.c", 1).unwrap_err();
    assert!(matches!(err, ConfigError::PathConflict { .. }));
    assert!(err.to_string().contains("a.b.c"));
    assert!(matches!(config.set("a..b", 1), Err(ConfigError::InvalidPath { .. })));
    // The failed writes leave the existing value alone.
    assert_eq!(config.get_string("a.b"), "leaf");
}

#[derive(Debug, Deserialize)]
struct Limits {
    max: u32,
    #[serde(default)]
    names: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct Document {
    limits: Limits,
    #[serde(default)]
    extra: BTreeMap<String, serde_json::Value>,
}

#[test]
fn test_unmarshal_whole_and_subtree() {
    let mut config = resolver(StaticEnv::new(), "", r#"{"limits": {"max": 5}}"#);
    config.set("limits.names", vec!["x", "y"]).unwrap();

    let limits: Limits = config.unmarshal("limits").unwrap();
    assert_eq!(limits.max, 5);
    assert_eq!(limits.names, vec!["x", "y"]);

    let doc: Document = config.unmarshal("").unwrap();
    assert_eq!(doc.limits.max, 5);
    assert!(doc.extra.is_empty());
}

#[test]
fn test_unmarshal_string_env_value_is_strict() {
    // Prefixed variables land in the merged tree as strings.
    let env = StaticEnv::new().with("APP_LIMITS_MAX", "9");
    let config = resolver(env, "APP", r#"{"limits": {"max": 5}}"#);
    assert_eq!(config.get_int("limits.max"), 9);
    let err = config.unmarshal::<Limits>("limits").unwrap_err();
    assert!(matches!(err, ConfigError::Decode { .. }));
}

#[test]
fn test_flatten_includes_env_entries() {
    let env = StaticEnv::new().with("APP_LOG_LEVEL", "debug");
    let config = resolver(env, "APP", r#"{"name": "svc"}"#);
    assert_eq!(
        config.flatten(),
        vec![
            ("log.level".to_string(), "debug".to_string()),
            ("name".to_string(), "svc".to_string()),
        ]
    );
}

#[test]
fn test_overrides_and_defaults_inside_sequences() {
    let doc = r#"{"workers":[{"name":"a"},{"name":"b"}],"server":{"hosts":["x","y"]}}"#;
    let mut config = resolver(StaticEnv::new(), "", doc);
    config.set("workers.0.name", "z").unwrap();
    config.set("server.hosts.1", "q").unwrap();
    config.set_default("workers.1.port", 80).unwrap();

    assert_eq!(config.get_string_slice("server.hosts"), vec!["x", "q"]);
    assert_eq!(config.get_int("workers.1.port"), 80);

    #[derive(Debug, Deserialize)]
    struct Worker {
        name: String,
        #[serde(default)]
        port: u16,
    }
    #[derive(Debug, Deserialize)]
    struct Pool {
        workers: Vec<Worker>,
    }
    let pool: Pool = config.unmarshal("").unwrap();
    let names: Vec<&str> = pool.workers.iter().map(|w| w.name.as_str()).collect();
    assert_eq!(names, vec!["z", "b"]);
    assert_eq!(pool.workers[1].port, 80);
}

#[test]
fn test_string_map_keeps_one_entry_per_key() {
    let env = StaticEnv::new().with("APP_SERVER_LABELS_TEAM", "infra");
    let mut config = resolver(env, "APP", r#"{"server": {"labels": {"Team": "core"}}}"#);
    config.set("server.labels.tier", 1).unwrap();
    let labels = config.get_string_map("server.labels");
    assert_eq!(labels.len(), 2);
    assert_eq!(labels.get("Team").map(String::as_str), Some("infra"));
    assert!(!labels.contains_key("team"));
}

#[test]
fn test_float_rendering_uses_exponent_for_extremes() {
    let config = resolver(StaticEnv::new(), "", r#"{"big": 1e21, "tiny": 1e-7, "ratio": 0.25}"#);
    assert_eq!(config.get_string("big"), "1e+21");
    assert_eq!(config.get_string("tiny"), "1e-07");
    assert_eq!(config.get_string("ratio"), "0.25");
}
