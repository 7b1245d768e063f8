//! Dotted-path access into configuration trees.
//!
//! A path like `server.listeners.0.port` descends by key through mappings and
//! by numeric index through sequences. Reads never fail loudly: [`get`] returns
//! `None` for anything it cannot reach. Writes auto-create intermediate
//! mappings but refuse to descend through a leaf.

use crate::error::{ConfigError, ConfigResult};
use crate::types::{Map, Value, ValueKind};

/// Split a path into segments, rejecting empty paths and empty segments.
pub fn segments(path: &str) -> ConfigResult<Vec<&str>> {
    if path.is_empty() {
        return Err(ConfigError::invalid_path(path, "path is empty"));
    }
    let segs: Vec<&str> = path.split('.').collect();
    if segs.iter().any(|s| s.is_empty()) {
        return Err(ConfigError::invalid_path(path, "path contains an empty segment"));
    }
    Ok(segs)
}

/// Parse a sequence index segment. Only plain decimal digits are accepted.
pub fn parse_index(segment: &str) -> Option<usize> {
    if segment.is_empty() || !segment.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    segment.parse().ok()
}

/// Resolve a path, reporting why resolution failed.
pub fn resolve<'a>(tree: &'a Map, path: &str) -> ConfigResult<&'a Value> {
    let segs = segments(path)?;
    let mut node = tree
        .get(segs[0])
        .ok_or_else(|| ConfigError::missing_path(path))?;
    for (n, seg) in segs.iter().enumerate().skip(1) {
        node = match node {
            Value::Map(map) => map.get(*seg).ok_or_else(|| ConfigError::missing_path(path))?,
            Value::Seq(items) => {
                let index = parse_index(seg).ok_or_else(|| {
                    ConfigError::invalid_path(
                        path,
                        format!("'{}' is not an index into the sequence at '{}'", seg, segs[..n].join(".")),
                    )
                })?;
                items.get(index).ok_or_else(|| ConfigError::IndexOutOfRange {
                    path: path.to_string(),
                    index,
                    len: items.len(),
                })?
            }
            other => {
                return Err(ConfigError::shape_mismatch(
                    segs[..n].join("."),
                    ValueKind::Map,
                    other.kind(),
                ));
            }
        };
    }
    Ok(node)
}

/// Look up the node at `path`, or `None` if it cannot be reached.
pub fn get<'a>(tree: &'a Map, path: &str) -> Option<&'a Value> {
    resolve(tree, path).ok()
}

/// Store `value` at `path`, overwriting whatever the terminal segment held.
pub fn set(tree: &mut Map, path: &str, value: Value) -> ConfigResult<()> {
    let segs = segments(path)?;
    assign_map(tree, &segs, 0, value, true, path).map(|_| ())
}

/// Store `value` at `path` only if nothing (or null) is there yet.
///
/// Returns whether the value was stored.
pub fn set_if_empty(tree: &mut Map, path: &str, value: Value) -> ConfigResult<bool> {
    let segs = segments(path)?;
    assign_map(tree, &segs, 0, value, false, path)
}

fn assign_map(
    map: &mut Map,
    segs: &[&str],
    depth: usize,
    value: Value,
    overwrite: bool,
    path: &str,
) -> ConfigResult<bool> {
    let key = segs[depth];
    if depth == segs.len() - 1 {
        let vacant = map.get(key).is_none_or(Value::is_null);
        if overwrite || vacant {
            map.insert(key.to_string(), value);
            return Ok(true);
        }
        return Ok(false);
    }
    let child = map
        .entry(key.to_string())
        .or_insert_with(|| Value::Map(Map::new()));
    assign_node(child, segs, depth, value, overwrite, path)
}

fn assign_seq(
    items: &mut [Value],
    segs: &[&str],
    depth: usize,
    value: Value,
    overwrite: bool,
    path: &str,
) -> ConfigResult<bool> {
    let seg = segs[depth];
    let index = parse_index(seg).ok_or_else(|| {
        ConfigError::invalid_path(
            path,
            format!("'{}' is not an index into the sequence at '{}'", seg, segs[..depth].join(".")),
        )
    })?;
    let len = items.len();
    let slot = items.get_mut(index).ok_or_else(|| ConfigError::IndexOutOfRange {
        path: path.to_string(),
        index,
        len,
    })?;
    if depth == segs.len() - 1 {
        if overwrite || slot.is_null() {
            *slot = value;
            return Ok(true);
        }
        return Ok(false);
    }
    assign_node(slot, segs, depth, value, overwrite, path)
}

// `node` sits at segs[depth]; descend into it for segs[depth + 1].
fn assign_node(
    node: &mut Value,
    segs: &[&str],
    depth: usize,
    value: Value,
    overwrite: bool,
    path: &str,
) -> ConfigResult<bool> {
    if node.is_null() {
        *node = Value::Map(Map::new());
    }
    match node {
        Value::Map(map) => assign_map(map, segs, depth + 1, value, overwrite, path),
        Value::Seq(items) => assign_seq(items, segs, depth + 1, value, overwrite, path),
        leaf => Err(ConfigError::conflict(path, segs[depth], leaf.kind())),
    }
}

/// Visit every non-mapping node under `tree` with its full dotted path.
///
/// Sequences are reported as a single node, not expanded per element.
pub fn walk<F>(tree: &Map, prefix: &str, f: &mut F)
where
    F: FnMut(&str, &Value),
{
    for (key, value) in tree {
        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{}.{}", prefix, key)
        };
        match value {
            Value::Map(sub) => walk(sub, &path, f),
            other => f(&path, other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tree(value: serde_json::Value) -> Map {
        match Value::from(value) {
            Value::Map(map) => map,
            other => panic!("expected mapping, got {:?}", other.kind()),
        }
    }

    #[test]
    fn test_get_nested_and_indexed() {
        let t = tree(json!({
            "server": {"port": 8080},
            "workers": [{"name": "a"}, {"name": "b"}]
        }));
        assert_eq!(get(&t, "server.port"), Some(&Value::Int(8080)));
        assert_eq!(get(&t, "workers.1.name"), Some(&Value::from("b")));
        assert!(matches!(get(&t, "workers"), Some(Value::Seq(items)) if items.len() == 2));
    }

    #[test]
    fn test_get_failures_are_absent() {
        let t = tree(json!({"server": {"port": 8080}, "list": [1]}));
        assert_eq!(get(&t, ""), None);
        assert_eq!(get(&t, "server..port"), None);
        assert_eq!(get(&t, "server.port.deeper"), None);
        assert_eq!(get(&t, "list.5"), None);
        assert_eq!(get(&t, "list.x"), None);
        assert_eq!(get(&t, "missing"), None);
    }

    #[test]
    fn test_resolve_reports_shape() {
        let t = tree(json!({"server": {"port": 8080}, "list": [1]}));
        assert!(matches!(
            resolve(&t, "server.port.x"),
            Err(ConfigError::ShapeMismatch { ref path, found: ValueKind::Int, .. }) if path == "server.port"
        ));
        assert!(matches!(
            resolve(&t, "list.3"),
            Err(ConfigError::IndexOutOfRange { index: 3, len: 1, .. })
        ));
        assert!(matches!(resolve(&t, "nope"), Err(ConfigError::MissingPath { .. })));
    }

    #[test]
    fn test_set_then_get_roundtrip() {
        let mut t = Map::new();
        set(&mut t, "a.b.c", Value::from(1)).unwrap();
        set(&mut t, "a.b.d", Value::from("x")).unwrap();
        set(&mut t, "top", Value::from(true)).unwrap();
        assert_eq!(get(&t, "a.b.c"), Some(&Value::Int(1)));
        assert_eq!(get(&t, "a.b.d"), Some(&Value::from("x")));
        assert_eq!(get(&t, "top"), Some(&Value::Bool(true)));
    }

    #[test]
    fn test_set_overwrites_terminal() {
        let mut t = tree(json!({"a": {"b": 1}}));
        set(&mut t, "a.b", Value::from(2)).unwrap();
        assert_eq!(get(&t, "a.b"), Some(&Value::Int(2)));
        // A terminal assignment may replace a whole subtree.
        set(&mut t, "a", Value::from("flat")).unwrap();
        assert_eq!(get(&t, "a"), Some(&Value::from("flat")));
    }

    #[test]
    fn test_set_through_leaf_conflicts() {
        let mut t = Map::new();
        set(&mut t, "a.b", Value::from(1)).unwrap();
        let err = set(&mut t, "a.b.c", Value::from(2)).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::PathConflict { ref segment, found: ValueKind::Int, .. } if segment == "b"
        ));
        // Tree is untouched by the failed write.
        assert_eq!(get(&t, "a.b"), Some(&Value::Int(1)));
    }

    #[test]
    fn test_set_into_sequence() {
        let mut t = tree(json!({"workers": [{"name": "a"}, {"name": "b"}]}));
        set(&mut t, "workers.1.name", Value::from("z")).unwrap();
        set(&mut t, "workers.0.port", Value::from(1)).unwrap();
        assert_eq!(get(&t, "workers.1.name"), Some(&Value::from("z")));
        assert_eq!(get(&t, "workers.0.port"), Some(&Value::Int(1)));

        let err = set(&mut t, "workers.2.name", Value::from("c")).unwrap_err();
        assert!(matches!(err, ConfigError::IndexOutOfRange { index: 2, len: 2, .. }));
        let err = set(&mut t, "workers.first.name", Value::from("c")).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPath { .. }));
    }

    #[test]
    fn test_set_replaces_null_intermediate() {
        let mut t = tree(json!({"a": null}));
        set(&mut t, "a.b", Value::from(1)).unwrap();
        assert_eq!(get(&t, "a.b"), Some(&Value::Int(1)));
    }

    #[test]
    fn test_set_rejects_bad_paths() {
        let mut t = Map::new();
        assert!(matches!(set(&mut t, "", Value::Null), Err(ConfigError::InvalidPath { .. })));
        assert!(matches!(
            set_if_empty(&mut t, "a..b", Value::Null),
            Err(ConfigError::InvalidPath { .. })
        ));
        assert!(t.is_empty());
    }

    #[test]
    fn test_set_if_empty_never_clobbers() {
        let mut t = tree(json!({"server": {"port": 8080, "tls": null}}));
        assert!(!set_if_empty(&mut t, "server.port", Value::from(1)).unwrap());
        assert!(set_if_empty(&mut t, "server.host", Value::from("localhost")).unwrap());
        assert!(set_if_empty(&mut t, "server.tls", Value::from(false)).unwrap());
        assert!(set_if_empty(&mut t, "log.level", Value::from("info")).unwrap());
        assert!(!set_if_empty(&mut t, "log.level", Value::from("debug")).unwrap());

        assert_eq!(get(&t, "server.port"), Some(&Value::Int(8080)));
        assert_eq!(get(&t, "server.host"), Some(&Value::from("localhost")));
        assert_eq!(get(&t, "server.tls"), Some(&Value::Bool(false)));
        assert_eq!(get(&t, "log.level"), Some(&Value::from("info")));
    }

    #[test]
    fn test_set_if_empty_conflict() {
        let mut t = tree(json!({"server": "inline"}));
        assert!(matches!(
            set_if_empty(&mut t, "server.port", Value::from(1)),
            Err(ConfigError::PathConflict { .. })
        ));
    }

    #[test]
    fn test_walk_visits_leaves() {
        let t = tree(json!({"a": {"b": 1, "c": {"d": "x"}}, "list": [1, 2]}));
        let mut seen = Vec::new();
        walk(&t, "", &mut |path, value| seen.push((path.to_string(), value.kind())));
        assert_eq!(
            seen,
            vec![
                ("a.b".to_string(), ValueKind::Int),
                ("a.c.d".to_string(), ValueKind::String),
                ("list".to_string(), ValueKind::Seq),
            ]
        );
    }

    #[test]
    fn test_parse_index() {
        assert_eq!(parse_index("0"), Some(0));
        assert_eq!(parse_index("12"), Some(12));
        assert_eq!(parse_index("+1"), None);
        assert_eq!(parse_index("-1"), None);
        assert_eq!(parse_index("a"), None);
    }
}
