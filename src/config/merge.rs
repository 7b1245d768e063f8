//! Deep merge of configuration trees.
//!
//! Used to lay override data over file data when the merged view is built.
//! Mappings merge key by key; sequences and scalars are replaced entirely.
//!
//! Overrides written beneath a sequence (`workers.0.name`) are stored as a
//! mapping keyed by index, since the override tree starts out empty. Such a
//! mapping patches the base sequence element by element instead of replacing it.

use crate::tree::parse_index;
use crate::types::{Map, Value};
use tracing::warn;

/// Deep merge two values, with `overlay` taking precedence over `base`.
///
/// - Mappings are merged recursively: keys in overlay override keys in base
/// - Sequences, strings, numbers, booleans are replaced entirely
/// - If overlay is null, the base value is preserved (null means "not specified")
pub fn deep_merge(base: Value, overlay: Value) -> Value {
    match (base, overlay) {
        (Value::Map(base_map), Value::Map(overlay_map)) => Value::Map(merge_maps(base_map, overlay_map)),
        (Value::Seq(items), Value::Map(patch)) if is_index_patch(&patch) => {
            Value::Seq(patch_sequence(items, patch))
        }
        (base, Value::Null) => base,
        (_, overlay) => overlay,
    }
}

fn is_index_patch(patch: &Map) -> bool {
    !patch.is_empty() && patch.keys().all(|key| parse_index(key).is_some())
}

/// Apply index-keyed entries to a sequence in ascending index order.
///
/// An index one past the end appends; anything further out is skipped.
fn patch_sequence(mut items: Vec<Value>, patch: Map) -> Vec<Value> {
    let mut entries: Vec<(usize, Value)> = patch
        .into_iter()
        .filter_map(|(key, value)| Some((parse_index(&key)?, value)))
        .collect();
    entries.sort_by_key(|(index, _)| *index);

    for (index, value) in entries {
        if let Some(slot) = items.get_mut(index) {
            let base = std::mem::take(slot);
            *slot = deep_merge(base, value);
        } else if index == items.len() {
            items.push(value);
        } else {
            warn!(index, len = items.len(), "Skipping override past the end of a sequence");
        }
    }
    items
}

/// Merge two mappings, with `overlay` taking precedence.
pub fn merge_maps(mut base: Map, overlay: Map) -> Map {
    for (key, overlay_value) in overlay {
        let merged_value = match base.remove(&key) {
            Some(base_value) => deep_merge(base_value, overlay_value),
            None => overlay_value,
        };
        base.insert(key, merged_value);
    }
    base
}
