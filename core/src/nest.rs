//! Conversion between flat dotted-path mappings and nested mappings.
//!
//! [`nest`] is the inverse of the naming scheme used by the walker: for any
//! nested mapping whose keys never collide, `nest(&flatten(&n)) == n`.
//!
//! Collisions (the same segment used both as a leaf and as a parent, e.g.
//! `a` and `a.b`) are resolved by overwriting: keys are processed in sorted
//! order and the later assignment replaces whatever sits at that segment.
//! This behavior is not part of the round-trip guarantee.

use std::collections::BTreeMap;

use serde_json::{Map, Value};
use tracing::warn;

use crate::path::PATH_SEPARATOR;

/// Dotted path to leaf value, as produced by the flag engine.
pub type FlatMapping = BTreeMap<String, Value>;

/// Field name to leaf value or nested object.
pub type NestedMapping = Map<String, Value>;

/// Splits each key on `.` and builds the nested structure.
///
/// # Examples
///
/// ```
/// use record_args_core::{FlatMapping, nest};
/// use serde_json::json;
///
/// let flat: FlatMapping = [
///     ("a.b.c".to_string(), json!(1)),
///     ("a.b.d".to_string(), json!(2)),
///     ("a.a".to_string(), json!(3)),
///     ("b".to_string(), json!(4)),
/// ]
/// .into_iter()
/// .collect();
///
/// let nested = nest(&flat);
/// assert_eq!(
///     serde_json::Value::Object(nested),
///     json!({ "a": { "b": { "c": 1, "d": 2 }, "a": 3 }, "b": 4 })
/// );
/// ```
pub fn nest(flat: &FlatMapping) -> NestedMapping {
    let mut root = NestedMapping::new();

    for (key, value) in flat {
        let mut parts: Vec<&str> = key.split(PATH_SEPARATOR).collect();
        let leaf = parts.pop().unwrap_or_default();

        let mut level = &mut root;
        for part in parts {
            let slot = level
                .entry(part.to_string())
                .or_insert_with(|| Value::Object(NestedMapping::new()));
            if !slot.is_object() {
                warn!(key = %key, segment = part, "dotted key replaces a scalar with a mapping");
                *slot = Value::Object(NestedMapping::new());
            }
            level = match slot {
                Value::Object(map) => map,
                _ => unreachable!("slot was just made an object"),
            };
        }

        if level.get(leaf).is_some_and(Value::is_object) {
            warn!(key = %key, "dotted key replaces a mapping with a scalar");
        }
        level.insert(leaf.to_string(), value.clone());
    }

    root
}

/// Joins nested keys with `.`, producing one entry per non-object leaf.
///
/// Empty nested objects produce no entries.
///
/// # Examples
///
/// ```
/// use record_args_core::flatten;
/// use serde_json::json;
///
/// let nested = json!({ "model": { "num_layers": 3 }, "lr": 0.001 });
/// let flat = flatten(nested.as_object().unwrap());
/// assert_eq!(flat.get("model.num_layers"), Some(&json!(3)));
/// assert_eq!(flat.get("lr"), Some(&json!(0.001)));
/// assert_eq!(flat.len(), 2);
/// ```
pub fn flatten(nested: &NestedMapping) -> FlatMapping {
    let mut flat = FlatMapping::new();
    flatten_into(nested, None, &mut flat);
    flat
}

fn flatten_into(nested: &NestedMapping, prefix: Option<&str>, out: &mut FlatMapping) {
    for (key, value) in nested {
        let path = match prefix {
            Some(prefix) => format!("{prefix}{PATH_SEPARATOR}{key}"),
            None => key.clone(),
        };
        match value {
            Value::Object(child) => flatten_into(child, Some(&path), out),
            leaf => {
                out.insert(path, leaf.clone());
            }
        }
    }
}
