//! Schema tree helpers
//!
//! The schema tree is carried as a `serde_json::Value` document:
//! containers are objects, and a keyed list segment `name[k=v]` is an array
//! under `name` whose element objects carry the key leaves. These helpers
//! resolve a [`SchemaPath`] against such a document.

use serde_json::{Map, Value as JsonValue};
use std::collections::BTreeMap;

use crate::error::{XfmrError, XfmrResult};
use crate::path::{PathSegment, SchemaPath};

/// Render a scalar leaf as a string
///
/// Returns `None` for objects, arrays and null.
pub fn scalar_to_string(value: &JsonValue) -> Option<String> {
    match value {
        JsonValue::String(s) => Some(s.clone()),
        JsonValue::Bool(b) => Some(b.to_string()),
        JsonValue::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn entry_matches(entry: &JsonValue, keys: &[(String, String)]) -> bool {
    keys.iter().all(|(k, v)| {
        entry
            .get(k)
            .and_then(scalar_to_string)
            .map_or(false, |s| s == *v)
    })
}

/// Resolve a path to a node
pub fn node<'a>(root: &'a JsonValue, path: &SchemaPath) -> Option<&'a JsonValue> {
    let mut cur = root;
    for seg in path.segments() {
        let child = cur.as_object()?.get(&seg.name)?;
        cur = if seg.keys.is_empty() {
            child
        } else {
            child
                .as_array()?
                .iter()
                .find(|e| entry_matches(e, &seg.keys))?
        };
    }
    Some(cur)
}

fn lookup_mut<'a>(root: &'a mut JsonValue, segments: &[PathSegment]) -> Option<&'a mut JsonValue> {
    let mut cur = root;
    for seg in segments {
        let child = match cur {
            JsonValue::Object(map) => map.get_mut(&seg.name)?,
            _ => return None,
        };
        cur = if seg.keys.is_empty() {
            child
        } else {
            match child {
                JsonValue::Array(arr) => arr.iter_mut().find(|e| entry_matches(e, &seg.keys))?,
                _ => return None,
            }
        };
    }
    Some(cur)
}

/// Resolve a path to a container, creating containers and list entries
///
/// New list entries are seeded with their key leaves.
///
/// # Errors
///
/// Returns a translation error when an existing node on the way is not a
/// container (or not a list for a keyed segment).
pub fn node_mut<'a>(
    root: &'a mut JsonValue,
    path: &SchemaPath,
) -> XfmrResult<&'a mut Map<String, JsonValue>> {
    let not_container =
        |name: &str| XfmrError::translation(path.to_string(), format!("'{}' is not a container", name));

    if root.is_null() {
        *root = JsonValue::Object(Map::new());
    }
    let mut cur = root;
    for seg in path.segments() {
        let obj = match cur {
            JsonValue::Object(map) => map,
            _ => return Err(not_container(&seg.name)),
        };
        if seg.keys.is_empty() {
            let child = obj
                .entry(seg.name.clone())
                .or_insert_with(|| JsonValue::Object(Map::new()));
            if child.is_null() {
                *child = JsonValue::Object(Map::new());
            }
            cur = child;
        } else {
            let list = obj
                .entry(seg.name.clone())
                .or_insert_with(|| JsonValue::Array(Vec::new()));
            let arr = match list {
                JsonValue::Array(arr) => arr,
                _ => return Err(not_container(&seg.name)),
            };
            let idx = match arr.iter().position(|e| entry_matches(e, &seg.keys)) {
                Some(idx) => idx,
                None => {
                    let mut entry = Map::new();
                    for (k, v) in &seg.keys {
                        entry.insert(k.clone(), JsonValue::String(v.clone()));
                    }
                    arr.push(JsonValue::Object(entry));
                    arr.len() - 1
                }
            };
            cur = &mut arr[idx];
        }
    }
    match cur {
        JsonValue::Object(map) => Ok(map),
        _ => Err(not_container(&path.template())),
    }
}

/// Write leaves into the container at `path`
pub fn set_leaves(
    root: &mut JsonValue,
    path: &SchemaPath,
    leaves: BTreeMap<String, JsonValue>,
) -> XfmrResult<()> {
    let container = node_mut(root, path)?;
    for (name, value) in leaves {
        container.insert(name, value);
    }
    Ok(())
}

/// Remove the node at `path`
///
/// Returns true when something was removed. Removing the root empties it.
pub fn remove_node(root: &mut JsonValue, path: &SchemaPath) -> bool {
    let Some(last) = path.last() else {
        let had_content = match root {
            JsonValue::Object(map) => !map.is_empty(),
            JsonValue::Null => false,
            _ => true,
        };
        *root = JsonValue::Object(Map::new());
        return had_content;
    };
    let parent_segments = &path.segments()[..path.depth() - 1];
    let Some(JsonValue::Object(parent)) = lookup_mut(root, parent_segments) else {
        return false;
    };
    if last.keys.is_empty() {
        return parent.remove(&last.name).is_some();
    }
    match parent.get_mut(&last.name) {
        Some(JsonValue::Array(arr)) => {
            let before = arr.len();
            arr.retain(|e| !entry_matches(e, &last.keys));
            arr.len() != before
        }
        _ => false,
    }
}

/// Scalar children of a container, stringified
pub fn leaves(node: &JsonValue) -> BTreeMap<String, String> {
    node.as_object()
        .map(|map| {
            map.iter()
                .filter_map(|(k, v)| scalar_to_string(v).map(|s| (k.clone(), s)))
                .collect()
        })
        .unwrap_or_default()
}
