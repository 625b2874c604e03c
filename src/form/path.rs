//! Dot-separated path addressing into a JSON object tree.
//!
//! `"theme.headerBg"` reads `root["theme"]["headerBg"]`. Writes create any
//! missing (or `null`) intermediate objects on the way down.

use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    #[error("empty field path")]
    Empty,
    #[error("'{0}' is not an object")]
    NotAnObject(String),
}

/// Read the value at `path`, if every segment exists.
pub fn get<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.')
        .try_fold(root, |node, segment| node.as_object()?.get(segment))
}

/// Write `value` at `path`, creating intermediate objects as needed.
///
/// Fails without mutating anything when a segment is empty or when an
/// existing intermediate node is a scalar or array.
pub fn set(root: &mut Value, path: &str, value: Value) -> Result<(), PathError> {
    let segments: Vec<&str> = path.split('.').collect();
    if segments.iter().any(|s| s.is_empty()) {
        return Err(PathError::Empty);
    }
    check_writable(root, &segments)?;

    let (leaf, parents) = segments.split_last().ok_or(PathError::Empty)?;
    if root.is_null() {
        *root = Value::Object(Map::new());
    }
    let mut node = root;
    for segment in parents {
        let obj = node
            .as_object_mut()
            .ok_or_else(|| PathError::NotAnObject(segment.to_string()))?;
        let child = obj
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if child.is_null() {
            *child = Value::Object(Map::new());
        }
        node = child;
    }

    node.as_object_mut()
        .ok_or_else(|| PathError::NotAnObject(parents.join(".")))?
        .insert(leaf.to_string(), value);
    Ok(())
}

/// Remove the leaf at `path`, returning it. Missing paths are a no-op.
pub fn remove(root: &mut Value, path: &str) -> Option<Value> {
    let (parent, leaf) = match path.rsplit_once('.') {
        Some((parent, leaf)) => (get_mut(root, parent)?, leaf),
        None => (root, path),
    };
    parent.as_object_mut()?.remove(leaf)
}

fn get_mut<'a>(root: &'a mut Value, path: &str) -> Option<&'a mut Value> {
    path.split('.')
        .try_fold(root, |node, segment| node.as_object_mut()?.get_mut(segment))
}

/// Walk the existing prefix of `segments` and make sure every node that
/// would be descended into is an object (or missing/null, and so creatable).
fn check_writable(root: &Value, segments: &[&str]) -> Result<(), PathError> {
    let mut node = Some(root);
    for (depth, segment) in segments.iter().enumerate() {
        match node {
            None | Some(Value::Null) => return Ok(()),
            Some(Value::Object(obj)) => node = obj.get(*segment),
            Some(_) => {
                let prefix = if depth == 0 {
                    "<root>".to_string()
                } else {
                    segments[..depth].join(".")
                };
                return Err(PathError::NotAnObject(prefix));
            }
        }
    }
    Ok(())
}
