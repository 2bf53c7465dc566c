// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Safe traversal of unstructured Kubernetes objects.
//!
//! Custom resources without generated types are handled as `serde_json::Value`
//! trees. Every accessor here returns a [`ShapeError`] when the tree does not
//! have the expected shape, so a schema change between CR versions fails the
//! current case instead of aborting the process.

use crate::errors::ShapeError;
use serde_json::{Map, Value};

fn dotted(path: &[&str]) -> String {
    path.join(".")
}

/// JSON type name of a value, for error messages.
#[must_use]
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Value at `path`, or `None` when any segment is absent or null.
#[must_use]
pub fn get_opt<'a>(obj: &'a Value, path: &[&str]) -> Option<&'a Value> {
    let mut current = obj;
    for segment in path {
        current = current.as_object()?.get(*segment)?;
    }
    if current.is_null() {
        None
    } else {
        Some(current)
    }
}

/// Value at `path`.
///
/// # Errors
///
/// Returns [`ShapeError::Missing`] when a segment is absent, or
/// [`ShapeError::WrongType`] when an intermediate value is not an object.
pub fn get_path<'a>(obj: &'a Value, path: &[&str]) -> Result<&'a Value, ShapeError> {
    let mut current = obj;
    for (depth, segment) in path.iter().enumerate() {
        let map = current.as_object().ok_or_else(|| ShapeError::WrongType {
            path: dotted(&path[..depth]),
            expected: "object",
            found: json_type_name(current),
        })?;
        current = map
            .get(*segment)
            .filter(|v| !v.is_null())
            .ok_or_else(|| ShapeError::Missing {
                path: dotted(&path[..=depth]),
            })?;
    }
    Ok(current)
}

/// String at `path`.
///
/// # Errors
///
/// Returns a [`ShapeError`] when the path is missing or not a string.
pub fn get_str<'a>(obj: &'a Value, path: &[&str]) -> Result<&'a str, ShapeError> {
    let value = get_path(obj, path)?;
    value.as_str().ok_or_else(|| ShapeError::WrongType {
        path: dotted(path),
        expected: "string",
        found: json_type_name(value),
    })
}

/// Boolean at `path`.
///
/// # Errors
///
/// Returns a [`ShapeError`] when the path is missing or not a bool.
pub fn get_bool(obj: &Value, path: &[&str]) -> Result<bool, ShapeError> {
    let value = get_path(obj, path)?;
    value.as_bool().ok_or_else(|| ShapeError::WrongType {
        path: dotted(path),
        expected: "bool",
        found: json_type_name(value),
    })
}

/// Integer at `path`.
///
/// # Errors
///
/// Returns a [`ShapeError`] when the path is missing or not an integer.
pub fn get_i64(obj: &Value, path: &[&str]) -> Result<i64, ShapeError> {
    let value = get_path(obj, path)?;
    value.as_i64().ok_or_else(|| ShapeError::WrongType {
        path: dotted(path),
        expected: "integer",
        found: json_type_name(value),
    })
}

/// Object at `path`.
///
/// # Errors
///
/// Returns a [`ShapeError`] when the path is missing or not an object.
pub fn get_object<'a>(obj: &'a Value, path: &[&str]) -> Result<&'a Map<String, Value>, ShapeError> {
    let value = get_path(obj, path)?;
    value.as_object().ok_or_else(|| ShapeError::WrongType {
        path: dotted(path),
        expected: "object",
        found: json_type_name(value),
    })
}

/// Array at `path`.
///
/// # Errors
///
/// Returns a [`ShapeError`] when the path is missing or not an array.
pub fn get_array<'a>(obj: &'a Value, path: &[&str]) -> Result<&'a Vec<Value>, ShapeError> {
    let value = get_path(obj, path)?;
    value.as_array().ok_or_else(|| ShapeError::WrongType {
        path: dotted(path),
        expected: "array",
        found: json_type_name(value),
    })
}

/// Set `value` at `path`, creating missing or null intermediate objects.
///
/// # Errors
///
/// Returns [`ShapeError::WrongType`] when an intermediate value exists and is
/// not an object, or [`ShapeError::Missing`] for an empty path.
pub fn set_path(obj: &mut Value, path: &[&str], value: Value) -> Result<(), ShapeError> {
    let (last, parents) = path.split_last().ok_or_else(|| ShapeError::Missing {
        path: String::new(),
    })?;

    let mut current = obj;
    for (depth, segment) in parents.iter().enumerate() {
        if current.is_null() {
            *current = Value::Object(Map::new());
        }
        let found = json_type_name(current);
        let map = current.as_object_mut().ok_or_else(|| ShapeError::WrongType {
            path: dotted(&path[..depth]),
            expected: "object",
            found,
        })?;
        current = map
            .entry((*segment).to_string())
            .or_insert_with(|| Value::Object(Map::new()));
    }

    if current.is_null() {
        *current = Value::Object(Map::new());
    }
    let found = json_type_name(current);
    let map = current.as_object_mut().ok_or_else(|| ShapeError::WrongType {
        path: dotted(parents),
        expected: "object",
        found,
    })?;
    map.insert((*last).to_string(), value);
    Ok(())
}

/// Returns true if `status.conditions[]` has an entry whose `type` equals `condition_type`.
#[must_use]
pub fn status_contains_condition_type(obj: &Value, condition_type: &str) -> bool {
    get_opt(obj, &["status", "conditions"])
        .and_then(Value::as_array)
        .is_some_and(|conditions| {
            conditions
                .iter()
                .any(|c| c.get("type").and_then(Value::as_str) == Some(condition_type))
        })
}

/// Message of the first entry in `status.conditions[]`.
///
/// # Errors
///
/// Returns a [`ShapeError`] when there is no condition or it has no message.
pub fn first_condition_message(obj: &Value) -> Result<&str, ShapeError> {
    let conditions = get_array(obj, &["status", "conditions"])?;
    let first = conditions.first().ok_or_else(|| ShapeError::Missing {
        path: "status.conditions[0]".to_string(),
    })?;
    get_str(first, &["message"]).map_err(|_| ShapeError::Missing {
        path: "status.conditions[0].message".to_string(),
    })
}
