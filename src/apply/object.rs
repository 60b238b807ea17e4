//! # Object Accessors
//!
//! Typed access to the untyped body of a `DynamicObject`.
//!
//! Every reader returns `Ok(None)` when a segment of the path is missing or
//! null, and a [`MergeError`] when a value exists but has the wrong shape.
//! The generic representation stays at the engine boundary; strategies only
//! see strings, string lists and lists through these helpers.

use super::error::MergeError;
use kube::api::DynamicObject;
use serde_json::{Map, Value};

/// API group and kind of an object, derived from its `apiVersion` and `kind`
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GroupKind {
    pub group: String,
    pub kind: String,
}

impl GroupKind {
    #[must_use]
    pub fn of(obj: &DynamicObject) -> Self {
        obj.types
            .as_ref()
            .map(|types| Self {
                group: api_group(&types.api_version).to_string(),
                kind: types.kind.clone(),
            })
            .unwrap_or_default()
    }

    #[must_use]
    pub fn is(&self, group: &str, kind: &str) -> bool {
        self.group == group && self.kind == kind
    }
}

/// Group part of an `apiVersion` (`apps/v1` -> `apps`, core `v1` -> ``)
#[must_use]
pub fn api_group(api_version: &str) -> &str {
    api_version.split_once('/').map_or("", |(group, _)| group)
}

/// `namespace/name` (or just `name`) for log and error messages
#[must_use]
pub fn display_name(obj: &DynamicObject) -> String {
    let name = obj.metadata.name.as_deref().unwrap_or("<unnamed>");
    match obj.metadata.namespace.as_deref() {
        Some(namespace) => format!("{namespace}/{name}"),
        None => name.to_string(),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn join_path(path: &[&str]) -> String {
    path.join(".")
}

fn nested_field<'a>(obj: &'a Value, path: &[&str]) -> Result<Option<&'a Value>, MergeError> {
    let mut current = obj;
    for (i, field) in path.iter().enumerate() {
        current = match current {
            Value::Null => return Ok(None),
            Value::Object(map) => match map.get(*field) {
                Some(value) => value,
                None => return Ok(None),
            },
            other => {
                return Err(MergeError::NotAnObject {
                    path: join_path(path),
                    segment: join_path(&path[..i]),
                    found: type_name(other),
                })
            }
        };
    }
    Ok((!current.is_null()).then_some(current))
}

pub fn nested_string(obj: &Value, path: &[&str]) -> Result<Option<String>, MergeError> {
    match nested_field(obj, path)? {
        None => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(other) => Err(MergeError::FieldType {
            path: join_path(path),
            expected: "string",
            found: type_name(other),
        }),
    }
}

pub fn nested_slice(obj: &Value, path: &[&str]) -> Result<Option<Vec<Value>>, MergeError> {
    match nested_field(obj, path)? {
        None => Ok(None),
        Some(Value::Array(items)) => Ok(Some(items.clone())),
        Some(other) => Err(MergeError::FieldType {
            path: join_path(path),
            expected: "array",
            found: type_name(other),
        }),
    }
}

pub fn nested_string_slice(obj: &Value, path: &[&str]) -> Result<Option<Vec<String>>, MergeError> {
    let Some(items) = nested_slice(obj, path)? else {
        return Ok(None);
    };
    items
        .into_iter()
        .map(|item| match item {
            Value::String(s) => Ok(s),
            other => Err(MergeError::FieldType {
                path: format!("{}[]", join_path(path)),
                expected: "string",
                found: type_name(&other),
            }),
        })
        .collect::<Result<Vec<_>, _>>()
        .map(Some)
}

/// Set `value` at `path`, creating missing (or null) intermediate objects.
/// Fails without writing anything if an intermediate value is not an object.
pub fn set_nested_field(obj: &mut Value, value: Value, path: &[&str]) -> Result<(), MergeError> {
    let (last, parents) = path.split_last().ok_or(MergeError::EmptyPath)?;

    // Validate the whole path first so a failed write leaves `obj` untouched
    let mut probe: Option<&Value> = Some(&*obj);
    for (i, field) in parents.iter().enumerate() {
        probe = match probe {
            None | Some(Value::Null) => None,
            Some(Value::Object(map)) => map.get(*field),
            Some(other) => {
                return Err(MergeError::NotAnObject {
                    path: join_path(path),
                    segment: join_path(&path[..i]),
                    found: type_name(other),
                })
            }
        };
    }
    if let Some(other) = probe.filter(|v| !v.is_null() && !v.is_object()) {
        return Err(MergeError::NotAnObject {
            path: join_path(path),
            segment: join_path(parents),
            found: type_name(other),
        });
    }

    let mut current = obj;
    for field in parents {
        if current.is_null() {
            *current = Value::Object(Map::new());
        }
        current = match current {
            Value::Object(map) => map.entry((*field).to_string()).or_insert(Value::Null),
            // ruled out by the probe above
            other => {
                return Err(MergeError::NotAnObject {
                    path: join_path(path),
                    segment: (*field).to_string(),
                    found: type_name(other),
                })
            }
        };
    }
    if current.is_null() {
        *current = Value::Object(Map::new());
    }
    if let Value::Object(map) = current {
        map.insert((*last).to_string(), value);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_api_group() {
        assert_eq!(api_group("apps/v1"), "apps");
        assert_eq!(api_group("v1"), "");
        assert_eq!(api_group("metallb.io/v1alpha1"), "metallb.io");
    }

    #[test]
    fn test_nested_string_found_and_missing() {
        let obj = json!({"spec": {"clusterIP": "10.0.0.5"}});
        assert_eq!(
            nested_string(&obj, &["spec", "clusterIP"]).unwrap(),
            Some("10.0.0.5".to_string())
        );
        assert_eq!(nested_string(&obj, &["spec", "ipFamilyPolicy"]).unwrap(), None);
        assert_eq!(nested_string(&obj, &["status", "loadBalancer"]).unwrap(), None);
    }

    #[test]
    fn test_nested_string_null_is_missing() {
        let obj = json!({"spec": null});
        assert_eq!(nested_string(&obj, &["spec", "clusterIP"]).unwrap(), None);
    }

    #[test]
    fn test_nested_string_type_mismatch() {
        let obj = json!({"spec": {"clusterIP": 42}});
        let err = nested_string(&obj, &["spec", "clusterIP"]).unwrap_err();
        assert!(matches!(
            err,
            MergeError::FieldType {
                expected: "string",
                found: "number",
                ..
            }
        ));
    }

    #[test]
    fn test_nested_read_through_non_object() {
        let obj = json!({"spec": "oops"});
        let err = nested_string(&obj, &["spec", "clusterIP"]).unwrap_err();
        assert!(matches!(err, MergeError::NotAnObject { found: "string", .. }));
    }

    #[test]
    fn test_nested_string_slice_rejects_non_string_items() {
        let obj = json!({"spec": {"ipFamilies": ["IPv4", 6]}});
        assert!(nested_string_slice(&obj, &["spec", "ipFamilies"]).is_err());
    }

    #[test]
    fn test_set_nested_field_creates_parents() {
        let mut obj = json!({});
        set_nested_field(&mut obj, json!("10.0.0.5"), &["spec", "clusterIP"]).unwrap();
        assert_eq!(obj, json!({"spec": {"clusterIP": "10.0.0.5"}}));
    }

    #[test]
    fn test_set_nested_field_replaces_null_parent() {
        let mut obj = json!({"spec": null});
        set_nested_field(&mut obj, json!(["10.0.0.5"]), &["spec", "clusterIPs"]).unwrap();
        assert_eq!(obj, json!({"spec": {"clusterIPs": ["10.0.0.5"]}}));
    }

    #[test]
    fn test_set_nested_field_rejects_non_object_parent_without_writing() {
        let mut obj = json!({"spec": {"ports": []}});
        let before = obj.clone();
        let err = set_nested_field(&mut obj, json!(1), &["spec", "ports", "port"]).unwrap_err();
        assert!(matches!(err, MergeError::NotAnObject { found: "array", .. }));
        assert_eq!(obj, before);
    }

    #[test]
    fn test_set_nested_field_empty_path() {
        let mut obj = json!({});
        assert!(matches!(
            set_nested_field(&mut obj, json!(1), &[]),
            Err(MergeError::EmptyPath)
        ));
    }
}
