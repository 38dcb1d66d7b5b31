//! Structural diff between two value trees.
//!
//! Output order: for objects, keys that exist only in the old tree are
//! removed first (in the old tree's key order), then the new tree's keys are
//! visited in its insertion order, adding missing keys and recursing into
//! shared keys whose values differ. Arrays are never diffed positionally; a
//! changed array is replaced whole.

use serde_json::{Map, Value};

use crate::json_patch::types::{Op, Patch};
use crate::value::deep_equal;

/// Compute the operations that turn `old` into `new`.
pub fn diff(old: &Value, new: &Value) -> Patch {
    let mut ops = Vec::new();
    let mut path = Vec::new();
    diff_value(&mut path, old, new, &mut ops);
    ops
}

/// Same as [`diff`]; kept under the name JSON Patch tooling uses.
pub fn make_patch(old: &Value, new: &Value) -> Patch {
    diff(old, new)
}

fn diff_value(path: &mut Vec<String>, old: &Value, new: &Value, ops: &mut Patch) {
    match (old, new) {
        (Value::Object(old), Value::Object(new)) => diff_object(path, old, new, ops),
        _ if deep_equal(old, new) => {}
        _ => ops.push(Op::Replace {
            path: path.clone(),
            value: new.clone(),
        }),
    }
}

fn diff_object(
    path: &mut Vec<String>,
    old: &Map<String, Value>,
    new: &Map<String, Value>,
    ops: &mut Patch,
) {
    for key in old.keys().filter(|k| !new.contains_key(*k)) {
        ops.push(Op::Remove {
            path: child(path, key),
        });
    }
    for (key, new_val) in new {
        match old.get(key) {
            None => ops.push(Op::Add {
                path: child(path, key),
                value: new_val.clone(),
            }),
            Some(old_val) => {
                path.push(key.clone());
                diff_value(path, old_val, new_val, ops);
                path.pop();
            }
        }
    }
}

fn child(path: &[String], key: &str) -> Vec<String> {
    let mut out = path.to_vec();
    out.push(key.to_string());
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::json_patch::{apply, to_json_patch};
    use serde_json::json;

    #[test]
    fn equal_values_have_empty_diff() {
        let v = json!({"hp": 10, "inv": ["rope"], "stats": {"str": 12}});
        assert!(diff(&v, &v).is_empty());
        assert!(diff(&json!({"a": 1, "b": 2}), &json!({"b": 2, "a": 1})).is_empty());
    }

    #[test]
    fn replace_then_add_in_new_key_order() {
        let ops = diff(&json!({"hp": 10}), &json!({"hp": 12, "name": "Bob"}));
        assert_eq!(
            to_json_patch(&ops),
            json!([
                {"op": "replace", "path": "/hp", "value": 12},
                {"op": "add", "path": "/name", "value": "Bob"},
            ])
        );
    }

    #[test]
    fn removals_come_first() {
        let ops = diff(&json!({"a": 1, "b": 2}), &json!({"c": 3, "b": 4}));
        assert_eq!(
            to_json_patch(&ops),
            json!([
                {"op": "remove", "path": "/a"},
                {"op": "add", "path": "/c", "value": 3},
                {"op": "replace", "path": "/b", "value": 4},
            ])
        );
    }

    #[test]
    fn nested_objects_recurse() {
        let ops = diff(
            &json!({"stats": {"hp": 10, "mp": 3}}),
            &json!({"stats": {"hp": 11, "mp": 3}}),
        );
        assert_eq!(
            to_json_patch(&ops),
            json!([{"op": "replace", "path": "/stats/hp", "value": 11}])
        );
    }

    #[test]
    fn arrays_are_replaced_whole() {
        let ops = diff(
            &json!({"inv": [{"n": "rope"}, {"n": "torch"}]}),
            &json!({"inv": [{"n": "rope"}, {"n": "lamp"}]}),
        );
        assert_eq!(
            to_json_patch(&ops),
            json!([{"op": "replace", "path": "/inv", "value": [{"n": "rope"}, {"n": "lamp"}]}])
        );
    }

    #[test]
    fn kind_change_is_replace() {
        let ops = diff(&json!({"a": {"b": 1}}), &json!({"a": [1]}));
        assert_eq!(
            to_json_patch(&ops),
            json!([{"op": "replace", "path": "/a", "value": [1]}])
        );
        let ops = diff(&json!({}), &json!(5));
        assert_eq!(to_json_patch(&ops), json!([{"op": "replace", "path": "", "value": 5}]));
    }

    #[test]
    fn keys_needing_escapes() {
        let old = json!({});
        let new = json!({"a/b": {"~": 1}});
        let ops = diff(&old, &new);
        assert_eq!(
            to_json_patch(&ops),
            json!([{"op": "add", "path": "/a~1b", "value": {"~": 1}}])
        );
        assert_eq!(apply(&old, &ops).unwrap(), new);
    }

    #[test]
    fn diff_is_deterministic() {
        let old = json!({"z": 1, "a": {"x": [1], "y": null}, "m": "s"});
        let new = json!({"a": {"y": false, "w": 2}, "q": 1, "z": 2});
        assert_eq!(diff(&old, &new), diff(&old, &new));
        assert_eq!(apply(&old, &diff(&old, &new)).unwrap(), new);
    }
}
