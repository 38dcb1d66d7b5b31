//! Value model for sheet field values and template layouts.
//!
//! Values are plain [`serde_json::Value`] trees built with `preserve_order`,
//! so object keys keep their insertion order and diffs come out stable.
//! The public functions here never mutate their input; the `*_in_place`
//! helpers are what the patch engine uses on its private working copy.

use serde_json::{Map, Value};

pub use charsheet_json_equal::{deep_equal, key_order_equal};
pub use charsheet_json_pointer::{format_json_pointer, parse_json_pointer, Path};

use crate::json_patch::PatchError;

/// The empty object every document history starts from.
pub fn empty_object() -> Value {
    Value::Object(Map::new())
}

/// Returns the value at `path`, or `None` if any step is missing.
pub fn get<'a>(tree: &'a Value, path: &[String]) -> Option<&'a Value> {
    charsheet_json_pointer::get(tree, path)
}

/// Returns a copy of `tree` with `value` stored at `path`.
///
/// Object keys are created or overwritten; array tokens insert (`-` appends).
pub fn set(tree: &Value, path: &[String], value: Value) -> Result<Value, PatchError> {
    let mut out = tree.clone();
    add_in_place(&mut out, path, value)?;
    Ok(out)
}

/// Returns a copy of `tree` without the value at `path`.
pub fn remove(tree: &Value, path: &[String]) -> Result<Value, PatchError> {
    let mut out = tree.clone();
    remove_in_place(&mut out, path)?;
    Ok(out)
}

/// Walks to the container that holds the last token of `path`.
fn parent_mut<'a>(doc: &'a mut Value, path: &[String]) -> Result<&'a mut Value, PatchError> {
    let mut node = doc;
    for (depth, token) in path[..path.len() - 1].iter().enumerate() {
        let here = &path[..=depth];
        node = match node {
            Value::Object(map) => map
                .get_mut(token)
                .ok_or_else(|| PatchError::PathNotFound(format_json_pointer(here)))?,
            Value::Array(items) => {
                let idx = index(token, here)?;
                items
                    .get_mut(idx)
                    .ok_or_else(|| PatchError::PathNotFound(format_json_pointer(here)))?
            }
            _ => {
                return Err(PatchError::ParentNotObject(format_json_pointer(
                    &path[..depth],
                )))
            }
        };
    }
    Ok(node)
}

fn index(token: &str, path: &[String]) -> Result<usize, PatchError> {
    charsheet_json_pointer::parse_index(token)
        .ok_or_else(|| PatchError::InvalidIndex(format_json_pointer(path)))
}

/// RFC 6902 `add`: insert into arrays, create or overwrite object members.
pub(crate) fn add_in_place(doc: &mut Value, path: &[String], value: Value) -> Result<(), PatchError> {
    let Some(key) = path.last() else {
        *doc = value;
        return Ok(());
    };
    match parent_mut(doc, path)? {
        Value::Object(map) => {
            map.insert(key.clone(), value);
            Ok(())
        }
        Value::Array(items) => {
            if key == "-" {
                items.push(value);
                return Ok(());
            }
            let idx = index(key, path)?;
            if idx > items.len() {
                return Err(PatchError::InvalidIndex(format_json_pointer(path)));
            }
            items.insert(idx, value);
            Ok(())
        }
        _ => Err(PatchError::ParentNotObject(format_json_pointer(
            &path[..path.len() - 1],
        ))),
    }
}

/// RFC 6902 `replace`: the target must already exist.
pub(crate) fn replace_in_place(
    doc: &mut Value,
    path: &[String],
    value: Value,
) -> Result<Value, PatchError> {
    let Some(key) = path.last() else {
        return Ok(std::mem::replace(doc, value));
    };
    let slot = match parent_mut(doc, path)? {
        Value::Object(map) => map.get_mut(key),
        Value::Array(items) => items.get_mut(index(key, path)?),
        _ => {
            return Err(PatchError::ParentNotObject(format_json_pointer(
                &path[..path.len() - 1],
            )))
        }
    };
    match slot {
        Some(slot) => Ok(std::mem::replace(slot, value)),
        None => Err(PatchError::PathNotFound(format_json_pointer(path))),
    }
}

/// RFC 6902 `remove`: the target must exist. Removing the root leaves `null`.
pub(crate) fn remove_in_place(doc: &mut Value, path: &[String]) -> Result<Value, PatchError> {
    let Some(key) = path.last() else {
        return Ok(std::mem::take(doc));
    };
    let removed = match parent_mut(doc, path)? {
        Value::Object(map) => map.shift_remove(key),
        Value::Array(items) => {
            let idx = index(key, path)?;
            (idx < items.len()).then(|| items.remove(idx))
        }
        _ => {
            return Err(PatchError::ParentNotObject(format_json_pointer(
                &path[..path.len() - 1],
            )))
        }
    };
    removed.ok_or_else(|| PatchError::PathNotFound(format_json_pointer(path)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn p(pointer: &str) -> Path {
        parse_json_pointer(pointer).unwrap()
    }

    #[test]
    fn set_is_copy_on_write() {
        let before = json!({"hp": 10});
        let after = set(&before, &p("/name"), json!("Bob")).unwrap();
        assert_eq!(before, json!({"hp": 10}));
        assert_eq!(after, json!({"hp": 10, "name": "Bob"}));
    }

    #[test]
    fn set_overwrites_in_place_keeping_key_order() {
        let before = json!({"a": 1, "b": 2, "c": 3});
        let after = set(&before, &p("/b"), json!(20)).unwrap();
        assert!(key_order_equal(&after, &json!({"a": 1, "b": 20, "c": 3})));
        assert!(!key_order_equal(&after, &json!({"a": 1, "c": 3, "b": 20})));
    }

    #[test]
    fn set_root_replaces_tree() {
        assert_eq!(set(&json!({"a": 1}), &[], json!([1])).unwrap(), json!([1]));
    }

    #[test]
    fn set_into_arrays() {
        let doc = json!({"items": ["rope"]});
        assert_eq!(
            set(&doc, &p("/items/-"), json!("torch")).unwrap(),
            json!({"items": ["rope", "torch"]})
        );
        assert_eq!(
            set(&doc, &p("/items/0"), json!("lamp")).unwrap(),
            json!({"items": ["lamp", "rope"]})
        );
        assert_eq!(
            set(&doc, &p("/items/5"), json!("x")),
            Err(PatchError::InvalidIndex("/items/5".into()))
        );
    }

    #[test]
    fn set_reports_missing_and_scalar_parents() {
        let doc = json!({"stats": {"hp": 10}});
        assert_eq!(
            set(&doc, &p("/skills/stealth"), json!(3)),
            Err(PatchError::PathNotFound("/skills".into()))
        );
        assert_eq!(
            set(&doc, &p("/stats/hp/max"), json!(12)),
            Err(PatchError::ParentNotObject("/stats/hp".into()))
        );
        assert_eq!(
            set(&doc, &p("/stats/hp/max/inner"), json!(12)),
            Err(PatchError::ParentNotObject("/stats/hp".into()))
        );
    }

    #[test]
    fn remove_keeps_remaining_key_order() {
        let doc = json!({"a": 1, "b": 2, "c": 3});
        let out = remove(&doc, &p("/a")).unwrap();
        assert!(key_order_equal(&out, &json!({"b": 2, "c": 3})));
        assert_eq!(doc["a"], json!(1));
    }

    #[test]
    fn remove_missing_target() {
        assert_eq!(
            remove(&json!({"a": 1}), &p("/b")),
            Err(PatchError::PathNotFound("/b".into()))
        );
        assert_eq!(
            remove(&json!({"a": [1]}), &p("/a/1")),
            Err(PatchError::PathNotFound("/a/1".into()))
        );
    }

    #[test]
    fn replace_requires_existing_target() {
        let mut doc = json!({"hp": 10});
        let old = replace_in_place(&mut doc, &p("/hp"), json!(12)).unwrap();
        assert_eq!(old, json!(10));
        assert_eq!(doc, json!({"hp": 12}));
        assert_eq!(
            replace_in_place(&mut doc, &p("/mp"), json!(1)),
            Err(PatchError::PathNotFound("/mp".into()))
        );
    }

    #[test]
    fn get_reads_nested_values() {
        let doc = json!({"stats": {"hp": 10}});
        assert_eq!(get(&doc, &p("/stats/hp")), Some(&json!(10)));
        assert_eq!(get(&doc, &p("/stats/mp")), None);
    }
}
