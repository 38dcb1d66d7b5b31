use serde_json::Value;

/// Performs a structural equality check between two JSON values.
///
/// Arrays compare element by element in order. Objects compare by key set and
/// per-key value; the order keys were inserted in does not matter. Numbers
/// compare by their `serde_json` representation, so `0` and `0.0` differ.
///
/// # Examples
///
/// ```
/// use charsheet_json_equal::deep_equal;
/// use serde_json::json;
///
/// assert!(deep_equal(&json!({"a": 1, "b": 2}), &json!({"b": 2, "a": 1})));
/// assert!(!deep_equal(&json!([1, 2]), &json!([2, 1])));
/// ```
pub fn deep_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Null, Value::Null) => true,
        (Value::Bool(a), Value::Bool(b)) => a == b,
        (Value::Number(a), Value::Number(b)) => a == b,
        (Value::String(a), Value::String(b)) => a == b,

        (Value::Array(arr_a), Value::Array(arr_b)) => {
            arr_a.len() == arr_b.len()
                && arr_a.iter().zip(arr_b).all(|(x, y)| deep_equal(x, y))
        }

        (Value::Object(obj_a), Value::Object(obj_b)) => {
            if obj_a.len() != obj_b.len() {
                return false;
            }
            for (key, val_a) in obj_a {
                match obj_b.get(key) {
                    Some(val_b) => {
                        if !deep_equal(val_a, val_b) {
                            return false;
                        }
                    }
                    None => return false,
                }
            }
            true
        }

        // Different types are never equal
        _ => false,
    }
}

/// Like [`deep_equal`], but objects must also list their keys in the same
/// order at every level.
pub fn key_order_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Array(arr_a), Value::Array(arr_b)) => {
            arr_a.len() == arr_b.len()
                && arr_a.iter().zip(arr_b).all(|(x, y)| key_order_equal(x, y))
        }
        (Value::Object(obj_a), Value::Object(obj_b)) => {
            obj_a.len() == obj_b.len()
                && obj_a
                    .iter()
                    .zip(obj_b)
                    .all(|((ka, va), (kb, vb))| ka == kb && key_order_equal(va, vb))
        }
        _ => deep_equal(a, b),
    }
}
