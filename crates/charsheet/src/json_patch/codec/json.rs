//! JSON codec for patch operations.
//!
//! Converts operations to/from `serde_json::Value` in the RFC 6902 shape, which
//! is also the persisted form of revision diffs.

use serde_json::{json, Map, Value};

use crate::json_patch::types::{Op, PatchError};

// ── Path helpers ──────────────────────────────────────────────────────────

fn encode_path(path: &[String]) -> Value {
    Value::String(charsheet_json_pointer::format_json_pointer(path))
}

fn decode_path(v: &Value) -> Result<Vec<String>, PatchError> {
    let s = v
        .as_str()
        .ok_or_else(|| PatchError::InvalidOp("path must be a string".into()))?;
    charsheet_json_pointer::parse_json_pointer(s).map_err(|e| PatchError::InvalidOp(e.to_string()))
}

// ── Serialization ─────────────────────────────────────────────────────────

/// Serialize an `Op` to a `serde_json::Value` in the JSON Patch format.
pub fn to_json(op: &Op) -> Value {
    match op {
        Op::Add { path, value } => json!({
            "op": "add",
            "path": encode_path(path),
            "value": value
        }),
        Op::Remove { path } => json!({
            "op": "remove",
            "path": encode_path(path)
        }),
        Op::Replace { path, value } => json!({
            "op": "replace",
            "path": encode_path(path),
            "value": value
        }),
    }
}

/// Serialize a list of operations to a JSON array.
pub fn to_json_patch(ops: &[Op]) -> Value {
    Value::Array(ops.iter().map(to_json).collect())
}

// ── Deserialization ───────────────────────────────────────────────────────

fn required_value(obj: &Map<String, Value>, op: &str) -> Result<Value, PatchError> {
    obj.get("value")
        .cloned()
        .ok_or_else(|| PatchError::InvalidOp(format!("{op} requires 'value'")))
}

/// Deserialize a `serde_json::Value` into an `Op`.
pub fn from_json(v: &Value) -> Result<Op, PatchError> {
    let obj = v
        .as_object()
        .ok_or_else(|| PatchError::InvalidOp("operation must be an object".into()))?;
    let op_str = obj
        .get("op")
        .and_then(Value::as_str)
        .ok_or_else(|| PatchError::InvalidOp("missing 'op' field".into()))?;
    let path = decode_path(
        obj.get("path")
            .ok_or_else(|| PatchError::InvalidOp("missing 'path' field".into()))?,
    )?;

    match op_str {
        "add" => Ok(Op::Add {
            path,
            value: required_value(obj, "add")?,
        }),
        "remove" => Ok(Op::Remove { path }),
        "replace" => Ok(Op::Replace {
            path,
            value: required_value(obj, "replace")?,
        }),
        other => Err(PatchError::InvalidOp(format!("unsupported op: {other}"))),
    }
}

/// Deserialize a JSON array into a list of operations.
pub fn from_json_patch(v: &Value) -> Result<Vec<Op>, PatchError> {
    let arr = v
        .as_array()
        .ok_or_else(|| PatchError::InvalidOp("patch must be an array".into()))?;
    arr.iter().map(from_json).collect()
}
