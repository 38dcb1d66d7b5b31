//! Patch application.
//!
//! Operations run strictly in order against one working copy; a failing
//! operation aborts the whole patch and the caller's tree is left untouched.

use serde_json::Value;

use crate::json_patch::types::{Op, PatchError};
use crate::value::{add_in_place, remove_in_place, replace_in_place};

/// Apply a single operation in place.
pub fn apply_op(doc: &mut Value, op: &Op) -> Result<(), PatchError> {
    match op {
        Op::Add { path, value } => add_in_place(doc, path, value.clone()),
        Op::Remove { path } => remove_in_place(doc, path).map(drop),
        Op::Replace { path, value } => replace_in_place(doc, path, value.clone()).map(drop),
    }
}

/// Apply `ops` to `doc` in place. On error `doc` may hold a partial result.
pub fn apply_in_place(doc: &mut Value, ops: &[Op]) -> Result<(), PatchError> {
    ops.iter().try_for_each(|op| apply_op(doc, op))
}

/// Apply `ops` to a copy of `tree` and return the result.
pub fn apply(tree: &Value, ops: &[Op]) -> Result<Value, PatchError> {
    let mut doc = tree.clone();
    apply_in_place(&mut doc, ops)?;
    Ok(doc)
}
