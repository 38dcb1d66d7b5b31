//! Core types for the JSON Patch module.

use serde_json::Value;
use thiserror::Error;

pub use charsheet_json_pointer::Path;

// ── Error ─────────────────────────────────────────────────────────────────

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PatchError {
    #[error("path not found: {0:?}")]
    PathNotFound(String),
    #[error("parent is not an object or array: {0:?}")]
    ParentNotObject(String),
    #[error("invalid array index: {0:?}")]
    InvalidIndex(String),
    #[error("invalid operation: {0}")]
    InvalidOp(String),
}

// ── Op enum ───────────────────────────────────────────────────────────────

/// A single patch operation. Paths are unescaped pointer tokens.
#[derive(Debug, Clone, PartialEq)]
pub enum Op {
    Add { path: Path, value: Value },
    Remove { path: Path },
    Replace { path: Path, value: Value },
}

/// An ordered list of operations; later operations see earlier results.
pub type Patch = Vec<Op>;

impl Op {
    /// Returns the wire name of the operation.
    pub fn op_name(&self) -> &'static str {
        match self {
            Op::Add { .. } => "add",
            Op::Remove { .. } => "remove",
            Op::Replace { .. } => "replace",
        }
    }

    /// Returns the path of the operation.
    pub fn path(&self) -> &Path {
        match self {
            Op::Add { path, .. } | Op::Remove { path } | Op::Replace { path, .. } => path,
        }
    }

    /// Returns the value carried by `add` and `replace`.
    pub fn value(&self) -> Option<&Value> {
        match self {
            Op::Add { value, .. } | Op::Replace { value, .. } => Some(value),
            Op::Remove { .. } => None,
        }
    }
}
