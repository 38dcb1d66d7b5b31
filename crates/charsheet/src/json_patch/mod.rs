//! JSON Patch subset used for revision diffs.
//!
//! Only `add`, `remove`, and `replace` are supported; they are enough to
//! move between any two object-shaped sheet states.

pub mod apply;
pub mod codec;
pub mod diff;
pub mod types;

pub use apply::{apply, apply_in_place};
pub use codec::json::{from_json, from_json_patch, to_json, to_json_patch};
pub use diff::{diff, make_patch};
pub use types::{Op, Patch, PatchError};
