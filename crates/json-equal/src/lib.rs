//! charsheet-json-equal - structural equality for JSON values.
//!
//! Provides [`deep_equal`] for recursively comparing two [`serde_json::Value`]
//! trees, and [`key_order_equal`] for callers that also care about the order
//! objects keep their keys in.

mod deep_equal;

pub use deep_equal::{deep_equal, key_order_equal};
