//! JSON Pointer paths used to address fields inside sheet values.
//!
//! A [`Path`] is the unescaped token list of an RFC 6901 pointer. Patch
//! operations carry paths; the wire form is the escaped pointer string.

use serde_json::Value;
use thiserror::Error;

/// Unescaped reference tokens, root first. The empty path is the root.
pub type Path = Vec<String>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum JsonPointerError {
    #[error("json pointer must be absolute or empty: {0:?}")]
    NotAbsolute(String),
}

/// Unescapes one JSON Pointer token component.
pub fn unescape_component(component: &str) -> String {
    if !component.contains('~') {
        return component.to_string();
    }
    component.replace("~1", "/").replace("~0", "~")
}

/// Escapes one JSON Pointer token component.
pub fn escape_component(component: &str) -> String {
    if !component.contains('/') && !component.contains('~') {
        return component.to_string();
    }
    component.replace('~', "~0").replace('/', "~1")
}

/// Parse an RFC 6901 absolute pointer into unescaped path components.
///
/// Examples:
/// - `"" -> []`
/// - `"/" -> [""]`
/// - `"/a~1b/~0k/0" -> ["a/b", "~k", "0"]`
pub fn parse_json_pointer(pointer: &str) -> Result<Path, JsonPointerError> {
    if pointer.is_empty() {
        return Ok(Vec::new());
    }
    if !pointer.starts_with('/') {
        return Err(JsonPointerError::NotAbsolute(pointer.to_string()));
    }
    Ok(pointer.split('/').skip(1).map(unescape_component).collect())
}

/// Format unescaped path components into an RFC 6901 pointer.
pub fn format_json_pointer(path: &[String]) -> String {
    let mut out = String::new();
    for component in path {
        out.push('/');
        out.push_str(&escape_component(component));
    }
    out
}

/// Parse an array index token. Leading zeros and signs are rejected as in
/// RFC 6901; `-` is handled by callers that accept it.
pub fn parse_index(token: &str) -> Option<usize> {
    if token.is_empty() || (token.len() > 1 && token.starts_with('0')) {
        return None;
    }
    if !token.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    token.parse().ok()
}

/// Resolve `path` inside `doc`, returning `None` when any step is missing.
pub fn get<'a>(doc: &'a Value, path: &[String]) -> Option<&'a Value> {
    let mut node = doc;
    for token in path {
        node = match node {
            Value::Object(map) => map.get(token)?,
            Value::Array(items) => items.get(parse_index(token)?)?,
            _ => return None,
        };
    }
    Some(node)
}
