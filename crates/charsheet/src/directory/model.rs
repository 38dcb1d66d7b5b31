//! Directory records: sheet types, document instances, and the views the
//! directory hands back to callers.

use std::borrow::Cow;
use std::net::IpAddr;

use base64::Engine as _;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("name must not be empty or whitespace only")]
    BlankName,
    #[error("invalid IP address format: {0:?}")]
    InvalidAddress(String),
    #[error("payload of {size} bytes exceeds the {limit} byte limit")]
    PayloadTooLarge { size: usize, limit: usize },
    #[error("form values must be an object, got {0}")]
    NotAnObject(&'static str),
}

/// Trims `name` and rejects it if nothing is left.
pub fn validate_name(name: &str) -> Result<String, ValidationError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ValidationError::BlankName);
    }
    Ok(name.to_string())
}

/// Form values are object-shaped; `null` stands for no values at all.
pub fn form_values(values: &Value) -> Result<Cow<'_, Value>, ValidationError> {
    match values {
        Value::Object(_) => Ok(Cow::Borrowed(values)),
        Value::Null => Ok(Cow::Owned(Value::Object(Map::new()))),
        Value::Bool(_) => Err(ValidationError::NotAnObject("a boolean")),
        Value::Number(_) => Err(ValidationError::NotAnObject("a number")),
        Value::String(_) => Err(ValidationError::NotAnObject("a string")),
        Value::Array(_) => Err(ValidationError::NotAnObject("an array")),
    }
}

/// Parses an IPv4 or IPv6 address and returns its canonical text form.
pub fn canonical_address(addr: &str) -> Result<String, ValidationError> {
    addr.trim()
        .parse::<IpAddr>()
        .map(|ip| ip.to_string())
        .map_err(|_| ValidationError::InvalidAddress(addr.to_string()))
}

/// A sheet template. Immutable once stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SheetType {
    pub id: Uuid,
    pub name: String,
    pub form_parts: Value,
    /// Background image, raw bytes.
    pub image: Vec<u8>,
}

impl SheetType {
    /// The image as standard base64, the form renderers embed.
    pub fn image_base64(&self) -> String {
        base64::engine::general_purpose::STANDARD.encode(&self.image)
    }
}

/// A versioned sheet. Field values live in its revision history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentInstance {
    pub id: Uuid,
    pub name: String,
    pub sheet_type_id: Uuid,
    pub deleted: bool,
    pub created_at: DateTime<Utc>,
    /// Canonical textual IP address the document was created from.
    pub creation_ip: String,
}

#[derive(Debug, Clone)]
pub struct NewSheetType {
    pub name: String,
    pub form_parts: Value,
    pub image: Vec<u8>,
}

impl NewSheetType {
    /// Builds a template from a base64 image, with or without a
    /// `data:image/png;base64,` prefix.
    pub fn from_base64_image(
        name: impl Into<String>,
        form_parts: Value,
        image_b64: &str,
    ) -> Result<Self, base64::DecodeError> {
        let payload = image_b64
            .trim()
            .split_once(";base64,")
            .map_or(image_b64.trim(), |(_, data)| data);
        let image = base64::engine::general_purpose::STANDARD.decode(payload)?;
        Ok(Self {
            name: name.into(),
            form_parts,
            image,
        })
    }
}

#[derive(Debug, Clone)]
pub struct NewDocument {
    pub name: String,
    pub sheet_type_id: Uuid,
    pub creation_ip: String,
    pub initial_values: Value,
}

/// Copy an existing sheet under a new name.
#[derive(Debug, Clone)]
pub struct SaveAsNew {
    pub name: String,
    /// Values for the copy; the source's current state when `None`.
    pub form_values: Option<Value>,
    pub creation_ip: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetTypeSummary {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevisionSummary {
    pub rev_id: Uuid,
    pub document_id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub document_name: String,
    pub sheet_type_name: String,
}

/// A document as it looked right after one revision.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RevisionView {
    pub document: DocumentInstance,
    pub sheet_type: SheetType,
    pub revision_id: Uuid,
    pub form_values: Value,
}

/// Outcome of a free-text lookup.
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup {
    Document(Uuid),
    Revision(Uuid),
    Matches(Vec<DocumentInstance>),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn names_are_trimmed() {
        assert_eq!(validate_name("  Bob "), Ok("Bob".to_string()));
        assert_eq!(validate_name(" \t\n"), Err(ValidationError::BlankName));
        assert_eq!(validate_name(""), Err(ValidationError::BlankName));
    }

    #[test]
    fn addresses_are_canonicalised() {
        assert_eq!(canonical_address("127.0.0.1"), Ok("127.0.0.1".into()));
        assert_eq!(canonical_address(" 10.0.0.7 "), Ok("10.0.0.7".into()));
        assert_eq!(
            canonical_address("2001:0db8:0000:0000:0000:0000:0000:0001"),
            Ok("2001:db8::1".into())
        );
        assert_eq!(
            canonical_address("not-an-ip"),
            Err(ValidationError::InvalidAddress("not-an-ip".into()))
        );
        assert!(canonical_address("256.1.1.1").is_err());
    }

    #[test]
    fn form_values_must_be_objects() {
        assert_eq!(form_values(&json!({"hp": 1})).unwrap().as_ref(), &json!({"hp": 1}));
        assert_eq!(form_values(&Value::Null).unwrap().as_ref(), &json!({}));
        assert_eq!(
            form_values(&json!([1])),
            Err(ValidationError::NotAnObject("an array"))
        );
        assert_eq!(form_values(&json!(5)), Err(ValidationError::NotAnObject("a number")));
        assert_eq!(form_values(&json!("x")), Err(ValidationError::NotAnObject("a string")));
    }

    #[test]
    fn base64_images_accept_data_uris() {
        let plain = NewSheetType::from_base64_image("t", json!([]), "aGVsbG8=").unwrap();
        let uri =
            NewSheetType::from_base64_image("t", json!([]), "data:image/png;base64,aGVsbG8=\n")
                .unwrap();
        assert_eq!(plain.image, b"hello");
        assert_eq!(uri.image, b"hello");
        assert!(NewSheetType::from_base64_image("t", json!([]), "!!").is_err());
    }

    #[test]
    fn image_base64_round_trips() {
        let sheet = SheetType {
            id: Uuid::nil(),
            name: "t".into(),
            form_parts: json!([]),
            image: b"hello".to_vec(),
        };
        assert_eq!(sheet.image_base64(), "aGVsbG8=");
    }
}
