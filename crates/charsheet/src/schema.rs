//! Sheet type layout validation.
//!
//! A sheet type's `form_parts` is an array of field descriptors:
//!
//! ```json
//! [{"input_name": "hp", "input_type": "number", "input_rect": [[10, 20], [60, 40]]}]
//! ```
//!
//! Extra members on a descriptor are tolerated; the three listed ones are
//! required.

use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SchemaError {
    /// Names the pointer of the first offending element or member.
    #[error("malformed form parts at {0:?}")]
    Malformed(String),
}

const STRING_FIELDS: [&str; 2] = ["input_name", "input_type"];

/// Validate a sheet type layout. Stops at the first problem found.
pub fn validate_form_parts(parts: &Value) -> Result<(), SchemaError> {
    let parts = parts
        .as_array()
        .ok_or_else(|| SchemaError::Malformed(String::new()))?;
    for (i, part) in parts.iter().enumerate() {
        validate_part(i, part)?;
    }
    Ok(())
}

fn validate_part(i: usize, part: &Value) -> Result<(), SchemaError> {
    let here = format!("/{i}");
    let obj = part
        .as_object()
        .ok_or_else(|| SchemaError::Malformed(here.clone()))?;
    for key in STRING_FIELDS {
        if !obj.get(key).is_some_and(Value::is_string) {
            return Err(SchemaError::Malformed(format!("{here}/{key}")));
        }
    }
    let rect_path = format!("{here}/input_rect");
    let rect = obj
        .get("input_rect")
        .and_then(Value::as_array)
        .filter(|points| points.len() == 2)
        .ok_or_else(|| SchemaError::Malformed(rect_path.clone()))?;
    for (j, point) in rect.iter().enumerate() {
        let is_point = point
            .as_array()
            .is_some_and(|xy| xy.len() == 2 && xy.iter().all(Value::is_number));
        if !is_point {
            return Err(SchemaError::Malformed(format!("{rect_path}/{j}")));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn part() -> Value {
        json!({"input_name": "hp", "input_type": "number", "input_rect": [[0, 0], [10.5, 4]]})
    }

    #[test]
    fn accepts_valid_layouts() {
        assert_eq!(validate_form_parts(&json!([])), Ok(()));
        assert_eq!(validate_form_parts(&json!([part(), part()])), Ok(()));
        let mut extra = part();
        extra["tooltip"] = json!("hit points");
        assert_eq!(validate_form_parts(&json!([extra])), Ok(()));
    }

    #[test]
    fn rejects_non_array() {
        assert_eq!(
            validate_form_parts(&json!({"parts": []})),
            Err(SchemaError::Malformed(String::new()))
        );
    }

    #[test]
    fn rejects_non_object_element() {
        assert_eq!(
            validate_form_parts(&json!([part(), "hp"])),
            Err(SchemaError::Malformed("/1".into()))
        );
    }

    #[test]
    fn rejects_missing_rect() {
        let mut p = part();
        p.as_object_mut().unwrap().remove("input_rect");
        assert_eq!(
            validate_form_parts(&json!([p])),
            Err(SchemaError::Malformed("/0/input_rect".into()))
        );
    }

    #[test]
    fn rejects_single_point_rect() {
        let mut p = part();
        p["input_rect"] = json!([[0, 0]]);
        assert_eq!(
            validate_form_parts(&json!([p])),
            Err(SchemaError::Malformed("/0/input_rect".into()))
        );
    }

    #[test]
    fn rejects_bad_points() {
        let mut p = part();
        p["input_rect"] = json!([[0, 0], [1, 2, 3]]);
        assert_eq!(
            validate_form_parts(&json!([p])),
            Err(SchemaError::Malformed("/0/input_rect/1".into()))
        );
        let mut p = part();
        p["input_rect"] = json!([["0", 0], [1, 2]]);
        assert_eq!(
            validate_form_parts(&json!([p])),
            Err(SchemaError::Malformed("/0/input_rect/0".into()))
        );
    }

    #[test]
    fn rejects_non_string_names() {
        let mut p = part();
        p["input_type"] = json!(3);
        assert_eq!(
            validate_form_parts(&json!([part(), p])),
            Err(SchemaError::Malformed("/1/input_type".into()))
        );
    }
}
