//! Schema validation.
//!
//! Catches structural problems in a [`Signature`] or [`RecordSchema`] before
//! any flag is registered: names that cannot serve as dotted-path segments,
//! duplicate names within one scope, and declared defaults that do not fit
//! the declared type.
//!
//! # Examples
//!
//! ```
//! use record_args_core::*;
//!
//! let sig = Signature::new("train")
//!     .with_param(FieldSpec::scalar("lr", ScalarType::Float).with_default(0.001));
//! assert!(validate_signature(&sig).is_empty());
//!
//! // Invalid: a parameter name containing the path separator
//! let bad = Signature::new("train").with_param(FieldSpec::scalar("a.b", ScalarType::Int));
//! assert_eq!(
//!     validate_signature(&bad),
//!     vec![SchemaError::InvalidSegment("a.b".to_string())]
//! );
//! ```

use std::collections::HashSet;

use serde_json::{Map, Value};
use thiserror::Error;

use crate::path::{DottedPath, is_valid_segment};
use crate::{FieldKind, FieldSpec, RecordSchema, ScalarType, Signature};

/// Errors raised while building or walking a schema.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// A signature, record, or field name is empty.
    #[error("name cannot be empty in {0}")]
    EmptyName(String),
    /// A name cannot be used as a dotted-path segment.
    #[error("invalid name segment: {0}")]
    InvalidSegment(String),
    /// Two fields in the same scope share a name.
    #[error("duplicate field in scope: {0}")]
    DuplicateField(String),
    /// A flag with this dotted path is already registered.
    #[error("duplicate flag: {0}")]
    DuplicateFlag(String),
    /// A declared type name does not name a scalar type.
    #[error("unknown scalar type: {0}")]
    UnknownType(String),
    /// A declared default does not fit the declared type.
    #[error("invalid default: {0}")]
    InvalidDefault(String),
    /// A choice leaf declares no choices.
    #[error("choice list cannot be empty: {0}")]
    EmptyChoice(String),
}

/// Validates a callable signature and every record reachable from it.
///
/// Returns at most one error: validation stops at the first problem found.
pub fn validate_signature(signature: &Signature) -> Vec<SchemaError> {
    if signature.name.trim().is_empty() {
        return vec![SchemaError::EmptyName("signature".to_string())];
    }
    validate_fields(&signature.params, None, &signature.name)
}

/// Validates a record schema and every record nested in it.
///
/// # Examples
///
/// ```
/// use record_args_core::*;
///
/// let record = RecordSchema::new("Nested")
///     .with_field(FieldSpec::scalar("x", ScalarType::Int))
///     .with_field(FieldSpec::scalar("x", ScalarType::Int));
/// assert_eq!(
///     validate_record(&record),
///     vec![SchemaError::DuplicateField("x".to_string())]
/// );
/// ```
pub fn validate_record(record: &RecordSchema) -> Vec<SchemaError> {
    if record.name.trim().is_empty() {
        return vec![SchemaError::EmptyName("record".to_string())];
    }
    validate_fields(&record.fields, None, &record.name)
}

fn validate_fields(
    fields: &[FieldSpec],
    prefix: Option<&DottedPath>,
    scope: &str,
) -> Vec<SchemaError> {
    let mut seen: HashSet<&str> = HashSet::new();

    for field in fields {
        if field.name.trim().is_empty() {
            return vec![SchemaError::EmptyName(scope.to_string())];
        }
        if !is_valid_segment(&field.name) {
            return vec![SchemaError::InvalidSegment(field.name.clone())];
        }

        let path = DottedPath::join(prefix, &field.name);
        if !seen.insert(field.name.as_str()) {
            return vec![SchemaError::DuplicateField(path.to_string())];
        }

        let errors = match &field.kind {
            FieldKind::Scalar { ty } => validate_scalar(ty, field.default.as_ref(), &path),
            FieldKind::Record { record } => {
                if record.name.trim().is_empty() {
                    return vec![SchemaError::EmptyName(path.to_string())];
                }
                let mut errors = Vec::new();
                if let Some(default) = &field.default {
                    errors.extend(validate_record_default(record, default, &path));
                }
                if errors.is_empty() {
                    errors.extend(validate_fields(&record.fields, Some(&path), &record.name));
                }
                errors
            }
        };
        if !errors.is_empty() {
            return errors;
        }
    }

    Vec::new()
}

fn validate_scalar(ty: &ScalarType, default: Option<&Value>, path: &DottedPath) -> Vec<SchemaError> {
    if let ScalarType::Choice(choices) = ty {
        if choices.is_empty() {
            return vec![SchemaError::EmptyChoice(path.to_string())];
        }
    }

    match default {
        Some(value) if !value.is_null() && !ty.accepts(value) => {
            vec![SchemaError::InvalidDefault(format!(
                "{path}: expected {ty}, found {value}"
            ))]
        }
        _ => Vec::new(),
    }
}

/// Checks an externally supplied defaults object against `fields`.
///
/// The same rules apply as for declared record defaults: the object may be
/// partial, but every key must name a field and every value must fit it.
pub(crate) fn validate_defaults(fields: &[FieldSpec], scope: &str, defaults: &Value) -> Vec<SchemaError> {
    match defaults.as_object() {
        Some(object) => validate_default_entries(fields, scope, object, None),
        None => vec![SchemaError::InvalidDefault(format!(
            "{scope}: expected an object of defaults, found {defaults}"
        ))],
    }
}

/// Checks a (possibly partial) record default against the record's fields.
fn validate_record_default(
    record: &RecordSchema,
    default: &Value,
    path: &DottedPath,
) -> Vec<SchemaError> {
    let Some(object) = default.as_object() else {
        return vec![SchemaError::InvalidDefault(format!(
            "{path}: expected {} object, found {default}",
            record.name
        ))];
    };
    validate_default_entries(&record.fields, &record.name, object, Some(path))
}

fn validate_default_entries(
    fields: &[FieldSpec],
    scope: &str,
    object: &Map<String, Value>,
    prefix: Option<&DottedPath>,
) -> Vec<SchemaError> {
    for (key, value) in object {
        let child = DottedPath::join(prefix, key);
        let Some(field) = fields.iter().find(|f| &f.name == key) else {
            return vec![SchemaError::InvalidDefault(format!(
                "{child}: no such field on {scope}"
            ))];
        };
        let errors = match &field.kind {
            FieldKind::Scalar { ty } => validate_scalar(ty, Some(value), &child),
            FieldKind::Record { record } if !value.is_null() => {
                validate_record_default(record, value, &child)
            }
            FieldKind::Record { .. } => Vec::new(),
        };
        if !errors.is_empty() {
            return errors;
        }
    }

    Vec::new()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn nested() -> RecordSchema {
        RecordSchema::new("Nested")
            .with_field(FieldSpec::scalar("x", ScalarType::Int).with_default(1))
    }

    #[test]
    fn test_validate_accepts_nested_signature() {
        let sig = Signature::new("my_func")
            .with_param(FieldSpec::scalar("a", ScalarType::Int))
            .with_param(FieldSpec::record("b", nested()).with_default(json!({ "x": 5 })))
            .with_param(FieldSpec::scalar("c", ScalarType::String).with_default("c"));

        assert!(validate_signature(&sig).is_empty());
    }

    #[test]
    fn test_validate_rejects_duplicate_nested_field() {
        let record = RecordSchema::new("Outer").with_field(FieldSpec::record(
            "inner",
            nested().with_field(FieldSpec::scalar("x", ScalarType::Float)),
        ));

        assert_eq!(
            validate_record(&record),
            vec![SchemaError::DuplicateField("inner.x".to_string())]
        );
    }

    #[test]
    fn test_validate_rejects_mistyped_scalar_default() {
        let sig = Signature::new("f")
            .with_param(FieldSpec::scalar("n", ScalarType::Int).with_default("three"));

        let errors = validate_signature(&sig);
        assert!(matches!(errors.as_slice(), [SchemaError::InvalidDefault(msg)] if msg.starts_with("n:")));
    }

    #[test]
    fn test_validate_rejects_record_default_with_unknown_field() {
        let sig = Signature::new("f")
            .with_param(FieldSpec::record("inner", nested()).with_default(json!({ "y": 2 })));

        let errors = validate_signature(&sig);
        assert!(matches!(errors.as_slice(), [SchemaError::InvalidDefault(msg)] if msg.starts_with("inner.y")));
    }

    #[test]
    fn test_validate_rejects_scalar_record_default() {
        let sig = Signature::new("f").with_param(FieldSpec::record("inner", nested()).with_default(5));

        assert_eq!(validate_signature(&sig).len(), 1);
    }

    #[test]
    fn test_validate_rejects_empty_choice() {
        let sig = Signature::new("f")
            .with_param(FieldSpec::scalar("mode", ScalarType::Choice(Vec::new())));

        assert_eq!(
            validate_signature(&sig),
            vec![SchemaError::EmptyChoice("mode".to_string())]
        );
    }

    #[test]
    fn test_validate_rejects_non_identifier_names() {
        for name in ["-x", "a=b", "a b"] {
            let sig = Signature::new("f").with_param(FieldSpec::scalar(name, ScalarType::Int));
            assert_eq!(
                validate_signature(&sig),
                vec![SchemaError::InvalidSegment(name.to_string())]
            );
        }

        let record = RecordSchema::new("Outer")
            .with_field(FieldSpec::record("inner", RecordSchema::new("Inner").with_field(
                FieldSpec::scalar("--y", ScalarType::Int),
            )));
        assert_eq!(
            validate_record(&record),
            vec![SchemaError::InvalidSegment("--y".to_string())]
        );
    }

    #[test]
    fn test_validate_rejects_int_default_outside_i64() {
        let sig = Signature::new("f")
            .with_param(FieldSpec::scalar("n", ScalarType::Int).with_default(u64::MAX));

        assert!(matches!(
            validate_signature(&sig).as_slice(),
            [SchemaError::InvalidDefault(msg)] if msg.starts_with("n:")
        ));
    }

    #[test]
    fn test_validate_defaults_checks_keys_and_types() {
        let params = vec![
            FieldSpec::record("inner", nested()),
            FieldSpec::scalar("c", ScalarType::String).with_default("c"),
            FieldSpec::scalar("n", ScalarType::Int),
        ];

        assert!(validate_defaults(&params, "f", &json!({ "inner": { "x": 3 }, "c": "d" })).is_empty());
        assert!(validate_defaults(&params, "f", &json!({})).is_empty());

        let cases = [
            (json!({ "inner": { "y": 3 } }), "inner.y"),
            (json!({ "c": { "k": 1 } }), "c:"),
            (json!({ "typo": 9 }), "typo"),
            (json!({ "n": "abc" }), "n:"),
            (json!({ "inner": 4 }), "inner:"),
        ];
        for (defaults, prefix) in cases {
            let errors = validate_defaults(&params, "f", &defaults);
            assert!(
                matches!(errors.as_slice(), [SchemaError::InvalidDefault(msg)] if msg.starts_with(prefix)),
                "{defaults}: {errors:?}"
            );
        }

        assert_eq!(validate_defaults(&params, "f", &json!([1, 2])).len(), 1);
    }

    #[test]
    fn test_validate_rejects_empty_signature_name() {
        assert_eq!(
            validate_signature(&Signature::new(" ")),
            vec![SchemaError::EmptyName("signature".to_string())]
        );
    }
}
