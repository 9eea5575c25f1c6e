//! Record and argument reconstruction from nested parsed values.
//!
//! Every leaf is resolved with the same precedence the walker uses for flag
//! defaults, with the parsed input on top:
//!
//! 1. a non-null value in the input mapping;
//! 2. the override layers (a default instance, then enclosing record-field
//!    defaults);
//! 3. the leaf's declared default;
//! 4. null, if the leaf is optional.
//!
//! Anything else is a [`ConstructError::MissingValue`]. Reconstruction is
//! all-or-nothing: no partially built record is ever returned, and every
//! default is cloned into the result.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::nest::NestedMapping;
use crate::path::DottedPath;
use crate::walk::{descend, resolve_default};
use crate::{FieldKind, FieldSpec, Record, RecordSchema, Signature};

/// Errors raised while rebuilding records or argument mappings.
#[derive(Debug, Error)]
pub enum ConstructError {
    /// A required leaf has no value from input, overrides, or declarations.
    #[error("missing value for `{path}` in {record}")]
    MissingValue { record: String, path: String },

    /// A record-typed field holds a non-mapping value.
    #[error("expected {record} mapping at `{path}`, found {found}")]
    ExpectedRecord {
        record: String,
        path: String,
        found: Value,
    },

    /// The typed record rejected the reconstructed fields.
    #[error("failed to construct {record}: {source}")]
    Deserialize {
        record: String,
        source: serde_json::Error,
    },
}

/// Reconstructed keyword arguments for a [`Signature`].
///
/// Record-typed parameters hold fully populated objects; use
/// [`get`](Self::get) to turn one into its typed record.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(transparent)]
pub struct ArgumentMap {
    values: NestedMapping,
}

impl ArgumentMap {
    /// Deserializes one argument.
    ///
    /// # Errors
    ///
    /// [`ConstructError::MissingValue`] if `name` is not a parameter, or
    /// [`ConstructError::Deserialize`] if the value does not fit `T`.
    pub fn get<T: DeserializeOwned>(&self, name: &str) -> Result<T, ConstructError> {
        let value = self
            .values
            .get(name)
            .ok_or_else(|| ConstructError::MissingValue {
                record: "arguments".to_string(),
                path: name.to_string(),
            })?;
        T::deserialize(value).map_err(|source| ConstructError::Deserialize {
            record: name.to_string(),
            source,
        })
    }

    /// Raw value of one argument.
    pub fn get_value(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Deserializes all arguments into a parameter struct.
    pub fn into_typed<T: DeserializeOwned>(self) -> Result<T, ConstructError> {
        serde_json::from_value(Value::Object(self.values)).map_err(|source| {
            ConstructError::Deserialize {
                record: "arguments".to_string(),
                source,
            }
        })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.values.iter()
    }

    pub fn into_inner(self) -> NestedMapping {
        self.values
    }
}

impl From<ArgumentMap> for Value {
    fn from(args: ArgumentMap) -> Self {
        Value::Object(args.values)
    }
}

/// Rebuilds a record as a fully populated JSON object.
///
/// `default` acts as a default instance for the record: any of its values
/// beat the declared field defaults, and the input beats both.
///
/// # Examples
///
/// ```
/// use record_args_core::*;
/// use serde_json::json;
///
/// let nested = RecordSchema::new("Nested")
///     .with_field(FieldSpec::scalar("x", ScalarType::Int).with_default(1));
/// let demo = RecordSchema::new("DemoClass")
///     .with_field(FieldSpec::scalar("a", ScalarType::Int))
///     .with_field(FieldSpec::record("b", nested))
///     .with_field(FieldSpec::scalar("c", ScalarType::String).with_default("c"));
///
/// let input = json!({ "a": 1 });
/// let value = construct_value(&demo, input.as_object().unwrap(), None).unwrap();
/// assert_eq!(value, json!({ "a": 1, "b": { "x": 1 }, "c": "c" }));
///
/// // `a` is required and has no value anywhere.
/// let err = construct_value(&demo, &NestedMapping::new(), None).unwrap_err();
/// assert!(matches!(err, ConstructError::MissingValue { .. }));
/// ```
pub fn construct_value(
    record: &RecordSchema,
    data: &NestedMapping,
    default: Option<&Value>,
) -> Result<Value, ConstructError> {
    let layers: Vec<&Value> = default.into_iter().collect();
    build_fields(&record.name, &record.fields, data, None, &layers).map(Value::Object)
}

/// Rebuilds a typed record.
///
/// # Errors
///
/// Any [`ConstructError`]; a required field that no source provides fails
/// either here or in the record's own deserialization.
pub fn construct<T: Record>(data: &NestedMapping, default: Option<&T>) -> Result<T, ConstructError> {
    let schema = T::schema();
    let default = default
        .map(serde_json::to_value)
        .transpose()
        .map_err(|source| ConstructError::Deserialize {
            record: schema.name.clone(),
            source,
        })?;

    let value = construct_value(&schema, data, default.as_ref())?;
    debug!(record = %schema.name, %value, "constructing record");
    serde_json::from_value(value).map_err(|source| ConstructError::Deserialize {
        record: schema.name,
        source,
    })
}

/// Resolves the keyword arguments of `signature`.
pub fn construct_arguments(
    signature: &Signature,
    data: &NestedMapping,
) -> Result<ArgumentMap, ConstructError> {
    construct_arguments_with(signature, data, None)
}

/// Resolves the keyword arguments of `signature` on top of an externally
/// supplied defaults object keyed by parameter name.
pub fn construct_arguments_with(
    signature: &Signature,
    data: &NestedMapping,
    defaults: Option<&Value>,
) -> Result<ArgumentMap, ConstructError> {
    let layers: Vec<&Value> = defaults.into_iter().collect();
    let values = build_fields(&signature.name, &signature.params, data, None, &layers)?;
    debug!(signature = %signature.name, params = values.len(), "constructed arguments");
    Ok(ArgumentMap { values })
}

fn build_fields(
    owner: &str,
    fields: &[FieldSpec],
    data: &NestedMapping,
    prefix: Option<&DottedPath>,
    layers: &[&Value],
) -> Result<NestedMapping, ConstructError> {
    let empty = NestedMapping::new();
    let mut out = NestedMapping::new();

    for field in fields {
        let path = DottedPath::join(prefix, &field.name);
        let value = match &field.kind {
            FieldKind::Record { record } => {
                let sub_data = match data.get(&field.name) {
                    None | Some(Value::Null) => &empty,
                    Some(Value::Object(map)) => map,
                    Some(other) => {
                        return Err(ConstructError::ExpectedRecord {
                            record: record.name.clone(),
                            path: path.to_string(),
                            found: other.clone(),
                        });
                    }
                };
                let child_layers = descend(layers, field);
                let built = build_fields(&record.name, &record.fields, sub_data, Some(&path), &child_layers)?;
                Value::Object(built)
            }
            FieldKind::Scalar { .. } => {
                let supplied = data.get(&field.name).filter(|v| !v.is_null());
                match supplied.or_else(|| resolve_default(layers, field)) {
                    Some(value) => value.clone(),
                    None if field.optional => Value::Null,
                    None => {
                        return Err(ConstructError::MissingValue {
                            record: owner.to_string(),
                            path: path.to_string(),
                        });
                    }
                }
            }
        };
        out.insert(field.name.clone(), value);
    }

    Ok(out)
}
