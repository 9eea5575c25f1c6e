//! Schema walker: one flag per leaf, dotted names, cascading defaults.
//!
//! The walker visits every field of a [`Signature`] or [`RecordSchema`]
//! depth-first in declaration order. Record fields are descended into with
//! their name appended to the current [`DottedPath`]; scalar fields are
//! handed to a [`FlagSink`] as a [`LeafFlag`].
//!
//! A leaf's default is resolved from a stack of override layers, most
//! specific first:
//!
//! 1. the externally supplied defaults object, narrowed by field name on the
//!    way down;
//! 2. the declared default of every enclosing record field (for example a
//!    parameter declared as `inner: Nested = Nested(x=5)`), outermost first;
//! 3. the leaf's own declared default.
//!
//! If none of these yields a value the flag has no default.
//!
//! # Example
//!
//! ```
//! use record_args_core::*;
//! use serde_json::json;
//!
//! let nested = RecordSchema::new("Nested")
//!     .with_field(FieldSpec::scalar("x", ScalarType::Int).with_default(1));
//! let sig = Signature::new("nested_default")
//!     .with_param(FieldSpec::record("inner", nested).with_default(json!({ "x": 5 })));
//!
//! let flags = leaf_flags(&sig).unwrap();
//! assert_eq!(flags.len(), 1);
//! assert_eq!(flags[0].path.as_str(), "inner.x");
//! assert_eq!(flags[0].default, Some(json!(5)));
//! ```

use serde_json::Value;
use tracing::debug;

use crate::path::DottedPath;
use crate::validate::{SchemaError, validate_defaults, validate_record, validate_signature};
use crate::{FieldKind, FieldSpec, RecordSchema, ScalarType, Signature};

/// A leaf field ready to be registered as a flag.
#[derive(Debug, Clone, PartialEq)]
pub struct LeafFlag {
    /// Dotted path; the flag name without its marker.
    pub path: DottedPath,
    /// Declared scalar type.
    pub ty: ScalarType,
    /// Resolved default, if any source provides one.
    pub default: Option<Value>,
    /// Whether the leaf may reconstruct to null.
    pub optional: bool,
    /// Help text.
    pub help: String,
}

impl LeafFlag {
    /// Flag as typed on the command line, e.g. `--b.x`.
    pub fn flag_name(&self, marker: &str) -> String {
        format!("{marker}{}", self.path)
    }

    /// A value must come from the command line.
    pub fn is_required(&self) -> bool {
        self.default.is_none() && !self.optional
    }
}

/// Receives leaf flags from the walker.
///
/// Implemented by the flag engine (which turns each leaf into a real
/// command-line flag) and by `Vec<LeafFlag>` for collecting.
pub trait FlagSink {
    /// Registers one leaf.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::DuplicateFlag`] if the path is already taken.
    fn register(&mut self, flag: LeafFlag) -> Result<(), SchemaError>;
}

impl FlagSink for Vec<LeafFlag> {
    fn register(&mut self, flag: LeafFlag) -> Result<(), SchemaError> {
        if self.iter().any(|f| f.path == flag.path) {
            return Err(SchemaError::DuplicateFlag(flag.path.to_string()));
        }
        self.push(flag);
        Ok(())
    }
}

/// Registers one flag per leaf of `signature`.
///
/// `defaults`, when given, is an object keyed by parameter name that takes
/// precedence over every declared default. It may be partial, but every key
/// must name a parameter and every value must fit its declared type.
///
/// # Errors
///
/// Fails fast with the first [`SchemaError`] from validation or from the sink.
/// A defaults object that does not fit the signature is
/// [`SchemaError::InvalidDefault`].
pub fn register_signature<S: FlagSink + ?Sized>(
    sink: &mut S,
    signature: &Signature,
    defaults: Option<&Value>,
) -> Result<(), SchemaError> {
    if let Some(err) = validate_signature(signature).into_iter().next() {
        return Err(err);
    }
    if let Some(defaults) = defaults {
        if let Some(err) = validate_defaults(&signature.params, &signature.name, defaults)
            .into_iter()
            .next()
        {
            return Err(err);
        }
    }
    let layers: Vec<&Value> = defaults.into_iter().collect();
    walk_fields(sink, &signature.params, None, &layers)
}

/// Registers one flag per leaf of `record`, with root-level dotted paths.
///
/// `defaults` plays the role of a default record instance and is checked
/// against the record's fields like a declared record default.
///
/// # Errors
///
/// Fails fast with the first [`SchemaError`] from validation or from the sink.
pub fn register_record<S: FlagSink + ?Sized>(
    sink: &mut S,
    record: &RecordSchema,
    defaults: Option<&Value>,
) -> Result<(), SchemaError> {
    if let Some(err) = validate_record(record).into_iter().next() {
        return Err(err);
    }
    if let Some(defaults) = defaults {
        if let Some(err) = validate_defaults(&record.fields, &record.name, defaults)
            .into_iter()
            .next()
        {
            return Err(err);
        }
    }
    let layers: Vec<&Value> = defaults.into_iter().collect();
    walk_fields(sink, &record.fields, None, &layers)
}

/// Collects the leaf flags of `signature` without a flag engine.
pub fn leaf_flags(signature: &Signature) -> Result<Vec<LeafFlag>, SchemaError> {
    let mut flags = Vec::new();
    register_signature(&mut flags, signature, None)?;
    Ok(flags)
}

fn walk_fields<S: FlagSink + ?Sized>(
    sink: &mut S,
    fields: &[FieldSpec],
    prefix: Option<&DottedPath>,
    layers: &[&Value],
) -> Result<(), SchemaError> {
    for field in fields {
        let path = DottedPath::join(prefix, &field.name);
        match &field.kind {
            FieldKind::Record { record } => {
                let child_layers = descend(layers, field);
                walk_fields(sink, &record.fields, Some(&path), &child_layers)?;
            }
            FieldKind::Scalar { ty } => {
                let default = resolve_default(layers, field).cloned();
                let help = field
                    .help
                    .clone()
                    .unwrap_or_else(|| format!("{path}: {}", field.declared_type_name()));
                debug!(flag = %path, ty = ty.name(), ?default, "registering leaf flag");
                sink.register(LeafFlag {
                    path,
                    ty: ty.clone(),
                    default,
                    optional: field.optional,
                    help,
                })?;
            }
        }
    }
    Ok(())
}

/// Override layers for the fields of the record held by `field`.
///
/// Outer layers narrowed to `field`, then `field`'s own declared default.
/// Non-object entries cannot override a record and are skipped.
pub(crate) fn descend<'a>(layers: &[&'a Value], field: &'a FieldSpec) -> Vec<&'a Value> {
    layers
        .iter()
        .copied()
        .filter_map(|layer| layer.get(field.name.as_str()))
        .chain(field.default.as_ref())
        .filter(|value| value.is_object())
        .collect()
}

/// First non-null value for `field` across `layers`, else its declared default.
pub(crate) fn resolve_default<'a>(layers: &[&'a Value], field: &'a FieldSpec) -> Option<&'a Value> {
    layers
        .iter()
        .copied()
        .find_map(|layer| layer.get(field.name.as_str()).filter(|v| !v.is_null()))
        .or(field.default.as_ref())
        .filter(|v| !v.is_null())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn nested() -> RecordSchema {
        RecordSchema::new("Nested")
            .with_field(FieldSpec::scalar("x", ScalarType::Int).with_default(1))
    }

    fn demo_class() -> RecordSchema {
        RecordSchema::new("DemoClass")
            .with_field(FieldSpec::scalar("a", ScalarType::Int))
            .with_field(FieldSpec::record("b", nested()))
            .with_field(FieldSpec::scalar("c", ScalarType::String).with_default("c"))
    }

    fn paths(flags: &[LeafFlag]) -> Vec<&str> {
        flags.iter().map(|f| f.path.as_str()).collect()
    }

    #[test]
    fn test_register_record_produces_dotted_leaves() {
        let mut flags = Vec::new();
        register_record(&mut flags, &demo_class(), None).unwrap();

        assert_eq!(paths(&flags), vec!["a", "b.x", "c"]);
        assert_eq!(flags[0].default, None);
        assert!(flags[0].is_required());
        assert_eq!(flags[1].default, Some(json!(1)));
        assert_eq!(flags[2].default, Some(json!("c")));
        assert_eq!(flags[1].flag_name("--"), "--b.x");
        assert_eq!(flags[1].help, "b.x: int");
    }

    #[test]
    fn test_parameter_default_overrides_record_default() {
        let sig = Signature::new("nested_default")
            .with_param(FieldSpec::record("inner", nested()).with_default(json!({ "x": 5 })));

        let flags = leaf_flags(&sig).unwrap();
        assert_eq!(flags[0].default, Some(json!(5)));
    }

    #[test]
    fn test_external_defaults_win_over_every_declared_default() {
        let sig = Signature::new("f")
            .with_param(FieldSpec::record("inner", nested()).with_default(json!({ "x": 5 })))
            .with_param(FieldSpec::scalar("c", ScalarType::String).with_default("c"));
        let external = json!({ "inner": { "x": 9 } });

        let mut flags = Vec::new();
        register_signature(&mut flags, &sig, Some(&external)).unwrap();

        assert_eq!(flags[0].default, Some(json!(9)));
        // No external value for `c`: falls back to the declared default.
        assert_eq!(flags[1].default, Some(json!("c")));
    }

    #[test]
    fn test_mismatched_external_defaults_fail_before_registration() {
        let sig = Signature::new("f")
            .with_param(FieldSpec::record("inner", nested()))
            .with_param(FieldSpec::scalar("c", ScalarType::String).with_default("c"));

        for external in [
            json!({ "inner": { "y": 3 } }),
            json!({ "c": { "k": 1 } }),
            json!({ "typo": 9 }),
            json!({ "inner": { "x": "abc" } }),
        ] {
            let mut flags = Vec::new();
            let err = register_signature(&mut flags, &sig, Some(&external)).unwrap_err();
            assert!(matches!(err, SchemaError::InvalidDefault(_)), "{external}: {err}");
            assert!(flags.is_empty());
        }

        let mut flags = Vec::new();
        let err = register_record(&mut flags, &demo_class(), Some(&json!({ "a": 1.5 }))).unwrap_err();
        assert!(matches!(err, SchemaError::InvalidDefault(_)));
        assert!(flags.is_empty());
    }

    #[test]
    fn test_defaults_cascade_through_three_levels() {
        let middle = RecordSchema::new("Middle")
            .with_field(FieldSpec::record("leaf", nested()).with_default(json!({ "x": 2 })))
            .with_field(FieldSpec::scalar("y", ScalarType::Float).with_default(0.5));
        let outer = RecordSchema::new("Outer")
            .with_field(FieldSpec::record("mid", middle).with_default(json!({ "y": 1.5 })));

        let mut flags = Vec::new();
        register_record(&mut flags, &outer, None).unwrap();

        assert_eq!(paths(&flags), vec!["mid.leaf.x", "mid.y"]);
        assert_eq!(flags[0].default, Some(json!(2)));
        assert_eq!(flags[1].default, Some(json!(1.5)));
    }

    #[test]
    fn test_partial_record_default_falls_through() {
        let pair = RecordSchema::new("Pair")
            .with_field(FieldSpec::scalar("x", ScalarType::Int).with_default(1))
            .with_field(FieldSpec::scalar("y", ScalarType::Int).with_default(2));
        let sig = Signature::new("f")
            .with_param(FieldSpec::record("p", pair).with_default(json!({ "y": 20 })));

        let flags = leaf_flags(&sig).unwrap();
        assert_eq!(flags[0].default, Some(json!(1)));
        assert_eq!(flags[1].default, Some(json!(20)));
    }

    #[test]
    fn test_optional_leaf_without_default_is_not_required() {
        let sig = Signature::new("f").with_param(FieldSpec::optional("tag", ScalarType::String));

        let flags = leaf_flags(&sig).unwrap();
        assert_eq!(flags[0].default, None);
        assert!(!flags[0].is_required());
    }

    #[test]
    fn test_invalid_schema_fails_before_registration() {
        let sig = Signature::new("f")
            .with_param(FieldSpec::scalar("a", ScalarType::Int))
            .with_param(FieldSpec::scalar("b.c", ScalarType::Int));

        let mut flags = Vec::new();
        let err = register_signature(&mut flags, &sig, None).unwrap_err();
        assert_eq!(err, SchemaError::InvalidSegment("b.c".to_string()));
        assert!(flags.is_empty());
    }

    #[test]
    fn test_vec_sink_rejects_duplicate_paths() {
        let mut flags = Vec::new();
        register_record(&mut flags, &demo_class(), None).unwrap();

        let err = register_record(&mut flags, &demo_class(), None).unwrap_err();
        assert_eq!(err, SchemaError::DuplicateFlag("a".to_string()));
    }

    #[test]
    fn test_custom_help_is_kept() {
        let sig = Signature::new("f").with_param(
            FieldSpec::scalar("lr", ScalarType::Float)
                .with_default(0.001)
                .with_help("Learning rate"),
        );

        assert_eq!(leaf_flags(&sig).unwrap()[0].help, "Learning rate");
    }
}
