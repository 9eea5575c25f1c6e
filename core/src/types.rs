//! Schema tree definitions.
//!
//! A [`Signature`] is the parameter list of a callable; a [`RecordSchema`] is
//! the field list of a structured record. Both are ordered lists of
//! [`FieldSpec`], and every field is either a scalar leaf or another record
//! ([`FieldKind`]). The walker and the reconstructor operate only on this
//! tree, so it can be written by hand, produced by a [`Record`] impl, or
//! loaded from a JSON/YAML document.

use std::fmt;
use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::validate::SchemaError;

/// Declared type of a leaf field.
///
/// The flag engine uses this to pick a value parser; the reconstructor never
/// coerces values itself.
///
/// # Examples
///
/// ```
/// use record_args_core::ScalarType;
///
/// let ty: ScalarType = "integer".parse().unwrap();
/// assert_eq!(ty, ScalarType::Int);
/// assert_eq!(ty.name(), "int");
/// assert!("complex".parse::<ScalarType>().is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScalarType {
    /// `true` / `false`.
    #[serde(alias = "boolean")]
    Bool,
    /// Signed 64-bit integer.
    #[serde(alias = "integer")]
    Int,
    /// 64-bit float.
    #[serde(alias = "number")]
    Float,
    /// Free-form text.
    #[serde(alias = "str")]
    String,
    /// One of a fixed set of strings (e.g. `--format json|yaml`).
    Choice(Vec<String>),
}

impl ScalarType {
    /// Short lower-case name used in help text.
    pub fn name(&self) -> &'static str {
        match self {
            ScalarType::Bool => "bool",
            ScalarType::Int => "int",
            ScalarType::Float => "float",
            ScalarType::String => "string",
            ScalarType::Choice(_) => "choice",
        }
    }

    /// Returns `true` if `value` is a valid instance of this type.
    ///
    /// Integers are accepted where floats are declared.
    ///
    /// # Examples
    ///
    /// ```
    /// use record_args_core::ScalarType;
    /// use serde_json::json;
    ///
    /// assert!(ScalarType::Float.accepts(&json!(1)));
    /// assert!(!ScalarType::Int.accepts(&json!(1.5)));
    /// assert!(!ScalarType::Int.accepts(&json!(u64::MAX)));
    /// let format = ScalarType::Choice(vec!["json".into(), "yaml".into()]);
    /// assert!(format.accepts(&json!("yaml")));
    /// assert!(!format.accepts(&json!("toml")));
    /// ```
    pub fn accepts(&self, value: &Value) -> bool {
        match self {
            ScalarType::Bool => value.is_boolean(),
            ScalarType::Int => value.is_i64(),
            ScalarType::Float => value.is_number(),
            ScalarType::String => value.is_string(),
            ScalarType::Choice(choices) => value
                .as_str()
                .is_some_and(|s| choices.iter().any(|c| c == s)),
        }
    }
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScalarType::Choice(choices) => write!(f, "{}", choices.join("|")),
            other => f.write_str(other.name()),
        }
    }
}

impl FromStr for ScalarType {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bool" | "boolean" => Ok(ScalarType::Bool),
            "int" | "integer" => Ok(ScalarType::Int),
            "float" | "number" => Ok(ScalarType::Float),
            "string" | "str" => Ok(ScalarType::String),
            _ => Err(SchemaError::UnknownType(s.to_string())),
        }
    }
}

/// Leaf or nested record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldKind {
    /// A scalar leaf; becomes exactly one flag.
    Scalar {
        #[serde(rename = "type")]
        ty: ScalarType,
    },
    /// A nested record; its leaves become flags under this field's name.
    Record { record: RecordSchema },
}

/// One parameter of a [`Signature`] or one field of a [`RecordSchema`].
///
/// `default` holds a scalar for leaves and a JSON object for records. A
/// record default only needs the keys it overrides; the rest fall through to
/// the nested record's own field defaults.
///
/// # Examples
///
/// ```
/// use record_args_core::{FieldSpec, RecordSchema, ScalarType};
///
/// let nested = RecordSchema::new("Nested")
///     .with_field(FieldSpec::scalar("x", ScalarType::Int).with_default(1));
///
/// let lr = FieldSpec::scalar("lr", ScalarType::Float).with_default(0.001);
/// assert!(!lr.is_nested());
/// assert_eq!(lr.declared_type_name(), "float");
///
/// let inner = FieldSpec::record("inner", nested)
///     .with_default(serde_json::json!({ "x": 5 }));
/// assert!(inner.is_nested());
/// assert_eq!(inner.declared_type_name(), "Nested");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    /// Field or parameter name; one dotted-path segment.
    pub name: String,
    /// Leaf type or nested record.
    #[serde(flatten)]
    pub kind: FieldKind,
    /// Declared default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    /// Whether a missing value may be filled with null.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub optional: bool,
    /// Help text shown by the flag engine.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub help: Option<String>,
}

impl FieldSpec {
    /// Creates a required scalar field with no default.
    pub fn scalar(name: &str, ty: ScalarType) -> Self {
        Self {
            name: name.to_string(),
            kind: FieldKind::Scalar { ty },
            default: None,
            optional: false,
            help: None,
        }
    }

    /// Creates a scalar field that reconstructs to null when no value is
    /// supplied (an `Option<T>` field on the typed side).
    pub fn optional(name: &str, ty: ScalarType) -> Self {
        Self {
            optional: true,
            ..Self::scalar(name, ty)
        }
    }

    /// Creates a nested record field.
    pub fn record(name: &str, record: RecordSchema) -> Self {
        Self {
            name: name.to_string(),
            kind: FieldKind::Record { record },
            default: None,
            optional: false,
            help: None,
        }
    }

    /// Creates a nested record field from a typed [`Record`].
    pub fn nested<R: Record>(name: &str) -> Self {
        Self::record(name, R::schema())
    }

    /// Sets the declared default.
    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self
    }

    /// Sets a record default from a typed instance.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::InvalidDefault`] if the instance cannot be
    /// serialized to a JSON value.
    pub fn with_record_default<R: Record>(mut self, default: &R) -> Result<Self, SchemaError> {
        let value = serde_json::to_value(default)
            .map_err(|err| SchemaError::InvalidDefault(format!("{}: {err}", self.name)))?;
        self.default = Some(value);
        Ok(self)
    }

    /// Adds help text.
    pub fn with_help(mut self, help: &str) -> Self {
        self.help = Some(help.to_string());
        self
    }

    /// Returns `true` if the field is a nested record.
    pub fn is_nested(&self) -> bool {
        matches!(self.kind, FieldKind::Record { .. })
    }

    /// Scalar type name or record name.
    pub fn declared_type_name(&self) -> &str {
        match &self.kind {
            FieldKind::Scalar { ty } => ty.name(),
            FieldKind::Record { record } => &record.name,
        }
    }
}

/// Ordered field list of a structured record.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RecordSchema {
    /// Record type name (e.g. `"DemoClass"`).
    pub name: String,
    /// Fields in declaration order.
    pub fields: Vec<FieldSpec>,
}

impl RecordSchema {
    /// Creates an empty record schema.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            fields: Vec::new(),
        }
    }

    /// Appends a field.
    pub fn with_field(mut self, field: FieldSpec) -> Self {
        self.fields.push(field);
        self
    }

    /// Finds a field by name.
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// Parameter list of a callable.
///
/// # Examples
///
/// ```
/// use record_args_core::{FieldSpec, ScalarType, Signature};
///
/// let sig = Signature::new("train")
///     .with_description("Train a model")
///     .with_param(FieldSpec::scalar("lr", ScalarType::Float).with_default(0.001));
/// assert_eq!(sig.param_names(), vec!["lr"]);
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Signature {
    /// Callable name, used as the program name by default.
    pub name: String,
    /// Description shown in usage text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Parameters in declaration order.
    pub params: Vec<FieldSpec>,
}

impl Signature {
    /// Creates an empty signature.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    /// Adds a description.
    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    /// Appends a parameter.
    pub fn with_param(mut self, param: FieldSpec) -> Self {
        self.params.push(param);
        self
    }

    /// Finds a parameter by name.
    pub fn param(&self, name: &str) -> Option<&FieldSpec> {
        self.params.iter().find(|p| p.name == name)
    }

    /// Gets all parameter names.
    pub fn param_names(&self) -> Vec<&str> {
        self.params.iter().map(|p| p.name.as_str()).collect()
    }
}

/// A typed structured record.
///
/// Instances are rebuilt from the reconstructed JSON object through serde,
/// so `schema()` must describe the same field names the serde derive uses.
/// `Option<T>` fields should be declared with [`FieldSpec::optional`].
///
/// # Examples
///
/// ```
/// use record_args_core::{FieldSpec, Record, RecordSchema, ScalarType};
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Debug, PartialEq, Serialize, Deserialize)]
/// struct Nested {
///     x: i64,
/// }
///
/// impl Record for Nested {
///     fn schema() -> RecordSchema {
///         RecordSchema::new("Nested")
///             .with_field(FieldSpec::scalar("x", ScalarType::Int).with_default(1))
///     }
/// }
///
/// assert_eq!(Nested::schema().fields.len(), 1);
/// ```
pub trait Record: Serialize + DeserializeOwned {
    /// Describes the record's fields.
    fn schema() -> RecordSchema;
}
