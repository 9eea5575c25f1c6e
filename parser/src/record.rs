//! Argument parser generated from a single typed record.

use std::marker::PhantomData;

use record_args_core::{
    ConstructError, LeafFlag, Record, RecordSchema, construct_value, nest, register_record,
};
use serde_json::Value;

use crate::engine::ClapEngine;
use crate::error::Result;

/// Builds a command line whose flags are the leaves of `T`, and parses
/// tokens straight into a `T`.
///
/// # Examples
///
/// ```
/// use record_args::{FieldSpec, Record, RecordArgumentParser, RecordSchema, ScalarType};
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Debug, PartialEq, Serialize, Deserialize)]
/// struct Checkpoint {
///     interval: i64,
///     upload: i64,
/// }
///
/// impl Record for Checkpoint {
///     fn schema() -> RecordSchema {
///         RecordSchema::new("Checkpoint")
///             .with_field(FieldSpec::scalar("interval", ScalarType::Int).with_default(1))
///             .with_field(FieldSpec::scalar("upload", ScalarType::Int).with_default(2))
///     }
/// }
///
/// let parser = RecordArgumentParser::<Checkpoint>::new("checkpoint").unwrap();
/// let parsed = parser.try_parse_from(["--upload", "10"]).unwrap();
/// assert_eq!(parsed, Checkpoint { interval: 1, upload: 10 });
/// ```
#[derive(Debug, Clone)]
pub struct RecordArgumentParser<T: Record> {
    schema: RecordSchema,
    default: Option<Value>,
    engine: ClapEngine,
    _record: PhantomData<fn() -> T>,
}

impl<T: Record> RecordArgumentParser<T> {
    /// Builds a parser using the record's declared defaults.
    pub fn new(program: &str) -> Result<Self> {
        Self::build(program, None)
    }

    /// Builds a parser whose defaults come from `default` first.
    pub fn with_default(program: &str, default: &T) -> Result<Self> {
        let default = serde_json::to_value(default)?;
        Self::build(program, Some(default))
    }

    fn build(program: &str, default: Option<Value>) -> Result<Self> {
        let schema = T::schema();
        let mut engine = ClapEngine::new(program);
        register_record(&mut engine, &schema, default.as_ref())?;
        Ok(Self {
            schema,
            default,
            engine,
            _record: PhantomData,
        })
    }

    pub fn schema(&self) -> &RecordSchema {
        &self.schema
    }

    pub fn flags(&self) -> &[LeafFlag] {
        self.engine.flags()
    }

    pub fn render_help(&self) -> String {
        self.engine.render_help()
    }

    /// Parses tokens (without the program name) into a record.
    pub fn try_parse_from<I, S>(&self, tokens: I) -> Result<T>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut flat = self.engine.try_parse_from(tokens)?;
        flat.retain(|_, value| !value.is_null());

        let value = construct_value(&self.schema, &nest(&flat), self.default.as_ref())?;
        let record = serde_json::from_value(value).map_err(|source| ConstructError::Deserialize {
            record: self.schema.name.clone(),
            source,
        })?;
        Ok(record)
    }
}
