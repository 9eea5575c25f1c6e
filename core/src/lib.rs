//! Schema trees and reconstruction for generated command-line parsers.
//!
//! This crate holds everything that does not depend on a concrete flag
//! parser:
//!
//! - [`Signature`], [`RecordSchema`], [`FieldSpec`]: an explicit schema tree
//!   of scalar leaves and nested records, describing a callable's parameters
//!   or a record's fields.
//! - [`register_signature`] / [`register_record`]: the schema walker, which
//!   hands one [`LeafFlag`] per leaf to a [`FlagSink`], named by its
//!   [`DottedPath`] and carrying a default resolved from cascading sources.
//! - [`nest`] / [`flatten`]: conversion between flat dotted-path mappings
//!   and nested mappings.
//! - [`construct`], [`construct_value`], [`construct_arguments`]: rebuild
//!   typed records and keyword arguments from nested parsed values.
//!
//! Validation ([`validate_signature`], [`validate_record`]) runs before any
//! flag is registered.
//!
//! # Example
//!
//! ```
//! use record_args_core::*;
//! use serde_json::json;
//!
//! let nested = RecordSchema::new("Nested")
//!     .with_field(FieldSpec::scalar("x", ScalarType::Int).with_default(1));
//! let sig = Signature::new("my_func")
//!     .with_param(FieldSpec::scalar("a", ScalarType::Int))
//!     .with_param(FieldSpec::record("b", nested))
//!     .with_param(FieldSpec::scalar("c", ScalarType::String).with_default("c"));
//!
//! let flags = leaf_flags(&sig).unwrap();
//! let names: Vec<_> = flags.iter().map(|f| f.flag_name("--")).collect();
//! assert_eq!(names, vec!["--a", "--b.x", "--c"]);
//!
//! // What a flag engine would hand back for `--a 1 --b.x 2 --c 3`.
//! let flat: FlatMapping = [
//!     ("a".to_string(), json!(1)),
//!     ("b.x".to_string(), json!(2)),
//!     ("c".to_string(), json!("3")),
//! ]
//! .into_iter()
//! .collect();
//!
//! let args = construct_arguments(&sig, &nest(&flat)).unwrap();
//! assert_eq!(args.get_value("b"), Some(&json!({ "x": 2 })));
//! ```

mod construct;
mod nest;
mod path;
mod types;
mod validate;
mod walk;

pub use construct::{
    ArgumentMap, ConstructError, construct, construct_arguments, construct_arguments_with,
    construct_value,
};
pub use nest::{FlatMapping, NestedMapping, flatten, nest};
pub use path::{DottedPath, PATH_SEPARATOR, is_valid_segment};
pub use types::*;
pub use validate::{SchemaError, validate_record, validate_signature};
pub use walk::{FlagSink, LeafFlag, leaf_flags, register_record, register_signature};
