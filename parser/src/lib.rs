//! Command-line parsers generated from callable signatures and records.
//!
//! Describe a callable's parameters as a [`Signature`] (or a record as a
//! [`Record`]) and get a working command line with one `--dotted.path` flag
//! per scalar leaf, defaults that cascade through nested records, and typed
//! values reconstructed from whatever the user typed.
//!
//! - [`FunctionArgumentParser`]: flags for every parameter of a signature;
//!   parses into an [`ArgumentMap`] of keyword arguments.
//! - [`RecordArgumentParser`]: flags for every field of one record; parses
//!   straight into the typed record.
//! - [`ClapEngine`]: the clap-backed flag engine both parsers register on.
//! - [`ParserConfig`] / [`load_defaults`]: YAML parser settings and
//!   defaults files.
//!
//! The schema tree, the walker, nesting and reconstruction live in
//! `record-args-core` and are re-exported here.
//!
//! # Example
//!
//! ```
//! use record_args::*;
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Debug, PartialEq, Serialize, Deserialize)]
//! struct ModelConfig {
//!     num_layers: i64,
//! }
//!
//! impl Record for ModelConfig {
//!     fn schema() -> RecordSchema {
//!         RecordSchema::new("ModelConfig")
//!             .with_field(FieldSpec::scalar("num_layers", ScalarType::Int).with_default(3))
//!     }
//! }
//!
//! let train = Signature::new("train")
//!     .with_param(FieldSpec::scalar("lr", ScalarType::Float).with_default(0.001))
//!     .with_param(FieldSpec::nested::<ModelConfig>("model"));
//!
//! let parser = FunctionArgumentParser::new(train).unwrap();
//! let args = parser.try_parse_from(["--lr", "0.1"]).unwrap();
//!
//! assert_eq!(args.get::<f64>("lr").unwrap(), 0.1);
//! assert_eq!(args.get::<ModelConfig>("model").unwrap(), ModelConfig { num_layers: 3 });
//! ```

mod config;
mod engine;
mod error;
mod function;
mod record;

pub use config::{ParserConfig, load_defaults};
pub use engine::{ClapEngine, DEFAULT_FLAG_MARKER};
pub use error::{Error, Result};
pub use function::FunctionArgumentParser;
pub use record::RecordArgumentParser;
pub use record_args_core::*;
