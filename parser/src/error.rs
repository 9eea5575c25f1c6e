//! Error types for parser construction and argument parsing.
//!
//! Wraps the core schema and reconstruction errors together with everything
//! the clap engine and the configuration loaders can fail with.

use record_args_core::{ConstructError, SchemaError};
use thiserror::Error;

/// Errors that can occur while building a parser or parsing arguments.
#[derive(Debug, Error)]
pub enum Error {
    /// The signature or record schema is malformed.
    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),

    /// A record or argument mapping could not be rebuilt.
    #[error("construction error: {0}")]
    Construct(#[from] ConstructError),

    /// Usage error, type-coercion error, or a `--help` request.
    #[error("{0}")]
    Parse(#[from] clap::Error),

    /// A parsed value could not be read back with its registered type.
    #[error("argument lookup failed: {0}")]
    Matches(#[from] clap::parser::MatchesError),

    /// File I/O failure.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON parsing or serialization failure.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// YAML parsing or serialization failure.
    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    /// Parser configuration failed validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A defaults document is not a mapping.
    #[error("invalid defaults: {0}")]
    InvalidDefaults(String),
}

/// Convenience alias for results with [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
