//! Parser configuration and defaults files.
//!
//! [`ParserConfig`] is YAML-serializable so a program can keep its parser
//! settings next to its other configuration:
//!
//! ```yaml
//! program: train
//! about: Train a model
//! flag_marker: "--"
//! defaults_file: configs/train-defaults.yaml
//! ```
//!
//! A defaults file is a JSON (`.json`) or YAML document keyed by parameter
//! name. Its values beat every declared default, and flags given on the
//! command line beat it:
//!
//! ```yaml
//! lr: 0.01
//! model:
//!   num_layers: 6
//! ```

use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use record_args_core::NestedMapping;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::engine::DEFAULT_FLAG_MARKER;
use crate::error::{Error, Result};

/// Settings for building an argument parser.
///
/// # Examples
///
/// ```
/// use record_args::ParserConfig;
///
/// let config: ParserConfig = serde_yaml::from_str("program: train\n").unwrap();
/// assert_eq!(config.program.as_deref(), Some("train"));
/// assert_eq!(config.flag_marker, "--");
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    /// Program name in usage text (defaults to the signature name).
    pub program: Option<String>,
    /// Description in usage text (defaults to the signature description).
    pub about: Option<String>,
    /// Prefix that marks a flag on the command line.
    pub flag_marker: String,
    /// Defaults file applied on top of declared defaults.
    pub defaults_file: Option<PathBuf>,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            program: None,
            about: None,
            flag_marker: DEFAULT_FLAG_MARKER.to_string(),
            defaults_file: None,
        }
    }
}

impl ParserConfig {
    /// Loads configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`IoError`](Error::IoError) if the file cannot be read, or
    /// [`YamlError`](Error::YamlError) if parsing fails.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let reader = BufReader::new(file);
        let config = serde_yaml::from_reader(reader)?;
        Ok(config)
    }

    /// Saves the configuration as YAML.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = BufWriter::new(file);
        serde_yaml::to_writer(writer, self)?;
        Ok(())
    }

    /// Checks that the flag marker can be told apart from values.
    ///
    /// # Errors
    ///
    /// [`InvalidConfig`](Error::InvalidConfig) for an empty marker or one
    /// containing whitespace or `=`.
    pub fn validate(&self) -> Result<()> {
        let marker = &self.flag_marker;
        if marker.is_empty() {
            return Err(Error::InvalidConfig("flag marker cannot be empty".to_string()));
        }
        if marker.chars().any(|c| c.is_whitespace() || c == '=') {
            return Err(Error::InvalidConfig(format!(
                "flag marker cannot contain whitespace or '=': {marker:?}"
            )));
        }
        Ok(())
    }
}

/// Reads a defaults document into a nested mapping.
///
/// Files ending in `.json` are parsed as JSON, anything else as YAML.
///
/// # Errors
///
/// I/O and parse errors, or [`InvalidDefaults`](Error::InvalidDefaults) if
/// the document is not a mapping.
pub fn load_defaults(path: impl AsRef<Path>) -> Result<NestedMapping> {
    let path = path.as_ref();
    let raw = std::fs::read_to_string(path)?;
    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    let value: Value = if is_json {
        serde_json::from_str(&raw)?
    } else {
        serde_yaml::from_str(&raw)?
    };

    debug!(path = %path.display(), "loaded defaults file");
    match value {
        Value::Object(map) => Ok(map),
        Value::Null => Ok(NestedMapping::new()),
        other => Err(Error::InvalidDefaults(format!(
            "{}: expected a mapping, found {other}",
            path.display()
        ))),
    }
}
