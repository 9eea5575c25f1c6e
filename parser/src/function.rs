//! Argument parser generated from a callable signature.

use std::ffi::OsString;

use clap::error::ErrorKind;
use record_args_core::{
    ArgumentMap, FlatMapping, LeafFlag, NestedMapping, Signature, construct_arguments_with, nest,
    register_signature,
};
use serde_json::Value;
use tracing::debug;

use crate::config::{ParserConfig, load_defaults};
use crate::engine::ClapEngine;
use crate::error::{Error, Result};

/// Builds a command line from a [`Signature`] and resolves parsed tokens
/// into keyword arguments.
///
/// The pipeline is: walk the signature and register one flag per leaf,
/// parse tokens with clap, drop null entries, [`nest`] the dotted names, and
/// reconstruct every parameter.
///
/// # Examples
///
/// ```
/// use record_args::{FieldSpec, FunctionArgumentParser, RecordSchema, ScalarType, Signature};
/// use serde_json::json;
///
/// let model = RecordSchema::new("ModelConfig")
///     .with_field(FieldSpec::scalar("num_layers", ScalarType::Int).with_default(3));
/// let train = Signature::new("train")
///     .with_param(FieldSpec::scalar("lr", ScalarType::Float).with_default(0.001))
///     .with_param(FieldSpec::record("model", model));
///
/// let parser = FunctionArgumentParser::new(train).unwrap();
/// let args = parser.try_parse_from(["--model.num_layers", "6"]).unwrap();
///
/// assert_eq!(args.get::<f64>("lr").unwrap(), 0.001);
/// assert_eq!(args.get_value("model"), Some(&json!({ "num_layers": 6 })));
/// ```
#[derive(Debug, Clone)]
pub struct FunctionArgumentParser {
    signature: Signature,
    config: ParserConfig,
    defaults: Option<Value>,
    engine: ClapEngine,
}

impl FunctionArgumentParser {
    /// Builds a parser with default settings.
    ///
    /// # Errors
    ///
    /// [`Error::Schema`] if the signature fails validation.
    pub fn new(signature: Signature) -> Result<Self> {
        Self::build(signature, ParserConfig::default(), None)
    }

    /// Builds a parser from a [`ParserConfig`], loading its defaults file
    /// when one is set.
    pub fn from_config(signature: Signature, config: &ParserConfig) -> Result<Self> {
        let defaults = config
            .defaults_file
            .as_ref()
            .map(load_defaults)
            .transpose()?
            .map(Value::Object);
        Self::build(signature, config.clone(), defaults)
    }

    /// Rebuilds the parser with an externally supplied defaults object.
    ///
    /// These values beat every declared default; command-line flags still
    /// beat them.
    pub fn with_defaults(self, defaults: NestedMapping) -> Result<Self> {
        Self::build(self.signature, self.config, Some(Value::Object(defaults)))
    }

    fn build(signature: Signature, config: ParserConfig, defaults: Option<Value>) -> Result<Self> {
        config.validate()?;

        let program = config.program.as_deref().unwrap_or(&signature.name);
        let mut engine = ClapEngine::new(program).with_marker(&config.flag_marker);
        if let Some(about) = config.about.as_deref().or(signature.description.as_deref()) {
            engine = engine.with_about(about);
        }

        register_signature(&mut engine, &signature, defaults.as_ref())?;
        debug!(
            signature = %signature.name,
            flags = engine.flags().len(),
            "built function argument parser"
        );

        Ok(Self {
            signature,
            config,
            defaults,
            engine,
        })
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    /// Leaves registered on the engine, in declaration order.
    pub fn flags(&self) -> &[LeafFlag] {
        self.engine.flags()
    }

    pub fn render_help(&self) -> String {
        self.engine.render_help()
    }

    /// Parses tokens into the flat dotted-path mapping, without
    /// reconstruction. Null entries are dropped.
    pub fn try_parse_flat<I, T>(&self, tokens: I) -> Result<FlatMapping>
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        let mut flat = self.engine.try_parse_from(tokens)?;
        flat.retain(|_, value| !value.is_null());
        Ok(flat)
    }

    /// Parses tokens (without the program name) into keyword arguments.
    ///
    /// # Errors
    ///
    /// [`Error::Parse`] for usage and coercion errors (including `--help`),
    /// [`Error::Construct`] when a required value is missing.
    pub fn try_parse_from<I, T>(&self, tokens: I) -> Result<ArgumentMap>
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        let flat = self.try_parse_flat(tokens)?;
        let nested = nest(&flat);
        let args = construct_arguments_with(&self.signature, &nested, self.defaults.as_ref())?;
        Ok(args)
    }

    /// Parses the process arguments.
    ///
    /// Usage errors, non-UTF-8 arguments and `--help` exit through clap; any
    /// other error is printed and exits with status 2.
    pub fn parse(&self) -> ArgumentMap {
        let parsed = utf8_tokens(std::env::args_os().skip(1))
            .and_then(|tokens| self.try_parse_from(tokens));
        match parsed {
            Ok(args) => args,
            Err(Error::Parse(err)) => err.exit(),
            Err(err) => {
                eprintln!("error: {err}");
                std::process::exit(2);
            }
        }
    }
}

/// Converts process arguments to tokens, rejecting any that are not UTF-8.
fn utf8_tokens<I>(args: I) -> Result<Vec<String>>
where
    I: IntoIterator<Item = OsString>,
{
    args.into_iter()
        .map(|arg| {
            arg.into_string().map_err(|arg| {
                Error::Parse(clap::Error::raw(
                    ErrorKind::InvalidUtf8,
                    format!(
                        "invalid UTF-8 was detected in argument '{}'\n",
                        arg.to_string_lossy()
                    ),
                ))
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use record_args_core::{ConstructError, FieldSpec, RecordSchema, ScalarType, SchemaError};
    use serde_json::json;

    use super::*;

    fn nested() -> RecordSchema {
        RecordSchema::new("Nested")
            .with_field(FieldSpec::scalar("x", ScalarType::Int).with_default(1))
    }

    fn my_func() -> Signature {
        Signature::new("my_func")
            .with_param(FieldSpec::scalar("a", ScalarType::Int))
            .with_param(FieldSpec::record("b", nested()))
            .with_param(FieldSpec::scalar("c", ScalarType::String).with_default("c"))
    }

    #[test]
    fn test_function_arg_parser() {
        let parser = FunctionArgumentParser::new(my_func()).unwrap();
        let args = parser
            .try_parse_from(["--a", "1", "--b.x", "2", "--c", "3"])
            .unwrap();

        assert_eq!(
            Value::from(args),
            json!({ "a": 1, "b": { "x": 2 }, "c": "3" })
        );
    }

    #[test]
    fn test_missing_required_parameter() {
        let parser = FunctionArgumentParser::new(my_func()).unwrap();
        let err = parser.try_parse_from(["--b.x", "2"]).unwrap_err();

        assert!(matches!(
            err,
            Error::Construct(ConstructError::MissingValue { ref path, .. }) if path == "a"
        ));
    }

    #[test]
    fn test_external_defaults_sit_between_flags_and_declarations() {
        let defaults = json!({ "b": { "x": 7 }, "c": "file" });
        let parser = FunctionArgumentParser::new(my_func())
            .unwrap()
            .with_defaults(defaults.as_object().unwrap().clone())
            .unwrap();

        let args = parser.try_parse_from(["--a", "1", "--c", "cli"]).unwrap();
        assert_eq!(args.get_value("b"), Some(&json!({ "x": 7 })));
        assert_eq!(args.get::<String>("c").unwrap(), "cli");
    }

    #[test]
    fn test_config_sets_program_and_marker() {
        let config = ParserConfig {
            program: Some("demo".to_string()),
            about: Some("A demo".to_string()),
            flag_marker: "+".to_string(),
            defaults_file: None,
        };
        let parser = FunctionArgumentParser::from_config(my_func(), &config).unwrap();

        let args = parser.try_parse_from(["+a", "5"]).unwrap();
        assert_eq!(args.get::<i64>("a").unwrap(), 5);
        assert!(parser.render_help().contains("A demo"));
    }

    #[test]
    fn test_invalid_signature_fails_at_construction() {
        let sig = Signature::new("f")
            .with_param(FieldSpec::scalar("a", ScalarType::Int))
            .with_param(FieldSpec::scalar("a", ScalarType::Int));

        let err = FunctionArgumentParser::new(sig).unwrap_err();
        assert!(matches!(err, Error::Schema(SchemaError::DuplicateField(_))));
    }

    #[test]
    fn test_help_request_is_a_parse_error() {
        let parser = FunctionArgumentParser::new(my_func()).unwrap();
        let err = parser.try_parse_from(["--help"]).unwrap_err();

        match err {
            Error::Parse(err) => assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_mismatched_defaults_are_rejected_at_build() {
        let parser = FunctionArgumentParser::new(my_func()).unwrap();
        let defaults = json!({ "b": { "y": 3 }, "c": { "k": 1 }, "typo": 9 });

        let err = parser
            .with_defaults(defaults.as_object().unwrap().clone())
            .unwrap_err();
        assert!(matches!(err, Error::Schema(SchemaError::InvalidDefault(_))));
    }

    #[test]
    fn test_mistyped_default_is_rejected_at_build() {
        let parser = FunctionArgumentParser::new(my_func()).unwrap();
        let defaults = json!({ "a": "abc" });

        let err = parser
            .with_defaults(defaults.as_object().unwrap().clone())
            .unwrap_err();
        assert!(matches!(err, Error::Schema(SchemaError::InvalidDefault(ref msg)) if msg.starts_with("a:")));
    }

    #[test]
    fn test_utf8_tokens_pass_through() {
        let tokens = utf8_tokens(["--a", "1"].map(OsString::from)).unwrap();
        assert_eq!(tokens, vec!["--a", "1"]);
    }

    #[cfg(unix)]
    #[test]
    fn test_non_utf8_token_is_an_invalid_utf8_error() {
        use std::os::unix::ffi::OsStringExt;

        let args = vec![
            OsString::from("--c"),
            OsString::from_vec(vec![b'a', 0x80, b'b']),
        ];
        match utf8_tokens(args).unwrap_err() {
            Error::Parse(err) => assert_eq!(err.kind(), ErrorKind::InvalidUtf8),
            other => panic!("unexpected error: {other}"),
        }
    }
}
