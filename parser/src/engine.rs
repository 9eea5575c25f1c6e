//! clap-backed flag engine.
//!
//! [`ClapEngine`] is the flag-parsing collaborator: the schema walker
//! registers leaves on it through [`FlagSink`], and
//! [`try_parse_from`](ClapEngine::try_parse_from) turns raw tokens into a
//! [`FlatMapping`]. Tokenization, type coercion, usage errors and help
//! rendering are all clap's.
//!
//! Flags are never marked required here. A leaf that ends up with no value
//! is reported by the reconstructor, which knows whether the field is
//! optional.

use clap::builder::PossibleValuesParser;
use clap::parser::ValueSource;
use clap::{Arg, ArgAction, ArgMatches, Command, value_parser};
use record_args_core::{FlagSink, FlatMapping, LeafFlag, ScalarType, SchemaError};
use serde_json::Value;
use tracing::debug;

use crate::error::Result;

/// Marker clap uses for long flags.
pub const DEFAULT_FLAG_MARKER: &str = "--";

/// Flag names reserved by clap itself.
const RESERVED_FLAGS: &[&str] = &["help"];

/// A flag engine over clap's builder API.
///
/// # Examples
///
/// ```
/// use record_args::{ClapEngine, FlagSink, LeafFlag, DottedPath, ScalarType};
/// use serde_json::json;
///
/// let mut engine = ClapEngine::new("demo");
/// engine
///     .register(LeafFlag {
///         path: DottedPath::root("b").child("x"),
///         ty: ScalarType::Int,
///         default: Some(json!(1)),
///         optional: false,
///         help: "b.x: int".into(),
///     })
///     .unwrap();
///
/// let flat = engine.try_parse_from(["--b.x", "2"]).unwrap();
/// assert_eq!(flat.get("b.x"), Some(&json!(2)));
///
/// let flat = engine.try_parse_from(Vec::<String>::new()).unwrap();
/// assert_eq!(flat.get("b.x"), Some(&json!(1)));
/// ```
#[derive(Debug, Clone)]
pub struct ClapEngine {
    program: String,
    about: Option<String>,
    marker: String,
    flags: Vec<LeafFlag>,
}

impl ClapEngine {
    /// Creates an engine with no flags.
    pub fn new(program: &str) -> Self {
        Self {
            program: program.to_string(),
            about: None,
            marker: DEFAULT_FLAG_MARKER.to_string(),
            flags: Vec::new(),
        }
    }

    /// Sets the description shown in usage text.
    pub fn with_about(mut self, about: &str) -> Self {
        self.about = Some(about.to_string());
        self
    }

    /// Sets the flag marker accepted in addition to `--`.
    pub fn with_marker(mut self, marker: &str) -> Self {
        self.marker = marker.to_string();
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn marker(&self) -> &str {
        &self.marker
    }

    /// Registered leaves, in registration order.
    pub fn flags(&self) -> &[LeafFlag] {
        &self.flags
    }

    /// Parses `tokens` (without the program name).
    ///
    /// Flags that were neither given nor have a default are left out of the
    /// result.
    ///
    /// # Errors
    ///
    /// [`Error::Parse`](crate::Error::Parse) for unknown flags, values that
    /// do not coerce to the declared type, and `--help`.
    pub fn try_parse_from<I, T>(&self, tokens: I) -> Result<FlatMapping>
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        let argv = std::iter::once(self.program.clone())
            .chain(tokens.into_iter().map(|t| self.normalize_token(t.into())));
        let matches = self.build_command().try_get_matches_from(argv)?;
        self.collect(&matches)
    }

    /// Renders clap's help text.
    pub fn render_help(&self) -> String {
        self.build_command().render_help().to_string()
    }

    fn build_command(&self) -> Command {
        let mut command = Command::new(self.program.clone());
        if let Some(about) = &self.about {
            command = command.about(about.clone());
        }
        for flag in &self.flags {
            command = command.arg(build_arg(flag));
        }
        command
    }

    /// Rewrites `<marker>name` to `--name` for registered names.
    fn normalize_token(&self, token: String) -> String {
        if self.marker == DEFAULT_FLAG_MARKER {
            return token;
        }
        let Some(rest) = token.strip_prefix(self.marker.as_str()) else {
            return token;
        };
        let name = rest.split('=').next().unwrap_or(rest);
        let known = RESERVED_FLAGS.contains(&name) || self.flags.iter().any(|f| f.path.as_str() == name);
        if known {
            format!("{DEFAULT_FLAG_MARKER}{rest}")
        } else {
            token
        }
    }

    fn collect(&self, matches: &ArgMatches) -> Result<FlatMapping> {
        let mut flat = FlatMapping::new();

        for flag in &self.flags {
            let id = flag.path.as_str();
            let value = match &flag.ty {
                ScalarType::Bool => matches.try_get_one::<bool>(id)?.map(|v| Value::Bool(*v)),
                ScalarType::Int => matches.try_get_one::<i64>(id)?.map(|v| Value::from(*v)),
                ScalarType::Float => matches.try_get_one::<f64>(id)?.map(|v| Value::from(*v)),
                ScalarType::String | ScalarType::Choice(_) => matches
                    .try_get_one::<String>(id)?
                    .map(|v| Value::String(v.clone())),
            };

            if let Some(value) = value {
                let from_default = matches.value_source(id) == Some(ValueSource::DefaultValue);
                debug!(flag = id, %value, from_default, "parsed flag");
                flat.insert(id.to_string(), value);
            }
        }

        Ok(flat)
    }
}

impl FlagSink for ClapEngine {
    fn register(&mut self, flag: LeafFlag) -> std::result::Result<(), SchemaError> {
        let path = flag.path.as_str();
        if RESERVED_FLAGS.contains(&path) || self.flags.iter().any(|f| f.path == flag.path) {
            return Err(SchemaError::DuplicateFlag(path.to_string()));
        }
        self.flags.push(flag);
        Ok(())
    }
}

fn build_arg(flag: &LeafFlag) -> Arg {
    let name = flag.path.to_string();
    let mut arg = Arg::new(name.clone())
        .long(name)
        .help(flag.help.clone())
        .action(ArgAction::Set);

    arg = match &flag.ty {
        ScalarType::Bool => arg
            .value_parser(value_parser!(bool))
            .num_args(0..=1)
            .default_missing_value("true")
            .value_name("BOOL"),
        ScalarType::Int => arg
            .value_parser(value_parser!(i64))
            .allow_negative_numbers(true)
            .value_name("INT"),
        ScalarType::Float => arg
            .value_parser(value_parser!(f64))
            .allow_negative_numbers(true)
            .value_name("FLOAT"),
        ScalarType::String => arg.value_parser(value_parser!(String)).value_name("TEXT"),
        ScalarType::Choice(choices) => arg
            .value_parser(PossibleValuesParser::new(choices.clone()))
            .value_name("CHOICE"),
    };

    if let Some(default) = &flag.default {
        arg = arg.default_value(default_token(default));
    }

    arg
}

/// Token form of a default value, as if it had been typed.
fn default_token(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use record_args_core::DottedPath;
    use serde_json::json;

    use super::*;
    use crate::Error;

    fn leaf(path: &str, ty: ScalarType, default: Option<Value>) -> LeafFlag {
        let mut segments = path.split('.');
        let mut dotted = DottedPath::root(segments.next().unwrap());
        for segment in segments {
            dotted = dotted.child(segment);
        }
        LeafFlag {
            help: format!("{path}: {}", ty.name()),
            path: dotted,
            ty,
            default,
            optional: false,
        }
    }

    fn engine(flags: Vec<LeafFlag>) -> ClapEngine {
        let mut engine = ClapEngine::new("test");
        for flag in flags {
            engine.register(flag).unwrap();
        }
        engine
    }

    #[test]
    fn test_parses_each_scalar_type() {
        let engine = engine(vec![
            leaf("n", ScalarType::Int, None),
            leaf("lr", ScalarType::Float, None),
            leaf("name", ScalarType::String, None),
            leaf("fast", ScalarType::Bool, None),
            leaf("mode", ScalarType::Choice(vec!["a".into(), "b".into()]), None),
        ]);

        let flat = engine
            .try_parse_from([
                "--n", "-3", "--lr", "0.5", "--name", "x", "--fast", "--mode", "b",
            ])
            .unwrap();

        assert_eq!(flat.get("n"), Some(&json!(-3)));
        assert_eq!(flat.get("lr"), Some(&json!(0.5)));
        assert_eq!(flat.get("name"), Some(&json!("x")));
        assert_eq!(flat.get("fast"), Some(&json!(true)));
        assert_eq!(flat.get("mode"), Some(&json!("b")));
    }

    #[test]
    fn test_absent_flags_without_default_are_omitted() {
        let engine = engine(vec![
            leaf("a", ScalarType::Int, None),
            leaf("c", ScalarType::String, Some(json!("c"))),
        ]);

        let flat = engine.try_parse_from(Vec::<String>::new()).unwrap();
        assert!(!flat.contains_key("a"));
        assert_eq!(flat.get("c"), Some(&json!("c")));
    }

    #[test]
    fn test_explicit_false_bool() {
        let engine = engine(vec![leaf("fast", ScalarType::Bool, Some(json!(true)))]);

        let flat = engine.try_parse_from(["--fast", "false"]).unwrap();
        assert_eq!(flat.get("fast"), Some(&json!(false)));

        let flat = engine.try_parse_from(Vec::<String>::new()).unwrap();
        assert_eq!(flat.get("fast"), Some(&json!(true)));
    }

    #[test]
    fn test_float_default_round_trips_through_token() {
        let engine = engine(vec![leaf("lr", ScalarType::Float, Some(json!(0.001)))]);

        let flat = engine.try_parse_from(Vec::<String>::new()).unwrap();
        assert_eq!(flat.get("lr"), Some(&json!(0.001)));
    }

    #[test]
    fn test_coercion_failure_is_a_parse_error() {
        let engine = engine(vec![leaf("n", ScalarType::Int, None)]);

        let err = engine.try_parse_from(["--n", "three"]).unwrap_err();
        assert!(matches!(err, Error::Parse(_)));
    }

    #[test]
    fn test_unknown_choice_is_rejected() {
        let engine = engine(vec![leaf(
            "mode",
            ScalarType::Choice(vec!["a".into()]),
            None,
        )]);

        assert!(matches!(
            engine.try_parse_from(["--mode", "z"]),
            Err(Error::Parse(_))
        ));
    }

    #[test]
    fn test_custom_marker_is_rewritten() {
        let engine = engine(vec![
            leaf("b.x", ScalarType::Int, None),
            leaf("c", ScalarType::String, None),
        ])
        .with_marker("+");

        let flat = engine.try_parse_from(["+b.x", "2", "+c=3"]).unwrap();
        assert_eq!(flat.get("b.x"), Some(&json!(2)));
        assert_eq!(flat.get("c"), Some(&json!("3")));

        // Values that merely start with the marker are left alone.
        let flat = engine.try_parse_from(["+c", "+5"]).unwrap();
        assert_eq!(flat.get("c"), Some(&json!("+5")));
    }

    #[test]
    fn test_duplicate_and_reserved_paths_are_rejected() {
        let mut engine = engine(vec![leaf("a", ScalarType::Int, None)]);

        assert_eq!(
            engine.register(leaf("a", ScalarType::Int, None)),
            Err(SchemaError::DuplicateFlag("a".to_string()))
        );
        assert_eq!(
            engine.register(leaf("help", ScalarType::Bool, None)),
            Err(SchemaError::DuplicateFlag("help".to_string()))
        );
    }

    #[test]
    fn test_help_lists_dotted_flags() {
        let engine = engine(vec![
            leaf("a", ScalarType::Int, None),
            leaf("b.x", ScalarType::Int, Some(json!(1))),
        ])
        .with_about("demo parser");

        let help = engine.render_help();
        assert!(help.contains("--a <INT>"));
        assert!(help.contains("--b.x <INT>"));
        assert!(help.contains("demo parser"));
    }
}
