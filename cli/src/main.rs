mod output;

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use record_args::{
    DEFAULT_FLAG_MARKER, Error, FunctionArgumentParser, ParserConfig, Signature, load_defaults,
    validate_signature,
};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::output::{FlagRow, OutputFormat, format_arguments, format_flags};

#[derive(Debug, Parser)]
#[command(name = "record-args")]
#[command(about = "Inspect and exercise command lines generated from signature files")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List the flags a signature file generates.
    Flags(FlagsArgs),
    /// Validate one or more signature files.
    Validate(ValidateArgs),
    /// Parse tokens against a signature file and print the resolved arguments.
    Parse(ParseArgs),
}

#[derive(Debug, Args)]
struct FlagsArgs {
    /// Signature file (JSON or YAML).
    #[arg(long)]
    schema: PathBuf,
    /// Defaults file applied on top of declared defaults.
    #[arg(long)]
    defaults: Option<PathBuf>,
    /// Output format.
    #[arg(long, default_value = "table")]
    format: OutputFormat,
}

#[derive(Debug, Args)]
struct ValidateArgs {
    /// Signature files and/or directories containing signature files.
    #[arg(required = true)]
    inputs: Vec<PathBuf>,
}

#[derive(Debug, Args)]
struct ParseArgs {
    /// Signature file (JSON or YAML).
    #[arg(long)]
    schema: PathBuf,
    /// Defaults file applied on top of declared defaults.
    #[arg(long)]
    defaults: Option<PathBuf>,
    /// Prefix that marks a flag in the parsed tokens.
    #[arg(long, default_value = DEFAULT_FLAG_MARKER, allow_hyphen_values = true)]
    marker: String,
    /// Output format.
    #[arg(long, default_value = "json")]
    format: OutputFormat,
    /// Tokens to parse, given after `--`.
    #[arg(last = true)]
    tokens: Vec<String>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Command::Flags(args) => run_flags(args),
        Command::Validate(args) => run_validate(args),
        Command::Parse(args) => run_parse(args),
    };

    if let Err(err) = result {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn run_flags(args: FlagsArgs) -> Result<(), String> {
    let signature = load_signature(&args.schema)?;
    let mut parser = FunctionArgumentParser::new(signature).map_err(|e| e.to_string())?;
    if let Some(path) = &args.defaults {
        let defaults = load_defaults(path)
            .map_err(|err| format!("Failed to load defaults '{}': {err}", path.display()))?;
        parser = parser.with_defaults(defaults).map_err(|e| e.to_string())?;
    }

    let rows: Vec<FlagRow> = parser
        .flags()
        .iter()
        .map(|leaf| FlagRow::from_leaf(leaf, DEFAULT_FLAG_MARKER))
        .collect();
    let rendered = format_flags(&rows, args.format)?;
    print!("{rendered}");
    if !rendered.ends_with('\n') {
        println!();
    }
    Ok(())
}

fn run_validate(args: ValidateArgs) -> Result<(), String> {
    let paths = collect_signature_paths(&args.inputs)?;
    if paths.is_empty() {
        return Err("No signature files found".to_string());
    }

    let mut params = 0usize;
    for path in &paths {
        let signature = load_signature(path)?;
        if let Some(err) = validate_signature(&signature).into_iter().next() {
            return Err(format!("'{}': {err}", path.display()));
        }
        params += signature.params.len();
    }

    println!(
        "Validated {} signature file(s) with {} parameter(s).",
        paths.len(),
        params
    );
    Ok(())
}

fn run_parse(args: ParseArgs) -> Result<(), String> {
    let signature = load_signature(&args.schema)?;
    let config = ParserConfig {
        flag_marker: args.marker,
        defaults_file: args.defaults,
        ..Default::default()
    };
    let parser = FunctionArgumentParser::from_config(signature, &config).map_err(|e| e.to_string())?;

    let parsed = match parser.try_parse_from(args.tokens) {
        Ok(parsed) => parsed,
        Err(Error::Parse(err)) if err.kind() == clap::error::ErrorKind::DisplayHelp => {
            print!("{}", parser.render_help());
            return Ok(());
        }
        Err(Error::Parse(err)) => {
            let message = err.to_string();
            return Err(message
                .trim_start_matches("error: ")
                .trim_end()
                .to_string());
        }
        Err(err) => return Err(err.to_string()),
    };

    let rendered = format_arguments(&parsed, args.format)?;
    print!("{rendered}");
    if !rendered.ends_with('\n') {
        println!();
    }
    Ok(())
}

/// Reads a signature file; `.json` files are JSON, anything else YAML.
fn load_signature(path: &Path) -> Result<Signature, String> {
    let raw = fs::read_to_string(path)
        .map_err(|err| format!("Failed to read '{}': {err}", path.display()))?;
    let signature = if is_json(path) {
        serde_json::from_str(&raw)
            .map_err(|err| format!("Failed to parse '{}': {err}", path.display()))?
    } else {
        serde_yaml::from_str(&raw)
            .map_err(|err| format!("Failed to parse '{}': {err}", path.display()))?
    };
    debug!(path = %path.display(), "loaded signature file");
    Ok(signature)
}

/// Expands directories into their JSON/YAML files, sorted by path.
fn collect_signature_paths(inputs: &[PathBuf]) -> Result<Vec<PathBuf>, String> {
    let mut paths = Vec::new();
    for input in inputs {
        if input.is_dir() {
            let entries = fs::read_dir(input)
                .map_err(|err| format!("Failed to read directory '{}': {err}", input.display()))?;
            let mut found: Vec<PathBuf> = entries
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .filter(|path| path.is_file() && is_signature_file(path))
                .collect();
            found.sort();
            paths.extend(found);
        } else {
            paths.push(input.clone());
        }
    }
    Ok(paths)
}

fn is_json(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}

fn is_signature_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| matches!(ext.to_ascii_lowercase().as_str(), "json" | "yaml" | "yml"))
}
