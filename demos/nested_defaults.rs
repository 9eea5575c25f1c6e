//! Default cascade demo.
//!
//! `param_3` is declared with its own `CheckpointConfig` default, so its
//! flags show those values instead of the record's field defaults. A
//! defaults file, when given through `RECORD_ARGS_DEFAULTS`, beats both.
//!
//! # Usage
//!
//! ```bash
//! cargo run -p record-args-demos --example nested_defaults
//! cargo run -p record-args-demos --example nested_defaults -- --param_3.upload 10
//! RECORD_ARGS_DEFAULTS=defaults.yaml cargo run -p record-args-demos --example nested_defaults
//! ```

use std::path::PathBuf;

use record_args::{
    FieldSpec, FunctionArgumentParser, ParserConfig, Record, RecordArgumentParser, RecordSchema,
    ScalarType, Signature,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct CheckpointConfig {
    interval: i64,
    upload: i64,
}

impl Record for CheckpointConfig {
    fn schema() -> RecordSchema {
        RecordSchema::new("CheckpointConfig")
            .with_field(FieldSpec::scalar("interval", ScalarType::Int).with_default(1))
            .with_field(FieldSpec::scalar("upload", ScalarType::Int).with_default(2))
    }
}

fn train_signature() -> Result<Signature, record_args::SchemaError> {
    let checkpoint = FieldSpec::nested::<CheckpointConfig>("param_3").with_record_default(
        &CheckpointConfig {
            interval: 5,
            upload: 2,
        },
    )?;

    Ok(Signature::new("train")
        .with_description("CLI for train function")
        .with_param(FieldSpec::scalar("param_1", ScalarType::Int).with_default(1))
        .with_param(FieldSpec::scalar("param_2", ScalarType::String).with_default("default"))
        .with_param(checkpoint))
}

fn run() -> record_args::Result<()> {
    let config = ParserConfig {
        defaults_file: std::env::var_os("RECORD_ARGS_DEFAULTS").map(PathBuf::from),
        ..Default::default()
    };
    let parser = FunctionArgumentParser::from_config(train_signature()?, &config)?;
    for flag in parser.flags() {
        info!(flag = %flag.flag_name(&config.flag_marker), default = ?flag.default, "registered");
    }

    let args = parser.parse();
    let param_1: i64 = args.get("param_1")?;
    let param_2: String = args.get("param_2")?;
    let param_3: CheckpointConfig = args.get("param_3")?;
    println!("Training with param_1: {param_1}, param_2: {param_2:?}, param_3: {param_3:?}");

    // The same record on its own: only the field defaults apply.
    let standalone = RecordArgumentParser::<CheckpointConfig>::new("checkpoint")?;
    let checkpoint = standalone.try_parse_from(Vec::<String>::new())?;
    println!("Standalone CheckpointConfig defaults: {checkpoint:?}");
    Ok(())
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    if let Err(err) = run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
