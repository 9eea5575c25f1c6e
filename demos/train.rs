//! Training-script demo.
//!
//! Declares `train(lr: float = 0.001, model: ModelConfig = ModelConfig())`
//! and turns it into a command line with `--lr` and `--model.num_layers`.
//!
//! # Usage
//!
//! ```bash
//! cargo run -p record-args-demos --example train -- --help
//! cargo run -p record-args-demos --example train -- --model.num_layers 6
//! RUST_LOG=debug cargo run -p record-args-demos --example train -- --lr 0.01
//! ```

use record_args::{FieldSpec, FunctionArgumentParser, Record, RecordSchema, ScalarType, Signature};
use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct ModelConfig {
    num_layers: i64,
    activation: String,
}

impl Record for ModelConfig {
    fn schema() -> RecordSchema {
        RecordSchema::new("ModelConfig")
            .with_field(FieldSpec::scalar("num_layers", ScalarType::Int).with_default(3))
            .with_field(
                FieldSpec::scalar(
                    "activation",
                    ScalarType::Choice(vec!["relu".into(), "gelu".into(), "tanh".into()]),
                )
                .with_default("relu")
                .with_help("Activation function between layers"),
            )
    }
}

fn train(lr: f64, model: &ModelConfig) {
    println!("Training with lr={lr}");
    println!(
        "  model: {} layer(s), {} activation",
        model.num_layers, model.activation
    );
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let signature = Signature::new("train")
        .with_description("Train a model")
        .with_param(
            FieldSpec::scalar("lr", ScalarType::Float)
                .with_default(0.001)
                .with_help("Learning rate"),
        )
        .with_param(FieldSpec::nested::<ModelConfig>("model"));

    let parser = match FunctionArgumentParser::new(signature) {
        Ok(parser) => parser,
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(1);
        }
    };

    let args = parser.parse();
    let resolved = args
        .get::<f64>("lr")
        .and_then(|lr| Ok((lr, args.get::<ModelConfig>("model")?)));
    match resolved {
        Ok((lr, model)) => train(lr, &model),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(1);
        }
    }
}
