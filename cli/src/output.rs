//! Output formatting for flag listings and parsed arguments.

use record_args::{ArgumentMap, LeafFlag, flatten};
use serde::Serialize;
use serde_json::Value;

/// Supported output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Json,
    Yaml,
    Table,
}

/// One row of a flag listing.
#[derive(Debug, Serialize)]
pub struct FlagRow {
    pub flag: String,
    #[serde(rename = "type")]
    pub ty: String,
    pub default: Option<Value>,
    pub required: bool,
    pub help: String,
}

impl FlagRow {
    pub fn from_leaf(leaf: &LeafFlag, marker: &str) -> Self {
        Self {
            flag: leaf.flag_name(marker),
            ty: leaf.ty.to_string(),
            default: leaf.default.clone(),
            required: leaf.is_required(),
            help: leaf.help.clone(),
        }
    }
}

/// Formats a flag listing in the requested output format.
pub fn format_flags(rows: &[FlagRow], format: OutputFormat) -> Result<String, String> {
    match format {
        OutputFormat::Json => serde_json::to_string_pretty(rows)
            .map_err(|e| format!("JSON serialization failed: {e}")),
        OutputFormat::Yaml => {
            serde_yaml::to_string(rows).map_err(|e| format!("YAML serialization failed: {e}"))
        }
        OutputFormat::Table => Ok(flags_to_table(rows)),
    }
}

/// Formats reconstructed arguments in the requested output format.
///
/// The table form lists one `dotted.path = value` line per leaf.
pub fn format_arguments(args: &ArgumentMap, format: OutputFormat) -> Result<String, String> {
    match format {
        OutputFormat::Json => serde_json::to_string_pretty(args)
            .map_err(|e| format!("JSON serialization failed: {e}")),
        OutputFormat::Yaml => {
            serde_yaml::to_string(args).map_err(|e| format!("YAML serialization failed: {e}"))
        }
        OutputFormat::Table => {
            let nested = args.clone().into_inner();
            let mut out = String::new();
            for (path, value) in flatten(&nested) {
                out.push_str(&format!("{path} = {value}\n"));
            }
            Ok(out)
        }
    }
}

fn flags_to_table(rows: &[FlagRow]) -> String {
    let headers = ["FLAG", "TYPE", "DEFAULT", "REQUIRED"];
    let cells: Vec<[String; 4]> = rows
        .iter()
        .map(|row| {
            [
                row.flag.clone(),
                row.ty.clone(),
                row.default
                    .as_ref()
                    .map(Value::to_string)
                    .unwrap_or_else(|| "-".to_string()),
                if row.required { "yes" } else { "no" }.to_string(),
            ]
        })
        .collect();

    let mut widths = headers.map(str::len);
    for row in &cells {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.len());
        }
    }

    let mut out = String::new();
    let mut push_line = |line: [&str; 4]| {
        let padded: Vec<String> = line
            .iter()
            .zip(widths)
            .map(|(cell, width)| format!("{cell:<width$}"))
            .collect();
        out.push_str(padded.join("  ").trim_end());
        out.push('\n');
    };

    push_line(headers);
    for row in &cells {
        push_line([
            row[0].as_str(),
            row[1].as_str(),
            row[2].as_str(),
            row[3].as_str(),
        ]);
    }
    out
}
