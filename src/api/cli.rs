use std::fs;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde_json::Value;
use thiserror::Error;
use tracing::info;

use super::{DEFAULT_HOST, DEFAULT_PORT, ServeConfig, run_http_server};
use crate::calculators::Calculator;
use crate::core::CalcError;

#[derive(Parser, Debug)]
#[command(
    name = "loonie",
    version,
    about = "Canadian personal-finance calculators (mortgage, TFSA, FHSA, CPP, land transfer tax, ...)"
)]
pub struct Cli {
    /// Log at debug level unless RUST_LOG is set
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Serve the JSON API
    Serve {
        #[arg(long, default_value = DEFAULT_HOST)]
        host: String,
        #[arg(short, long, default_value_t = DEFAULT_PORT)]
        port: u16,
    },
    /// Evaluate one calculator and print the result as JSON
    Run {
        /// Calculator slug, e.g. `credit-card-payoff`
        slug: String,
        /// Inline JSON payload
        #[arg(long, conflicts_with = "input_file")]
        input: Option<String>,
        /// Path to a JSON payload
        #[arg(long)]
        input_file: Option<PathBuf>,
    },
    /// List calculator slugs and their fields
    List,
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("unknown calculator `{0}` (see `loonie list`)")]
    UnknownCalculator(String),

    #[error("invalid JSON input: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Calc(#[from] CalcError),
}

pub async fn execute(cli: Cli) -> Result<(), AppError> {
    match cli.command {
        Command::Serve { host, port } => {
            run_http_server(ServeConfig { host, port }).await?;
            Ok(())
        }
        Command::Run {
            slug,
            input,
            input_file,
        } => {
            let raw = match (input, input_file) {
                (Some(inline), _) => inline,
                (None, Some(path)) => fs::read_to_string(path)?,
                (None, None) => "{}".to_string(),
            };
            println!("{}", run_calculator(&slug, &raw)?);
            Ok(())
        }
        Command::List => {
            print!("{}", list_calculators());
            Ok(())
        }
    }
}

/// Evaluates `slug` against a JSON payload and pretty-prints the result.
pub fn run_calculator(slug: &str, raw_json: &str) -> Result<String, AppError> {
    let calculator =
        Calculator::from_slug(slug).ok_or_else(|| AppError::UnknownCalculator(slug.to_string()))?;
    let payload: Value = serde_json::from_str(raw_json)?;
    info!(slug, "running calculator");
    let result = calculator.evaluate(payload)?;
    Ok(serde_json::to_string_pretty(&result)?)
}

pub fn list_calculators() -> String {
    let mut out = String::new();
    for calculator in Calculator::ALL {
        let descriptor = calculator.descriptor();
        out.push_str(&format!("{:<24} {}\n", descriptor.slug, descriptor.title));
        for field in descriptor.fields {
            let marker = if field.required { "*" } else { " " };
            out.push_str(&format!("    {marker} {:<22} {}\n", field.name, field.label));
        }
    }
    out
}
