#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! # judge
//!
//! Command-line front end of `judge-engine`.
//!
//! - `judge run input.json` judges a `JudgeInput` document (`-` reads stdin)
//! - `judge list` shows the registered strategies
//! - `judge level py-led-001 output.json` judges against a built-in LED level
//! - `judge structure main.py def loop` checks a source file for constructs
//!
//! Verdicts are printed as JSON on stdout; a human summary goes to stderr.

use std::{io::Read, str::FromStr};

use anyhow::{Context, Result};
use bpaf::*;
use colored::Colorize;
use dotenvy::dotenv;
use judge_engine::{ExecutionOutput, JudgeInput, JudgeResult, StrategyRegistry, levels, structure};
use serde_json::json;
use tabled::{
    Table, Tabled,
    settings::{Panel, Style},
};
use tracing::{Level, metadata::LevelFilter};
use tracing_subscriber::{fmt, prelude::*, util::SubscriberInitExt};

/// Top-level CLI commands.
#[derive(Debug, Clone)]
enum Cmd {
    /// Judge a `JudgeInput` document
    Run(String),
    /// List registered strategies
    List,
    /// Judge an `ExecutionOutput` against a built-in LED level
    Level(String, String),
    /// Check a source file for required constructs
    Structure(String, Vec<String>),
}

/// Parse the command line arguments and return a `Cmd` enum
fn options() -> Cmd {
    /// parses a JSON document path
    fn document(name: &'static str, help: &'static str) -> impl Parser<String> {
        positional::<String>(name).help(help)
    }

    let input = document("INPUT", "Path to a JudgeInput JSON file, or - for stdin");
    let run = construct!(Cmd::Run(input))
        .to_options()
        .command("run")
        .help("Judge a program's output");

    let list = pure(Cmd::List)
        .to_options()
        .command("list")
        .help("List registered strategies");

    let level_id = positional::<String>("LEVEL_ID").help("Built-in level, e.g. py-led-001");
    let output = document("OUTPUT", "Path to an ExecutionOutput JSON file, or - for stdin");
    let level = construct!(Cmd::Level(level_id, output))
        .to_options()
        .command("level")
        .help("Judge against a built-in LED level");

    let file = positional::<String>("FILE").help("Source file to inspect");
    let required = positional::<String>("REQUIRED")
        .help("Constructs to look for: def, class, for, while, loop, if, import")
        .some("at least one construct is required");
    let structure = construct!(Cmd::Structure(file, required))
        .to_options()
        .command("structure")
        .help("Check a source file for required constructs");

    let cmd = construct!([run, list, level, structure]);

    cmd.to_options()
        .descr("Auto-grader for program output")
        .run()
}

/// Reads a file, or stdin when `path` is `-`.
fn read_source(path: &str) -> Result<String> {
    if path == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read from stdin")?;
        Ok(buf)
    } else {
        std::fs::read_to_string(path).with_context(|| format!("Failed to read `{path}`"))
    }
}

/// One row of the metrics table.
#[derive(Tabled)]
struct MetricRow {
    /// Metric name.
    #[tabled(rename = "Metric")]
    name:  String,
    /// Metric value.
    #[tabled(rename = "Value")]
    value: String,
}

/// Prints the verdict as JSON on stdout and a summary on stderr.
fn report(result: &JudgeResult) -> Result<()> {
    println!(
        "{}",
        serde_json::to_string_pretty(result).context("Failed to serialize verdict")?
    );

    let status = if result.passed {
        "PASS".green().bold()
    } else {
        "FAIL".red().bold()
    };
    eprintln!("{status}: {}", result.message);
    if let Some(details) = &result.details {
        eprintln!("{details}");
    }
    for warning in result.warnings.iter().flatten() {
        eprintln!("{}: {warning}", "warning".yellow());
    }

    if let Some(metrics) = result.metrics.as_ref().filter(|m| !m.is_empty()) {
        let rows = metrics.iter().map(|(name, value)| MetricRow {
            name:  name.clone(),
            value: judge_engine::util::fmt_num(*value),
        });
        eprintln!("{}", Table::new(rows).with(Style::modern()));
    }
    Ok(())
}

/// Log level from `JUDGE_LOG`, defaulting to `info`.
fn log_level() -> Level {
    std::env::var("JUDGE_LOG")
        .ok()
        .and_then(|level| Level::from_str(level.trim()).ok())
        .unwrap_or(Level::INFO)
}

fn main() -> Result<()> {
    dotenv().ok();

    let fmt = fmt::layer()
        .with_writer(std::io::stderr)
        .without_time()
        .with_file(false)
        .with_line_number(false);
    let filter_layer = LevelFilter::from_level(log_level());
    tracing_subscriber::registry()
        .with(fmt)
        .with(filter_layer)
        .init();

    let cmd = options();
    let registry = StrategyRegistry::with_builtins();

    match cmd {
        Cmd::Run(path) => {
            let source = read_source(&path)?;
            let input: JudgeInput = serde_json::from_str(&source)
                .with_context(|| format!("`{path}` is not a valid JudgeInput document"))?;
            report(&registry.judge(&input))?;
        }
        Cmd::List => {
            let info = registry.info();
            println!(
                "{}",
                Table::new(&info)
                    .with(Panel::header("Registered strategies"))
                    .with(Style::modern())
            );
        }
        Cmd::Level(level_id, path) => {
            let source = read_source(&path)?;
            let output: ExecutionOutput = serde_json::from_str(&source)
                .with_context(|| format!("`{path}` is not a valid ExecutionOutput document"))?;
            let result = levels::judge_led_level(&level_id, &output)
                .with_context(|| format!("Cannot judge level `{level_id}`"))?;
            report(&result)?;
        }
        Cmd::Structure(path, required) => {
            let code = read_source(&path)?;
            let found = structure::check_structures(&code, &required);
            let valid = structure::validate_required_structures(&code, &required);
            let message = structure::missing_structures_message(&code, &required);

            println!(
                "{}",
                serde_json::to_string_pretty(&json!({
                    "structures": found,
                    "valid": valid,
                    "message": message,
                }))
                .context("Failed to serialize structure report")?
            );
            if valid {
                eprintln!("{}: all required structures present", "PASS".green().bold());
            } else {
                eprintln!("{}: {message}", "FAIL".red().bold());
            }
        }
    };

    Ok(())
}
