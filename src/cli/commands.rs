use clap::Parser;

use std::path::PathBuf;

use crate::conditions::Engine;
use crate::config;

use super::convert;
use super::error::CliError;
use super::exit_codes;
use super::output::{self, CheckData, EvaluationData, OutputMode};

#[derive(Parser, Debug)]
#[command(name = "strcond")]
#[command(about = "Evaluate a string condition using Python syntax and variables given as argument")]
#[command(version)]
pub struct Cli {
    /// Condition without leading whitespace, e.g.
    /// "(year > 2020 and type not in ('std', 'premium')) or message.lower().startswith('hello')"
    pub condition: String,

    /// Variables as a JSON object or a Python dict literal
    #[arg(conflicts_with = "context_file")]
    pub context: Option<String>,

    /// Read the context from a file instead of the argument
    #[arg(long, value_name = "PATH")]
    pub context_file: Option<PathBuf>,

    /// Path to settings file (overrides STRCOND_CONFIG env var)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Maximum expression nesting depth (overrides settings)
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u32).range(1..))]
    pub max_depth: Option<u32>,

    /// Only check that the condition and context are well formed
    #[arg(long)]
    pub check: bool,

    /// Print the parsed condition to stderr
    #[arg(long)]
    pub explain: bool,

    /// Output in JSON-RPC format
    #[arg(short, long)]
    pub json: bool,

    /// Suppress all output, only the exit code reports the result
    #[arg(short, long)]
    pub quiet: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

/// run the cli and return the process exit code
pub fn execute(cli: Cli) -> i32 {
    let mode = OutputMode::from_flags(cli.json, cli.quiet);

    match evaluate(&cli, mode) {
        Ok(code) => code,
        Err(err) => {
            tracing::debug!(code = err.code, kind = err.kind, "evaluation failed");
            output::report_error(mode, &err);
            err.code
        }
    }
}

fn evaluate(cli: &Cli, mode: OutputMode) -> Result<i32, CliError> {
    let engine = build_engine(cli)?;
    let context = convert::resolve_context(cli.context.as_deref(), cli.context_file.as_deref())?;

    engine.validate_context(&context)?;
    let compiled = engine.compile(&cli.condition)?;

    if cli.explain {
        eprintln!("{}", compiled);
    }

    if cli.check {
        if mode.is_json() {
            output::print_json(&CheckData {
                condition: cli.condition.clone(),
                valid: true,
                parsed: compiled.to_string(),
            });
        }
        return Ok(exit_codes::SUCCESS);
    }

    let result = engine.evaluate_compiled(&compiled, &context)?;
    tracing::info!(condition = %cli.condition, result, "condition evaluated");

    if mode.is_json() {
        output::print_json(&EvaluationData {
            condition: cli.condition.clone(),
            result,
            parsed: compiled.to_string(),
        });
    }

    // silent on success in text/quiet mode, the exit code carries the result
    Ok(if result {
        exit_codes::SUCCESS
    } else {
        exit_codes::FALSE
    })
}

fn build_engine(cli: &Cli) -> Result<Engine, CliError> {
    let settings = config::load_with_override(cli.config.as_deref()).map_err(CliError::config)?;
    let engine = settings.engine();
    Ok(match cli.max_depth {
        Some(depth) => engine.with_max_depth(depth as usize),
        None => engine,
    })
}
