//! conversion helpers for CLI arguments

use anyhow::Context as _;
use std::fs;
use std::path::Path;

use crate::conditions::Context;

use super::error::CliError;

/// parse a context argument: a JSON object, else a Python-style dict literal
pub fn parse_context_arg(text: &str) -> Result<Context, CliError> {
    match serde_json::from_str::<serde_json::Value>(text) {
        Ok(json) => {
            Context::from_json(&json).map_err(|e| CliError::invalid_args(e.to_string()))
        }
        Err(json_err) => {
            tracing::debug!(error = %json_err, "context is not JSON, trying literal syntax");
            Context::from_literal(text).map_err(|e| {
                CliError::invalid_args(format!(
                    "context is neither valid JSON nor a valid Python dict: {}",
                    e
                ))
            })
        }
    }
}

/// read and parse a context file
pub fn read_context_file(path: &Path) -> Result<Context, CliError> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read context file: {}", path.display()))
        .map_err(|e| CliError::invalid_args(format!("{:#}", e)))?;
    parse_context_arg(&text)
}

/// resolve the context from the positional argument or `--context-file`
pub fn resolve_context(arg: Option<&str>, file: Option<&Path>) -> Result<Context, CliError> {
    match (arg, file) {
        (Some(text), _) => parse_context_arg(text),
        (None, Some(path)) => read_context_file(path),
        (None, None) => Ok(Context::new()),
    }
}
