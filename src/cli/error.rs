//! cli error type

use crate::conditions::ConditionError;

use super::exit_codes;

/// a failure reported by the cli
#[derive(Debug, Clone)]
pub struct CliError {
    /// exit code (maps to JSON-RPC error code via -32000 - code)
    pub code: i32,
    /// short machine-readable kind, e.g. `bad_syntax` or `config`
    pub kind: &'static str,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, kind: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            kind,
            message: message.into(),
        }
    }

    pub fn invalid_args(message: impl Into<String>) -> Self {
        Self::new(exit_codes::INVALID_ARGS, "invalid_args", message)
    }

    /// keeps the whole context chain of the anyhow error
    pub fn config(err: anyhow::Error) -> Self {
        Self::new(exit_codes::CONFIG_ERROR, "config", format!("{:#}", err))
    }
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl std::error::Error for CliError {}

impl From<ConditionError> for CliError {
    fn from(e: ConditionError) -> Self {
        let kind = e.kind();
        CliError::new(exit_codes::for_error(kind), kind.as_str(), e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn test_from_condition_error() {
        let err = CliError::from(ConditionError::UnknownVariable("foo".to_string()));
        assert_eq!(err.code, exit_codes::UNKNOWN_VARIABLE);
        assert_eq!(err.kind, "unknown_variable");
        assert_eq!(
            err.to_string(),
            "unknown_variable: variable 'foo' doesn't exist in context"
        );
    }

    #[test]
    fn test_config_error_keeps_context_chain() {
        let source: anyhow::Result<()> = Err(anyhow::anyhow!("expected value"));
        let err = CliError::config(source.context("failed to parse config file: x.json").unwrap_err());
        assert_eq!(err.code, exit_codes::CONFIG_ERROR);
        assert_eq!(err.message, "failed to parse config file: x.json: expected value");
    }
}
