//! error taxonomy for condition parsing and evaluation

use std::fmt;

use thiserror::Error;

/// every failure the engine can report
///
/// errors are raised at the point of detection and propagate unchanged to
/// the caller; the engine never retries or recovers internally.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConditionError {
    /// the condition is not a single well-formed expression
    #[error("invalid condition '{condition}': {message}")]
    BadSyntax { message: String, condition: String },

    /// the construct, operator, function or attribute is not allowlisted
    #[error("{0}")]
    UnsupportedSyntax(String),

    /// identifier is neither a registry function nor a context key
    #[error("variable '{0}' doesn't exist in context")]
    UnknownVariable(String),

    /// the context mapping itself is malformed
    #[error("{0}")]
    InvalidContext(String),

    /// an allowlisted native function rejected its arguments
    #[error("{function}(): {message}")]
    CallFailed { function: String, message: String },
}

/// stable discriminant of a [`ConditionError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    BadSyntax,
    UnsupportedSyntax,
    UnknownVariable,
    InvalidContext,
    CallFailed,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::BadSyntax => "bad_syntax",
            ErrorKind::UnsupportedSyntax => "unsupported_syntax",
            ErrorKind::UnknownVariable => "unknown_variable",
            ErrorKind::InvalidContext => "invalid_context",
            ErrorKind::CallFailed => "call_failed",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ConditionError {
    pub fn bad_syntax(message: impl Into<String>, condition: impl Into<String>) -> Self {
        ConditionError::BadSyntax {
            message: message.into(),
            condition: condition.into(),
        }
    }

    pub fn unsupported(message: impl Into<String>) -> Self {
        ConditionError::UnsupportedSyntax(message.into())
    }

    pub fn invalid_context(message: impl Into<String>) -> Self {
        ConditionError::InvalidContext(message.into())
    }

    pub fn call_failed(function: impl Into<String>, message: impl Into<String>) -> Self {
        ConditionError::CallFailed {
            function: function.into(),
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ConditionError::BadSyntax { .. } => ErrorKind::BadSyntax,
            ConditionError::UnsupportedSyntax(_) => ErrorKind::UnsupportedSyntax,
            ConditionError::UnknownVariable(_) => ErrorKind::UnknownVariable,
            ConditionError::InvalidContext(_) => ErrorKind::InvalidContext,
            ConditionError::CallFailed { .. } => ErrorKind::CallFailed,
        }
    }
}

pub type Result<T> = std::result::Result<T, ConditionError>;
