//! exit codes for strcond
//!
//! 0 and 1 carry the condition result like `test(1)`; the rest tell scripts
//! which kind of failure stopped the evaluation

use crate::conditions::ErrorKind;

/// condition is true (or well formed with --check)
pub const SUCCESS: i32 = 0;

/// condition is false
pub const FALSE: i32 = 1;

/// invalid command-line arguments or unreadable context
pub const INVALID_ARGS: i32 = 2;

/// malformed condition
pub const BAD_SYNTAX: i32 = 3;

/// condition uses a construct outside the allowlist
pub const UNSUPPORTED_SYNTAX: i32 = 4;

/// condition references a variable missing from the context
pub const UNKNOWN_VARIABLE: i32 = 5;

/// context key is malformed or reserved
pub const INVALID_CONTEXT: i32 = 6;

/// an allowed function failed (bad arguments, invalid regex)
pub const CALL_FAILED: i32 = 7;

/// settings file error
pub const CONFIG_ERROR: i32 = 8;

/// exit code reported for an evaluation error
pub fn for_error(kind: ErrorKind) -> i32 {
    match kind {
        ErrorKind::BadSyntax => BAD_SYNTAX,
        ErrorKind::UnsupportedSyntax => UNSUPPORTED_SYNTAX,
        ErrorKind::UnknownVariable => UNKNOWN_VARIABLE,
        ErrorKind::InvalidContext => INVALID_CONTEXT,
        ErrorKind::CallFailed => CALL_FAILED,
    }
}
