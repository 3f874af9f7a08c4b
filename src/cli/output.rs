//! output formatting for scriptable CLI output
//!
//! uses JSON-RPC 2.0 format for machine-readable output:
//! - success: {"jsonrpc": "2.0", "result": {...}, "id": null}
//! - error: {"jsonrpc": "2.0", "error": {"code": N, "message": "...", "data": {...}}, "id": null}
//!
//! text mode is silent on success; the exit code carries the result.

use serde::Serialize;

use super::error::CliError;

/// JSON-RPC version constant
const JSONRPC_VERSION: &str = "2.0";

/// output mode determines how results are reported
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// errors as text on stderr
    Text,
    /// machine-readable JSON-RPC 2.0 output on stdout
    Json,
    /// exit code only
    Quiet,
}

impl OutputMode {
    /// quiet wins over json
    pub fn from_flags(json: bool, quiet: bool) -> Self {
        if quiet {
            Self::Quiet
        } else if json {
            Self::Json
        } else {
            Self::Text
        }
    }

    pub fn is_json(&self) -> bool {
        matches!(self, Self::Json)
    }

    pub fn is_quiet(&self) -> bool {
        matches!(self, Self::Quiet)
    }
}

/// JSON-RPC 2.0 success response
#[derive(Serialize)]
pub struct JsonRpcResponse<T: Serialize> {
    pub jsonrpc: &'static str,
    pub result: T,
    /// null for CLI responses (no request id)
    pub id: Option<String>,
}

impl<T: Serialize> JsonRpcResponse<T> {
    pub fn new(result: T) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            result,
            id: None,
        }
    }
}

/// JSON-RPC 2.0 error response
#[derive(Serialize)]
pub struct JsonRpcError {
    pub jsonrpc: &'static str,
    pub error: RpcError,
    pub id: Option<String>,
}

/// JSON-RPC 2.0 error object
#[derive(Serialize)]
pub struct RpcError {
    /// exit code offset by -32000 (application error range)
    pub code: i32,
    pub message: String,
    pub data: ErrorData,
}

/// additional error data
#[derive(Serialize)]
pub struct ErrorData {
    /// `bad_syntax`, `unknown_variable`, `config`, ...
    pub kind: &'static str,
}

impl JsonRpcError {
    pub fn new(err: &CliError) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            error: RpcError {
                code: to_jsonrpc_code(err.code),
                message: err.message.clone(),
                data: ErrorData { kind: err.kind },
            },
            id: None,
        }
    }
}

/// convert exit code to JSON-RPC error code
/// JSON-RPC reserves -32000 to -32099 for server/application errors
pub fn to_jsonrpc_code(exit_code: i32) -> i32 {
    -32000 - exit_code
}

// ============================================================================
// Result data structures
// ============================================================================

/// result of evaluating a condition
#[derive(Serialize)]
pub struct EvaluationData {
    pub condition: String,
    pub result: bool,
    /// canonical form of the parsed condition
    pub parsed: String,
}

/// result of `--check`
#[derive(Serialize)]
pub struct CheckData {
    pub condition: String,
    pub valid: bool,
    pub parsed: String,
}

// ============================================================================
// Output functions
// ============================================================================

/// print JSON-RPC success response to stdout
pub fn print_json<T: Serialize>(data: &T) {
    let response = JsonRpcResponse::new(data);
    if let Ok(json) = serde_json::to_string(&response) {
        println!("{}", json);
    }
}

/// print JSON-RPC error to stdout
pub fn print_json_error(err: &CliError) {
    if let Ok(json) = serde_json::to_string(&JsonRpcError::new(err)) {
        println!("{}", json);
    }
}

/// report an error according to the output mode
pub fn report_error(mode: OutputMode, err: &CliError) {
    match mode {
        OutputMode::Json => print_json_error(err),
        OutputMode::Text => eprintln!("error: {}", err),
        OutputMode::Quiet => {}
    }
}
