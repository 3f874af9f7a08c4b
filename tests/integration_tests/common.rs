// shared utilities for integration tests

#![allow(dead_code)]

use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Output};

use string_conditions::{Context, Value};

/// the context used throughout the behavioural suite
pub fn sample_context() -> Context {
    Context::new()
        .with("type", "SomeType")
        .with("msg", "hello World")
        .with("year", 2023)
        .with("month", 12)
        .with(
            "strtuple",
            Value::Tuple(vec![Value::from("foo"), Value::from("bar")]),
        )
        .with(
            "mylist",
            Value::List(vec![Value::Int(1), Value::from("2"), Value::Float(3.0)]),
        )
}

/// the same context as a JSON argument
pub fn sample_context_json() -> String {
    serde_json::json!({
        "type": "SomeType",
        "msg": "hello World",
        "year": 2023,
        "month": 12,
        "mylist": [1, "2", 3.0],
    })
    .to_string()
}

/// path to the built strcond binary
pub fn strcond_binary_path() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_strcond"))
}

/// run strcond and capture output
pub fn run_strcond(args: &[&str]) -> Output {
    run_strcond_with_env(args, &[])
}

/// run strcond with custom environment
pub fn run_strcond_with_env(args: &[&str], env_vars: &[(&str, &str)]) -> Output {
    let mut cmd = Command::new(strcond_binary_path());
    cmd.args(args);
    // keep the caller's environment from leaking settings into tests
    cmd.env_remove("STRCOND_CONFIG");
    cmd.env_remove("STRCOND_LOG");

    for (key, value) in env_vars {
        cmd.env(key, value);
    }

    cmd.output().expect("Failed to run strcond")
}

/// write `content` to a temporary file that lives as long as the handle
pub fn temp_file_with(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().expect("Failed to create temp file");
    file.write_all(content.as_bytes())
        .expect("Failed to write temp file");
    file
}

pub fn exit_code(output: &Output) -> i32 {
    output.status.code().expect("strcond terminated by a signal")
}

pub fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

pub fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

/// parse the single JSON-RPC line printed with --json
pub fn json_output(output: &Output) -> serde_json::Value {
    serde_json::from_str(stdout(output).trim()).expect("stdout is not valid JSON")
}
