// integration tests for the strcond binary

use crate::common::*;

#[test]
fn test_true_condition_exits_zero_silently() {
    let ctx = sample_context_json();
    let output = run_strcond(&["year == 2023 and type.lower() == 'sometype'", &ctx]);

    assert_eq!(exit_code(&output), 0);
    assert!(stdout(&output).is_empty());
    assert!(stderr(&output).is_empty());
}

#[test]
fn test_false_condition_exits_one() {
    let ctx = sample_context_json();
    let output = run_strcond(&["year == 2024", &ctx]);

    assert_eq!(exit_code(&output), 1);
    assert!(stderr(&output).is_empty());
}

#[test]
fn test_no_context_argument() {
    assert_eq!(exit_code(&run_strcond(&["10 < 100 < 1000"])), 0);
    assert_eq!(exit_code(&run_strcond(&["not True"])), 1);
}

#[test]
fn test_python_literal_context() {
    let output = run_strcond(&[
        "'foo' in strtuple and flag",
        "{'strtuple': ('foo', 'bar'), 'flag': True}",
    ]);
    assert_eq!(exit_code(&output), 0, "stderr: {}", stderr(&output));
}

#[test]
fn test_error_exit_codes() {
    let ctx = sample_context_json();
    let cases = [
        (" True ", 3, "bad_syntax"),
        ("month =~ 12", 3, "bad_syntax"),
        ("month * 2 == 24", 4, "unsupported_syntax"),
        ("month is 12", 4, "unsupported_syntax"),
        ("foo == 12", 5, "unknown_variable"),
        ("len(year)", 7, "call_failed"),
    ];

    for (condition, code, kind) in cases {
        let output = run_strcond(&[condition, &ctx]);
        assert_eq!(exit_code(&output), code, "condition: {:?}", condition);
        let err = stderr(&output);
        assert!(
            err.starts_with(&format!("error: {}: ", kind)),
            "condition {:?} stderr: {}",
            condition,
            err
        );
    }
}

#[test]
fn test_reserved_context_key() {
    let output = run_strcond(&["True", r#"{"re": "x"}"#]);
    assert_eq!(exit_code(&output), 6);
    assert!(stderr(&output).contains("reserved"));
}

#[test]
fn test_invalid_context_argument() {
    for ctx in ["[1, 2]", "{'a': }", "definitely not a dict"] {
        let output = run_strcond(&["True", ctx]);
        assert_eq!(exit_code(&output), 2, "context: {:?}", ctx);
        assert!(stderr(&output).starts_with("error: invalid_args: "));
    }
}

#[test]
fn test_missing_condition_is_usage_error() {
    let output = run_strcond(&[]);
    assert_eq!(exit_code(&output), 2);
}

#[test]
fn test_quiet_suppresses_errors() {
    let output = run_strcond(&["foo == 1", "-q"]);
    assert_eq!(exit_code(&output), 5);
    assert!(stdout(&output).is_empty());
    assert!(stderr(&output).is_empty());
}

#[test]
fn test_json_result() {
    let ctx = sample_context_json();
    let output = run_strcond(&["2022 < year < 2024", &ctx, "--json"]);
    assert_eq!(exit_code(&output), 0);

    let json = json_output(&output);
    assert_eq!(json["jsonrpc"], "2.0");
    assert_eq!(json["id"], serde_json::Value::Null);
    assert_eq!(json["result"]["condition"], "2022 < year < 2024");
    assert_eq!(json["result"]["result"], true);
    assert_eq!(json["result"]["parsed"], "2022 < year < 2024");
}

#[test]
fn test_json_false_result_still_exits_one() {
    let output = run_strcond(&["False", "-j"]);
    assert_eq!(exit_code(&output), 1);
    assert_eq!(json_output(&output)["result"]["result"], false);
}

#[test]
fn test_json_error() {
    let output = run_strcond(&["foo == 12", "{}", "--json"]);
    assert_eq!(exit_code(&output), 5);
    assert!(stderr(&output).is_empty());

    let json = json_output(&output);
    assert_eq!(json["error"]["code"], -32005);
    assert_eq!(json["error"]["data"]["kind"], "unknown_variable");
    assert_eq!(
        json["error"]["message"],
        "variable 'foo' doesn't exist in context"
    );
}

#[test]
fn test_check_only_parses() {
    let output = run_strcond(&["undefined_var == 1", "--check"]);
    assert_eq!(exit_code(&output), 0);

    let output = run_strcond(&["undefined_var ==", "--check"]);
    assert_eq!(exit_code(&output), 3);

    let output = run_strcond(&["x in (1, 2)", "--check", "--json"]);
    let json = json_output(&output);
    assert_eq!(json["result"]["valid"], true);
    assert_eq!(json["result"]["parsed"], "x in (1, 2)");
}

#[test]
fn test_explain_prints_canonical_form() {
    let output = run_strcond(&["(a  or b)and not(c)", "--check", "--explain"]);
    assert_eq!(exit_code(&output), 0);
    assert_eq!(stderr(&output).trim(), "(a or b) and not c");
}

#[test]
fn test_context_file() {
    let file = temp_file_with(&sample_context_json());
    let path = file.path().to_str().unwrap();

    let output = run_strcond(&["msg.endswith('World')", "--context-file", path]);
    assert_eq!(exit_code(&output), 0, "stderr: {}", stderr(&output));

    let output = run_strcond(&["True", "--context-file", "/nonexistent/ctx.json"]);
    assert_eq!(exit_code(&output), 2);
}

#[test]
fn test_max_depth_flag() {
    let nested = format!("{}True{}", "(".repeat(10), ")".repeat(10));
    assert_eq!(exit_code(&run_strcond(&[&nested])), 0);
    assert_eq!(exit_code(&run_strcond(&[&nested, "--max-depth", "5"])), 3);
}

#[test]
fn test_long_method_chain_is_bad_syntax() {
    let chain = format!("'a'{} == 'a'", ".lower()".repeat(15_000));
    let output = run_strcond(&[&chain]);
    assert_eq!(exit_code(&output), 3);
    assert!(stderr(&output).contains("error: bad_syntax: "));
}

#[test]
fn test_check_and_evaluation_agree_on_depth() {
    for calls in [10, 60] {
        let chain = format!("'a'{} == 'a'", ".lower()".repeat(calls));
        let checked = exit_code(&run_strcond(&[&chain, "--check"]));
        let evaluated = exit_code(&run_strcond(&[&chain]));
        assert_eq!(checked, evaluated, "calls: {}", calls);
    }
    let over = format!("'a'{} == 'a'", ".lower()".repeat(60));
    assert_eq!(exit_code(&run_strcond(&[&over, "--check"])), 3);
}

#[test]
fn test_verbose_logs_to_stderr() {
    let output = run_strcond(&["True", "-vv"]);
    assert_eq!(exit_code(&output), 0);
    assert!(stdout(&output).is_empty());
    assert!(stderr(&output).contains("evaluated condition"));
}

#[test]
fn test_log_env_var() {
    let output = run_strcond_with_env(&["True"], &[("STRCOND_LOG", "debug")]);
    assert_eq!(exit_code(&output), 0);
    assert!(stderr(&output).contains("DEBUG"));
}

#[test]
fn test_version() {
    let output = run_strcond(&["--version"]);
    assert_eq!(exit_code(&output), 0);
    assert!(stdout(&output).starts_with("strcond "));
}
