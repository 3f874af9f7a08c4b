// integration tests for settings files

use crate::common::*;

#[test]
fn test_disabled_function_becomes_unknown() {
    let config = temp_file_with(r#"{"disabled_functions": ["re"]}"#);
    let path = config.path().to_str().unwrap();

    let output = run_strcond(&["re.match('a', 'abc')", "--config", path]);
    assert_eq!(exit_code(&output), 5, "stderr: {}", stderr(&output));

    // the name is free for the context once the function is gone
    let output = run_strcond(&["re == 'x'", r#"{"re": "x"}"#, "--config", path]);
    assert_eq!(exit_code(&output), 0, "stderr: {}", stderr(&output));
}

#[test]
fn test_disabled_method_is_unsupported() {
    let config = temp_file_with(r#"{"disabled_methods": ["upper"]}"#);
    let path = config.path().to_str().unwrap();

    let output = run_strcond(&["'a'.upper() == 'A'", "--config", path]);
    assert_eq!(exit_code(&output), 4);

    let output = run_strcond(&["'A'.lower() == 'a'", "--config", path]);
    assert_eq!(exit_code(&output), 0);
}

#[test]
fn test_config_from_env_var() {
    let config = temp_file_with(r#"{"disabled_functions": ["len"]}"#);
    let path = config.path().to_str().unwrap();

    let output = run_strcond_with_env(&["len('abc') == 3"], &[("STRCOND_CONFIG", path)]);
    assert_eq!(exit_code(&output), 5);

    // without the variable the default registry applies
    assert_eq!(exit_code(&run_strcond(&["len('abc') == 3"])), 0);
}

#[test]
fn test_config_flag_overrides_env_var() {
    let disabling = temp_file_with(r#"{"disabled_functions": ["len"]}"#);
    let empty = temp_file_with("{}");

    let output = run_strcond_with_env(
        &["len('abc') == 3", "--config", empty.path().to_str().unwrap()],
        &[("STRCOND_CONFIG", disabling.path().to_str().unwrap())],
    );
    assert_eq!(exit_code(&output), 0, "stderr: {}", stderr(&output));
}

#[test]
fn test_invalid_config_exits_eight() {
    for content in ["not json", r#"{"max_dept": 3}"#, r#"{"max_depth": 0}"#] {
        let config = temp_file_with(content);
        let output = run_strcond(&["True", "--config", config.path().to_str().unwrap()]);
        assert_eq!(exit_code(&output), 8, "config: {:?}", content);
        assert!(stderr(&output).starts_with("error: config: "));
    }
}

#[test]
fn test_missing_config_exits_eight() {
    let output = run_strcond(&["True", "--config", "/nonexistent/strcond.json", "--json"]);
    assert_eq!(exit_code(&output), 8);
    assert_eq!(json_output(&output)["error"]["code"], -32008);
}

#[test]
fn test_max_depth_from_config() {
    let nested = format!("{}True{}", "(".repeat(10), ")".repeat(10));
    let config = temp_file_with(r#"{"max_depth": 5}"#);
    let path = config.path().to_str().unwrap();

    assert_eq!(exit_code(&run_strcond(&[&nested, "--config", path])), 3);
    // the flag wins over the file
    assert_eq!(
        exit_code(&run_strcond(&[&nested, "--config", path, "--max-depth", "50"])),
        0
    );
}

#[test]
fn test_unknown_entries_only_warn() {
    let config = temp_file_with(r#"{"disabled_functions": ["nosuch"]}"#);
    let output = run_strcond(&["True", "--config", config.path().to_str().unwrap()]);

    assert_eq!(exit_code(&output), 0);
    assert!(stderr(&output).contains("unknown function 'nosuch'"));
}
