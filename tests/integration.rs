// main integration test file
// run with: cargo test --test integration

#[path = "integration_tests/common.rs"]
mod common;

#[path = "integration_tests/test_conditions.rs"]
mod test_conditions;

#[path = "integration_tests/test_cli.rs"]
mod test_cli;

#[path = "integration_tests/test_cli_config.rs"]
mod test_cli_config;
