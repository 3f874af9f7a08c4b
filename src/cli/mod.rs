mod commands;
mod convert;
mod error;
pub mod exit_codes;
pub mod output;

pub use commands::Cli;
pub use convert::parse_context_arg;
pub use error::CliError;

/// run the cli, returning the process exit code
pub fn run(cli: Cli) -> i32 {
    commands::execute(cli)
}
