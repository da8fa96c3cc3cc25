//! CLI module for dynamap
//!
//! Provides command-line interface for:
//! - to-plain: typed item to plain JSON document
//! - from-plain: plain JSON document to typed item
//! - check-config: validate a mapper configuration

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command};
pub use commands::{check_config, from_plain, run, run_command, to_plain};
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::{read_input, write_error, write_response};
