//! CLI module
//!
//! - serve: load config and seed data, then run the HTTP server
//! - query: one-shot list query against the seeded data
//! - explain: print the translated document query without running it
//! - check-config: validate the configuration file

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command, Resource};
pub use commands::{check_config, explain, parse_query_string, query_command, query_to, run, run_command, serve, Config};
pub use errors::{CliError, CliErrorCode, CliResult};
