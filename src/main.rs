//! tourdesk CLI entry point
//!
//! Parses arguments and dispatches through `cli::run`. Errors are logged
//! as a FATAL line on stderr and the process exits with status 1.

use tourdesk::cli;
use tourdesk::observability::Logger;

fn main() {
    if let Err(e) = cli::run() {
        Logger::fatal("CLI_FAILED", &[("code", e.code().code()), ("message", e.message())]);
        std::process::exit(1);
    }
}
