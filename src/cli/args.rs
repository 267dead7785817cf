//! CLI argument definitions using clap
//!
//! Commands:
//! - tourdesk serve --config <path> [--port <port>]
//! - tourdesk query --config <path> <collection> [query-string]
//! - tourdesk explain --config <path> <collection> [query-string] [--parent <id>]
//! - tourdesk check-config --config <path>

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// tourdesk - tour catalogue API over an in-memory document store
#[derive(Parser, Debug)]
#[command(name = "tourdesk")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the HTTP server
    Serve {
        /// Path to configuration file
        #[arg(long, default_value = "./tourdesk.json")]
        config: PathBuf,

        /// Override the configured port
        #[arg(long)]
        port: Option<u16>,
    },

    /// Run one list query against the seeded data and print the reply
    Query {
        /// Path to configuration file
        #[arg(long, default_value = "./tourdesk.json")]
        config: PathBuf,

        collection: Resource,

        /// Query string, e.g. "difficulty=easy&sort=-price&limit=5"
        #[arg(default_value = "")]
        query: String,
    },

    /// Print the document query a list request translates to
    Explain {
        /// Path to configuration file
        #[arg(long, default_value = "./tourdesk.json")]
        config: PathBuf,

        collection: Resource,

        #[arg(default_value = "")]
        query: String,

        /// Parent document id, as in a nested route
        #[arg(long)]
        parent: Option<String>,
    },

    /// Load and validate the configuration file
    CheckConfig {
        /// Path to configuration file
        #[arg(long, default_value = "./tourdesk.json")]
        config: PathBuf,
    },
}

/// Collections reachable from the command line
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Tours,
    Reviews,
    Users,
}

impl Cli {
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_query_command() {
        let cli = Cli::try_parse_from([
            "tourdesk",
            "query",
            "--config",
            "conf.json",
            "tours",
            "difficulty=easy&sort=-price",
        ])
        .unwrap();

        match cli.command {
            Command::Query {
                config,
                collection,
                query,
            } => {
                assert_eq!(config, PathBuf::from("conf.json"));
                assert_eq!(collection, Resource::Tours);
                assert_eq!(query, "difficulty=easy&sort=-price");
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_serve_defaults() {
        let cli = Cli::try_parse_from(["tourdesk", "serve"]).unwrap();
        match cli.command {
            Command::Serve { config, port } => {
                assert_eq!(config, PathBuf::from("./tourdesk.json"));
                assert_eq!(port, None);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_unknown_collection_rejected() {
        assert!(Cli::try_parse_from(["tourdesk", "query", "bookings"]).is_err());
    }
}
