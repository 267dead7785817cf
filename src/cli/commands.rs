//! CLI command implementations
//!
//! Every command loads and validates the configuration first. Commands
//! that read data build a fresh in-memory [`App`] and load the seed file
//! into it.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use axum::extract::Query;
use axum::http::Uri;
use serde::{Deserialize, Serialize};
use tokio::runtime::Runtime;

use crate::app::{App, SeedData};
use crate::collection::Collection;
use crate::handler::{ListContext, RecordHandler};
use crate::http_server::{HttpServer, HttpServerConfig};
use crate::observability::Logger;
use crate::query::{DocumentQuery, QueryDefaults, QuerySpec};

use super::args::{Command, Resource};
use super::errors::{CliError, CliResult};
use super::io::{write_json, write_json_to};

/// Configuration file structure. Every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: HttpServerConfig,

    #[serde(default)]
    pub query: QueryDefaults,

    /// JSON file with `users`, `tours` and `reviews` arrays, relative to
    /// the configuration file
    #[serde(default)]
    pub seed_file: Option<PathBuf>,
}

impl Config {
    pub fn load(path: &Path) -> CliResult<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| CliError::config_error(format!("Failed to read config: {}", e)))?;

        let config: Config = serde_json::from_str(&content)
            .map_err(|e| CliError::config_error(format!("Invalid config JSON: {}", e)))?;

        config.validate()?;

        Ok(config)
    }

    pub fn validate(&self) -> CliResult<()> {
        self.server.validate().map_err(CliError::config_error)?;
        self.query
            .validate()
            .map_err(|e| CliError::config_error(format!("query.{}", e)))?;
        Ok(())
    }

    /// Seed file location resolved against the configuration file
    pub fn seed_path(&self, config_path: &Path) -> Option<PathBuf> {
        let seed = self.seed_file.as_ref()?;
        if seed.is_absolute() {
            return Some(seed.clone());
        }
        let base = config_path.parent().unwrap_or_else(|| Path::new("."));
        Some(base.join(seed))
    }
}

pub fn run() -> CliResult<()> {
    let cli = super::args::Cli::parse_args();
    run_command(cli.command)
}

pub fn run_command(cmd: Command) -> CliResult<()> {
    match cmd {
        Command::Serve { config, port } => serve(&config, port),
        Command::Query {
            config,
            collection,
            query,
        } => query_command(&config, collection, &query),
        Command::Explain {
            config,
            collection,
            query,
            parent,
        } => explain(&config, collection, &query, parent),
        Command::CheckConfig { config } => check_config(&config),
    }
}

/// Parse a raw query string (`a=1&b[gte]=2`) into a query spec
pub fn parse_query_string(raw: &str) -> CliResult<QuerySpec> {
    let raw = raw.trim_start_matches('?');
    let uri: Uri = format!("/?{}", raw)
        .parse()
        .map_err(|e| CliError::query_failed(format!("Invalid query string: {}", e)))?;

    let Query(pairs) = Query::<Vec<(String, String)>>::try_from_uri(&uri)
        .map_err(|e| CliError::query_failed(format!("Invalid query string: {}", e.body_text())))?;

    Ok(QuerySpec::from_pairs(pairs))
}

fn runtime() -> CliResult<Runtime> {
    Runtime::new().map_err(|e| CliError::boot_failed(format!("Failed to create tokio runtime: {}", e)))
}

async fn build_app(config: &Config, config_path: &Path) -> CliResult<App> {
    let app = App::new(config.query.clone())
        .map_err(|e| CliError::boot_failed(format!("Failed to open collections: {}", e)))?;

    if let Some(path) = config.seed_path(config_path) {
        let content = fs::read_to_string(&path).map_err(|e| {
            CliError::seed_error(format!("Failed to read seed file {}: {}", path.display(), e))
        })?;
        let data: SeedData = serde_json::from_str(&content)
            .map_err(|e| CliError::seed_error(format!("Invalid seed JSON: {}", e)))?;

        app.seed(data)
            .await
            .map_err(|e| CliError::seed_error(e.to_string()))?;
    }

    Ok(app)
}

pub fn serve(config_path: &Path, port: Option<u16>) -> CliResult<()> {
    let mut config = Config::load(config_path)?;
    if let Some(port) = port {
        config.server.port = port;
    }

    let rt = runtime()?;
    rt.block_on(async {
        let app = build_app(&config, config_path).await?;
        let server = HttpServer::new(config.server.clone(), &app);

        Logger::info("SERVER_STARTING", &[("addr", server.socket_addr().as_str())]);

        server
            .start()
            .await
            .map_err(|e| CliError::boot_failed(format!("HTTP server failed: {}", e)))
    })
}

pub fn query_command(config_path: &Path, resource: Resource, raw: &str) -> CliResult<()> {
    query_to(config_path, resource, raw, &mut io::stdout().lock())
}

/// Run a listing and write its envelope as one JSON line to `out`
pub fn query_to<W: Write>(config_path: &Path, resource: Resource, raw: &str, out: &mut W) -> CliResult<()> {
    let config = Config::load(config_path)?;
    let ctx = ListContext::new(parse_query_string(raw)?);

    let rt = runtime()?;
    rt.block_on(async {
        let app = build_app(&config, config_path).await?;
        match resource {
            Resource::Tours => print_list(&app.tours, &ctx, out).await,
            Resource::Reviews => print_list(&app.reviews, &ctx, out).await,
            Resource::Users => print_list(&app.users, &ctx, out).await,
        }
    })
}

async fn print_list<C: Collection, W: Write>(
    handler: &RecordHandler<C>,
    ctx: &ListContext,
    out: &mut W,
) -> CliResult<()> {
    let reply = handler
        .get_all(ctx)
        .await
        .map_err(|e| CliError::query_failed(e.to_string()))?;
    write_json_to(&reply.envelope, out)
}

pub fn explain(config_path: &Path, resource: Resource, raw: &str, parent: Option<String>) -> CliResult<()> {
    let config = Config::load(config_path)?;
    let spec = parse_query_string(raw)?;
    let ctx = ListContext {
        spec,
        parent_id: parent,
    };

    let app = App::new(config.query)
        .map_err(|e| CliError::boot_failed(format!("Failed to open collections: {}", e)))?;

    let query: DocumentQuery = match resource {
        Resource::Tours => app.tours.build_query(&ctx),
        Resource::Reviews => app.reviews.build_query(&ctx),
        Resource::Users => app.users.build_query(&ctx),
    };

    write_json(&query)
}

pub fn check_config(config_path: &Path) -> CliResult<()> {
    let config = Config::load(config_path)?;

    if let Some(path) = config.seed_path(config_path) {
        if !path.is_file() {
            return Err(CliError::seed_error(format!("Seed file not found: {}", path.display())));
        }
    }

    write_json(&config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn write_config(dir: &TempDir, value: serde_json::Value) -> PathBuf {
        let path = dir.path().join("tourdesk.json");
        fs::write(&path, value.to_string()).unwrap();
        path
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, json!({}));

        let config = Config::load(&path).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.query.default_limit, 100);
    }

    #[test]
    fn test_invalid_defaults_rejected() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, json!({ "query": { "default_limit": 0 } }));

        let err = Config::load(&path).unwrap_err();
        assert_eq!(err.message(), "query.default_limit must be > 0");
    }

    #[test]
    fn test_missing_config_file() {
        let dir = TempDir::new().unwrap();
        let err = Config::load(&dir.path().join("absent.json")).unwrap_err();
        assert!(err.message().starts_with("Failed to read config"));
    }

    #[test]
    fn test_seed_path_relative_to_config() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, json!({ "seed_file": "data/seed.json" }));

        let config = Config::load(&path).unwrap();
        assert_eq!(config.seed_path(&path), Some(dir.path().join("data/seed.json")));
    }

    #[test]
    fn test_check_config_requires_seed_file() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, json!({ "seed_file": "missing.json" }));

        assert!(check_config(&path).is_err());
    }

    #[test]
    fn test_parse_query_string() {
        let spec = parse_query_string("?difficulty=easy&price[gte]=500&sort=-price").unwrap();

        assert_eq!(spec.text("difficulty"), Some("easy"));
        assert_eq!(spec.text("sort"), Some("-price"));
        assert!(spec.get("price").is_some());
        assert!(parse_query_string("").unwrap().is_empty());
    }

    #[test]
    fn test_query_against_seed() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("seed.json"),
            json!({
                "users": [{ "name": "Lisa Brown", "email": "lisa@example.io" }]
            })
            .to_string(),
        )
        .unwrap();
        let path = write_config(&dir, json!({ "seed_file": "seed.json" }));

        query_command(&path, Resource::Users, "fields=name").unwrap();
        explain(&path, Resource::Reviews, "rating[gte]=4", Some("t1".to_string())).unwrap();
    }

    #[test]
    fn test_query_output_is_one_json_line() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("seed.json"),
            json!({
                "users": [
                    { "name": "Lisa Brown", "email": "lisa@example.io" },
                    { "name": "Ben Hadley", "email": "ben@example.io" }
                ]
            })
            .to_string(),
        )
        .unwrap();
        let path = write_config(&dir, json!({ "seed_file": "seed.json" }));

        let mut out = Vec::new();
        query_to(&path, Resource::Users, "fields=name", &mut out).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.lines().count(), 1);
        let envelope: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(envelope["status"], "success");
        assert_eq!(envelope["results"], 2);
    }
}
