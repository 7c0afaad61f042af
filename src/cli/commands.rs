//! CLI command implementations

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::catalog::{MovieCatalog, RecordStore};
use crate::http_server::{HttpServer, HttpServerConfig};
use crate::observability::{Event, Logger};

use super::args::Command;
use super::errors::{CliError, CliResult};

/// Configuration file structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Catalog CSV file (default: "./data/movies.csv")
    #[serde(default = "default_data_file")]
    pub data_file: String,

    #[serde(flatten)]
    pub server: HttpServerConfig,
}

fn default_data_file() -> String {
    "./data/movies.csv".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_file: default_data_file(),
            server: HttpServerConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from file
    pub fn load(path: &Path) -> CliResult<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| CliError::config_error(format!("Failed to read config: {}", e)))?;

        let config: Config = serde_json::from_str(&content)
            .map_err(|e| CliError::config_error(format!("Invalid config JSON: {}", e)))?;

        config.validate()?;

        Ok(config)
    }

    fn validate(&self) -> CliResult<()> {
        if self.data_file.trim().is_empty() {
            return Err(CliError::config_error("data_file must not be empty"));
        }

        if self.server.port == 0 {
            return Err(CliError::config_error("port must be > 0"));
        }

        if let Some(token) = &self.server.api_token {
            if token.trim().is_empty() {
                return Err(CliError::config_error(
                    "api_token must not be empty; omit it to disable auth",
                ));
            }
        }

        Ok(())
    }

    pub fn data_path(&self) -> &Path {
        Path::new(&self.data_file)
    }
}

/// Main CLI entry point
///
/// Parses arguments and dispatches to the appropriate command.
pub fn run() -> CliResult<()> {
    let cli = super::args::Cli::parse_args();
    run_command(cli.command)
}

pub fn run_command(cmd: Command) -> CliResult<()> {
    match cmd {
        Command::Init { config } => init(&config),
        Command::Serve { config } => serve(&config),
    }
}

/// Creates the catalog file with its header row.
///
/// An existing file is left untouched.
pub fn init(config_path: &Path) -> CliResult<()> {
    let config = Config::load(config_path)?;
    let store = RecordStore::new(config.data_path());

    let created = store.initialize()?;
    Logger::info(
        Event::CatalogInitialized,
        &[
            ("path", config.data_file.as_str()),
            ("created", if created { "true" } else { "false" }),
        ],
    );

    Ok(())
}

/// Serves the HTTP API until the process is stopped
pub fn serve(config_path: &Path) -> CliResult<()> {
    let config = Config::load(config_path)?;
    let catalog = MovieCatalog::open(config.data_path());
    let server = HttpServer::new(config.server, catalog);

    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| CliError::serve_failed(format!("Failed to create tokio runtime: {}", e)))?;

    rt.block_on(async {
        server
            .start()
            .await
            .map_err(|e| CliError::serve_failed(format!("HTTP server failed: {}", e)))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::CliErrorCode;
    use tempfile::TempDir;

    fn write_config(dir: &TempDir, body: &str) -> std::path::PathBuf {
        let path = dir.path().join("moviematch.json");
        fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn test_load_applies_defaults() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, "{}");

        let config = Config::load(&path).unwrap();
        assert_eq!(config.data_file, "./data/movies.csv");
        assert_eq!(config.server.port, 3000);
        assert!(config.server.api_token.is_none());
    }

    #[test]
    fn test_load_flattened_server_fields() {
        let dir = TempDir::new().unwrap();
        let path = write_config(
            &dir,
            r#"{"data_file": "movies.csv", "host": "127.0.0.1", "port": 8080, "api_token": "1234"}"#,
        );

        let config = Config::load(&path).unwrap();
        assert_eq!(config.server.socket_addr(), "127.0.0.1:8080");
        assert_eq!(config.server.api_token.as_deref(), Some("1234"));
    }

    #[test]
    fn test_validation_errors() {
        let dir = TempDir::new().unwrap();
        for body in [
            r#"{"port": 0}"#,
            r#"{"data_file": "  "}"#,
            r#"{"api_token": ""}"#,
            "not json",
        ] {
            let path = write_config(&dir, body);
            let err = Config::load(&path).unwrap_err();
            assert_eq!(err.code(), &CliErrorCode::ConfigError, "{}", body);
        }

        let err = Config::load(&dir.path().join("missing.json")).unwrap_err();
        assert_eq!(err.code(), &CliErrorCode::ConfigError);
    }

    #[test]
    fn test_init_creates_catalog_once() {
        let dir = TempDir::new().unwrap();
        let data_file = dir.path().join("data").join("movies.csv");
        let path = write_config(
            &dir,
            &serde_json::json!({ "data_file": data_file }).to_string(),
        );

        init(&path).unwrap();
        let first = fs::read_to_string(&data_file).unwrap();
        assert!(first.starts_with("id,title,year"));

        init(&path).unwrap();
        assert_eq!(fs::read_to_string(&data_file).unwrap(), first);
    }
}
