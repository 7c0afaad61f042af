//! # HTTP Server
//!
//! Combines the movie router with the root and health endpoints and applies
//! CORS from configuration.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::{http::StatusCode, routing::get, Json, Router};
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

use crate::catalog::MovieCatalog;
use crate::observability::{Event, Logger};

use super::config::HttpServerConfig;
use super::movie_routes::{movie_routes, MovieState};
use super::response::HealthResponse;

pub const WELCOME_MESSAGE: &str = "¡Bienvenido a Movie Match!";

/// HTTP server over one movie catalog
pub struct HttpServer {
    config: HttpServerConfig,
    router: Router,
}

impl HttpServer {
    pub fn new(config: HttpServerConfig, catalog: MovieCatalog) -> Self {
        let router = Self::build_router(&config, catalog);
        Self { config, router }
    }

    /// Build the combined router with all endpoints
    pub fn build_router(config: &HttpServerConfig, catalog: MovieCatalog) -> Router {
        let state = Arc::new(MovieState::new(catalog, config.api_token.clone()));

        let cors = if config.cors_origins.is_empty() {
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
        } else {
            let origins: Vec<_> = config
                .cors_origins
                .iter()
                .filter_map(|s| s.parse().ok())
                .collect();

            CorsLayer::new()
                .allow_origin(AllowOrigin::list(origins))
                .allow_methods(Any)
                .allow_headers(Any)
        };

        Router::new()
            .route("/", get(welcome_handler))
            .route("/health", get(health_handler))
            .nest("/movies", movie_routes(state))
            .layer(cors)
    }

    pub fn socket_addr(&self) -> String {
        self.config.socket_addr()
    }

    /// Start the HTTP server (async)
    pub async fn start(self) -> Result<(), io::Error> {
        let addr: SocketAddr = self.config.socket_addr().parse().map_err(|e| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("Invalid socket address '{}': {}", self.config.socket_addr(), e),
            )
        })?;

        let listener = TcpListener::bind(addr).await?;

        let addr = addr.to_string();
        Logger::info(Event::ServerStarted, &[("addr", addr.as_str())]);
        if self.config.api_token.is_none() {
            Logger::warn(
                Event::AuthDisabled,
                &[("reason", "no api_token configured; write routes are open")],
            );
        }

        axum::serve(listener, self.router).await
    }
}

async fn welcome_handler() -> &'static str {
    WELCOME_MESSAGE
}

async fn health_handler() -> (StatusCode, Json<HealthResponse>) {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "ok",
            version: env!("CARGO_PKG_VERSION"),
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_server_with_custom_port() {
        let dir = TempDir::new().unwrap();
        let catalog = MovieCatalog::open(dir.path().join("movies.csv"));
        let server = HttpServer::new(HttpServerConfig::with_port(8080), catalog);
        assert_eq!(server.socket_addr(), "0.0.0.0:8080");
    }

    #[tokio::test]
    async fn test_invalid_host_is_an_error() {
        let dir = TempDir::new().unwrap();
        let catalog = MovieCatalog::open(dir.path().join("movies.csv"));
        let config = HttpServerConfig {
            host: "not a host".to_string(),
            ..HttpServerConfig::default()
        };

        let err = HttpServer::new(config, catalog).start().await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }
}
