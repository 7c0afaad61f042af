//! # MovieMatch HTTP Server Module
//!
//! JSON API over the movie catalog, served with axum.
//!
//! # Endpoints
//!
//! - `/` - Welcome text
//! - `/health` - Health check
//! - `/movies/*` - Catalog queries and token-guarded mutations

pub mod auth;
pub mod config;
pub mod errors;
pub mod movie_routes;
pub mod response;
pub mod server;

pub use config::HttpServerConfig;
pub use errors::{ApiError, ApiResult};
pub use server::HttpServer;
