//! Observable events
//!
//! Every log line names exactly one of these.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Lifecycle
    /// Catalog file created by `init`
    CatalogInitialized,
    /// HTTP listener bound and serving
    ServerStarted,
    /// No API token configured; mutating routes are open
    AuthDisabled,

    // Mutations
    MovieCreated,
    MovieUpdated,
    MovieDeleted,

    // Failures
    /// Operational error answered with a 4xx/5xx body
    RequestFailed,
    /// Non-operational error; detail stays in the log
    UnexpectedError,
}

impl Event {
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::CatalogInitialized => "catalog_initialized",
            Event::ServerStarted => "server_started",
            Event::AuthDisabled => "auth_disabled",
            Event::MovieCreated => "movie_created",
            Event::MovieUpdated => "movie_updated",
            Event::MovieDeleted => "movie_deleted",
            Event::RequestFailed => "request_failed",
            Event::UnexpectedError => "unexpected_error",
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
