//! # Catalog Errors
//!
//! Every failure the catalog can surface, grouped into the five kinds the
//! HTTP layer understands:
//!
//! - `validation` (400): malformed payload or query parameter
//! - `duplicate` (409): id or title already taken
//! - `not_found` (404): lookup miss
//! - `storage` (500): backing file unreadable or malformed
//! - `unexpected` (500): anything else, never shown to clients

use std::fmt;
use std::io;

use thiserror::Error;

/// Result type for catalog operations
pub type CatalogResult<T> = Result<T, CatalogError>;

/// Machine-readable error category
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Duplicate,
    NotFound,
    Storage,
    Unexpected,
}

impl ErrorKind {
    /// Wire name used in the `tipo` field of error bodies
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "validation",
            ErrorKind::Duplicate => "duplicate",
            ErrorKind::NotFound => "not_found",
            ErrorKind::Storage => "storage",
            ErrorKind::Unexpected => "unexpected",
        }
    }

    /// HTTP status associated with this kind
    pub fn status_code(&self) -> u16 {
        match self {
            ErrorKind::Validation => 400,
            ErrorKind::NotFound => 404,
            ErrorKind::Duplicate => 409,
            ErrorKind::Storage => 500,
            ErrorKind::Unexpected => 500,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Catalog errors
#[derive(Debug, Error)]
pub enum CatalogError {
    // ==================
    // Validation (400)
    // ==================
    /// Field or parameter failed a structural check
    #[error("{0}")]
    Validation(String),

    /// Payload carries fields that are not part of a movie
    #[error("Unknown fields: {}", .0.join(", "))]
    UnknownField(Vec<String>),

    /// Payload tries to change an immutable field
    #[error("Field '{0}' cannot be modified")]
    ForbiddenField(String),

    // ==================
    // Conflicts (409)
    // ==================
    #[error("{0}")]
    Duplicate(String),

    // ==================
    // Lookups (404)
    // ==================
    #[error("{0}")]
    NotFound(String),

    // ==================
    // Storage (500)
    // ==================
    /// Backing file is structurally malformed
    #[error("Malformed movie file: {0}")]
    Storage(String),

    /// Backing file could not be read or written
    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: io::Error,
    },

    // ==================
    // Everything else (500)
    // ==================
    #[error("{0}")]
    Unexpected(String),
}

impl CatalogError {
    pub fn validation(message: impl Into<String>) -> Self {
        CatalogError::Validation(message.into())
    }

    pub fn duplicate(message: impl Into<String>) -> Self {
        CatalogError::Duplicate(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        CatalogError::NotFound(message.into())
    }

    pub fn storage(message: impl Into<String>) -> Self {
        CatalogError::Storage(message.into())
    }

    pub fn io(context: impl Into<String>, source: io::Error) -> Self {
        CatalogError::Io {
            context: context.into(),
            source,
        }
    }

    /// Category of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            CatalogError::Validation(_)
            | CatalogError::UnknownField(_)
            | CatalogError::ForbiddenField(_) => ErrorKind::Validation,
            CatalogError::Duplicate(_) => ErrorKind::Duplicate,
            CatalogError::NotFound(_) => ErrorKind::NotFound,
            CatalogError::Storage(_) | CatalogError::Io { .. } => ErrorKind::Storage,
            CatalogError::Unexpected(_) => ErrorKind::Unexpected,
        }
    }

    pub fn status_code(&self) -> u16 {
        self.kind().status_code()
    }

    /// Operational errors are anticipated and safe to show to clients.
    pub fn is_operational(&self) -> bool {
        self.kind() != ErrorKind::Unexpected
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(CatalogError::validation("bad year").status_code(), 400);
        assert_eq!(CatalogError::ForbiddenField("id".into()).status_code(), 400);
        assert_eq!(CatalogError::duplicate("taken").status_code(), 409);
        assert_eq!(CatalogError::not_found("gone").status_code(), 404);
        assert_eq!(CatalogError::storage("no header").status_code(), 500);
        assert_eq!(CatalogError::Unexpected("boom".into()).status_code(), 500);
    }

    #[test]
    fn test_unknown_and_forbidden_are_validation() {
        let unknown = CatalogError::UnknownField(vec!["rating".into(), "foo".into()]);
        assert_eq!(unknown.kind(), ErrorKind::Validation);
        assert_eq!(unknown.to_string(), "Unknown fields: rating, foo");

        let forbidden = CatalogError::ForbiddenField("title".into());
        assert_eq!(forbidden.kind(), ErrorKind::Validation);
    }

    #[test]
    fn test_io_error_keeps_source() {
        let err = CatalogError::io(
            "Failed to read movies.csv",
            io::Error::new(io::ErrorKind::NotFound, "missing"),
        );
        assert_eq!(err.kind(), ErrorKind::Storage);
        assert!(std::error::Error::source(&err).is_some());
        assert!(err.is_operational());
    }

    #[test]
    fn test_unexpected_is_not_operational() {
        assert!(!CatalogError::Unexpected("lock poisoned".into()).is_operational());
        assert_eq!(ErrorKind::NotFound.to_string(), "not_found");
    }
}
