//! # HTTP Errors
//!
//! Maps catalog and auth failures onto status codes and the
//! `{ estado, mensaje, tipo }` error body.
//!
//! Operational errors expose their message. Unexpected errors are logged
//! with full detail and answered with a generic message.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use crate::catalog::CatalogError;
use crate::observability::{Event, Logger};

/// Result type for HTTP handlers
pub type ApiResult<T> = Result<T, ApiError>;

/// Message sent in place of unexpected error details
pub const GENERIC_ERROR_MESSAGE: &str = "Something went wrong on the server";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// Missing or malformed credentials
    #[error("{0}")]
    Unauthorized(String),

    /// Well-formed but wrong credentials
    #[error("{0}")]
    Forbidden(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Catalog(err) => StatusCode::from_u16(err.status_code())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
        }
    }

    /// Machine-readable kind for the `tipo` field
    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::Catalog(err) => err.kind().as_str(),
            ApiError::Unauthorized(_) | ApiError::Forbidden(_) => "auth",
        }
    }

    fn is_operational(&self) -> bool {
        match self {
            ApiError::Catalog(err) => err.is_operational(),
            _ => true,
        }
    }
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub estado: &'static str,
    pub mensaje: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tipo: Option<&'static str>,
}

impl From<&ApiError> for ErrorBody {
    fn from(err: &ApiError) -> Self {
        if !err.is_operational() {
            return Self {
                estado: "error",
                mensaje: GENERIC_ERROR_MESSAGE.to_string(),
                tipo: None,
            };
        }

        Self {
            estado: if err.status_code().is_client_error() {
                "fail"
            } else {
                "error"
            },
            mensaje: err.to_string(),
            tipo: Some(err.kind()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let detail = self.to_string();

        if self.is_operational() {
            Logger::warn(
                Event::RequestFailed,
                &[
                    ("status", status.as_str()),
                    ("tipo", self.kind()),
                    ("mensaje", detail.as_str()),
                ],
            );
        } else {
            Logger::error(Event::UnexpectedError, &[("detail", detail.as_str())]);
        }

        (status, Json(ErrorBody::from(&self))).into_response()
    }
}
