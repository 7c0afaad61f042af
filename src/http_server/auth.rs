//! Bearer token check for mutating routes

use axum::http::HeaderMap;
use subtle::ConstantTimeEq;

use super::errors::{ApiError, ApiResult};

/// Extract Bearer token from Authorization header
fn extract_bearer_token(headers: &HeaderMap) -> ApiResult<&str> {
    let header = headers
        .get("authorization")
        .ok_or_else(|| ApiError::Unauthorized("Missing authorization header".to_string()))?;

    header
        .to_str()
        .ok()
        .and_then(|s| s.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| {
            ApiError::Unauthorized("Authorization header must use the Bearer scheme".to_string())
        })
}

/// Checks the request against the configured token.
///
/// With no token configured every request passes.
pub fn authorize(expected: Option<&str>, headers: &HeaderMap) -> ApiResult<()> {
    let Some(expected) = expected else {
        return Ok(());
    };

    let presented = extract_bearer_token(headers)?;
    if bool::from(presented.as_bytes().ct_eq(expected.as_bytes())) {
        Ok(())
    } else {
        Err(ApiError::Forbidden("Invalid API token".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderValue, StatusCode};

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_no_token_configured_allows_all() {
        assert!(authorize(None, &HeaderMap::new()).is_ok());
    }

    #[test]
    fn test_missing_or_malformed_header_is_unauthorized() {
        let err = authorize(Some("1234"), &HeaderMap::new()).unwrap_err();
        assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);

        let err = authorize(Some("1234"), &headers("Basic 1234")).unwrap_err();
        assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);

        let err = authorize(Some("1234"), &headers("Bearer ")).unwrap_err();
        assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_token_comparison() {
        assert!(authorize(Some("1234"), &headers("Bearer 1234")).is_ok());

        let err = authorize(Some("1234"), &headers("Bearer 12345")).unwrap_err();
        assert_eq!(err.status_code(), StatusCode::FORBIDDEN);
    }
}
