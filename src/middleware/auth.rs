// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Bearer token authentication middleware.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};

use crate::error::AppError;
use crate::services::firebase_token::{IdTokenClaims, InvalidToken};
use crate::AppState;

/// Authenticated user extracted from a verified ID token.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub uid: String,
    pub role: Option<String>,
}

impl From<IdTokenClaims> for AuthUser {
    fn from(claims: IdTokenClaims) -> Self {
        Self {
            uid: claims.sub,
            role: claims.role,
        }
    }
}

/// Middleware that requires a valid ID token.
///
/// The failure cause stays in the log; the response body is always the
/// generic "Unauthorized".
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let claims = verify_request(&state, request.headers())
        .await
        .map_err(|err| {
            tracing::warn!(reason = %err, "Blocked unauthenticated request");
            AppError::Unauthorized
        })?;

    request.extensions_mut().insert(AuthUser::from(claims));
    Ok(next.run(request).await)
}

/// Middleware that requires a valid ID token carrying the admin role.
///
/// Verification failure and wrong role collapse into the same status
/// family so the caller cannot distinguish which check failed.
pub async fn require_admin(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let claims = verify_request(&state, request.headers())
        .await
        .map_err(|err| {
            tracing::warn!(reason = %err, "Blocked admin request: token verification failed");
            AppError::Forbidden
        })?;

    if claims.role.as_deref() != Some("admin") {
        tracing::warn!(uid = %claims.sub, role = ?claims.role, "Blocked non-admin request");
        return Err(AppError::AdminOnly);
    }

    request.extensions_mut().insert(AuthUser::from(claims));
    Ok(next.run(request).await)
}

async fn verify_request(
    state: &AppState,
    headers: &HeaderMap,
) -> Result<IdTokenClaims, InvalidToken> {
    let token = extract_token(headers)
        .ok_or_else(|| InvalidToken("missing authorization header".to_string()))?;

    state.token_verifier.verify(token).await
}

/// Pull the token out of the authorization header.
///
/// Clients send either the raw ID token or a `Bearer `-prefixed one;
/// both forms are accepted.
fn extract_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ").unwrap_or(value);

    if token.is_empty() {
        return None;
    }

    Some(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers_with_auth(value: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static(value));
        headers
    }

    #[test]
    fn test_extract_token_bearer_prefixed() {
        let headers = headers_with_auth("Bearer abc.def.ghi");
        assert_eq!(extract_token(&headers), Some("abc.def.ghi"));
    }

    #[test]
    fn test_extract_token_raw() {
        let headers = headers_with_auth("abc.def.ghi");
        assert_eq!(extract_token(&headers), Some("abc.def.ghi"));
    }

    #[test]
    fn test_extract_token_missing_or_empty() {
        assert_eq!(extract_token(&HeaderMap::new()), None);

        let headers = headers_with_auth("Bearer ");
        assert_eq!(extract_token(&headers), None);
    }
}
