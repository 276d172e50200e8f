//! Bearer-token gate for protected routes.
//!
//! Handlers that need a caller identity take [`Authenticated`] as a
//! parameter; axum runs the extractor before the handler body, so a request
//! without a valid token never reaches business logic. Public handlers just
//! leave it out.

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use phantom_shared::Principal;

use crate::api::AppState;
use crate::error::ServerError;

const BEARER_SCHEME: &str = "bearer";

/// The verified identity behind a request.
#[derive(Debug, Clone)]
pub struct Authenticated(pub Principal);

#[axum::async_trait]
impl FromRequestParts<AppState> for Authenticated {
    type Rejection = ServerError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let credential = bearer_credential(&parts.headers).map_err(|reason| {
            tracing::debug!(reason, "rejecting request without usable credentials");
            ServerError::Unauthorized
        })?;

        let principal = state.tokens.verify(credential).map_err(|e| {
            tracing::debug!(error = %e, "rejecting request with invalid token");
            ServerError::Unauthorized
        })?;

        Ok(Authenticated(principal))
    }
}

/// Pull the credential out of an `Authorization: Bearer <token>` header.
/// The error is a short reason for the debug log only.
fn bearer_credential(headers: &HeaderMap) -> Result<&str, &'static str> {
    let value = headers
        .get(AUTHORIZATION)
        .ok_or("authorization header is not provided")?
        .to_str()
        .map_err(|_| "authorization header is not valid text")?;

    let mut fields = value.split_whitespace();
    let (Some(scheme), Some(credential), None) = (fields.next(), fields.next(), fields.next())
    else {
        return Err("invalid authorization header format");
    };

    if !scheme.eq_ignore_ascii_case(BEARER_SCHEME) {
        return Err("unsupported authorization type");
    }
    Ok(credential)
}
