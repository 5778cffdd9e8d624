//! GitHub token extraction.
//!
//! The token lives in an HTTP-only `github_token` cookie issued by
//! `POST /api/v1/session`. A server-wide token from the CLI/env is used when
//! the cookie is absent; with neither, the request is `Unauthorized`.

use axum::extract::{FromRef, FromRequestParts};
use axum::http::request::Parts;
use axum_extra::extract::cookie::CookieJar;

use crate::error::AppError;
use crate::state::AppState;

pub const TOKEN_COOKIE: &str = "github_token";

#[derive(Debug, Clone)]
pub struct GitHubToken(pub String);

impl GitHubToken {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl<S> FromRequestParts<S> for GitHubToken
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        if let Some(cookie) = jar.get(TOKEN_COOKIE) {
            if !cookie.value().is_empty() {
                return Ok(GitHubToken(cookie.value().to_string()));
            }
        }

        AppState::from_ref(state)
            .fallback_token
            .map(GitHubToken)
            .ok_or_else(|| AppError::Unauthorized("sign in with a GitHub token first".to_string()))
    }
}
