//! Session cookie endpoints.
//!
//! - POST /api/v1/session { token }
//!   Checks the token against GitHub `/user`, then stores it in an HTTP-only
//!   `github_token` cookie. A rejected token answers 401.
//!
//! - DELETE /api/v1/session
//!   Clears the cookie.
//!
//! The OAuth handshake that produces the token happens elsewhere.

use axum::{
    extract::State,
    http::StatusCode,
    routing::post,
    Json, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Deserialize;

use crate::error::{AppError, Result};
use crate::github::TOKEN_COOKIE;
use crate::models::GitHubUser;
use crate::state::AppState;

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/api/v1/session", post(sign_in).delete(sign_out))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
struct SignInRequest {
    #[serde(default)]
    token: String,
}

fn token_cookie(value: String) -> Cookie<'static> {
    Cookie::build((TOKEN_COOKIE, value))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}

async fn sign_in(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(request): Json<SignInRequest>,
) -> Result<(CookieJar, Json<GitHubUser>)> {
    let token = request.token.trim().to_string();
    if token.is_empty() {
        return Err(AppError::BadRequest("token is required".to_string()));
    }

    let user = state.github.current_user(&token).await?;
    tracing::info!("Signed in as {}", user.login);
    Ok((jar.add(token_cookie(token)), Json(user)))
}

async fn sign_out(jar: CookieJar) -> (CookieJar, StatusCode) {
    (jar.remove(Cookie::build(TOKEN_COOKIE).path("/")), StatusCode::NO_CONTENT)
}
