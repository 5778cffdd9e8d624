//! API route handlers - maps HTTP endpoints to services.
//!
//! Each submodule defines routes for a feature area:
//! - `health`: liveness (GET /api/v1/health)
//! - `session`: GitHub token cookie (POST/DELETE /api/v1/session)
//! - `github`: GitHub REST proxy (repos, branches, commits, tree, contents)
//! - `export`: repository → Markdown, direct or as a polled background job
//! - `files`: write-file endpoint and Markdown → files import
//! - `bookmarks`: link manager CRUD, search, import, ordering

pub mod bookmarks;
pub mod export;
pub mod files;
pub mod github;
pub mod health;
pub mod session;

use axum::Router;

use crate::state::AppState;

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .merge(health::routes())
        .merge(session::routes(state.clone()))
        .merge(github::routes(state.clone()))
        .merge(export::routes(state.clone()))
        .merge(files::routes(state.clone()))
        .merge(bookmarks::routes(state))
}
