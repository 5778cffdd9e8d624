//! Bookmark endpoints.
//!
//! - GET    /api/v1/bookmarks?q=&tag=&category=&page=&per_page=
//! - POST   /api/v1/bookmarks                  create
//! - POST   /api/v1/bookmarks/import           bulk create (browser extension)
//! - PUT    /api/v1/bookmarks/order { ids }    drag-and-drop order
//! - GET    /api/v1/bookmarks/tags             tag counts
//! - GET/PUT/DELETE /api/v1/bookmarks/{id}

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;

use crate::bookmarks::{service, BookmarkQuery};
use crate::error::Result;
use crate::models::{Bookmark, BookmarkUpdate, ImportSummary, NewBookmark, Page, TagCount};
use crate::state::AppState;

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/api/v1/bookmarks", get(list_bookmarks).post(create_bookmark))
        .route("/api/v1/bookmarks/import", post(import_bookmarks))
        .route("/api/v1/bookmarks/order", put(reorder_bookmarks))
        .route("/api/v1/bookmarks/tags", get(list_tags))
        .route(
            "/api/v1/bookmarks/{id}",
            get(get_bookmark).put(update_bookmark).delete(delete_bookmark),
        )
        .with_state(state)
}

#[derive(Debug, Deserialize)]
struct ReorderRequest {
    ids: Vec<String>,
}

async fn list_bookmarks(
    State(state): State<AppState>,
    Query(query): Query<BookmarkQuery>,
) -> Result<Json<Page<Bookmark>>> {
    Ok(Json(service::search(state.bookmarks.as_ref(), &query)?))
}

async fn create_bookmark(
    State(state): State<AppState>,
    Json(new): Json<NewBookmark>,
) -> Result<(StatusCode, Json<Bookmark>)> {
    let bookmark = service::create(state.bookmarks.as_ref(), new)?;
    Ok((StatusCode::CREATED, Json(bookmark)))
}

async fn import_bookmarks(
    State(state): State<AppState>,
    Json(incoming): Json<Vec<NewBookmark>>,
) -> Result<Json<ImportSummary>> {
    Ok(Json(service::import_many(state.bookmarks.as_ref(), incoming)?))
}

async fn reorder_bookmarks(
    State(state): State<AppState>,
    Json(request): Json<ReorderRequest>,
) -> Result<StatusCode> {
    service::reorder(state.bookmarks.as_ref(), &request.ids)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_tags(State(state): State<AppState>) -> Result<Json<Vec<TagCount>>> {
    Ok(Json(service::tag_counts(state.bookmarks.as_ref())?))
}

async fn get_bookmark(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Bookmark>> {
    Ok(Json(service::get(state.bookmarks.as_ref(), &id)?))
}

async fn update_bookmark(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(changes): Json<BookmarkUpdate>,
) -> Result<Json<Bookmark>> {
    Ok(Json(service::update(state.bookmarks.as_ref(), &id, changes)?))
}

async fn delete_bookmark(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    service::remove(state.bookmarks.as_ref(), &id)?;
    Ok(StatusCode::NO_CONTENT)
}
