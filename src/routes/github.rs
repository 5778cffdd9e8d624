//! GitHub proxy endpoints.
//!
//! All routes need a token (session cookie or server fallback) and forward
//! to the GitHub REST API:
//! - GET /api/v1/github/user
//! - GET /api/v1/github/repos?page=&per_page=&sort=
//! - GET /api/v1/github/repos/{owner}/{name}
//! - GET /api/v1/github/repos/{owner}/{name}/branches
//! - GET /api/v1/github/repos/{owner}/{name}/commits?ref=&path=&page=&per_page=
//! - GET /api/v1/github/repos/{owner}/{name}/tree?ref=
//! - GET /api/v1/github/repos/{owner}/{name}/contents?path=&ref=
//!
//! Used by: repository list, file browser and export dialog

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use crate::error::{AppError, Result};
use crate::github::{GitHubToken, RepoId};
use crate::models::{
    BranchSummary, CommitSummary, FileContent, GitHubUser, Page, RepoSummary, TreeListing,
};
use crate::state::AppState;

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/api/v1/github/user", get(get_user))
        .route("/api/v1/github/repos", get(list_repos))
        .route("/api/v1/github/repos/{owner}/{name}", get(get_repo))
        .route("/api/v1/github/repos/{owner}/{name}/branches", get(list_branches))
        .route("/api/v1/github/repos/{owner}/{name}/commits", get(list_commits))
        .route("/api/v1/github/repos/{owner}/{name}/tree", get(get_tree))
        .route("/api/v1/github/repos/{owner}/{name}/contents", get(get_contents))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
struct PageQuery {
    #[serde(default = "default_page")]
    page: u32,
    #[serde(default = "default_per_page")]
    per_page: u32,
    sort: Option<String>,
}

fn default_page() -> u32 {
    1
}

fn default_per_page() -> u32 {
    30
}

#[derive(Debug, Deserialize)]
struct CommitsQuery {
    #[serde(rename = "ref")]
    git_ref: Option<String>,
    path: Option<String>,
    #[serde(default = "default_page")]
    page: u32,
    #[serde(default = "default_per_page")]
    per_page: u32,
}

#[derive(Debug, Deserialize)]
struct RefQuery {
    #[serde(rename = "ref")]
    git_ref: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ContentsQuery {
    path: Option<String>,
    #[serde(rename = "ref")]
    git_ref: Option<String>,
}

async fn get_user(State(state): State<AppState>, token: GitHubToken) -> Result<Json<GitHubUser>> {
    let user = state.github.current_user(token.as_str()).await?;
    Ok(Json(user))
}

async fn list_repos(
    State(state): State<AppState>,
    token: GitHubToken,
    Query(query): Query<PageQuery>,
) -> Result<Json<Page<RepoSummary>>> {
    let page = state
        .github
        .list_repos(token.as_str(), query.page, query.per_page, query.sort.as_deref())
        .await?;
    Ok(Json(page))
}

async fn get_repo(
    State(state): State<AppState>,
    token: GitHubToken,
    Path((owner, name)): Path<(String, String)>,
) -> Result<Json<RepoSummary>> {
    let repo = RepoId::new(owner, name)?;
    Ok(Json(state.github.get_repo(token.as_str(), &repo).await?))
}

async fn list_branches(
    State(state): State<AppState>,
    token: GitHubToken,
    Path((owner, name)): Path<(String, String)>,
) -> Result<Json<Vec<BranchSummary>>> {
    let repo = RepoId::new(owner, name)?;
    Ok(Json(state.github.list_branches(token.as_str(), &repo).await?))
}

async fn list_commits(
    State(state): State<AppState>,
    token: GitHubToken,
    Path((owner, name)): Path<(String, String)>,
    Query(query): Query<CommitsQuery>,
) -> Result<Json<Page<CommitSummary>>> {
    let repo = RepoId::new(owner, name)?;
    let page = state
        .github
        .list_commits(
            token.as_str(),
            &repo,
            query.git_ref.as_deref(),
            query.path.as_deref(),
            query.page,
            query.per_page,
        )
        .await?;
    Ok(Json(page))
}

async fn get_tree(
    State(state): State<AppState>,
    token: GitHubToken,
    Path((owner, name)): Path<(String, String)>,
    Query(query): Query<RefQuery>,
) -> Result<Json<TreeListing>> {
    let repo = RepoId::new(owner, name)?;
    let tree = state
        .github
        .get_tree(token.as_str(), &repo, query.git_ref.as_deref())
        .await?;
    Ok(Json(tree))
}

async fn get_contents(
    State(state): State<AppState>,
    token: GitHubToken,
    Path((owner, name)): Path<(String, String)>,
    Query(query): Query<ContentsQuery>,
) -> Result<Json<FileContent>> {
    let repo = RepoId::new(owner, name)?;
    let path = query
        .path
        .filter(|p| !p.trim().is_empty())
        .ok_or_else(|| AppError::BadRequest("path is required".to_string()))?;
    let file = state
        .github
        .get_file(token.as_str(), &repo, &path, query.git_ref.as_deref())
        .await?;
    Ok(Json(file))
}
