//! Documentation export endpoints.
//!
//! - POST /api/v1/export
//!   Runs the export to completion and returns one document or an array of
//!   parts. Body: { repo, ref?, entries?, excludedFolders, excludedFiles,
//!   excludedFileTypes, folderMatch, splitOptions? }. Without `entries` the
//!   tree is fetched from GitHub.
//!
//! - POST /api/v1/export/jobs
//!   Same body; starts a background run and returns { id }.
//!
//! - GET /api/v1/export/jobs/{id}
//!   Latest progress snapshot, plus the output once complete.
//!
//! Used by: export dialog and its progress bar

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::Result;
use crate::export::jobs::ExportJob;
use crate::export::{export_repository, ExportOptions, ExportOutput, TreeEntry};
use crate::github::{GitHubSource, GitHubToken, RepoId};
use crate::state::AppState;

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/api/v1/export", post(run_export))
        .route("/api/v1/export/jobs", post(start_export_job))
        .route("/api/v1/export/jobs/{id}", get(get_export_job))
        .with_state(state)
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct ExportRequest {
    repo: String,
    #[serde(rename = "ref")]
    git_ref: Option<String>,
    entries: Option<Vec<TreeEntry>>,
    #[serde(flatten)]
    options: ExportOptions,
}

#[derive(Debug, Serialize)]
struct JobCreated {
    id: u64,
}

/// Validates the request and resolves the entry list before any file fetch.
async fn prepare(
    state: &AppState,
    token: &GitHubToken,
    request: ExportRequest,
) -> Result<(RepoId, Vec<TreeEntry>, ExportOptions, GitHubSource)> {
    let repo = RepoId::parse(&request.repo)?;
    if let Some(split) = &request.options.split_options {
        split.validate()?;
    }

    let entries = match request.entries {
        Some(entries) => entries,
        None => {
            state
                .github
                .get_tree(token.as_str(), &repo, request.git_ref.as_deref())
                .await?
                .entries
        }
    };

    let source = GitHubSource::new(state.github.clone(), token.0.clone(), request.git_ref);
    Ok((repo, entries, request.options, source))
}

async fn run_export(
    State(state): State<AppState>,
    token: GitHubToken,
    Json(request): Json<ExportRequest>,
) -> Result<Json<ExportOutput>> {
    let (repo, entries, options, source) = prepare(&state, &token, request).await?;
    let output = export_repository(&source, &repo, &entries, &options, |snapshot| {
        tracing::debug!(
            "Export {}: {}/{} {}",
            repo,
            snapshot.current,
            snapshot.total,
            snapshot.file_name
        );
    })
    .await?;
    Ok(Json(output))
}

async fn start_export_job(
    State(state): State<AppState>,
    token: GitHubToken,
    Json(request): Json<ExportRequest>,
) -> Result<(StatusCode, Json<JobCreated>)> {
    let (repo, entries, options, source) = prepare(&state, &token, request).await?;
    let id = state.jobs.start(Arc::new(source), repo, entries, options)?;
    Ok((StatusCode::ACCEPTED, Json(JobCreated { id })))
}

async fn get_export_job(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<ExportJob>> {
    Ok(Json(state.jobs.get(id)?))
}
