//! File materialization endpoints.
//!
//! - POST /api/v1/files/write { path, content }
//!   Writes one file under the workspace. Paths are relative; `..` and
//!   absolute paths are rejected with 400.
//!
//! - POST /api/v1/import { markdown, targetDir? }
//!   Parses an exported document and writes each `## <path>` unit under the
//!   workspace (or `targetDir` inside it), retrying each file up to three
//!   times. Per-file failures are reported, not raised.
//!
//! Used by: "Markdown → files" dialog

use axum::{extract::State, routing::post, Json, Router};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::import::{import_markdown, FileWriter, ImportReport, LocalFileWriter, WriteFileRequest};
use crate::state::AppState;

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/api/v1/files/write", post(write_file))
        .route("/api/v1/import", post(import))
        .with_state(state)
}

#[derive(Debug, Serialize)]
struct WriteFileResponse {
    success: bool,
    path: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImportRequest {
    #[serde(default)]
    markdown: String,
    target_dir: Option<String>,
}

async fn write_file(
    State(state): State<AppState>,
    Json(request): Json<WriteFileRequest>,
) -> Result<Json<WriteFileResponse>> {
    state.workspace.write_file(&request.path, &request.content).await?;
    tracing::info!("Wrote {} via write endpoint", request.path);
    Ok(Json(WriteFileResponse { success: true, path: request.path }))
}

async fn import(
    State(state): State<AppState>,
    Json(request): Json<ImportRequest>,
) -> Result<Json<ImportReport>> {
    if request.markdown.trim().is_empty() {
        return Err(AppError::BadRequest("markdown is required".to_string()));
    }

    let writer = match request.target_dir.as_deref().filter(|d| !d.trim().is_empty()) {
        Some(dir) => LocalFileWriter::new(state.workspace.resolve(dir)?),
        None => state.workspace.clone(),
    };

    let report = import_markdown(&writer, &request.markdown, &state.retry).await?;
    Ok(Json(report))
}
