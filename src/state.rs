use std::path::PathBuf;
use std::sync::Arc;

use crate::bookmarks::{JsonFileStore, MemoryStore, SharedStore};
use crate::error::Result;
use crate::export::ExportJobs;
use crate::github::GitHubClient;
use crate::import::{LocalFileWriter, RetryPolicy};

/// Value of `--bookmarks` that keeps bookmarks in memory only.
pub const IN_MEMORY: &str = ":memory:";

/// Shared handles for every route module.
#[derive(Clone)]
pub struct AppState {
    pub github: GitHubClient,
    /// Used when a request carries no `github_token` cookie.
    pub fallback_token: Option<String>,
    pub bookmarks: SharedStore,
    pub jobs: ExportJobs,
    pub workspace: LocalFileWriter,
    pub retry: RetryPolicy,
}

impl AppState {
    pub fn new(
        github: GitHubClient,
        fallback_token: Option<String>,
        bookmarks: SharedStore,
        workspace: impl Into<PathBuf>,
    ) -> Self {
        Self {
            github,
            fallback_token: fallback_token.filter(|t| !t.trim().is_empty()),
            bookmarks,
            jobs: ExportJobs::new(),
            workspace: LocalFileWriter::new(workspace),
            retry: RetryPolicy::default(),
        }
    }
}

pub fn open_bookmark_store(location: &str) -> Result<SharedStore> {
    if location == IN_MEMORY {
        tracing::warn!("Bookmarks are kept in memory and will be lost on exit");
        return Ok(Arc::new(MemoryStore::new()));
    }
    Ok(Arc::new(JsonFileStore::open(location)?))
}
