use std::future::Future;

use crate::error::Result;
use crate::github::RepoId;

/// Anything that can return a repository file as text.
pub trait ContentSource: Send + Sync {
    fn fetch_text(&self, repo: &RepoId, path: &str) -> impl Future<Output = Result<String>> + Send;
}

pub fn placeholder(error: &impl std::fmt::Display) -> String {
    format!("Error loading file content: {}", error)
}

/// Fetches one file, substituting a placeholder on failure. Never retries.
pub async fn fetch_or_placeholder<S: ContentSource>(source: &S, repo: &RepoId, path: &str) -> String {
    match source.fetch_text(repo, path).await {
        Ok(content) => content,
        Err(e) => {
            tracing::warn!("Failed to fetch {} from {}: {}", path, repo, e);
            placeholder(&e)
        }
    }
}
