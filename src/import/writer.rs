use serde::{Deserialize, Serialize};
use std::future::Future;
use std::path::{Component, Path, PathBuf};

use crate::error::{AppError, Result};

/// Destination for materialized files.
pub trait FileWriter: Send + Sync {
    fn write_file(&self, path: &str, content: &str) -> impl Future<Output = Result<()>> + Send;
}

/// Body of the write endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WriteFileRequest {
    pub path: String,
    pub content: String,
}

/// Writes files beneath a root directory.
#[derive(Debug, Clone)]
pub struct LocalFileWriter {
    root: PathBuf,
}

impl LocalFileWriter {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Joins a relative path onto the root, refusing anything that could
    /// escape it.
    pub fn resolve(&self, path: &str) -> Result<PathBuf> {
        let relative = Path::new(path);
        if path.trim().is_empty() {
            return Err(AppError::BadRequest("path is required".to_string()));
        }

        let mut resolved = self.root.clone();
        for component in relative.components() {
            match component {
                Component::Normal(part) => resolved.push(part),
                Component::CurDir => {}
                Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                    return Err(AppError::BadRequest(format!(
                        "path must stay inside the workspace: {}",
                        path
                    )));
                }
            }
        }
        Ok(resolved)
    }
}

impl FileWriter for LocalFileWriter {
    async fn write_file(&self, path: &str, content: &str) -> Result<()> {
        let target = self.resolve(path)?;
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&target, content).await?;
        tracing::debug!("Wrote {} ({} bytes)", target.display(), content.len());
        Ok(())
    }
}

/// Posts files to a remote write endpoint (`POST { path, content }`).
#[derive(Debug, Clone)]
pub struct HttpFileWriter {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpFileWriter {
    pub fn new(client: reqwest::Client, endpoint: impl Into<String>) -> Self {
        Self { client, endpoint: endpoint.into() }
    }
}

impl FileWriter for HttpFileWriter {
    async fn write_file(&self, path: &str, content: &str) -> Result<()> {
        let body = WriteFileRequest { path: path.to_string(), content: content.to_string() };
        let response = self.client.post(&self.endpoint).json(&body).send().await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(AppError::Upstream { status, message });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_rejects_escapes() {
        let writer = LocalFileWriter::new("/tmp/ws");
        assert_eq!(writer.resolve("a/./b.txt").unwrap(), PathBuf::from("/tmp/ws/a/b.txt"));
        assert!(matches!(writer.resolve("../etc/passwd"), Err(AppError::BadRequest(_))));
        assert!(matches!(writer.resolve("/etc/passwd"), Err(AppError::BadRequest(_))));
        assert!(matches!(writer.resolve("  "), Err(AppError::BadRequest(_))));
    }

    #[tokio::test]
    async fn writes_nested_files() {
        let dir = tempfile::tempdir().unwrap();
        let writer = LocalFileWriter::new(dir.path());
        writer.write_file("src/deep/mod.rs", "pub mod x;\n").await.unwrap();

        let written = std::fs::read_to_string(dir.path().join("src/deep/mod.rs")).unwrap();
        assert_eq!(written, "pub mod x;\n");
    }
}
