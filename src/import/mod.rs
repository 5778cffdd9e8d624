//! Markdown → files: the reverse of the export.
//!
//! - `parser`: `## <path>` + fenced block units
//! - `writer`: `FileWriter` trait, local and HTTP implementations
//! - `retry`: per-file retry with linear backoff, aggregated report

pub mod parser;
pub mod retry;
pub mod writer;

pub use parser::parse_markdown;
pub use retry::{materialize, ImportReport, RetryPolicy};
pub use writer::{FileWriter, HttpFileWriter, LocalFileWriter, WriteFileRequest};

use crate::error::{AppError, Result};

/// Parses `markdown` and writes every unit through `writer`.
pub async fn import_markdown<W: FileWriter>(
    writer: &W,
    markdown: &str,
    policy: &RetryPolicy,
) -> Result<ImportReport> {
    let units = parse_markdown(markdown);
    if units.is_empty() {
        return Err(AppError::BadRequest(
            "no `## <path>` sections with code blocks found".to_string(),
        ));
    }
    tracing::info!("Importing {} files from Markdown", units.len());
    Ok(materialize(writer, &units, policy).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn imports_into_local_directory() {
        let dir = tempfile::tempdir().unwrap();
        let writer = LocalFileWriter::new(dir.path());
        let md = "## src/a.rs\n\n```rs\nfn a() {}\n```\n\n## ../escape.txt\n\n```\nno\n```\n";

        let report = import_markdown(&writer, md, &RetryPolicy { max_attempts: 1, ..Default::default() })
            .await
            .unwrap();

        assert_eq!(report.written, vec!["src/a.rs"]);
        assert_eq!(report.failed.len(), 1);
        assert!(!dir.path().parent().unwrap().join("escape.txt").exists());
        assert_eq!(std::fs::read_to_string(dir.path().join("src/a.rs")).unwrap(), "fn a() {}\n");
    }

    #[tokio::test]
    async fn empty_markdown_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let writer = LocalFileWriter::new(dir.path());
        let result = import_markdown(&writer, "# nothing here", &RetryPolicy::default()).await;
        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }
}
