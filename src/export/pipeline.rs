//! Export orchestration: tree + filter → sequential fetch → Markdown.
//!
//! Files are fetched one at a time in entry order; progress is reported after
//! each file. A failed fetch is embedded as placeholder text and the run
//! carries on, so the only error paths are invalid options.

use serde::{Deserialize, Serialize};

use super::fetch::{fetch_or_placeholder, ContentSource};
use super::filter::ExclusionConfig;
use super::markdown::{self, FileSection, MarkdownDocument, SplitOptions};
use super::progress::{ProgressSnapshot, ProgressTracker};
use super::tree::{TreeEntry, TreeIndex};
use crate::error::Result;
use crate::github::RepoId;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExportOptions {
    #[serde(flatten)]
    pub exclusions: ExclusionConfig,
    pub split_options: Option<SplitOptions>,
}

/// Either one document or an ordered list of parts.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum ExportOutput {
    Single(MarkdownDocument),
    Parts(Vec<MarkdownDocument>),
}

impl ExportOutput {
    pub fn documents(&self) -> &[MarkdownDocument] {
        match self {
            ExportOutput::Single(doc) => std::slice::from_ref(doc),
            ExportOutput::Parts(docs) => docs,
        }
    }
}

pub async fn export_repository<S, F>(
    source: &S,
    repo: &RepoId,
    entries: &[TreeEntry],
    options: &ExportOptions,
    on_progress: F,
) -> Result<ExportOutput>
where
    S: ContentSource,
    F: FnMut(ProgressSnapshot),
{
    if let Some(split) = &options.split_options {
        split.validate()?;
    }

    let index = TreeIndex::build(entries);
    let included: Vec<&TreeEntry> = index
        .files()
        .filter(|e| options.exclusions.is_content_embeddable(e))
        .collect();

    tracing::info!(
        "Exporting {}: {} entries, {} files to embed",
        repo,
        entries.len(),
        included.len()
    );

    let mut progress = ProgressTracker::new(included.len(), on_progress);
    progress.preparing();

    let tree = markdown::render_tree(&index, &options.exclusions, &repo.to_string());

    let mut files = Vec::with_capacity(included.len());
    for entry in included {
        let content = fetch_or_placeholder(source, repo, &entry.path).await;
        files.push(FileSection { path: entry.path.clone(), content });
        progress.file_done(&entry.path);
    }

    let split_enabled = options.split_options.is_some_and(|s| s.enabled);
    let mut documents =
        markdown::assemble(&repo.to_string(), &tree, &files, options.split_options.as_ref())?;
    progress.complete();

    tracing::info!("Export of {} produced {} document(s)", repo, documents.len());

    Ok(if split_enabled {
        ExportOutput::Parts(documents)
    } else {
        ExportOutput::Single(documents.remove(0))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::fetch::testing::MapSource;
    use crate::import::parser::parse_markdown;

    fn repo() -> RepoId {
        RepoId::parse("octo/demo").unwrap()
    }

    fn entries() -> Vec<TreeEntry> {
        vec![
            TreeEntry::folder("src"),
            TreeEntry::file("src/main.rs"),
            TreeEntry::file("src/notes.md"),
            TreeEntry::file("logo.png"),
            TreeEntry::file("broken.txt"),
            TreeEntry::file("Cargo.toml"),
        ]
    }

    fn source() -> MapSource {
        MapSource::with(&[
            ("src/main.rs", "fn main() {}\n"),
            ("src/notes.md", "# Notes\n"),
            ("Cargo.toml", "[package]\nname = \"demo\"\n"),
        ])
    }

    #[tokio::test]
    async fn excluded_types_never_get_sections() {
        let options = ExportOptions {
            exclusions: ExclusionConfig {
                excluded_file_types: vec!["md".into()],
                ..Default::default()
            },
            split_options: None,
        };
        let output = export_repository(&source(), &repo(), &entries(), &options, |_| {})
            .await
            .unwrap();

        let ExportOutput::Single(doc) = output else {
            panic!("expected a single document");
        };
        assert_eq!(doc.filename, "documentation.md");
        assert!(doc.content.contains("notes.md"), "still drawn in the tree");
        assert!(!doc.content.contains("## src/notes.md"));
        assert!(!doc.content.contains("## logo.png"));
        assert!(doc.content.contains("## src/main.rs\n\n```rs\nfn main() {}\n```"));
    }

    #[tokio::test]
    async fn failed_fetch_is_embedded_and_run_completes() {
        let mut snapshots = Vec::new();
        let output = export_repository(
            &source(),
            &repo(),
            &entries(),
            &ExportOptions::default(),
            |s| snapshots.push(s),
        )
        .await
        .unwrap();

        let doc = &output.documents()[0];
        assert!(doc.content.contains("## broken.txt\n\n```txt\nError loading file content:"));

        // preparing + 4 files + complete
        assert_eq!(snapshots.len(), 6);
        assert!(snapshots.windows(2).all(|w| w[0].current <= w[1].current));
        for s in &snapshots {
            assert_eq!(s.current == s.total, s.is_complete);
        }
        assert!(snapshots.last().unwrap().is_complete);
        let names: Vec<&str> = snapshots[1..5].iter().map(|s| s.file_name.as_str()).collect();
        assert_eq!(names, vec!["src/main.rs", "src/notes.md", "broken.txt", "Cargo.toml"]);
    }

    #[tokio::test]
    async fn split_export_returns_parts() {
        let options = ExportOptions {
            exclusions: ExclusionConfig::default(),
            split_options: Some(SplitOptions { enabled: true, size: 3 }),
        };
        let output = export_repository(&source(), &repo(), &entries(), &options, |_| {})
            .await
            .unwrap();
        let ExportOutput::Parts(docs) = output else {
            panic!("expected parts");
        };
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[1].filename, "documentation-part-2-of-2.md");
    }

    #[tokio::test]
    async fn zero_split_size_fails_before_fetching() {
        let source = source();
        let options = ExportOptions {
            exclusions: ExclusionConfig::default(),
            split_options: Some(SplitOptions { enabled: true, size: 0 }),
        };
        let result = export_repository(&source, &repo(), &entries(), &options, |_| {}).await;
        assert!(result.is_err());
        assert!(source.requested.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn exported_markdown_parses_back_to_files() {
        let source = MapSource::with(&[
            ("src/main.rs", "fn main() {\n    println!(\"```\");\n}"),
            ("src/notes.md", "# Notes\n\n```sh\ncargo run\n```\n"),
            ("Cargo.toml", ""),
            ("win.txt", "line one\r\nline two\r\n"),
        ]);
        let entries = vec![
            TreeEntry::folder("src"),
            TreeEntry::file("src/main.rs"),
            TreeEntry::file("src/notes.md"),
            TreeEntry::file("Cargo.toml"),
            TreeEntry::file("win.txt"),
        ];
        let output = export_repository(&source, &repo(), &entries, &ExportOptions::default(), |_| {})
            .await
            .unwrap();

        let units = parse_markdown(&output.documents()[0].content);
        let paths: Vec<&str> = units.iter().map(|u| u.path.as_str()).collect();
        assert_eq!(paths, vec!["src/main.rs", "src/notes.md", "Cargo.toml", "win.txt"]);
        for unit in &units {
            let original = &source.files[&unit.path];
            let mut expected = original.clone();
            if !expected.is_empty() && !expected.ends_with('\n') {
                expected.push('\n');
            }
            assert_eq!(unit.content, expected);
        }
    }
}
