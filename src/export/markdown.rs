//! Markdown rendering for repository exports.
//!
//! A document is a title, a `## Project Structure` section holding an ASCII
//! tree, then one `## <path>` section per embedded file with a fenced code
//! block. Split exports repeat the title and tree in every part so each file
//! stands alone.

use serde::{Deserialize, Serialize};

use super::filter::{extension, ExclusionConfig};
use super::tree::{depth, parent_path, TreeEntry, TreeIndex};
use crate::error::{AppError, Result};

pub const STRUCTURE_HEADING: &str = "Project Structure";
const SINGLE_FILENAME: &str = "documentation.md";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MarkdownDocument {
    pub content: String,
    pub filename: String,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SplitOptions {
    pub enabled: bool,
    /// Maximum number of file sections per part.
    pub size: usize,
}

impl SplitOptions {
    pub fn validate(&self) -> Result<()> {
        if self.enabled && self.size == 0 {
            return Err(AppError::BadRequest(
                "splitOptions.size must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// One embedded file: its path and the text placed in the code block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSection {
    pub path: String,
    pub content: String,
}

/// Renders the visible entries as a box-drawing tree under `title`.
///
/// Every entry line is indented by one four-column unit per `/` in its path.
/// Order follows the input list; nothing is sorted.
pub fn render_tree(index: &TreeIndex<'_>, filter: &ExclusionConfig, title: &str) -> String {
    let mut out = String::new();
    out.push_str(title);
    out.push('\n');

    render_level(index, filter, index.roots().collect(), "", &mut out);

    // Orphans sharing a missing parent are drawn as one sibling group.
    let mut groups: Vec<(&str, Vec<&TreeEntry>)> = Vec::new();
    for orphan in index.orphans() {
        let parent = parent_path(&orphan.path).unwrap_or_default();
        match groups.iter().position(|(p, _)| *p == parent) {
            Some(i) => groups[i].1.push(orphan),
            None => groups.push((parent, vec![orphan])),
        }
    }
    for (parent, members) in groups {
        let prefix = "    ".repeat(depth(parent) + 1);
        render_level(index, filter, members, &prefix, &mut out);
    }

    out
}

fn render_level(
    index: &TreeIndex<'_>,
    filter: &ExclusionConfig,
    entries: Vec<&TreeEntry>,
    prefix: &str,
    out: &mut String,
) {
    let visible: Vec<&TreeEntry> = entries
        .into_iter()
        .filter(|e| filter.is_visible_in_tree(e))
        .collect();

    for (i, entry) in visible.iter().enumerate() {
        let last = i + 1 == visible.len();
        render_entry(index, filter, entry, prefix, last, out);
    }
}

fn render_entry(
    index: &TreeIndex<'_>,
    filter: &ExclusionConfig,
    entry: &TreeEntry,
    prefix: &str,
    last: bool,
    out: &mut String,
) {
    out.push_str(prefix);
    out.push_str(if last { "└── " } else { "├── " });
    out.push_str(entry.name());
    if entry.is_folder() {
        out.push('/');
        out.push('\n');
        let child_prefix = format!("{}{}", prefix, if last { "    " } else { "│   " });
        render_level(index, filter, index.children(&entry.path).collect(), &child_prefix, out);
    } else {
        out.push('\n');
    }
}

/// Backtick fence long enough that no run inside `content` can close it.
pub fn fence_for(content: &str) -> String {
    let mut longest = 0;
    let mut run = 0;
    for c in content.chars() {
        if c == '`' {
            run += 1;
            longest = longest.max(run);
        } else {
            run = 0;
        }
    }
    "`".repeat((longest + 1).max(3))
}

pub fn render_file_section(path: &str, content: &str) -> String {
    let fence = fence_for(content);
    let lang = extension(path).unwrap_or_default();

    let mut out = format!("## {}\n\n{}{}\n", path, fence, lang);
    out.push_str(content);
    if !content.is_empty() && !content.ends_with('\n') {
        out.push('\n');
    }
    out.push_str(&fence);
    out.push_str("\n\n");
    out
}

fn render_document(title: &str, tree: &str, files: &[FileSection]) -> String {
    let fence = fence_for(tree);
    let mut out = format!(
        "# {}\n\n## {}\n\n{}\n{}{}\n\n",
        title, STRUCTURE_HEADING, fence, tree, fence
    );
    for file in files {
        out.push_str(&render_file_section(&file.path, &file.content));
    }
    out
}

/// Builds the output documents for an export of `repo`.
///
/// With splitting enabled, `files` is cut into chunks of `split.size` and each
/// chunk becomes a self-contained part. An empty file list still yields one
/// part so the tree is never lost.
pub fn assemble(
    repo: &str,
    tree: &str,
    files: &[FileSection],
    split: Option<&SplitOptions>,
) -> Result<Vec<MarkdownDocument>> {
    let split = match split {
        Some(options) if options.enabled => {
            options.validate()?;
            options
        }
        _ => {
            let title = format!("Documentation: {}", repo);
            return Ok(vec![MarkdownDocument {
                content: render_document(&title, tree, files),
                filename: SINGLE_FILENAME.to_string(),
            }]);
        }
    };

    let chunks: Vec<&[FileSection]> = if files.is_empty() {
        vec![files]
    } else {
        files.chunks(split.size).collect()
    };
    let total_parts = chunks.len();
    tracing::debug!("Splitting {} files into {} parts", files.len(), total_parts);

    Ok(chunks
        .into_iter()
        .enumerate()
        .map(|(i, chunk)| {
            let part = i + 1;
            let title = format!("Documentation: {} (Part {}/{})", repo, part, total_parts);
            MarkdownDocument {
                content: render_document(&title, tree, chunk),
                filename: format!("documentation-part-{}-of-{}.md", part, total_parts),
            }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entries() -> Vec<TreeEntry> {
        vec![
            TreeEntry::folder("src"),
            TreeEntry::file("src/main.rs"),
            TreeEntry::folder("src/export"),
            TreeEntry::file("src/export/tree.rs"),
            TreeEntry::file("src/export/filter.rs"),
            TreeEntry::file("README.md"),
        ]
    }

    #[test]
    fn renders_box_drawing_tree_in_input_order() {
        let entries = entries();
        let index = TreeIndex::build(&entries);
        let tree = render_tree(&index, &ExclusionConfig::default(), "octo/repo");
        let expected = "\
octo/repo
├── src/
│   ├── main.rs
│   └── export/
│       ├── tree.rs
│       └── filter.rs
└── README.md
";
        assert_eq!(tree, expected);
    }

    #[test]
    fn indentation_depth_matches_separator_count() {
        let entries = vec![
            TreeEntry::folder("a"),
            TreeEntry::folder("a/b"),
            TreeEntry::file("a/b/c1"),
            TreeEntry::file("a/b/c2"),
            TreeEntry::file("a/d1"),
            TreeEntry::file("e1"),
            TreeEntry::file("ghost/f1"),
            TreeEntry::file("ghost/deep/g1"),
        ];
        let index = TreeIndex::build(&entries);
        let tree = render_tree(&index, &ExclusionConfig::default(), "title");

        for entry in &entries {
            let line = tree
                .lines()
                .skip(1)
                .find(|l| l.trim_end_matches('/').ends_with(&format!("── {}", entry.name())))
                .unwrap_or_else(|| panic!("missing line for {}", entry.path));
            let prefix_cols = line.chars().take_while(|c| *c != '├' && *c != '└').count();
            assert_eq!(prefix_cols / 4, entry.depth(), "line {:?}", line);
            assert_eq!(prefix_cols % 4, 0);
        }
    }

    #[test]
    fn orphans_are_grouped_under_their_missing_parent() {
        let entries = vec![
            TreeEntry::file("root.txt"),
            TreeEntry::file("ghost/deep/g1"),
            TreeEntry::file("ghost/f1"),
            TreeEntry::file("ghost/f2"),
            TreeEntry::file("ghost/deep/g2"),
        ];
        let index = TreeIndex::build(&entries);
        let tree = render_tree(&index, &ExclusionConfig::default(), "t");
        let expected = "\
t
└── root.txt
        ├── g1
        └── g2
    ├── f1
    └── f2
";
        assert_eq!(tree, expected);
    }

    #[test]
    fn hidden_folders_are_not_descended() {
        let entries = entries();
        let index = TreeIndex::build(&entries);
        let filter = ExclusionConfig {
            excluded_folders: vec!["src/export".into()],
            ..Default::default()
        };
        let tree = render_tree(&index, &filter, "t");
        assert!(!tree.contains("export"));
        assert!(!tree.contains("tree.rs"));
        assert!(tree.contains("│   └── main.rs"));
    }

    #[test]
    fn fence_grows_past_backticks_in_content() {
        assert_eq!(fence_for("plain"), "```");
        assert_eq!(fence_for("```rust\nfn x() {}\n```"), "````");
        assert_eq!(fence_for("`````"), "``````");
    }

    #[test]
    fn file_section_uses_extension_label() {
        let section = render_file_section("src/lib.RS", "pub fn x() {}");
        assert_eq!(section, "## src/lib.RS\n\n```rs\npub fn x() {}\n```\n\n");
        let section = render_file_section("Makefile", "all:\n");
        assert!(section.starts_with("## Makefile\n\n```\nall:\n```"));
    }

    #[test]
    fn single_document_when_split_disabled() {
        let files = vec![FileSection { path: "a.rs".into(), content: "x".into() }];
        let docs = assemble("o/r", "o/r\n", &files, Some(&SplitOptions { enabled: false, size: 0 }))
            .unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].filename, "documentation.md");
        assert!(docs[0].content.starts_with("# Documentation: o/r\n\n## Project Structure\n"));
    }

    #[test]
    fn split_produces_ceil_parts_with_repeated_tree() {
        let files: Vec<FileSection> = (0..7)
            .map(|i| FileSection { path: format!("f{}.txt", i), content: i.to_string() })
            .collect();
        let docs = assemble("o/r", "o/r\n└── f0.txt\n", &files, Some(&SplitOptions { enabled: true, size: 3 }))
            .unwrap();

        assert_eq!(docs.len(), 3);
        for (i, doc) in docs.iter().enumerate() {
            assert_eq!(doc.filename, format!("documentation-part-{}-of-3.md", i + 1));
            assert!(doc.content.contains(&format!("(Part {}/3)", i + 1)));
            assert!(doc.content.contains("## Project Structure"));
            let sections = doc.content.matches("\n## f").count();
            assert!(sections <= 3);
        }
        assert_eq!(docs[2].content.matches("\n## f").count(), 1);
    }

    #[test]
    fn split_with_no_files_yields_one_part() {
        let docs = assemble("o/r", "o/r\n", &[], Some(&SplitOptions { enabled: true, size: 5 })).unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].filename, "documentation-part-1-of-1.md");
    }

    #[test]
    fn zero_split_size_is_rejected() {
        let err = assemble("o/r", "", &[], Some(&SplitOptions { enabled: true, size: 0 })).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }
}
