//! Repository → Markdown documentation export.
//!
//! - `tree`: flat entry list → roots/children index
//! - `filter`: exclusion rules (tree visibility vs content embedding)
//! - `fetch`: `ContentSource` trait and placeholder-on-failure fetching
//! - `progress`: progress snapshots for the UI
//! - `markdown`: ASCII tree, file sections, split documents
//! - `pipeline`: the export run itself
//! - `jobs`: background runs polled over HTTP

pub mod fetch;
pub mod filter;
pub mod jobs;
pub mod markdown;
pub mod pipeline;
pub mod progress;
pub mod tree;

pub use fetch::ContentSource;
pub use filter::{ExclusionConfig, FolderMatch};
pub use jobs::ExportJobs;
pub use markdown::SplitOptions;
pub use pipeline::{export_repository, ExportOptions, ExportOutput};
pub use tree::{EntryKind, TreeEntry};
