//! Exclusion rules for generated documentation.
//!
//! Two independent questions are answered per entry:
//! - is it drawn in the project tree (folders + file names only)?
//! - is its content embedded (additionally extension lists + binary types)?

use serde::{Deserialize, Serialize};

use super::tree::TreeEntry;

/// Extensions that are never embedded as text.
const BINARY_EXTENSIONS: &[&str] = &[
    // images
    "png", "jpg", "jpeg", "gif", "bmp", "ico", "webp", "tiff", "tif", "psd", "heic", "avif",
    // audio / video
    "mp3", "wav", "ogg", "flac", "aac", "m4a", "mp4", "mov", "avi", "mkv", "webm",
    // 3d formats
    "glb", "gltf", "obj", "fbx", "stl", "blend", "dae", "3ds",
    // archives
    "zip", "tar", "gz", "tgz", "bz2", "xz", "7z", "rar", "jar",
    // fonts, documents, binaries
    "ttf", "otf", "woff", "woff2", "eot", "pdf", "exe", "dll", "so", "dylib", "bin", "wasm",
];

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FolderMatch {
    /// `path.starts_with(folder)`: `build` also hides `buildtools/`.
    #[default]
    Prefix,
    /// Whole leading path segments must match.
    Segment,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExclusionConfig {
    pub excluded_folders: Vec<String>,
    /// Exact file names, not paths.
    pub excluded_files: Vec<String>,
    /// Lowercase extensions without the dot.
    pub excluded_file_types: Vec<String>,
    pub folder_match: FolderMatch,
}

impl ExclusionConfig {
    pub fn is_visible_in_tree(&self, entry: &TreeEntry) -> bool {
        let name = entry.name();
        if self.excluded_files.iter().any(|f| f == name) {
            return false;
        }
        !self
            .excluded_folders
            .iter()
            .any(|folder| self.folder_matches(&entry.path, folder))
    }

    pub fn is_content_embeddable(&self, entry: &TreeEntry) -> bool {
        if entry.is_folder() || !self.is_visible_in_tree(entry) {
            return false;
        }

        match extension(&entry.path) {
            Some(ext) => {
                let excluded_by_user = self
                    .excluded_file_types
                    .iter()
                    .any(|t| t.trim_start_matches('.').eq_ignore_ascii_case(&ext));
                !excluded_by_user && !BINARY_EXTENSIONS.contains(&ext.as_str())
            }
            None => true,
        }
    }

    fn folder_matches(&self, path: &str, folder: &str) -> bool {
        match self.folder_match {
            FolderMatch::Prefix => !folder.is_empty() && path.starts_with(folder),
            FolderMatch::Segment => {
                let folder = folder.trim_matches('/');
                if folder.is_empty() {
                    return false;
                }
                let mut path_segments = path.split('/');
                folder
                    .split('/')
                    .all(|segment| path_segments.next() == Some(segment))
            }
        }
    }
}

/// Lowercase extension of the last path segment, if any.
pub fn extension(path: &str) -> Option<String> {
    let name = super::tree::file_name(path);
    match name.rfind('.') {
        Some(0) | None => None,
        Some(idx) => Some(name[idx + 1..].to_ascii_lowercase()),
    }
}
