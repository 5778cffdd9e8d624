//! Flat repository listing → parent/child relationships.
//!
//! GitHub's recursive tree endpoint returns every entry as a flat
//! `{ path, type }` list. `TreeIndex` keeps the entries in their original
//! order (an arena) and builds a parent-path → children index once, so the
//! renderer never rescans the list per folder.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Tree,
    Blob,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TreeEntry {
    pub path: String,
    #[serde(rename = "type")]
    pub kind: EntryKind,
}

impl TreeEntry {
    #[cfg(test)]
    pub fn folder(path: impl Into<String>) -> Self {
        Self { path: path.into(), kind: EntryKind::Tree }
    }

    #[cfg(test)]
    pub fn file(path: impl Into<String>) -> Self {
        Self { path: path.into(), kind: EntryKind::Blob }
    }

    pub fn is_folder(&self) -> bool {
        self.kind == EntryKind::Tree
    }

    /// Last path segment.
    pub fn name(&self) -> &str {
        file_name(&self.path)
    }

    pub fn depth(&self) -> usize {
        depth(&self.path)
    }
}

pub fn file_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Number of `/` separators in a path.
pub fn depth(path: &str) -> usize {
    path.matches('/').count()
}

pub fn parent_path(path: &str) -> Option<&str> {
    path.rfind('/').map(|idx| &path[..idx])
}

/// Arena of entries plus a parent → children index computed once per run.
pub struct TreeIndex<'a> {
    entries: &'a [TreeEntry],
    roots: Vec<usize>,
    children: HashMap<&'a str, Vec<usize>>,
    orphans: Vec<usize>,
}

impl<'a> TreeIndex<'a> {
    pub fn build(entries: &'a [TreeEntry]) -> Self {
        let folders: HashSet<&str> = entries
            .iter()
            .filter(|e| e.is_folder())
            .map(|e| e.path.as_str())
            .collect();

        let mut roots = Vec::new();
        let mut children: HashMap<&'a str, Vec<usize>> = HashMap::new();
        let mut orphans = Vec::new();

        for (idx, entry) in entries.iter().enumerate() {
            match parent_path(&entry.path) {
                None => roots.push(idx),
                Some(parent) => {
                    if !folders.contains(parent) {
                        orphans.push(idx);
                    }
                    children.entry(parent).or_default().push(idx);
                }
            }
        }

        Self { entries, roots, children, orphans }
    }

    /// Entries whose path has no separator, in input order.
    pub fn roots(&self) -> impl Iterator<Item = &'a TreeEntry> + '_ {
        self.roots.iter().map(|&idx| &self.entries[idx])
    }

    /// Direct children of a folder, in input order.
    pub fn children<'s>(&'s self, folder: &str) -> impl Iterator<Item = &'a TreeEntry> + use<'a, 's> {
        self.children
            .get(folder)
            .into_iter()
            .flatten()
            .map(|&idx| &self.entries[idx])
    }

    /// Entries whose parent folder is not itself listed.
    pub fn orphans(&self) -> impl Iterator<Item = &'a TreeEntry> + '_ {
        self.orphans.iter().map(|&idx| &self.entries[idx])
    }

    pub fn files(&self) -> impl Iterator<Item = &'a TreeEntry> + '_ {
        self.entries.iter().filter(|e| !e.is_folder())
    }
}
