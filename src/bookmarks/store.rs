//! Keyed bookmark storage.
//!
//! `BookmarkStore` is the only thing the service and routes see, so the
//! backend can be swapped without touching them.
//! - `MemoryStore`: process-local map, used in tests and `--bookmarks :memory:`
//! - `JsonFileStore`: map mirrored to a JSON file, rewritten on every change

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::RwLock;

use crate::error::{AppError, Result};
use crate::models::Bookmark;

pub trait BookmarkStore: Send + Sync {
    fn get(&self, id: &str) -> Result<Option<Bookmark>>;
    fn put(&self, bookmark: Bookmark) -> Result<()>;
    /// Stores every bookmark or none of them.
    fn put_many(&self, bookmarks: Vec<Bookmark>) -> Result<()>;
    /// Returns whether a bookmark was removed.
    fn delete(&self, id: &str) -> Result<bool>;
    fn list(&self) -> Result<Vec<Bookmark>>;
}

fn poisoned() -> AppError {
    AppError::Internal("Lock poisoned".to_string())
}

#[derive(Default)]
pub struct MemoryStore {
    items: RwLock<BTreeMap<String, Bookmark>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl BookmarkStore for MemoryStore {
    fn get(&self, id: &str) -> Result<Option<Bookmark>> {
        Ok(self.items.read().map_err(|_| poisoned())?.get(id).cloned())
    }

    fn put(&self, bookmark: Bookmark) -> Result<()> {
        self.items
            .write()
            .map_err(|_| poisoned())?
            .insert(bookmark.id.clone(), bookmark);
        Ok(())
    }

    fn put_many(&self, bookmarks: Vec<Bookmark>) -> Result<()> {
        let mut items = self.items.write().map_err(|_| poisoned())?;
        for bookmark in bookmarks {
            items.insert(bookmark.id.clone(), bookmark);
        }
        Ok(())
    }

    fn delete(&self, id: &str) -> Result<bool> {
        Ok(self.items.write().map_err(|_| poisoned())?.remove(id).is_some())
    }

    fn list(&self) -> Result<Vec<Bookmark>> {
        Ok(self.items.read().map_err(|_| poisoned())?.values().cloned().collect())
    }
}

pub struct JsonFileStore {
    path: PathBuf,
    items: RwLock<BTreeMap<String, Bookmark>>,
}

impl JsonFileStore {
    /// Loads `path` if it exists; a missing file starts an empty store.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let items: BTreeMap<String, Bookmark> = if path.exists() {
            let raw = std::fs::read_to_string(&path)?;
            let list: Vec<Bookmark> = if raw.trim().is_empty() {
                Vec::new()
            } else {
                serde_json::from_str(&raw).map_err(|e| {
                    AppError::Storage(format!("failed to parse {}: {}", path.display(), e))
                })?
            };
            list.into_iter().map(|b| (b.id.clone(), b)).collect()
        } else {
            BTreeMap::new()
        };

        tracing::info!("Loaded {} bookmarks from {}", items.len(), path.display());
        Ok(Self { path, items: RwLock::new(items) })
    }

    fn persist(&self, items: &BTreeMap<String, Bookmark>) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let list: Vec<&Bookmark> = items.values().collect();
        let json = serde_json::to_string_pretty(&list)?;

        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, &self.path)?;
        tracing::debug!("Saved {} bookmarks to {}", list.len(), self.path.display());
        Ok(())
    }
}

impl BookmarkStore for JsonFileStore {
    fn get(&self, id: &str) -> Result<Option<Bookmark>> {
        Ok(self.items.read().map_err(|_| poisoned())?.get(id).cloned())
    }

    fn put(&self, bookmark: Bookmark) -> Result<()> {
        let mut items = self.items.write().map_err(|_| poisoned())?;
        items.insert(bookmark.id.clone(), bookmark);
        self.persist(&items)
    }

    /// One file rewrite for the whole batch; memory is only updated once the
    /// file is written.
    fn put_many(&self, bookmarks: Vec<Bookmark>) -> Result<()> {
        let mut items = self.items.write().map_err(|_| poisoned())?;
        let mut next = items.clone();
        for bookmark in bookmarks {
            next.insert(bookmark.id.clone(), bookmark);
        }
        self.persist(&next)?;
        *items = next;
        Ok(())
    }

    fn delete(&self, id: &str) -> Result<bool> {
        let mut items = self.items.write().map_err(|_| poisoned())?;
        let removed = items.remove(id).is_some();
        if removed {
            self.persist(&items)?;
        }
        Ok(removed)
    }

    fn list(&self) -> Result<Vec<Bookmark>> {
        Ok(self.items.read().map_err(|_| poisoned())?.values().cloned().collect())
    }
}
