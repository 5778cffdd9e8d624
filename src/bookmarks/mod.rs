//! Bookmark / link manager.
//!
//! - `store`: `BookmarkStore` trait with memory and JSON-file backends
//! - `service`: validation, search, import, reordering over any store

pub mod service;
pub mod store;

pub use service::BookmarkQuery;
pub use store::{BookmarkStore, JsonFileStore, MemoryStore};

use std::sync::Arc;

pub type SharedStore = Arc<dyn BookmarkStore>;
