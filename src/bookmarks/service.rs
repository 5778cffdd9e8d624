use chrono::Utc;
use reqwest::Url;
use serde::Deserialize;
use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};

use super::store::BookmarkStore;
use crate::error::{AppError, Result};
use crate::models::{Bookmark, BookmarkUpdate, ImportSummary, NewBookmark, Page, TagCount};

const DEFAULT_PER_PAGE: u32 = 20;
const MAX_PER_PAGE: u32 = 100;

static ID_SEQUENCE: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct BookmarkQuery {
    pub q: Option<String>,
    pub tag: Option<String>,
    pub category: Option<String>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

fn new_id() -> String {
    let seq = ID_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    format!("bm-{:x}-{:x}", Utc::now().timestamp_millis(), seq)
}

fn validate_title(title: &str) -> Result<String> {
    let title = title.trim();
    if title.is_empty() {
        return Err(AppError::BadRequest("title is required".to_string()));
    }
    Ok(title.to_string())
}

fn validate_url(url: &str) -> Result<String> {
    let parsed = Url::parse(url.trim())
        .map_err(|e| AppError::BadRequest(format!("invalid url {:?}: {}", url, e)))?;
    match parsed.scheme() {
        "http" | "https" => Ok(parsed.to_string()),
        other => Err(AppError::BadRequest(format!("unsupported url scheme: {}", other))),
    }
}

fn normalize_tags(tags: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    tags.iter()
        .map(|t| t.trim().to_lowercase())
        .filter(|t| !t.is_empty() && seen.insert(t.clone()))
        .collect()
}

fn normalize_category(category: Option<&str>) -> Option<String> {
    category.map(str::trim).filter(|c| !c.is_empty()).map(str::to_string)
}

fn next_position(store: &dyn BookmarkStore) -> Result<u32> {
    Ok(store
        .list()?
        .iter()
        .map(|b| b.position + 1)
        .max()
        .unwrap_or(0))
}

fn build(new: NewBookmark, position: u32) -> Result<Bookmark> {
    let now = Utc::now();
    Ok(Bookmark {
        id: new_id(),
        title: validate_title(&new.title)?,
        url: validate_url(&new.url)?,
        description: new.description.unwrap_or_default().trim().to_string(),
        tags: normalize_tags(&new.tags),
        category: normalize_category(new.category.as_deref()),
        position,
        created_at: now,
        updated_at: now,
    })
}

pub fn create(store: &dyn BookmarkStore, new: NewBookmark) -> Result<Bookmark> {
    let bookmark = build(new, next_position(store)?)?;
    store.put(bookmark.clone())?;
    tracing::info!("Created bookmark {} ({})", bookmark.id, bookmark.url);
    Ok(bookmark)
}

pub fn get(store: &dyn BookmarkStore, id: &str) -> Result<Bookmark> {
    store
        .get(id)?
        .ok_or_else(|| AppError::NotFound(format!("bookmark {}", id)))
}

pub fn update(store: &dyn BookmarkStore, id: &str, changes: BookmarkUpdate) -> Result<Bookmark> {
    let mut bookmark = get(store, id)?;

    if let Some(title) = changes.title {
        bookmark.title = validate_title(&title)?;
    }
    if let Some(url) = changes.url {
        bookmark.url = validate_url(&url)?;
    }
    if let Some(description) = changes.description {
        bookmark.description = description.trim().to_string();
    }
    if let Some(tags) = changes.tags {
        bookmark.tags = normalize_tags(&tags);
    }
    if let Some(category) = changes.category {
        bookmark.category = normalize_category(Some(&category));
    }
    bookmark.updated_at = Utc::now();

    store.put(bookmark.clone())?;
    Ok(bookmark)
}

pub fn remove(store: &dyn BookmarkStore, id: &str) -> Result<()> {
    if !store.delete(id)? {
        return Err(AppError::NotFound(format!("bookmark {}", id)));
    }
    tracing::info!("Deleted bookmark {}", id);
    Ok(())
}

fn matches_query(bookmark: &Bookmark, query: &BookmarkQuery) -> bool {
    if let Some(tag) = query.tag.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
        let tag = tag.to_lowercase();
        if !bookmark.tags.iter().any(|t| *t == tag) {
            return false;
        }
    }
    if let Some(category) = query.category.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
        if !bookmark
            .category
            .as_deref()
            .is_some_and(|c| c.eq_ignore_ascii_case(category))
        {
            return false;
        }
    }
    match query.q.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
        Some(q) => {
            let needle = q.to_lowercase();
            [&bookmark.title, &bookmark.url, &bookmark.description]
                .iter()
                .any(|field| field.to_lowercase().contains(&needle))
        }
        None => true,
    }
}

fn sorted(mut items: Vec<Bookmark>) -> Vec<Bookmark> {
    items.sort_by(|a, b| {
        a.position
            .cmp(&b.position)
            .then_with(|| a.created_at.cmp(&b.created_at))
    });
    items
}

pub fn search(store: &dyn BookmarkStore, query: &BookmarkQuery) -> Result<Page<Bookmark>> {
    let page = query.page.unwrap_or(1).max(1);
    let per_page = query.per_page.unwrap_or(DEFAULT_PER_PAGE).clamp(1, MAX_PER_PAGE);

    let filtered: Vec<Bookmark> = sorted(store.list()?)
        .into_iter()
        .filter(|b| matches_query(b, query))
        .collect();

    let offset = (page as usize - 1).saturating_mul(per_page as usize);
    let has_more = filtered.len() > offset + per_page as usize;
    let items = filtered
        .into_iter()
        .skip(offset)
        .take(per_page as usize)
        .collect();

    Ok(Page { items, page, per_page, has_more })
}

/// Bulk insert; invalid entries and URLs already stored are skipped.
pub fn import_many(store: &dyn BookmarkStore, incoming: Vec<NewBookmark>) -> Result<ImportSummary> {
    let mut known: HashSet<String> = store.list()?.into_iter().map(|b| b.url).collect();
    let mut position = next_position(store)?;
    let mut summary = ImportSummary { imported: 0, skipped: 0 };

    for new in incoming {
        let bookmark = match build(new, position) {
            Ok(b) => b,
            Err(e) => {
                tracing::warn!("Skipping bookmark during import: {}", e);
                summary.skipped += 1;
                continue;
            }
        };
        if !known.insert(bookmark.url.clone()) {
            summary.skipped += 1;
            continue;
        }
        store.put(bookmark)?;
        position += 1;
        summary.imported += 1;
    }

    tracing::info!("Imported {} bookmarks ({} skipped)", summary.imported, summary.skipped);
    Ok(summary)
}

/// Puts `ids` first, in the given order; unlisted bookmarks follow in their
/// previous order.
pub fn reorder(store: &dyn BookmarkStore, ids: &[String]) -> Result<()> {
    let current = sorted(store.list()?);
    let known: HashSet<&str> = current.iter().map(|b| b.id.as_str()).collect();
    if let Some(missing) = ids.iter().find(|id| !known.contains(id.as_str())) {
        return Err(AppError::NotFound(format!("bookmark {}", missing)));
    }

    let listed: HashSet<&str> = ids.iter().map(String::as_str).collect();
    let mut by_id: BTreeMap<&str, &Bookmark> = current.iter().map(|b| (b.id.as_str(), b)).collect();
    let order: Vec<&Bookmark> = ids
        .iter()
        .filter_map(|id| by_id.remove(id.as_str()))
        .chain(current.iter().filter(|b| !listed.contains(b.id.as_str())))
        .collect();

    let moved: Vec<Bookmark> = order
        .into_iter()
        .enumerate()
        .filter(|(position, bookmark)| bookmark.position != *position as u32)
        .map(|(position, bookmark)| Bookmark { position: position as u32, ..bookmark.clone() })
        .collect();
    if !moved.is_empty() {
        store.put_many(moved)?;
    }
    Ok(())
}

pub fn tag_counts(store: &dyn BookmarkStore) -> Result<Vec<TagCount>> {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for bookmark in store.list()? {
        for tag in bookmark.tags {
            *counts.entry(tag).or_default() += 1;
        }
    }

    let mut tags: Vec<TagCount> = counts
        .into_iter()
        .map(|(tag, count)| TagCount { tag, count })
        .collect();
    tags.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.tag.cmp(&b.tag)));
    Ok(tags)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bookmarks::store::MemoryStore;
    use std::sync::atomic::AtomicUsize;

    fn new(title: &str, url: &str, tags: &[&str]) -> NewBookmark {
        NewBookmark {
            title: title.to_string(),
            url: url.to_string(),
            description: None,
            tags: tags.iter().map(|t| t.to_string()).collect(),
            category: None,
        }
    }

    #[test]
    fn create_validates_and_normalizes() {
        let store = MemoryStore::new();
        let b = create(&store, new("  Rust  ", "https://rust-lang.org", &["Lang", "lang", " "])).unwrap();
        assert_eq!(b.title, "Rust");
        assert_eq!(b.url, "https://rust-lang.org/");
        assert_eq!(b.tags, vec!["lang"]);

        assert!(matches!(create(&store, new("", "https://x.dev", &[])), Err(AppError::BadRequest(_))));
        assert!(matches!(create(&store, new("x", "ftp://x.dev", &[])), Err(AppError::BadRequest(_))));
        assert!(matches!(create(&store, new("x", "not a url", &[])), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn search_filters_and_paginates() {
        let store = MemoryStore::new();
        for i in 0..5 {
            create(&store, new(&format!("Post {}", i), &format!("https://blog.dev/{}", i), &["blog"])).unwrap();
        }
        create(&store, new("Tokio docs", "https://tokio.rs", &["rust"])).unwrap();

        let page = search(&store, &BookmarkQuery { tag: Some("BLOG".into()), per_page: Some(2), ..Default::default() }).unwrap();
        assert_eq!(page.items.len(), 2);
        assert!(page.has_more);
        assert_eq!(page.items[0].title, "Post 0");

        let last = search(&store, &BookmarkQuery { tag: Some("blog".into()), page: Some(3), per_page: Some(2), ..Default::default() }).unwrap();
        assert_eq!(last.items.len(), 1);
        assert!(!last.has_more);

        let found = search(&store, &BookmarkQuery { q: Some("TOKIO".into()), ..Default::default() }).unwrap();
        assert_eq!(found.items.len(), 1);
    }

    #[test]
    fn update_and_remove() {
        let store = MemoryStore::new();
        let b = create(&store, new("Old", "https://a.dev", &[])).unwrap();
        let updated = update(
            &store,
            &b.id,
            BookmarkUpdate { title: Some("New".into()), category: Some("Reading".into()), ..Default::default() },
        )
        .unwrap();
        assert_eq!(updated.title, "New");
        assert_eq!(updated.category.as_deref(), Some("Reading"));

        let cleared = update(&store, &b.id, BookmarkUpdate { category: Some(String::new()), ..Default::default() }).unwrap();
        assert!(cleared.category.is_none());

        remove(&store, &b.id).unwrap();
        assert!(matches!(remove(&store, &b.id), Err(AppError::NotFound(_))));
        assert!(matches!(update(&store, &b.id, BookmarkUpdate::default()), Err(AppError::NotFound(_))));
    }

    #[test]
    fn import_skips_duplicates_and_invalid() {
        let store = MemoryStore::new();
        create(&store, new("Existing", "https://a.dev", &[])).unwrap();
        let summary = import_many(
            &store,
            vec![
                new("A again", "https://a.dev", &[]),
                new("B", "https://b.dev", &[]),
                new("B twice", "https://b.dev/", &[]),
                new("", "https://c.dev", &[]),
            ],
        )
        .unwrap();
        assert_eq!(summary.imported, 1);
        assert_eq!(summary.skipped, 3);
        assert_eq!(store.list().unwrap().len(), 2);
    }

    #[test]
    fn reorder_moves_listed_first() {
        let store = MemoryStore::new();
        let a = create(&store, new("A", "https://a.dev", &[])).unwrap();
        create(&store, new("B", "https://b.dev", &[])).unwrap();
        let c = create(&store, new("C", "https://c.dev", &[])).unwrap();

        reorder(&store, &[c.id.clone(), a.id.clone()]).unwrap();
        let titles: Vec<String> = search(&store, &BookmarkQuery::default())
            .unwrap()
            .items
            .into_iter()
            .map(|b| b.title)
            .collect();
        assert_eq!(titles, vec!["C", "A", "B"]);

        assert!(matches!(reorder(&store, &["nope".to_string()]), Err(AppError::NotFound(_))));
    }

    /// Counts write calls on top of a memory store.
    #[derive(Default)]
    struct CountingStore {
        inner: MemoryStore,
        puts: AtomicUsize,
        batches: AtomicUsize,
    }

    impl BookmarkStore for CountingStore {
        fn get(&self, id: &str) -> Result<Option<Bookmark>> {
            self.inner.get(id)
        }

        fn put(&self, bookmark: Bookmark) -> Result<()> {
            self.puts.fetch_add(1, Ordering::SeqCst);
            self.inner.put(bookmark)
        }

        fn put_many(&self, bookmarks: Vec<Bookmark>) -> Result<()> {
            self.batches.fetch_add(1, Ordering::SeqCst);
            self.inner.put_many(bookmarks)
        }

        fn delete(&self, id: &str) -> Result<bool> {
            self.inner.delete(id)
        }

        fn list(&self) -> Result<Vec<Bookmark>> {
            self.inner.list()
        }
    }

    #[test]
    fn reorder_writes_one_batch() {
        let store = CountingStore::default();
        let a = create(&store, new("A", "https://a.dev", &[])).unwrap();
        let b = create(&store, new("B", "https://b.dev", &[])).unwrap();
        let c = create(&store, new("C", "https://c.dev", &[])).unwrap();
        let puts_before = store.puts.load(Ordering::SeqCst);

        reorder(&store, &[c.id.clone(), b.id.clone(), a.id.clone()]).unwrap();
        assert_eq!(store.batches.load(Ordering::SeqCst), 1);
        assert_eq!(store.puts.load(Ordering::SeqCst), puts_before);

        // Already in that order: nothing to write.
        reorder(&store, &[c.id, b.id, a.id]).unwrap();
        assert_eq!(store.batches.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn tag_counts_sorted_by_frequency() {
        let store = MemoryStore::new();
        create(&store, new("1", "https://1.dev", &["rust", "web"])).unwrap();
        create(&store, new("2", "https://2.dev", &["rust"])).unwrap();
        let tags = tag_counts(&store).unwrap();
        assert_eq!(tags[0], TagCount { tag: "rust".into(), count: 2 });
        assert_eq!(tags[1], TagCount { tag: "web".into(), count: 1 });
    }
}
