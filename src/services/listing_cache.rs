//! Per-disk TTL cache for whole-disk folder listings and trees.
//!
//! Every invalidation bumps the disk's generation. Callers read the generation
//! before listing the store and hand it back when storing the result, so a view
//! computed before a concurrent mutation is dropped instead of cached.

use crate::models::{FolderListing, FolderTreeNode};
use parking_lot::Mutex;
use std::{
    collections::HashMap,
    time::{Duration, Instant},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum CacheKind {
    Listing,
    Tree,
}

#[derive(Debug, Clone)]
enum CachedView {
    Listing(FolderListing),
    Tree(Vec<FolderTreeNode>),
}

struct CacheEntry {
    view: CachedView,
    stored_at: Instant,
}

#[derive(Default)]
struct CacheState {
    entries: HashMap<(String, CacheKind), CacheEntry>,
    generations: HashMap<String, u64>,
}

pub struct ListingCache {
    enabled: bool,
    ttl: Duration,
    state: Mutex<CacheState>,
}

impl ListingCache {
    pub fn new(enabled: bool, ttl: Duration) -> Self {
        Self {
            enabled,
            ttl,
            state: Mutex::new(CacheState::default()),
        }
    }

    /// Invalidation counter for `disk`; pass it back to `store_*`.
    pub fn generation(&self, disk: &str) -> u64 {
        self.state
            .lock()
            .generations
            .get(disk)
            .copied()
            .unwrap_or_default()
    }

    pub fn listing(&self, disk: &str) -> Option<FolderListing> {
        match self.get(disk, CacheKind::Listing)? {
            CachedView::Listing(listing) => Some(listing),
            CachedView::Tree(_) => None,
        }
    }

    pub fn store_listing(&self, disk: &str, generation: u64, listing: FolderListing) {
        self.put(disk, generation, CacheKind::Listing, CachedView::Listing(listing));
    }

    pub fn tree(&self, disk: &str) -> Option<Vec<FolderTreeNode>> {
        match self.get(disk, CacheKind::Tree)? {
            CachedView::Tree(tree) => Some(tree),
            CachedView::Listing(_) => None,
        }
    }

    pub fn store_tree(&self, disk: &str, generation: u64, tree: Vec<FolderTreeNode>) {
        self.put(disk, generation, CacheKind::Tree, CachedView::Tree(tree));
    }

    /// Drop both the listing and the tree for `disk`.
    pub fn invalidate(&self, disk: &str) {
        let mut state = self.state.lock();
        *state.generations.entry(disk.to_string()).or_default() += 1;
        for kind in [CacheKind::Listing, CacheKind::Tree] {
            state.entries.remove(&(disk.to_string(), kind));
        }
    }

    fn get(&self, disk: &str, kind: CacheKind) -> Option<CachedView> {
        if !self.enabled {
            return None;
        }
        let key = (disk.to_string(), kind);
        let mut state = self.state.lock();
        match state.entries.get(&key) {
            Some(entry) if entry.stored_at.elapsed() < self.ttl => Some(entry.view.clone()),
            Some(_) => {
                state.entries.remove(&key);
                None
            }
            None => None,
        }
    }

    fn put(&self, disk: &str, generation: u64, kind: CacheKind, view: CachedView) {
        if !self.enabled {
            return;
        }
        let mut state = self.state.lock();
        let current = state.generations.get(disk).copied().unwrap_or_default();
        if current != generation {
            return;
        }
        state.entries.insert(
            (disk.to_string(), kind),
            CacheEntry {
                view,
                stored_at: Instant::now(),
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::VirtualFolder;

    fn listing() -> FolderListing {
        FolderListing {
            folders: vec![VirtualFolder {
                name: "a".into(),
                path: "a".into(),
                file_count: 1,
            }],
            files: Vec::new(),
        }
    }

    #[test]
    fn stores_per_disk_and_kind() {
        let cache = ListingCache::new(true, Duration::from_secs(300));
        cache.store_listing("d1", 0, listing());
        assert_eq!(cache.listing("d1"), Some(listing()));
        assert_eq!(cache.listing("d2"), None);
        assert_eq!(cache.tree("d1"), None);
    }

    #[test]
    fn invalidate_clears_listing_and_tree() {
        let cache = ListingCache::new(true, Duration::from_secs(300));
        cache.store_listing("d1", 0, listing());
        cache.store_tree("d1", 0, Vec::new());
        cache.store_listing("d2", 0, listing());

        cache.invalidate("d1");
        assert_eq!(cache.listing("d1"), None);
        assert_eq!(cache.tree("d1"), None);
        assert!(cache.listing("d2").is_some());
    }

    #[test]
    fn expired_entries_are_misses() {
        let cache = ListingCache::new(true, Duration::ZERO);
        cache.store_listing("d1", 0, listing());
        assert_eq!(cache.listing("d1"), None);
    }

    #[test]
    fn disabled_cache_never_hits() {
        let cache = ListingCache::new(false, Duration::from_secs(300));
        cache.store_tree("d1", 0, Vec::new());
        assert_eq!(cache.tree("d1"), None);
    }

    #[test]
    fn views_computed_before_an_invalidation_are_not_stored() {
        let cache = ListingCache::new(true, Duration::from_secs(300));
        let before = cache.generation("d1");
        cache.invalidate("d1");
        cache.store_listing("d1", before, listing());
        cache.store_tree("d1", before, Vec::new());
        assert_eq!(cache.listing("d1"), None);
        assert_eq!(cache.tree("d1"), None);

        let current = cache.generation("d1");
        assert_ne!(current, before);
        cache.store_listing("d1", current, listing());
        assert_eq!(cache.listing("d1"), Some(listing()));
        assert_eq!(cache.generation("d2"), 0);
    }
}
