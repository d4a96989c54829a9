//! Content cache owned by a generator and shared by reference with its workers.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// Memoized prompt fragments keyed by name.
#[derive(Debug, Default)]
pub struct ContentCache {
    entries: RwLock<HashMap<String, Arc<str>>>,
}

impl ContentCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<Arc<str>> {
        self.entries.read().get(key).cloned()
    }

    /// Return the cached value for `key`, rendering and storing it on a miss.
    pub fn get_or_insert_with<F>(&self, key: &str, render: F) -> Arc<str>
    where
        F: FnOnce() -> String,
    {
        if let Some(hit) = self.get(key) {
            return hit;
        }
        let rendered: Arc<str> = Arc::from(render());
        let mut entries = self.entries.write();
        entries
            .entry(key.to_string())
            .or_insert_with(|| rendered)
            .clone()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_once_per_key() {
        let cache = ContentCache::new();
        let mut renders = 0;
        let first = cache.get_or_insert_with("preset:F01", || {
            renders += 1;
            "rules".to_string()
        });
        let second = cache.get_or_insert_with("preset:F01", || {
            renders += 1;
            "other".to_string()
        });
        assert_eq!(renders, 1);
        assert_eq!(&*first, "rules");
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn separate_caches_are_isolated() {
        let a = ContentCache::new();
        let b = ContentCache::new();
        a.get_or_insert_with("k", || "v".to_string());
        assert!(b.get("k").is_none());
        assert!(!a.is_empty());
    }
}
