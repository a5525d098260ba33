use docbot_archive::ClassDoc;
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::Arc;

/// Parsed documents keyed by canonical name.
///
/// Pure memoization: a missing entry means "not parsed yet" and is never cached as a miss.
/// With a capacity set, the least recently used documents are dropped first.
pub struct DocCache {
    entries: LruCache<String, Arc<ClassDoc>>,
}

impl DocCache {
    pub fn new(capacity: Option<NonZeroUsize>) -> Self {
        let entries = match capacity {
            Some(capacity) => LruCache::new(capacity),
            None => LruCache::unbounded(),
        };
        Self { entries }
    }

    pub fn get(&mut self, name: &str) -> Option<Arc<ClassDoc>> {
        self.entries.get(name).cloned()
    }

    pub fn put(&mut self, name: impl Into<String>, doc: Arc<ClassDoc>) {
        self.entries.put(name.into(), doc);
    }

    pub fn evict(&mut self, name: &str) -> bool {
        self.entries.pop(name).is_some()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for DocCache {
    fn default() -> Self {
        Self::new(None)
    }
}

#[cfg(test)]
mod tests {
    use super::DocCache;
    use docbot_archive::{ClassDoc, ClassName};
    use std::num::NonZeroUsize;
    use std::sync::Arc;

    fn doc(full: &str) -> Arc<ClassDoc> {
        Arc::new(ClassDoc::new(ClassName::from_full(full)))
    }

    #[test]
    fn put_get_evict() {
        let mut cache = DocCache::default();
        assert!(cache.get("a.Widget").is_none());

        cache.put("a.Widget", doc("a.Widget"));
        assert_eq!(
            cache.get("a.Widget").map(|doc| doc.name.full.clone()),
            Some("a.Widget".to_string())
        );

        assert!(cache.evict("a.Widget"));
        assert!(!cache.evict("a.Widget"));
        assert!(cache.is_empty());
    }

    #[test]
    fn bounded_cache_drops_least_recently_used() {
        let mut cache = DocCache::new(NonZeroUsize::new(2));
        cache.put("a.One", doc("a.One"));
        cache.put("a.Two", doc("a.Two"));
        assert!(cache.get("a.One").is_some());

        cache.put("a.Three", doc("a.Three"));
        assert_eq!(cache.len(), 2);
        assert!(cache.contains("a.One"));
        assert!(!cache.contains("a.Two"));
    }
}
