use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tracing::debug;

use crate::config::Config;
use crate::look::types::{CanonicalLook, LookSource};

#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub prompt_key: String,
    pub look: Arc<CanonicalLook>,
    pub created_at: DateTime<Utc>,
    stored_at: Instant,
}

/// Memoizes `prompt -> look`. Entries are replaced wholesale, never edited.
///
/// `ttl = None` keeps entries forever; `max_entries = 0` leaves the cache unbounded.
/// When full, the oldest entry is evicted.
#[derive(Debug)]
pub struct LookCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
    ttl: Option<Duration>,
    max_entries: usize,
}

pub fn prompt_key(prompt: &str) -> String {
    prompt
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

impl LookCache {
    pub fn new(ttl: Option<Duration>, max_entries: usize) -> Self {
        LookCache {
            entries: Mutex::new(HashMap::new()),
            ttl,
            max_entries,
        }
    }

    pub fn unbounded() -> Self {
        LookCache::new(None, 0)
    }

    pub fn from_config(config: &Config) -> Self {
        let ttl = if config.look_cache_ttl_seconds == 0 {
            None
        } else {
            Some(Duration::from_secs(config.look_cache_ttl_seconds))
        };
        LookCache::new(ttl, config.look_cache_max_entries)
    }

    pub fn get(&self, key: &str) -> Option<Arc<CanonicalLook>> {
        let mut entries = self.entries.lock();
        let entry = entries.get(key)?;
        if self.is_expired(entry) {
            debug!(target: "look.cache", key = key, "Cache entry expired");
            entries.remove(key);
            return None;
        }
        Some(entry.look.clone())
    }

    /// Stores a copy of `look` tagged as a cache hit. A live entry for the key is kept
    /// and returned instead, so concurrent interpretations of one prompt settle on the
    /// first instance stored.
    pub fn insert(&self, key: String, look: &CanonicalLook) -> Option<Arc<CanonicalLook>> {
        let mut entries = self.entries.lock();
        if let Some(existing) = entries.get(&key) {
            if !self.is_expired(existing) {
                return Some(existing.look.clone());
            }
            entries.remove(&key);
        }

        if self.max_entries > 0 {
            while entries.len() >= self.max_entries {
                let oldest = entries
                    .values()
                    .min_by_key(|entry| entry.stored_at)
                    .map(|entry| entry.prompt_key.clone());
                match oldest {
                    Some(oldest) => {
                        debug!(target: "look.cache", key = %oldest, "Evicting oldest cache entry");
                        entries.remove(&oldest);
                    }
                    None => break,
                }
            }
        }

        entries.insert(
            key.clone(),
            CacheEntry {
                prompt_key: key,
                look: Arc::new(look.with_source(LookSource::Cache)),
                created_at: Utc::now(),
                stored_at: Instant::now(),
            },
        );
        None
    }

    fn is_expired(&self, entry: &CacheEntry) -> bool {
        self.ttl.is_some_and(|ttl| entry.stored_at.elapsed() >= ttl)
    }

    pub fn entry(&self, key: &str) -> Option<CacheEntry> {
        self.entries.lock().get(key).cloned()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}

impl Default for LookCache {
    fn default() -> Self {
        LookCache::unbounded()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn look(style: &str) -> CanonicalLook {
        CanonicalLook {
            filters: Vec::new(),
            style: style.to_string(),
            description: String::new(),
            occasion: None,
            source: LookSource::Fallback,
        }
    }

    #[test]
    fn prompt_key_trims_lowercases_and_collapses_whitespace() {
        assert_eq!(prompt_key("  Wedding   MAKEUP \n"), "wedding makeup");
    }

    #[test]
    fn hits_return_the_same_cache_tagged_instance() {
        let cache = LookCache::unbounded();
        assert!(cache.insert("wedding makeup".to_string(), &look("Bridal")).is_none());

        let first = cache.get("wedding makeup").unwrap();
        let second = cache.get("wedding makeup").unwrap();
        assert_eq!(first.source, LookSource::Cache);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.entry("wedding makeup").unwrap().prompt_key, "wedding makeup");
    }

    #[test]
    fn bounded_cache_evicts_oldest_entry() {
        let cache = LookCache::new(None, 2);
        cache.insert("a".to_string(), &look("A"));
        std::thread::sleep(Duration::from_millis(2));
        cache.insert("b".to_string(), &look("B"));
        std::thread::sleep(Duration::from_millis(2));
        cache.insert("c".to_string(), &look("C"));

        assert_eq!(cache.len(), 2);
        assert!(cache.get("a").is_none());
        assert!(cache.get("b").is_some());
        assert!(cache.get("c").is_some());
    }

    #[test]
    fn second_insert_for_a_live_key_keeps_the_first_instance() {
        let cache = LookCache::new(None, 2);
        cache.insert("a".to_string(), &look("A"));
        cache.insert("b".to_string(), &look("B"));
        let kept = cache.insert("a".to_string(), &look("A2")).unwrap();

        assert_eq!(kept.style, "A");
        assert!(Arc::ptr_eq(&kept, &cache.get("a").unwrap()));
        assert_eq!(cache.len(), 2);
        assert!(cache.get("b").is_some());
    }

    #[test]
    fn expired_entry_is_replaced_on_insert() {
        let cache = LookCache::new(Some(Duration::from_millis(1)), 0);
        cache.insert("a".to_string(), &look("A"));
        std::thread::sleep(Duration::from_millis(5));
        assert!(cache.insert("a".to_string(), &look("A2")).is_none());
        assert_eq!(cache.entry("a").unwrap().look.style, "A2");
    }

    #[test]
    fn expired_entries_are_dropped() {
        let cache = LookCache::new(Some(Duration::from_millis(1)), 0);
        cache.insert("a".to_string(), &look("A"));
        std::thread::sleep(Duration::from_millis(5));
        assert!(cache.get("a").is_none());
        assert!(cache.is_empty());
    }
}
