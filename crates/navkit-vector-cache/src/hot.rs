use dashmap::DashMap;

use crate::model::EmbeddingEntry;

/// In-memory tier holding the hottest entries, bounded to `capacity`.
/// Eviction picks the lowest `access_count` entry, a simplified LRU.
pub struct HotTier {
    entries: DashMap<String, EmbeddingEntry>,
    capacity: usize,
}

impl HotTier {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: DashMap::with_capacity(capacity),
            capacity,
        }
    }

    pub fn get(&self, fingerprint: &str) -> Option<EmbeddingEntry> {
        let mut entry = self.entries.get_mut(fingerprint)?;
        entry.touch();
        Some(entry.clone())
    }

    pub fn put(&self, entry: EmbeddingEntry) {
        if self.entries.len() >= self.capacity && !self.entries.contains_key(&entry.fingerprint) {
            self.evict_one();
        }
        self.entries.insert(entry.fingerprint.clone(), entry);
    }

    pub fn remove(&self, fingerprint: &str) {
        self.entries.remove(fingerprint);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn evict_one(&self) {
        let victim = self
            .entries
            .iter()
            .min_by_key(|e| e.access_count)
            .map(|e| e.key().clone());
        if let Some(key) = victim {
            self.entries.remove(&key);
        }
    }
}
