use std::path::PathBuf;

use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::Mutex;
use tracing::debug;

use crate::errors::PromotionError;
use crate::fs as persist;
use crate::model::{confidence_for, PromotionEntry, PromotionKey};

/// Bound on the warm in-memory cache of high-confidence entries kept for
/// fast `lookup`, per the resource budget in the data model.
pub const WARM_CACHE_CAPACITY: usize = 1000;

/// Confidence above which an entry is eligible for the warm cache.
pub const WARM_CACHE_THRESHOLD: f64 = 0.7;

/// `(page_signature, frame_hash, label_key) -> selector` cache with
/// success/failure counters driving confidence. All mutations are
/// serialized behind one writer; readers see last-committed values.
#[async_trait]
pub trait PromotionStore: Send + Sync {
    async fn record_success(
        &self,
        page_signature: &str,
        frame_hash: &str,
        label_key: &str,
        selector: &str,
        metadata: serde_json::Value,
    ) -> Result<(), PromotionError>;

    async fn record_failure(
        &self,
        page_signature: &str,
        frame_hash: &str,
        label_key: &str,
        selector: &str,
    ) -> Result<(), PromotionError>;

    async fn lookup(
        &self,
        page_signature: &str,
        frame_hash: &str,
        label_key: &str,
    ) -> Result<Option<String>, PromotionError>;

    async fn score(
        &self,
        page_signature: &str,
        frame_hash: &str,
        label_key: &str,
    ) -> Result<f64, PromotionError>;
}

/// A `(page_signature, frame_hash, label_key)` group: every selector ever
/// recorded for that label, so a later winner can displace an earlier one
/// without losing the history.
struct Group {
    by_selector: DashMap<String, PromotionEntry>,
}

impl Group {
    fn new() -> Self {
        Self {
            by_selector: DashMap::new(),
        }
    }

    fn winner(&self) -> Option<PromotionEntry> {
        self.by_selector
            .iter()
            .max_by(|a, b| {
                a.confidence
                    .partial_cmp(&b.confidence)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then(a.success.cmp(&b.success))
            })
            .map(|e| e.value().clone())
    }
}

pub struct DefaultPromotionStore {
    root: PathBuf,
    scope_prefix: Option<String>,
    groups: DashMap<String, Group>,
    warm: DashMap<String, PromotionEntry>,
    write_lock: Mutex<()>,
}

impl DefaultPromotionStore {
    pub fn new(root: PathBuf) -> Self {
        Self::scoped(root, None)
    }

    /// `scope_prefix` selects per-user or per-host deployment (open
    /// question): the data model supports either by namespacing the
    /// content-addressed key.
    pub fn scoped(root: PathBuf, scope_prefix: Option<String>) -> Self {
        let store = Self {
            root,
            scope_prefix,
            groups: DashMap::new(),
            warm: DashMap::new(),
            write_lock: Mutex::new(()),
        };
        store.hydrate_from_disk();
        store
    }

    fn hydrate_from_disk(&self) {
        for entry in persist::list_all(&self.root) {
            self.insert_in_memory(entry);
        }
    }

    fn group_id(&self, key: &PromotionKey) -> String {
        key.content_id(self.scope_prefix.as_deref())
    }

    fn insert_in_memory(&self, entry: PromotionEntry) {
        let group_id = self.group_id(&entry.key);
        self.groups
            .entry(group_id.clone())
            .or_insert_with(Group::new)
            .by_selector
            .insert(entry.selector.clone(), entry.clone());
        self.refresh_warm(&group_id);
    }

    fn refresh_warm(&self, group_id: &str) {
        let Some(group) = self.groups.get(group_id) else {
            self.warm.remove(group_id);
            return;
        };
        match group.winner() {
            Some(winner) if winner.confidence > WARM_CACHE_THRESHOLD => {
                if self.warm.len() >= WARM_CACHE_CAPACITY && !self.warm.contains_key(group_id) {
                    // Evict an arbitrary entry rather than track recency for
                    // a cache whose entries are already all high-confidence.
                    if let Some(evict) = self.warm.iter().next().map(|e| e.key().clone()) {
                        self.warm.remove(&evict);
                    }
                }
                self.warm.insert(group_id.to_string(), winner);
            }
            _ => {
                self.warm.remove(group_id);
            }
        }
    }

    fn content_row_id(&self, key: &PromotionKey, selector: &str) -> String {
        format!("{}_{}", self.group_id(key), blake3::hash(selector.as_bytes()).to_hex())
    }

    fn persist(&self, key: &PromotionKey, entry: &PromotionEntry) -> Result<(), PromotionError> {
        let row_id = self.content_row_id(key, &entry.selector);
        persist::write_entry(&self.root, &row_id, entry)
            .map_err(|err| PromotionError::Io(err.to_string()))
    }

    fn mutate(
        &self,
        page_signature: &str,
        frame_hash: &str,
        label_key: &str,
        selector: &str,
        success: bool,
        metadata: Option<serde_json::Value>,
    ) -> Result<(), PromotionError> {
        let _guard = self.write_lock.lock();
        let key = PromotionKey::new(page_signature, frame_hash, label_key);
        let group_id = self.group_id(&key);
        let group = self.groups.entry(group_id.clone()).or_insert_with(Group::new);
        let mut entry = group
            .by_selector
            .get(selector)
            .map(|e| e.clone())
            .unwrap_or_else(|| {
                PromotionEntry::new(key.clone(), selector.to_string(), metadata.clone().unwrap_or(serde_json::Value::Null))
            });

        let now = chrono::Utc::now();
        if success {
            entry.success += 1;
            entry.last_success = Some(now);
        } else {
            entry.failure += 1;
            entry.last_failure = Some(now);
        }
        if let Some(meta) = metadata {
            entry.metadata = meta;
        }
        entry.updated = now;
        entry.recompute_confidence();

        group.by_selector.insert(selector.to_string(), entry.clone());
        drop(group);
        self.persist(&key, &entry)?;
        self.refresh_warm(&group_id);
        debug!(
            page_signature,
            frame_hash,
            label_key,
            selector,
            confidence = entry.confidence,
            "promotion store updated"
        );
        Ok(())
    }

    /// Evicts entries older than `max_age` whose confidence is below 0.5.
    pub fn run_maintenance(&self, max_age: chrono::Duration) {
        let _guard = self.write_lock.lock();
        let cutoff = chrono::Utc::now() - max_age;
        let mut stale_groups = Vec::new();
        for group in self.groups.iter() {
            let group_id = group.key().clone();
            let stale_selectors: Vec<String> = group
                .value()
                .by_selector
                .iter()
                .filter(|e| e.confidence < 0.5 && e.updated < cutoff)
                .map(|e| e.key().clone())
                .collect();
            for selector in &stale_selectors {
                if let Some((_, entry)) = group.value().by_selector.remove(selector) {
                    let row_id = self.content_row_id(&entry.key, &entry.selector);
                    persist::remove_entry(&self.root, &row_id);
                }
            }
            if group.value().by_selector.is_empty() {
                stale_groups.push(group_id);
            }
        }
        for group_id in stale_groups {
            self.groups.remove(&group_id);
            self.warm.remove(&group_id);
        }
    }
}

#[async_trait]
impl PromotionStore for DefaultPromotionStore {
    async fn record_success(
        &self,
        page_signature: &str,
        frame_hash: &str,
        label_key: &str,
        selector: &str,
        metadata: serde_json::Value,
    ) -> Result<(), PromotionError> {
        self.mutate(page_signature, frame_hash, label_key, selector, true, Some(metadata))
    }

    async fn record_failure(
        &self,
        page_signature: &str,
        frame_hash: &str,
        label_key: &str,
        selector: &str,
    ) -> Result<(), PromotionError> {
        self.mutate(page_signature, frame_hash, label_key, selector, false, None)
    }

    async fn lookup(
        &self,
        page_signature: &str,
        frame_hash: &str,
        label_key: &str,
    ) -> Result<Option<String>, PromotionError> {
        let key = PromotionKey::new(page_signature, frame_hash, label_key);
        let group_id = self.group_id(&key);
        if let Some(entry) = self.warm.get(&group_id) {
            return Ok(Some(entry.selector.clone()));
        }
        Ok(self
            .groups
            .get(&group_id)
            .and_then(|g| g.winner())
            .map(|e| e.selector))
    }

    async fn score(
        &self,
        page_signature: &str,
        frame_hash: &str,
        label_key: &str,
    ) -> Result<f64, PromotionError> {
        let key = PromotionKey::new(page_signature, frame_hash, label_key);
        let group_id = self.group_id(&key);
        if let Some(entry) = self.warm.get(&group_id) {
            return Ok(entry.confidence);
        }
        Ok(self
            .groups
            .get(&group_id)
            .and_then(|g| g.winner())
            .map(|e| e.confidence)
            .unwrap_or(0.0))
    }
}

/// Confidence the *current* session would report before any writes land
/// for a key — matches [`confidence_for`] at zero samples.
pub fn default_confidence() -> f64 {
    confidence_for(0, 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn record_success_then_lookup_same_session() {
        let dir = tempfile::tempdir().unwrap();
        let store = DefaultPromotionStore::new(dir.path().to_path_buf());
        store
            .record_success("example.com/*", "frame_abc", "label:click|submit", "//*[@data-testid=\"submit\"]", serde_json::Value::Null)
            .await
            .unwrap();
        let found = store
            .lookup("example.com/*", "frame_abc", "label:click|submit")
            .await
            .unwrap();
        assert_eq!(found.as_deref(), Some("//*[@data-testid=\"submit\"]"));
    }

    #[tokio::test]
    async fn failures_lower_confidence_below_success() {
        let dir = tempfile::tempdir().unwrap();
        let store = DefaultPromotionStore::new(dir.path().to_path_buf());
        for _ in 0..3 {
            store
                .record_failure("example.com/*", "frame_abc", "label:click|x", "//a")
                .await
                .unwrap();
        }
        let score = store.score("example.com/*", "frame_abc", "label:click|x").await.unwrap();
        assert!(score < 0.5);
    }

    #[tokio::test]
    async fn unknown_key_scores_zero() {
        let dir = tempfile::tempdir().unwrap();
        let store = DefaultPromotionStore::new(dir.path().to_path_buf());
        let score = store.score("example.com/*", "frame_abc", "label:click|missing").await.unwrap();
        assert_eq!(score, 0.0);
    }

    #[tokio::test]
    async fn per_user_scope_isolates_entries() {
        let dir = tempfile::tempdir().unwrap();
        let a = DefaultPromotionStore::scoped(dir.path().to_path_buf(), Some("user-a".into()));
        let b = DefaultPromotionStore::scoped(dir.path().to_path_buf(), Some("user-b".into()));
        a.record_success("example.com/*", "frame_abc", "label:click|submit", "//a", serde_json::Value::Null)
            .await
            .unwrap();
        assert!(b
            .lookup("example.com/*", "frame_abc", "label:click|submit")
            .await
            .unwrap()
            .is_none());
    }
}
