use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::errors::VectorCacheError;
use crate::fs as persist;
use crate::hot::HotTier;
use crate::model::EmbeddingEntry;

/// Default in-memory hot tier size (~1000 hottest entries, per resource budget).
pub const DEFAULT_HOT_CAPACITY: usize = 1000;

/// Default persistent-tier byte budget: 256 MiB.
pub const DEFAULT_BYTE_BUDGET: u64 = 256 * 1024 * 1024;

#[async_trait]
pub trait VectorCache: Send + Sync {
    async fn get(&self, fingerprint: &str) -> Result<Option<EmbeddingEntry>, VectorCacheError>;
    async fn put(&self, entry: EmbeddingEntry) -> Result<(), VectorCacheError>;
    async fn batch_get(
        &self,
        fingerprints: &[String],
    ) -> Result<Vec<Option<EmbeddingEntry>>, VectorCacheError>;
    async fn batch_put(&self, entries: Vec<EmbeddingEntry>) -> Result<(), VectorCacheError>;
}

struct PersistMeta {
    size: usize,
    last_access: chrono::DateTime<chrono::Utc>,
}

pub struct DefaultVectorCache {
    root: PathBuf,
    hot: HotTier,
    byte_budget: u64,
    bytes_used: AtomicUsize,
    persist_index: DashMap<String, PersistMeta>,
    write_lock: Mutex<()>,
}

impl DefaultVectorCache {
    pub fn new(root: PathBuf) -> Self {
        Self::with_capacity(root, DEFAULT_HOT_CAPACITY, DEFAULT_BYTE_BUDGET)
    }

    pub fn with_capacity(root: PathBuf, hot_capacity: usize, byte_budget: u64) -> Self {
        Self {
            root,
            hot: HotTier::new(hot_capacity),
            byte_budget,
            bytes_used: AtomicUsize::new(0),
            persist_index: DashMap::new(),
            write_lock: Mutex::new(()),
        }
    }

    fn record_write(&self, entry: &EmbeddingEntry) {
        let size = entry.byte_size();
        if let Some(mut existing) = self.persist_index.get_mut(&entry.fingerprint) {
            self.bytes_used.fetch_sub(existing.size, Ordering::SeqCst);
            existing.size = size;
            existing.last_access = entry.last_access;
        } else {
            self.persist_index.insert(
                entry.fingerprint.clone(),
                PersistMeta {
                    size,
                    last_access: entry.last_access,
                },
            );
        }
        self.bytes_used.fetch_add(size, Ordering::SeqCst);
        self.evict_over_budget();
    }

    fn evict_over_budget(&self) {
        while self.bytes_used.load(Ordering::SeqCst) as u64 > self.byte_budget {
            let victim = self
                .persist_index
                .iter()
                .min_by_key(|e| e.last_access)
                .map(|e| e.key().clone());
            let Some(key) = victim else { break };
            if let Some((_, meta)) = self.persist_index.remove(&key) {
                self.bytes_used.fetch_sub(meta.size, Ordering::SeqCst);
            }
            persist::remove_entry(&self.root, &key);
            self.hot.remove(&key);
            debug!(fingerprint = %key, "evicted embedding over byte budget");
        }
    }
}

#[async_trait]
impl VectorCache for DefaultVectorCache {
    async fn get(&self, fingerprint: &str) -> Result<Option<EmbeddingEntry>, VectorCacheError> {
        if let Some(entry) = self.hot.get(fingerprint) {
            return Ok(Some(entry));
        }
        match persist::read_entry(&self.root, fingerprint) {
            Ok(Some(mut entry)) => {
                entry.touch();
                self.hot.put(entry.clone());
                Ok(Some(entry))
            }
            Ok(None) => Ok(None),
            Err(err) => {
                warn!(fingerprint, error = %err, "embedding read failed");
                Err(VectorCacheError::Io(err.to_string()))
            }
        }
    }

    async fn put(&self, entry: EmbeddingEntry) -> Result<(), VectorCacheError> {
        let _guard = self.write_lock.lock();
        persist::write_entry(&self.root, &entry).map_err(|err| VectorCacheError::Io(err.to_string()))?;
        self.record_write(&entry);
        self.hot.put(entry);
        Ok(())
    }

    async fn batch_get(
        &self,
        fingerprints: &[String],
    ) -> Result<Vec<Option<EmbeddingEntry>>, VectorCacheError> {
        let mut out = Vec::with_capacity(fingerprints.len());
        for fp in fingerprints {
            out.push(self.get(fp).await?);
        }
        Ok(out)
    }

    async fn batch_put(&self, entries: Vec<EmbeddingEntry>) -> Result<(), VectorCacheError> {
        let _guard = self.write_lock.lock();
        for entry in entries {
            persist::write_entry(&self.root, &entry)
                .map_err(|err| VectorCacheError::Io(err.to_string()))?;
            self.record_write(&entry);
            self.hot.put(entry);
        }
        Ok(())
    }
}
