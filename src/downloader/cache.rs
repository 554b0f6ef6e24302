// Resolution cache: in-memory map mirrored to a JSON file, TTL with lazy eviction

use parking_lot::RwLock;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

use super::errors::PersistenceError;
use super::models::{CacheEntry, ResolutionResult};
use super::utils::now_millis;

type CacheMap = HashMap<String, CacheEntry>;

/// Age must be known and in `[0, ttl)`; overflowing or future timestamps are stale
fn within_ttl(created_at: i64, now: i64, ttl_ms: i64) -> bool {
    matches!(now.checked_sub(created_at), Some(age) if (0..ttl_ms).contains(&age))
}

/// Process-wide cache of resolved links.
///
/// The in-memory map is the source of truth. Every mutation rewrites the
/// whole map to disk; a failed write is logged and otherwise ignored.
/// Expired entries are only removed when a lookup trips over them.
pub struct ResolutionCache {
    path: PathBuf,
    ttl_ms: i64,
    entries: RwLock<CacheMap>,
    // Serialises flushes so two writers never interleave on the file
    flush_lock: tokio::sync::Mutex<()>,
}

impl ResolutionCache {
    /// Load the mirror at `path`, dropping entries already past `ttl`.
    ///
    /// Never fails: a missing file is created empty, an unreadable or
    /// malformed one yields an empty cache.
    pub fn load(path: impl Into<PathBuf>, ttl: Duration) -> Self {
        let path = path.into();
        let ttl_ms = ttl.as_millis().min(i64::MAX as u128) as i64;

        let mut entries = match Self::read_mirror(&path) {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Ignoring cache file {}: {}", path.display(), e);
                CacheMap::new()
            }
        };

        let now = now_millis();
        let before = entries.len();
        entries.retain(|_, entry| within_ttl(entry.created_at, now, ttl_ms));
        info!(
            "Loaded {} cached links from {} ({} expired)",
            entries.len(),
            path.display(),
            before - entries.len()
        );

        Self {
            path,
            ttl_ms,
            entries: RwLock::new(entries),
            flush_lock: tokio::sync::Mutex::new(()),
        }
    }

    fn read_mirror(path: &Path) -> Result<CacheMap, PersistenceError> {
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)?;
        }

        if !path.exists() {
            std::fs::write(path, "{}")?;
            return Ok(CacheMap::new());
        }

        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    fn is_fresh(&self, entry: &CacheEntry, now: i64) -> bool {
        within_ttl(entry.created_at, now, self.ttl_ms)
    }

    /// Fresh entry for `key`; an expired one is removed and the removal flushed
    pub async fn lookup(&self, key: &str) -> Option<CacheEntry> {
        let now = now_millis();
        {
            let mut entries = self.entries.write();
            let fresh = match entries.get(key) {
                None => return None,
                Some(entry) => self.is_fresh(entry, now).then(|| entry.clone()),
            };
            if fresh.is_some() {
                return fresh;
            }
            entries.remove(key);
        }

        debug!("Cache entry {} expired", key);
        self.flush().await;
        None
    }

    /// Insert or replace `key` stamped with the current time
    pub async fn store(&self, key: &str, result: ResolutionResult) {
        let entry = CacheEntry {
            result,
            created_at: now_millis(),
        };
        self.entries.write().insert(key.to_string(), entry);
        self.flush().await;
    }

    /// Drop `key` (e.g. after its link stopped validating)
    pub async fn evict(&self, key: &str) -> bool {
        let removed = self.entries.write().remove(key).is_some();
        if removed {
            self.flush().await;
        }
        removed
    }

    async fn flush(&self) {
        if let Err(e) = self.write_mirror().await {
            warn!("Failed to persist cache to {}: {}", self.path.display(), e);
        }
    }

    async fn write_mirror(&self) -> Result<(), PersistenceError> {
        let _guard = self.flush_lock.lock().await;

        // Snapshot under the flush lock so the last flush carries the latest map
        let data = {
            let entries = self.entries.read();
            serde_json::to_vec_pretty(&*entries)?
        };

        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, data).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn insert_entry(&self, key: &str, entry: CacheEntry) {
        self.entries.write().insert(key.to_string(), entry);
    }
}
