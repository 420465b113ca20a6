//! On-disk census cache.
//!
//! Each source key gets its own directory under the cache root holding the
//! raw document (`census.json`), its sha256 (`census.sha256`) and a freshness
//! marker (`fresh`, an RFC 3339 timestamp of the last successful fetch).
//!
//! Refreshes for the same key are serialized by a per-key async mutex so two
//! work items never fetch the same census at once. Different keys refresh
//! independently. Readers receive `Arc` snapshots, which are never mutated;
//! a refresh swaps in a new snapshot.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use super::source::CensusSource;
use super::{CensusError, CensusSnapshot};

const DOCUMENT_FILE: &str = "census.json";
const HASH_FILE: &str = "census.sha256";
const FRESH_FILE: &str = "fresh";

#[derive(Debug, Clone)]
struct Entry {
    snapshot: Arc<CensusSnapshot>,
    fetched_at: DateTime<Utc>,
}

/// Process-wide census cache.
#[derive(Debug)]
pub struct CensusCache {
    root: PathBuf,
    ttl: Duration,
    entries: RwLock<HashMap<String, Entry>>,
    refresh_locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

/// sha256 of a census document, hex encoded.
pub fn content_hash(raw: &str) -> String {
    hex::encode(Sha256::digest(raw.as_bytes()))
}

/// Maps a source key onto a single safe directory name.
fn sanitize_key(key: &str) -> String {
    key.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '.' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

impl CensusCache {
    pub fn new(root: impl Into<PathBuf>, ttl: Duration) -> Self {
        CensusCache {
            root: root.into(),
            ttl,
            entries: RwLock::new(HashMap::new()),
            refresh_locks: Mutex::new(HashMap::new()),
        }
    }

    fn key_dir(&self, key: &str) -> PathBuf {
        self.root.join(sanitize_key(key))
    }

    fn is_fresh(&self, fetched_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        let age = now.signed_duration_since(fetched_at);
        age.to_std().map(|age| age < self.ttl).unwrap_or(true)
    }

    fn cached(&self, key: &str) -> Option<Entry> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries.get(key).cloned()
    }

    fn store(&self, key: &str, entry: Entry) {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.insert(key.to_string(), entry);
    }

    fn refresh_lock(&self, key: &str) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.refresh_locks.lock().unwrap_or_else(|e| e.into_inner());
        locks.entry(key.to_string()).or_default().clone()
    }

    /// Returns the census for `source`, refreshing it when stale.
    ///
    /// When a refresh fails and an older snapshot exists (in memory or on
    /// disk), the older snapshot is served and the failure logged.
    pub async fn get<S: CensusSource>(&self, source: &S) -> Result<Arc<CensusSnapshot>, CensusError> {
        let key = source.key();
        if let Some(entry) = self.cached(&key)
            && self.is_fresh(entry.fetched_at, Utc::now())
        {
            return Ok(entry.snapshot);
        }

        let lock = self.refresh_lock(&key);
        let _guard = lock.lock().await;

        // Another task may have refreshed while we waited.
        let current = self.cached(&key);
        if let Some(entry) = &current
            && self.is_fresh(entry.fetched_at, Utc::now())
        {
            return Ok(entry.snapshot.clone());
        }

        let dir = self.key_dir(&key);
        let on_disk = match current {
            Some(entry) => Some(entry),
            None => read_disk(&dir).await,
        };
        if let Some(entry) = &on_disk
            && self.is_fresh(entry.fetched_at, Utc::now())
        {
            debug!(key = %key, "census loaded from disk cache");
            self.store(&key, entry.clone());
            return Ok(entry.snapshot.clone());
        }

        match self.refresh(source, &dir, on_disk.as_ref()).await {
            Ok(entry) => {
                self.store(&key, entry.clone());
                Ok(entry.snapshot)
            }
            Err(e) => match on_disk {
                Some(stale) => {
                    warn!(key = %key, error = %e, "census refresh failed, serving stale snapshot");
                    Ok(stale.snapshot)
                }
                None => Err(e),
            },
        }
    }

    async fn refresh<S: CensusSource>(
        &self,
        source: &S,
        dir: &Path,
        previous: Option<&Entry>,
    ) -> Result<Entry, CensusError> {
        let raw = source.fetch().await?;
        let hash = content_hash(&raw);
        let now = Utc::now();

        let snapshot = match previous {
            Some(prev) if prev.snapshot.content_hash() == hash => prev.snapshot.clone(),
            _ => Arc::new(CensusSnapshot::from_json(&raw, hash.clone())?),
        };

        tokio::fs::create_dir_all(dir).await?;
        tokio::fs::write(dir.join(DOCUMENT_FILE), &raw).await?;
        tokio::fs::write(dir.join(HASH_FILE), &hash).await?;
        tokio::fs::write(dir.join(FRESH_FILE), now.to_rfc3339()).await?;
        debug!(hash = %hash, version = snapshot.version(), "census refreshed");

        Ok(Entry {
            snapshot,
            fetched_at: now,
        })
    }
}

/// Loads a previously cached census. Missing or inconsistent files mean
/// there is nothing usable on disk.
async fn read_disk(dir: &Path) -> Option<Entry> {
    let raw = tokio::fs::read_to_string(dir.join(DOCUMENT_FILE)).await.ok()?;
    let hash = tokio::fs::read_to_string(dir.join(HASH_FILE)).await.ok()?;
    let fresh = tokio::fs::read_to_string(dir.join(FRESH_FILE)).await.ok()?;

    let hash = hash.trim();
    if content_hash(&raw) != hash {
        warn!(dir = %dir.display(), "census cache hash mismatch, ignoring cached copy");
        return None;
    }
    let fetched_at = DateTime::parse_from_rfc3339(fresh.trim())
        .ok()?
        .with_timezone(&Utc);
    let snapshot = CensusSnapshot::from_json(&raw, hash).ok()?;
    Some(Entry {
        snapshot: Arc::new(snapshot),
        fetched_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    const DOC: &str = r#"{"version": 3, "domain": "example.org", "contributors": [], "integrators": []}"#;

    struct CountingSource {
        body: Mutex<Result<String, String>>,
        calls: AtomicU32,
    }

    impl CountingSource {
        fn ok(body: &str) -> Self {
            CountingSource {
                body: Mutex::new(Ok(body.to_string())),
                calls: AtomicU32::new(0),
            }
        }

        fn set(&self, body: Result<&str, &str>) {
            *self.body.lock().unwrap() = body.map(str::to_string).map_err(str::to_string);
        }
    }

    impl CensusSource for CountingSource {
        fn key(&self) -> String {
            "repo/census@master".to_string()
        }

        async fn fetch(&self) -> Result<String, CensusError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.body.lock().unwrap().clone().map_err(CensusError::Source)
        }
    }

    // ─── Freshness ───

    #[tokio::test]
    async fn fresh_snapshot_is_not_refetched() {
        let dir = tempfile::tempdir().unwrap();
        let cache = CensusCache::new(dir.path(), Duration::from_secs(3600));
        let source = CountingSource::ok(DOC);

        let a = cache.get(&source).await.unwrap();
        let b = cache.get(&source).await.unwrap();

        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(a.version(), 3);
    }

    #[tokio::test]
    async fn stale_snapshot_is_refetched() {
        let dir = tempfile::tempdir().unwrap();
        let cache = CensusCache::new(dir.path(), Duration::ZERO);
        let source = CountingSource::ok(DOC);

        cache.get(&source).await.unwrap();
        cache.get(&source).await.unwrap();

        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn unchanged_content_keeps_the_same_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let cache = CensusCache::new(dir.path(), Duration::ZERO);
        let source = CountingSource::ok(DOC);

        let a = cache.get(&source).await.unwrap();
        let b = cache.get(&source).await.unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }

    // ─── Disk ───

    #[tokio::test]
    async fn writes_document_hash_and_marker() {
        let dir = tempfile::tempdir().unwrap();
        let cache = CensusCache::new(dir.path(), Duration::from_secs(60));
        let source = CountingSource::ok(DOC);
        cache.get(&source).await.unwrap();

        let key_dir = dir.path().join(sanitize_key(&source.key()));
        let hash = std::fs::read_to_string(key_dir.join(HASH_FILE)).unwrap();
        assert_eq!(hash, content_hash(DOC));
        let fresh = std::fs::read_to_string(key_dir.join(FRESH_FILE)).unwrap();
        assert!(DateTime::parse_from_rfc3339(&fresh).is_ok());
    }

    #[tokio::test]
    async fn fresh_disk_copy_survives_restart() {
        let dir = tempfile::tempdir().unwrap();
        let source = CountingSource::ok(DOC);
        CensusCache::new(dir.path(), Duration::from_secs(3600))
            .get(&source)
            .await
            .unwrap();

        let restarted = CensusCache::new(dir.path(), Duration::from_secs(3600));
        restarted.get(&source).await.unwrap();
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failed_refresh_serves_stale_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let cache = CensusCache::new(dir.path(), Duration::ZERO);
        let source = CountingSource::ok(DOC);
        cache.get(&source).await.unwrap();

        source.set(Err("forge down"));
        let snapshot = cache.get(&source).await.unwrap();
        assert_eq!(snapshot.version(), 3);
    }

    #[tokio::test]
    async fn failed_first_fetch_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let cache = CensusCache::new(dir.path(), Duration::ZERO);
        let source = CountingSource::ok(DOC);
        source.set(Err("forge down"));
        assert!(matches!(cache.get(&source).await, Err(CensusError::Source(_))));
    }

    #[test]
    fn sanitize_key_flattens_separators() {
        assert_eq!(sanitize_key("a/b@c:d"), "a_b_c_d");
    }
}
