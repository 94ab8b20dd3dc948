//! Best-effort query cache persisted to a JSON file
//!
//! Entries are keyed by the JSON serialization of the request descriptor and
//! expire a fixed TTL after they were written. Serialization and I/O failures
//! are logged and swallowed: a broken cache only means more upstream calls.

use std::collections::HashMap;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::util::time::unix_millis;

/// Default expiry for cached queries
pub const DEFAULT_TTL: Duration = Duration::from_secs(24 * 60 * 60);

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CacheEntry {
    data: Value,
    /// Unix millis at write time
    updated_at: u64,
}

pub struct QueryCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
    ttl_millis: u64,
    path: Option<PathBuf>,
    /// Snapshot counter; later snapshots hold newer state
    generation: AtomicU64,
    /// Held while writing; guards the generation last written to disk
    written: Arc<Mutex<u64>>,
}

impl QueryCache {
    /// Cache that is never written to disk
    pub fn in_memory(ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl_millis: ttl.as_millis() as u64,
            path: None,
            generation: AtomicU64::new(0),
            written: Arc::new(Mutex::new(0)),
        }
    }

    /// Rehydrate from `path`, dropping anything already expired
    pub fn load(path: impl Into<PathBuf>, ttl: Duration) -> Self {
        Self::load_at(path, ttl, unix_millis())
    }

    fn load_at(path: impl Into<PathBuf>, ttl: Duration, now: u64) -> Self {
        let path = path.into();
        let mut cache = Self::in_memory(ttl);

        let stored = read_entries(&path);
        let total = stored.len();
        let fresh: HashMap<String, CacheEntry> = stored
            .into_iter()
            .filter(|(_, entry)| !cache.is_expired(entry, now))
            .collect();

        debug!(
            path = %path.display(),
            restored = fresh.len(),
            discarded = total - fresh.len(),
            "Query cache rehydrated"
        );

        cache.entries = RwLock::new(fresh);
        cache.path = Some(path);
        cache
    }

    /// Cache key for a request descriptor
    pub fn key<D: Serialize + ?Sized>(descriptor: &D) -> Option<String> {
        serde_json::to_string(descriptor)
            .map_err(|e| warn!(error = %e, "Failed to serialize cache key"))
            .ok()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    fn is_expired(&self, entry: &CacheEntry, now: u64) -> bool {
        now >= entry.updated_at.saturating_add(self.ttl_millis)
    }

    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.get_at(key, unix_millis())
    }

    fn get_at<T: DeserializeOwned>(&self, key: &str, now: u64) -> Option<T> {
        let entry = self.entries.read().get(key).cloned()?;

        if self.is_expired(&entry, now) {
            self.entries.write().remove(key);
            self.persist();
            return None;
        }

        serde_json::from_value(entry.data)
            .map_err(|e| warn!(key, error = %e, "Cached value has unexpected shape"))
            .ok()
    }

    pub fn put<T: Serialize>(&self, key: &str, value: &T) {
        self.put_at(key, value, unix_millis());
    }

    fn put_at<T: Serialize>(&self, key: &str, value: &T, now: u64) {
        let data = match serde_json::to_value(value) {
            Ok(data) => data,
            Err(e) => {
                warn!(key, error = %e, "Failed to serialize cached value");
                return;
            }
        };

        self.entries.write().insert(
            key.to_string(),
            CacheEntry {
                data,
                updated_at: now,
            },
        );
        self.persist();
    }

    /// Drop every expired entry
    pub fn purge_expired(&self) -> usize {
        let now = unix_millis();
        let removed = {
            let mut entries = self.entries.write();
            let before = entries.len();
            entries.retain(|_, entry| now < entry.updated_at.saturating_add(self.ttl_millis));
            before - entries.len()
        };

        if removed > 0 {
            self.persist();
        }
        removed
    }

    /// Serve `descriptor` from the cache or run `fetch` and cache its success
    pub async fn get_or_fetch<D, T, E, F, Fut>(&self, descriptor: &D, fetch: F) -> Result<T, E>
    where
        D: Serialize + ?Sized,
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let key = Self::key(descriptor);

        if let Some(hit) = key.as_deref().and_then(|k| self.get(k)) {
            return Ok(hit);
        }

        let value = fetch().await?;
        if let Some(key) = key {
            self.put(&key, &value);
        }
        Ok(value)
    }

    /// Write the cache to its file, if it has one. Inside a runtime the
    /// write runs on the blocking pool.
    pub fn persist(&self) {
        let Some((path, generation, bytes)) = self.snapshot() else {
            return;
        };

        let written = self.written.clone();
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn_blocking(move || write_snapshot(&path, &written, generation, &bytes));
            }
            Err(_) => write_snapshot(&path, &written, generation, &bytes),
        }
    }

    /// Write the cache to its file on the calling thread
    pub fn persist_blocking(&self) {
        if let Some((path, generation, bytes)) = self.snapshot() {
            write_snapshot(&path, &self.written, generation, &bytes);
        }
    }

    fn snapshot(&self) -> Option<(PathBuf, u64, Vec<u8>)> {
        let path = self.path.clone()?;

        let entries = self.entries.read();
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        match serde_json::to_vec(&*entries) {
            Ok(bytes) => Some((path, generation, bytes)),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to serialize query cache");
                None
            }
        }
    }
}

/// Write one snapshot unless a newer one already reached the disk
fn write_snapshot(path: &Path, written: &Mutex<u64>, generation: u64, bytes: &[u8]) {
    let mut last = written.lock();
    if *last >= generation {
        return;
    }

    match write_atomically(path, bytes) {
        Ok(()) => *last = generation,
        Err(e) => warn!(path = %path.display(), error = %e, "Failed to persist query cache"),
    }
}

fn read_entries(path: &Path) -> HashMap<String, CacheEntry> {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return HashMap::new(),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Failed to read query cache");
            return HashMap::new();
        }
    };

    serde_json::from_slice(&bytes).unwrap_or_else(|e| {
        warn!(path = %path.display(), error = %e, "Discarding corrupt query cache");
        HashMap::new()
    })
}

fn write_atomically(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let tmp = path.with_extension("tmp");
    std::fs::write(&tmp, bytes)?;
    std::fs::rename(&tmp, path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    const HOUR: u64 = 60 * 60 * 1000;
    const T0: u64 = 1_700_000_000_000;

    #[derive(Serialize)]
    struct Descriptor<'a> {
        table: &'a str,
        page: usize,
    }

    #[test]
    fn served_until_ttl_then_purged() {
        let cache = QueryCache::in_memory(DEFAULT_TTL);
        cache.put_at("k", &json!([1, 2, 3]), T0);

        let just_before = T0 + 24 * HOUR - 1;
        assert_eq!(cache.get_at::<Vec<u32>>("k", just_before), Some(vec![1, 2, 3]));

        assert_eq!(cache.get_at::<Vec<u32>>("k", T0 + 24 * HOUR), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn keys_are_serialized_descriptors() {
        let key = QueryCache::key(&Descriptor { table: "Countries", page: 1 }).unwrap();
        assert_eq!(key, r#"{"table":"Countries","page":1}"#);
    }

    #[test]
    fn rehydrates_fresh_entries_and_drops_stale_ones() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cache.json");

        let writer = QueryCache::load_at(&path, DEFAULT_TTL, T0);
        writer.put_at("old", &json!("stale"), T0);
        writer.put_at("new", &json!("fresh"), T0 + 20 * HOUR);
        assert!(path.exists());

        let reader = QueryCache::load_at(&path, DEFAULT_TTL, T0 + 25 * HOUR);
        assert_eq!(reader.len(), 1);
        assert_eq!(
            reader.get_at::<String>("new", T0 + 25 * HOUR),
            Some("fresh".to_string())
        );
        assert_eq!(reader.get_at::<String>("old", T0 + 25 * HOUR), None);
    }

    #[test]
    fn corrupt_file_yields_empty_cache() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cache.json");
        std::fs::write(&path, b"{not json").unwrap();

        let cache = QueryCache::load(&path, DEFAULT_TTL);
        assert!(cache.is_empty());

        cache.put("k", &json!(1));
        assert_eq!(cache.get::<u32>("k"), Some(1));
    }

    #[test]
    fn unwritable_path_does_not_fail_callers() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing-dir").join("cache.json");

        let cache = QueryCache::load(&path, DEFAULT_TTL);
        cache.put("k", &json!("v"));
        assert_eq!(cache.get::<String>("k"), Some("v".to_string()));
    }

    #[test]
    fn wrong_shape_is_a_miss() {
        let cache = QueryCache::in_memory(DEFAULT_TTL);
        cache.put("k", &json!({ "a": 1 }));
        assert_eq!(cache.get::<Vec<u32>>("k"), None);
    }

    #[test]
    fn get_or_fetch_caches_only_success() {
        let cache = QueryCache::in_memory(DEFAULT_TTL);
        let descriptor = Descriptor { table: "Sources", page: 1 };

        let failed: Result<Vec<String>, &str> =
            tokio_test::block_on(cache.get_or_fetch(&descriptor, || async { Err("offline") }));
        assert_eq!(failed, Err("offline"));
        assert!(cache.is_empty());

        let fetched: Result<Vec<String>, &str> = tokio_test::block_on(
            cache.get_or_fetch(&descriptor, || async { Ok(vec!["Etsy".to_string()]) }),
        );
        assert_eq!(fetched, Ok(vec!["Etsy".to_string()]));

        let cached: Result<Vec<String>, &str> = tokio_test::block_on(
            cache.get_or_fetch(&descriptor, || async { Err("should be cached") }),
        );
        assert_eq!(cached, Ok(vec!["Etsy".to_string()]));
    }

    #[test]
    fn stale_snapshot_never_overwrites_newer_one() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cache.json");
        let written = Mutex::new(0);

        write_snapshot(&path, &written, 2, br#"{"new":{"data":1,"updated_at":0}}"#);
        write_snapshot(&path, &written, 1, br#"{"old":{"data":1,"updated_at":0}}"#);

        let on_disk = read_entries(&path);
        assert!(on_disk.contains_key("new"));
        assert!(!on_disk.contains_key("old"));
        assert_eq!(*written.lock(), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_puts_leave_a_readable_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cache.json");
        let cache = Arc::new(QueryCache::load(&path, DEFAULT_TTL));

        let tasks: Vec<_> = (0..32)
            .map(|i| {
                let cache = cache.clone();
                tokio::spawn(async move { cache.put(&format!("k{i}"), &json!(i)) })
            })
            .collect();
        for task in tasks {
            task.await.unwrap();
        }

        let flushed = cache.clone();
        tokio::task::spawn_blocking(move || flushed.persist_blocking())
            .await
            .unwrap();

        let reloaded = QueryCache::load(&path, DEFAULT_TTL);
        assert_eq!(reloaded.len(), 32);
    }
}
