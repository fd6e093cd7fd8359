use std::marker::PhantomData;
use std::sync::Arc;

use dashmap::DashMap;
use models::EntityId;
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, info, warn};

use super::cache_tier::CacheTier;
use super::file_store::{FileStore, PathScheme};
use crate::errors::ServiceError;

/// Cache-aside accessor for one module's per-entity records.
///
/// The JSON file under [`PathScheme`] is the record; the cache tier only
/// mirrors the exact bytes last read from or written to it. Reads try the
/// cache first and fill it on a miss. Writes go to the file first and refresh
/// the cache only after the file write succeeded, so the cache can lag the
/// file (self-healing on the next miss) but never run ahead of it.
///
/// When the cache refuses both the refresh and the eviction of a key, the
/// copy it still serves may be older than the file. Such keys are marked
/// suspect and read from the file until a later set or remove succeeds.
///
/// The accessor does no locking of its own: callers serialise access per
/// entity with [`KeyedLock`](super::keyed_lock::KeyedLock) on
/// [`cache_key`](Self::cache_key).
pub struct EntityStore<T> {
    namespace: String,
    paths: PathScheme,
    files: FileStore,
    cache: Arc<dyn CacheTier>,
    suspect: Arc<DashMap<String, ()>>,
    _record: PhantomData<fn() -> T>,
}

impl<T> Clone for EntityStore<T> {
    fn clone(&self) -> Self {
        Self {
            namespace: self.namespace.clone(),
            paths: self.paths.clone(),
            files: self.files,
            cache: Arc::clone(&self.cache),
            suspect: Arc::clone(&self.suspect),
            _record: PhantomData,
        }
    }
}

impl<T> EntityStore<T>
where
    T: Serialize + DeserializeOwned,
{
    pub fn new(namespace: impl Into<String>, paths: PathScheme, cache: Arc<dyn CacheTier>) -> Self {
        Self {
            namespace: namespace.into(),
            paths,
            files: FileStore,
            cache,
            suspect: Arc::new(DashMap::new()),
            _record: PhantomData,
        }
    }

    pub fn paths(&self) -> &PathScheme { &self.paths }

    /// `<namespace>:<id>`; also the lock key for guarded operations.
    pub fn cache_key(&self, id: &EntityId) -> String { format!("{}:{}", self.namespace, id) }

    /// Current record for `id`, or `None` when nothing was ever stored.
    ///
    /// A file that exists but does not decode is `DataCorrupt`; it is never
    /// reported as absent.
    pub async fn load(&self, id: &EntityId) -> Result<Option<T>, ServiceError> {
        let key = self.cache_key(id);

        if let Some(raw) = self.cached(&key).await {
            match serde_json::from_str::<T>(&raw) {
                Ok(value) => {
                    debug!(%key, "cache_hit");
                    return Ok(Some(value));
                }
                Err(e) => {
                    warn!(%key, error = %e, "discarding_undecodable_cache_entry");
                    self.evict(&key).await;
                }
            }
        }

        let path = self.paths.path_for(id);
        let bytes = match self.files.read(&path).await {
            Ok(bytes) => bytes,
            Err(ServiceError::NotFound(_)) => {
                debug!(%key, "record_absent");
                return Ok(None);
            }
            Err(e) => return Err(e),
        };
        let value: T = serde_json::from_slice(&bytes).map_err(|e| ServiceError::corrupt(&key, e))?;
        debug!(%key, path = %path.display(), "cache_miss_loaded_from_file");

        match String::from_utf8(bytes) {
            Ok(raw) => self.fill(&key, raw).await,
            Err(e) => warn!(%key, error = %e, "record_not_utf8_skipping_cache"),
        }
        Ok(Some(value))
    }

    /// Persist `value` for `id`: file first, then cache with the same bytes.
    ///
    /// A failed file write fails the call and leaves the cache untouched. A
    /// cache failure after a durable write is logged and does not fail it.
    pub async fn store(&self, id: &EntityId, value: &T) -> Result<(), ServiceError> {
        let key = self.cache_key(id);
        let raw = serde_json::to_string(value)
            .map_err(|e| ServiceError::invalid(format!("cannot serialize {key}: {e}")))?;

        let path = self.paths.path_for(id);
        self.files.write(&path, raw.as_bytes()).await?;
        info!(%key, path = %path.display(), bytes = raw.len(), "record_persisted");

        self.fill(&key, raw).await;
        Ok(())
    }

    /// Drop the cached copy of `id`; the next load reads the file.
    pub async fn invalidate(&self, id: &EntityId) -> Result<(), ServiceError> {
        let key = self.cache_key(id);
        match self.cache.remove(&key).await {
            Ok(()) => {
                self.suspect.remove(&key);
                Ok(())
            }
            Err(e) => {
                self.suspect.insert(key, ());
                Err(e)
            }
        }
    }

    async fn cached(&self, key: &str) -> Option<String> {
        if self.suspect.contains_key(key) {
            debug!(%key, "cache_bypassed_suspect_entry");
            return None;
        }
        match self.cache.exists(key).await {
            Ok(true) => match self.cache.get(key).await {
                Ok(raw) => raw,
                Err(e) => {
                    warn!(%key, error = %e, "cache_get_failed_falling_back_to_file");
                    None
                }
            },
            Ok(false) => None,
            Err(e) => {
                warn!(%key, error = %e, "cache_exists_failed_falling_back_to_file");
                None
            }
        }
    }

    async fn fill(&self, key: &str, raw: String) {
        match self.cache.set(key, raw).await {
            Ok(()) => {
                self.suspect.remove(key);
            }
            Err(e) => {
                warn!(%key, error = %e, "cache_set_failed");
                // an older copy may still be cached; it must not outlive this write
                self.evict(key).await;
            }
        }
    }

    async fn evict(&self, key: &str) {
        match self.cache.remove(key).await {
            Ok(()) => {
                self.suspect.remove(key);
            }
            Err(e) => {
                warn!(%key, error = %e, "cache_remove_failed_marking_suspect");
                self.suspect.insert(key.to_string(), ());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::cache_tier::MokaCacheTier;
    use async_trait::async_trait;
    use models::{Skill, SkillLedger};
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicBool, Ordering};
    use uuid::Uuid;

    /// Serves reads normally but rejects every write while `writes_fail` is set.
    struct WriteBlockedCache {
        inner: MokaCacheTier,
        writes_fail: AtomicBool,
    }

    #[async_trait]
    impl CacheTier for WriteBlockedCache {
        async fn exists(&self, key: &str) -> Result<bool, ServiceError> { self.inner.exists(key).await }
        async fn get(&self, key: &str) -> Result<Option<String>, ServiceError> { self.inner.get(key).await }

        async fn set(&self, key: &str, value: String) -> Result<(), ServiceError> {
            if self.writes_fail.load(Ordering::SeqCst) {
                return Err(ServiceError::Io("cache write refused".into()));
            }
            self.inner.set(key, value).await
        }

        async fn remove(&self, key: &str) -> Result<(), ServiceError> {
            if self.writes_fail.load(Ordering::SeqCst) {
                return Err(ServiceError::Io("cache write refused".into()));
            }
            self.inner.remove(key).await
        }
    }

    fn setup() -> (EntityStore<SkillLedger>, Arc<MokaCacheTier>, PathBuf) {
        let root = std::env::temp_dir().join(format!("svc_entity_store_{}", Uuid::new_v4()));
        let cache = Arc::new(MokaCacheTier::new(100, None));
        let store = EntityStore::new("skill", PathScheme::new(root.join("skill")), cache.clone());
        (store, cache, root)
    }

    fn ledger(names: &[&str]) -> SkillLedger {
        SkillLedger { skill_list: names.iter().map(|n| Skill::learned(*n, 10)).collect() }
    }

    #[tokio::test]
    async fn absent_record_is_none_not_default() -> Result<(), anyhow::Error> {
        let (store, cache, _root) = setup();
        assert_eq!(store.load(&EntityId::from(7)).await?, None);
        assert!(!cache.exists("skill:7").await?);
        Ok(())
    }

    #[tokio::test]
    async fn store_writes_file_then_cache_with_same_bytes() -> Result<(), anyhow::Error> {
        let (store, cache, root) = setup();
        let id = EntityId::from(7);
        store.store(&id, &ledger(&["烈焰斩"])).await?;

        let on_disk = tokio::fs::read_to_string(store.paths().path_for(&id)).await?;
        assert_eq!(cache.get("skill:7").await?, Some(on_disk));
        assert_eq!(store.load(&id).await?, Some(ledger(&["烈焰斩"])));

        let _ = tokio::fs::remove_dir_all(&root).await;
        Ok(())
    }

    #[tokio::test]
    async fn miss_loads_file_and_populates_cache() -> Result<(), anyhow::Error> {
        let (store, cache, root) = setup();
        let id = EntityId::from(7);
        store.store(&id, &ledger(&["a", "b"])).await?;
        store.invalidate(&id).await?;
        assert!(!cache.exists("skill:7").await?);

        assert_eq!(store.load(&id).await?, Some(ledger(&["a", "b"])));
        assert!(cache.exists("skill:7").await?);

        let _ = tokio::fs::remove_dir_all(&root).await;
        Ok(())
    }

    #[tokio::test]
    async fn corrupt_file_is_data_corrupt() -> Result<(), anyhow::Error> {
        let (store, cache, root) = setup();
        let id = EntityId::from(7);
        let path = store.paths().path_for(&id);
        tokio::fs::create_dir_all(path.parent().unwrap()).await?;
        tokio::fs::write(&path, b"{\"skillList\": [").await?;

        let res = store.load(&id).await;
        assert!(matches!(res, Err(ServiceError::DataCorrupt { ref key, .. }) if key == "skill:7"));
        assert!(!cache.exists("skill:7").await?);

        let _ = tokio::fs::remove_dir_all(&root).await;
        Ok(())
    }

    #[tokio::test]
    async fn undecodable_cache_entry_falls_back_to_file() -> Result<(), anyhow::Error> {
        let (store, cache, root) = setup();
        let id = EntityId::from(7);
        store.store(&id, &ledger(&["a"])).await?;
        cache.set("skill:7", "not json".into()).await?;

        assert_eq!(store.load(&id).await?, Some(ledger(&["a"])));
        let refreshed = cache.get("skill:7").await?.unwrap_or_default();
        assert!(refreshed.contains("skillList"));

        let _ = tokio::fs::remove_dir_all(&root).await;
        Ok(())
    }

    #[tokio::test]
    async fn failed_file_write_leaves_cache_untouched() -> Result<(), anyhow::Error> {
        let (store, cache, root) = setup();
        let id = EntityId::from(7);
        store.store(&id, &ledger(&["a"])).await?;
        let before = cache.get("skill:7").await?;

        // replace the module directory with a regular file
        tokio::fs::remove_dir_all(store.paths().root()).await?;
        tokio::fs::write(store.paths().root(), b"").await?;

        let res = store.store(&id, &ledger(&["a", "b"])).await;
        assert!(matches!(res, Err(ServiceError::Io(_))));
        assert_eq!(cache.get("skill:7").await?, before);

        let _ = tokio::fs::remove_dir_all(&root).await;
        Ok(())
    }

    #[tokio::test]
    async fn namespaces_do_not_share_keys() {
        let (store, cache, root) = setup();
        let other: EntityStore<SkillLedger> = EntityStore::new("talent", PathScheme::new(root.join("talent")), cache);
        let id = EntityId::from(7);
        assert_ne!(store.cache_key(&id), other.cache_key(&id));
        assert_ne!(store.paths().path_for(&id), other.paths().path_for(&id));
    }

    #[tokio::test]
    async fn stale_entry_is_bypassed_when_cache_rejects_writes() -> Result<(), anyhow::Error> {
        let root = std::env::temp_dir().join(format!("svc_entity_store_{}", Uuid::new_v4()));
        let cache = Arc::new(WriteBlockedCache { inner: MokaCacheTier::new(100, None), writes_fail: AtomicBool::new(false) });
        let store: EntityStore<SkillLedger> = EntityStore::new("skill", PathScheme::new(root.join("skill")), cache.clone());
        let id = EntityId::from(7);
        store.store(&id, &ledger(&["a"])).await?;

        cache.writes_fail.store(true, Ordering::SeqCst);
        store.store(&id, &ledger(&["a", "b"])).await?;
        // the tier still holds the old copy, but it is never served
        assert!(!cache.inner.get("skill:7").await?.unwrap_or_default().contains("\"b\""));
        assert_eq!(store.load(&id).await?, Some(ledger(&["a", "b"])));

        cache.writes_fail.store(false, Ordering::SeqCst);
        assert_eq!(store.load(&id).await?, Some(ledger(&["a", "b"])));
        // the refill replaced the stale copy and cleared the mark
        assert_eq!(
            cache.inner.get("skill:7").await?,
            Some(tokio::fs::read_to_string(store.paths().path_for(&id)).await?)
        );
        assert_eq!(store.clone().load(&id).await?, Some(ledger(&["a", "b"])));

        let _ = tokio::fs::remove_dir_all(&root).await;
        Ok(())
    }
}
