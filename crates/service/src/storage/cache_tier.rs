use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache;

use crate::errors::ServiceError;

/// Fast, non-authoritative copy of serialized records.
///
/// Implementations may evict at will and may fail; callers treat every error
/// as a miss. Nothing here is transactional across keys.
#[async_trait]
pub trait CacheTier: Send + Sync {
    async fn exists(&self, key: &str) -> Result<bool, ServiceError>;
    async fn get(&self, key: &str) -> Result<Option<String>, ServiceError>;
    async fn set(&self, key: &str, value: String) -> Result<(), ServiceError>;
    async fn remove(&self, key: &str) -> Result<(), ServiceError>;
}

/// In-process cache tier backed by `moka`.
#[derive(Clone)]
pub struct MokaCacheTier {
    inner: Cache<String, String>,
}

impl MokaCacheTier {
    pub fn new(max_capacity: u64, ttl: Option<Duration>) -> Self {
        let mut builder = Cache::builder().max_capacity(max_capacity);
        if let Some(ttl) = ttl {
            builder = builder.time_to_live(ttl);
        }
        Self { inner: builder.build() }
    }

    pub fn from_config(cfg: &configs::CacheConfig) -> Self { Self::new(cfg.max_capacity, cfg.ttl()) }
}

#[async_trait]
impl CacheTier for MokaCacheTier {
    async fn exists(&self, key: &str) -> Result<bool, ServiceError> { Ok(self.inner.contains_key(key)) }

    async fn get(&self, key: &str) -> Result<Option<String>, ServiceError> { Ok(self.inner.get(key).await) }

    async fn set(&self, key: &str, value: String) -> Result<(), ServiceError> {
        self.inner.insert(key.to_string(), value).await;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), ServiceError> {
        self.inner.invalidate(key).await;
        Ok(())
    }
}

/// Cache tier used when caching is switched off: every read misses.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopCacheTier;

#[async_trait]
impl CacheTier for NoopCacheTier {
    async fn exists(&self, _key: &str) -> Result<bool, ServiceError> { Ok(false) }
    async fn get(&self, _key: &str) -> Result<Option<String>, ServiceError> { Ok(None) }
    async fn set(&self, _key: &str, _value: String) -> Result<(), ServiceError> { Ok(()) }
    async fn remove(&self, _key: &str) -> Result<(), ServiceError> { Ok(()) }
}
