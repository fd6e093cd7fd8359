use std::collections::BTreeSet;
use std::time::Duration;

use async_trait::async_trait;
use models::{EntityId, Outcome, TalentInfo};
use tracing::info;

use crate::errors::ServiceError;
use crate::lookup::AffinityLookup;
use crate::storage::{EntityStore, KeyedLock};

/// Talent records. Skills read a player's affinities from here.
pub struct TalentService {
    store: EntityStore<TalentInfo>,
    locks: KeyedLock,
    lock_timeout: Option<Duration>,
}

impl TalentService {
    pub fn new(store: EntityStore<TalentInfo>, locks: KeyedLock) -> Self {
        Self { store, locks, lock_timeout: None }
    }

    pub fn with_lock_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.lock_timeout = timeout;
        self
    }

    pub fn store(&self) -> &EntityStore<TalentInfo> { &self.store }

    pub async fn fetch(&self, id: &EntityId) -> Result<Option<TalentInfo>, ServiceError> {
        let key = self.store.cache_key(id);
        self.locks
            .with_lock_timeout(&key, self.lock_timeout, || async move { self.store.load(id).await })
            .await?
    }

    /// Set the player's spiritual roots, creating the talent record if needed.
    /// Other talent fields are kept.
    pub async fn set_spiritual_roots<I>(&self, id: &EntityId, roots: I) -> Result<Outcome, ServiceError>
    where
        I: IntoIterator<Item = String>,
    {
        let roots: Vec<String> = roots.into_iter().map(|r| r.trim().to_string()).collect();
        if roots.iter().any(|r| r.is_empty()) {
            return Err(ServiceError::invalid("spiritual root must not be empty"));
        }
        let key = self.store.cache_key(id);
        self.locks
            .with_lock_timeout(&key, self.lock_timeout, || async move {
                let mut info = self.store.load(id).await?.unwrap_or_default();
                info.spiritual_root = roots;
                self.store.store(id, &info).await?;
                info!(player = %id, roots = ?info.spiritual_root, "spiritual_roots_set");
                Ok(Outcome::success([format!("灵根已更新为：{}", info.spiritual_root.join("、"))]))
            })
            .await?
    }
}

#[async_trait]
impl AffinityLookup for TalentService {
    async fn get_affinities(&self, id: &EntityId) -> Result<Option<BTreeSet<String>>, ServiceError> {
        Ok(self.fetch(id).await?.map(|info| info.affinities()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{MokaCacheTier, PathScheme};
    use std::sync::Arc;

    fn service() -> (TalentService, std::path::PathBuf) {
        let root = std::env::temp_dir().join(format!("svc_talent_{}", uuid::Uuid::new_v4()));
        let store = EntityStore::new("talent", PathScheme::new(&root), Arc::new(MokaCacheTier::new(16, None)));
        (TalentService::new(store, KeyedLock::new()), root)
    }

    #[tokio::test]
    async fn affinities_absent_until_set() -> Result<(), anyhow::Error> {
        let (talents, root) = service();
        let id = EntityId::from(7);
        assert_eq!(talents.get_affinities(&id).await?, None);

        let out = talents.set_spiritual_roots(&id, ["火".to_string(), "金".to_string()]).await?;
        assert!(out.success);
        let roots = talents.get_affinities(&id).await?.unwrap_or_default();
        assert_eq!(roots.into_iter().collect::<Vec<_>>(), vec!["火".to_string(), "金".to_string()]);

        let _ = tokio::fs::remove_dir_all(&root).await;
        Ok(())
    }

    #[tokio::test]
    async fn setting_roots_keeps_other_fields() -> Result<(), anyhow::Error> {
        let (talents, root) = service();
        let id = EntityId::from(8);
        tokio::fs::create_dir_all(&root).await?;
        tokio::fs::write(root.join("8.json"), r#"{"spiritualRoot":["水"],"talentSize":2}"#).await?;

        talents.set_spiritual_roots(&id, ["木".to_string()]).await?;
        let info = talents.fetch(&id).await?.unwrap_or_default();
        assert_eq!(info.spiritual_root, vec!["木".to_string()]);
        assert_eq!(info.extra.get("talentSize"), Some(&serde_json::json!(2)));

        let _ = tokio::fs::remove_dir_all(&root).await;
        Ok(())
    }

    #[tokio::test]
    async fn blank_root_is_invalid() {
        let (talents, _root) = service();
        let res = talents.set_spiritual_roots(&EntityId::from(1), [" ".to_string()]).await;
        assert!(matches!(res, Err(ServiceError::InvalidArgument(_))));
    }
}
