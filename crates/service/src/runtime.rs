//! Wiring of the per-player modules from an [`AppConfig`].
//!
//! Everything is built from the config value passed in; nothing is global.
//! All modules share one cache tier and one keyed lock registry, and their
//! namespaces keep keys apart.

use std::sync::Arc;

use configs::AppConfig;
use tracing::info;

use crate::catalog::ItemCatalog;
use crate::errors::ServiceError;
use crate::skill::SkillService;
use crate::storage::{CacheTier, EntityStore, KeyedLock, MokaCacheTier, NoopCacheTier, PathScheme};
use crate::talent::TalentService;

pub struct Services {
    pub skills: SkillService,
    pub talents: Arc<TalentService>,
    pub catalog: Arc<ItemCatalog>,
    pub locks: KeyedLock,
}

impl Services {
    pub async fn from_config(cfg: &AppConfig) -> Result<Self, ServiceError> {
        let cache: Arc<dyn CacheTier> = if cfg.cache.enabled {
            Arc::new(MokaCacheTier::from_config(&cfg.cache))
        } else {
            Arc::new(NoopCacheTier)
        };
        let catalog = Arc::new(ItemCatalog::load(&cfg.storage.item_catalog_path()).await?);
        Ok(Self::assemble(cfg, cache, catalog))
    }

    /// Build the modules over a caller-provided cache tier and catalog.
    pub fn assemble(cfg: &AppConfig, cache: Arc<dyn CacheTier>, catalog: Arc<ItemCatalog>) -> Self {
        let locks = KeyedLock::new();
        let timeout = cfg.lock.timeout();

        let talents = Arc::new(
            TalentService::new(
                EntityStore::new(cfg.namespaces.talent.clone(), PathScheme::new(cfg.storage.talent_path()), Arc::clone(&cache)),
                locks.clone(),
            )
            .with_lock_timeout(timeout),
        );
        let skills = SkillService::new(
            EntityStore::new(cfg.namespaces.skill.clone(), PathScheme::new(cfg.storage.skill_path()), cache),
            locks.clone(),
            talents.clone(),
            catalog.clone(),
        )
        .with_lock_timeout(timeout);

        info!(
            data_dir = %cfg.storage.data_dir.display(),
            cache_enabled = cfg.cache.enabled,
            lock_timeout_ms = cfg.lock.timeout_ms,
            "services_ready"
        );
        Self { skills, talents, catalog, locks }
    }
}
