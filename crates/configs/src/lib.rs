use anyhow::anyhow;
use anyhow::Result;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub namespaces: NamespaceConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub lock: LockConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Where per-player records and the combined item catalog live.
/// Relative module paths are resolved against `data_dir`.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    #[serde(default = "default_skill_dir")]
    pub skill_dir: PathBuf,
    #[serde(default = "default_talent_dir")]
    pub talent_dir: PathBuf,
    #[serde(default = "default_item_catalog")]
    pub item_catalog: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            skill_dir: default_skill_dir(),
            talent_dir: default_talent_dir(),
            item_catalog: default_item_catalog(),
        }
    }
}

/// Cache-key prefixes, one per module. Keys are `<namespace>:<entity id>`.
#[derive(Debug, Clone, Deserialize)]
pub struct NamespaceConfig {
    #[serde(default = "default_skill_namespace")]
    pub skill: String,
    #[serde(default = "default_talent_namespace")]
    pub talent: String,
}

impl Default for NamespaceConfig {
    fn default() -> Self {
        Self { skill: default_skill_namespace(), talent: default_talent_namespace() }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_cache_enabled")]
    pub enabled: bool,
    #[serde(default = "default_max_capacity")]
    pub max_capacity: u64,
    /// 0 keeps entries until capacity eviction.
    #[serde(default)]
    pub ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { enabled: default_cache_enabled(), max_capacity: default_max_capacity(), ttl_secs: 0 }
    }
}

/// 0 means wait for the per-entity lock indefinitely.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct LockConfig {
    #[serde(default)]
    pub timeout_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { format: default_log_format() }
    }
}

fn default_data_dir() -> PathBuf { PathBuf::from("data/birth") }
fn default_skill_dir() -> PathBuf { PathBuf::from("player/skill") }
fn default_talent_dir() -> PathBuf { PathBuf::from("player/talent") }
fn default_item_catalog() -> PathBuf { PathBuf::from("item/allItem.json") }
fn default_skill_namespace() -> String { "xiuxian:player:skillInfo".to_string() }
fn default_talent_namespace() -> String { "xiuxian:player:talentInfo".to_string() }
fn default_cache_enabled() -> bool { true }
fn default_max_capacity() -> u64 { 10_000 }
fn default_log_format() -> String { "compact".to_string() }

pub fn load_default() -> Result<AppConfig> {
    let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
    load_from_file(&path)
}

pub fn load_from_file(path: &str) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)?;
    load_from_str(&content)
}

pub fn load_from_str(content: &str) -> Result<AppConfig> {
    let cfg: AppConfig = toml::from_str(content)?;
    Ok(cfg)
}

impl AppConfig {
    pub fn load_and_validate() -> Result<Self> {
        let mut cfg = load_default()?;
        cfg.normalize_and_validate()?;
        Ok(cfg)
    }

    pub fn normalize_and_validate(&mut self) -> Result<()> {
        // 归一化 storage（支持从环境变量 DATA_DIR 覆盖数据目录）
        self.storage.normalize_from_env();
        self.namespaces.normalize();
        self.storage.validate()?;
        self.namespaces.validate()?;
        self.cache.validate()?;
        Ok(())
    }
}

impl StorageConfig {
    pub fn normalize_from_env(&mut self) {
        if let Ok(dir) = std::env::var("DATA_DIR") {
            if !dir.trim().is_empty() {
                self.data_dir = PathBuf::from(dir);
            }
        }
        if self.data_dir.as_os_str().is_empty() {
            self.data_dir = default_data_dir();
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.skill_dir.as_os_str().is_empty() || self.talent_dir.as_os_str().is_empty() {
            return Err(anyhow!("storage.skill_dir 与 storage.talent_dir 不能为空"));
        }
        if self.skill_path() == self.talent_path() {
            return Err(anyhow!("storage.skill_dir 与 storage.talent_dir 不能指向同一目录"));
        }
        Ok(())
    }

    pub fn skill_path(&self) -> PathBuf { self.data_dir.join(&self.skill_dir) }

    pub fn talent_path(&self) -> PathBuf { self.data_dir.join(&self.talent_dir) }

    pub fn item_catalog_path(&self) -> PathBuf { self.data_dir.join(&self.item_catalog) }
}

impl NamespaceConfig {
    fn normalize(&mut self) {
        self.skill = self.skill.trim().to_string();
        self.talent = self.talent.trim().to_string();
    }

    pub fn validate(&self) -> Result<()> {
        if self.skill.is_empty() || self.talent.is_empty() {
            return Err(anyhow!("namespaces.skill 与 namespaces.talent 不能为空"));
        }
        if self.skill == self.talent {
            return Err(anyhow!("namespaces.skill 与 namespaces.talent 必须不同"));
        }
        Ok(())
    }
}

impl CacheConfig {
    pub fn validate(&self) -> Result<()> {
        if self.enabled && self.max_capacity == 0 {
            return Err(anyhow!("cache.max_capacity 必须 >= 1"));
        }
        Ok(())
    }

    pub fn ttl(&self) -> Option<Duration> {
        (self.ttl_secs > 0).then(|| Duration::from_secs(self.ttl_secs))
    }
}

impl LockConfig {
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_ms > 0).then(|| Duration::from_millis(self.timeout_ms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_yields_defaults() {
        let mut cfg = load_from_str("").expect("parse empty");
        cfg.normalize_and_validate().expect("defaults are valid");
        assert!(cfg.cache.enabled);
        assert_eq!(cfg.cache.ttl(), None);
        assert_eq!(cfg.lock.timeout(), None);
        assert_eq!(cfg.namespaces.skill, "xiuxian:player:skillInfo");
        assert!(cfg.storage.skill_path().ends_with("player/skill"));
    }

    #[test]
    fn sections_override_defaults() {
        let cfg = load_from_str(
            r#"
            [storage]
            data_dir = "/srv/game"
            skill_dir = "skills"

            [cache]
            enabled = false
            ttl_secs = 30

            [lock]
            timeout_ms = 250
            "#,
        )
        .expect("parse");
        assert_eq!(cfg.storage.skill_path(), PathBuf::from("/srv/game/skills"));
        assert_eq!(cfg.storage.talent_path(), PathBuf::from("/srv/game/player/talent"));
        assert!(!cfg.cache.enabled);
        assert_eq!(cfg.cache.ttl(), Some(Duration::from_secs(30)));
        assert_eq!(cfg.lock.timeout(), Some(Duration::from_millis(250)));
    }

    #[test]
    fn rejects_colliding_namespaces() {
        let mut cfg = load_from_str(
            r#"
            [namespaces]
            skill = "player"
            talent = " player "
            "#,
        )
        .expect("parse");
        assert!(cfg.normalize_and_validate().is_err());
    }

    #[test]
    fn rejects_shared_module_directory() {
        let mut cfg = load_from_str(
            r#"
            [storage]
            skill_dir = "player"
            talent_dir = "player"
            "#,
        )
        .expect("parse");
        assert!(cfg.normalize_and_validate().is_err());
    }
}
