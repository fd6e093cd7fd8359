//! Environment/runtime helpers
//!
//! Sanity checks to ensure expected directories exist at startup.

use std::path::Path;
use tracing::warn;

/// Ensure the data directory exists; warn when the item catalog is missing.
pub async fn ensure_env(data_dir: &Path, item_catalog: &Path) -> anyhow::Result<()> {
    tokio::fs::create_dir_all(data_dir)
        .await
        .map_err(|e| anyhow::anyhow!("cannot create {}: {e}", data_dir.display()))?;
    if tokio::fs::metadata(item_catalog).await.is_err() {
        warn!(item_catalog = %item_catalog.display(), "item catalog not found; skill recompute will skip every entry");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn ensure_env_creates_missing_data_dir() -> Result<(), anyhow::Error> {
        let root = std::env::temp_dir().join(format!("common_env_{}", uuid::Uuid::new_v4()));
        let data_dir = root.join("birth");
        ensure_env(&data_dir, &root.join("allItem.json")).await?;
        assert!(tokio::fs::metadata(&data_dir).await?.is_dir());

        let _ = tokio::fs::remove_dir_all(&root).await;
        Ok(())
    }
}
