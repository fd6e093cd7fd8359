use std::path::{Path, PathBuf};

use models::EntityId;
use tokio::{fs, io::AsyncWriteExt};
use uuid::Uuid;

use crate::errors::ServiceError;

/// Maps an entity id to `<root>/<id>.json`.
///
/// Ids are restricted to `[A-Za-z0-9_-]`, so the mapping is injective and
/// never escapes `root`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathScheme {
    root: PathBuf,
}

impl PathScheme {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self { Self { root: root.into() } }

    pub fn root(&self) -> &Path { &self.root }

    pub fn path_for(&self, id: &EntityId) -> PathBuf { self.root.join(format!("{id}.json")) }
}

/// Durable byte storage for JSON records.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileStore;

impl FileStore {
    /// Read a whole file. A missing file is `NotFound`, anything else `Io`.
    pub async fn read(&self, path: &Path) -> Result<Vec<u8>, ServiceError> {
        match fs::read(path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(ServiceError::NotFound(path.display().to_string()))
            }
            Err(e) => Err(ServiceError::io(format!("read {}", path.display()), e)),
        }
    }

    /// Replace the file at `path` with `bytes`.
    ///
    /// The data is written and synced to a sibling staging file first and then
    /// renamed over the target, so readers see either the old or the new
    /// content, never a prefix of it.
    pub async fn write(&self, path: &Path, bytes: &[u8]) -> Result<(), ServiceError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| ServiceError::io(format!("create {}", parent.display()), e))?;
        }

        let staging = staging_path(path);
        if let Err(e) = write_synced(&staging, bytes).await {
            let _ = fs::remove_file(&staging).await;
            return Err(ServiceError::io(format!("write {}", staging.display()), e));
        }
        if let Err(e) = fs::rename(&staging, path).await {
            let _ = fs::remove_file(&staging).await;
            return Err(ServiceError::io(format!("rename onto {}", path.display()), e));
        }
        Ok(())
    }
}

async fn write_synced(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = fs::File::create(path).await?;
    file.write_all(bytes).await?;
    file.flush().await?;
    file.sync_all().await
}

fn staging_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(format!(".{}.tmp", Uuid::new_v4().simple()));
    path.with_file_name(name)
}
