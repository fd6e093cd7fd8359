use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use models::SkillBook;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::errors::ServiceError;
use crate::lookup::DefinitionLookup;

/// Read-only view of the combined item catalog (`allItem.json`), indexed by
/// item name. Only entries shaped like skill books are kept.
#[derive(Debug, Clone, Default)]
pub struct ItemCatalog {
    books: HashMap<String, SkillBook>,
}

impl ItemCatalog {
    /// Load the catalog file: a JSON array of item objects.
    ///
    /// A missing file gives an empty catalog; a file that is not a JSON array
    /// is `DataCorrupt`.
    pub async fn load(path: &Path) -> Result<Self, ServiceError> {
        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!(path = %path.display(), "item_catalog_missing");
                return Ok(Self::default());
            }
            Err(e) => return Err(ServiceError::io(format!("read {}", path.display()), e)),
        };
        let items: Vec<Value> = serde_json::from_slice(&bytes)
            .map_err(|e| ServiceError::corrupt(&path.display().to_string(), e))?;
        let catalog = Self::from_items(items);
        info!(path = %path.display(), skill_books = catalog.len(), "item_catalog_loaded");
        Ok(catalog)
    }

    pub fn from_items<I>(items: I) -> Self
    where
        I: IntoIterator<Item = Value>,
    {
        let mut books = HashMap::new();
        for item in items {
            match serde_json::from_value::<SkillBook>(item) {
                // the first definition of a name wins
                Ok(book) => {
                    books.entry(book.name.clone()).or_insert(book);
                }
                Err(e) => debug!(error = %e, "item_not_a_skill_book"),
            }
        }
        Self { books }
    }

    pub fn get(&self, name: &str) -> Option<&SkillBook> { self.books.get(name) }

    pub fn len(&self) -> usize { self.books.len() }

    pub fn is_empty(&self) -> bool { self.books.is_empty() }
}

#[async_trait]
impl DefinitionLookup for ItemCatalog {
    async fn get_definition(&self, name: &str) -> Result<Option<SkillBook>, ServiceError> {
        Ok(self.get(name).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn keeps_only_skill_books() {
        let catalog = ItemCatalog::from_items(vec![
            json!({"name": "技能书：烈焰斩", "power": 50, "spiritualRoot": ["火"], "price": 100}),
            json!({"name": "铁剑", "atk": 10}),
            json!({"name": "技能书：烈焰斩", "power": 99, "spiritualRoot": []}),
        ]);
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.get("技能书：烈焰斩").map(|b| b.power), Some(50));
        assert!(catalog.get("铁剑").is_none());
    }

    #[tokio::test]
    async fn missing_file_is_empty_and_garbage_is_corrupt() -> Result<(), anyhow::Error> {
        let dir = std::env::temp_dir().join(format!("svc_catalog_{}", uuid::Uuid::new_v4()));
        assert!(ItemCatalog::load(&dir.join("allItem.json")).await?.is_empty());

        tokio::fs::create_dir_all(&dir).await?;
        tokio::fs::write(dir.join("allItem.json"), b"{\"not\":\"a list\"}").await?;
        let res = ItemCatalog::load(&dir.join("allItem.json")).await;
        assert!(matches!(res, Err(ServiceError::DataCorrupt { .. })));

        let _ = tokio::fs::remove_dir_all(&dir).await;
        Ok(())
    }
}
