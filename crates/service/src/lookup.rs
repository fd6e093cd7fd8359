use std::collections::BTreeSet;

use async_trait::async_trait;
use models::{EntityId, SkillBook};

use crate::errors::ServiceError;

/// Source of a player's elemental affinities (spiritual roots).
#[async_trait]
pub trait AffinityLookup: Send + Sync {
    /// `None` when the player has no talent record yet.
    async fn get_affinities(&self, id: &EntityId) -> Result<Option<BTreeSet<String>>, ServiceError>;
}

/// Source of item definitions, looked up by full item name.
#[async_trait]
pub trait DefinitionLookup: Send + Sync {
    async fn get_definition(&self, name: &str) -> Result<Option<SkillBook>, ServiceError>;
}
