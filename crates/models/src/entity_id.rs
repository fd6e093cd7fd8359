use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::ModelError;

const MAX_ID_LEN: usize = 64;

/// Stable identifier of a record owner (a player).
///
/// Only ASCII alphanumerics, `-` and `_` are accepted, so an id can be used
/// verbatim as a file stem and as the tail of a `namespace:id` cache key
/// without two ids ever mapping to the same path or key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EntityId(String);

impl EntityId {
    pub fn parse(raw: &str) -> Result<Self, ModelError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(ModelError::validation("entity id must not be empty"));
        }
        if raw.len() > MAX_ID_LEN {
            return Err(ModelError::validation(format!("entity id longer than {MAX_ID_LEN} chars")));
        }
        if !raw.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_') {
            return Err(ModelError::validation(format!("entity id `{raw}` contains unsupported characters")));
        }
        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

impl From<u64> for EntityId {
    fn from(id: u64) -> Self { Self(id.to_string()) }
}

impl FromStr for EntityId {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> { Self::parse(s) }
}

impl TryFrom<String> for EntityId {
    type Error = ModelError;

    fn try_from(value: String) -> Result<Self, Self::Error> { Self::parse(&value) }
}

impl From<EntityId> for String {
    fn from(id: EntityId) -> Self { id.0 }
}
