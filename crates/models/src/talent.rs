use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Talent record of a player. Only the spiritual roots (elemental affinities)
/// are interpreted here; every other field is carried through untouched so a
/// rewrite never drops data owned by other code.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TalentInfo {
    #[serde(rename = "spiritualRoot", default)]
    pub spiritual_root: Vec<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl TalentInfo {
    pub fn affinities(&self) -> BTreeSet<String> {
        self.spiritual_root.iter().cloned().collect()
    }
}
