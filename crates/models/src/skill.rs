use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::errors::ModelError;

/// Prefix carried by skill-book item names in the item catalog.
pub const SKILL_BOOK_PREFIX: &str = "技能书：";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Skill {
    pub name: String,
    pub power: i64,
    pub proficiency: u32,
}

impl Skill {
    /// A freshly learned skill: no proficiency yet.
    pub fn learned(name: impl Into<String>, power: i64) -> Self {
        Self { name: name.into(), power, proficiency: 0 }
    }

    /// One more study of an already learned book: flat +1 to both counters.
    ///
    /// Fails without touching the skill when either counter is already at its
    /// maximum.
    pub fn deepen(&mut self) -> Result<(), ModelError> {
        let (Some(proficiency), Some(power)) = (self.proficiency.checked_add(1), self.power.checked_add(1)) else {
            return Err(ModelError::validation(format!("skill `{}` cannot be deepened any further", self.name)));
        };
        self.proficiency = proficiency;
        self.power = power;
        Ok(())
    }
}

/// A player's learned skills, in the order they were learned.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillLedger {
    pub skill_list: Vec<Skill>,
}

impl SkillLedger {
    pub fn new() -> Self { Self::default() }

    pub fn len(&self) -> usize { self.skill_list.len() }

    pub fn is_empty(&self) -> bool { self.skill_list.is_empty() }

    /// Position of the first entry with this name.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.skill_list.iter().position(|s| s.name == name)
    }

    pub fn validate(&self) -> Result<(), ModelError> {
        let mut seen = HashSet::with_capacity(self.skill_list.len());
        for skill in &self.skill_list {
            if skill.name.trim().is_empty() {
                return Err(ModelError::validation("skill name must not be empty"));
            }
            if !seen.insert(skill.name.as_str()) {
                return Err(ModelError::validation(format!("duplicate skill `{}`", skill.name)));
            }
        }
        Ok(())
    }
}

/// Item definition a skill is learned from.
///
/// `spiritual_root` lists the affinities that match the book; every other
/// affinity the learner has counts against it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillBook {
    pub name: String,
    pub power: i64,
    #[serde(rename = "spiritualRoot")]
    pub spiritual_root: Vec<String>,
}

impl SkillBook {
    /// Skill name with the book prefix removed.
    pub fn skill_name(&self) -> &str {
        let name = self.name.trim();
        name.strip_prefix(SKILL_BOOK_PREFIX).unwrap_or(name)
    }

    /// Catalog name of the book that teaches `skill`.
    pub fn book_name_for(skill: &str) -> String { format!("{SKILL_BOOK_PREFIX}{skill}") }

    pub fn validate(&self) -> Result<(), ModelError> {
        if self.skill_name().trim().is_empty() {
            return Err(ModelError::validation(format!("skill book `{}` has no skill name", self.name)));
        }
        Ok(())
    }

    pub fn matches(&self, affinity: &str) -> bool {
        self.spiritual_root.iter().any(|root| root == affinity)
    }
}
