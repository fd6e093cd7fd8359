//! Plain data types shared by the service layer and the binaries.
//! - Serialized field names match the records already on disk.
//! - Validation lives next to the type it guards.

pub mod errors;
pub mod entity_id;
pub mod outcome;
pub mod skill;
pub mod talent;

pub use entity_id::EntityId;
pub use errors::ModelError;
pub use outcome::Outcome;
pub use skill::{Skill, SkillBook, SkillLedger, SKILL_BOOK_PREFIX};
pub use talent::TalentInfo;
