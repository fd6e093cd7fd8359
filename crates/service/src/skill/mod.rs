//! Skill ledger: the skills a player has learned, with their power and
//! proficiency. Every operation is a guarded read-modify-write on the
//! player's ledger record.

pub mod power;
pub mod service;

pub use power::skill_power;
pub use service::SkillService;

/// Why a recompute pass did nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    NoLedger,
    NoAffinities,
}

/// What happened to one ledger entry during a recompute pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryOutcome {
    Updated { name: String, old_power: i64, new_power: i64 },
    /// Left unchanged; the pass went on with the next entry.
    Skipped { name: String, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecomputeReport {
    Skipped(SkipReason),
    Completed { entries: Vec<EntryOutcome> },
}

impl RecomputeReport {
    pub fn updated(&self) -> usize {
        self.entries().iter().filter(|e| matches!(e, EntryOutcome::Updated { .. })).count()
    }

    pub fn skipped_entries(&self) -> usize {
        self.entries().iter().filter(|e| matches!(e, EntryOutcome::Skipped { .. })).count()
    }

    pub fn entries(&self) -> &[EntryOutcome] {
        match self {
            Self::Skipped(_) => &[],
            Self::Completed { entries } => entries,
        }
    }
}
