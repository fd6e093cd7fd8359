use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use models::{EntityId, Outcome, Skill, SkillBook, SkillLedger};
use tracing::{error, info, instrument};

use super::power::skill_power;
use super::{EntryOutcome, RecomputeReport, SkipReason};
use crate::errors::ServiceError;
use crate::lookup::{AffinityLookup, DefinitionLookup};
use crate::storage::{EntityStore, KeyedLock};

/// Skill ledger operations.
///
/// Each public method runs entirely inside the keyed lock for
/// `<namespace>:<id>`, so operations on one player are totally ordered and
/// each sees the previous one's write. Different players never wait on each
/// other.
pub struct SkillService {
    store: EntityStore<SkillLedger>,
    locks: KeyedLock,
    lock_timeout: Option<Duration>,
    affinities: Arc<dyn AffinityLookup>,
    definitions: Arc<dyn DefinitionLookup>,
}

impl SkillService {
    pub fn new(
        store: EntityStore<SkillLedger>,
        locks: KeyedLock,
        affinities: Arc<dyn AffinityLookup>,
        definitions: Arc<dyn DefinitionLookup>,
    ) -> Self {
        Self { store, locks, lock_timeout: None, affinities, definitions }
    }

    /// Bound how long an operation waits for the player's lock.
    pub fn with_lock_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.lock_timeout = timeout;
        self
    }

    pub fn store(&self) -> &EntityStore<SkillLedger> { &self.store }

    async fn guarded<F, Fut, T>(&self, id: &EntityId, op: F) -> Result<T, ServiceError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, ServiceError>>,
    {
        let key = self.store.cache_key(id);
        self.locks.with_lock_timeout(&key, self.lock_timeout, op).await?
    }

    /// The player's ledger; `None` if the player has none.
    pub async fn fetch(&self, id: &EntityId) -> Result<Option<SkillLedger>, ServiceError> {
        self.guarded(id, || async move { self.store.load(id).await }).await
    }

    /// The player's learned skills; `None` if the player has no ledger.
    pub async fn fetch_all(&self, id: &EntityId) -> Result<Option<Vec<Skill>>, ServiceError> {
        self.guarded(id, || async move { Ok(self.store.load(id).await?.map(|ledger| ledger.skill_list)) })
            .await
    }

    /// Create an empty ledger unless one exists. Returns whether it was created.
    pub async fn init(&self, id: &EntityId) -> Result<bool, ServiceError> {
        self.guarded(id, || async move {
            if self.store.load(id).await?.is_some() {
                return Ok(false);
            }
            self.store.store(id, &SkillLedger::new()).await?;
            info!(player = %id, "skill_ledger_created");
            Ok(true)
        })
        .await
    }

    /// Overwrite the whole ledger.
    pub async fn replace(&self, id: &EntityId, ledger: &SkillLedger) -> Result<(), ServiceError> {
        ledger.validate()?;
        self.guarded(id, || async move { self.store.store(id, ledger).await }).await
    }

    /// Study a skill book: learn the skill, or deepen it if already learned.
    #[instrument(skip_all, fields(player = %id, book = %book.name))]
    pub async fn learn(&self, id: &EntityId, book: &SkillBook) -> Result<Outcome, ServiceError> {
        book.validate()?;
        self.guarded(id, || async move {
            let mut ledger = self.load_existing(id).await?;
            let name = book.skill_name();

            let message = match ledger.position(name) {
                Some(idx) => {
                    let skill = &mut ledger.skill_list[idx];
                    skill.deepen()?;
                    info!(skill = name, power = skill.power, proficiency = skill.proficiency, "skill_deepened");
                    format!("对技能『{name} 』的了解更深入了！")
                }
                None => {
                    let affinities = self.affinities.get_affinities(id).await?.unwrap_or_default();
                    let power = skill_power(book, &affinities)
                        .ok_or_else(|| ServiceError::invalid(format!("power of `{}` is out of range", book.name)))?;
                    ledger.skill_list.push(Skill::learned(name, power));
                    info!(skill = name, power, "skill_learned");
                    format!("新技能『{name} 』学习成功！")
                }
            };

            self.store.store(id, &ledger).await?;
            Ok(Outcome::success([message]))
        })
        .await
    }

    /// Forget a learned skill. Forgetting an unknown skill is a failed
    /// outcome, not an error, and writes nothing.
    #[instrument(skip_all, fields(player = %id, skill = %name))]
    pub async fn forget(&self, id: &EntityId, name: &str) -> Result<Outcome, ServiceError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ServiceError::invalid("skill name must not be empty"));
        }
        self.guarded(id, || async move {
            let mut ledger = self.load_existing(id).await?;
            // first match by position; a hand-edited file may repeat a name
            let Some(idx) = ledger.position(name) else {
                return Ok(Outcome::failure([format!("没有学习技能『{name} 』！")]));
            };
            ledger.skill_list.remove(idx);

            self.store.store(id, &ledger).await?;
            info!(skill = name, "skill_forgotten");
            Ok(Outcome::success([format!("成功忘掉技能『{name} 』！")]))
        })
        .await
    }

    /// Recompute every skill's power from its book and the player's current
    /// affinities, keeping proficiency.
    ///
    /// Best effort: a player without ledger or affinities is skipped, and an
    /// entry whose book cannot be resolved is left as is while the rest of the
    /// pass continues. The ledger is written once, after the pass.
    #[instrument(skip_all, fields(player = %id))]
    pub async fn recompute_all(&self, id: &EntityId) -> Result<RecomputeReport, ServiceError> {
        self.guarded(id, || async move {
            let Some(mut ledger) = self.store.load(id).await? else {
                return Ok(RecomputeReport::Skipped(SkipReason::NoLedger));
            };
            let Some(affinities) = self.affinities.get_affinities(id).await? else {
                return Ok(RecomputeReport::Skipped(SkipReason::NoAffinities));
            };

            let mut entries = Vec::with_capacity(ledger.len());
            for skill in ledger.skill_list.iter_mut() {
                let book_name = SkillBook::book_name_for(&skill.name);
                let book = match self.definitions.get_definition(&book_name).await {
                    Ok(Some(book)) => book,
                    Ok(None) => {
                        error!(skill = %skill.name, "skill_refresh_failed_definition_missing");
                        entries.push(EntryOutcome::Skipped { name: skill.name.clone(), reason: format!("{book_name} not found") });
                        continue;
                    }
                    Err(e) => {
                        error!(skill = %skill.name, error = %e, "skill_refresh_failed");
                        entries.push(EntryOutcome::Skipped { name: skill.name.clone(), reason: e.to_string() });
                        continue;
                    }
                };

                let Some(power) = skill_power(&book, &affinities)
                    .and_then(|power| power.checked_add(i64::from(skill.proficiency)))
                else {
                    error!(skill = %skill.name, "skill_refresh_failed_power_out_of_range");
                    entries.push(EntryOutcome::Skipped { name: skill.name.clone(), reason: "power out of range".to_string() });
                    continue;
                };
                let old_power = skill.power;
                skill.power = power;
                entries.push(EntryOutcome::Updated { name: skill.name.clone(), old_power, new_power: skill.power });
            }

            self.store.store(id, &ledger).await?;
            info!(entries = entries.len(), "skill_ledger_recomputed");
            Ok(RecomputeReport::Completed { entries })
        })
        .await
    }

    async fn load_existing(&self, id: &EntityId) -> Result<SkillLedger, ServiceError> {
        self.store
            .load(id)
            .await?
            .ok_or_else(|| ServiceError::invalid(format!("player {id} has no skill ledger")))
    }
}
