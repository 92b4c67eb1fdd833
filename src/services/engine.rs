//! Achievement & Streak Evaluation Engine.
//!
//! The engine is an explicit service object owning the decoded catalog,
//! the user's unlock state and the cached point balance. Handlers load
//! one per request, feed it the freshly recomputed activity value, and
//! return whatever it unlocked. "Today" is always an injected parameter,
//! never read from the ambient clock inside the evaluators.

use std::collections::HashMap;

use chrono::{NaiveDate, Utc};
use sea_orm::sea_query::OnConflict;
use sea_orm::*;
use serde::Serialize;

use super::catalog::{AchievementKind, CatalogEntry, Condition};
use super::{points, ServiceError};
use crate::models::{achievement, user_achievement};

/// Unlocks needed within one calendar day to trigger the daily-burst
/// meta rule.
pub const DAILY_BURST_THRESHOLD: u64 = 10;
/// Total unlocks needed to trigger the completion meta rule.
pub const COMPLETION_THRESHOLD: u64 = 60;

/// The meta achievements are located by exact display name; the catalog
/// schema carries no meta_rule tag. Renaming these rows breaks the rules.
pub const DAILY_BURST_NAME: &str = "Überfliegerin";
pub const COMPLETION_NAME: &str = "bro zieht durch";

/// A freshly unlocked achievement, as reported back to the caller (the
/// UI shows these as popups).
#[derive(Debug, Clone, Serialize)]
pub struct UnlockedAchievement {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub rarity: String,
    pub reward_points: i64,
    pub unlocked_at: String,
}

pub struct AchievementEngine {
    user_id: String,
    entries: Vec<CatalogEntry>,
    points: i64,
}

impl AchievementEngine {
    /// Loads the full catalog plus the user's unlocks and balance.
    /// A failed balance read falls back to 0 rather than failing the
    /// load; the catalog and unlock reads are required.
    pub async fn load(db: &DatabaseConnection, user_id: &str) -> Result<Self, ServiceError> {
        let models = achievement::Entity::find()
            .order_by_asc(achievement::Column::Id)
            .all(db)
            .await?;
        let unlocks = user_achievement::Entity::find()
            .filter(user_achievement::Column::UserId.eq(user_id))
            .all(db)
            .await?;
        let unlocked_at: HashMap<i32, String> = unlocks
            .into_iter()
            .map(|u| (u.achievement_id, u.achieved_at))
            .collect();

        let mut entries = Vec::with_capacity(models.len());
        for model in &models {
            if let Some(mut entry) = CatalogEntry::from_model(model) {
                if let Some(at) = unlocked_at.get(&entry.id) {
                    entry.unlocked = true;
                    entry.unlocked_at = Some(at.clone());
                }
                entries.push(entry);
            }
        }

        let points = match points::balance(db, user_id).await {
            Ok(p) => p,
            Err(e) => {
                tracing::warn!("failed to load point balance for {}: {}", user_id, e);
                0
            }
        };

        Ok(Self {
            user_id: user_id.to_owned(),
            entries,
            points,
        })
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn unlocked_count(&self) -> u64 {
        self.entries.iter().filter(|e| e.unlocked).count() as u64
    }

    pub fn total_count(&self) -> u64 {
        self.entries.len() as u64
    }

    pub fn points(&self) -> i64 {
        self.points
    }

    /// Threshold Evaluator: unlocks every not-yet-unlocked achievement of
    /// `kind` whose condition is satisfied by `current` - all of them in
    /// catalog order, so setting a streak straight to 7 fires the 1-, 3-
    /// and 7-day achievements in one pass. A failure on one unlock is
    /// logged and does not stop the rest of the batch.
    pub async fn check_thresholds(
        &mut self,
        db: &DatabaseConnection,
        kind: AchievementKind,
        current: i64,
        today: NaiveDate,
    ) -> Vec<UnlockedAchievement> {
        let due: Vec<i32> = self
            .entries
            .iter()
            .filter(|e| !e.unlocked && e.kind == kind && e.condition.satisfied_by(kind, current))
            .map(|e| e.id)
            .collect();

        let mut batch = Vec::new();
        for id in due {
            match self.unlock_one(db, id).await {
                Ok(Some(u)) => batch.push(u),
                Ok(None) => {}
                Err(e) => tracing::error!("failed to unlock achievement {}: {}", id, e),
            }
        }
        if !batch.is_empty() {
            self.run_meta_rules(db, today, &mut batch).await;
        }
        batch
    }

    /// Date-Gate Evaluator: unlocks every 'date' achievement whose
    /// configured day has arrived. Idempotent, safe to run on every load.
    pub async fn check_date_gates(
        &mut self,
        db: &DatabaseConnection,
        today: NaiveDate,
    ) -> Vec<UnlockedAchievement> {
        let due: Vec<i32> = self
            .entries
            .iter()
            .filter(|e| {
                !e.unlocked
                    && e.kind == AchievementKind::Date
                    && matches!(e.condition, Condition::DateUnlock(gate) if gate <= today)
            })
            .map(|e| e.id)
            .collect();

        let mut batch = Vec::new();
        for id in due {
            match self.unlock_one(db, id).await {
                Ok(Some(u)) => batch.push(u),
                Ok(None) => {}
                Err(e) => tracing::error!("failed to unlock date achievement {}: {}", id, e),
            }
        }
        if !batch.is_empty() {
            self.run_meta_rules(db, today, &mut batch).await;
        }
        batch
    }

    /// Direct unlock by catalog id (admin panel and the meta rules).
    /// Returns the achievement plus any meta achievements that fired off
    /// the back of it; an already-unlocked id yields an empty batch.
    pub async fn unlock(
        &mut self,
        db: &DatabaseConnection,
        id: i32,
        today: NaiveDate,
    ) -> Result<Vec<UnlockedAchievement>, ServiceError> {
        let mut batch = Vec::new();
        if let Some(u) = self.unlock_one(db, id).await? {
            batch.push(u);
            self.run_meta_rules(db, today, &mut batch).await;
        }
        Ok(batch)
    }

    /// Unlock Sink: existence check, conflict-proof insert, one-time
    /// timestamp, reward credit. Returns None when the achievement was
    /// already unlocked (locally or by a concurrent writer).
    async fn unlock_one(
        &mut self,
        db: &DatabaseConnection,
        id: i32,
    ) -> Result<Option<UnlockedAchievement>, ServiceError> {
        let idx = self
            .entries
            .iter()
            .position(|e| e.id == id)
            .ok_or(ServiceError::NotFound)?;
        if self.entries[idx].unlocked {
            return Ok(None);
        }

        // The local flag can be stale: another flow may have unlocked
        // this achievement since the engine loaded.
        let existing = user_achievement::Entity::find()
            .filter(user_achievement::Column::UserId.eq(self.user_id.as_str()))
            .filter(user_achievement::Column::AchievementId.eq(id))
            .one(db)
            .await?;
        if let Some(row) = existing {
            self.entries[idx].unlocked = true;
            self.entries[idx].unlocked_at = Some(row.achieved_at);
            return Ok(None);
        }

        let achieved_at = Utc::now().format("%Y-%m-%dT%H:%M:%S").to_string();
        let row = user_achievement::ActiveModel {
            user_id: Set(self.user_id.clone()),
            achievement_id: Set(id),
            achieved_at: Set(achieved_at.clone()),
            ..Default::default()
        };
        let inserted = user_achievement::Entity::insert(row)
            .on_conflict(
                OnConflict::columns([
                    user_achievement::Column::UserId,
                    user_achievement::Column::AchievementId,
                ])
                .do_nothing()
                .to_owned(),
            )
            .exec(db)
            .await;
        match inserted {
            Ok(_) => {}
            // Lost the race against a concurrent unlock; the existing row
            // keeps its timestamp and the reward was already credited.
            Err(DbErr::RecordNotInserted) => {
                let winner = user_achievement::Entity::find()
                    .filter(user_achievement::Column::UserId.eq(self.user_id.as_str()))
                    .filter(user_achievement::Column::AchievementId.eq(id))
                    .one(db)
                    .await?;
                self.entries[idx].unlocked = true;
                self.entries[idx].unlocked_at = winner.map(|w| w.achieved_at);
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        }

        let reward = self.entries[idx].reward_points;
        if reward != 0 {
            // The unlock row is already durable; a failed credit leaves
            // the balance behind until the next action, it does not undo
            // the unlock.
            match points::credit(db, &self.user_id, reward).await {
                Ok(balance) => self.points = balance,
                Err(e) => tracing::error!(
                    "failed to credit {} points for achievement {}: {}",
                    reward,
                    id,
                    e
                ),
            }
        }

        let entry = &mut self.entries[idx];
        entry.unlocked = true;
        entry.unlocked_at = Some(achieved_at.clone());
        tracing::info!("achievement unlocked: {} ({})", entry.name, entry.id);
        Ok(Some(UnlockedAchievement {
            id: entry.id,
            name: entry.name.clone(),
            description: entry.description.clone(),
            rarity: entry.rarity.clone(),
            reward_points: entry.reward_points,
            unlocked_at: achieved_at,
        }))
    }

    /// Meta Evaluator, run after every unlock. A second pass lets one
    /// meta unlock satisfy the other rule; with two fixed rules the loop
    /// is bounded. Errors are logged and never propagate to the action
    /// that triggered the unlock.
    async fn run_meta_rules(
        &mut self,
        db: &DatabaseConnection,
        today: NaiveDate,
        batch: &mut Vec<UnlockedAchievement>,
    ) {
        for _ in 0..2 {
            let before = batch.len();
            self.check_daily_burst(db, today, batch).await;
            self.check_completion(db, batch).await;
            if batch.len() == before {
                break;
            }
        }
    }

    async fn check_daily_burst(
        &mut self,
        db: &DatabaseConnection,
        today: NaiveDate,
        batch: &mut Vec<UnlockedAchievement>,
    ) {
        let Some(id) = self.pending_meta_id(DAILY_BURST_NAME) else {
            return;
        };
        let count = match self.count_unlocked_on(db, today).await {
            Ok(c) => c,
            Err(e) => {
                tracing::error!("failed to count today's unlocks: {}", e);
                return;
            }
        };
        if count >= DAILY_BURST_THRESHOLD {
            match self.unlock_one(db, id).await {
                Ok(Some(u)) => batch.push(u),
                Ok(None) => {}
                Err(e) => tracing::error!("daily-burst meta unlock failed: {}", e),
            }
        }
    }

    async fn check_completion(
        &mut self,
        db: &DatabaseConnection,
        batch: &mut Vec<UnlockedAchievement>,
    ) {
        let Some(id) = self.pending_meta_id(COMPLETION_NAME) else {
            return;
        };
        if self.unlocked_count() >= COMPLETION_THRESHOLD {
            match self.unlock_one(db, id).await {
                Ok(Some(u)) => batch.push(u),
                Ok(None) => {}
                Err(e) => tracing::error!("completion meta unlock failed: {}", e),
            }
        }
    }

    fn pending_meta_id(&self, name: &str) -> Option<i32> {
        self.entries
            .iter()
            .find(|e| e.kind == AchievementKind::Meta && e.name == name && !e.unlocked)
            .map(|e| e.id)
    }

    /// Unlocks whose timestamp falls inside `[today 00:00:00,
    /// today 23:59:59)`. ISO strings compare lexically in time order.
    async fn count_unlocked_on(
        &self,
        db: &DatabaseConnection,
        today: NaiveDate,
    ) -> Result<u64, ServiceError> {
        let day = today.format("%Y-%m-%d");
        let count = user_achievement::Entity::find()
            .filter(user_achievement::Column::UserId.eq(self.user_id.as_str()))
            .filter(user_achievement::Column::AchievedAt.gte(format!("{}T00:00:00", day)))
            .filter(user_achievement::Column::AchievedAt.lt(format!("{}T23:59:59", day)))
            .count(db)
            .await?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: i32, kind: AchievementKind, condition: Condition) -> CatalogEntry {
        CatalogEntry {
            id,
            name: format!("achievement-{}", id),
            description: None,
            rarity: "common".to_string(),
            reward_points: 5,
            kind,
            condition,
            unlocked: false,
            unlocked_at: None,
        }
    }

    fn threshold(field: &str, value: i64) -> Condition {
        Condition::Threshold {
            field: field.to_string(),
            value,
        }
    }

    fn engine(entries: Vec<CatalogEntry>) -> AchievementEngine {
        AchievementEngine {
            user_id: "maus-user".to_string(),
            entries,
            points: 0,
        }
    }

    fn due_thresholds(engine: &AchievementEngine, kind: AchievementKind, current: i64) -> Vec<i32> {
        engine
            .entries
            .iter()
            .filter(|e| !e.unlocked && e.kind == kind && e.condition.satisfied_by(kind, current))
            .map(|e| e.id)
            .collect()
    }

    #[test]
    fn single_update_fires_every_reached_threshold() {
        let eng = engine(vec![
            entry(1, AchievementKind::Puzzle, threshold("solved", 1)),
            entry(2, AchievementKind::Puzzle, threshold("solved", 3)),
            entry(3, AchievementKind::Puzzle, threshold("solved", 7)),
            entry(4, AchievementKind::Puzzle, threshold("solved", 30)),
        ]);
        assert_eq!(due_thresholds(&eng, AchievementKind::Puzzle, 7), vec![1, 2, 3]);
    }

    #[test]
    fn unlocked_entries_and_other_kinds_are_skipped() {
        let mut unlocked = entry(1, AchievementKind::Puzzle, threshold("solved", 1));
        unlocked.unlocked = true;
        let eng = engine(vec![
            unlocked,
            entry(2, AchievementKind::Mood, threshold("days", 1)),
            entry(3, AchievementKind::Puzzle, threshold("solved", 2)),
        ]);
        assert_eq!(due_thresholds(&eng, AchievementKind::Puzzle, 5), vec![3]);
    }

    #[test]
    fn message_thresholds_respect_the_condition_field() {
        let eng = engine(vec![
            entry(1, AchievementKind::Message, threshold("messages_read", 10)),
            entry(2, AchievementKind::Message, threshold("streak", 10)),
        ]);
        assert_eq!(due_thresholds(&eng, AchievementKind::Message, 12), vec![1]);
    }

    #[test]
    fn pending_meta_lookup_is_by_exact_name() {
        let mut burst = entry(1, AchievementKind::Meta, Condition::Unsatisfiable);
        burst.name = DAILY_BURST_NAME.to_string();
        let mut done = entry(2, AchievementKind::Meta, Condition::Unsatisfiable);
        done.name = COMPLETION_NAME.to_string();
        done.unlocked = true;
        let eng = engine(vec![burst, done]);

        assert_eq!(eng.pending_meta_id(DAILY_BURST_NAME), Some(1));
        // Already unlocked -> no longer pending.
        assert_eq!(eng.pending_meta_id(COMPLETION_NAME), None);
        assert_eq!(eng.pending_meta_id("Ueberfliegerin"), None);
    }
}
