use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, info};

use hearth_database::{ProgressStore, UserProgress};

use crate::accumulator::roll_xp;
use crate::cooldown::CooldownTracker;
use crate::curve::level_for_xp;
use crate::rewards::{LevelChange, adjust_coins, apply_xp, set_xp};
use crate::settings::{ActivityKind, XpSettings};

const LOCK_PRUNE_THRESHOLD: usize = 1_024;

/// Result of an activity that earned XP.
#[derive(Clone, Debug)]
pub struct ActivityOutcome {
    pub kind: ActivityKind,
    pub xp_gained: i64,
    pub progress: UserProgress,
    pub change: LevelChange,
}

/// One leaderboard page with 1-based positions.
#[derive(Clone, Debug)]
pub struct LeaderboardPage {
    pub entries: Vec<(u64, UserProgress)>,
    pub page: u64,
    pub total_pages: u64,
    pub total_users: u64,
}

/// Per-user async locks so a single user's updates never interleave.
#[derive(Clone, Debug, Default)]
struct UserLocks {
    slots: Arc<Mutex<HashMap<(u64, u64), Arc<Mutex<()>>>>>,
}

impl UserLocks {
    async fn lock(&self, guild_id: u64, user_id: u64) -> OwnedMutexGuard<()> {
        let slot = {
            let mut slots = self.slots.lock().await;
            if slots.len() >= LOCK_PRUNE_THRESHOLD {
                slots.retain(|_, slot| Arc::strong_count(slot) > 1);
            }
            slots.entry((guild_id, user_id)).or_default().clone()
        };
        slot.lock_owned().await
    }
}

#[derive(Clone, Debug)]
pub struct LevelingEngine {
    store: ProgressStore,
    settings: Arc<XpSettings>,
    cooldowns: CooldownTracker,
    locks: UserLocks,
}

impl LevelingEngine {
    pub fn new(store: ProgressStore, settings: XpSettings, cooldowns: CooldownTracker) -> Self {
        Self {
            store,
            settings: Arc::new(settings),
            cooldowns,
            locks: UserLocks::default(),
        }
    }

    pub fn settings(&self) -> &XpSettings {
        &self.settings
    }

    pub fn store(&self) -> &ProgressStore {
        &self.store
    }

    /// Turn one activity into XP, levels and milestone coins.
    ///
    /// Returns `Ok(None)` while the (user, activity) cooldown is active.
    pub async fn record_activity(
        &self,
        guild_id: u64,
        user_id: u64,
        kind: ActivityKind,
    ) -> anyhow::Result<Option<ActivityOutcome>> {
        let cooldown = self.settings.cooldown_for(kind);
        if !self
            .cooldowns
            .try_acquire(guild_id, user_id, kind, cooldown)
            .await
        {
            debug!(guild_id, user_id, %kind, "activity on cooldown");
            return Ok(None);
        }

        let xp_gained = roll_xp(&self.settings, kind, &mut rand::rng());
        let voice_minutes = self.settings.voice_minutes_per_tick();

        let _guard = self.locks.lock(guild_id, user_id).await;
        let stored = self
            .update_progress(guild_id, user_id, move |progress| {
                match kind {
                    ActivityKind::Message => {
                        progress.message_count = progress.message_count.saturating_add(1);
                    }
                    ActivityKind::Voice => {
                        progress.voice_minutes =
                            progress.voice_minutes.saturating_add(voice_minutes);
                    }
                    ActivityKind::Reaction => {}
                }
                apply_xp(progress, xp_gained)
            })
            .await;
        let (progress, change) = match stored {
            Ok(stored) => stored,
            Err(err) => {
                self.cooldowns.release(guild_id, user_id, kind).await;
                return Err(err);
            }
        };

        if change.leveled_up() {
            info!(
                guild_id,
                user_id,
                old_level = change.old_level,
                new_level = change.new_level,
                coins_granted = change.coins_granted,
                "user leveled up"
            );
        }

        Ok(Some(ActivityOutcome {
            kind,
            xp_gained,
            progress,
            change,
        }))
    }

    /// Store write that keeps `level` derived from `xp` whatever `apply` does.
    async fn update_progress<R, F>(
        &self,
        guild_id: u64,
        user_id: u64,
        apply: F,
    ) -> anyhow::Result<(UserProgress, R)>
    where
        F: FnOnce(&mut UserProgress) -> R + Send,
        R: Send,
    {
        self.store
            .update(guild_id, user_id, move |progress| {
                let outcome = apply(progress);
                progress.level = level_for_xp(progress.xp.max(0));
                outcome
            })
            .await
    }

    pub async fn profile(
        &self,
        guild_id: u64,
        user_id: u64,
    ) -> anyhow::Result<Option<UserProgress>> {
        self.store.get(guild_id, user_id).await
    }

    pub async fn rank(&self, guild_id: u64, user_id: u64) -> anyhow::Result<Option<u64>> {
        self.store.rank(guild_id, user_id).await
    }

    /// Fetch a 1-based leaderboard page; out-of-range pages come back empty.
    pub async fn leaderboard_page(
        &self,
        guild_id: u64,
        page: u64,
        per_page: u64,
    ) -> anyhow::Result<LeaderboardPage> {
        let per_page = per_page.max(1);
        let page = page.max(1);
        let total_users = self.store.count(guild_id).await?;
        let total_pages = total_users.div_ceil(per_page).max(1);
        let offset = (page - 1).saturating_mul(per_page);

        let entries = self
            .store
            .top(guild_id, per_page, offset)
            .await?
            .into_iter()
            .enumerate()
            .map(|(idx, progress)| (offset + idx as u64 + 1, progress))
            .collect();

        Ok(LeaderboardPage {
            entries,
            page,
            total_pages,
            total_users,
        })
    }

    /// Add (or with a negative delta, remove) coins; returns the applied delta.
    pub async fn grant_coins(
        &self,
        guild_id: u64,
        user_id: u64,
        delta: i64,
    ) -> anyhow::Result<(UserProgress, i64)> {
        let _guard = self.locks.lock(guild_id, user_id).await;
        self.update_progress(guild_id, user_id, move |progress| {
            adjust_coins(progress, delta)
        })
        .await
    }

    pub async fn set_xp(
        &self,
        guild_id: u64,
        user_id: u64,
        xp: i64,
    ) -> anyhow::Result<(UserProgress, LevelChange)> {
        let _guard = self.locks.lock(guild_id, user_id).await;
        let result = self
            .update_progress(guild_id, user_id, move |progress| set_xp(progress, xp))
            .await?;
        info!(guild_id, user_id, xp, level = result.0.level, "xp overwritten");
        Ok(result)
    }

    /// Drop a user's progress entirely. Milestones become claimable again.
    pub async fn reset_user(&self, guild_id: u64, user_id: u64) -> anyhow::Result<bool> {
        let _guard = self.locks.lock(guild_id, user_id).await;
        let removed = self.store.reset(guild_id, user_id).await?;
        self.cooldowns.clear_user(guild_id, user_id).await;
        if removed {
            info!(guild_id, user_id, "progress reset");
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::time::Duration;

    use hearth_database::{BackendOptions, CacheService, MAX_COINS, ProgressStore};

    use super::LevelingEngine;
    use crate::cooldown::CooldownTracker;
    use crate::curve::{level_for_xp, total_xp_for_level};
    use crate::settings::{ActivityKind, XpSettings};

    fn fixed_settings() -> XpSettings {
        XpSettings {
            message_xp_min: 20,
            message_xp_max: 20,
            message_cooldown: Duration::from_secs(3_600),
            ..Default::default()
        }
    }

    async fn engine(dir: &tempfile::TempDir) -> LevelingEngine {
        engine_at(dir.path().join("leaderboard.json")).await
    }

    async fn engine_at(json_path: PathBuf) -> LevelingEngine {
        let options = BackendOptions {
            json_path,
            ..Default::default()
        };
        let cache = CacheService::disabled("hearth:test");
        let store = ProgressStore::open(&options, cache.clone()).await.unwrap();
        LevelingEngine::new(store, fixed_settings(), CooldownTracker::new(cache))
    }

    #[tokio::test]
    async fn message_awards_xp_then_cools_down() {
        let dir = tempfile::tempdir().unwrap();
        let engine = engine(&dir).await;

        let outcome = engine
            .record_activity(1, 2, ActivityKind::Message)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(outcome.xp_gained, 20);
        assert_eq!(outcome.progress.xp, 20);
        assert_eq!(outcome.progress.message_count, 1);

        assert!(engine
            .record_activity(1, 2, ActivityKind::Message)
            .await
            .unwrap()
            .is_none());

        let reaction = engine
            .record_activity(1, 2, ActivityKind::Reaction)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(reaction.progress.xp, 25);
        assert_eq!(reaction.progress.message_count, 1);
    }

    #[tokio::test]
    async fn voice_ticks_count_minutes() {
        let dir = tempfile::tempdir().unwrap();
        let engine = engine(&dir).await;

        let outcome = engine
            .record_activity(1, 2, ActivityKind::Voice)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(outcome.progress.xp, 10);
        assert_eq!(outcome.progress.voice_minutes, 1);
    }

    #[tokio::test]
    async fn crossing_a_milestone_pays_coins() {
        let dir = tempfile::tempdir().unwrap();
        let engine = engine(&dir).await;

        engine
            .set_xp(1, 2, total_xp_for_level(5) - 10)
            .await
            .unwrap();
        let outcome = engine
            .record_activity(1, 2, ActivityKind::Message)
            .await
            .unwrap()
            .unwrap();

        assert!(outcome.change.leveled_up());
        assert_eq!(outcome.change.new_level, 5);
        assert_eq!(outcome.change.top_reward().map(|m| m.role_name), Some("Spark"));
        assert_eq!(outcome.progress.coins, 50);
        assert_eq!(outcome.progress.level, 5);
    }

    #[tokio::test]
    async fn coin_grants_are_clamped() {
        let dir = tempfile::tempdir().unwrap();
        let engine = engine(&dir).await;

        let (progress, applied) = engine.grant_coins(1, 2, MAX_COINS + 1).await.unwrap();
        assert_eq!(progress.coins, MAX_COINS);
        assert_eq!(applied, MAX_COINS);

        let (progress, applied) = engine.grant_coins(1, 2, -5).await.unwrap();
        assert_eq!(progress.coins, MAX_COINS - 5);
        assert_eq!(applied, -5);
    }

    #[tokio::test]
    async fn concurrent_activity_is_serialized_per_user() {
        let dir = tempfile::tempdir().unwrap();
        let engine = engine(&dir).await;

        let mut handles = Vec::new();
        for user_id in 0..10_u64 {
            for _ in 0..3 {
                let engine = engine.clone();
                handles.push(tokio::spawn(async move {
                    engine.grant_coins(1, user_id, 7).await.unwrap();
                }));
            }
        }
        for handle in handles {
            handle.await.unwrap();
        }

        for user_id in 0..10_u64 {
            let progress = engine.profile(1, user_id).await.unwrap().unwrap();
            assert_eq!(progress.coins, 21);
        }
    }

    #[tokio::test]
    async fn leaderboard_pages_number_positions() {
        let dir = tempfile::tempdir().unwrap();
        let engine = engine(&dir).await;

        for (user_id, xp) in [(1_u64, 500_i64), (2, 300), (3, 900), (4, 100), (5, 700)] {
            engine.set_xp(9, user_id, xp).await.unwrap();
        }

        let first = engine.leaderboard_page(9, 1, 2).await.unwrap();
        assert_eq!(first.total_users, 5);
        assert_eq!(first.total_pages, 3);
        let ids: Vec<(u64, u64)> = first
            .entries
            .iter()
            .map(|(pos, p)| (*pos, p.user_id))
            .collect();
        assert_eq!(ids, vec![(1, 3), (2, 5)]);

        let last = engine.leaderboard_page(9, 3, 2).await.unwrap();
        assert_eq!(last.entries.len(), 1);
        assert_eq!(last.entries[0].0, 5);

        let beyond = engine.leaderboard_page(9, 4, 2).await.unwrap();
        assert!(beyond.entries.is_empty());

        assert_eq!(engine.rank(9, 1).await.unwrap(), Some(3));
    }

    #[tokio::test]
    async fn reset_clears_progress_and_cooldowns() {
        let dir = tempfile::tempdir().unwrap();
        let engine = engine(&dir).await;

        engine
            .record_activity(1, 2, ActivityKind::Message)
            .await
            .unwrap();
        assert!(engine.reset_user(1, 2).await.unwrap());
        assert!(engine.profile(1, 2).await.unwrap().is_none());

        let outcome = engine
            .record_activity(1, 2, ActivityKind::Message)
            .await
            .unwrap();
        assert!(outcome.is_some());
    }

    #[tokio::test]
    async fn failed_write_does_not_hold_the_cooldown() {
        let dir = tempfile::tempdir().unwrap();
        let data_dir = dir.path().join("data");
        let engine = engine_at(data_dir.join("leaderboard.json")).await;

        // A regular file where the data directory should go breaks every flush.
        std::fs::write(&data_dir, b"not a directory").unwrap();
        assert!(engine
            .record_activity(1, 2, ActivityKind::Message)
            .await
            .is_err());
        assert!(engine.profile(1, 2).await.unwrap().is_none());

        std::fs::remove_file(&data_dir).unwrap();
        let retried = engine
            .record_activity(1, 2, ActivityKind::Message)
            .await
            .unwrap();
        assert_eq!(retried.map(|outcome| outcome.progress.xp), Some(20));
    }

    #[tokio::test]
    async fn every_write_keeps_level_derived_from_xp() {
        let dir = tempfile::tempdir().unwrap();
        let engine = engine(&dir).await;

        engine.set_xp(1, 2, total_xp_for_level(12) + 3).await.unwrap();
        engine.grant_coins(1, 2, 40).await.unwrap();
        engine
            .record_activity(1, 2, ActivityKind::Reaction)
            .await
            .unwrap();
        let (lowered, _) = engine.set_xp(1, 2, 150).await.unwrap();
        assert_eq!(lowered.level, level_for_xp(150));

        let stored = engine.profile(1, 2).await.unwrap().unwrap();
        assert_eq!(stored.level, level_for_xp(stored.xp));
        assert_eq!(stored.xp, 150);
    }
}
