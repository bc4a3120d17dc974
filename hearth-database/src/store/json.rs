//! JSON file storage used when Postgres is unavailable.
//!
//! The whole leaderboard is held in memory and written through to disk on
//! every mutation. Writes go to a sibling temp file first and are renamed
//! into place so a crash never leaves a half-written leaderboard behind.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context as _;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::impls::progress::now_unix_secs;
use crate::model::leveling::UserProgress;

const FILE_VERSION: u32 = 1;

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
struct StoredProgress {
    xp: i64,
    level: i32,
    coins: i64,
    #[serde(default)]
    milestone_level: i32,
    #[serde(default)]
    message_count: i64,
    #[serde(default)]
    voice_minutes: i64,
    #[serde(default)]
    updated_at: u64,
}

impl StoredProgress {
    fn to_progress(&self, guild_id: u64, user_id: u64) -> UserProgress {
        UserProgress {
            guild_id,
            user_id,
            xp: self.xp,
            level: self.level,
            coins: self.coins,
            milestone_level: self.milestone_level,
            message_count: self.message_count,
            voice_minutes: self.voice_minutes,
            updated_at: self.updated_at,
        }
    }
}

impl From<&UserProgress> for StoredProgress {
    fn from(progress: &UserProgress) -> Self {
        Self {
            xp: progress.xp,
            level: progress.level,
            coins: progress.coins,
            milestone_level: progress.milestone_level,
            message_count: progress.message_count,
            voice_minutes: progress.voice_minutes,
            updated_at: progress.updated_at,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct LeaderboardFile {
    version: u32,
    #[serde(default)]
    guilds: BTreeMap<u64, BTreeMap<u64, StoredProgress>>,
}

impl Default for LeaderboardFile {
    fn default() -> Self {
        Self {
            version: FILE_VERSION,
            guilds: BTreeMap::new(),
        }
    }
}

impl LeaderboardFile {
    /// Guild members ordered the same way as the Postgres leaderboard.
    fn ranked(&self, guild_id: u64) -> Vec<UserProgress> {
        let mut entries: Vec<UserProgress> = self
            .guilds
            .get(&guild_id)
            .map(|users| {
                users
                    .iter()
                    .map(|(user_id, stored)| stored.to_progress(guild_id, *user_id))
                    .collect()
            })
            .unwrap_or_default();

        entries.sort_by(|left, right| {
            right
                .xp
                .cmp(&left.xp)
                .then_with(|| left.user_id.cmp(&right.user_id))
        });
        entries
    }
}

#[derive(Clone, Debug)]
pub struct JsonProgressStore {
    path: PathBuf,
    state: Arc<RwLock<LeaderboardFile>>,
}

impl JsonProgressStore {
    /// Load the leaderboard at `path`, starting empty when the file is missing.
    pub async fn open(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref().to_path_buf();

        let state = match tokio::fs::read(&path).await {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => LeaderboardFile::default(),
            Ok(bytes) => serde_json::from_slice::<LeaderboardFile>(&bytes)
                .with_context(|| format!("failed to parse leaderboard file `{}`", path.display()))?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                info!(path = %path.display(), "leaderboard file not found; starting empty");
                LeaderboardFile::default()
            }
            Err(err) => {
                return Err(err).with_context(|| {
                    format!("failed to read leaderboard file `{}`", path.display())
                });
            }
        };

        Ok(Self {
            path,
            state: Arc::new(RwLock::new(state)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn persist(&self, file: &LeaderboardFile) -> anyhow::Result<()> {
        let payload =
            serde_json::to_vec_pretty(file).context("failed to serialize leaderboard file")?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("failed to create `{}`", parent.display()))?;
        }

        let temp_path = self.path.with_extension("json.tmp");
        tokio::fs::write(&temp_path, payload)
            .await
            .with_context(|| format!("failed to write `{}`", temp_path.display()))?;
        tokio::fs::rename(&temp_path, &self.path)
            .await
            .with_context(|| format!("failed to replace `{}`", self.path.display()))?;

        debug!(path = %self.path.display(), "leaderboard file saved");
        Ok(())
    }

    pub async fn get(&self, guild_id: u64, user_id: u64) -> Option<UserProgress> {
        let file = self.state.read().await;
        file.guilds
            .get(&guild_id)
            .and_then(|users| users.get(&user_id))
            .map(|stored| stored.to_progress(guild_id, user_id))
    }

    /// Read-modify-write one user's progress and flush the file.
    ///
    /// The store-wide write lock is held across the flush, so the file on disk
    /// always reflects writes in the order they were applied. On a failed
    /// flush the in-memory entry is rolled back.
    pub async fn update<R, F>(
        &self,
        guild_id: u64,
        user_id: u64,
        apply: F,
    ) -> anyhow::Result<(UserProgress, R)>
    where
        F: FnOnce(&mut UserProgress) -> R,
    {
        let mut file = self.state.write().await;

        let previous = file
            .guilds
            .get(&guild_id)
            .and_then(|users| users.get(&user_id))
            .cloned();

        let mut progress = previous
            .as_ref()
            .map(|stored| stored.to_progress(guild_id, user_id))
            .unwrap_or_else(|| UserProgress::new(guild_id, user_id));

        let outcome = apply(&mut progress);
        progress.normalize();
        progress.updated_at = now_unix_secs();

        file.guilds
            .entry(guild_id)
            .or_default()
            .insert(user_id, StoredProgress::from(&progress));

        if let Err(err) = self.persist(&file).await {
            let users = file.guilds.entry(guild_id).or_default();
            match previous {
                Some(stored) => {
                    users.insert(user_id, stored);
                }
                None => {
                    users.remove(&user_id);
                }
            }
            return Err(err);
        }

        Ok((progress, outcome))
    }

    pub async fn top(&self, guild_id: u64, limit: u64, offset: u64) -> Vec<UserProgress> {
        let file = self.state.read().await;
        file.ranked(guild_id)
            .into_iter()
            .skip(usize::try_from(offset).unwrap_or(usize::MAX))
            .take(usize::try_from(limit).unwrap_or(usize::MAX))
            .collect()
    }

    pub async fn count(&self, guild_id: u64) -> u64 {
        let file = self.state.read().await;
        file.guilds
            .get(&guild_id)
            .map_or(0, |users| users.len() as u64)
    }

    pub async fn rank(&self, guild_id: u64, user_id: u64) -> Option<u64> {
        let file = self.state.read().await;
        file.ranked(guild_id)
            .iter()
            .position(|entry| entry.user_id == user_id)
            .map(|idx| idx as u64 + 1)
    }

    pub async fn reset(&self, guild_id: u64, user_id: u64) -> anyhow::Result<bool> {
        let mut file = self.state.write().await;

        let Some(removed) = file
            .guilds
            .get_mut(&guild_id)
            .and_then(|users| users.remove(&user_id))
        else {
            return Ok(false);
        };

        if let Err(err) = self.persist(&file).await {
            file.guilds
                .entry(guild_id)
                .or_default()
                .insert(user_id, removed);
            return Err(err);
        }

        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::JsonProgressStore;
    use crate::model::leveling::MAX_COINS;

    #[tokio::test]
    async fn missing_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonProgressStore::open(dir.path().join("leaderboard.json"))
            .await
            .unwrap();

        assert_eq!(store.count(1).await, 0);
        assert!(store.get(1, 2).await.is_none());
        assert!(store.rank(1, 2).await.is_none());
    }

    #[tokio::test]
    async fn updates_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("leaderboard.json");
        let store = JsonProgressStore::open(&path).await.unwrap();

        let (progress, returned) = store
            .update(1, 42, |progress| {
                progress.xp += 120;
                progress.level = 1;
                progress.coins = MAX_COINS * 2;
                "done"
            })
            .await
            .unwrap();
        assert_eq!(returned, "done");
        assert_eq!(progress.xp, 120);
        assert_eq!(progress.coins, MAX_COINS);

        let reopened = JsonProgressStore::open(&path).await.unwrap();
        let loaded = reopened.get(1, 42).await.unwrap();
        assert_eq!(loaded.xp, 120);
        assert_eq!(loaded.coins, MAX_COINS);
        assert!(!dir.path().join("leaderboard.json.tmp").exists());
    }

    #[tokio::test]
    async fn leaderboard_orders_by_xp_then_user_id() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonProgressStore::open(dir.path().join("lb.json"))
            .await
            .unwrap();

        let rows = [(5_u64, 100_i64, 1), (3, 300, 2), (4, 100, 1), (9, 50, 0)];
        for (user_id, xp, level) in rows {
            store
                .update(7, user_id, |progress| {
                    progress.xp = xp;
                    progress.level = level;
                })
                .await
                .unwrap();
        }
        store
            .update(8, 1, |progress| {
                progress.xp = 999;
                progress.level = 4;
            })
            .await
            .unwrap();

        let top: Vec<u64> = store.top(7, 10, 0).await.iter().map(|p| p.user_id).collect();
        assert_eq!(top, vec![3, 4, 5, 9]);

        let page: Vec<u64> = store.top(7, 2, 1).await.iter().map(|p| p.user_id).collect();
        assert_eq!(page, vec![4, 5]);

        assert_eq!(store.count(7).await, 4);
        assert_eq!(store.rank(7, 5).await, Some(3));
        assert_eq!(store.rank(8, 1).await, Some(1));
    }

    #[tokio::test]
    async fn reset_removes_user() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonProgressStore::open(dir.path().join("lb.json"))
            .await
            .unwrap();

        store.update(1, 2, |progress| progress.coins = 10).await.unwrap();
        assert!(store.reset(1, 2).await.unwrap());
        assert!(!store.reset(1, 2).await.unwrap());
        assert!(store.get(1, 2).await.is_none());
    }

    #[tokio::test]
    async fn concurrent_updates_are_not_lost() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonProgressStore::open(dir.path().join("lb.json"))
            .await
            .unwrap();

        let mut handles = Vec::new();
        for _ in 0..20 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store
                    .update(1, 2, |progress| progress.message_count += 5)
                    .await
                    .unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(store.get(1, 2).await.unwrap().message_count, 100);
    }

    #[tokio::test]
    async fn corrupt_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lb.json");
        std::fs::write(&path, b"{ not json").unwrap();

        assert!(JsonProgressStore::open(&path).await.is_err());
    }
}
