mod json;

use std::path::PathBuf;
use std::time::Duration;

use tracing::{info, warn};

pub use json::JsonProgressStore;

use crate::cache::CacheService;
use crate::database::Database;
use crate::impls::progress;
use crate::model::leveling::UserProgress;

/// Inputs for choosing and opening a persistence backend at startup.
#[derive(Clone, Debug)]
pub struct BackendOptions {
    pub database_url: Option<String>,
    pub json_path: PathBuf,
    pub max_connections: u32,
    pub acquire_timeout: Duration,
    pub run_migrations: bool,
}

impl Default for BackendOptions {
    fn default() -> Self {
        Self {
            database_url: None,
            json_path: PathBuf::from("leaderboard.json"),
            max_connections: 5,
            acquire_timeout: Duration::from_secs(10),
            run_migrations: true,
        }
    }
}

/// Per-user progress storage, either Postgres or a JSON file.
#[derive(Clone, Debug)]
pub enum ProgressStore {
    Postgres(Database),
    Json(JsonProgressStore),
}

impl ProgressStore {
    /// Open Postgres when a URL is configured and reachable, otherwise fall
    /// back to the JSON file.
    ///
    /// Only a failure to open the JSON fallback itself is returned as an error.
    pub async fn open(options: &BackendOptions, cache: CacheService) -> anyhow::Result<Self> {
        match options.database_url.as_deref().map(str::trim) {
            Some(url) if !url.is_empty() => match Database::connect(url, options, cache).await {
                Ok(db) => return Ok(Self::Postgres(db)),
                Err(err) => warn!(
                    ?err,
                    path = %options.json_path.display(),
                    "Postgres unavailable; falling back to JSON storage."
                ),
            },
            _ => info!(
                path = %options.json_path.display(),
                "DATABASE_URL not set; using JSON storage."
            ),
        }

        let store = JsonProgressStore::open(&options.json_path).await?;
        Ok(Self::Json(store))
    }

    pub fn is_postgres(&self) -> bool {
        matches!(self, Self::Postgres(_))
    }

    pub fn backend_name(&self) -> &'static str {
        match self {
            Self::Postgres(_) => "postgres",
            Self::Json(_) => "json",
        }
    }

    pub async fn get(&self, guild_id: u64, user_id: u64) -> anyhow::Result<Option<UserProgress>> {
        match self {
            Self::Postgres(db) => progress::get_progress(db, guild_id, user_id).await,
            Self::Json(store) => Ok(store.get(guild_id, user_id).await),
        }
    }

    /// Atomically read, modify and write one user's progress, creating it on
    /// first touch. Coins and counters are clamped after `apply` runs.
    ///
    /// The store has no notion of the level curve: `apply` must leave `level`
    /// consistent with `xp`.
    pub async fn update<R, F>(
        &self,
        guild_id: u64,
        user_id: u64,
        apply: F,
    ) -> anyhow::Result<(UserProgress, R)>
    where
        F: FnOnce(&mut UserProgress) -> R + Send,
        R: Send,
    {
        match self {
            Self::Postgres(db) => progress::update_progress(db, guild_id, user_id, apply).await,
            Self::Json(store) => store.update(guild_id, user_id, apply).await,
        }
    }

    pub async fn top(
        &self,
        guild_id: u64,
        limit: u64,
        offset: u64,
    ) -> anyhow::Result<Vec<UserProgress>> {
        match self {
            Self::Postgres(db) => progress::top_progress(db, guild_id, limit, offset).await,
            Self::Json(store) => Ok(store.top(guild_id, limit, offset).await),
        }
    }

    pub async fn count(&self, guild_id: u64) -> anyhow::Result<u64> {
        match self {
            Self::Postgres(db) => progress::count_progress(db, guild_id).await,
            Self::Json(store) => Ok(store.count(guild_id).await),
        }
    }

    pub async fn rank(&self, guild_id: u64, user_id: u64) -> anyhow::Result<Option<u64>> {
        match self {
            Self::Postgres(db) => progress::rank_of(db, guild_id, user_id).await,
            Self::Json(store) => Ok(store.rank(guild_id, user_id).await),
        }
    }

    pub async fn reset(&self, guild_id: u64, user_id: u64) -> anyhow::Result<bool> {
        match self {
            Self::Postgres(db) => progress::delete_progress(db, guild_id, user_id).await,
            Self::Json(store) => store.reset(guild_id, user_id).await,
        }
    }

    /// Release backend resources. JSON writes are already flushed.
    pub async fn close(&self) {
        match self {
            Self::Postgres(db) => {
                db.close().await;
                info!("PostgreSQL pool closed.");
            }
            Self::Json(store) => {
                info!(path = %store.path().display(), "JSON storage closed.");
            }
        }
    }
}
