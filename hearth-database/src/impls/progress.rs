use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::Context as _;

use crate::cache::{LEADERBOARD_CACHE_TTL, leaderboard_count_key, leaderboard_page_key};
use crate::database::Database;
use crate::model::leveling::UserProgress;

#[derive(sqlx::FromRow)]
struct ProgressRow {
    guild_id: i64,
    user_id: i64,
    xp: i64,
    level: i32,
    coins: i64,
    milestone_level: i32,
    message_count: i64,
    voice_minutes: i64,
    updated_at: i64,
}

impl ProgressRow {
    fn into_progress(self) -> anyhow::Result<UserProgress> {
        Ok(UserProgress {
            guild_id: u64::try_from(self.guild_id).context("guild_id row out of u64 range")?,
            user_id: u64::try_from(self.user_id).context("user_id row out of u64 range")?,
            xp: self.xp,
            level: self.level,
            coins: self.coins,
            milestone_level: self.milestone_level,
            message_count: self.message_count,
            voice_minutes: self.voice_minutes,
            updated_at: u64::try_from(self.updated_at).unwrap_or(0),
        })
    }
}

const PROGRESS_COLUMNS: &str = "guild_id, user_id, xp, level, coins, milestone_level, \
                                message_count, voice_minutes, updated_at";

pub async fn get_progress(
    db: &Database,
    guild_id: u64,
    user_id: u64,
) -> anyhow::Result<Option<UserProgress>> {
    let guild_id_i64 = i64::try_from(guild_id).context("guild_id out of i64 range")?;
    let user_id_i64 = i64::try_from(user_id).context("user_id out of i64 range")?;

    let row: Option<ProgressRow> = sqlx::query_as(&format!(
        "SELECT {PROGRESS_COLUMNS} FROM user_progress WHERE guild_id = $1 AND user_id = $2"
    ))
    .bind(guild_id_i64)
    .bind(user_id_i64)
    .fetch_optional(db.pool())
    .await?;

    row.map(ProgressRow::into_progress).transpose()
}

/// Read-modify-write one user's progress inside a transaction.
///
/// The row is created on first touch and held with `FOR UPDATE` while
/// `apply` runs, so concurrent writers for the same user serialize.
pub async fn update_progress<R, F>(
    db: &Database,
    guild_id: u64,
    user_id: u64,
    apply: F,
) -> anyhow::Result<(UserProgress, R)>
where
    F: FnOnce(&mut UserProgress) -> R + Send,
    R: Send,
{
    let guild_id_i64 = i64::try_from(guild_id).context("guild_id out of i64 range")?;
    let user_id_i64 = i64::try_from(user_id).context("user_id out of i64 range")?;

    let mut tx = db.pool().begin().await?;

    sqlx::query(
        "INSERT INTO user_progress (guild_id, user_id)
         VALUES ($1, $2)
         ON CONFLICT (guild_id, user_id) DO NOTHING",
    )
    .bind(guild_id_i64)
    .bind(user_id_i64)
    .execute(&mut *tx)
    .await?;

    let row: ProgressRow = sqlx::query_as(&format!(
        "SELECT {PROGRESS_COLUMNS} FROM user_progress
         WHERE guild_id = $1 AND user_id = $2
         FOR UPDATE"
    ))
    .bind(guild_id_i64)
    .bind(user_id_i64)
    .fetch_one(&mut *tx)
    .await?;

    let mut progress = row.into_progress()?;
    let outcome = apply(&mut progress);
    progress.normalize();
    progress.updated_at = now_unix_secs();

    let updated_at_i64 =
        i64::try_from(progress.updated_at).context("updated_at out of i64 range")?;

    sqlx::query(
        "UPDATE user_progress
         SET xp = $3, level = $4, coins = $5, milestone_level = $6,
             message_count = $7, voice_minutes = $8, updated_at = $9
         WHERE guild_id = $1 AND user_id = $2",
    )
    .bind(guild_id_i64)
    .bind(user_id_i64)
    .bind(progress.xp)
    .bind(progress.level)
    .bind(progress.coins)
    .bind(progress.milestone_level)
    .bind(progress.message_count)
    .bind(progress.voice_minutes)
    .bind(updated_at_i64)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    Ok((progress, outcome))
}

/// Leaderboard slice ordered by XP (ties broken by user id).
pub async fn top_progress(
    db: &Database,
    guild_id: u64,
    limit: u64,
    offset: u64,
) -> anyhow::Result<Vec<UserProgress>> {
    let cache_key = leaderboard_page_key(db.cache(), guild_id, limit, offset);
    db.cache()
        .get_or_load_json(&cache_key, LEADERBOARD_CACHE_TTL, move || async move {
            let guild_id_i64 = i64::try_from(guild_id).context("guild_id out of i64 range")?;
            let limit_i64 = i64::try_from(limit).context("limit out of i64 range")?;
            let offset_i64 = i64::try_from(offset).context("offset out of i64 range")?;

            let rows: Vec<ProgressRow> = sqlx::query_as(&format!(
                "SELECT {PROGRESS_COLUMNS} FROM user_progress
                 WHERE guild_id = $1
                 ORDER BY xp DESC, user_id ASC
                 LIMIT $2 OFFSET $3"
            ))
            .bind(guild_id_i64)
            .bind(limit_i64)
            .bind(offset_i64)
            .fetch_all(db.pool())
            .await?;

            rows.into_iter().map(ProgressRow::into_progress).collect()
        })
        .await
}

/// Ranked-member count, cached under the same TTL as leaderboard pages.
pub async fn count_progress(db: &Database, guild_id: u64) -> anyhow::Result<u64> {
    let cache_key = leaderboard_count_key(db.cache(), guild_id);
    db.cache()
        .get_or_load_json(&cache_key, LEADERBOARD_CACHE_TTL, move || async move {
            let guild_id_i64 = i64::try_from(guild_id).context("guild_id out of i64 range")?;

            let count: i64 =
                sqlx::query_scalar("SELECT COUNT(*) FROM user_progress WHERE guild_id = $1")
                    .bind(guild_id_i64)
                    .fetch_one(db.pool())
                    .await?;

            u64::try_from(count).context("progress count out of u64 range")
        })
        .await
}

/// 1-based leaderboard position, or `None` if the user has no progress yet.
pub async fn rank_of(db: &Database, guild_id: u64, user_id: u64) -> anyhow::Result<Option<u64>> {
    let guild_id_i64 = i64::try_from(guild_id).context("guild_id out of i64 range")?;
    let user_id_i64 = i64::try_from(user_id).context("user_id out of i64 range")?;

    let rank: Option<i64> = sqlx::query_scalar(
        "WITH me AS (
            SELECT xp, user_id FROM user_progress WHERE guild_id = $1 AND user_id = $2
        )
        SELECT 1 + (
            SELECT COUNT(*) FROM user_progress other
            WHERE other.guild_id = $1
              AND (other.xp > me.xp OR (other.xp = me.xp AND other.user_id < me.user_id))
        )
        FROM me",
    )
    .bind(guild_id_i64)
    .bind(user_id_i64)
    .fetch_optional(db.pool())
    .await?;

    rank.map(u64::try_from)
        .transpose()
        .context("rank out of u64 range")
}

pub async fn delete_progress(db: &Database, guild_id: u64, user_id: u64) -> anyhow::Result<bool> {
    let guild_id_i64 = i64::try_from(guild_id).context("guild_id out of i64 range")?;
    let user_id_i64 = i64::try_from(user_id).context("user_id out of i64 range")?;

    let deleted = sqlx::query("DELETE FROM user_progress WHERE guild_id = $1 AND user_id = $2")
        .bind(guild_id_i64)
        .bind(user_id_i64)
        .execute(db.pool())
        .await?
        .rows_affected();

    Ok(deleted > 0)
}

pub fn now_unix_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |duration| duration.as_secs())
}
