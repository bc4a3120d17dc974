mod redis_store;

use std::future::Future;
use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::warn;

use redis_store::RedisCacheStore;

/// How long a rendered leaderboard page may be served from cache.
pub const LEADERBOARD_CACHE_TTL: Duration = Duration::from_secs(30);

/// Without Redis every read misses and every write is dropped.
#[derive(Clone, Debug)]
enum CacheBackend {
    Disabled,
    Redis(RedisCacheStore),
}

#[derive(Clone, Debug)]
pub struct CacheService {
    key_prefix: String,
    backend: CacheBackend,
}

impl CacheService {
    pub fn disabled(prefix: impl Into<String>) -> Self {
        Self {
            key_prefix: prefix.into(),
            backend: CacheBackend::Disabled,
        }
    }

    pub fn redis(redis_url: &str, prefix: impl Into<String>) -> anyhow::Result<Self> {
        Ok(Self {
            key_prefix: prefix.into(),
            backend: CacheBackend::Redis(RedisCacheStore::from_url(redis_url)?),
        })
    }

    pub fn is_redis_enabled(&self) -> bool {
        matches!(self.backend, CacheBackend::Redis(_))
    }

    pub fn key(&self, suffix: impl AsRef<str>) -> String {
        format!("{}:{}", self.key_prefix, suffix.as_ref())
    }

    pub async fn ping(&self) -> anyhow::Result<()> {
        match &self.backend {
            CacheBackend::Disabled => Ok(()),
            CacheBackend::Redis(store) => store.ping().await,
        }
    }

    pub async fn get_json<T>(&self, key: &str) -> anyhow::Result<Option<T>>
    where
        T: DeserializeOwned,
    {
        let CacheBackend::Redis(store) = &self.backend else {
            return Ok(None);
        };

        store
            .get(key)
            .await?
            .map(|bytes| {
                serde_json::from_slice(&bytes).map_err(|e| {
                    anyhow::anyhow!("failed to deserialize cache value for `{key}`: {e}")
                })
            })
            .transpose()
    }

    pub async fn set_json<T>(&self, key: &str, value: &T, ttl: Duration) -> anyhow::Result<()>
    where
        T: Serialize,
    {
        let CacheBackend::Redis(store) = &self.backend else {
            return Ok(());
        };

        let payload = serde_json::to_vec(value)
            .map_err(|e| anyhow::anyhow!("failed to serialize cache value for `{key}`: {e}"))?;
        store.set(key, payload, ttl.as_secs().max(1)).await
    }

    pub async fn del(&self, key: &str) -> anyhow::Result<()> {
        match &self.backend {
            CacheBackend::Disabled => Ok(()),
            CacheBackend::Redis(store) => store.del(key).await,
        }
    }

    /// Atomically claim `key` for `ttl`.
    ///
    /// Returns `Some(true)` when this caller took the claim, `Some(false)` when
    /// it is already held, and `None` when no shared cache is configured.
    pub async fn claim_once(&self, key: &str, ttl: Duration) -> anyhow::Result<Option<bool>> {
        match &self.backend {
            CacheBackend::Disabled => Ok(None),
            CacheBackend::Redis(store) => store.set_nx(key, ttl.as_secs().max(1)).await.map(Some),
        }
    }

    pub async fn get_or_load_json<T, F, Fut>(
        &self,
        key: &str,
        ttl: Duration,
        loader: F,
    ) -> anyhow::Result<T>
    where
        T: Serialize + DeserializeOwned + Clone,
        F: FnOnce() -> Fut,
        Fut: Future<Output = anyhow::Result<T>>,
    {
        match self.get_json::<T>(key).await {
            Ok(Some(cached)) => return Ok(cached),
            Ok(None) => {}
            Err(e) => warn!(
                ?e,
                cache_key = key,
                "cache get failed; falling back to database"
            ),
        }

        let loaded = loader().await?;

        if let Err(e) = self.set_json(key, &loaded, ttl).await {
            warn!(
                ?e,
                cache_key = key,
                "cache set failed; returning database value"
            );
        }

        Ok(loaded)
    }
}

pub fn leaderboard_page_key(
    cache: &CacheService,
    guild_id: u64,
    limit: u64,
    offset: u64,
) -> String {
    cache.key(format!("leaderboard:{guild_id}:{limit}:{offset}"))
}

/// Ranked-member count, cached alongside the pages so footers match the rows.
pub fn leaderboard_count_key(cache: &CacheService, guild_id: u64) -> String {
    cache.key(format!("leaderboard:{guild_id}:count"))
}

pub fn cooldown_key(cache: &CacheService, guild_id: u64, user_id: u64, activity: &str) -> String {
    cache.key(format!("cooldown:{activity}:{guild_id}:{user_id}"))
}
