use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;
use tracing::warn;

use hearth_database::CacheService;
use hearth_database::cache::cooldown_key;

use crate::settings::ActivityKind;

/// Local entries are pruned once the map grows past this size.
const PRUNE_THRESHOLD: usize = 4_096;

type CooldownKey = (u64, u64, ActivityKind);

/// Debounces XP awards per (guild, user, activity).
///
/// With Redis enabled the claim is shared across processes; otherwise, or
/// when Redis errors, an in-process map is used.
#[derive(Clone, Debug)]
pub struct CooldownTracker {
    cache: CacheService,
    local: Arc<Mutex<HashMap<CooldownKey, Instant>>>,
}

impl CooldownTracker {
    pub fn new(cache: CacheService) -> Self {
        Self {
            cache,
            local: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Claim the cooldown window; false while a previous claim is still active.
    pub async fn try_acquire(
        &self,
        guild_id: u64,
        user_id: u64,
        kind: ActivityKind,
        cooldown: Duration,
    ) -> bool {
        if self.cache.is_redis_enabled() {
            let key = cooldown_key(&self.cache, guild_id, user_id, kind.as_str());
            match self.cache.claim_once(&key, cooldown).await {
                Ok(Some(claimed)) => return claimed,
                Ok(None) => {}
                Err(err) => warn!(
                    ?err,
                    cache_key = %key,
                    "cooldown claim failed; falling back to local cooldowns"
                ),
            }
        }

        self.acquire_local((guild_id, user_id, kind), cooldown, Instant::now())
            .await
    }

    async fn acquire_local(&self, key: CooldownKey, cooldown: Duration, now: Instant) -> bool {
        let mut local = self.local.lock().await;

        if local.get(&key).is_some_and(|expires_at| *expires_at > now) {
            return false;
        }

        if local.len() >= PRUNE_THRESHOLD {
            local.retain(|_, expires_at| *expires_at > now);
        }

        local.insert(key, now + cooldown);
        true
    }

    /// Give back a claim whose award could not be stored.
    pub async fn release(&self, guild_id: u64, user_id: u64, kind: ActivityKind) {
        self.forget_remote(guild_id, user_id, kind).await;
        self.local.lock().await.remove(&(guild_id, user_id, kind));
    }

    /// Forget every cooldown held by one user (e.g. after an XP reset).
    pub async fn clear_user(&self, guild_id: u64, user_id: u64) {
        for kind in [ActivityKind::Message, ActivityKind::Voice, ActivityKind::Reaction] {
            self.forget_remote(guild_id, user_id, kind).await;
        }

        let mut local = self.local.lock().await;
        local.retain(|(guild, user, _), _| !(*guild == guild_id && *user == user_id));
    }

    async fn forget_remote(&self, guild_id: u64, user_id: u64, kind: ActivityKind) {
        if !self.cache.is_redis_enabled() {
            return;
        }
        let key = cooldown_key(&self.cache, guild_id, user_id, kind.as_str());
        if let Err(err) = self.cache.del(&key).await {
            warn!(?err, cache_key = %key, "failed to clear cooldown");
        }
    }

    #[cfg(test)]
    async fn tracked(&self) -> usize {
        self.local.lock().await.len()
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use hearth_database::CacheService;

    use super::{CooldownTracker, PRUNE_THRESHOLD};
    use crate::settings::ActivityKind;

    fn tracker() -> CooldownTracker {
        CooldownTracker::new(CacheService::disabled("hearth:test"))
    }

    #[tokio::test]
    async fn second_claim_in_window_fails() {
        let cooldowns = tracker();
        let window = Duration::from_secs(60);
        let start = Instant::now();
        let key = (1, 2, ActivityKind::Message);

        assert!(cooldowns.acquire_local(key, window, start).await);
        assert!(!cooldowns.acquire_local(key, window, start + Duration::from_secs(59)).await);
        assert!(cooldowns.acquire_local(key, window, start + Duration::from_secs(60)).await);
    }

    #[tokio::test]
    async fn keys_are_independent() {
        let cooldowns = tracker();
        let window = Duration::from_secs(60);

        assert!(cooldowns.try_acquire(1, 2, ActivityKind::Message, window).await);
        assert!(!cooldowns.try_acquire(1, 2, ActivityKind::Message, window).await);
        assert!(cooldowns.try_acquire(1, 2, ActivityKind::Reaction, window).await);
        assert!(cooldowns.try_acquire(1, 3, ActivityKind::Message, window).await);
        assert!(cooldowns.try_acquire(9, 2, ActivityKind::Message, window).await);
    }

    #[tokio::test]
    async fn clearing_a_user_releases_their_cooldowns() {
        let cooldowns = tracker();
        let window = Duration::from_secs(60);

        assert!(cooldowns.try_acquire(1, 2, ActivityKind::Message, window).await);
        assert!(cooldowns.try_acquire(1, 3, ActivityKind::Message, window).await);
        cooldowns.clear_user(1, 2).await;

        assert!(cooldowns.try_acquire(1, 2, ActivityKind::Message, window).await);
        assert!(!cooldowns.try_acquire(1, 3, ActivityKind::Message, window).await);
    }

    #[tokio::test]
    async fn released_claim_can_be_taken_again() {
        let cooldowns = tracker();
        let window = Duration::from_secs(60);

        assert!(cooldowns.try_acquire(1, 2, ActivityKind::Message, window).await);
        assert!(cooldowns.try_acquire(1, 2, ActivityKind::Reaction, window).await);
        cooldowns.release(1, 2, ActivityKind::Message).await;

        assert!(cooldowns.try_acquire(1, 2, ActivityKind::Message, window).await);
        assert!(!cooldowns.try_acquire(1, 2, ActivityKind::Reaction, window).await);
    }

    #[tokio::test]
    async fn expired_entries_are_pruned() {
        let cooldowns = tracker();
        let window = Duration::from_secs(1);
        let start = Instant::now();

        for user in 0..PRUNE_THRESHOLD as u64 {
            let key = (1, user, ActivityKind::Message);
            assert!(cooldowns.acquire_local(key, window, start).await);
        }
        assert_eq!(cooldowns.tracked().await, PRUNE_THRESHOLD);

        let later = start + Duration::from_secs(5);
        assert!(cooldowns.acquire_local((2, 0, ActivityKind::Voice), window, later).await);
        assert_eq!(cooldowns.tracked().await, 1);
    }
}
