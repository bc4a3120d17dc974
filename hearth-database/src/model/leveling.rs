use serde::{Deserialize, Serialize};

/// Upper bound for any coin balance.
pub const MAX_COINS: i64 = 1_000_000;

/// Per-user leveling state inside one guild.
///
/// `level` is derived from `xp` by the leveling engine on every write;
/// `milestone_level` is the highest milestone already rewarded.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProgress {
    pub guild_id: u64,
    pub user_id: u64,
    pub xp: i64,
    pub level: i32,
    pub coins: i64,
    pub milestone_level: i32,
    pub message_count: i64,
    pub voice_minutes: i64,
    pub updated_at: u64,
}

impl UserProgress {
    pub fn new(guild_id: u64, user_id: u64) -> Self {
        Self {
            guild_id,
            user_id,
            ..Default::default()
        }
    }

    /// Clamp counters back into their storable ranges.
    pub fn normalize(&mut self) {
        self.xp = self.xp.max(0);
        self.level = self.level.max(0);
        self.coins = self.coins.clamp(0, MAX_COINS);
        self.milestone_level = self.milestone_level.max(0);
        self.message_count = self.message_count.max(0);
        self.voice_minutes = self.voice_minutes.max(0);
    }
}

#[cfg(test)]
mod tests {
    use super::{MAX_COINS, UserProgress};

    #[test]
    fn normalize_clamps_coins_and_counters() {
        let mut progress = UserProgress::new(1, 2);
        progress.coins = MAX_COINS + 10;
        progress.xp = -4;
        progress.voice_minutes = -1;
        progress.normalize();

        assert_eq!(progress.coins, MAX_COINS);
        assert_eq!(progress.xp, 0);
        assert_eq!(progress.voice_minutes, 0);

        progress.coins = -50;
        progress.normalize();
        assert_eq!(progress.coins, 0);
    }
}
