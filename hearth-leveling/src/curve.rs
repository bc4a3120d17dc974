/// Highest reachable level; bounds every level computation.
pub const MAX_LEVEL: i32 = 1_000;

/// XP needed to go from `level` to `level + 1`.
pub fn xp_to_next_level(level: i32) -> i64 {
    let level = i64::from(level.clamp(0, MAX_LEVEL));
    5 * level * level + 50 * level + 100
}

/// Cumulative XP at which `level` is reached.
pub fn total_xp_for_level(level: i32) -> i64 {
    // Closed form of sum(5l² + 50l + 100) for l in 0..n.
    let n = i64::from(level.clamp(0, MAX_LEVEL));
    5 * (n - 1) * n * (2 * n - 1) / 6 + 25 * n * (n - 1) + 100 * n
}

/// Level reached with `xp` total experience.
pub fn level_for_xp(xp: i64) -> i32 {
    if xp <= 0 {
        return 0;
    }

    let (mut low, mut high) = (0, MAX_LEVEL);
    while low < high {
        let mid = low + (high - low + 1) / 2;
        if total_xp_for_level(mid) <= xp {
            low = mid;
        } else {
            high = mid - 1;
        }
    }
    low
}

/// Where a user sits inside their current level.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LevelProgress {
    pub level: i32,
    pub xp_into_level: i64,
    pub xp_for_next: i64,
}

impl LevelProgress {
    pub fn from_xp(xp: i64) -> Self {
        let xp = xp.max(0);
        let level = level_for_xp(xp);
        Self {
            level,
            xp_into_level: xp - total_xp_for_level(level),
            xp_for_next: xp_to_next_level(level),
        }
    }
}
