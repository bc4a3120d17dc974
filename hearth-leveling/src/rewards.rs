use hearth_database::{MAX_COINS, UserProgress};

use crate::curve::level_for_xp;
use crate::milestones::{MILESTONES, MilestoneReward, milestones_crossed};

/// What changed when XP was applied to a user.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LevelChange {
    pub old_level: i32,
    pub new_level: i32,
    /// Milestones granted by this change, ascending.
    pub rewards: Vec<MilestoneReward>,
    /// Coins actually credited after clamping to `MAX_COINS`.
    pub coins_granted: i64,
}

impl LevelChange {
    pub fn leveled_up(&self) -> bool {
        self.new_level > self.old_level
    }

    /// The highest milestone reached by this change.
    pub fn top_reward(&self) -> Option<&MilestoneReward> {
        self.rewards.last()
    }
}

/// Add to a coin balance without leaving `[0, MAX_COINS]`.
pub fn clamp_coins(balance: i64, delta: i64) -> i64 {
    balance.saturating_add(delta).clamp(0, MAX_COINS)
}

/// Apply an XP delta, re-derive the level and pay out newly crossed milestones.
pub fn apply_xp(progress: &mut UserProgress, delta: i64) -> LevelChange {
    let old_level = level_for_xp(progress.xp);
    progress.xp = progress.xp.saturating_add(delta).max(0);
    progress.level = level_for_xp(progress.xp);

    let rewards = milestones_crossed(old_level, progress.level, progress.milestone_level);
    let balance_before = progress.coins;
    for reward in &rewards {
        progress.coins = clamp_coins(progress.coins, reward.coins);
    }
    if let Some(top) = rewards.last() {
        progress.milestone_level = progress.milestone_level.max(top.level);
    }

    LevelChange {
        old_level,
        new_level: progress.level,
        coins_granted: progress.coins - balance_before,
        rewards,
    }
}

/// Overwrite the XP total. Raising it pays out unclaimed milestones like a
/// regular gain; lowering it keeps claimed milestones claimed.
pub fn set_xp(progress: &mut UserProgress, xp: i64) -> LevelChange {
    let delta = xp.max(0).saturating_sub(progress.xp);
    apply_xp(progress, delta)
}

/// Adjust the coin balance and return the delta actually applied.
pub fn adjust_coins(progress: &mut UserProgress, delta: i64) -> i64 {
    let before = progress.coins;
    progress.coins = clamp_coins(progress.coins, delta);
    progress.coins - before
}

/// Role changes needed after a level change.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RolePlan {
    pub grant: Vec<&'static str>,
    pub revoke: Vec<&'static str>,
}

impl RolePlan {
    pub fn is_empty(&self) -> bool {
        self.grant.is_empty() && self.revoke.is_empty()
    }
}

/// Decide which milestone roles to add or remove.
///
/// With `stack_roles` every crossed milestone role is granted and nothing is
/// removed; otherwise only the highest one is kept.
pub fn role_plan(change: &LevelChange, stack_roles: bool) -> RolePlan {
    let Some(top) = change.top_reward() else {
        return RolePlan::default();
    };

    if stack_roles {
        return RolePlan {
            grant: change.rewards.iter().map(|reward| reward.role_name).collect(),
            revoke: Vec::new(),
        };
    }

    RolePlan {
        grant: vec![top.role_name],
        revoke: MILESTONES
            .iter()
            .filter(|milestone| milestone.level < top.level)
            .map(|milestone| milestone.role_name)
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use hearth_database::{MAX_COINS, UserProgress};

    use super::{adjust_coins, apply_xp, clamp_coins, role_plan, set_xp};
    use crate::curve::total_xp_for_level;

    #[test]
    fn gaining_xp_without_milestone() {
        let mut progress = UserProgress::new(1, 2);
        let change = apply_xp(&mut progress, 120);

        assert_eq!(change.old_level, 0);
        assert_eq!(change.new_level, 1);
        assert!(change.leveled_up());
        assert!(change.rewards.is_empty());
        assert_eq!(progress.coins, 0);
    }

    #[test]
    fn multi_milestone_jump_pays_each_once() {
        let mut progress = UserProgress::new(1, 2);
        let change = apply_xp(&mut progress, total_xp_for_level(16));

        let levels: Vec<i32> = change.rewards.iter().map(|m| m.level).collect();
        assert_eq!(levels, vec![5, 10, 15]);
        assert_eq!(change.coins_granted, 50 + 100 + 200);
        assert_eq!(progress.coins, 350);
        assert_eq!(progress.milestone_level, 15);

        let again = apply_xp(&mut progress, 1);
        assert!(again.rewards.is_empty());
        assert_eq!(progress.coins, 350);
    }

    #[test]
    fn lowering_xp_does_not_regrant() {
        let mut progress = UserProgress::new(1, 2);
        set_xp(&mut progress, total_xp_for_level(10));
        assert_eq!(progress.coins, 150);

        let down = set_xp(&mut progress, 0);
        assert_eq!(down.new_level, 0);
        assert!(!down.leveled_up());
        assert_eq!(progress.milestone_level, 10);

        let up = set_xp(&mut progress, total_xp_for_level(10));
        assert!(up.rewards.is_empty());
        assert_eq!(progress.coins, 150);
    }

    #[test]
    fn coins_are_clamped_to_max() {
        let mut progress = UserProgress::new(1, 2);
        progress.coins = MAX_COINS - 20;

        let change = apply_xp(&mut progress, total_xp_for_level(5));
        assert_eq!(change.coins_granted, 20);
        assert_eq!(progress.coins, MAX_COINS);

        assert_eq!(clamp_coins(MAX_COINS, i64::MAX), MAX_COINS);
        assert_eq!(clamp_coins(10, -50), 0);
    }

    #[test]
    fn full_climb_stays_within_bounds() {
        let mut progress = UserProgress::new(1, 2);
        let change = apply_xp(&mut progress, total_xp_for_level(200));
        assert_eq!(change.rewards.len(), 14);
        assert_eq!(progress.coins, 111_900);
        assert!(progress.coins <= MAX_COINS);
    }

    #[test]
    fn negative_deltas_never_go_below_zero() {
        let mut progress = UserProgress::new(1, 2);
        apply_xp(&mut progress, 50);
        let change = apply_xp(&mut progress, -500);
        assert_eq!(progress.xp, 0);
        assert_eq!(change.new_level, 0);
    }

    #[test]
    fn coin_adjustments_report_applied_delta() {
        let mut progress = UserProgress::new(1, 2);
        assert_eq!(adjust_coins(&mut progress, 300), 300);
        assert_eq!(adjust_coins(&mut progress, -1_000), -300);
        assert_eq!(adjust_coins(&mut progress, MAX_COINS + 5), MAX_COINS);
    }

    #[test]
    fn role_plans() {
        let mut progress = UserProgress::new(1, 2);
        let change = apply_xp(&mut progress, total_xp_for_level(10));

        let single = role_plan(&change, false);
        assert_eq!(single.grant, vec!["Ember"]);
        assert_eq!(single.revoke, vec!["Spark"]);

        let stacked = role_plan(&change, true);
        assert_eq!(stacked.grant, vec!["Spark", "Ember"]);
        assert!(stacked.revoke.is_empty());

        let none = apply_xp(&mut progress, 1);
        assert!(role_plan(&none, false).is_empty());
    }
}
