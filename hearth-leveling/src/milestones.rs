/// A level threshold that grants a role and a coin bonus once.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MilestoneReward {
    pub level: i32,
    pub role_name: &'static str,
    pub coins: i64,
}

const fn milestone(level: i32, role_name: &'static str, coins: i64) -> MilestoneReward {
    MilestoneReward {
        level,
        role_name,
        coins,
    }
}

/// Milestones in ascending level order.
pub const MILESTONES: [MilestoneReward; 14] = [
    milestone(5, "Spark", 50),
    milestone(10, "Ember", 100),
    milestone(15, "Kindling", 200),
    milestone(20, "Flame", 300),
    milestone(25, "Blaze", 500),
    milestone(30, "Bonfire", 750),
    milestone(40, "Wildfire", 1_000),
    milestone(50, "Inferno", 1_500),
    milestone(60, "Firestorm", 2_500),
    milestone(75, "Phoenix", 5_000),
    milestone(100, "Solar Flare", 10_000),
    milestone(125, "Supernova", 15_000),
    milestone(150, "Starforged", 25_000),
    milestone(200, "Eternal Flame", 50_000),
];

pub fn milestone_for_level(level: i32) -> Option<&'static MilestoneReward> {
    MILESTONES.iter().find(|milestone| milestone.level == level)
}

/// Milestones newly reached when moving from `old_level` to `new_level`.
///
/// Anything at or below `claimed_level` was already rewarded and is skipped,
/// so a user who drops and regains levels is never paid twice.
pub fn milestones_crossed(
    old_level: i32,
    new_level: i32,
    claimed_level: i32,
) -> Vec<MilestoneReward> {
    let floor = old_level.max(claimed_level);
    MILESTONES
        .iter()
        .filter(|milestone| milestone.level > floor && milestone.level <= new_level)
        .copied()
        .collect()
}

/// The next milestone strictly above `level`.
pub fn next_milestone(level: i32) -> Option<&'static MilestoneReward> {
    MILESTONES.iter().find(|milestone| milestone.level > level)
}

/// Highest milestone at or below `level`.
pub fn current_milestone(level: i32) -> Option<&'static MilestoneReward> {
    MILESTONES
        .iter()
        .rev()
        .find(|milestone| milestone.level <= level)
}

pub fn milestone_role_names() -> impl Iterator<Item = &'static str> {
    MILESTONES.iter().map(|milestone| milestone.role_name)
}

#[cfg(test)]
mod tests {
    use super::{
        MILESTONES, current_milestone, milestone_for_level, milestone_role_names,
        milestones_crossed, next_milestone,
    };
    use hearth_database::MAX_COINS;

    #[test]
    fn table_shape() {
        assert_eq!(MILESTONES.len(), 14);
        assert_eq!(MILESTONES.first().map(|m| m.level), Some(5));
        assert_eq!(MILESTONES.last().map(|m| m.level), Some(200));
        assert_eq!(MILESTONES.first().map(|m| m.coins), Some(50));
        assert_eq!(MILESTONES.last().map(|m| m.coins), Some(50_000));
    }

    #[test]
    fn levels_increase_and_coins_never_decrease() {
        for pair in MILESTONES.windows(2) {
            assert!(pair[0].level < pair[1].level);
            assert!(pair[0].coins <= pair[1].coins);
        }
        assert!(MILESTONES.iter().all(|m| m.level >= 1));
        assert!(MILESTONES.iter().all(|m| m.coins <= MAX_COINS));
    }

    #[test]
    fn role_names_are_unique() {
        let mut names: Vec<&str> = milestone_role_names().collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), MILESTONES.len());
    }

    #[test]
    fn crossing_collects_every_skipped_milestone() {
        let crossed = milestones_crossed(4, 16, 0);
        let levels: Vec<i32> = crossed.iter().map(|m| m.level).collect();
        assert_eq!(levels, vec![5, 10, 15]);

        assert!(milestones_crossed(5, 9, 5).is_empty());
        assert!(milestones_crossed(9, 9, 5).is_empty());
    }

    #[test]
    fn claimed_milestones_are_not_repeated() {
        let crossed = milestones_crossed(3, 12, 10);
        assert!(crossed.is_empty());

        let crossed = milestones_crossed(3, 16, 10);
        assert_eq!(crossed.iter().map(|m| m.level).collect::<Vec<_>>(), vec![15]);
    }

    #[test]
    fn lookups() {
        assert_eq!(milestone_for_level(75).map(|m| m.role_name), Some("Phoenix"));
        assert!(milestone_for_level(76).is_none());
        assert_eq!(next_milestone(0).map(|m| m.level), Some(5));
        assert_eq!(next_milestone(5).map(|m| m.level), Some(10));
        assert!(next_milestone(200).is_none());
        assert!(current_milestone(4).is_none());
        assert_eq!(current_milestone(99).map(|m| m.level), Some(75));
    }
}
