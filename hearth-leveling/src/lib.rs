/// XP rolls and message eligibility.
pub mod accumulator;
/// Per-(user, activity) cooldowns.
pub mod cooldown;
/// XP-to-level formula.
pub mod curve;
/// Activity → XP → level → rewards orchestration.
pub mod engine;
/// The fixed milestone reward table.
pub mod milestones;
/// Level and coin bookkeeping applied inside a store update.
pub mod rewards;
/// XP tuning constants.
pub mod settings;

pub use cooldown::CooldownTracker;
pub use engine::{ActivityOutcome, LevelingEngine};
pub use milestones::{MILESTONES, MilestoneReward};
pub use rewards::LevelChange;
pub use settings::{ActivityKind, XpSettings};
