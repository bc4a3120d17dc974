pub mod embeds;
pub mod givecoins;
pub mod leaderboard;
pub mod milestones;
pub mod rank;
pub mod resetxp;
pub mod rewards;
pub mod setxp;
