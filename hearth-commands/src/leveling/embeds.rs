use poise::serenity_prelude as serenity;

use hearth_database::{MAX_COINS, UserProgress};
use hearth_leveling::LevelChange;
use hearth_leveling::curve::LevelProgress;
use hearth_leveling::milestones::{MILESTONES, next_milestone};
use hearth_utils::embed::{DEFAULT_EMBED_COLOR, LEVEL_UP_EMBED_COLOR};
use hearth_utils::formatting::{format_minutes, format_rank, format_thousands, progress_bar};
use hearth_utils::time::relative_timestamp;

const PROGRESS_BAR_WIDTH: usize = 12;

pub fn guild_only_message() -> &'static str {
    "This command can only be used in a server."
}

pub fn usage_message(usage: &str) -> String {
    format!("Usage: `{}`", usage)
}

pub fn bots_have_no_progress_message() -> &'static str {
    "Bots don't earn XP."
}

#[derive(Clone, Debug)]
pub struct MemberProfile {
    pub display_name: String,
    pub avatar_url: Option<String>,
}

pub fn member_profile(user: &serenity::User) -> MemberProfile {
    MemberProfile {
        display_name: user
            .global_name
            .clone()
            .unwrap_or_else(|| user.name.clone()),
        avatar_url: Some(user.face()),
    }
}

pub fn rank_description(progress: &UserProgress, rank: Option<u64>) -> String {
    let level = LevelProgress::from_xp(progress.xp);
    let rank = rank.map_or_else(|| "Unranked".to_owned(), format_rank);

    let mut out = format!(
        "**Rank :** {}\n**Level :** {}\n**XP :** {} / {}\n{}\n",
        rank,
        level.level,
        format_thousands(level.xp_into_level),
        format_thousands(level.xp_for_next),
        progress_bar(level.xp_into_level, level.xp_for_next, PROGRESS_BAR_WIDTH),
    );

    out.push_str(&format!(
        "**Total XP :** {}\n**Coins :** {}\n**Messages :** {} • **Voice :** {}",
        format_thousands(progress.xp),
        format_thousands(progress.coins),
        format_thousands(progress.message_count),
        format_minutes(progress.voice_minutes),
    ));

    if progress.updated_at > 0 {
        out.push_str(&format!(
            "\n**Last active :** {}",
            relative_timestamp(progress.updated_at)
        ));
    }

    if let Some(next) = next_milestone(level.level) {
        out.push_str(&format!(
            "\n\nNext milestone: **{}** at level {} (+{} coins)",
            next.role_name,
            next.level,
            format_thousands(next.coins)
        ));
    }

    out
}

pub fn rank_embed(
    profile: &MemberProfile,
    progress: &UserProgress,
    rank: Option<u64>,
) -> serenity::CreateEmbed {
    let mut author = serenity::CreateEmbedAuthor::new(&profile.display_name);
    if let Some(url) = profile.avatar_url.as_deref() {
        author = author.icon_url(url);
    }

    serenity::CreateEmbed::new()
        .author(author)
        .color(DEFAULT_EMBED_COLOR)
        .description(rank_description(progress, rank))
}

pub fn level_up_description(user_id: u64, change: &LevelChange) -> String {
    let mut out = format!(
        "<@{}> reached **level {}**!",
        user_id, change.new_level
    );

    for reward in &change.rewards {
        out.push_str(&format!(
            "\n🏅 Milestone **{}** unlocked (level {})",
            reward.role_name, reward.level
        ));
    }

    if change.coins_granted > 0 {
        out.push_str(&format!(
            "\n🪙 +{} coins",
            format_thousands(change.coins_granted)
        ));
    }

    out
}

pub fn level_up_embed(user_id: u64, change: &LevelChange) -> serenity::CreateEmbed {
    serenity::CreateEmbed::new()
        .title("Level Up!")
        .color(LEVEL_UP_EMBED_COLOR)
        .description(level_up_description(user_id, change))
}

pub fn leaderboard_line(position: u64, progress: &UserProgress) -> String {
    format!(
        "{} <@{}> • Level **{}** • {} XP",
        format_rank(position),
        progress.user_id,
        progress.level,
        format_thousands(progress.xp)
    )
}

pub fn milestone_table(current_level: Option<i32>) -> String {
    let mut lines = MILESTONES
        .iter()
        .map(|milestone| {
            let marker = match current_level {
                Some(level) if level >= milestone.level => "✅",
                Some(_) => "▫️",
                None => "•",
            };
            format!(
                "{} Level **{}** → **{}** • {} coins",
                marker,
                milestone.level,
                milestone.role_name,
                format_thousands(milestone.coins)
            )
        })
        .collect::<Vec<_>>();

    lines.push(format!(
        "\nCoin balances are capped at {}.",
        format_thousands(MAX_COINS)
    ));
    lines.join("\n")
}

pub fn coins_adjusted_message(user_id: u64, requested: i64, applied: i64, balance: i64) -> String {
    let verb = if requested >= 0 { "Gave" } else { "Took" };
    let mut out = format!(
        "{} **{}** coins {} <@{}>. New balance: **{}**.",
        verb,
        format_thousands(applied.abs()),
        if requested >= 0 { "to" } else { "from" },
        user_id,
        format_thousands(balance)
    );
    if applied != requested {
        out.push_str(&format!(
            "
-# Balances are kept between 0 and {}.",
            format_thousands(MAX_COINS)
        ));
    }
    out
}

pub fn xp_set_message(progress: &UserProgress, change: &LevelChange) -> String {
    let mut out = format!(
        "Set <@{}> to **{}** XP (level {}).",
        progress.user_id,
        format_thousands(progress.xp),
        progress.level
    );
    if change.coins_granted > 0 {
        out.push_str(&format!(
            "
Paid out {} milestone coins.",
            format_thousands(change.coins_granted)
        ));
    }
    out
}

pub fn reset_message(user_id: u64, removed: bool) -> String {
    if removed {
        format!("Reset all leveling progress for <@{}>.", user_id)
    } else {
        format!("<@{}> has no leveling progress to reset.", user_id)
    }
}

#[cfg(test)]
mod tests {
    use hearth_database::UserProgress;
    use hearth_leveling::LevelChange;
    use hearth_leveling::milestones::MILESTONES;

    use super::{
        coins_adjusted_message, leaderboard_line, level_up_description, milestone_table,
        rank_description, reset_message,
    };

    #[test]
    fn rank_text_shows_progress_and_next_milestone() {
        let mut progress = UserProgress::new(1, 2);
        progress.xp = 130;
        progress.level = 1;
        progress.coins = 1_500;
        progress.voice_minutes = 65;

        let text = rank_description(&progress, Some(4));
        assert!(text.contains("**Rank :** #4"));
        assert!(text.contains("**Level :** 1"));
        assert!(text.contains("**XP :** 30 / 155"));
        assert!(text.contains("**Coins :** 1,500"));
        assert!(text.contains("**Voice :** 1h 5m"));
        assert!(text.contains("Next milestone: **Spark** at level 5"));

        let unranked = rank_description(&UserProgress::new(1, 3), None);
        assert!(unranked.contains("Unranked"));
    }

    #[test]
    fn level_up_text_lists_rewards() {
        let change = LevelChange {
            old_level: 4,
            new_level: 10,
            rewards: MILESTONES[..2].to_vec(),
            coins_granted: 150,
        };
        let text = level_up_description(42, &change);
        assert!(text.starts_with("<@42> reached **level 10**!"));
        assert!(text.contains("**Spark**"));
        assert!(text.contains("**Ember**"));
        assert!(text.contains("+150 coins"));

        let plain = LevelChange {
            old_level: 1,
            new_level: 2,
            ..Default::default()
        };
        assert_eq!(level_up_description(42, &plain), "<@42> reached **level 2**!");
    }

    #[test]
    fn leaderboard_lines() {
        let mut progress = UserProgress::new(1, 99);
        progress.xp = 12_345;
        progress.level = 12;
        assert_eq!(
            leaderboard_line(1, &progress),
            "🥇 <@99> • Level **12** • 12,345 XP"
        );
        assert!(leaderboard_line(11, &progress).starts_with("#11 "));
    }

    #[test]
    fn milestone_table_marks_reached_levels() {
        let table = milestone_table(Some(10));
        assert!(table.contains("✅ Level **5** → **Spark**"));
        assert!(table.contains("✅ Level **10** → **Ember**"));
        assert!(table.contains("▫️ Level **15** → **Kindling**"));
        assert!(table.contains("capped at 1,000,000"));
        assert!(
            milestone_table(None).contains("• Level **200** → **Eternal Flame** • 50,000 coins")
        );
    }

    #[test]
    fn coin_messages_note_clamping() {
        assert_eq!(
            coins_adjusted_message(7, 250, 250, 1_250),
            "Gave **250** coins to <@7>. New balance: **1,250**."
        );
        let clamped = coins_adjusted_message(7, -500, -120, 0);
        assert!(clamped.starts_with("Took **120** coins from <@7>."));
        assert!(clamped.contains("between 0 and 1,000,000"));
    }

    #[test]
    fn reset_messages() {
        assert!(reset_message(3, true).starts_with("Reset all"));
        assert!(reset_message(3, false).contains("no leveling progress"));
    }
}
