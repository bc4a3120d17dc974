//! Discord side effects of a level change: milestone roles and the level-up
//! announcement.
//!
//! Progress is already persisted by the time these run, so failures here are
//! logged and swallowed rather than surfaced to the user.

use poise::serenity_prelude as serenity;
use tracing::{debug, warn};

use hearth_core::config::GuildLayout;
use hearth_leveling::LevelChange;
use hearth_leveling::milestones::milestone_role_names;
use hearth_leveling::rewards::{RolePlan, role_plan};
use hearth_utils::names::{display_names_match, find_by_display_name};

use crate::leveling::embeds::level_up_embed;

const ROLE_REASON: &str = "Leveling milestone reached";
const RESET_REASON: &str = "Leveling progress reset";

/// Sync milestone roles and announce the new level.
///
/// `fallback_channel` is used when the guild has no channel matching the
/// configured level-up channel name (typically the channel the activity
/// happened in).
pub async fn publish_level_change(
    http: &serenity::Http,
    layout: &GuildLayout,
    guild_id: serenity::GuildId,
    user_id: serenity::UserId,
    change: &LevelChange,
    fallback_channel: Option<serenity::ChannelId>,
) {
    let plan = role_plan(change, layout.stack_milestone_roles);
    if !plan.is_empty()
        && let Err(err) = apply_role_plan(http, guild_id, user_id, &plan, ROLE_REASON).await
    {
        warn!(
            ?err,
            guild_id = guild_id.get(),
            user_id = user_id.get(),
            "milestone role sync failed"
        );
    }

    if !change.leveled_up() {
        return;
    }

    if let Err(err) = announce(http, layout, guild_id, user_id, change, fallback_channel).await {
        warn!(
            ?err,
            guild_id = guild_id.get(),
            user_id = user_id.get(),
            "level-up announcement failed"
        );
    }
}

/// Remove every milestone role the member currently holds.
pub async fn revoke_milestone_roles(
    http: &serenity::Http,
    guild_id: serenity::GuildId,
    user_id: serenity::UserId,
) {
    let plan = RolePlan {
        grant: Vec::new(),
        revoke: milestone_role_names().collect(),
    };
    if let Err(err) = apply_role_plan(http, guild_id, user_id, &plan, RESET_REASON).await {
        warn!(
            ?err,
            guild_id = guild_id.get(),
            user_id = user_id.get(),
            "milestone role cleanup failed"
        );
    }
}

async fn apply_role_plan(
    http: &serenity::Http,
    guild_id: serenity::GuildId,
    user_id: serenity::UserId,
    plan: &RolePlan,
    reason: &str,
) -> anyhow::Result<()> {
    let roles = guild_id.roles(http).await?;
    let member = guild_id.member(http, user_id).await?;

    for name in &plan.grant {
        let Some(role) = find_by_display_name(roles.values(), name, |role| role.name.as_str())
        else {
            warn!(role = name, guild_id = guild_id.get(), "milestone role missing from guild");
            continue;
        };
        if member.roles.contains(&role.id) {
            continue;
        }
        http.add_member_role(guild_id, user_id, role.id, Some(reason))
            .await?;
        debug!(role = name, user_id = user_id.get(), "milestone role granted");
    }

    for name in &plan.revoke {
        let held = roles
            .values()
            .filter(|role| display_names_match(&role.name, name))
            .filter(|role| member.roles.contains(&role.id));
        for role in held {
            http.remove_member_role(guild_id, user_id, role.id, Some(reason))
                .await?;
            debug!(role = name, user_id = user_id.get(), "milestone role revoked");
        }
    }

    Ok(())
}

async fn announce(
    http: &serenity::Http,
    layout: &GuildLayout,
    guild_id: serenity::GuildId,
    user_id: serenity::UserId,
    change: &LevelChange,
    fallback_channel: Option<serenity::ChannelId>,
) -> anyhow::Result<()> {
    let channels = guild_id.channels(http).await?;
    let text_channels = channels
        .values()
        .filter(|channel| channel.kind == serenity::ChannelType::Text);

    let target = find_by_display_name(text_channels, &layout.level_up_channel, |channel| {
        channel.name.as_str()
    })
    .map(|channel| channel.id)
    .or(fallback_channel);

    let Some(channel_id) = target else {
        debug!(guild_id = guild_id.get(), "no channel available for level-up announcement");
        return Ok(());
    };

    let message = serenity::CreateMessage::new()
        .embed(level_up_embed(user_id.get(), change))
        .allowed_mentions(serenity::CreateAllowedMentions::new().users(vec![user_id]));
    channel_id.send_message(http, message).await?;
    Ok(())
}
