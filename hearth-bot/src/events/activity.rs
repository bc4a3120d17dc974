use poise::serenity_prelude as serenity;
use tracing::error;

use hearth_commands::leveling::rewards::publish_level_change;
use hearth_core::Data;
use hearth_leveling::ActivityKind;
use hearth_leveling::accumulator::message_qualifies;
use hearth_utils::COMMAND_PREFIX;
use hearth_utils::names::display_names_match;

/// Award message XP for an eligible guild message.
pub async fn handle_message_xp(ctx: &serenity::Context, data: &Data, message: &serenity::Message) {
    // Ignore bots and webhooks.
    if message.author.bot || message.webhook_id.is_some() {
        return;
    }

    let Some(guild_id) = message.guild_id else {
        return;
    };

    if message.content.trim_start().starts_with(COMMAND_PREFIX)
        || !message_qualifies(&message.content, data.engine.settings())
    {
        return;
    }

    if is_no_xp_channel(ctx, data, message.channel_id) {
        return;
    }

    award(
        ctx,
        data,
        guild_id,
        message.author.id,
        ActivityKind::Message,
        Some(message.channel_id),
    )
    .await;
}

/// Award reaction XP to the member who reacted.
pub async fn handle_reaction_xp(
    ctx: &serenity::Context,
    data: &Data,
    reaction: &serenity::Reaction,
) {
    let (Some(guild_id), Some(user_id)) = (reaction.guild_id, reaction.user_id) else {
        return;
    };

    let is_bot = match reaction.member.as_ref() {
        Some(member) => member.user.bot,
        None => ctx.cache.user(user_id).is_some_and(|user| user.bot),
    };
    if is_bot || is_no_xp_channel(ctx, data, reaction.channel_id) {
        return;
    }

    award(
        ctx,
        data,
        guild_id,
        user_id,
        ActivityKind::Reaction,
        Some(reaction.channel_id),
    )
    .await;
}

/// Record one activity and publish whatever the level change unlocked.
pub async fn award(
    ctx: &serenity::Context,
    data: &Data,
    guild_id: serenity::GuildId,
    user_id: serenity::UserId,
    kind: ActivityKind,
    channel_id: Option<serenity::ChannelId>,
) {
    let outcome = match data
        .engine
        .record_activity(guild_id.get(), user_id.get(), kind)
        .await
    {
        Ok(Some(outcome)) => outcome,
        Ok(None) => return,
        Err(source) => {
            error!(
                ?source,
                guild_id = guild_id.get(),
                user_id = user_id.get(),
                %kind,
                "failed to record activity"
            );
            return;
        }
    };

    if outcome.change.leveled_up() || !outcome.change.rewards.is_empty() {
        publish_level_change(
            &ctx.http,
            &data.config.layout,
            guild_id,
            user_id,
            &outcome.change,
            channel_id,
        )
        .await;
    }
}

fn is_no_xp_channel(ctx: &serenity::Context, data: &Data, channel_id: serenity::ChannelId) -> bool {
    let Some(name) = ctx
        .cache
        .channel(channel_id)
        .map(|channel| channel.name.clone())
    else {
        return false;
    };

    data.config
        .layout
        .no_xp_channels
        .iter()
        .any(|blocked| display_names_match(&name, blocked))
}
