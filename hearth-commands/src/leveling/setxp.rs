use poise::serenity_prelude as serenity;

use crate::CommandMeta;
use crate::leveling::embeds::{
    bots_have_no_progress_message, guild_only_message, usage_message, xp_set_message,
};
use crate::leveling::rewards::publish_level_change;
use hearth_core::{Context, Error};
use hearth_utils::embed::base_embed;

pub const META: CommandMeta = CommandMeta {
    name: "setxp",
    desc: "Overwrite a member's total XP and recompute their level.",
    category: "leveling",
    usage: "!setxp <user> <xp>",
};

#[poise::command(
    prefix_command,
    slash_command,
    category = "Leveling",
    required_permissions = "MANAGE_GUILD",
    default_member_permissions = "MANAGE_GUILD"
)]
pub async fn setxp(
    ctx: Context<'_>,
    #[description = "Member to update"] user: Option<serenity::User>,
    #[description = "New total XP"] xp: Option<i64>,
) -> Result<(), Error> {
    let Some(guild_id) = ctx.guild_id() else {
        ctx.say(guild_only_message()).await?;
        return Ok(());
    };

    let (Some(user), Some(xp)) = (user, xp.filter(|xp| *xp >= 0)) else {
        ctx.say(usage_message(META.usage)).await?;
        return Ok(());
    };

    if user.bot {
        ctx.say(bots_have_no_progress_message()).await?;
        return Ok(());
    }

    let (progress, change) = ctx
        .data()
        .engine
        .set_xp(guild_id.get(), user.id.get(), xp)
        .await?;

    let embed = base_embed("XP Updated", xp_set_message(&progress, &change));
    ctx.send(poise::CreateReply::default().embed(embed)).await?;

    publish_level_change(
        ctx.http(),
        &ctx.data().config.layout,
        guild_id,
        user.id,
        &change,
        Some(ctx.channel_id()),
    )
    .await;

    Ok(())
}
