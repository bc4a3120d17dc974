use poise::serenity_prelude as serenity;
use tracing::info;

use crate::CommandMeta;
use crate::leveling::embeds::{guild_only_message, reset_message, usage_message};
use crate::leveling::rewards::revoke_milestone_roles;
use hearth_core::{Context, Error};
use hearth_utils::embed::base_embed;

pub const META: CommandMeta = CommandMeta {
    name: "resetxp",
    desc: "Wipe a member's XP, level, coins and milestone roles.",
    category: "leveling",
    usage: "!resetxp <user>",
};

#[poise::command(
    prefix_command,
    slash_command,
    category = "Leveling",
    required_permissions = "MANAGE_GUILD",
    default_member_permissions = "MANAGE_GUILD"
)]
pub async fn resetxp(
    ctx: Context<'_>,
    #[description = "Member to reset"] user: Option<serenity::User>,
) -> Result<(), Error> {
    let Some(guild_id) = ctx.guild_id() else {
        ctx.say(guild_only_message()).await?;
        return Ok(());
    };

    let Some(user) = user else {
        ctx.say(usage_message(META.usage)).await?;
        return Ok(());
    };

    let removed = ctx
        .data()
        .engine
        .reset_user(guild_id.get(), user.id.get())
        .await?;

    if removed {
        revoke_milestone_roles(ctx.http(), guild_id, user.id).await;
        info!(
            guild_id = guild_id.get(),
            user_id = user.id.get(),
            moderator_id = ctx.author().id.get(),
            "leveling progress reset by moderator"
        );
    }

    let embed = base_embed("Progress Reset", reset_message(user.id.get(), removed));
    ctx.send(poise::CreateReply::default().embed(embed)).await?;
    Ok(())
}
