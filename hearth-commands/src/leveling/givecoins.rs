use poise::serenity_prelude as serenity;
use tracing::info;

use crate::CommandMeta;
use crate::leveling::embeds::{
    bots_have_no_progress_message, coins_adjusted_message, guild_only_message, usage_message,
};
use hearth_core::{Context, Error};
use hearth_utils::embed::base_embed;

pub const META: CommandMeta = CommandMeta {
    name: "givecoins",
    desc: "Give (or with a negative amount, take) coins from a member.",
    category: "leveling",
    usage: "!givecoins <user> <amount>",
};

#[poise::command(
    prefix_command,
    slash_command,
    category = "Leveling",
    required_permissions = "MANAGE_GUILD",
    default_member_permissions = "MANAGE_GUILD"
)]
pub async fn givecoins(
    ctx: Context<'_>,
    #[description = "Member to adjust"] user: Option<serenity::User>,
    #[description = "Coins to add; negative to remove"] amount: Option<i64>,
) -> Result<(), Error> {
    let Some(guild_id) = ctx.guild_id() else {
        ctx.say(guild_only_message()).await?;
        return Ok(());
    };

    let (Some(user), Some(amount)) = (user, amount.filter(|amount| *amount != 0)) else {
        ctx.say(usage_message(META.usage)).await?;
        return Ok(());
    };

    if user.bot {
        ctx.say(bots_have_no_progress_message()).await?;
        return Ok(());
    }

    let (progress, applied) = ctx
        .data()
        .engine
        .grant_coins(guild_id.get(), user.id.get(), amount)
        .await?;

    info!(
        guild_id = guild_id.get(),
        user_id = user.id.get(),
        moderator_id = ctx.author().id.get(),
        requested = amount,
        applied,
        "coins adjusted"
    );

    let embed = base_embed(
        "Coins Updated",
        coins_adjusted_message(user.id.get(), amount, applied, progress.coins),
    );
    ctx.send(poise::CreateReply::default().embed(embed)).await?;
    Ok(())
}
