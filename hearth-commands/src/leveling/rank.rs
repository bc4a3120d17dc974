use poise::serenity_prelude as serenity;
use tracing::warn;

use crate::CommandMeta;
use crate::leveling::embeds::{
    bots_have_no_progress_message, guild_only_message, member_profile, rank_embed,
};
use hearth_core::{CardBackground, Context, Error};
use hearth_database::UserProgress;

pub const META: CommandMeta = CommandMeta {
    name: "rank",
    desc: "Show a member's level, XP, coins and rank.",
    category: "leveling",
    usage: "!rank [user]",
};

#[poise::command(prefix_command, slash_command, category = "Leveling")]
pub async fn rank(
    ctx: Context<'_>,
    #[description = "Member to look up (defaults to you)"] user: Option<serenity::User>,
) -> Result<(), Error> {
    let Some(guild_id) = ctx.guild_id() else {
        ctx.say(guild_only_message()).await?;
        return Ok(());
    };

    let user = user.unwrap_or_else(|| ctx.author().clone());
    if user.bot {
        ctx.say(bots_have_no_progress_message()).await?;
        return Ok(());
    }

    let engine = &ctx.data().engine;
    let progress = engine
        .profile(guild_id.get(), user.id.get())
        .await?
        .unwrap_or_else(|| UserProgress::new(guild_id.get(), user.id.get()));
    let position = engine.rank(guild_id.get(), user.id.get()).await?;

    let mut embed = rank_embed(&member_profile(&user), &progress, position);
    let mut reply = poise::CreateReply::default();

    match ctx.data().capabilities.card_background.as_ref() {
        Some(CardBackground::Remote(url)) => {
            embed = embed.image(url);
        }
        Some(background @ CardBackground::Local(path)) => {
            match serenity::CreateAttachment::path(path).await {
                Ok(attachment) => {
                    let name = background
                        .attachment_name()
                        .unwrap_or_else(|| attachment.filename.clone());
                    embed = embed.image(format!("attachment://{name}"));
                    reply = reply.attachment(attachment);
                }
                Err(err) => {
                    warn!(?err, path = %path.display(), "level-card background unreadable");
                }
            }
        }
        None => {}
    }

    ctx.send(reply.embed(embed)).await?;
    Ok(())
}
