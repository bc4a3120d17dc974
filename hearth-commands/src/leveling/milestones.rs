use crate::CommandMeta;
use crate::leveling::embeds::milestone_table;
use hearth_core::{Context, Error};
use hearth_utils::embed::base_embed;

pub const META: CommandMeta = CommandMeta {
    name: "milestones",
    desc: "List milestone levels with their roles and coin rewards.",
    category: "leveling",
    usage: "!milestones",
};

#[poise::command(prefix_command, slash_command, category = "Leveling")]
pub async fn milestones(ctx: Context<'_>) -> Result<(), Error> {
    let current_level = match ctx.guild_id() {
        Some(guild_id) => ctx
            .data()
            .engine
            .profile(guild_id.get(), ctx.author().id.get())
            .await?
            .map(|progress| progress.level)
            .or(Some(0)),
        None => None,
    };

    let embed = base_embed("Milestones", milestone_table(current_level));
    ctx.send(poise::CreateReply::default().embed(embed)).await?;
    Ok(())
}
