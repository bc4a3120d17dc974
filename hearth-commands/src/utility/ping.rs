use hearth_core::{Context, Error};

use crate::CommandMeta;

pub const META: CommandMeta = CommandMeta {
    name: "ping",
    desc: "Replies with Pong and the storage backend in use.",
    category: "utility",
    usage: "!ping",
};

#[poise::command(prefix_command, slash_command, category = "Utility")]
pub async fn ping(ctx: Context<'_>) -> Result<(), Error> {
    let backend = ctx.data().engine.store().backend_name();
    ctx.say(format!("Pong! (storage: {backend})")).await?;
    Ok(())
}
