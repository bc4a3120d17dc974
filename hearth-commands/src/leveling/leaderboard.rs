use crate::CommandMeta;
use crate::leveling::embeds::{guild_only_message, leaderboard_line};
use hearth_core::{Context, Error};
use hearth_utils::pagination::paginate_embed_pages;

pub const META: CommandMeta = CommandMeta {
    name: "leaderboard",
    desc: "Show the server's top members by XP.",
    category: "leveling",
    usage: "!leaderboard [page]",
};

const LEADERBOARD_SIZE: u64 = 100;
const ENTRIES_PER_PAGE: usize = 10;

#[poise::command(
    prefix_command,
    slash_command,
    category = "Leveling",
    aliases("lb", "top")
)]
pub async fn leaderboard(
    ctx: Context<'_>,
    #[description = "Page to start on"] page: Option<usize>,
) -> Result<(), Error> {
    let Some(guild_id) = ctx.guild_id() else {
        ctx.say(guild_only_message()).await?;
        return Ok(());
    };

    let board = ctx
        .data()
        .engine
        .leaderboard_page(guild_id.get(), 1, LEADERBOARD_SIZE)
        .await?;

    if board.entries.is_empty() {
        ctx.say("Nobody has earned XP in this server yet.").await?;
        return Ok(());
    }

    let lines: Vec<String> = board
        .entries
        .iter()
        .map(|(position, progress)| leaderboard_line(*position, progress))
        .collect();
    let pages: Vec<String> = lines
        .chunks(ENTRIES_PER_PAGE)
        .map(|chunk| chunk.join("\n"))
        .collect();

    let footer = format!("{} ranked members", board.total_users);

    paginate_embed_pages(ctx, "Leaderboard", &pages, page.unwrap_or(1), Some(&footer)).await?;
    Ok(())
}
