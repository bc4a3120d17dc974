use hearth_core::{Context, Error};

use crate::utility::embeds::unknown_command_message;
use crate::{COMMANDS, CommandMeta};

pub const META: CommandMeta = CommandMeta {
    name: "usage",
    desc: "Show usage syntax for a specific command.",
    category: "utility",
    usage: "!usage <command>",
};

#[poise::command(prefix_command, slash_command, category = "Utility")]
pub async fn usage(
    ctx: Context<'_>,
    #[description = "Command name"] command: Option<String>,
) -> Result<(), Error> {
    let Some(raw_name) = command.as_deref() else {
        ctx.say(format!("Usage: `{}`", META.usage)).await?;
        return Ok(());
    };

    match find_command(raw_name) {
        Some(command) => {
            ctx.say(format!("Usage: `{}`\n{}", command.usage, command.desc))
                .await?
        }
        None => {
            ctx.say(unknown_command_message(&normalize_name(raw_name)))
                .await?
        }
    };
    Ok(())
}

fn normalize_name(raw: &str) -> String {
    raw.trim()
        .trim_start_matches(hearth_utils::COMMAND_PREFIX)
        .to_ascii_lowercase()
}

fn find_command(raw: &str) -> Option<&'static CommandMeta> {
    let lookup = normalize_name(raw);
    COMMANDS.iter().find(|command| command.name == lookup)
}

#[cfg(test)]
mod tests {
    use super::find_command;

    #[test]
    fn lookup_ignores_prefix_and_case() {
        assert_eq!(find_command("!RANK").map(|c| c.name), Some("rank"));
        assert_eq!(find_command("  leaderboard ").map(|c| c.name), Some("leaderboard"));
        assert!(find_command("ban").is_none());
    }
}
