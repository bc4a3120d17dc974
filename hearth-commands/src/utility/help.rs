use crate::utility::embeds::{category_page, page_out_of_range_message, unknown_category_message};
use crate::{COMMANDS, CommandMeta};
use hearth_core::{Context, Error};
use hearth_utils::pagination::paginate_embed_pages;

pub const META: CommandMeta = CommandMeta {
    name: "help",
    desc: "Lists out all available commands.",
    category: "utility",
    usage: "!help [page|category]",
};

#[poise::command(prefix_command, slash_command, category = "Utility")]
pub async fn help(
    ctx: Context<'_>,
    #[description = "Page number or category"] query: Option<String>,
) -> Result<(), Error> {
    let sections = command_sections();
    let query = query.as_deref().map(str::trim).filter(|raw| !raw.is_empty());

    let start_page = match query {
        None => 1,
        Some(raw) => match raw.parse::<usize>() {
            Ok(page) if (1..=sections.len()).contains(&page) => page,
            Ok(page) => {
                ctx.say(page_out_of_range_message(page, sections.len())).await?;
                return Ok(());
            }
            Err(_) => {
                let wanted = raw.to_ascii_lowercase();
                match sections.iter().position(|(category, _)| *category == wanted) {
                    Some(idx) => idx + 1,
                    None => {
                        let categories: Vec<&str> =
                            sections.iter().map(|(category, _)| *category).collect();
                        ctx.say(unknown_category_message(&wanted, &categories)).await?;
                        return Ok(());
                    }
                }
            }
        },
    };

    let pages: Vec<String> = sections
        .iter()
        .map(|(category, commands)| category_page(category, commands))
        .collect();
    paginate_embed_pages(
        ctx,
        "Available Commands",
        &pages,
        start_page,
        Some("!usage <command> for syntax"),
    )
    .await?;
    Ok(())
}

/// Commands grouped by category, both sorted by name.
fn command_sections() -> Vec<(&'static str, Vec<&'static CommandMeta>)> {
    let mut sections: Vec<(&'static str, Vec<&'static CommandMeta>)> = Vec::new();
    for command in COMMANDS {
        match sections.iter_mut().find(|(category, _)| *category == command.category) {
            Some((_, commands)) => commands.push(command),
            None => sections.push((command.category, vec![command])),
        }
    }

    sections.sort_unstable_by_key(|(category, _)| *category);
    for (_, commands) in &mut sections {
        commands.sort_unstable_by_key(|command| command.name);
    }
    sections
}

#[cfg(test)]
mod tests {
    use super::command_sections;

    #[test]
    fn one_section_per_category() {
        let sections = command_sections();
        let categories: Vec<&str> = sections.iter().map(|(category, _)| *category).collect();
        assert_eq!(categories, vec!["leveling", "utility"]);

        let utility: Vec<&str> = sections[1].1.iter().map(|cmd| cmd.name).collect();
        assert_eq!(utility, vec!["help", "ping", "usage"]);
        assert_eq!(sections[0].1.first().map(|cmd| cmd.name), Some("givecoins"));
    }
}
