use crate::CommandMeta;

pub fn unknown_category_message(wanted_category: &str, valid_categories: &[&str]) -> String {
    let valid = valid_categories
        .iter()
        .map(|category| display_category(category))
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "Unknown category: {}\nValid categories: {}",
        display_category(wanted_category),
        valid
    )
}

pub fn page_out_of_range_message(requested_page: usize, total_pages: usize) -> String {
    format!(
        "Page {} does not exist. Available pages: 1-{}.",
        requested_page, total_pages
    )
}

/// One help page: a category heading followed by its commands.
pub fn category_page(category: &str, commands: &[&CommandMeta]) -> String {
    let lines = commands
        .iter()
        .map(|command| format!("`{}`: {}", command.name, command.desc))
        .collect::<Vec<_>>();

    if lines.is_empty() {
        return format!("**{}**\nNo commands available.", display_category(category));
    }
    format!("**{}**\n{}", display_category(category), lines.join("\n"))
}

pub fn unknown_command_message(raw: &str) -> String {
    format!("Unknown command: `{}`. Try `!help`.", raw)
}

fn display_category(category: &str) -> String {
    let mut chars = category.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::{category_page, unknown_category_message};
    use crate::CommandMeta;

    const RANK: CommandMeta = CommandMeta {
        name: "rank",
        desc: "Show rank.",
        category: "leveling",
        usage: "!rank",
    };
    const TOP: CommandMeta = CommandMeta {
        name: "leaderboard",
        desc: "Top members.",
        category: "leveling",
        usage: "!leaderboard",
    };

    #[test]
    fn category_page_lists_commands() {
        assert_eq!(
            category_page("leveling", &[&TOP, &RANK]),
            "**Leveling**\n`leaderboard`: Top members.\n`rank`: Show rank."
        );
        assert_eq!(category_page("fun", &[]), "**Fun**\nNo commands available.");
    }

    #[test]
    fn unknown_category_lists_valid_ones() {
        assert_eq!(
            unknown_category_message("fun", &["leveling", "utility"]),
            "Unknown category: Fun\nValid categories: Leveling, Utility"
        );
    }
}
