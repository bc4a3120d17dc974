pub mod leveling;
pub mod utility;

use hearth_core::{Data, Error};

pub struct CommandMeta {
    pub name: &'static str,
    pub desc: &'static str,
    pub category: &'static str,
    pub usage: &'static str,
}

pub const COMMANDS: &[CommandMeta] = &[
    utility::ping::META,
    utility::help::META,
    utility::usage::META,
    leveling::rank::META,
    leveling::leaderboard::META,
    leveling::milestones::META,
    leveling::givecoins::META,
    leveling::setxp::META,
    leveling::resetxp::META,
];

pub fn commands() -> Vec<poise::Command<Data, Error>> {
    vec![
        utility::ping::ping(),
        utility::help::help(),
        utility::usage::usage(),
        leveling::rank::rank(),
        leveling::leaderboard::leaderboard(),
        leveling::milestones::milestones(),
        leveling::givecoins::givecoins(),
        leveling::setxp::setxp(),
        leveling::resetxp::resetxp(),
    ]
}

#[cfg(test)]
mod tests {
    use super::{COMMANDS, commands};

    #[test]
    fn registry_matches_registered_commands() {
        let mut registered: Vec<String> = commands().into_iter().map(|cmd| cmd.name).collect();
        let mut listed: Vec<String> = COMMANDS.iter().map(|meta| meta.name.to_owned()).collect();
        registered.sort_unstable();
        listed.sort_unstable();
        assert_eq!(registered, listed);
    }

    #[test]
    fn usage_strings_use_prefix() {
        for meta in COMMANDS {
            let expected = format!("{}{}", hearth_utils::COMMAND_PREFIX, meta.name);
            assert!(meta.usage.starts_with(&expected), "{}", meta.name);
        }
    }
}
