//! Startup configuration.
//!
//! Everything is read once from the environment (after `.env` is loaded) into
//! an immutable [`BotConfig`] that is shared by reference for the lifetime of
//! the process.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context as _;

use hearth_database::BackendOptions;
use hearth_leveling::XpSettings;

pub const DEFAULT_LEADERBOARD_PATH: &str = "leaderboard.json";
pub const DEFAULT_REDIS_KEY_PREFIX: &str = "hearth:prod";
pub const DEFAULT_LEVEL_UP_CHANNEL: &str = "level-ups";
pub const DEFAULT_NO_XP_CHANNELS: &[&str] = &["bot-commands", "spam"];

/// Local level-card backgrounds, probed in order: the working directory, then
/// the Render and Discloud deploy roots.
pub const DEFAULT_CARD_BACKGROUND_PATHS: &[&str] = &[
    "assets/level_card_bg.png",
    "/opt/render/project/src/assets/level_card_bg.png",
    "/home/discloud/app/assets/level_card_bg.png",
];

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RedisSettings {
    pub enabled: bool,
    pub url: Option<String>,
    pub key_prefix: String,
}

/// Channel and role wiring, matched by display name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GuildLayout {
    pub level_up_channel: String,
    pub no_xp_channels: Vec<String>,
    pub stack_milestone_roles: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CardBackgroundSource {
    pub url: Option<String>,
    pub local_paths: Vec<PathBuf>,
}

#[derive(Clone)]
pub struct BotConfig {
    pub discord_token: String,
    pub guild_id: Option<u64>,
    pub storage: BackendOptions,
    pub redis: RedisSettings,
    pub xp: XpSettings,
    pub layout: GuildLayout,
    pub card_background: CardBackgroundSource,
}

impl fmt::Debug for BotConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BotConfig")
            .field("discord_token", &"<redacted>")
            .field("guild_id", &self.guild_id)
            .field("storage", &self.storage.json_path)
            .field("postgres_configured", &self.storage.database_url.is_some())
            .field("redis", &self.redis.enabled)
            .field("xp", &self.xp)
            .field("layout", &self.layout)
            .field("card_background", &self.card_background)
            .finish()
    }
}

impl BotConfig {
    /// Read the configuration from process environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from any key lookup (used by tests).
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_owned())
                .filter(|value| !value.is_empty())
        };

        let discord_token = get("DISCORD_TOKEN").context("DISCORD_TOKEN is not set")?;

        let guild_id = get("DISCORD_GUILD_ID")
            .map(|raw| raw.parse::<u64>())
            .transpose()
            .context("DISCORD_GUILD_ID must be a numeric guild id")?;

        let storage = BackendOptions {
            database_url: get("DATABASE_URL"),
            json_path: get("LEADERBOARD_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_LEADERBOARD_PATH)),
            run_migrations: env_bool(get("AUTO_RUN_MIGRATIONS"), true),
            ..Default::default()
        };

        let redis = RedisSettings {
            enabled: env_bool(get("REDIS_ENABLED"), false),
            url: get("REDIS_URL"),
            key_prefix: get("REDIS_KEY_PREFIX")
                .unwrap_or_else(|| DEFAULT_REDIS_KEY_PREFIX.to_owned()),
        };

        let defaults = XpSettings::default();
        let xp = XpSettings {
            message_xp_min: env_i64(get("XP_MESSAGE_MIN"), defaults.message_xp_min),
            message_xp_max: env_i64(get("XP_MESSAGE_MAX"), defaults.message_xp_max),
            message_cooldown: env_secs(
                get("XP_MESSAGE_COOLDOWN_SECONDS"),
                defaults.message_cooldown,
            ),
            voice_xp_per_tick: env_i64(get("XP_VOICE_PER_TICK"), defaults.voice_xp_per_tick),
            voice_tick: env_secs(get("XP_VOICE_TICK_SECONDS"), defaults.voice_tick),
            reaction_xp: env_i64(get("XP_REACTION"), defaults.reaction_xp),
            reaction_cooldown: env_secs(
                get("XP_REACTION_COOLDOWN_SECONDS"),
                defaults.reaction_cooldown,
            ),
            ..defaults
        };
        xp.validate().context("invalid XP settings")?;

        let layout = GuildLayout {
            level_up_channel: get("LEVEL_UP_CHANNEL")
                .unwrap_or_else(|| DEFAULT_LEVEL_UP_CHANNEL.to_owned()),
            no_xp_channels: match get("NO_XP_CHANNELS") {
                Some(raw) => split_list(&raw),
                None => DEFAULT_NO_XP_CHANNELS
                    .iter()
                    .map(|name| (*name).to_owned())
                    .collect(),
            },
            stack_milestone_roles: env_bool(get("STACK_MILESTONE_ROLES"), false),
        };

        let card_background = CardBackgroundSource {
            url: get("LEVEL_CARD_BACKGROUND_URL"),
            local_paths: DEFAULT_CARD_BACKGROUND_PATHS
                .iter()
                .map(PathBuf::from)
                .collect(),
        };

        Ok(Self {
            discord_token,
            guild_id,
            storage,
            redis,
            xp,
            layout,
            card_background,
        })
    }
}

fn env_bool(value: Option<String>, default: bool) -> bool {
    match value {
        Some(value) => matches!(
            value.to_ascii_lowercase().as_str(),
            "1" | "true" | "yes" | "on"
        ),
        None => default,
    }
}

fn env_i64(value: Option<String>, default: i64) -> i64 {
    value
        .and_then(|value| value.parse::<i64>().ok())
        .unwrap_or(default)
}

fn env_secs(value: Option<String>, default: Duration) -> Duration {
    value
        .and_then(|value| value.parse::<u64>().ok())
        .map_or(default, Duration::from_secs)
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(str::to_owned)
        .collect()
}
