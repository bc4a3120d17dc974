mod events;

use std::sync::Arc;

use poise::serenity_prelude as serenity;
use tracing::{debug, error, info, warn};
use tracing_subscriber::Layer;
use tracing_subscriber::filter::filter_fn;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use rustls::crypto::ring::default_provider;

use hearth_core::capabilities::resolve_card_background;
use hearth_core::config::RedisSettings;
use hearth_core::{BotConfig, Capabilities, Data, Error};
use hearth_database::{CacheService, ProgressStore};
use hearth_leveling::{CooldownTracker, LevelingEngine};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let fmt_layer = tracing_subscriber::fmt::layer().with_filter(filter_fn(|metadata| {
        let target = metadata.target();

        let within_info_level = *metadata.level() <= tracing::Level::INFO;
        if !within_info_level {
            return false;
        }

        !(target.starts_with("serenity::gateway::bridge::shard_manager")
            || target.starts_with("serenity::gateway::bridge::shard_runner"))
    }));

    tracing_subscriber::registry().with(fmt_layer).init();

    default_provider()
        .install_default()
        .map_err(|_| anyhow::anyhow!("failed to install rustls ring provider"))?;

    dotenvy::dotenv().ok();
    let config = Arc::new(BotConfig::from_env()?);
    debug!(?config, "configuration loaded");

    let cache = init_cache(&config.redis).await;
    let redis_ready = cache.is_redis_enabled();

    let store = ProgressStore::open(&config.storage, cache.clone()).await?;
    info!(backend = store.backend_name(), "Progress storage ready.");

    let capabilities = Capabilities {
        postgres: store.is_postgres(),
        redis: redis_ready,
        card_background: resolve_card_background(&config.card_background).await,
    };

    let engine = LevelingEngine::new(store.clone(), config.xp.clone(), CooldownTracker::new(cache));

    let intents = serenity::GatewayIntents::GUILDS
        | serenity::GatewayIntents::GUILD_MESSAGES
        | serenity::GatewayIntents::MESSAGE_CONTENT
        | serenity::GatewayIntents::GUILD_MESSAGE_REACTIONS
        | serenity::GatewayIntents::GUILD_VOICE_STATES;

    let setup_config = config.clone();
    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: hearth_commands::commands(),
            event_handler: |ctx, event, framework, data| {
                Box::pin(handle_event(ctx, event, framework, data))
            },
            on_error: |error| Box::pin(on_error(error)),
            prefix_options: poise::PrefixFrameworkOptions {
                prefix: Some(hearth_utils::COMMAND_PREFIX.to_string()),
                mention_as_prefix: false,
                ..Default::default()
            },
            ..Default::default()
        })
        .setup(move |ctx, _ready, framework| {
            Box::pin(async move {
                info!("Hearth is lit!");

                match setup_config.guild_id {
                    Some(guild_id) => {
                        poise::builtins::register_in_guild(
                            ctx,
                            &framework.options().commands,
                            serenity::GuildId::new(guild_id),
                        )
                        .await?;
                        info!(guild_id, "Slash commands registered in guild.");
                    }
                    None => {
                        poise::builtins::register_globally(ctx, &framework.options().commands)
                            .await?;
                        info!("Slash commands registered globally.");
                    }
                }

                let data = Data {
                    engine,
                    config: setup_config,
                    capabilities,
                };

                tokio::spawn(events::voice::run_voice_ticks(
                    ctx.clone(),
                    Arc::new(data.clone()),
                ));

                Ok(data)
            })
        })
        .build();

    info!("Hearth is connecting...");

    let mut client = serenity::ClientBuilder::new(&config.discord_token, intents)
        .framework(framework)
        .await?;

    let shard_manager = client.shard_manager.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Shutdown requested; closing shards.");
                shard_manager.shutdown_all().await;
            }
            Err(err) => error!(?err, "failed to listen for Ctrl-C"),
        }
    });

    let result = client.start().await;
    store.close().await;
    result?;
    Ok(())
}

async fn init_cache(settings: &RedisSettings) -> CacheService {
    let prefix = settings.key_prefix.clone();

    if !settings.enabled {
        info!("Redis cache disabled (set REDIS_ENABLED=true to enable).");
        return CacheService::disabled(prefix);
    }

    let Some(redis_url) = settings.url.as_deref() else {
        warn!(key_prefix = %prefix, "REDIS_ENABLED=true but REDIS_URL is missing; using local cooldowns.");
        return CacheService::disabled(prefix);
    };

    let cache = match CacheService::redis(redis_url, prefix.clone()) {
        Ok(cache) => cache,
        Err(err) => {
            warn!(?err, key_prefix = %prefix, "Failed to initialize Redis cache; using local cooldowns.");
            return CacheService::disabled(prefix);
        }
    };

    match cache.ping().await {
        Ok(()) => {
            info!(key_prefix = %prefix, "Redis cache enabled.");
            cache
        }
        Err(err) => {
            warn!(?err, "Redis ping failed; using local cooldowns.");
            CacheService::disabled(prefix)
        }
    }
}

async fn on_error(error: poise::FrameworkError<'_, Data, Error>) {
    match error {
        poise::FrameworkError::Command { error, ctx, .. } => {
            error!(?error, command = %ctx.command().qualified_name, "command error");

            let embed = serenity::CreateEmbed::new()
                .title("Command Error")
                .description("Something went wrong while running this command.")
                .color(hearth_utils::embed::DEFAULT_EMBED_COLOR);

            let _ = ctx
                .send(poise::CreateReply::default().ephemeral(true).embed(embed))
                .await;
        }
        poise::FrameworkError::ArgumentParse { ctx, input, .. } => {
            let usage = hearth_commands::COMMANDS
                .iter()
                .find(|meta| meta.name == ctx.command().qualified_name)
                .map_or_else(
                    || format!("!{}", ctx.command().qualified_name),
                    |meta| meta.usage.to_owned(),
                );
            let description = if let Some(input) = input {
                format!("Invalid argument: `{}`\nUsage: `{}`", input, usage)
            } else {
                format!("Missing required argument.\nUsage: `{}`", usage)
            };

            let _ = ctx.say(description).await;
        }
        poise::FrameworkError::MissingUserPermissions { ctx, .. } => {
            let _ = ctx
                .say("You need the **Manage Server** permission to use this command.")
                .await;
        }
        poise::FrameworkError::UnknownCommand { .. } => {
            debug!("unknown command invocation");
        }
        other => {
            if let Err(err) = poise::builtins::on_error(other).await {
                error!(?err, "framework error");
            }
        }
    }
}

async fn handle_event(
    ctx: &serenity::Context,
    event: &serenity::FullEvent,
    _framework: poise::FrameworkContext<'_, Data, Error>,
    data: &Data,
) -> Result<(), Error> {
    match event {
        serenity::FullEvent::Message { new_message } => {
            events::activity::handle_message_xp(ctx, data, new_message).await;
        }
        serenity::FullEvent::ReactionAdd { add_reaction } => {
            events::activity::handle_reaction_xp(ctx, data, add_reaction).await;
        }
        _ => {}
    }

    Ok(())
}
