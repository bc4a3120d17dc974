use std::collections::HashMap;
use std::sync::Arc;

use poise::serenity_prelude as serenity;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use hearth_core::Data;
use hearth_leveling::ActivityKind;

use crate::events::activity::award;

/// What the tick needs to know about one voice state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VoiceSnapshot {
    pub user_id: u64,
    pub channel_id: u64,
    pub is_bot: bool,
    pub deafened: bool,
}

/// Members earning voice XP this tick.
///
/// A member qualifies when they are human, not deafened, and share their
/// channel with at least one other human. Deafened humans still count as
/// company for everyone else.
pub fn eligible_voice_members<I>(states: I) -> Vec<u64>
where
    I: IntoIterator<Item = VoiceSnapshot>,
{
    let humans: Vec<VoiceSnapshot> = states.into_iter().filter(|state| !state.is_bot).collect();

    let mut per_channel: HashMap<u64, usize> = HashMap::new();
    for state in &humans {
        *per_channel.entry(state.channel_id).or_default() += 1;
    }

    let mut eligible: Vec<u64> = humans
        .iter()
        .filter(|state| !state.deafened)
        .filter(|state| per_channel.get(&state.channel_id).copied().unwrap_or(0) >= 2)
        .map(|state| state.user_id)
        .collect();
    eligible.sort_unstable();
    eligible
}

fn guild_snapshots(ctx: &serenity::Context, guild_id: serenity::GuildId) -> Vec<VoiceSnapshot> {
    let Some(guild) = ctx.cache.guild(guild_id) else {
        return Vec::new();
    };

    let afk_channel = guild
        .afk_metadata
        .as_ref()
        .map(|afk| afk.afk_channel_id);

    guild
        .voice_states
        .values()
        .filter_map(|state| {
            let channel_id = state.channel_id?;
            if Some(channel_id) == afk_channel {
                return None;
            }
            let is_bot = state
                .member
                .as_ref()
                .map(|member| member.user.bot)
                .or_else(|| guild.members.get(&state.user_id).map(|member| member.user.bot))
                .unwrap_or(false);
            Some(VoiceSnapshot {
                user_id: state.user_id.get(),
                channel_id: channel_id.get(),
                is_bot,
                deafened: state.deaf || state.self_deaf,
            })
        })
        .collect()
}

/// Award voice XP once per tick until the process exits.
pub async fn run_voice_ticks(ctx: serenity::Context, data: Arc<Data>) {
    let tick = data.engine.settings().voice_tick;
    let mut interval = tokio::time::interval(tick);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick fires immediately; nobody has been in voice for a full tick yet.
    interval.tick().await;

    info!(tick_secs = tick.as_secs(), "Voice XP ticker started.");

    loop {
        interval.tick().await;

        let guilds = match data.config.guild_id {
            Some(guild_id) => vec![serenity::GuildId::new(guild_id)],
            None => ctx.cache.guilds(),
        };

        for guild_id in guilds {
            let eligible = eligible_voice_members(guild_snapshots(&ctx, guild_id));
            if eligible.is_empty() {
                continue;
            }

            debug!(guild_id = guild_id.get(), members = eligible.len(), "voice tick");
            for user_id in eligible {
                award(
                    &ctx,
                    &data,
                    guild_id,
                    serenity::UserId::new(user_id),
                    ActivityKind::Voice,
                    None,
                )
                .await;
            }
        }
    }
}
