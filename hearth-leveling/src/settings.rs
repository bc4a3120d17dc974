use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Kinds of activity that earn XP.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    Message,
    Voice,
    Reaction,
}

impl ActivityKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Message => "message",
            Self::Voice => "voice",
            Self::Reaction => "reaction",
        }
    }
}

impl fmt::Display for ActivityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// XP tuning. Ranges are inclusive.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct XpSettings {
    pub message_xp_min: i64,
    pub message_xp_max: i64,
    pub message_cooldown: Duration,
    pub voice_xp_per_tick: i64,
    pub voice_tick: Duration,
    pub reaction_xp: i64,
    pub reaction_cooldown: Duration,
    /// Messages shorter than this (after trimming) earn nothing.
    pub min_message_chars: usize,
}

impl Default for XpSettings {
    fn default() -> Self {
        Self {
            message_xp_min: 15,
            message_xp_max: 25,
            message_cooldown: Duration::from_secs(60),
            voice_xp_per_tick: 10,
            voice_tick: Duration::from_secs(60),
            reaction_xp: 5,
            reaction_cooldown: Duration::from_secs(30),
            min_message_chars: 3,
        }
    }
}

impl XpSettings {
    pub fn cooldown_for(&self, kind: ActivityKind) -> Duration {
        match kind {
            ActivityKind::Message => self.message_cooldown,
            // Half a tick: a late award never blocks the next tick, a
            // duplicated tick is still rejected.
            ActivityKind::Voice => self.voice_tick / 2,
            ActivityKind::Reaction => self.reaction_cooldown,
        }
    }

    pub fn xp_range_for(&self, kind: ActivityKind) -> (i64, i64) {
        match kind {
            ActivityKind::Message => (self.message_xp_min, self.message_xp_max),
            ActivityKind::Voice => (self.voice_xp_per_tick, self.voice_xp_per_tick),
            ActivityKind::Reaction => (self.reaction_xp, self.reaction_xp),
        }
    }

    /// Minutes credited to `voice_minutes` per voice tick. `validate` only
    /// accepts ticks that are a whole number of minutes.
    pub fn voice_minutes_per_tick(&self) -> i64 {
        i64::try_from(self.voice_tick.as_secs() / 60).unwrap_or(i64::MAX)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.message_xp_min < 0 || self.message_xp_min > self.message_xp_max {
            anyhow::bail!(
                "message XP range {}..={} is invalid",
                self.message_xp_min,
                self.message_xp_max
            );
        }
        if self.voice_xp_per_tick < 0 || self.reaction_xp < 0 {
            anyhow::bail!("voice and reaction XP must not be negative");
        }
        for kind in [ActivityKind::Message, ActivityKind::Voice, ActivityKind::Reaction] {
            if self.cooldown_for(kind).is_zero() {
                anyhow::bail!("{kind} cooldown must be greater than zero");
            }
        }
        if self.voice_tick.subsec_nanos() != 0 || self.voice_tick.as_secs() % 60 != 0 {
            anyhow::bail!(
                "voice tick of {}s must be a whole number of minutes",
                self.voice_tick.as_secs()
            );
        }
        Ok(())
    }
}
