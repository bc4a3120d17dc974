pub mod capabilities;
pub mod config;

use std::sync::Arc;

use hearth_leveling::LevelingEngine;

pub use capabilities::{CardBackground, Capabilities};
pub use config::BotConfig;

pub type Error = anyhow::Error;

#[derive(Clone, Debug)]
pub struct Data {
    pub engine: LevelingEngine,
    pub config: Arc<BotConfig>,
    pub capabilities: Capabilities,
}

pub type Context<'a> = poise::Context<'a, Data, Error>;
