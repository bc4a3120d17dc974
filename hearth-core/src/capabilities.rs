use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::config::CardBackgroundSource;

/// Level-card background that resolved at startup.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CardBackground {
    Remote(String),
    Local(PathBuf),
}

impl CardBackground {
    /// File name used when the local image is attached to a message.
    pub fn attachment_name(&self) -> Option<String> {
        match self {
            Self::Remote(_) => None,
            Self::Local(path) => path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned()),
        }
    }
}

/// Optional features detected at startup.
///
/// Each flag is false exactly when its dependency could not be brought up,
/// and the bot falls back accordingly (JSON storage, local cooldowns, plain
/// embeds).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Capabilities {
    pub postgres: bool,
    pub redis: bool,
    pub card_background: Option<CardBackground>,
}

impl Capabilities {
    pub fn level_cards(&self) -> bool {
        self.card_background.is_some()
    }
}

fn is_remote_url(raw: &str) -> bool {
    let lower = raw.to_ascii_lowercase();
    (lower.starts_with("https://") || lower.starts_with("http://")) && raw.len() > "https://".len()
}

/// Pick the configured remote URL, else the first local path that exists.
pub async fn resolve_card_background(source: &CardBackgroundSource) -> Option<CardBackground> {
    if let Some(url) = source.url.as_deref() {
        if is_remote_url(url) {
            info!(url, "Level-card background: remote image.");
            return Some(CardBackground::Remote(url.to_owned()));
        }
        warn!(url, "LEVEL_CARD_BACKGROUND_URL is not an http(s) URL; probing local paths.");
    }

    for path in &source.local_paths {
        if is_file(path).await {
            info!(path = %path.display(), "Level-card background: local image.");
            return Some(CardBackground::Local(path.clone()));
        }
    }

    warn!("No level-card background found; rank cards fall back to plain embeds.");
    None
}

async fn is_file(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .map(|metadata| metadata.is_file())
        .unwrap_or(false)
}
