use std::time::Duration;

use poise::serenity_prelude as serenity;

use crate::embed::build_paginated_embed;

pub const PAGINATION_TIMEOUT_SECS: u64 = 60 * 3;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum PageButton {
    First,
    Prev,
    Next,
    Last,
}

impl PageButton {
    const ALL: [PageButton; 4] = [Self::First, Self::Prev, Self::Next, Self::Last];

    fn suffix(self) -> &'static str {
        match self {
            Self::First => "first",
            Self::Prev => "prev",
            Self::Next => "next",
            Self::Last => "last",
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::First => "«",
            Self::Prev => "Prev",
            Self::Next => "Next",
            Self::Last => "»",
        }
    }

    fn custom_id(self, session: u64) -> String {
        format!("{}_page_{}", session, self.suffix())
    }

    fn parse(custom_id: &str, session: u64) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|button| button.custom_id(session) == custom_id)
    }

    /// Zero-based page this button leads to from `current`.
    fn target(self, current: usize, total: usize) -> usize {
        let last = total.saturating_sub(1);
        match self {
            Self::First => 0,
            Self::Prev => current.saturating_sub(1),
            Self::Next => (current + 1).min(last),
            Self::Last => last,
        }
    }

    fn disabled_on(self, current: usize, total: usize) -> bool {
        self.target(current, total) == current
    }
}

fn page_buttons(session: u64, current: usize, total: usize) -> Vec<serenity::CreateActionRow> {
    let buttons = PageButton::ALL
        .into_iter()
        .map(|button| {
            serenity::CreateButton::new(button.custom_id(session))
                .label(button.label())
                .style(serenity::ButtonStyle::Secondary)
                .disabled(button.disabled_on(current, total))
        })
        .collect();
    vec![serenity::CreateActionRow::Buttons(buttons)]
}

/// Send pre-rendered pages as an embed with navigation buttons.
///
/// `start_page` is 1-based and clamped. Only the invoking author can flip
/// pages; the buttons are stripped once the collector times out.
pub async fn paginate_embed_pages<U, E>(
    ctx: poise::Context<'_, U, E>,
    title: &str,
    pages: &[String],
    start_page: usize,
    footer_note: Option<&str>,
) -> Result<(), serenity::Error>
where
    U: Send + Sync,
    E: Send + Sync,
{
    let total = pages.len();
    if total == 0 {
        return Ok(());
    }

    let render = |page: usize| {
        build_paginated_embed(title, pages[page].clone(), page + 1, total, footer_note)
    };
    let mut current = start_page.clamp(1, total) - 1;

    let mut reply = poise::CreateReply::default().embed(render(current));
    if total == 1 {
        ctx.send(reply).await?;
        return Ok(());
    }

    let session = ctx.id();
    reply = reply.components(page_buttons(session, current, total));
    let message = ctx.send(reply).await?.into_message().await?;

    let author_id = ctx.author().id;
    let message_id = message.id;
    loop {
        let press = serenity::collector::ComponentInteractionCollector::new(ctx)
            .message_id(message_id)
            .author_id(author_id)
            .timeout(Duration::from_secs(PAGINATION_TIMEOUT_SECS))
            .await;
        let Some(press) = press else {
            break;
        };
        let Some(button) = PageButton::parse(&press.data.custom_id, session) else {
            continue;
        };

        current = button.target(current, total);
        let update = serenity::CreateInteractionResponseMessage::new()
            .embed(render(current))
            .components(page_buttons(session, current, total));
        press
            .create_response(
                ctx.http(),
                serenity::CreateInteractionResponse::UpdateMessage(update),
            )
            .await?;
    }

    let _ = message
        .channel_id
        .edit_message(
            ctx.http(),
            message_id,
            serenity::EditMessage::new()
                .embed(render(current))
                .components(Vec::new()),
        )
        .await;

    Ok(())
}
