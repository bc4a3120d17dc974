use poise::serenity_prelude as serenity;

/// Default embed color used across the bot UI.
pub const DEFAULT_EMBED_COLOR: u32 = 0xE8_7A_2E;
/// Accent used for level-up and milestone announcements.
pub const LEVEL_UP_EMBED_COLOR: u32 = 0xF5_C2_42;

/// Build a standard embed with the bot's styling.
pub fn base_embed(title: &str, description: impl Into<String>) -> serenity::CreateEmbed {
    serenity::CreateEmbed::new()
        .title(title.to_owned())
        .color(DEFAULT_EMBED_COLOR)
        .description(description)
}

/// Footer text for a page, with an optional note appended.
///
/// Single-page listings show only the note (or nothing).
pub fn page_footer_text(page: usize, total_pages: usize, footer_note: Option<&str>) -> String {
    let page = page.max(1);
    let total_pages = total_pages.max(1);
    let note = footer_note.filter(|note| !note.is_empty());

    match (total_pages > 1, note) {
        (true, Some(note)) => format!("Page {}/{} • {}", page, total_pages, note),
        (true, None) => format!("Page {}/{}", page, total_pages),
        (false, Some(note)) => note.to_owned(),
        (false, None) => String::new(),
    }
}

/// Build a paginated embed with an optional footer suffix.
pub fn build_paginated_embed(
    title: &str,
    description: impl Into<String>,
    page: usize,
    total_pages: usize,
    footer_note: Option<&str>,
) -> serenity::CreateEmbed {
    let footer_text = page_footer_text(page, total_pages, footer_note);
    let builder = base_embed(title, description);

    if footer_text.is_empty() {
        builder
    } else {
        builder.footer(serenity::CreateEmbedFooter::new(footer_text))
    }
}
