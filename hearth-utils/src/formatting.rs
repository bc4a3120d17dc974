/// Format an integer with thousands separators (e.g. 1234567 -> "1,234,567").
pub fn format_thousands(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);

    if value < 0 {
        out.push('-');
    }

    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }

    out
}

/// Render a fixed-width text progress bar.
///
/// `current` is clamped into `[0, total]`; a zero `total` renders an empty bar.
pub fn progress_bar(current: i64, total: i64, width: usize) -> String {
    let width = width.max(1);
    let filled = if total <= 0 {
        0
    } else {
        let current = current.clamp(0, total) as u128;
        ((current * width as u128) / total as u128) as usize
    };

    let mut bar = String::with_capacity(width * 3);
    bar.push_str(&"█".repeat(filled));
    bar.push_str(&"░".repeat(width - filled));
    bar
}

/// Format a leaderboard position ("🥇", "🥈", "🥉", then "#4", "#5", ...).
pub fn format_rank(position: u64) -> String {
    match position {
        1 => "🥇".to_owned(),
        2 => "🥈".to_owned(),
        3 => "🥉".to_owned(),
        other => format!("#{}", other),
    }
}

/// Format minutes into a compact human-readable duration (e.g. 45m, 2h 5m, 3d 4h).
pub fn format_minutes(total_minutes: i64) -> String {
    let total_minutes = total_minutes.max(0);
    let days = total_minutes / 1_440;
    let hours = (total_minutes % 1_440) / 60;
    let minutes = total_minutes % 60;

    if days > 0 {
        return if hours > 0 {
            format!("{}d {}h", days, hours)
        } else {
            format!("{}d", days)
        };
    }

    if hours > 0 {
        return if minutes > 0 {
            format!("{}h {}m", hours, minutes)
        } else {
            format!("{}h", hours)
        };
    }

    format!("{}m", minutes)
}
