/// Reduce a role or channel display name to a comparable form.
///
/// Lowercases, drops decorative prefixes (emoji, `・`, `|`), and collapses
/// separators so `"🎉・Level-Ups"` and `"level ups"` compare equal.
pub fn normalize_display_name(raw: &str) -> String {
    raw.split(|ch: char| !ch.is_alphanumeric())
        .filter(|part| !part.is_empty())
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("-")
}

/// Whether two display names refer to the same role or channel.
pub fn display_names_match(left: &str, right: &str) -> bool {
    let left = normalize_display_name(left);
    !left.is_empty() && left == normalize_display_name(right)
}

/// Find the first candidate whose name matches `wanted`.
pub fn find_by_display_name<'a, T, I>(
    candidates: I,
    wanted: &str,
    name: impl Fn(&T) -> &str,
) -> Option<&'a T>
where
    I: IntoIterator<Item = &'a T>,
    T: 'a,
{
    candidates
        .into_iter()
        .find(|candidate| display_names_match(name(*candidate), wanted))
}

#[cfg(test)]
mod tests {
    use super::{display_names_match, find_by_display_name, normalize_display_name};

    #[test]
    fn strips_decorations() {
        assert_eq!(normalize_display_name("🎉・Level-Ups"), "level-ups");
        assert_eq!(normalize_display_name("| bot commands |"), "bot-commands");
        assert_eq!(normalize_display_name("Solar Flare"), "solar-flare");
        assert_eq!(normalize_display_name("✨"), "");
    }

    #[test]
    fn matching_ignores_case_and_separators() {
        assert!(display_names_match("level-ups", "🎉・level ups"));
        assert!(display_names_match("Eternal Flame", "eternal-flame"));
        assert!(!display_names_match("Flame", "Eternal Flame"));
        assert!(!display_names_match("", "✨"));
    }

    #[test]
    fn finds_first_matching_candidate() {
        let names = vec!["general".to_owned(), "🎉・level-ups".to_owned()];
        let found = find_by_display_name(&names, "Level Ups", |name| name.as_str());
        assert_eq!(found.map(String::as_str), Some("🎉・level-ups"));
        assert!(find_by_display_name(&names, "spam", |name| name.as_str()).is_none());
    }
}
