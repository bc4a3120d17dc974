use rand::Rng;

use crate::settings::{ActivityKind, XpSettings};

/// Roll the XP earned for one qualifying activity.
pub fn roll_xp<R>(settings: &XpSettings, kind: ActivityKind, rng: &mut R) -> i64
where
    R: Rng + ?Sized,
{
    let (min, max) = settings.xp_range_for(kind);
    if min >= max {
        return min.max(0);
    }
    rng.random_range(min..=max)
}

/// Whether a message is substantial enough to earn XP.
pub fn message_qualifies(content: &str, settings: &XpSettings) -> bool {
    content.trim().chars().count() >= settings.min_message_chars
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::{message_qualifies, roll_xp};
    use crate::settings::{ActivityKind, XpSettings};

    #[test]
    fn message_rolls_stay_in_range() {
        let settings = XpSettings::default();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..500 {
            let xp = roll_xp(&settings, ActivityKind::Message, &mut rng);
            assert!((15..=25).contains(&xp));
        }
    }

    #[test]
    fn fixed_awards_are_exact() {
        let settings = XpSettings::default();
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(roll_xp(&settings, ActivityKind::Voice, &mut rng), 10);
        assert_eq!(roll_xp(&settings, ActivityKind::Reaction, &mut rng), 5);
    }

    #[test]
    fn short_messages_do_not_qualify() {
        let settings = XpSettings::default();
        assert!(!message_qualifies("  ok  ", &settings));
        assert!(!message_qualifies("", &settings));
        assert!(message_qualifies("hey", &settings));
        assert!(message_qualifies("héé", &settings));
    }
}
