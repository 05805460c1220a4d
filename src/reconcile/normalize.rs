//! Title normalization for task identity.

const QUOTES: [char; 7] = ['"', '\'', '`', '\u{201C}', '\u{201D}', '\u{2018}', '\u{2019}'];

/// Normalize a task title for duplicate detection.
///
/// Lowercases, strips quote characters, collapses whitespace runs to a
/// single space, then strips trailing punctuation. Two titles name the same
/// task iff their normalized forms are equal.
#[must_use]
pub fn normalize_title(title: &str) -> String {
    let lowered = title.to_lowercase().replace(QUOTES, "");
    let collapsed = lowered.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed
        .trim_end_matches(|c: char| c.is_ascii_punctuation() || c == '…' || c.is_whitespace())
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalization_rules() {
        assert_eq!(normalize_title("  Fix Login Bug.  "), "fix login bug");
        assert_eq!(normalize_title("Fix   login\tbug!!"), "fix login bug");
        assert_eq!(normalize_title("\"Fix login bug\""), "fix login bug");
        assert_eq!(normalize_title("Don't break prod?"), "dont break prod");
        assert_eq!(normalize_title("\u{201C}Ship v2\u{201D}…"), "ship v2");
        assert_eq!(normalize_title("  Refactor   Auth   Module!!  "), "refactor auth module");
    }

    #[test]
    fn test_interior_punctuation_is_kept() {
        assert_eq!(normalize_title("Bump serde to 1.0"), "bump serde to 1.0");
        assert_ne!(normalize_title("fix a.b"), normalize_title("fix ab"));
    }

    #[test]
    fn test_empty_forms() {
        assert_eq!(normalize_title("   "), "");
        assert_eq!(normalize_title("\"...\""), "");
    }
}
