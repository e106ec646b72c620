//! Command name to file name mapping.

use regex::Regex;
use std::sync::LazyLock;

static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s").expect("whitespace pattern is valid"));

static DISALLOWED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9\-]").expect("disallowed pattern is valid"));

/// Map an arbitrary command name to a file-name-safe token.
///
/// Every whitespace character becomes `-`, then anything outside
/// `[A-Za-z0-9-]` is dropped. Distinct names may map to the same token.
pub fn sanitize(raw: &str) -> String {
    let hyphenated = WHITESPACE.replace_all(raw, "-");
    DISALLOWED.replace_all(&hyphenated, "").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replaces_spaces_and_strips_punctuation() {
        assert_eq!(sanitize("Nightly Report!"), "Nightly-Report");
    }

    #[test]
    fn empty_stays_empty() {
        assert_eq!(sanitize(""), "");
    }

    #[test]
    fn only_disallowed_characters_yield_empty() {
        assert_eq!(sanitize("!@#$%^&*()"), "");
        assert_eq!(sanitize("::./"), "");
    }

    #[test]
    fn each_whitespace_character_becomes_one_hyphen() {
        assert_eq!(sanitize("a  b"), "a--b");
        assert_eq!(sanitize("a\tb\nc"), "a-b-c");
    }

    #[test]
    fn framework_style_names() {
        assert_eq!(sanitize("app:report:nightly"), "appreportnightly");
        assert_eq!(sanitize("cache-warmup"), "cache-warmup");
        assert_eq!(sanitize("../../etc/passwd"), "etcpasswd");
    }

    #[test]
    fn non_ascii_letters_are_dropped() {
        assert_eq!(sanitize("café run"), "caf-run");
    }

    #[test]
    fn distinct_names_can_collide() {
        assert_eq!(sanitize("job:a"), sanitize("joba"));
    }
}
