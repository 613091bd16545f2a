use crate::unicode::fold_char;

use super::MatchRange;

/// Case-insensitive literal search for `query` in `text`.
///
/// Returns the leftmost occurrence in character coordinates. Blank queries
/// never match.
pub fn search_exact(text: &str, query: &str) -> Option<MatchRange> {
    if query.trim().is_empty() {
        return None;
    }
    let needle: Vec<char> = query.chars().map(fold_char).collect();
    let haystack: Vec<char> = text.chars().map(fold_char).collect();
    if needle.len() > haystack.len() {
        return None;
    }
    haystack
        .windows(needle.len())
        .position(|w| w == needle.as_slice())
        .map(|start| MatchRange::new(start, start + needle.len() - 1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_ascii_case_insensitive() {
        assert_eq!(search_exact("Hello世界", "hello"), Some(MatchRange::new(0, 4)));
        assert_eq!(search_exact("say HELLO", "Hello"), Some(MatchRange::new(4, 8)));
    }

    #[test]
    fn test_exact_han() {
        assert_eq!(search_exact("我爱北京天安门", "北京"), Some(MatchRange::new(2, 3)));
    }

    #[test]
    fn test_exact_leftmost() {
        assert_eq!(search_exact("abab", "ab"), Some(MatchRange::new(0, 1)));
    }

    #[test]
    fn test_exact_fullwidth() {
        assert_eq!(search_exact("ＡＢＣ", "abc"), Some(MatchRange::new(0, 2)));
    }

    #[test]
    fn test_exact_miss() {
        assert_eq!(search_exact("abc", "abd"), None);
        assert_eq!(search_exact("ab", "abc"), None);
        assert_eq!(search_exact("", "a"), None);
    }

    #[test]
    fn test_exact_blank_query() {
        assert_eq!(search_exact("abc", ""), None);
        assert_eq!(search_exact("a b", " "), None);
    }

    #[test]
    fn test_exact_keeps_inner_spaces() {
        assert_eq!(search_exact("new york city", "york c"), Some(MatchRange::new(4, 9)));
    }
}
