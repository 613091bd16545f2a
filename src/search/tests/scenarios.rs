use crate::search::{search, search_fuzzy, try_align, MatchRange, SearchError};
use crate::transliterate::transliterate;

use super::assert_well_formed;

fn covered<'a>(text: &'a str, ranges: &[MatchRange]) -> Vec<&'a str> {
    ranges.iter().map(|r| r.slice(text).unwrap()).collect()
}

#[test]
fn test_beijing_in_sentence() {
    let text = "我爱北京天安门";
    let ranges = search(text, "beijing").unwrap();
    assert_eq!(ranges, vec![MatchRange::new(2, 3)]);
    assert_eq!(covered(text, &ranges), vec!["北京"]);
}

#[test]
fn test_exact_path_for_latin() {
    assert_eq!(search("Hello世界", "hello"), Some(vec![MatchRange::new(0, 4)]));
}

#[test]
fn test_zhongguo() {
    let text = "我是中国人";
    let ranges = search(text, "zhongguo").unwrap();
    assert_eq!(covered(text, &ranges), vec!["中国"]);
}

#[test]
fn test_no_match() {
    assert_eq!(search("abc", "xyz"), None);
}

#[test]
fn test_empty_source() {
    assert_eq!(search("", "a"), None);
}

#[test]
fn test_window_scopes_search() {
    let source = transliterate("我爱北京天安门我爱上海");
    assert_eq!(
        search_fuzzy(&source, "shanghai", Some(7..=10)),
        Some(vec![MatchRange::new(9, 10)])
    );
    assert_eq!(search_fuzzy(&source, "shanghai", Some(0..=6)), None);
}

#[test]
fn test_blank_query() {
    assert_eq!(search("我爱北京", ""), None);
    assert_eq!(search("我爱北京", "   "), None);
    assert_eq!(
        try_align(&transliterate("我爱北京"), " ", None),
        Err(SearchError::EmptyQuery)
    );
}

#[test]
fn test_query_with_spaces() {
    let text = "我爱北京天安门";
    assert_eq!(search(text, "bei jing"), Some(vec![MatchRange::new(2, 3)]));
    assert_eq!(search(text, "Tian An Men"), Some(vec![MatchRange::new(4, 6)]));
}

#[test]
fn test_initials() {
    let text = "我爱北京天安门";
    assert_eq!(search(text, "tam"), Some(vec![MatchRange::new(4, 6)]));
}

#[test]
fn test_han_query_matches_homophones() {
    // 京 and 经 share the reading "jing".
    let text = "北经";
    assert_eq!(search(text, "北京"), Some(vec![MatchRange::new(0, 1)]));
}

#[test]
fn test_mixed_script_text() {
    let text = "Rust 编程语言 guide";
    let ranges = search(text, "biancheng").unwrap();
    assert_eq!(covered(text, &ranges), vec!["编程"]);
    assert_well_formed(&ranges, text.chars().count());
}

#[test]
fn test_disjoint_ranges() {
    let text = "北方的京城";
    let ranges = search(text, "beijing").unwrap();
    assert_eq!(ranges, vec![MatchRange::new(0, 0), MatchRange::new(3, 3)]);
    assert_well_formed(&ranges, text.chars().count());
}

#[test]
fn test_incoherent_query_fails() {
    assert_eq!(search("北京", "eijing"), None);
    assert_eq!(
        try_align(&transliterate("北京"), "eijing", None),
        Err(SearchError::NoCoherentAlignment)
    );
}

#[test]
fn test_invalid_window() {
    let source = transliterate("上海");
    assert_eq!(search_fuzzy(&source, "shanghai", Some(0..=2)), None);
    assert!(matches!(
        try_align(&source, "shanghai", Some(0..=2)),
        Err(SearchError::InvalidWindow { len: 2, .. })
    ));
}
