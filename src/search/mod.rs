//! Query matching against original text.
//!
//! A verbatim (case-folded) occurrence of the query wins outright. Otherwise
//! the text is transliterated and the query is aligned against its pinyin
//! with a coherence-scored subsequence DP; the resulting runs are mapped
//! back to original character ranges for highlighting.

mod align;
mod exact;
pub mod explain;

#[cfg(test)]
mod tests;

use std::ops::{Range, RangeInclusive};

use serde::{Deserialize, Serialize};
use tracing::{debug, debug_span};

use crate::transliterate::{transliterate, Transliteration};

pub use align::{try_align, Alignment, Run};
pub use exact::search_exact;
pub use explain::{explain, format_text, underline, ExplainBoundary, ExplainResult};

/// Inclusive range of original character indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MatchRange {
    pub start: usize,
    pub end: usize,
}

impl MatchRange {
    pub fn new(start: usize, end: usize) -> Self {
        debug_assert!(start <= end);
        Self { start, end }
    }

    /// Number of original characters covered.
    pub fn char_count(&self) -> usize {
        self.end - self.start + 1
    }

    pub fn contains(&self, index: usize) -> bool {
        self.start <= index && index <= self.end
    }

    /// Byte range of this match inside `text`, for renderers that slice
    /// `&str`. `None` if the range lies outside the text.
    pub fn byte_range(&self, text: &str) -> Option<Range<usize>> {
        let mut indices = text.char_indices().map(|(b, _)| b).skip(self.start);
        let start = indices.next()?;
        let mut rest = indices.skip(self.end - self.start);
        let end = match rest.next() {
            Some(b) => b,
            None if text.chars().count() > self.end => text.len(),
            None => return None,
        };
        Some(start..end)
    }

    /// The covered slice of `text`.
    pub fn slice<'a>(&self, text: &'a str) -> Option<&'a str> {
        self.byte_range(text).map(|r| &text[r])
    }
}

/// Why a search produced no ranges.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SearchError {
    #[error("query is blank")]
    EmptyQuery,

    #[error("window {start}..={end} is outside a source of {len} characters")]
    InvalidWindow { start: usize, end: usize, len: usize },

    #[error("query letters do not occur in order in the source")]
    NoSubsequence,

    #[error("no boundary-coherent alignment covers the query")]
    NoCoherentAlignment,

    #[error("query has {letters} phonetic letters, the limit is {limit}")]
    QueryTooLong { letters: usize, limit: usize },

    #[error("alignment table of {cells} cells exceeds the limit of {limit}")]
    TooLarge { cells: usize, limit: usize },

    #[error("alignment needs {steps} steps, the limit is {limit}")]
    WorkLimit { steps: usize, limit: usize },
}

impl SearchError {
    /// Stable name of the failure kind, used in logs and diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            SearchError::EmptyQuery => "EmptyQuery",
            SearchError::InvalidWindow { .. } => "InvalidWindow",
            SearchError::NoSubsequence => "NoSubsequence",
            SearchError::NoCoherentAlignment => "NoCoherentAlignment",
            SearchError::QueryTooLong { .. } => "QueryTooLong",
            SearchError::TooLarge { .. } => "TooLarge",
            SearchError::WorkLimit { .. } => "WorkLimit",
        }
    }
}

/// Fuzzy-align `query` against a transliterated source.
///
/// `window` restricts the search to an inclusive range of original
/// characters; `None` searches the whole text. Returned ranges are in
/// original coordinates of the full text.
pub fn search_fuzzy(
    source: &Transliteration,
    query: &str,
    window: Option<RangeInclusive<usize>>,
) -> Option<Vec<MatchRange>> {
    match try_align(source, query, window) {
        Ok(alignment) => Some(alignment.ranges),
        Err(err) => {
            debug!(kind = err.kind(), %err, "fuzzy search failed");
            None
        }
    }
}

/// Search `text` for `query`: exact substring first, then fuzzy pinyin
/// alignment over the whole text.
pub fn search(text: &str, query: &str) -> Option<Vec<MatchRange>> {
    let _span = debug_span!("search", query).entered();
    if query.trim().is_empty() {
        debug!(kind = SearchError::EmptyQuery.kind());
        return None;
    }
    if let Some(range) = search_exact(text, query) {
        debug!(start = range.start, end = range.end, "exact hit");
        return Some(vec![range]);
    }
    let source = transliterate(text);
    search_fuzzy(&source, query, None)
}

#[cfg(test)]
mod range_tests {
    use super::*;

    #[test]
    fn test_byte_range_ascii() {
        let r = MatchRange::new(1, 3);
        assert_eq!(r.byte_range("abcdef"), Some(1..4));
        assert_eq!(r.slice("abcdef"), Some("bcd"));
    }

    #[test]
    fn test_byte_range_multibyte() {
        let text = "我爱北京";
        let r = MatchRange::new(2, 3);
        assert_eq!(r.byte_range(text), Some(6..12));
        assert_eq!(r.slice(text), Some("北京"));
    }

    #[test]
    fn test_byte_range_out_of_bounds() {
        assert_eq!(MatchRange::new(2, 4).byte_range("abc"), None);
        assert_eq!(MatchRange::new(3, 3).byte_range("abc"), None);
        assert_eq!(MatchRange::new(2, 2).byte_range("abc"), Some(2..3));
    }

    #[test]
    fn test_char_count_and_contains() {
        let r = MatchRange::new(4, 6);
        assert_eq!(r.char_count(), 3);
        assert!(r.contains(4) && r.contains(6));
        assert!(!r.contains(7));
    }

    #[test]
    fn test_error_kinds() {
        assert_eq!(SearchError::NoSubsequence.kind(), "NoSubsequence");
        let err = SearchError::InvalidWindow {
            start: 3,
            end: 1,
            len: 2,
        };
        assert_eq!(err.kind(), "InvalidWindow");
        assert!(err.to_string().contains("3..=1"));
    }
}
