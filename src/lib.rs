//! Pinyin-aware fuzzy search over mixed Chinese and Latin text.
//!
//! A query such as `"bj"` or `"beijing"` finds `北京` inside a sentence, and
//! every hit is reported as inclusive ranges of original character indices
//! so callers can highlight the source text directly.

pub mod boundary;
pub mod corpus;
pub mod search;
pub mod settings;
mod trace_init;
pub mod transliterate;
pub mod unicode;

pub use boundary::{BoundaryMap, Span};
pub use corpus::{
    search_corpus, search_corpus_with, CorpusError, CorpusOptions, Document, DocumentMatches,
};
pub use search::{
    explain, search, search_exact, search_fuzzy, try_align, Alignment, ExplainResult, MatchRange,
    Run, SearchError,
};
pub use trace_init::{init_tracing, TraceGuard};
pub use transliterate::{phonetic_query, transliterate, Transliteration, Transliterator};
