use std::ops::RangeInclusive;

use serde::Serialize;

use crate::transliterate::{phonetic_query, transliterate};

use super::align::{align_letters, first_occurrences, phonetic_bounds, Limits};
use super::{search_exact, MatchRange, Run};

/// Full diagnostic result for a single search.
#[derive(Debug, Serialize)]
pub struct ExplainResult {
    pub text: String,
    pub query: String,
    pub phonetic: String,
    pub boundaries: Vec<ExplainBoundary>,
    pub query_phonetic: String,
    pub window: Option<(usize, usize)>,
    /// Verbatim hit; only tried when no window is given.
    pub exact: Option<MatchRange>,
    /// First phonetic position of each query letter, in order.
    pub feasibility: Option<Vec<usize>>,
    pub runs: Vec<Run>,
    pub score: Option<u64>,
    /// Ranges a search would return.
    pub ranges: Vec<MatchRange>,
    /// Failure kind of the fuzzy path, if it failed.
    pub failure: Option<String>,
    pub failure_message: Option<String>,
}

/// One original character and the phonetic letters it produced.
#[derive(Debug, Serialize)]
pub struct ExplainBoundary {
    pub index: usize,
    pub source: char,
    pub letters: String,
    pub start: usize,
    pub end: usize,
}

impl ExplainResult {
    pub fn matched(&self) -> bool {
        !self.ranges.is_empty()
    }
}

/// Run a search and record every intermediate step.
///
/// The fuzzy path is always evaluated so its runs can be inspected even
/// when the exact path already answers the query.
pub fn explain(text: &str, query: &str, window: Option<RangeInclusive<usize>>) -> ExplainResult {
    let source = transliterate(text);
    let letters = phonetic_query(query);

    let boundaries = text
        .chars()
        .zip(source.map().spans())
        .enumerate()
        .map(|(index, (ch, span))| ExplainBoundary {
            index,
            source: ch,
            letters: source.letters()[span.start..=span.end].iter().collect(),
            start: span.start,
            end: span.end,
        })
        .collect();

    let exact = match window {
        None => search_exact(text, query),
        Some(_) => None,
    };

    let feasibility = phonetic_bounds(&source, window.clone())
        .ok()
        .and_then(|bounds| {
            let offset = *bounds.start();
            first_occurrences(&source.letters()[bounds], &letters)
                .map(|positions| positions.into_iter().map(|p| p + offset).collect())
        });

    let fuzzy = align_letters(&source, &letters, window.clone(), Limits::from_settings());

    let (runs, score, fuzzy_ranges, failure, failure_message) = match fuzzy {
        Ok(a) => (a.runs, Some(a.score), a.ranges, None, None),
        Err(err) => (
            Vec::new(),
            None,
            Vec::new(),
            Some(err.kind().to_string()),
            Some(err.to_string()),
        ),
    };

    let ranges = match exact {
        Some(range) => vec![range],
        None => fuzzy_ranges,
    };

    ExplainResult {
        text: text.to_string(),
        query: query.to_string(),
        phonetic: source.phonetic(),
        boundaries,
        query_phonetic: letters.iter().collect(),
        window: window.map(|w| (*w.start(), *w.end())),
        exact,
        feasibility,
        runs,
        score,
        ranges,
        failure,
        failure_message,
    }
}

/// Caret line that underlines `ranges` when printed below `text` in a
/// monospace terminal. Wide characters get two carets.
pub fn underline(text: &str, ranges: &[MatchRange]) -> String {
    use unicode_width::UnicodeWidthChar;
    let mut out = String::new();
    for (i, ch) in text.chars().enumerate() {
        let width = UnicodeWidthChar::width(ch).unwrap_or(0);
        let mark = if ranges.iter().any(|r| r.contains(i)) {
            '^'
        } else {
            ' '
        };
        out.extend(std::iter::repeat(mark).take(width));
    }
    out.trim_end().to_string()
}

/// Format an ExplainResult as human-readable text.
pub fn format_text(result: &ExplainResult) -> String {
    use unicode_width::UnicodeWidthStr;
    let mut out = String::new();

    out.push_str(&format!(
        "=== \"{}\" -> {} ({} chars, {} letters) ===\n",
        result.text,
        result.phonetic,
        result.boundaries.len(),
        result.phonetic.chars().count(),
    ));
    for b in &result.boundaries {
        let label = b.source.to_string();
        let pad = 4usize.saturating_sub(UnicodeWidthStr::width(label.as_str()));
        out.push_str(&format!(
            "  {:>3} {}{} [{:>3},{:>3}] {}\n",
            b.index,
            label,
            " ".repeat(pad),
            b.start,
            b.end,
            b.letters,
        ));
    }

    out.push_str(&format!("\nQuery: \"{}\" -> {}\n", result.query, result.query_phonetic));
    if let Some((start, end)) = result.window {
        out.push_str(&format!("Window: {start}..={end}\n"));
    }
    match result.exact {
        Some(r) => out.push_str(&format!("Exact: [{},{}]\n", r.start, r.end)),
        None => out.push_str("Exact: none\n"),
    }
    match &result.feasibility {
        Some(positions) => out.push_str(&format!("Feasible: {positions:?}\n")),
        None => out.push_str("Feasible: no\n"),
    }

    if !result.runs.is_empty() {
        out.push_str(&format!("\n=== Runs ({}) ===\n", result.runs.len()));
        for run in &result.runs {
            out.push_str(&format!(
                "  letters={:<3} phonetic=[{},{}] chars=[{},{}] score={}\n",
                run.letters, run.phonetic_start, run.phonetic_end, run.start, run.end, run.score,
            ));
        }
    }
    if let Some(score) = result.score {
        out.push_str(&format!("Score: {score}\n"));
    }
    if let Some(message) = &result.failure_message {
        let kind = result.failure.as_deref().unwrap_or("?");
        out.push_str(&format!("Fuzzy failed: {kind}: {message}\n"));
    }

    if result.matched() {
        let carets = underline(&result.text, &result.ranges);
        out.push_str(&format!("\n  {}\n  {}\n", result.text, carets));
    } else {
        out.push_str("\nNo match.\n");
    }
    out
}
