//! Coherence-scored subsequence alignment of query pinyin against source
//! pinyin.
//!
//! The query is split into runs, each matched at consecutive phonetic
//! positions. A run must begin on the first letter of a character's
//! syllable, after the previous run has ended, so runs never share a
//! starting character and never overlap. Continuations may cross into the
//! following characters. A run of `t` letters scores `t^2` (letter `i` of a
//! run adds `2i + 1`), which makes one contiguous run beat any scatter of
//! single-letter hits.
//!
//! The DP table is indexed by (phonetic position, query position) and
//! stored row-major. `ends[p][k]` is the best alignment of `query[..=k]`
//! whose last run ends with `query[k]` at `p`; `best[p][k]` is the best such
//! cell at any position before `p`. Each `ends` cell links to the cell its
//! run was chained from, so reconstruction is an iterative walk over the
//! table used as an arena.

use std::num::NonZeroU32;
use std::ops::RangeInclusive;

use serde::Serialize;
use tracing::{debug, debug_span};

use crate::settings::settings;
use crate::transliterate::{phonetic_query, Transliteration};

use super::{MatchRange, SearchError};

/// One contiguous run of query letters in the final alignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Run {
    /// First original character covered by the run.
    pub start: usize,
    /// Last original character covered by the run.
    pub end: usize,
    /// First phonetic position matched.
    pub phonetic_start: usize,
    /// Last phonetic position matched.
    pub phonetic_end: usize,
    /// Query letters consumed by the run.
    pub letters: usize,
    /// Score contributed by the run (`letters^2`).
    pub score: u64,
}

/// Result of a successful alignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Alignment {
    /// Runs in ascending order.
    pub runs: Vec<Run>,
    /// Runs mapped to original coordinates with adjacent ranges merged.
    pub ranges: Vec<MatchRange>,
    pub score: u64,
}

/// Longest query the table can score: `letters^2` must fit a `u32`.
const MAX_QUERY_LETTERS: usize = 4096;

/// `Cell::prev` of a run that starts the alignment.
const NO_PREV: u32 = u32::MAX;

/// Size caps for one alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Limits {
    /// Table cells, `(rows + 1) * cols`.
    pub cells: usize,
    pub query_letters: usize,
    /// Unit steps of the fill: one per cell plus one per candidate run.
    pub steps: usize,
}

impl Limits {
    pub(crate) fn from_settings() -> Self {
        let s = &settings().search;
        Self {
            cells: s.max_alignment_cells,
            query_letters: s.max_query_letters,
            steps: s.max_alignment_steps,
        }
    }

    #[cfg(test)]
    pub(crate) fn unbounded() -> Self {
        Self {
            cells: usize::MAX,
            query_letters: usize::MAX,
            steps: usize::MAX,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Cell {
    score: NonZeroU32,
    run_len: u32,
    /// `ends` index of the last cell of the previous run, or `NO_PREV`.
    prev: u32,
}

struct Table {
    cols: usize,
    ends: Vec<Option<Cell>>,
    /// (score, `ends` index); one more row than `ends`.
    best: Vec<Option<(NonZeroU32, u32)>>,
}

impl Table {
    fn new(rows: usize, cols: usize) -> Self {
        Self {
            cols,
            ends: vec![None; rows * cols],
            best: vec![None; (rows + 1) * cols],
        }
    }

    fn idx(&self, p: usize, k: usize) -> usize {
        p * self.cols + k
    }

    fn end(&self, p: usize, k: usize) -> Option<Cell> {
        self.ends[self.idx(p, k)]
    }

    fn best(&self, p: usize, k: usize) -> Option<(NonZeroU32, u32)> {
        self.best[self.idx(p, k)]
    }
}

/// Align `query` against `source`, optionally restricted to an inclusive
/// window of original characters.
pub fn try_align(
    source: &Transliteration,
    query: &str,
    window: Option<RangeInclusive<usize>>,
) -> Result<Alignment, SearchError> {
    let letters = phonetic_query(query);
    align_letters(source, &letters, window, Limits::from_settings())
}

/// Phonetic positions searched for `window`.
pub(crate) fn phonetic_bounds(
    source: &Transliteration,
    window: Option<RangeInclusive<usize>>,
) -> Result<RangeInclusive<usize>, SearchError> {
    match window {
        None if source.is_empty() => Err(SearchError::NoSubsequence),
        None => Ok(0..=source.phonetic_len() - 1),
        Some(w) => source
            .map()
            .phonetic_range(&w)
            .ok_or(SearchError::InvalidWindow {
                start: *w.start(),
                end: *w.end(),
                len: source.source_len(),
            }),
    }
}

/// Greedy left-to-right scan: the first position of each query letter in
/// order, or `None` if the query is not a subsequence.
pub(crate) fn first_occurrences(haystack: &[char], query: &[char]) -> Option<Vec<usize>> {
    let mut positions = Vec::with_capacity(query.len());
    let mut letters = query.iter().peekable();
    for (p, &c) in haystack.iter().enumerate() {
        match letters.peek() {
            Some(&&want) if want == c => {
                positions.push(p);
                letters.next();
            }
            Some(_) => {}
            None => break,
        }
    }
    (positions.len() == query.len()).then_some(positions)
}

/// Steps `fill` takes: one per cell plus, at each cell, the length of the
/// matching suffix ending there (the run lengths it tries). Runs in
/// `O(rows * cols)` with two rows of state.
fn alignment_steps(letters: &[char], query: &[char]) -> usize {
    let mut prev = vec![0usize; query.len()];
    let mut cur = vec![0usize; query.len()];
    let mut steps = letters.len().saturating_mul(query.len());
    for &c in letters {
        for (k, &q) in query.iter().enumerate() {
            cur[k] = match (c == q, k) {
                (false, _) => 0,
                (true, 0) => 1,
                (true, _) => prev[k - 1] + 1,
            };
            steps = steps.saturating_add(cur[k]);
        }
        std::mem::swap(&mut prev, &mut cur);
    }
    steps
}

pub(crate) fn align_letters(
    source: &Transliteration,
    query: &[char],
    window: Option<RangeInclusive<usize>>,
    limits: Limits,
) -> Result<Alignment, SearchError> {
    if query.is_empty() {
        return Err(SearchError::EmptyQuery);
    }
    let bounds = phonetic_bounds(source, window)?;
    let offset = *bounds.start();
    let letters = &source.letters()[bounds];
    let (rows, cols) = (letters.len(), query.len());
    let _span = debug_span!("align", rows, cols, offset).entered();

    if first_occurrences(letters, query).is_none() {
        return Err(SearchError::NoSubsequence);
    }
    let max_letters = limits.query_letters.min(MAX_QUERY_LETTERS);
    if cols > max_letters {
        return Err(SearchError::QueryTooLong {
            letters: cols,
            limit: max_letters,
        });
    }
    // Table indices are stored as u32.
    let max_cells = limits.cells.min(u32::MAX as usize);
    let cells = (rows + 1).saturating_mul(cols);
    if cells > max_cells {
        return Err(SearchError::TooLarge {
            cells,
            limit: max_cells,
        });
    }
    let steps = alignment_steps(letters, query);
    if steps > limits.steps {
        return Err(SearchError::WorkLimit {
            steps,
            limit: limits.steps,
        });
    }
    debug!(cells, steps);

    let table = fill(source, letters, offset, query);
    let alignment = reconstruct(&table, source, offset, rows, cols)?;
    debug!(
        score = alignment.score,
        runs = alignment.runs.len(),
        ranges = alignment.ranges.len()
    );
    Ok(alignment)
}

fn fill(source: &Transliteration, letters: &[char], offset: usize, query: &[char]) -> Table {
    let map = source.map();
    let (rows, cols) = (letters.len(), query.len());
    let mut table = Table::new(rows, cols);

    for p in 0..rows {
        for k in 0..cols {
            let mut chosen: Option<Cell> = None;

            // Candidate runs ending here, shortest first: query[k+1-r..=k]
            // matched at letters[p+1-r..=p].
            let mut r = 0;
            while r <= p && r <= k && letters[p - r] == query[k - r] {
                r += 1;
                let start = p + 1 - r;
                if !map.is_syllable_start(offset + start) {
                    continue;
                }
                let first = k + 1 - r;
                let run_score = (r * r) as u32;
                let candidate = if first == 0 {
                    NonZeroU32::new(run_score).map(|score| Cell {
                        score,
                        run_len: r as u32,
                        prev: NO_PREV,
                    })
                } else {
                    table.best(start, first - 1).map(|(score, idx)| Cell {
                        score: score.saturating_add(run_score),
                        run_len: r as u32,
                        prev: idx,
                    })
                };
                // Longer runs win ties.
                if let Some(c) = candidate {
                    if chosen.map_or(true, |cur| c.score >= cur.score) {
                        chosen = Some(c);
                    }
                }
            }

            let here = table.idx(p, k);
            table.ends[here] = chosen;

            let inherited = table.best(p, k);
            let next = table.idx(p + 1, k);
            table.best[next] = match (inherited, chosen) {
                (Some(b), Some(c)) if c.score > b.0 => Some((c.score, here as u32)),
                (Some(b), _) => Some(b),
                (None, Some(c)) => Some((c.score, here as u32)),
                (None, None) => None,
            };
        }
    }

    table
}

fn reconstruct(
    table: &Table,
    source: &Transliteration,
    offset: usize,
    rows: usize,
    cols: usize,
) -> Result<Alignment, SearchError> {
    let map = source.map();
    let (score, last) = table
        .best(rows, cols - 1)
        .ok_or(SearchError::NoCoherentAlignment)?;

    let mut cursor = last as usize;
    let mut runs = Vec::new();
    let mut ranges: Vec<MatchRange> = Vec::new();
    let mut remaining = cols;
    loop {
        let (p, k) = (cursor / cols, cursor % cols);
        let cell = table.end(p, k).ok_or(SearchError::NoCoherentAlignment)?;
        let run_len = cell.run_len as usize;
        if k + 1 != remaining || run_len > remaining {
            return Err(SearchError::NoCoherentAlignment);
        }
        let phonetic_end = offset + p;
        let phonetic_start = phonetic_end + 1 - run_len;
        let (start, end) = match (map.origin(phonetic_start), map.origin(phonetic_end)) {
            (Some(s), Some(e)) => (s, e),
            _ => return Err(SearchError::NoCoherentAlignment),
        };
        runs.push(Run {
            start,
            end,
            phonetic_start,
            phonetic_end,
            letters: run_len,
            score: (run_len as u64) * (run_len as u64),
        });

        // Walking backwards: merge into the following range when adjacent.
        match ranges.last_mut() {
            Some(next) if end + 1 >= next.start => next.start = start,
            _ => ranges.push(MatchRange::new(start, end)),
        }

        remaining -= run_len;
        if remaining == 0 {
            break;
        }
        if cell.prev == NO_PREV {
            return Err(SearchError::NoCoherentAlignment);
        }
        cursor = cell.prev as usize;
    }

    runs.reverse();
    ranges.reverse();
    Ok(Alignment {
        runs,
        ranges,
        score: u64::from(score.get()),
    })
}
