//! Coordinate translation between original text and its transliteration.
//!
//! Every original character owns an inclusive span of phonetic positions.
//! Spans are contiguous and in order, so the map is a partition of
//! `0..phonetic_len`; `reverse[p]` names the character owning position `p`.

use std::ops::RangeInclusive;

use serde::Serialize;

/// Inclusive span of phonetic positions owned by one original character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    /// Number of phonetic letters in the span (always at least one).
    pub fn width(&self) -> usize {
        self.end - self.start + 1
    }

    pub fn contains(&self, p: usize) -> bool {
        self.start <= p && p <= self.end
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BoundaryMap {
    spans: Vec<Span>,
    reverse: Vec<usize>,
}

impl BoundaryMap {
    /// Append the span for the next original character, covering `len`
    /// phonetic letters. Zero-length pushes are widened to one letter so
    /// that every character stays addressable.
    pub(crate) fn push(&mut self, len: usize) {
        let len = len.max(1);
        let origin = self.spans.len();
        let start = self.reverse.len();
        self.spans.push(Span {
            start,
            end: start + len - 1,
        });
        self.reverse.extend(std::iter::repeat(origin).take(len));
    }

    /// Number of original characters.
    pub fn source_len(&self) -> usize {
        self.spans.len()
    }

    /// Number of phonetic letters.
    pub fn phonetic_len(&self) -> usize {
        self.reverse.len()
    }

    pub fn spans(&self) -> &[Span] {
        &self.spans
    }

    pub fn span(&self, origin: usize) -> Option<Span> {
        self.spans.get(origin).copied()
    }

    /// Original index owning phonetic position `p`.
    pub fn origin(&self, p: usize) -> Option<usize> {
        self.reverse.get(p).copied()
    }

    pub fn is_syllable_start(&self, p: usize) -> bool {
        self.origin(p).is_some_and(|o| self.spans[o].start == p)
    }

    pub fn is_syllable_end(&self, p: usize) -> bool {
        self.origin(p).is_some_and(|o| self.spans[o].end == p)
    }

    /// Phonetic positions covered by an inclusive window of original
    /// characters, or `None` if the window is empty or out of range.
    pub fn phonetic_range(&self, window: &RangeInclusive<usize>) -> Option<RangeInclusive<usize>> {
        let (start, end) = (*window.start(), *window.end());
        if start > end || end >= self.spans.len() {
            return None;
        }
        Some(self.spans[start].start..=self.spans[end].end)
    }

    /// Verify the partition and inverse properties. Returns a description
    /// of the first violation found.
    pub fn check_invariants(&self) -> Result<(), String> {
        let mut expected_start = 0;
        for (i, span) in self.spans.iter().enumerate() {
            if span.start != expected_start {
                return Err(format!(
                    "span {i} starts at {} (expected {expected_start})",
                    span.start
                ));
            }
            if span.end < span.start {
                return Err(format!("span {i} is empty"));
            }
            expected_start = span.end + 1;
        }
        if expected_start != self.reverse.len() {
            return Err(format!(
                "spans cover {expected_start} letters, reverse map has {}",
                self.reverse.len()
            ));
        }
        for (p, &origin) in self.reverse.iter().enumerate() {
            match self.spans.get(origin) {
                Some(span) if span.contains(p) => {}
                _ => return Err(format!("reverse[{p}] = {origin} does not contain {p}")),
            }
        }
        Ok(())
    }
}
