//! Encoded-image locator.
//!
//! Scans raw document text for inline-image references of the form
//! `![<alt>](data:image/<subtype>;base64,<data>)` and yields [`Occurrence`]
//! records in left-to-right, non-overlapping order.
//!
//! All public offsets are **character offsets** (Unicode scalar values), not
//! byte offsets. Matching is greedy on the bracketed alt text (stops at the
//! first `]`) and on the parenthesized payload (stops at the first `)` after
//! the scheme prefix); nested parentheses inside the payload are not handled.
//! This is an accepted limitation of the reference grammar.
//!
//! Matches whose encoded data is shorter than
//! [`MIN_DATA_LEN`](crate::payload::MIN_DATA_LEN) characters are filtered out.
//! Text with no qualifying match yields an empty sequence; that is never an
//! error.

use crate::payload::{ImagePayload, MIN_DATA_LEN};
use regex::Regex;
use std::sync::OnceLock;

/// A half-open character-offset range `[start, end)` in a document snapshot.
///
/// A span is only valid against the exact snapshot it was computed from; it is
/// never reused across snapshots without recomputation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    /// Inclusive start character offset.
    pub start: usize,
    /// Exclusive end character offset.
    pub end: usize,
}

impl Span {
    /// Create a new span.
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Length of the span in characters.
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    /// Returns `true` if the span is empty.
    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    /// Returns `true` if `offset` falls inside the half-open range.
    pub fn contains(&self, offset: usize) -> bool {
        self.start <= offset && offset < self.end
    }
}

/// One matched embedded-image reference in document text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Occurrence {
    /// Character span of the full `![...](...)` match in the source snapshot.
    pub span: Span,
    /// The human-readable label from the brackets (may be empty).
    pub alt_text: String,
    /// The full encoded-image reference.
    pub payload: ImagePayload,
}

fn pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"!\[([^\]]*)\]\(data:image/([a-zA-Z0-9.+-]+);base64,([^)]+)\)")
            .expect("embedded-image pattern compiles")
    })
}

/// Byte-offset to char-offset translation table for one text snapshot.
#[derive(Debug)]
pub(crate) struct CharIndex {
    char_to_byte: Vec<usize>,
    text_len: usize,
}

impl CharIndex {
    pub(crate) fn new(text: &str) -> Self {
        let mut char_to_byte: Vec<usize> = text.char_indices().map(|(b, _)| b).collect();
        char_to_byte.push(text.len());
        Self {
            char_to_byte,
            text_len: text.len(),
        }
    }

    pub(crate) fn byte_to_char(&self, byte_offset: usize) -> usize {
        let clamped = byte_offset.min(self.text_len);
        match self.char_to_byte.binary_search(&clamped) {
            Ok(idx) => idx,
            Err(idx) => idx,
        }
    }
}

/// A lazy, finite, restartable sequence of [`Occurrence`]s over one snapshot.
///
/// Produced by [`scan`]. Each call to [`scan`] restarts from the beginning of
/// the text. The scan cursor advances past each full match before looking for
/// the next one, so yielded spans never overlap and are strictly ascending.
pub struct Occurrences<'t> {
    inner: regex::CaptureMatches<'static, 't>,
    index: CharIndex,
}

impl std::fmt::Debug for Occurrences<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Occurrences").finish_non_exhaustive()
    }
}

impl Iterator for Occurrences<'_> {
    type Item = Occurrence;

    fn next(&mut self) -> Option<Occurrence> {
        loop {
            let caps = self.inner.next()?;
            let data = caps.get(3).map(|m| m.as_str()).unwrap_or_default();
            if data.chars().count() < MIN_DATA_LEN {
                continue;
            }

            let full = caps.get(0)?;
            let alt_text = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
            let subtype = caps.get(2).map(|m| m.as_str()).unwrap_or_default();

            return Some(Occurrence {
                span: Span::new(
                    self.index.byte_to_char(full.start()),
                    self.index.byte_to_char(full.end()),
                ),
                alt_text: alt_text.to_string(),
                payload: ImagePayload::from_parts(subtype, data),
            });
        }
    }
}

/// Scan `text` for qualifying inline-image references.
pub fn scan(text: &str) -> Occurrences<'_> {
    Occurrences {
        inner: pattern().captures_iter(text),
        index: CharIndex::new(text),
    }
}

/// Count qualifying inline-image references in `text`.
///
/// The query entry point behind a user-invoked "find all" action; it has no
/// side effects.
pub fn count_occurrences(text: &str) -> usize {
    scan(text).count()
}

/// Resolve the occurrence covering `char_offset` against the current snapshot.
///
/// Interaction dispatch uses this to re-resolve a rendered region's occurrence
/// instead of trusting a cached span from an older snapshot.
pub fn occurrence_at(text: &str, char_offset: usize) -> Option<Occurrence> {
    for occurrence in scan(text) {
        if occurrence.span.contains(char_offset) {
            return Some(occurrence);
        }
        if occurrence.span.start > char_offset {
            return None;
        }
    }
    None
}
