//! Host text-surface interfaces and an in-memory reference implementation.
//!
//! The core never owns the document: it re-derives occurrences and decoration
//! sets from a read-only snapshot handed to it on each change event, and the
//! only mutation path is [`TextSurfaceHandle::replace_range`], which hosts
//! implement over their own editing model.
//!
//! [`BufferSurface`] is a self-contained implementation of both traits backed
//! by a string buffer and a rope index, with a subscriber/version mechanism for
//! the change-notification stream. It serves tests and small embedders; real
//! editors implement the traits over their native buffer instead.

use crate::line_index::LineIndex;
use std::cmp::Ordering;

/// A structured position in a document: zero-based line and column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Position {
    /// Zero-based logical line index.
    pub line: usize,
    /// Zero-based column in characters within the logical line.
    pub column: usize,
}

impl Position {
    /// Create a new position.
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl Ord for Position {
    fn cmp(&self, other: &Self) -> Ordering {
        self.line
            .cmp(&other.line)
            .then_with(|| self.column.cmp(&other.column))
    }
}

impl PartialOrd for Position {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// A change notification from the host text surface.
///
/// Both kinds carry no payload beyond "recompute now": the receiver re-derives
/// everything from the current snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    /// The document text changed.
    ContentChanged,
    /// The visible range changed (scroll, resize).
    VisibleRangeChanged,
}

/// Read-only view of the current full text of a surface.
pub trait TextSnapshot {
    /// The full current text.
    fn text(&self) -> &str;

    /// Total character count.
    fn char_count(&self) -> usize;

    /// Map a character offset to a structured position usable for range
    /// replacement.
    fn position_of(&self, char_offset: usize) -> Position;

    /// Map a structured position back to a character offset.
    fn offset_of(&self, position: Position) -> usize;
}

/// Mutation handle for a live text surface.
///
/// `replace_range` is the only way text is mutated. Implementations must emit
/// a [`ChangeKind::ContentChanged`] notification after the replacement.
pub trait TextSurfaceHandle {
    /// Replace the half-open character range `[start, end)` with `replacement`.
    /// Offsets are clamped to the current document bounds.
    fn replace_range(&mut self, start: usize, end: usize, replacement: &str);
}

/// Change-notification callback type.
pub type ChangeCallback = Box<dyn FnMut(ChangeKind) + Send>;

/// An in-memory text surface with change notifications.
pub struct BufferSurface {
    text: String,
    index: LineIndex,
    version: u64,
    callbacks: Vec<ChangeCallback>,
}

impl std::fmt::Debug for BufferSurface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BufferSurface")
            .field("char_count", &self.index.char_count())
            .field("version", &self.version)
            .field("subscribers", &self.callbacks.len())
            .finish()
    }
}

impl BufferSurface {
    /// Create a surface over the given initial text.
    pub fn new(text: &str) -> Self {
        Self {
            text: text.to_string(),
            index: LineIndex::from_text(text),
            version: 0,
            callbacks: Vec::new(),
        }
    }

    /// Create an empty surface.
    pub fn empty() -> Self {
        Self::new("")
    }

    /// Current version number, incremented on every content change.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Subscribe to change notifications.
    pub fn subscribe<F>(&mut self, callback: F)
    where
        F: FnMut(ChangeKind) + Send + 'static,
    {
        self.callbacks.push(Box::new(callback));
    }

    /// Report a host scroll/resize as a visible-range change.
    ///
    /// Does not bump the version; the text is unchanged.
    pub fn notify_visible_range_changed(&mut self) {
        self.notify(ChangeKind::VisibleRangeChanged);
    }

    fn notify(&mut self, kind: ChangeKind) {
        for callback in &mut self.callbacks {
            callback(kind);
        }
    }
}

impl TextSnapshot for BufferSurface {
    fn text(&self) -> &str {
        &self.text
    }

    fn char_count(&self) -> usize {
        self.index.char_count()
    }

    fn position_of(&self, char_offset: usize) -> Position {
        self.index.char_offset_to_position(char_offset)
    }

    fn offset_of(&self, position: Position) -> usize {
        self.index.position_to_char_offset(position)
    }
}

impl TextSurfaceHandle for BufferSurface {
    fn replace_range(&mut self, start: usize, end: usize, replacement: &str) {
        let char_count = self.index.char_count();
        let start = start.min(char_count);
        let end = end.clamp(start, char_count);

        if start == end && replacement.is_empty() {
            return;
        }

        let byte_start = self.index.char_to_byte(start);
        let byte_end = self.index.char_to_byte(end);
        self.text.replace_range(byte_start..byte_end, replacement);

        self.index.delete(start, end);
        self.index.insert(start, replacement);

        self.version += 1;
        self.notify(ChangeKind::ContentChanged);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_replace_range_updates_text_and_index() {
        let mut surface = BufferSurface::new("Hello World");

        surface.replace_range(6, 11, "Rust");
        assert_eq!(surface.text(), "Hello Rust");
        assert_eq!(surface.char_count(), 10);
        assert_eq!(surface.version(), 1);
    }

    #[test]
    fn test_replace_range_char_offsets() {
        let mut surface = BufferSurface::new("héllo wörld");

        surface.replace_range(6, 11, "mönde");
        assert_eq!(surface.text(), "héllo mönde");
        assert_eq!(surface.position_of(8), Position::new(0, 8));
    }

    #[test]
    fn test_replace_range_clamps() {
        let mut surface = BufferSurface::new("abc");
        surface.replace_range(2, 99, "XY");
        assert_eq!(surface.text(), "abXY");
    }

    #[test]
    fn test_delete_via_empty_replacement() {
        let mut surface = BufferSurface::new("keep DELETE keep");
        surface.replace_range(5, 12, "");
        assert_eq!(surface.text(), "keep keep");
    }

    #[test]
    fn test_noop_replace_does_not_notify() {
        let mut surface = BufferSurface::new("abc");
        let seen = Arc::new(Mutex::new(0usize));
        let seen_clone = Arc::clone(&seen);
        surface.subscribe(move |_| *seen_clone.lock().unwrap() += 1);

        surface.replace_range(1, 1, "");
        assert_eq!(*seen.lock().unwrap(), 0);
        assert_eq!(surface.version(), 0);
    }

    #[test]
    fn test_change_notifications() {
        let mut surface = BufferSurface::new("abc");
        let seen = Arc::new(Mutex::new(Vec::<ChangeKind>::new()));
        let seen_clone = Arc::clone(&seen);
        surface.subscribe(move |kind| seen_clone.lock().unwrap().push(kind));

        surface.replace_range(0, 0, "x");
        surface.notify_visible_range_changed();

        assert_eq!(
            *seen.lock().unwrap(),
            vec![ChangeKind::ContentChanged, ChangeKind::VisibleRangeChanged]
        );
        assert_eq!(surface.version(), 1);
    }

    #[test]
    fn test_multiline_positions() {
        let surface = BufferSurface::new("line one\nline two");
        assert_eq!(surface.position_of(9), Position::new(1, 0));
        assert_eq!(surface.offset_of(Position::new(1, 4)), 13);
    }
}
