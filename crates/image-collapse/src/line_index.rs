//! Rope-backed offset/position mapping for text snapshots.
//!
//! Hosts address occurrences by character offset; structured positions
//! (line, column) are what most range-replacement APIs want. This index does
//! the translation in O(log n) per query.

use crate::surface::Position;
use ropey::Rope;

/// A character-offset ↔ (line, column) index over one text buffer.
#[derive(Debug, Clone, Default)]
pub struct LineIndex {
    rope: Rope,
}

impl LineIndex {
    /// Build an index from text.
    pub fn from_text(text: &str) -> Self {
        Self {
            rope: Rope::from_str(text),
        }
    }

    /// Total line count.
    pub fn line_count(&self) -> usize {
        self.rope.len_lines()
    }

    /// Total character count.
    pub fn char_count(&self) -> usize {
        self.rope.len_chars()
    }

    /// Map a character offset to a structured position. Offsets past the end
    /// clamp to the final position.
    pub fn char_offset_to_position(&self, char_offset: usize) -> Position {
        let char_offset = char_offset.min(self.rope.len_chars());
        let line = self.rope.char_to_line(char_offset);
        let column = char_offset - self.rope.line_to_char(line);
        Position::new(line, column)
    }

    /// Map a structured position back to a character offset. Out-of-range
    /// lines clamp to the end of the document; out-of-range columns clamp to
    /// the end of the line.
    pub fn position_to_char_offset(&self, position: Position) -> usize {
        if position.line >= self.rope.len_lines() {
            return self.rope.len_chars();
        }

        let line_start = self.rope.line_to_char(position.line);
        let line_len = if position.line + 1 < self.rope.len_lines() {
            self.rope.line_to_char(position.line + 1) - line_start - 1 // exclude newline
        } else {
            self.rope.len_chars() - line_start
        };

        line_start + position.column.min(line_len)
    }

    /// Map a character offset to the corresponding byte offset.
    pub fn char_to_byte(&self, char_offset: usize) -> usize {
        let char_offset = char_offset.min(self.rope.len_chars());
        self.rope.char_to_byte(char_offset)
    }

    /// Insert text at a character offset (clamped to the end).
    pub fn insert(&mut self, char_offset: usize, text: &str) {
        let char_offset = char_offset.min(self.rope.len_chars());
        self.rope.insert(char_offset, text);
    }

    /// Delete a character range (clamped to the buffer).
    pub fn delete(&mut self, start_char: usize, end_char: usize) {
        let start_char = start_char.min(self.rope.len_chars());
        let end_char = end_char.clamp(start_char, self.rope.len_chars());
        if start_char < end_char {
            self.rope.remove(start_char..end_char);
        }
    }
}
