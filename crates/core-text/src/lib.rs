//! Rope-based text buffer abstraction plus the document interface the rest of
//! the workspace reads text through.
//!
//! Offsets everywhere in this crate are absolute UTF-8 byte offsets and
//! `Position::byte` is a byte column inside a line. Callers that compute
//! offsets from arbitrary arithmetic go through `Document::position_to_offset`
//! which clamps onto a character boundary.

use anyhow::Result;
use ropey::Rope;

pub mod document;
pub mod marker;
pub mod motion;
pub mod range;

pub use document::Document;
pub use marker::{CARET_MARKER, strip_marker};
pub use range::{RangeError, Span, TextRange};

/// Single-char line breaks recognised by ropey's default `unicode_lines` feature.
const LINE_BREAKS: [char; 7] = [
    '\n', '\u{000B}', '\u{000C}', '\r', '\u{0085}', '\u{2028}', '\u{2029}',
];

/// A text buffer backed by a `ropey::Rope`.
#[derive(Clone)]
pub struct Buffer {
    rope: Rope,
    pub name: String,
}

/// A position inside a buffer expressed as (line index, byte offset within that line).
/// Ordering is line first, then byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Position {
    pub line: usize,
    pub byte: usize,
}

impl Position {
    pub fn new(line: usize, byte: usize) -> Self {
        Self { line, byte }
    }
    pub fn origin() -> Self {
        Self { line: 0, byte: 0 }
    }
}

impl Buffer {
    /// Construct a buffer from an in-memory string slice.
    pub fn from_str(name: impl Into<String>, content: &str) -> Result<Self> {
        Ok(Self {
            rope: Rope::from_str(content),
            name: name.into(),
        })
    }

    /// Total number of lines in the buffer. A trailing newline opens one more (empty) line.
    pub fn line_count(&self) -> usize {
        self.rope.len_lines()
    }

    /// Total byte length of the buffer.
    pub fn len_bytes(&self) -> usize {
        self.rope.len_bytes()
    }

    /// Whole buffer contents as an owned `String`.
    pub fn contents(&self) -> String {
        self.rope.to_string()
    }

    /// Return the requested line as an owned `String` (including trailing newline if present).
    pub fn line(&self, idx: usize) -> Option<String> {
        if idx < self.rope.len_lines() {
            Some(self.rope.line(idx).to_string())
        } else {
            None
        }
    }

    /// Line contents without its line break (`\r\n` or any single break ropey splits on).
    /// Empty for out-of-range lines.
    pub fn line_content(&self, idx: usize) -> String {
        let mut s = self.line(idx).unwrap_or_default();
        if s.ends_with("\r\n") {
            s.truncate(s.len() - 2);
        } else if s.ends_with(LINE_BREAKS) {
            s.pop();
        }
        s
    }

    /// Byte length of a line (excluding any newline) for clamping purposes.
    pub fn line_byte_len(&self, idx: usize) -> usize {
        self.line_content(idx).len()
    }

    /// Absolute byte offset of the first byte of `line` (buffer length when past the end).
    pub fn line_start_byte(&self, line: usize) -> usize {
        if line >= self.rope.len_lines() {
            return self.rope.len_bytes();
        }
        self.rope.line_to_byte(line)
    }

    /// Line index containing the absolute byte offset (clamped to the buffer).
    pub fn byte_to_line(&self, byte: usize) -> usize {
        self.rope.byte_to_line(byte.min(self.rope.len_bytes()))
    }

    /// Return the UTF-8 slice in the absolute byte range `[start,end)` (clamped).
    pub fn slice_bytes(&self, start: usize, end: usize) -> String {
        let Some((start_char, end_char)) = self.char_span(start, end) else {
            return String::new();
        };
        self.rope.slice(start_char..end_char).to_string()
    }

    /// Delete the UTF-8 slice in absolute byte range `[start,end)` (clamped).
    /// Returns the removed text.
    pub fn delete_bytes(&mut self, start: usize, end: usize) -> String {
        let Some((start_char, end_char)) = self.char_span(start, end) else {
            return String::new();
        };
        let removed = self.rope.slice(start_char..end_char).to_string();
        self.rope.remove(start_char..end_char);
        removed
    }

    /// Insert `text` at the absolute byte offset (clamped to the buffer end).
    pub fn insert_bytes(&mut self, at: usize, text: &str) {
        let at = at.min(self.rope.len_bytes());
        let char_index = self.rope.byte_to_char(at);
        self.rope.insert(char_index, text);
    }

    /// Replace `[start,end)` with `text`, returning the removed slice.
    pub fn replace_bytes(&mut self, start: usize, end: usize, text: &str) -> String {
        let removed = self.delete_bytes(start, end);
        self.insert_bytes(start, text);
        removed
    }

    /// Translate a clamped byte range into a char range; `None` when empty.
    /// Caller guarantees both ends sit on character boundaries.
    fn char_span(&self, start: usize, end: usize) -> Option<(usize, usize)> {
        let total = self.rope.len_bytes();
        let s = start.min(total);
        let e = end.min(total);
        if s >= e {
            return None;
        }
        let start_char = self.rope.byte_to_char(s);
        let end_char = self.rope.byte_to_char(e);
        debug_assert_eq!(self.rope.char_to_byte(start_char), s);
        debug_assert_eq!(self.rope.char_to_byte(end_char), e);
        Some((start_char, end_char))
    }
}

/// Grapheme helpers operating on a single line.
pub mod grapheme {
    use unicode_segmentation::UnicodeSegmentation;

    /// Previous grapheme boundary (returns 0 if already at or below 1st boundary).
    pub fn prev_boundary(line: &str, byte: usize) -> usize {
        if byte == 0 || byte > line.len() {
            return 0;
        }
        let mut last = 0;
        for (idx, _) in line.grapheme_indices(true) {
            if idx >= byte {
                break;
            }
            last = idx;
        }
        last
    }

    /// Next grapheme boundary (returns line.len() if at or beyond end).
    pub fn next_boundary(line: &str, byte: usize) -> usize {
        if byte >= line.len() {
            return line.len();
        }
        for (idx, _) in line.grapheme_indices(true) {
            if idx > byte {
                return idx;
            }
        }
        line.len()
    }

    /// Largest char boundary `<= byte` inside `line`.
    pub fn floor_char_boundary(line: &str, byte: usize) -> usize {
        let mut b = byte.min(line.len());
        while !line.is_char_boundary(b) {
            b -= 1;
        }
        b
    }
}

#[cfg(test)]
mod tests {
    use super::grapheme;
    use super::*;

    #[test]
    fn create_buffer_and_read_line() {
        let b = Buffer::from_str("test", "hello\nworld").unwrap();
        assert_eq!(b.line_count(), 2);
        assert_eq!(b.line(0).unwrap(), "hello\n");
        assert_eq!(b.line(1).unwrap(), "world");
        assert_eq!(b.line_content(0), "hello");
        assert!(b.line(2).is_none());
    }

    #[test]
    fn trailing_newline_opens_empty_line() {
        let b = Buffer::from_str("t", "a\nb\n").unwrap();
        assert_eq!(b.line_count(), 3);
        assert_eq!(b.line_byte_len(2), 0);
        assert_eq!(b.line_start_byte(2), 4);
        assert_eq!(b.line_start_byte(9), 4);
    }

    #[test]
    fn line_content_drops_crlf_and_unicode_breaks() {
        let b = Buffer::from_str("t", "ab\r\ncd\ref\u{2028}gh").unwrap();
        assert_eq!(b.line_count(), 4);
        assert_eq!(b.line_content(0), "ab");
        assert_eq!(b.line_content(1), "cd");
        assert_eq!(b.line_content(2), "ef");
        assert_eq!(b.line_content(3), "gh");
        assert_eq!(b.line_start_byte(1), 4);
    }

    #[test]
    fn grapheme_combining_mark() {
        let s = "e\u{301}"; // 'e' + combining acute
        let nb = grapheme::next_boundary(s, 0);
        assert_eq!(nb, s.len());
        assert_eq!(grapheme::prev_boundary(s, nb), 0);
    }

    #[test]
    fn floor_char_boundary_inside_multibyte() {
        let s = "a\u{00e9}b"; // 'é' is two bytes
        assert_eq!(grapheme::floor_char_boundary(s, 2), 1);
        assert_eq!(grapheme::floor_char_boundary(s, 3), 3);
        assert_eq!(grapheme::floor_char_boundary(s, 99), s.len());
    }

    #[test]
    fn delete_and_insert_bytes() {
        let mut b = Buffer::from_str("t", "  indented\nnext").unwrap();
        let removed = b.delete_bytes(0, 2);
        assert_eq!(removed, "  ");
        assert_eq!(b.contents(), "indented\nnext");
        b.insert_bytes(8, "!");
        assert_eq!(b.line(0).unwrap(), "indented!\n");
    }

    #[test]
    fn replace_bytes_returns_removed() {
        let mut b = Buffer::from_str("t", "one two three").unwrap();
        let removed = b.replace_bytes(4, 7, "2");
        assert_eq!(removed, "two");
        assert_eq!(b.contents(), "one 2 three");
    }

    #[test]
    fn empty_and_clamped_ranges_are_noops() {
        let mut b = Buffer::from_str("t", "abc").unwrap();
        assert_eq!(b.slice_bytes(2, 2), "");
        assert_eq!(b.delete_bytes(5, 9), "");
        assert_eq!(b.slice_bytes(1, 99), "bc");
        assert_eq!(b.contents(), "abc");
    }

    #[test]
    fn byte_to_line_clamps() {
        let b = Buffer::from_str("t", "ab\ncd").unwrap();
        assert_eq!(b.byte_to_line(0), 0);
        assert_eq!(b.byte_to_line(3), 1);
        assert_eq!(b.byte_to_line(500), 1);
    }
}
