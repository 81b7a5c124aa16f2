//! Read-only document interface.
//!
//! Components that only need to *look* at text (range resolution, mode
//! reconciliation) take `&dyn Document` rather than a concrete buffer so a
//! host can hand over whatever text model it owns. Conversions are valid only
//! against the current document version; callers must not cache results across
//! mutations.

use crate::{Buffer, Position, grapheme};

pub trait Document {
    /// Snapshot of the full text.
    fn text(&self) -> String;

    /// Number of lines. A trailing line break opens a final empty line.
    fn line_count(&self) -> usize;

    /// Text of `line` without its line break; empty when out of range.
    fn line_text(&self, line: usize) -> String;

    /// Total length in bytes.
    fn len_bytes(&self) -> usize;

    /// Convert an absolute offset to a (line, byte column) position. Offsets past the end
    /// clamp to the end of the document.
    fn offset_to_position(&self, offset: usize) -> Position;

    /// Convert a position to an absolute offset. Lines past the end map to the document
    /// length; columns past the end of their line clamp to the line end.
    fn position_to_offset(&self, pos: Position) -> usize;

    /// Offset of the first byte of `line`.
    fn line_start_offset(&self, line: usize) -> usize {
        self.position_to_offset(Position::new(line, 0))
    }

    /// Offset of the end of `line`. With `include_break` the line break (if any) is
    /// counted, i.e. the result is the start of the following line.
    fn line_end_offset(&self, line: usize, include_break: bool) -> usize {
        if include_break {
            if line + 1 < self.line_count() {
                return self.line_start_offset(line + 1);
            }
            return self.len_bytes();
        }
        self.position_to_offset(Position::new(line, usize::MAX))
    }
}

impl Document for Buffer {
    fn text(&self) -> String {
        self.contents()
    }

    fn line_count(&self) -> usize {
        Buffer::line_count(self)
    }

    fn line_text(&self, line: usize) -> String {
        self.line_content(line)
    }

    fn len_bytes(&self) -> usize {
        Buffer::len_bytes(self)
    }

    fn offset_to_position(&self, offset: usize) -> Position {
        let offset = offset.min(Buffer::len_bytes(self));
        let line = self.byte_to_line(offset);
        Position::new(line, offset - self.line_start_byte(line))
    }

    fn position_to_offset(&self, pos: Position) -> usize {
        if pos.line >= Buffer::line_count(self) {
            return Buffer::len_bytes(self);
        }
        let content = self.line_content(pos.line);
        self.line_start_byte(pos.line) + grapheme::floor_char_boundary(&content, pos.byte)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(text: &str) -> Buffer {
        Buffer::from_str("doc", text).unwrap()
    }

    #[test]
    fn offset_round_trips_through_position() {
        let d = doc("alpha\nbeta\ngamma");
        let pos = d.offset_to_position(8);
        assert_eq!(pos, Position::new(1, 2));
        assert_eq!(d.position_to_offset(pos), 8);
    }

    #[test]
    fn offset_at_line_break_stays_on_line() {
        let d = doc("ab\ncd");
        assert_eq!(d.offset_to_position(2), Position::new(0, 2));
        assert_eq!(d.offset_to_position(3), Position::new(1, 0));
    }

    #[test]
    fn offset_past_end_clamps() {
        let d = doc("ab\ncd");
        assert_eq!(d.offset_to_position(42), Position::new(1, 2));
    }

    #[test]
    fn column_past_line_end_clamps_to_line_end() {
        let d = doc("long line\nab\nz");
        assert_eq!(d.position_to_offset(Position::new(1, 7)), 12);
        assert_eq!(d.position_to_offset(Position::new(9, 0)), d.len_bytes());
    }

    #[test]
    fn column_inside_multibyte_char_floors() {
        let d = doc("x\n\u{00e9}t");
        // line 1 starts at 2; byte 1 is inside 'é'
        assert_eq!(d.position_to_offset(Position::new(1, 1)), 2);
    }

    #[test]
    fn crlf_line_end_excludes_carriage_return() {
        let d = doc("ab\r\ncd");
        assert_eq!(d.line_text(0), "ab");
        assert_eq!(d.line_end_offset(0, false), 2);
        assert_eq!(d.line_end_offset(0, true), 4);
        assert_eq!(d.position_to_offset(Position::new(0, 3)), 2);
        assert_eq!(d.offset_to_position(4), Position::new(1, 0));
    }

    #[test]
    fn line_end_offsets() {
        let d = doc("ab\ncd\n");
        assert_eq!(d.line_end_offset(0, false), 2);
        assert_eq!(d.line_end_offset(0, true), 3);
        assert_eq!(d.line_end_offset(1, true), 6);
        assert_eq!(d.line_end_offset(2, true), 6);
    }
}
