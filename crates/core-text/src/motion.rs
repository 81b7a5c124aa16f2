//! Cursor placement helpers.
//!
//! These operate purely on a document + `Position` pair and are free of global editor state.

use crate::{Document, Position, grapheme};

/// Normalize a position for Vim Normal-mode semantics:
/// if the cursor byte is at or past the end-of-line and the line is non-empty, move it to the
/// start byte of the last grapheme cluster so the cursor rests on a real character cell (Vim block
/// cursor behavior). No change for empty lines or out-of-range lines.
/// Returns true when the position moved.
pub fn normalize_normal_mode_position<D: Document + ?Sized>(doc: &D, pos: &mut Position) -> bool {
    if pos.line >= doc.line_count() {
        return false;
    }
    let content = doc.line_text(pos.line);
    if content.is_empty() || pos.byte < content.len() {
        return false;
    }
    let last = grapheme::prev_boundary(&content, content.len());
    let moved = last != pos.byte;
    pos.byte = last;
    moved
}

/// True when `pos` names an existing line and a char boundary within (or at the end of) it.
pub fn is_valid_position<D: Document + ?Sized>(doc: &D, pos: Position) -> bool {
    if pos.line >= doc.line_count() {
        return false;
    }
    let content = doc.line_text(pos.line);
    pos.byte <= content.len() && content.is_char_boundary(pos.byte)
}

/// Clamp a position to the nearest valid one: the document end when the line is past the last
/// line, the line end when the column overshoots, the char boundary below it otherwise.
/// Returns true when the position changed.
pub fn clamp_into<D: Document + ?Sized>(doc: &D, pos: &mut Position) -> bool {
    let before = *pos;
    let line_count = doc.line_count();
    if pos.line >= line_count {
        pos.line = line_count.saturating_sub(1);
        pos.byte = doc.line_text(pos.line).len();
        return *pos != before;
    }
    let content = doc.line_text(pos.line);
    pos.byte = grapheme::floor_char_boundary(&content, pos.byte);
    *pos != before
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Buffer;

    #[test]
    fn normal_mode_clamps_end_of_line() {
        let b = Buffer::from_str("t", "abc\n").unwrap();
        let mut pos = Position::new(0, 3);
        assert!(normalize_normal_mode_position(&b, &mut pos));
        assert_eq!(pos.byte, 2);
    }

    #[test]
    fn normal_mode_never_rests_on_carriage_return() {
        let b = Buffer::from_str("t", "abc\r\nx").unwrap();
        let mut pos = Position::new(0, 3);
        assert!(normalize_normal_mode_position(&b, &mut pos));
        assert_eq!(pos.byte, 2);
    }

    #[test]
    fn normal_mode_keeps_interior_and_empty_lines() {
        let b = Buffer::from_str("t", "abc\n\nx").unwrap();
        let mut inside = Position::new(0, 1);
        assert!(!normalize_normal_mode_position(&b, &mut inside));
        let mut empty = Position::new(1, 0);
        assert!(!normalize_normal_mode_position(&b, &mut empty));
        assert_eq!(empty, Position::new(1, 0));
    }

    #[test]
    fn normal_mode_lands_on_multibyte_cluster_start() {
        let b = Buffer::from_str("t", "ae\u{301}").unwrap();
        let mut pos = Position::new(0, 10);
        normalize_normal_mode_position(&b, &mut pos);
        assert_eq!(pos.byte, 1);
    }

    #[test]
    fn validity_checks_line_and_boundary() {
        let b = Buffer::from_str("t", "ab\n\u{00e9}").unwrap();
        assert!(is_valid_position(&b, Position::new(0, 2)));
        assert!(!is_valid_position(&b, Position::new(0, 3)));
        assert!(!is_valid_position(&b, Position::new(1, 1)));
        assert!(!is_valid_position(&b, Position::new(2, 0)));
    }

    #[test]
    fn clamp_into_handles_line_and_column() {
        let b = Buffer::from_str("t", "abc\nde").unwrap();
        let mut pos = Position::new(7, 9);
        assert!(clamp_into(&b, &mut pos));
        assert_eq!(pos, Position::new(1, 2));
        let mut ok = Position::new(0, 1);
        assert!(!clamp_into(&b, &mut ok));
    }

    #[test]
    fn clamp_past_last_line_goes_to_document_end() {
        let b = Buffer::from_str("t", "ab\nlongerline").unwrap();
        let mut pos = Position::new(5, 3);
        assert!(clamp_into(&b, &mut pos));
        assert_eq!(pos, Position::new(1, 10));
        assert_eq!(b.position_to_offset(pos), b.len_bytes());
    }
}
