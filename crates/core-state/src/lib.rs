//! Emulator-side editor state: current mode, caret, selection and marks.
//!
//! The host owns the text; this crate owns what the emulator believes about
//! it. Every tracked location is a `Position` so that the reconciler can shift
//! it using only the before/after context of a change, without having to read
//! the pre-mutation document.
//!
//! Mode transitions here are the side effects the emulator's own dispatch
//! applies (anchor on entering Visual, visual marks on leaving it). External
//! mutations never go through `transition`; see `core-actions::reconciler`.

use core_text::{Document, Position, TextRange, grapheme};
use tracing::debug;

/// Editing modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Mode {
    /// Normal command/navigation mode.
    #[default]
    Normal,
    /// Insert text mode.
    Insert,
    /// Overtype mode (`R`).
    Replace,
    /// Visual character-wise selection.
    VisualChar,
    /// Visual line-wise selection.
    VisualLine,
    /// An operator was typed and awaits its motion (`d`, `c`, `y`, ...).
    OperatorPending,
}

impl Mode {
    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Normal => "NORMAL",
            Mode::Insert => "INSERT",
            Mode::Replace => "REPLACE",
            Mode::VisualChar => "VISUAL",
            Mode::VisualLine => "VISUAL LINE",
            Mode::OperatorPending => "OP PENDING",
        }
    }

    pub fn is_visual(self) -> bool {
        matches!(self, Mode::VisualChar | Mode::VisualLine)
    }

    /// Modes in which typed characters land in the buffer.
    pub fn is_insert_like(self) -> bool {
        matches!(self, Mode::Insert | Mode::Replace)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionKind {
    Characterwise,
    Linewise,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionSpan {
    pub start: Position,
    pub end: Position,
    pub kind: SelectionKind,
}

impl SelectionSpan {
    /// Construct a new span normalizing ordering so that start <= end (line, then byte).
    pub fn new(mut a: Position, mut b: Position, kind: SelectionKind) -> Self {
        if a > b {
            std::mem::swap(&mut a, &mut b);
        }
        Self {
            start: a,
            end: b,
            kind,
        }
    }

    /// Returns true if span is empty (start == end).
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Compute an inclusive absolute byte range for this span.
    ///
    /// Characterwise selections in Visual mode include BOTH endpoint graphemes, so the
    /// half-open end is pushed past the grapheme under `end`. Linewise selections cover
    /// whole lines including the final line break.
    ///
    /// Returns `(abs_start, abs_end_exclusive)`.
    pub fn inclusive_byte_range<D: Document + ?Sized>(&self, doc: &D) -> (usize, usize) {
        match self.kind {
            SelectionKind::Characterwise => {
                let a = doc.position_to_offset(self.start);
                let line = doc.line_text(self.end.line);
                let clamped = self.end.byte.min(line.len());
                let next = grapheme::next_boundary(&line, clamped);
                let b = doc.line_start_offset(self.end.line) + next;
                (a, b.max(a))
            }
            SelectionKind::Linewise => (
                doc.line_start_offset(self.start.line),
                doc.line_end_offset(self.end.line, true),
            ),
        }
    }
}

/// Persistent (yet optionally empty) selection model.
///
/// Invariants:
/// - If `active` is `Some(span)` then `span.start <= span.end`.
/// - `anchor` is where Visual mode was entered and stays fixed until the selection clears.
#[derive(Debug, Default, Clone)]
pub struct SelectionModel {
    pub active: Option<SelectionSpan>,
    pub anchor: Option<Position>,
}

impl SelectionModel {
    pub fn clear(&mut self) {
        self.active = None;
        self.anchor = None;
    }
    pub fn set(&mut self, span: SelectionSpan) {
        self.active = Some(span);
    }
    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }
}

/// A pair of marks bracketing a region, stored start <= end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarkPair {
    pub start: Position,
    pub end: Position,
}

impl MarkPair {
    pub fn new(a: Position, b: Position) -> Self {
        if a <= b {
            Self { start: a, end: b }
        } else {
            Self { start: b, end: a }
        }
    }

    pub fn to_range<D: Document + ?Sized>(&self, doc: &D) -> Option<TextRange> {
        let start = doc.position_to_offset(self.start);
        let end = doc.position_to_offset(self.end);
        TextRange::new(start, end.max(start)).ok()
    }
}

/// `[` / `]` change marks and `<` / `>` visual marks.
#[derive(Debug, Default, Clone)]
pub struct Marks {
    pub change: Option<MarkPair>,
    pub visual: Option<MarkPair>,
}

impl Marks {
    pub fn set_change(&mut self, a: Position, b: Position) {
        self.change = Some(MarkPair::new(a, b));
    }

    pub fn set_visual(&mut self, a: Position, b: Position) {
        self.visual = Some(MarkPair::new(a, b));
    }
}

#[derive(Debug, Default, Clone)]
pub struct EditorState {
    pub mode: Mode,
    pub caret: Position,
    pub selection: SelectionModel,
    pub marks: Marks,
}

impl EditorState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_caret(caret: Position) -> Self {
        Self {
            caret,
            ..Self::default()
        }
    }

    /// Switch modes the way the emulator's own key dispatch does.
    pub fn transition(&mut self, to: Mode) {
        let from = self.mode;
        if from == to {
            return;
        }
        if from.is_visual() {
            if let Some(span) = self.selection.active {
                self.marks.set_visual(span.start, span.end);
            }
            if !to.is_visual() {
                self.selection.clear();
            }
        }
        if to.is_visual() {
            let anchor = self.selection.anchor.unwrap_or(self.caret);
            self.selection.anchor = Some(anchor);
            self.selection
                .set(SelectionSpan::new(anchor, self.caret, selection_kind(to)));
        }
        self.mode = to;
        debug!(target: "state.mode", from = from.as_str(), to = to.as_str(), "mode_transition");
    }

    /// Move the caret, dragging the selection along while in a Visual mode.
    pub fn move_caret(&mut self, to: Position) {
        self.caret = to;
        self.sync_selection();
    }

    /// Rebuild the active selection from anchor and caret.
    pub fn sync_selection(&mut self) {
        if !self.mode.is_visual() {
            return;
        }
        if let Some(anchor) = self.selection.anchor {
            self.selection
                .set(SelectionSpan::new(anchor, self.caret, selection_kind(self.mode)));
        }
    }

    /// Range an operator function acts on: the change marks in Normal mode, the current
    /// (or last) visual selection in Visual modes, nothing otherwise.
    pub fn operator_target_range<D: Document + ?Sized>(&self, doc: &D) -> Option<TextRange> {
        match self.mode {
            Mode::Normal => self.marks.change.and_then(|m| m.to_range(doc)),
            Mode::VisualChar | Mode::VisualLine => match self.selection.active {
                Some(span) => {
                    let (start, end) = span.inclusive_byte_range(doc);
                    TextRange::new(start, end).ok()
                }
                None => self.marks.visual.and_then(|m| m.to_range(doc)),
            },
            _ => None,
        }
    }
}

fn selection_kind(mode: Mode) -> SelectionKind {
    if mode == Mode::VisualLine {
        SelectionKind::Linewise
    } else {
        SelectionKind::Characterwise
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_text::Buffer;
    use pretty_assertions::assert_eq;

    fn buf(text: &str) -> Buffer {
        Buffer::from_str("state", text).unwrap()
    }

    #[test]
    fn mode_labels_and_classes() {
        assert_eq!(Mode::default(), Mode::Normal);
        assert_eq!(Mode::VisualLine.as_str(), "VISUAL LINE");
        assert!(Mode::VisualChar.is_visual());
        assert!(!Mode::OperatorPending.is_visual());
        assert!(Mode::Replace.is_insert_like());
        assert!(!Mode::Normal.is_insert_like());
    }

    #[test]
    fn selection_span_normalizes_order() {
        let span = SelectionSpan::new(
            Position::new(2, 0),
            Position::new(1, 4),
            SelectionKind::Characterwise,
        );
        assert_eq!(span.start, Position::new(1, 4));
        assert_eq!(span.end, Position::new(2, 0));
    }

    #[test]
    fn characterwise_range_includes_last_grapheme() {
        let b = buf("hello world\n");
        let span = SelectionSpan::new(
            Position::new(0, 0),
            Position::new(0, 4),
            SelectionKind::Characterwise,
        );
        assert_eq!(span.inclusive_byte_range(&b), (0, 5));
    }

    #[test]
    fn linewise_range_covers_whole_lines() {
        let b = buf("one\ntwo\nthree");
        let span = SelectionSpan::new(
            Position::new(0, 2),
            Position::new(1, 1),
            SelectionKind::Linewise,
        );
        assert_eq!(span.inclusive_byte_range(&b), (0, 8));
    }

    #[test]
    fn entering_visual_anchors_at_caret() {
        let mut st = EditorState::with_caret(Position::new(0, 2));
        st.transition(Mode::VisualChar);
        assert_eq!(st.selection.anchor, Some(Position::new(0, 2)));
        st.move_caret(Position::new(0, 5));
        let span = st.selection.active.unwrap();
        assert_eq!(span.start, Position::new(0, 2));
        assert_eq!(span.end, Position::new(0, 5));
    }

    #[test]
    fn leaving_visual_records_marks_and_clears_selection() {
        let mut st = EditorState::with_caret(Position::new(0, 1));
        st.transition(Mode::VisualChar);
        st.move_caret(Position::new(1, 0));
        st.transition(Mode::Normal);
        assert!(!st.selection.is_active());
        assert_eq!(
            st.marks.visual,
            Some(MarkPair::new(Position::new(0, 1), Position::new(1, 0)))
        );
    }

    #[test]
    fn operator_target_range_follows_mode() {
        let b = buf("abc def\nghi\n");
        let mut st = EditorState::new();
        st.marks.set_change(Position::new(0, 4), Position::new(0, 7));
        let range = st.operator_target_range(&b).unwrap();
        assert_eq!((range.start_offset(), range.end_offset()), (4, 7));

        st.transition(Mode::VisualLine);
        st.move_caret(Position::new(1, 0));
        let range = st.operator_target_range(&b).unwrap();
        assert_eq!((range.start_offset(), range.end_offset()), (0, 12));

        st.transition(Mode::Insert);
        assert!(st.operator_target_range(&b).is_none());
    }
}
