//! Mode reconciliation after host edits.
//!
//! The host sometimes edits the document behind the emulator's back: an IDE
//! backspace handler stripping auto-indent, a formatter, a refactoring. None of
//! those go through key dispatch, so nothing has told the emulator that its
//! caret, selection or marks now point at different text.
//!
//! `reconcile` repairs that state from the change descriptor alone:
//! * Locations before the change are untouched; locations inside the removed
//!   text collapse onto the change start; locations at or after the removed
//!   end move with the text that follows them.
//! * Anything that still ends up outside the document is clamped (logged, not
//!   surfaced).
//! * The mode survives. Removing a line break under an Insert-mode caret keeps
//!   Insert mode. The only exits are for state the edit destroyed outright: a
//!   Visual selection whose both ends were deleted, or a pending operator whose
//!   caret was deleted. Both are configurable in `[reconcile]`.
//!
//! Edits echoed back with `ChangeOrigin::Emulator` and edits that leave the
//! text unchanged are ignored.

use core_config::ReconcileConfig;
use core_events::{ChangeListener, ChangeListeners, ChangeOrigin, ExternalChange, Subscription};
use core_state::{EditorState, MarkPair, Mode};
use core_text::{Document, Position, motion};
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;
use tracing::{debug, warn};

/// Changes that could not be reconciled because the editor state was borrowed elsewhere.
pub static RECONCILE_STATE_BUSY_DROPPED: AtomicU64 = AtomicU64::new(0);

/// Raised internally when a shifted location no longer exists; always recovered by clamping.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReconcileError {
    #[error("position {line}:{byte} is invalid in a document of {line_count} lines")]
    InvalidPosition {
        line: usize,
        byte: usize,
        line_count: usize,
    },
}

/// Why a change was not acted upon.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Skip {
    EmulatorOrigin,
    NoOp,
    /// The editor state was already borrowed; the state may now be out of date.
    StateBusy,
}

/// Summary of one reconciliation pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciliation {
    pub skipped: Option<Skip>,
    pub mode_before: Mode,
    pub mode_after: Mode,
    pub caret_before: Position,
    pub caret_after: Position,
    /// Number of tracked locations that had to be clamped back into the document.
    pub clamped: usize,
}

impl Reconciliation {
    pub fn mode_preserved(&self) -> bool {
        self.mode_before == self.mode_after
    }
}

/// Where `pos` ends up after `change`.
pub fn shift_position(pos: Position, change: &ExternalChange) -> Position {
    if pos < change.start {
        return pos;
    }
    if pos < change.old_end {
        return change.start;
    }
    if pos.line == change.old_end.line {
        Position::new(
            change.new_end.line,
            change.new_end.byte + (pos.byte - change.old_end.byte),
        )
    } else {
        Position::new(pos.line - change.old_end.line + change.new_end.line, pos.byte)
    }
}

/// True when `pos` sat inside the text `change` removed.
pub fn removed_by(pos: Position, change: &ExternalChange) -> bool {
    change.start <= pos && pos < change.old_end
}

/// Bring `state` in line with a document that `change` has already been applied to.
pub fn reconcile(
    state: &mut EditorState,
    doc: &dyn Document,
    change: &ExternalChange,
    cfg: &ReconcileConfig,
) -> Reconciliation {
    let mut summary = Reconciliation {
        skipped: None,
        mode_before: state.mode,
        mode_after: state.mode,
        caret_before: state.caret,
        caret_after: state.caret,
        clamped: 0,
    };
    if change.origin == ChangeOrigin::Emulator {
        summary.skipped = Some(Skip::EmulatorOrigin);
        return summary;
    }
    if change.is_noop() {
        summary.skipped = Some(Skip::NoOp);
        return summary;
    }

    let caret_removed = removed_by(state.caret, change);
    let selection_removed = caret_removed
        && state
            .selection
            .anchor
            .is_some_and(|anchor| removed_by(anchor, change));

    let mut clamped = 0;
    let mut track = |pos: Position| -> Position {
        let (pos, was_clamped) = settle(doc, shift_position(pos, change));
        clamped += usize::from(was_clamped);
        pos
    };

    state.caret = track(state.caret);
    state.selection.anchor = state.selection.anchor.map(&mut track);
    let marks = &mut state.marks;
    marks.change = marks
        .change
        .map(|m| MarkPair::new(track(m.start), track(m.end)));
    marks.visual = marks
        .visual
        .map(|m| MarkPair::new(track(m.start), track(m.end)));

    match state.mode {
        mode if mode.is_visual() => {
            if selection_removed && cfg.exit_visual_when_selection_removed {
                debug!(target: "actions.reconcile", "visual_selection_removed_exit");
                state.selection.clear();
                state.mode = Mode::Normal;
            } else {
                state.sync_selection();
            }
        }
        Mode::OperatorPending if caret_removed && cfg.cancel_pending_when_caret_removed => {
            debug!(target: "actions.reconcile", "pending_operator_cancelled");
            state.mode = Mode::Normal;
        }
        _ => {}
    }

    if state.mode == Mode::Normal && cfg.normalize_normal_mode_caret {
        motion::normalize_normal_mode_position(doc, &mut state.caret);
    }

    summary.clamped = clamped;
    summary.mode_after = state.mode;
    summary.caret_after = state.caret;
    debug!(
        target: "actions.reconcile",
        offset = change.offset,
        old_len = change.old_len(),
        new_len = change.new_len(),
        mode_before = summary.mode_before.as_str(),
        mode_after = summary.mode_after.as_str(),
        caret_line = state.caret.line,
        caret_byte = state.caret.byte,
        clamped,
        "external_change_reconciled"
    );
    summary
}

/// Validate a shifted position, clamping it into the document when it no longer exists.
fn settle(doc: &dyn Document, pos: Position) -> (Position, bool) {
    match validate(doc, pos) {
        Ok(()) => (pos, false),
        Err(e) => {
            let mut fixed = pos;
            motion::clamp_into(doc, &mut fixed);
            debug!(target: "actions.reconcile", error = %e, line = fixed.line, byte = fixed.byte, "position_clamped");
            (fixed, true)
        }
    }
}

fn validate(doc: &dyn Document, pos: Position) -> Result<(), ReconcileError> {
    if motion::is_valid_position(doc, pos) {
        return Ok(());
    }
    Err(ReconcileError::InvalidPosition {
        line: pos.line,
        byte: pos.byte,
        line_count: doc.line_count(),
    })
}

/// Listener that keeps a shared `EditorState` consistent with host edits.
pub struct ModeReconciler {
    state: Rc<RefCell<EditorState>>,
    config: ReconcileConfig,
    last: Rc<RefCell<Option<Reconciliation>>>,
}

impl ModeReconciler {
    pub fn new(state: Rc<RefCell<EditorState>>, config: ReconcileConfig) -> Self {
        Self {
            state,
            config,
            last: Rc::default(),
        }
    }

    /// Register a reconciler for `state` on a host's listener registry.
    pub fn attach(
        listeners: &ChangeListeners,
        state: Rc<RefCell<EditorState>>,
        config: ReconcileConfig,
    ) -> (Subscription, Rc<RefCell<Option<Reconciliation>>>) {
        let reconciler = Self::new(state, config);
        let last = reconciler.last.clone();
        (listeners.register(reconciler), last)
    }

    /// Handle onto the most recent reconciliation summary.
    pub fn last_outcome(&self) -> Rc<RefCell<Option<Reconciliation>>> {
        self.last.clone()
    }
}

impl ChangeListener for ModeReconciler {
    fn name(&self) -> &'static str {
        "mode-reconciler"
    }

    fn on_external_change(&mut self, doc: &dyn Document, change: &ExternalChange) {
        let Ok(mut state) = self.state.try_borrow_mut() else {
            RECONCILE_STATE_BUSY_DROPPED.fetch_add(1, Ordering::Relaxed);
            warn!(target: "actions.reconcile", offset = change.offset, "editor_state_busy_change_not_reconciled");
            let (mode, caret) = self
                .state
                .try_borrow()
                .map(|s| (s.mode, s.caret))
                .unwrap_or_default();
            *self.last.borrow_mut() = Some(Reconciliation {
                skipped: Some(Skip::StateBusy),
                mode_before: mode,
                mode_after: mode,
                caret_before: caret,
                caret_after: caret,
                clamped: 0,
            });
            return;
        };
        let outcome = reconcile(&mut state, doc, change, &self.config);
        *self.last.borrow_mut() = Some(outcome);
    }
}
