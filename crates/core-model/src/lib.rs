//! Host editor model.
//!
//! `HostEditor` stands in for the platform editor the emulator lives inside:
//! it owns the text, exposes it through `core_text::Document`, and performs
//! its own edits inside a scoped transaction (`EditScope`). Every mutation made
//! through a scope is described as an `ExternalChange` and delivered to the
//! registered listeners before the mutating call returns.
//!
//! Invariants:
//! * Listeners only ever see `&dyn Document`; they cannot mutate the buffer or
//!   open a nested scope while a notification is being delivered.
//! * A scope is open for exactly the duration of the closure passed to
//!   `HostEditor::edit*`; the `scope_closed` trace marks its end.
//! * Offsets handed to scope operations must lie within the buffer and on
//!   character boundaries; anything else is rejected with `EditError`.

use core_events::{ChangeFlags, ChangeListeners, ChangeOrigin, ExternalChange};
use core_text::{Buffer, Document, Position};
use thiserror::Error;
use tracing::{debug, trace};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditError {
    #[error("edit range {start}..{end} lies outside the document (length {len})")]
    OutOfRange { start: usize, end: usize, len: usize },
    #[error("offset {offset} is not on a character boundary")]
    NotCharBoundary { offset: usize },
}

pub struct HostEditor {
    buffer: Buffer,
    listeners: ChangeListeners,
}

impl HostEditor {
    pub fn new(buffer: Buffer) -> Self {
        Self {
            buffer,
            listeners: ChangeListeners::new(),
        }
    }

    pub fn buffer(&self) -> &Buffer {
        &self.buffer
    }

    pub fn document(&self) -> &dyn Document {
        &self.buffer
    }

    pub fn text(&self) -> String {
        self.buffer.contents()
    }

    /// Registration point for external change notifications.
    pub fn listeners(&self) -> &ChangeListeners {
        &self.listeners
    }

    /// Run a host command that edits the document.
    pub fn edit<R>(&mut self, f: impl FnOnce(&mut EditScope<'_>) -> R) -> R {
        self.edit_with(ChangeOrigin::Host, ChangeFlags::empty(), f)
    }

    /// Run a host command inside an undo-transparent write action.
    pub fn edit_undo_transparent<R>(&mut self, f: impl FnOnce(&mut EditScope<'_>) -> R) -> R {
        self.edit_with(ChangeOrigin::Host, ChangeFlags::UNDO_TRANSPARENT, f)
    }

    pub fn edit_with<R>(
        &mut self,
        origin: ChangeOrigin,
        flags: ChangeFlags,
        f: impl FnOnce(&mut EditScope<'_>) -> R,
    ) -> R {
        let mut scope = EditScope {
            buffer: &mut self.buffer,
            listeners: &self.listeners,
            origin,
            flags,
            changes: 0,
        };
        trace!(target: "model.edit", ?origin, flags = flags.bits(), "scope_opened");
        f(&mut scope)
    }
}

/// An open edit transaction. Closed (and logged) when dropped.
pub struct EditScope<'a> {
    buffer: &'a mut Buffer,
    listeners: &'a ChangeListeners,
    origin: ChangeOrigin,
    flags: ChangeFlags,
    changes: usize,
}

impl EditScope<'_> {
    pub fn document(&self) -> &dyn Document {
        &*self.buffer
    }

    /// Number of mutations applied through this scope so far.
    pub fn changes(&self) -> usize {
        self.changes
    }

    /// Replace `[start, end)` with `text` and notify listeners.
    pub fn replace(
        &mut self,
        start: usize,
        end: usize,
        text: &str,
    ) -> Result<ExternalChange, EditError> {
        self.check_range(start, end)?;
        let start_pos = self.buffer.offset_to_position(start);
        let old_end = self.buffer.offset_to_position(end);
        let removed = self.buffer.replace_bytes(start, end, text);
        let new_end = self.buffer.offset_to_position(start + text.len());
        let change = ExternalChange::new(start, removed, text, start_pos, old_end, new_end)
            .with_flags(self.flags)
            .with_origin(self.origin);
        self.changes += 1;
        debug!(
            target: "model.edit",
            offset = start,
            old_len = change.old_len(),
            new_len = change.new_len(),
            line_delta = change.line_delta(),
            "external_edit_applied"
        );
        self.listeners.notify(&*self.buffer, &change);
        Ok(change)
    }

    pub fn insert(&mut self, at: usize, text: &str) -> Result<ExternalChange, EditError> {
        self.replace(at, at, text)
    }

    pub fn delete(&mut self, start: usize, end: usize) -> Result<ExternalChange, EditError> {
        self.replace(start, end, "")
    }

    /// Backspace from `from` back to `target` in one step, the way hosts strip indentation.
    /// Positions are clamped into the document; the two may be given in either order.
    pub fn delete_to_target(
        &mut self,
        from: Position,
        target: Position,
    ) -> Result<ExternalChange, EditError> {
        let a = self.buffer.position_to_offset(from);
        let b = self.buffer.position_to_offset(target);
        self.delete(a.min(b), a.max(b))
    }

    fn check_range(&self, start: usize, end: usize) -> Result<(), EditError> {
        let len = self.buffer.len_bytes();
        if start > end || end > len {
            return Err(EditError::OutOfRange { start, end, len });
        }
        for offset in [start, end] {
            let pos = self.buffer.offset_to_position(offset);
            if !self.buffer.line_content(pos.line).is_char_boundary(pos.byte) {
                return Err(EditError::NotCharBoundary { offset });
            }
        }
        Ok(())
    }
}

impl Drop for EditScope<'_> {
    fn drop(&mut self) {
        trace!(target: "model.edit", changes = self.changes, "scope_closed");
    }
}
