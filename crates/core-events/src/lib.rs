//! External change notifications.
//!
//! The host performs edits the emulator did not ask for (auto-indent cleanup,
//! refactorings, formatter runs). Each edit is described by an
//! `ExternalChange` carrying the offset, removed and inserted text, and the
//! change boundaries as positions both before and after the edit. Interested
//! parties register a `ChangeListener` and get back a `Subscription`; dropping
//! the subscription (or calling `unregister`) removes the listener. There is
//! no process-wide listener list: each host editor owns its own registry.
//!
//! Threading: everything here runs on the editor thread. The registry uses
//! `Rc<RefCell<_>>` and is deliberately `!Send`.

use bitflags::bitflags;
use core_text::{Document, Position};
use std::cell::RefCell;
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{trace, warn};

// Simple relaxed counters; inspected by diagnostics only.
pub static CHANGES_DELIVERED: AtomicU64 = AtomicU64::new(0);
pub static REENTRANT_NOTIFY_DROPPED: AtomicU64 = AtomicU64::new(0);

bitflags! {
    /// Properties of a change useful to listeners without re-reading the text.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ChangeFlags: u8 {
        /// Performed inside an undo-transparent host command.
        const UNDO_TRANSPARENT = 1 << 0;
        /// The removed text contained at least one line break.
        const LINE_BREAK_REMOVED = 1 << 1;
        /// The inserted text contains at least one line break.
        const LINE_BREAK_INSERTED = 1 << 2;
        /// Removed and inserted text are whitespace only (indent adjustments).
        const WHITESPACE_ONLY = 1 << 3;
    }
}

/// Who performed the edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChangeOrigin {
    /// The host platform's own command.
    #[default]
    Host,
    /// An edit issued by the emulator's key dispatch, echoed back by the host.
    Emulator,
}

/// Description of one text mutation.
///
/// `start` is identical before and after the edit. `old_end` is where the removed text ended in
/// the old document; `new_end` is where the inserted text ends in the new one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalChange {
    pub offset: usize,
    pub removed: String,
    pub inserted: String,
    pub start: Position,
    pub old_end: Position,
    pub new_end: Position,
    pub flags: ChangeFlags,
    pub origin: ChangeOrigin,
}

impl ExternalChange {
    /// Build a change descriptor, deriving the content flags from the text.
    pub fn new(
        offset: usize,
        removed: impl Into<String>,
        inserted: impl Into<String>,
        start: Position,
        old_end: Position,
        new_end: Position,
    ) -> Self {
        let removed = removed.into();
        let inserted = inserted.into();
        let mut flags = ChangeFlags::empty();
        if removed.contains('\n') {
            flags |= ChangeFlags::LINE_BREAK_REMOVED;
        }
        if inserted.contains('\n') {
            flags |= ChangeFlags::LINE_BREAK_INSERTED;
        }
        let touched = !removed.is_empty() || !inserted.is_empty();
        if touched
            && removed.chars().all(char::is_whitespace)
            && inserted.chars().all(char::is_whitespace)
        {
            flags |= ChangeFlags::WHITESPACE_ONLY;
        }
        Self {
            offset,
            removed,
            inserted,
            start,
            old_end,
            new_end,
            flags,
            origin: ChangeOrigin::Host,
        }
    }

    pub fn with_flags(mut self, flags: ChangeFlags) -> Self {
        self.flags |= flags;
        self
    }

    pub fn with_origin(mut self, origin: ChangeOrigin) -> Self {
        self.origin = origin;
        self
    }

    pub fn old_len(&self) -> usize {
        self.removed.len()
    }

    pub fn new_len(&self) -> usize {
        self.inserted.len()
    }

    /// Same content before and after.
    pub fn is_noop(&self) -> bool {
        self.removed == self.inserted
    }

    /// Net change in line count.
    pub fn line_delta(&self) -> isize {
        self.new_end.line as isize - self.old_end.line as isize
    }
}

/// Receiver of external change notifications. Called synchronously inside the host's edit
/// scope with a read-only view of the already-mutated document.
pub trait ChangeListener {
    /// Stable identifier used in logs.
    fn name(&self) -> &'static str;
    fn on_external_change(&mut self, doc: &dyn Document, change: &ExternalChange);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

#[derive(Default)]
struct Registry {
    next_id: u64,
    slots: Vec<(ListenerId, Box<dyn ChangeListener>)>,
}

/// Per-editor listener registry. Cloning yields another handle to the same registry.
#[derive(Clone, Default)]
pub struct ChangeListeners {
    inner: Rc<RefCell<Registry>>,
}

impl ChangeListeners {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener. It stays registered until the returned subscription is dropped or
    /// explicitly unregistered.
    pub fn register<L: ChangeListener + 'static>(&self, listener: L) -> Subscription {
        let name = listener.name();
        let mut reg = self.inner.borrow_mut();
        let id = ListenerId(reg.next_id);
        reg.next_id += 1;
        reg.slots.push((id, Box::new(listener)));
        trace!(target: "events.listeners", listener = name, id = id.0, total = reg.slots.len(), "listener_registered");
        Subscription {
            id,
            registry: Rc::downgrade(&self.inner),
            armed: true,
        }
    }

    pub fn len(&self) -> usize {
        self.inner.borrow().slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Deliver `change` to every listener in registration order. A notification raised while
    /// another is being delivered is dropped and logged.
    pub fn notify(&self, doc: &dyn Document, change: &ExternalChange) {
        let Ok(mut reg) = self.inner.try_borrow_mut() else {
            REENTRANT_NOTIFY_DROPPED.fetch_add(1, Ordering::Relaxed);
            warn!(target: "events.listeners", offset = change.offset, "reentrant_notify_dropped");
            return;
        };
        for (id, listener) in reg.slots.iter_mut() {
            trace!(target: "events.listeners", listener = listener.name(), id = id.0, offset = change.offset, "deliver_change");
            listener.on_external_change(doc, change);
            CHANGES_DELIVERED.fetch_add(1, Ordering::Relaxed);
        }
    }
}

/// Handle returned by `ChangeListeners::register`. Dropping it unregisters the listener.
#[must_use = "dropping a Subscription unregisters its listener"]
pub struct Subscription {
    id: ListenerId,
    registry: Weak<RefCell<Registry>>,
    armed: bool,
}

impl Subscription {
    pub fn id(&self) -> ListenerId {
        self.id
    }

    /// Remove the listener now.
    pub fn unregister(mut self) {
        self.remove();
    }

    /// Keep the listener registered for as long as the registry lives.
    pub fn detach(mut self) {
        self.armed = false;
    }

    /// True while the listener is still registered.
    pub fn is_registered(&self) -> bool {
        self.armed
            && self
                .registry
                .upgrade()
                .is_some_and(|reg| reg.borrow().slots.iter().any(|(id, _)| *id == self.id))
    }

    fn remove(&mut self) {
        if !self.armed {
            return;
        }
        self.armed = false;
        let Some(reg) = self.registry.upgrade() else {
            return;
        };
        let Ok(mut reg) = reg.try_borrow_mut() else {
            warn!(target: "events.listeners", id = self.id.0, "unregister_during_notify_ignored");
            return;
        };
        reg.slots.retain(|(id, _)| *id != self.id);
        trace!(target: "events.listeners", id = self.id.0, total = reg.slots.len(), "listener_unregistered");
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.remove();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_text::Buffer;
    use std::cell::Cell;

    struct Counter(Rc<Cell<usize>>);

    impl ChangeListener for Counter {
        fn name(&self) -> &'static str {
            "counter"
        }
        fn on_external_change(&mut self, _doc: &dyn Document, _change: &ExternalChange) {
            self.0.set(self.0.get() + 1);
        }
    }

    fn deletion() -> ExternalChange {
        ExternalChange::new(
            0,
            "  ",
            "",
            Position::new(0, 0),
            Position::new(0, 2),
            Position::new(0, 0),
        )
    }

    #[test]
    fn flags_derived_from_content() {
        let c = deletion();
        assert!(c.flags.contains(ChangeFlags::WHITESPACE_ONLY));
        assert!(!c.flags.contains(ChangeFlags::LINE_BREAK_REMOVED));
        let joined = ExternalChange::new(
            3,
            "\n",
            "",
            Position::new(0, 3),
            Position::new(1, 0),
            Position::new(0, 3),
        );
        assert!(joined.flags.contains(ChangeFlags::LINE_BREAK_REMOVED));
        assert_eq!(joined.line_delta(), -1);
        let tagged = joined.with_flags(ChangeFlags::UNDO_TRANSPARENT);
        assert!(tagged.flags.contains(ChangeFlags::UNDO_TRANSPARENT | ChangeFlags::WHITESPACE_ONLY));
    }

    #[test]
    fn noop_detection() {
        let c = ExternalChange::new(
            1,
            "x",
            "x",
            Position::new(0, 1),
            Position::new(0, 2),
            Position::new(0, 2),
        );
        assert!(c.is_noop());
        assert!(!deletion().is_noop());
    }

    #[test]
    fn listener_receives_until_dropped() {
        let doc = Buffer::from_str("d", "text").unwrap();
        let listeners = ChangeListeners::new();
        let hits = Rc::new(Cell::new(0));
        let sub = listeners.register(Counter(hits.clone()));
        assert!(sub.is_registered());
        listeners.notify(&doc, &deletion());
        assert_eq!(hits.get(), 1);
        drop(sub);
        assert!(listeners.is_empty());
        listeners.notify(&doc, &deletion());
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn explicit_unregister_leaves_others() {
        let doc = Buffer::from_str("d", "text").unwrap();
        let listeners = ChangeListeners::new();
        let a = Rc::new(Cell::new(0));
        let b = Rc::new(Cell::new(0));
        let sub_a = listeners.register(Counter(a.clone()));
        let _sub_b = listeners.register(Counter(b.clone()));
        sub_a.unregister();
        listeners.notify(&doc, &deletion());
        assert_eq!((a.get(), b.get()), (0, 1));
        assert_eq!(listeners.len(), 1);
    }

    #[test]
    fn detached_listener_outlives_handle() {
        let doc = Buffer::from_str("d", "text").unwrap();
        let listeners = ChangeListeners::new();
        let hits = Rc::new(Cell::new(0));
        listeners.register(Counter(hits.clone())).detach();
        listeners.notify(&doc, &deletion());
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn subscription_outliving_registry_is_harmless() {
        let hits = Rc::new(Cell::new(0));
        let sub = {
            let listeners = ChangeListeners::new();
            listeners.register(Counter(hits))
        };
        assert!(!sub.is_registered());
        sub.unregister();
    }
}
