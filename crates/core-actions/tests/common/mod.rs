#![allow(dead_code)] // Shared across integration tests; each test binary uses a subset of helpers.

use core_actions::{ModeReconciler, Reconciliation};
use core_config::ReconcileConfig;
use core_events::Subscription;
use core_model::HostEditor;
use core_state::{EditorState, Mode};
use core_text::{Buffer, Document, Position, strip_marker};
use std::cell::RefCell;
use std::rc::Rc;

pub const POEM: &str = "A Discovery

I <caret>found it in a legendary land
all rocks and lavender and tufted grass,
where it was settled on some sodden sand
hard by the torrent of a mountain pass.";

/// Host editor with an emulator state wired to it through a reconciler.
pub struct Fixture {
    pub host: HostEditor,
    pub state: Rc<RefCell<EditorState>>,
    pub last: Rc<RefCell<Option<Reconciliation>>>,
    pub subscription: Option<Subscription>,
}

/// Open `text` in a host editor. A caret marker, if present, places the emulator caret.
pub fn configure_by_text(text: &str) -> Fixture {
    configure_with(text, ReconcileConfig::default())
}

pub fn configure_with(text: &str, config: ReconcileConfig) -> Fixture {
    let (clean, caret) = strip_marker(text);
    let buffer = Buffer::from_str("fixture", &clean).unwrap();
    let caret = buffer.offset_to_position(caret.unwrap_or(0));
    let host = HostEditor::new(buffer);
    let state = Rc::new(RefCell::new(EditorState::with_caret(caret)));
    let (subscription, last) = ModeReconciler::attach(host.listeners(), state.clone(), config);
    Fixture {
        host,
        state,
        last,
        subscription: Some(subscription),
    }
}

impl Fixture {
    pub fn mode(&self) -> Mode {
        self.state.borrow().mode
    }

    pub fn caret(&self) -> Position {
        self.state.borrow().caret
    }

    pub fn enter(&self, mode: Mode) {
        self.state.borrow_mut().transition(mode);
    }

    pub fn move_caret(&self, to: Position) {
        self.state.borrow_mut().move_caret(to);
    }

    pub fn text(&self) -> String {
        self.host.text()
    }

    pub fn last_outcome(&self) -> Option<Reconciliation> {
        self.last.borrow().clone()
    }

    pub fn detach_reconciler(&mut self) {
        if let Some(sub) = self.subscription.take() {
            sub.unregister();
        }
    }
}
