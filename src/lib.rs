//! modal-sync: text-range resolution and host-edit reconciliation for a modal
//! editing core.
//!
//! The member crates carry the pieces; this crate re-exports them and adds
//! `Session`, which wires a host editor, an emulator state and a mode
//! reconciler together the way an embedder would at start-up.

use anyhow::Result;
use std::cell::{Ref, RefCell, RefMut};
use std::path::PathBuf;
use std::rc::Rc;
use tracing::info;

pub use core_actions as actions;
pub use core_config as config;
pub use core_events as events;
pub use core_model as model;
pub use core_state as state;
pub use core_text as text;

use core_actions::{ModeReconciler, Reconciliation, ResolveError};
use core_config::Config;
use core_events::Subscription;
use core_model::HostEditor;
use core_state::{EditorState, Mode};
use core_text::{Buffer, Document, Position, TextRange, strip_marker};

/// Install a global fmt subscriber filtered by `RUST_LOG`. Later calls are no-ops.
pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .try_init();
}

/// A document open in the host with the emulator's state kept in sync.
pub struct Session {
    host: HostEditor,
    state: Rc<RefCell<EditorState>>,
    config: Config,
    last: Rc<RefCell<Option<Reconciliation>>>,
    reconciler: Option<Subscription>,
}

impl Session {
    /// Open `text`; a caret marker in it places the emulator caret.
    pub fn open(text: &str, config: Config) -> Result<Self> {
        let (clean, caret) = strip_marker(text);
        let buffer = Buffer::from_str("session", &clean)?;
        let caret = buffer.offset_to_position(caret.unwrap_or(0));
        let host = HostEditor::new(buffer);
        let state = Rc::new(RefCell::new(EditorState::with_caret(caret)));
        let (subscription, last) =
            ModeReconciler::attach(host.listeners(), state.clone(), config.reconcile().clone());
        info!(
            target: "session",
            lines = host.document().line_count(),
            caret_line = caret.line,
            caret_byte = caret.byte,
            config_file = config.raw.is_some(),
            "session_opened"
        );
        Ok(Self {
            host,
            state,
            config,
            last,
            reconciler: Some(subscription),
        })
    }

    /// Open `text` with configuration from `path`, or the discovered config file when `None`.
    pub fn open_with_config_file(text: &str, path: Option<PathBuf>) -> Result<Self> {
        let config = core_config::load_from(path)?;
        Self::open(text, config)
    }

    pub fn host(&self) -> &HostEditor {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut HostEditor {
        &mut self.host
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn state(&self) -> Ref<'_, EditorState> {
        self.state.borrow()
    }

    pub fn state_mut(&self) -> RefMut<'_, EditorState> {
        self.state.borrow_mut()
    }

    pub fn mode(&self) -> Mode {
        self.state.borrow().mode
    }

    pub fn caret(&self) -> Position {
        self.state.borrow().caret
    }

    pub fn text(&self) -> String {
        self.host.text()
    }

    /// Outcome of the most recent host edit, if any reached the reconciler.
    pub fn last_reconciliation(&self) -> Option<Reconciliation> {
        self.last.borrow().clone()
    }

    /// First occurrence of `needle` in the live document.
    pub fn locate(&self, needle: &str) -> Result<TextRange, ResolveError> {
        core_actions::locate(&self.host.text(), needle)
    }

    pub fn locate_repeating(
        &self,
        needle: &str,
        lines_down: usize,
    ) -> Result<TextRange, ResolveError> {
        core_actions::locate_repeating(self.host.document(), needle, lines_down)
    }

    /// Stop reconciling host edits. Returns false when already stopped.
    pub fn stop_reconciling(&mut self) -> bool {
        match self.reconciler.take() {
            Some(sub) => {
                sub.unregister();
                true
            }
            None => false,
        }
    }
}
