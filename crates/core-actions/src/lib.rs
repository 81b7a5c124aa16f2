//! Range resolution and host-edit reconciliation for the modal editing core.
//!
//! * `range_resolver`: textual targets to byte ranges (single and column-repeated).
//! * `ex_range`: Ex line addresses plus counts to line and byte ranges.
//! * `reconciler`: keeps `EditorState` valid across edits the host makes on its own.

pub mod ex_range;
pub mod range_resolver;
pub mod reconciler;

pub use ex_range::{LineAddress, LineRange, Ranges, current_line_range, file_text_range};
pub use range_resolver::{ResolveError, caret_offset, locate, locate_all, locate_repeating};
pub use reconciler::{
    ModeReconciler, RECONCILE_STATE_BUSY_DROPPED, ReconcileError, Reconciliation, Skip, reconcile,
    removed_by, shift_position,
};
