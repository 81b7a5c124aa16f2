//! Caret marker convention for literal fixture text.
//!
//! Fixture strings may embed `CARET_MARKER` to denote where the caret sits.
//! The marker has zero width: every search runs over the stripped text and all
//! offsets handed back are relative to it.

use std::borrow::Cow;

/// Sentinel denoting the caret inside fixture text.
pub const CARET_MARKER: &str = "<caret>";

/// Remove every marker occurrence. Returns the cleaned text and the offset of the
/// first marker in cleaned coordinates (nothing before it is stripped, so the raw
/// index is already the cleaned one).
pub fn strip_marker(text: &str) -> (Cow<'_, str>, Option<usize>) {
    match text.find(CARET_MARKER) {
        None => (Cow::Borrowed(text), None),
        Some(at) => (Cow::Owned(text.replace(CARET_MARKER, "")), Some(at)),
    }
}
