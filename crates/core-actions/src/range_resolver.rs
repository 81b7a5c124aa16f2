//! Text range resolver.
//!
//! Turns a textual target into concrete offsets. Used by fixture-driven tests
//! to address text without hand-counting bytes, and by motion code that needs
//! "the same column, N lines down".
//!
//! Matching is first-occurrence, case-sensitive and marker-exclusive: the
//! caret marker is stripped before searching and every offset returned is
//! relative to the stripped text (for `locate`) or to the live document (for
//! `locate_repeating`).
//!
//! This module does NOT mutate anything; it is safe to call repeatedly on the
//! same text and always yields identical ranges.

use core_text::{Document, Position, RangeError, Span, TextRange, strip_marker};
use thiserror::Error;
use tracing::{debug, trace};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("{needle:?} was not found in {haystack:?}")]
    NotFound { needle: String, haystack: String },
    #[error(
        "match on line {start_line} repeated {lines_down} lines down needs line {requested}, but the document has {line_count} lines"
    )]
    OutOfBounds {
        start_line: usize,
        lines_down: usize,
        requested: usize,
        line_count: usize,
    },
    #[error(transparent)]
    Range(#[from] RangeError),
}

/// Range of the first occurrence of `needle` in `haystack` after stripping caret markers.
pub fn locate(haystack: &str, needle: &str) -> Result<TextRange, ResolveError> {
    let (clean, _) = strip_marker(haystack);
    let Some(index) = clean.find(needle) else {
        return Err(not_found(needle, &clean));
    };
    trace!(target: "actions.range", index, len = needle.len(), "locate_hit");
    Ok(TextRange::new(index, index + needle.len())?)
}

/// First occurrence of `needle` in the document plus the same column on each of the next
/// `lines_down` lines: `lines_down + 1` spans, each `needle.len()` long.
///
/// Columns past the end of a shorter line clamp to that line's end. Fails when
/// `start_line + lines_down` exceeds the line count; a repeat landing exactly one line past the
/// last resolves to the document end. The bound is checked up front and again before every
/// per-line lookup, since the document is live.
pub fn locate_repeating(
    doc: &dyn Document,
    needle: &str,
    lines_down: usize,
) -> Result<TextRange, ResolveError> {
    let text = doc.text();
    let (clean, _) = strip_marker(&text);
    let Some(index) = clean.find(needle) else {
        return Err(not_found(needle, &clean));
    };
    let origin = doc.offset_to_position(index);
    ensure_line(doc, origin.line, lines_down, lines_down)?;

    let mut spans = Vec::with_capacity(lines_down + 1);
    spans.push(Span::new(index, index + needle.len())?);
    for i in 1..=lines_down {
        ensure_line(doc, origin.line, lines_down, i)?;
        let offset = doc.position_to_offset(Position::new(origin.line + i, origin.byte));
        spans.push(Span::new(offset, offset + needle.len())?);
    }
    debug!(
        target: "actions.range",
        line = origin.line,
        column = origin.byte,
        lines_down,
        "locate_repeating_resolved"
    );
    Ok(TextRange::from_spans(spans)?)
}

/// Every non-overlapping occurrence of `needle`, ascending, as one multi-span range.
/// An empty needle matches once, at offset 0.
pub fn locate_all(haystack: &str, needle: &str) -> Result<TextRange, ResolveError> {
    if needle.is_empty() {
        return locate(haystack, needle);
    }
    let (clean, _) = strip_marker(haystack);
    let spans = clean
        .match_indices(needle)
        .map(|(i, m)| Span::new(i, i + m.len()))
        .collect::<Result<Vec<_>, _>>()?;
    if spans.is_empty() {
        return Err(not_found(needle, &clean));
    }
    Ok(TextRange::from_spans(spans)?)
}

/// Offset of the caret marker in fixture text, relative to the stripped text.
pub fn caret_offset(fixture: &str) -> Option<usize> {
    strip_marker(fixture).1
}

fn ensure_line(
    doc: &dyn Document,
    start_line: usize,
    lines_down: usize,
    step: usize,
) -> Result<(), ResolveError> {
    let line_count = doc.line_count();
    let requested = start_line + step;
    if requested > line_count {
        return Err(ResolveError::OutOfBounds {
            start_line,
            lines_down,
            requested,
            line_count,
        });
    }
    Ok(())
}

fn not_found(needle: &str, haystack: &str) -> ResolveError {
    ResolveError::NotFound {
        needle: needle.to_string(),
        haystack: haystack.to_string(),
    }
}
