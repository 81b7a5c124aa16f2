//! Ex command line ranges (`:3,7d`, `:.,$y`, `:%s`).
//!
//! A command may carry any number of line addresses. They are processed left
//! to right: each address becomes the new end and the previous end becomes
//! the start, so only the last two matter. With a single address start and
//! end coincide; with none the range is the default line (the caret line
//! unless overridden). A trailing count turns the range into `count` lines
//! starting at its end line.
//!
//! Lines are zero-based. Addresses that resolve outside the document clamp to
//! the nearest existing line and a backwards range is swapped.

use core_text::{Document, RangeError, TextRange};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineAddress {
    /// `.`
    Current,
    /// An absolute, zero-based line number.
    Line(usize),
    /// `$`
    Last,
    /// `.+n` / `.-n`
    CurrentOffset(isize),
}

/// Inclusive line range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineRange {
    pub start: usize,
    pub end: usize,
}

impl LineRange {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn line_count(&self) -> usize {
        self.end - self.start + 1
    }
}

#[derive(Debug, Clone, Default)]
pub struct Ranges {
    addresses: Vec<LineAddress>,
    default_line: Option<usize>,
}

impl Ranges {
    pub fn new() -> Self {
        Self::default()
    }

    /// `%`: first line through last line.
    pub fn whole_file() -> Self {
        let mut r = Self::new();
        r.extend([LineAddress::Line(0), LineAddress::Last]);
        r
    }

    pub fn push(&mut self, address: LineAddress) {
        self.addresses.push(address);
    }

    pub fn extend(&mut self, addresses: impl IntoIterator<Item = LineAddress>) {
        self.addresses.extend(addresses);
    }

    pub fn len(&self) -> usize {
        self.addresses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.addresses.is_empty()
    }

    /// Line used when no address was given. `None` means the caret line.
    pub fn set_default_line(&mut self, line: Option<usize>) {
        self.default_line = line;
    }

    /// Line range as given, or `count` lines from the end line when a count is supplied.
    pub fn line_range<D: Document + ?Sized>(
        &self,
        doc: &D,
        caret_line: usize,
        count: Option<usize>,
    ) -> LineRange {
        let processed = self.process(doc, caret_line);
        match count {
            None => processed,
            Some(count) => {
                let last = last_line(doc);
                let end = processed.end.saturating_add(count.max(1) - 1).min(last);
                LineRange::new(processed.end, end)
            }
        }
    }

    /// Byte range from the start of the first line through the line break ending the last.
    pub fn text_range<D: Document + ?Sized>(
        &self,
        doc: &D,
        caret_line: usize,
        count: Option<usize>,
    ) -> Result<TextRange, RangeError> {
        let lines = self.line_range(doc, caret_line, count);
        let start = doc.line_start_offset(lines.start);
        let end = doc.line_end_offset(lines.end, true).min(doc.len_bytes());
        debug!(target: "actions.ex_range", start_line = lines.start, end_line = lines.end, start, end, "ex_text_range");
        TextRange::new(start, end)
    }

    pub fn first_line<D: Document + ?Sized>(&self, doc: &D, caret_line: usize) -> usize {
        self.process(doc, caret_line).start
    }

    pub fn last_line<D: Document + ?Sized>(&self, doc: &D, caret_line: usize) -> usize {
        self.process(doc, caret_line).end
    }

    /// Explicit count when given, the range's end line otherwise.
    pub fn count_or_last<D: Document + ?Sized>(
        &self,
        doc: &D,
        caret_line: usize,
        count: Option<usize>,
    ) -> usize {
        count.unwrap_or_else(|| self.last_line(doc, caret_line))
    }

    fn process<D: Document + ?Sized>(&self, doc: &D, caret_line: usize) -> LineRange {
        let last = last_line(doc);
        let caret_line = caret_line.min(last);
        let mut start = self.default_line.unwrap_or(caret_line).min(last);
        let mut end = start;
        for address in &self.addresses {
            start = end;
            end = resolve(*address, caret_line, last);
        }
        if self.addresses.len() == 1 {
            start = end;
        }
        if start > end {
            debug!(target: "actions.ex_range", start, end, "backwards_range_swapped");
            std::mem::swap(&mut start, &mut end);
        }
        LineRange::new(start, end)
    }
}

/// Whole caret line including its line break.
pub fn current_line_range<D: Document + ?Sized>(
    doc: &D,
    caret_line: usize,
) -> Result<TextRange, RangeError> {
    Ranges::new().text_range(doc, caret_line, None)
}

/// The entire document.
pub fn file_text_range<D: Document + ?Sized>(doc: &D) -> Result<TextRange, RangeError> {
    Ranges::whole_file().text_range(doc, 0, None)
}

fn last_line<D: Document + ?Sized>(doc: &D) -> usize {
    doc.line_count().saturating_sub(1)
}

fn resolve(address: LineAddress, caret_line: usize, last: usize) -> usize {
    let line = match address {
        LineAddress::Current => caret_line,
        LineAddress::Line(n) => n,
        LineAddress::Last => last,
        LineAddress::CurrentOffset(delta) => caret_line.saturating_add_signed(delta),
    };
    line.min(last)
}
