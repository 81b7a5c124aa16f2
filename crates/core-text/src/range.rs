//! Immutable offset ranges.
//!
//! A `TextRange` is either a single `[start, end)` span or a parallel sequence
//! of spans (one per matched line for column-repeated matches). Invariants are
//! checked once at construction; afterwards the value never changes.
//!
//! Invariants:
//! * at least one span;
//! * `start <= end` for every span;
//! * spans ordered by ascending `start`.

use smallvec::SmallVec;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RangeError {
    #[error("span start {start} is after its end {end}")]
    Inverted { start: usize, end: usize },
    #[error("span starting at {start} precedes the previous span starting at {previous}")]
    Unordered { previous: usize, start: usize },
    #[error("a text range needs at least one span")]
    Empty,
    #[error("{starts} start offsets paired with {ends} end offsets")]
    LengthMismatch { starts: usize, ends: usize },
}

/// Half-open `[start, end)` byte span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Result<Self, RangeError> {
        if start > end {
            return Err(RangeError::Inverted { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn contains(&self, offset: usize) -> bool {
        self.start <= offset && offset < self.end
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TextRange {
    spans: SmallVec<[Span; 1]>,
}

impl TextRange {
    /// Single-span range.
    pub fn new(start: usize, end: usize) -> Result<Self, RangeError> {
        let span = Span::new(start, end)?;
        let mut spans = SmallVec::new();
        spans.push(span);
        Ok(Self { spans })
    }

    /// Multi-span range from parallel start/end offsets.
    pub fn from_parallel(starts: &[usize], ends: &[usize]) -> Result<Self, RangeError> {
        if starts.len() != ends.len() {
            return Err(RangeError::LengthMismatch {
                starts: starts.len(),
                ends: ends.len(),
            });
        }
        Self::from_spans(
            starts
                .iter()
                .zip(ends)
                .map(|(&s, &e)| Span::new(s, e))
                .collect::<Result<Vec<_>, _>>()?,
        )
    }

    /// Range from already-built spans, validating ordering.
    pub fn from_spans<I>(spans: I) -> Result<Self, RangeError>
    where
        I: IntoIterator<Item = Span>,
    {
        let spans: SmallVec<[Span; 1]> = spans.into_iter().collect();
        if spans.is_empty() {
            return Err(RangeError::Empty);
        }
        for span in &spans {
            if span.start > span.end {
                return Err(RangeError::Inverted {
                    start: span.start,
                    end: span.end,
                });
            }
        }
        if let Some(w) = spans.windows(2).find(|w| w[1].start < w[0].start) {
            return Err(RangeError::Unordered {
                previous: w[0].start,
                start: w[1].start,
            });
        }
        Ok(Self { spans })
    }

    pub fn spans(&self) -> &[Span] {
        &self.spans
    }

    /// Number of spans.
    pub fn span_count(&self) -> usize {
        self.spans.len()
    }

    pub fn is_multiple(&self) -> bool {
        self.spans.len() > 1
    }

    /// Start of the first span.
    pub fn start_offset(&self) -> usize {
        self.spans[0].start
    }

    /// End of the last span.
    pub fn end_offset(&self) -> usize {
        self.spans[self.spans.len() - 1].end
    }

    pub fn starts(&self) -> impl Iterator<Item = usize> + '_ {
        self.spans.iter().map(|s| s.start)
    }

    pub fn ends(&self) -> impl Iterator<Item = usize> + '_ {
        self.spans.iter().map(|s| s.end)
    }

    /// Length of the longest span.
    pub fn max_length(&self) -> usize {
        self.spans.iter().map(Span::len).max().unwrap_or(0)
    }

    /// True when any span contains `offset`.
    pub fn contains(&self, offset: usize) -> bool {
        self.spans.iter().any(|s| s.contains(offset))
    }
}

impl fmt::Display for TextRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("TextRange[")?;
        for (i, span) in self.spans.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}..{}", span.start, span.end)?;
        }
        f.write_str("]")
    }
}
