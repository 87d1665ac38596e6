//! Error handling utilities.
//!
//! The key trait of this module is [`Error`], which is implemented by every
//! error type this crate raises. It extends the standard library's error
//! trait with the information a diagnostic renderer needs:
//! - [`Error::span`]: the location(s) in source that caused the error
//! - [`Error::help`]: a note on how to fix the error
//!
//! [`report`] renders an error against the source it was raised from as
//! plain text, in the style used by the CLI front end.
//!
//! For convenience, this module also re-exports the error types of the
//! other modules.

use std::borrow::Cow;
use std::fmt::Write as _;
use std::ops::Range;

pub use crate::encoding::DecodeErr;
pub use crate::parse::lex::LexErr;
pub use crate::parse::{ParseErr, ParseErrKind};
pub use crate::run::RunErr;
pub use crate::sim::{RangeErr, SimErr};

/// Unified error interface for all errors in this crate.
pub trait Error: std::error::Error {
    /// The segment(s) of source code which caused the error.
    ///
    /// If the error is not tied to a segment of source code (for example,
    /// it was raised during execution), this returns `None`.
    fn span(&self) -> Option<ErrSpan> {
        None
    }

    /// A short note on how to fix the error, if an applicable one exists.
    fn help(&self) -> Option<Cow<str>> {
        None
    }
}

/// The location(s) of source code which caused an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrSpan {
    /// The error came from one contiguous span.
    One(Range<usize>),
    /// The error came from two spans.
    Two([Range<usize>; 2]),
    /// The error came from several spans.
    Many(Vec<Range<usize>>),
}

impl ErrSpan {
    /// The first (or only) range of this span.
    pub fn first(&self) -> Range<usize> {
        self.as_slice().first().cloned().unwrap_or(0..0)
    }

    /// All ranges of this span, in source order.
    pub fn as_slice(&self) -> &[Range<usize>] {
        match self {
            ErrSpan::One(r) => std::slice::from_ref(r),
            ErrSpan::Two(rs) => rs,
            ErrSpan::Many(rs) => rs,
        }
    }
}

impl From<Range<usize>> for ErrSpan {
    fn from(value: Range<usize>) -> Self {
        ErrSpan::One(value)
    }
}
impl From<[Range<usize>; 2]> for ErrSpan {
    fn from(value: [Range<usize>; 2]) -> Self {
        ErrSpan::Two(value)
    }
}
impl From<Vec<Range<usize>>> for ErrSpan {
    fn from(value: Vec<Range<usize>>) -> Self {
        match <[Range<usize>; 2]>::try_from(value) {
            Ok(rs) => ErrSpan::Two(rs),
            Err(mut value) => match value.len() {
                1 => ErrSpan::One(value.swap_remove(0)),
                _ => ErrSpan::Many(value),
            },
        }
    }
}

/// Renders an error against the source it was raised from as plain text.
///
/// The rendering always starts with the error's message. If the error
/// carries a span, the offending source line follows with a caret
/// underline; if the error carries a help note, it is appended last.
///
/// ## Example
///
/// ```
/// use uvm::err::report;
/// use uvm::parse::parse_program;
///
/// let src = "CONST 1, 2\nFOO 3, 4";
/// let err = parse_program(src).unwrap_err();
/// assert_eq!(report(&err, src), "\
/// error: unknown instruction FOO
///      |
///    2 | FOO 3, 4
///      | ^^^
///      = help: the mnemonics are CONST, LOAD, STORE, and BITREV");
/// ```
pub fn report(err: &dyn Error, src: &str) -> String {
    let mut buf = String::new();
    let _ = write!(buf, "error: {err}");

    if let Some(span) = err.span() {
        let Range { start, end } = span.first();
        let start = start.min(src.len());

        let line_start = src[..start].rfind('\n').map_or(0, |i| i + 1);
        let line_no = src[..start].matches('\n').count() + 1;
        let line = src[line_start..].lines().next().unwrap_or("");

        // clip the underline to the reported line
        let col = start - line_start;
        let carets = end.min(line_start + line.len()).saturating_sub(start).max(1);

        let _ = write!(buf, "\n     |");
        let _ = write!(buf, "\n{line_no:>4} | {line}");
        let _ = write!(buf, "\n     | {:col$}{:^<carets$}", "", "");
    }
    if let Some(help) = err.help() {
        let _ = write!(buf, "\n     = help: {help}");
    }

    buf
}
