//! Error types for xmldict

use std::fmt;
use thiserror::Error;

/// Position in source text
///
/// Lines and columns are 1-based; line 0 marks an unknown position.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Pos {
    pub offset: usize,
    pub line: u32,
    pub col: u32,
}

impl fmt::Display for Pos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.offset, self.line, self.col)
    }
}

impl Pos {
    pub const fn new(offset: usize, line: u32, col: u32) -> Self {
        Self { offset, line, col }
    }
}

/// Span representing a range in source text
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Span {
    pub start: Pos,
    pub end: Pos,
}

impl Span {
    pub const fn new(start: Pos, end: Pos) -> Self {
        Self { start, end }
    }

    pub const fn at(pos: Pos) -> Self {
        Self {
            start: pos,
            end: pos,
        }
    }

    pub const fn empty() -> Self {
        Self {
            start: Pos::new(0, 0, 0),
            end: Pos::new(0, 0, 0),
        }
    }

    /// True when the span does not point into the source
    pub const fn is_empty(&self) -> bool {
        self.start.line == 0
    }
}

/// What went wrong while turning a document into a [`Node`](crate::Node)
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// The document is not well-formed; the reason comes from the tokenizer
    /// or from a structural check in the builder
    Malformed { reason: String },
    /// Input ended while elements were still open, or before any element
    UnexpectedEof,
    /// An explicit key clashed with another explicit key or with synthesized
    /// text and the configured policy refuses to pick a winner
    KeyCollisionAmbiguous { key: String },
    /// Input bytes are not valid in the detected encoding
    InvalidEncoding { encoding: String },
    /// The XML declaration names an encoding we cannot decode
    UnsupportedEncoding { label: String },
    /// Reading the input failed
    Io { reason: String },
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Malformed { reason } => write!(f, "malformed xml: {reason}"),
            Self::UnexpectedEof => write!(f, "unexpected end of input"),
            Self::KeyCollisionAmbiguous { key } => {
                write!(f, "ambiguous key collision: {key}")
            }
            Self::InvalidEncoding { encoding } => {
                write!(f, "invalid {encoding} byte sequence")
            }
            Self::UnsupportedEncoding { label } => write!(f, "unsupported encoding: {label}"),
            Self::Io { reason } => write!(f, "i/o error: {reason}"),
        }
    }
}

/// Main error type for xmldict
#[derive(Error, Clone, Debug, PartialEq)]
pub struct Error {
    kind: ErrorKind,
    span: Span,
    message: String,
}

impl Error {
    pub fn new(kind: ErrorKind, span: Span) -> Self {
        let message = kind.to_string();
        Self {
            kind,
            span,
            message,
        }
    }

    pub fn with_message(kind: ErrorKind, span: Span, message: impl Into<String>) -> Self {
        Self {
            kind,
            span,
            message: message.into(),
        }
    }

    /// Malformed-document error at a position
    pub fn malformed(reason: impl Into<String>, pos: Pos) -> Self {
        Self::new(
            ErrorKind::Malformed {
                reason: reason.into(),
            },
            Span::at(pos),
        )
    }

    pub fn unexpected_eof() -> Self {
        Self::new(ErrorKind::UnexpectedEof, Span::empty())
    }

    pub fn collision(key: impl Into<String>) -> Self {
        Self::new(
            ErrorKind::KeyCollisionAmbiguous { key: key.into() },
            Span::empty(),
        )
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    pub fn span(&self) -> Span {
        self.span
    }

    /// Where in the source the error was found
    ///
    /// Tokenizer errors always have one. Errors raised by the builder on
    /// hand-fed events, end-of-input and collision errors have none, since
    /// events carry no positions.
    pub fn position(&self) -> Option<Pos> {
        (!self.span.is_empty()).then_some(self.span.start)
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn is_malformed(&self) -> bool {
        matches!(self.kind, ErrorKind::Malformed { .. })
    }

    pub fn is_unexpected_eof(&self) -> bool {
        matches!(self.kind, ErrorKind::UnexpectedEof)
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::new(
            ErrorKind::Io {
                reason: err.to_string(),
            },
            Span::empty(),
        )
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.kind, self.position()) {
            (ErrorKind::Malformed { .. }, Some(pos)) => {
                write!(f, "error at {pos}: {}", self.message)
            }
            _ => f.write_str(&self.message),
        }
    }
}

/// Result type alias for xmldict
pub type Result<T> = std::result::Result<T, Error>;
