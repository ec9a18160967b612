//! Error taxonomy and physical-position attribution.
//!
//! Mirrors `original_source/include/commata/text_error.hpp` and
//! `parse_error.hpp`: every error that can originate from inside a parse is
//! eventually wrapped with the physical `(line, column)` it was detected at,
//! using a sentinel "absent" position rather than requiring one up front.

use std::fmt;

/// A physical source position, 0-based internally.
///
/// `None` stands in for the C++ original's `npos`-as-absent sentinel: a
/// position that has not yet been attached, or that genuinely has no
/// meaningful location (e.g. an error raised before any character was read).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TextPosition {
    line: Option<usize>,
    column: Option<usize>,
}

impl TextPosition {
    /// The absent position: both line and column unknown.
    pub const ABSENT: TextPosition = TextPosition { line: None, column: None };

    pub fn new(line: usize, column: usize) -> Self {
        Self { line: Some(line), column: Some(column) }
    }

    pub fn is_absent(&self) -> bool {
        self.line.is_none() && self.column.is_none()
    }

    pub fn line(&self) -> Option<usize> {
        self.line
    }

    pub fn column(&self) -> Option<usize> {
        self.column
    }

    /// Formats this position with the caller's configured line/column base
    /// (spec.md §6: default base is 1, so line 0 prints as "line 1").
    pub fn format(&self, base: usize) -> String {
        let line = self.line.map(|l| (l + base).to_string()).unwrap_or_else(|| "n/a".to_string());
        let column = self.column.map(|c| (c + base).to_string()).unwrap_or_else(|| "n/a".to_string());
        format!("line {} column {}", line, column)
    }
}

/// The sign of a numeric overflow, per spec.md §7: `OutOfRange` carries
/// which direction the true value lay on relative to the target type's range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sign {
    Positive,
    Negative,
    Zero,
}

/// A parse failure, always eventually carrying the physical position it was
/// detected at. Construct with [`TextPosition::ABSENT`] when the position is
/// not yet known; the engine's outer `run()` frame fills it in before the
/// error leaves the parse (see [crate::engine]).
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    /// A syntactic violation: a stray quote, a character after a closed
    /// escaped value, or an EOF inside an open escaped value.
    #[error("{message}; {position}", position = .position.format(1))]
    InvalidFormat { message: String, position: TextPosition },

    /// Numeric overflow during translation, or a buffer offered by the
    /// buffer policy that was smaller than two code units.
    #[error("{message}; {position}", position = .position.format(1))]
    OutOfRange { sign: Sign, message: String, position: TextPosition },

    /// A field was blank (or whitespace-only) where a value was required.
    #[error("field is empty; {position}", position = .position.format(1))]
    Empty { position: TextPosition },

    /// No column matched a declared required field name.
    #[error(
        "field not found{}; {position}",
        name.as_deref().map(|n| format!(": {n}")).unwrap_or_default(),
        position = .position.format(1),
    )]
    FieldNotFound { name: Option<String>, position: TextPosition },

    /// The character input's `fill` call failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ParseError {
    /// The bare message, with no position baked in — for callers that want
    /// to render the position at a line/column base other than the
    /// `Display` impl's default of 1 (spec.md §6 wire format uses base `b`
    /// generically; `Display` fixes `b = 1`).
    pub fn message(&self) -> String {
        match self {
            ParseError::InvalidFormat { message, .. } => message.clone(),
            ParseError::OutOfRange { message, .. } => message.clone(),
            ParseError::Empty { .. } => "field is empty".to_string(),
            ParseError::FieldNotFound { name, .. } => {
                format!("field not found{}", name.as_deref().map(|n| format!(": {n}")).unwrap_or_default())
            }
            ParseError::Io(e) => format!("I/O error: {e}"),
        }
    }

    /// The physical position this error carries, if any.
    pub fn position(&self) -> TextPosition {
        match self {
            ParseError::InvalidFormat { position, .. } => *position,
            ParseError::OutOfRange { position, .. } => *position,
            ParseError::Empty { position } => *position,
            ParseError::FieldNotFound { position, .. } => *position,
            ParseError::Io(_) => TextPosition::ABSENT,
        }
    }

    /// Returns a copy of this error with its position set to `position`,
    /// unless it already carries a non-absent position (a scanner or
    /// translator may pre-attach a more specific location than the engine's
    /// current cursor; the engine must not clobber that).
    pub fn with_position(self, position: TextPosition) -> Self {
        match self {
            ParseError::InvalidFormat { message, position: p } if p.is_absent() => {
                ParseError::InvalidFormat { message, position }
            }
            ParseError::OutOfRange { sign, message, position: p } if p.is_absent() => {
                ParseError::OutOfRange { sign, message, position }
            }
            ParseError::Empty { position: p } if p.is_absent() => ParseError::Empty { position },
            ParseError::FieldNotFound { name, position: p } if p.is_absent() => {
                ParseError::FieldNotFound { name, position }
            }
            other => other,
        }
    }
}

/// Renders a `TextPosition`/message pair using the wire format from
/// spec.md §6, for callers that want the "bare message when both positions
/// are absent" behavior independent of the `Display` impl on [`ParseError`].
pub fn format_text_error(message: &str, position: TextPosition, base: usize) -> String {
    if position.is_absent() {
        message.to_string()
    } else if message.is_empty() {
        format!("Text error at {}", position.format(base))
    } else {
        format!("{}; {}", message, position.format(base))
    }
}

impl fmt::Display for TextPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format(1))
    }
}
