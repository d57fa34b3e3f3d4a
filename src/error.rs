use std::path::PathBuf;

use thiserror::Error;

pub type Span = std::ops::Range<usize>;

/// Part type library parse errors
#[derive(Error, Debug, PartialEq, Eq, Clone)]
pub enum ParseError {
    #[error("Unexpected end of file")]
    UnexpectedEof { at: Span },
    #[error("Expected {expected}, found {found}")]
    UnexpectedToken {
        expected: String,
        found: String,
        at: Span,
    },
    #[error("Wrong number of fields in {what}: expected {expected}, found {found}")]
    FieldCount {
        what: &'static str,
        expected: &'static str,
        found: usize,
        at: Span,
    },
    #[error("Missing *END* marker")]
    MissingEnd { at: Span },
    #[error("Unexpected content after *END*")]
    TrailingContent { at: Span },
    #[error("Invalid number {found}")]
    InvalidNumber { found: String, at: Option<Span> },
    #[error("Unknown units {found}")]
    UnknownUnits { found: String, at: Option<Span> },
    #[error("Unknown pin type {found}")]
    UnknownPinType { found: String, at: Option<Span> },
    #[error("Invalid timestamp {found}")]
    InvalidTimestamp { found: String, at: Option<Span> },
}

impl ParseError {
    /// Byte range of the offending input line
    pub fn span(&self) -> Option<Span> {
        match self {
            ParseError::UnexpectedEof { at }
            | ParseError::UnexpectedToken { at, .. }
            | ParseError::FieldCount { at, .. }
            | ParseError::MissingEnd { at }
            | ParseError::TrailingContent { at } => Some(at.clone()),
            ParseError::InvalidNumber { at, .. }
            | ParseError::UnknownUnits { at, .. }
            | ParseError::UnknownPinType { at, .. }
            | ParseError::InvalidTimestamp { at, .. } => at.clone(),
        }
    }

    /// Attaches the line a value conversion error came from, keeping any span already set
    pub(crate) fn with_span(mut self, line: &Span) -> Self {
        match &mut self {
            ParseError::InvalidNumber { at, .. }
            | ParseError::UnknownUnits { at, .. }
            | ParseError::UnknownPinType { at, .. }
            | ParseError::InvalidTimestamp { at, .. } => {
                at.get_or_insert_with(|| line.clone());
            }
            _ => {}
        }
        self
    }
}

/// Converts a byte offset into a 1-based (line, column) pair
pub fn line_col(input: &str, offset: usize) -> (usize, usize) {
    let offset = offset.min(input.len());
    let before = &input[..offset];
    let line = before.matches('\n').count() + 1;
    let col = match before.rfind('\n') {
        Some(nl) => before[nl + 1..].chars().count() + 1,
        None => before.chars().count() + 1,
    };
    (line, col)
}

/// Errors generating a part type that the reader could not read back
#[derive(Error, Debug, PartialEq, Eq, Clone)]
pub enum BuildError {
    #[error("{field} {value:?} must be a single non-empty word")]
    InvalidToken { field: &'static str, value: String },
    #[error("Attribute name {name:?} must not contain quotes or line breaks")]
    InvalidAttributeName { name: String },
    #[error("Attribute {name:?} value {value:?} must be one line without surrounding whitespace")]
    InvalidAttributeValue { name: String, value: String },
}

/// Validation options loading errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid options in {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}
