use crate::literal::Span;
use std::fmt;
use thiserror::Error;

/// What went wrong while reading a search table.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatErrorKind {
    #[error("unexpected end of input")]
    UnexpectedEof,

    #[error("expected {expected}, found '{found}'")]
    UnexpectedChar { found: char, expected: &'static str },

    #[error("unterminated string literal")]
    UnterminatedString,

    #[error("unterminated comment")]
    UnterminatedComment,

    #[error("invalid escape sequence in string literal")]
    InvalidEscape,

    #[error("invalid integer literal '{0}'")]
    InvalidNumber(String),

    #[error("unclosed array")]
    UnclosedArray,

    #[error("unclosed object")]
    UnclosedObject,

    #[error("unexpected '{0}' after the end of the table")]
    TrailingInput(char),

    #[error("arrays and objects nested deeper than {0} levels")]
    TooDeep(usize),

    #[error("no `searchData` table found")]
    MissingTable,

    #[error("expected {context} to be an array, found {found}")]
    ExpectedArray {
        context: &'static str,
        found: &'static str,
    },

    #[error("{context} must be a string, found {found}")]
    NotAString {
        context: &'static str,
        found: &'static str,
    },

    #[error("{context} must be an integer, found {found}")]
    NotAnInteger {
        context: &'static str,
        found: &'static str,
    },

    #[error("{context} has {found} elements, expected {expected}")]
    WrongArity {
        context: &'static str,
        expected: &'static str,
        found: usize,
    },

    #[error("entry '{0}' has no targets")]
    EmptyTargets(String),

    #[error("link flag must be 0 or 1, found {0}")]
    InvalidFlag(i64),

    #[error("invalid anchor path '{0}'")]
    InvalidAnchor(String),

    #[error("target label '{found}' does not match entry label '{expected}'")]
    LabelMismatch { expected: String, found: String },

    #[error("invalid search id '{0}'")]
    InvalidKey(String),

    #[error("duplicate key '{0}'")]
    DuplicateKey(String),
}

/// 1-based line and column of an error in the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    /// Resolve a byte offset into a line/column pair.
    pub fn of(source: &str, offset: usize) -> Self {
        let offset = offset.min(source.len());
        let before = &source.as_bytes()[..offset];
        let line = before.iter().filter(|&&b| b == b'\n').count() + 1;
        let line_start = before
            .iter()
            .rposition(|&b| b == b'\n')
            .map(|i| i + 1)
            .unwrap_or(0);
        let column = String::from_utf8_lossy(&before[line_start..]).chars().count() + 1;
        Self { line, column }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

/// The single error type of table loading.
///
/// A table either loads completely or not at all; every malformed record,
/// whether a syntax error or a structural one, surfaces as a `FormatError`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub struct FormatError {
    pub kind: FormatErrorKind,
    /// Byte span of the offending value; synthetic for tables that were not
    /// parsed from text.
    pub span: Span,
    pub position: Option<Position>,
}

impl FormatError {
    pub(crate) fn new(kind: FormatErrorKind, span: Span, source: Option<&str>) -> Self {
        let position = source
            .filter(|_| !span.is_synthetic())
            .map(|src| Position::of(src, span.start));
        Self {
            kind,
            span,
            position,
        }
    }
}

impl fmt::Display for FormatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.position {
            Some(pos) => write!(f, "{} at {pos}", self.kind),
            None => write!(f, "{}", self.kind),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_of_offset() {
        let src = "var a=\n[\n  ['x'";
        assert_eq!(Position::of(src, 0), Position { line: 1, column: 1 });
        assert_eq!(Position::of(src, 7), Position { line: 2, column: 1 });
        assert_eq!(Position::of(src, 11), Position { line: 3, column: 3 });
    }

    #[test]
    fn test_position_counts_chars_not_bytes() {
        let src = "['ü', x]";
        // 'x' sits after a two-byte character
        let offset = src.find('x').unwrap();
        assert_eq!(Position::of(src, offset).column, 7);
    }

    #[test]
    fn test_display_with_position() {
        let err = FormatError::new(
            FormatErrorKind::EmptyTargets("~cipher".into()),
            Span::new(10, 20),
            Some("[\n\n  ['_7ecipher',['~Cipher']]]"),
        );
        assert_eq!(
            err.to_string(),
            "entry '~cipher' has no targets at line 3, column 8"
        );
    }

    #[test]
    fn test_display_without_source() {
        let err = FormatError::new(
            FormatErrorKind::DuplicateKey("~key".into()),
            Span::new(3, 9),
            None,
        );
        assert_eq!(err.to_string(), "duplicate key '~key'");
        assert!(err.position.is_none());
    }

    #[test]
    fn test_error_at_start_of_input_keeps_position() {
        let err = FormatError::new(FormatErrorKind::UnexpectedEof, Span::new(0, 0), Some(""));
        assert_eq!(err.position, Some(Position { line: 1, column: 1 }));

        let detached = FormatError::new(FormatErrorKind::UnexpectedEof, Span::synthetic(), Some(""));
        assert!(detached.position.is_none());
    }
}
