//! Parser error types.

use crate::lexer::{Token, TokenKind};
use crate::Span;
use thiserror::Error;

/// What went wrong while reading a document.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseErrorKind {
    #[error("expected {expected}, found {found}")]
    Unexpected { expected: String, found: String },

    #[error("unexpected character {0:?}")]
    BadCharacter(char),

    #[error("unterminated string")]
    UnterminatedString,

    #[error("invalid escape sequence \\{0}")]
    BadEscape(char),

    #[error("invalid number {0:?}")]
    BadNumber(String),

    #[error("fragments are not supported in query shapes")]
    Fragment,

    #[error("empty selection set")]
    EmptySelection,

    #[error("variables are not allowed in default values")]
    VariableInDefault,
}

/// A parse error with the line and column it was found at.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("Parse error at {line}:{column}: {kind}")]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub line: usize,
    pub column: usize,
}

impl ParseError {
    pub fn at(kind: ParseErrorKind, span: Span) -> Self {
        Self {
            kind,
            line: span.line,
            column: span.column,
        }
    }

    /// `token` is not the `expected` one.
    pub(crate) fn unexpected(token: &Token, expected: impl ToString) -> Self {
        let found = match &token.kind {
            TokenKind::Name(name) => format!("name {name:?}"),
            other => other.to_string(),
        };
        Self::at(
            ParseErrorKind::Unexpected {
                expected: expected.to_string(),
                found,
            },
            token.span,
        )
    }
}

/// Result type for parsing operations.
pub type ParseResult<T> = Result<T, ParseError>;
