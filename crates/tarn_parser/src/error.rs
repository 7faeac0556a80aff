//! Parser error types.

use tarn_lexer::{LexError, Span};
use thiserror::Error;

/// A parse error.
///
/// Errors are accumulated by the parser, not thrown; the parser recovers at
/// statement and declaration boundaries and keeps going.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("expected {expected} but found {found:?}")]
    Unexpected {
        expected: String,
        found: String,
        span: Span,
    },

    #[error("unexpected end of file while looking for {expected}")]
    UnexpectedEof { expected: String, span: Span },

    #[error(transparent)]
    Lex(#[from] LexError),
}

impl ParseError {
    pub fn span(&self) -> Span {
        match self {
            ParseError::Unexpected { span, .. } => *span,
            ParseError::UnexpectedEof { span, .. } => *span,
            ParseError::Lex(err) => err.span(),
        }
    }
}
