//! Lowering error types.

use tarn_lexer::Span;
use thiserror::Error;

/// Errors produced while ordering declarations or lowering to IL.
#[derive(Clone, Debug, Error)]
pub enum TranslateError {
    #[error("cyclic definition of {name:?}")]
    CyclicDefinition { name: String, span: Span },

    #[error("{message}")]
    Unsupported { message: String, span: Span },
}

impl TranslateError {
    pub fn span(&self) -> Span {
        match self {
            TranslateError::CyclicDefinition { span, .. } => *span,
            TranslateError::Unsupported { span, .. } => *span,
        }
    }

    pub(crate) fn unsupported(span: Span, message: impl Into<String>) -> Self {
        TranslateError::Unsupported {
            message: message.into(),
            span,
        }
    }
}
