//! Semantic error types and the importer interface.

use crate::scope::Module;
use tarn_lexer::Span;
use thiserror::Error;

/// The category of a semantic error.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SemaErrorKind {
    UnresolvedName,
    TypeMismatch,
    ArityMismatch,
    NotCallable,
    NoSuchMember,
    Redeclaration,
    CyclicDefinition,
    CyclicImport,
    BadBuiltinArgs,
    /// Checking reached a parse-error placeholder.
    MalformedSyntax,
    /// An importer failure, propagated verbatim.
    Import,
}

/// A structured semantic error: category, message, and source range.
#[derive(Clone, Debug, Error)]
#[error("{message}")]
pub struct SemaError {
    pub kind: SemaErrorKind,
    pub message: String,
    pub span: Span,
}

impl SemaError {
    pub fn new(kind: SemaErrorKind, span: Span, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            span,
        }
    }
}

/// Errors an importer can report back to the checker.
#[derive(Clone, Debug, Error)]
pub enum ImportError {
    #[error("cyclic import of module {0:?}")]
    Cycle(String),

    #[error("{0}")]
    Failed(String),
}

/// Resolves `@import` names to checked modules.
///
/// Called synchronously during checking; implementations may cache, but a
/// reentrant import (A importing B importing A) must surface as
/// [`ImportError::Cycle`], never recurse.
pub trait Importer {
    fn import(&self, name: &str) -> Result<Module, ImportError>;
}
