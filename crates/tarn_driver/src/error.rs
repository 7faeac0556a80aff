//! Error types for the compilation driver.

use std::fmt::Write;
use tarn_lexer::Span;
use tarn_qbe::TranslateError;
use thiserror::Error;

/// A single rendered diagnostic: which module, where, and what.
#[derive(Clone, Debug)]
pub struct Diagnostic {
    pub module: String,
    pub span: Span,
    pub message: String,
}

/// Errors that can occur while driving a compilation.
#[derive(Debug, Error)]
pub enum CompileError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Lowering(#[from] TranslateError),

    #[error("{}", format_diagnostics(.0))]
    Diagnostics(Vec<Diagnostic>),
}

/// Result type for driver operations.
pub type CompileResult<T> = Result<T, CompileError>;

fn format_diagnostics(diagnostics: &[Diagnostic]) -> String {
    let mut out = String::new();
    for (i, d) in diagnostics.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        let _ = write!(out, "{}:{}: {}", d.module, d.span.start, d.message);
    }
    out
}
