//! Statement nodes.

use crate::{Decl, Expr};
use tarn_lexer::Span;

/// A statement inside a block: an expression or a promoted declaration.
#[derive(Clone, Debug)]
pub enum Stmt {
    Expr(Expr),
    Decl(Decl),
}

impl Stmt {
    pub fn span(&self) -> Span {
        match self {
            Stmt::Expr(e) => e.span,
            Stmt::Decl(d) => d.span(),
        }
    }
}
