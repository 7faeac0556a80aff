//! Abstract Syntax Tree definitions for the Tarn programming language.
//!
//! This crate provides the closed node families (declarations, statements,
//! expressions) used throughout the compiler pipeline, plus the canonical
//! source printer.

mod decl;
mod expr;
mod printer;
mod stmt;

pub use decl::*;
pub use expr::*;
pub use printer::print_module;
pub use stmt::*;

use tarn_lexer::Span;

/// A unique identifier for an AST node, assigned by the parser.
///
/// Side tables (types, definitions, uses, scopes) key on node ids so they
/// never hold references into the tree.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeId(pub u32);

/// An identifier with its source span.
#[derive(Clone, Debug)]
pub struct Ident {
    pub name: String,
    pub span: Span,
    pub id: NodeId,
}

impl Ident {
    pub fn new(name: impl Into<String>, span: Span, id: NodeId) -> Self {
        Self {
            name: name.into(),
            span,
            id,
        }
    }
}
