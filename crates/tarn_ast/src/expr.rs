//! Expression nodes.

use crate::{Binding, Ident, NodeId, Stmt};
use tarn_lexer::{Span, TokenKind};

/// An expression: a tagged kind plus its source range and node id.
#[derive(Clone, Debug)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
    pub id: NodeId,
}

impl Expr {
    pub fn new(kind: ExprKind, span: Span, id: NodeId) -> Self {
        Self { kind, span, id }
    }
}

/// The kind of expression.
#[derive(Clone, Debug)]
pub enum ExprKind {
    Ident(Ident),
    Literal(Literal),
    Call {
        base: Box<Expr>,
        args: Vec<Expr>,
    },
    Member {
        base: Box<Expr>,
        member: Ident,
    },
    Index {
        base: Box<Expr>,
        indices: Vec<Expr>,
    },
    Binary {
        op: TokenKind,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Unary {
        op: TokenKind,
        base: Box<Expr>,
    },
    Return {
        value: Option<Box<Expr>>,
    },
    Block(Block),
    Func(FuncExpr),
    If {
        cond: Box<Expr>,
        block: Block,
    },
    /// Anonymous structure type, `struct(a: i32, b: i32)`.
    Struct {
        members: Vec<Field>,
    },
    Trait(TraitExpr),
    /// A `name: value` argument inside a call.
    NamedArg {
        name: Ident,
        value: Box<Expr>,
    },
    /// Slice type expression, `[]T`.
    Slice {
        base: Box<Expr>,
    },
    /// Many-item pointer type expression, `[*]T`.
    ManyPointer {
        base: Box<Expr>,
    },
    /// The `...` placeholder in a parameter list.
    VarArg,
    /// Existential type expression, `forSome T`.
    Existential {
        base: Box<Expr>,
    },
    /// Placeholder produced after a parse error so parsing can continue.
    Bad,
}

/// A literal token carried verbatim; string literals keep their quotes.
#[derive(Clone, Debug)]
pub struct Literal {
    pub tok: TokenKind,
    pub value: String,
}

/// A brace-delimited statement list.
#[derive(Clone, Debug)]
pub struct Block {
    pub stmts: Vec<Stmt>,
    pub span: Span,
    pub id: NodeId,
}

/// A function expression: parameters, return type, optional body.
///
/// Without a body this is a function *type*; with one it is a function
/// definition.
#[derive(Clone, Debug)]
pub struct FuncExpr {
    pub params: Vec<Param>,
    pub return_type: Box<Expr>,
    pub body: Option<Block>,
}

/// A function parameter. The name is absent for the `...` placeholder.
#[derive(Clone, Debug)]
pub struct Param {
    pub name: Option<Ident>,
    pub ty: Expr,
    pub span: Span,
}

/// A named field of a struct type.
#[derive(Clone, Debug)]
pub struct Field {
    pub name: Ident,
    pub ty: Expr,
    pub span: Span,
}

/// A trait expression: optional supertraits plus member bindings.
#[derive(Clone, Debug)]
pub struct TraitExpr {
    pub supertraits: Vec<Expr>,
    pub members: Vec<Binding>,
}
