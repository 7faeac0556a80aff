//! Declaration nodes.

use crate::{Expr, Ident, NodeId};
use tarn_lexer::{Span, TokenKind};

/// A parsed module: a name plus its top-level declarations.
#[derive(Clone, Debug)]
pub struct Module {
    pub name: String,
    pub decls: Vec<Decl>,
}

/// A top-level (or block-level) declaration.
#[derive(Clone, Debug)]
pub enum Decl {
    Binding(Binding),
    Impl(ImplDecl),
}

impl Decl {
    pub fn span(&self) -> Span {
        match self {
            Decl::Binding(b) => b.span,
            Decl::Impl(i) => i.span,
        }
    }
}

/// Binding modifiers, a bit-set over `export` and `const`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BindingMode(u8);

impl BindingMode {
    pub const EXPORT: BindingMode = BindingMode(1);
    pub const CONST: BindingMode = BindingMode(2);

    pub fn export(self) -> bool {
        self.0 & Self::EXPORT.0 != 0
    }

    pub fn constant(self) -> bool {
        self.0 & Self::CONST.0 != 0
    }
}

impl std::ops::BitOrAssign for BindingMode {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

/// A name bound to a type and/or value.
///
/// `token` records which declarator introduced the binding (`const`, `let`,
/// `func`, `struct`, or `trait`) and selects which of `ty`/`value` is
/// required: `func` bindings wrap a [`crate::FuncExpr`], `struct` bindings a
/// struct expression, `trait` bindings a trait expression.
#[derive(Clone, Debug)]
pub struct Binding {
    pub token: TokenKind,
    pub mode: BindingMode,
    pub name: Ident,
    pub ty: Option<Expr>,
    pub value: Option<Expr>,
    pub span: Span,
    pub id: NodeId,
}

/// An `impl Type(Trait, ...) { ... }` declaration attaching definitions to
/// a type.
#[derive(Clone, Debug)]
pub struct ImplDecl {
    pub ty: Expr,
    pub traits: Vec<Expr>,
    pub definitions: Vec<Binding>,
    pub span: Span,
    pub id: NodeId,
}
