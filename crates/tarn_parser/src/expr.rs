//! Expression parsing with precedence climbing.

use crate::parser::Parser;
use tarn_ast::{Expr, ExprKind, Ident, Literal};
use tarn_lexer::{Precedence, TokenKind};

impl Parser<'_> {
    /// Parses an expression at the weakest binding level.
    pub(crate) fn expr(&mut self) -> Expr {
        self.expr_prec(Precedence::None)
    }

    /// Parses an expression in type position: annotations and return types
    /// must stop in front of `=`, so they bind at assignment strength.
    pub(crate) fn type_expr(&mut self) -> Expr {
        self.expr_prec(Precedence::Assignment)
    }

    pub(crate) fn expr_prec(&mut self, min: Precedence) -> Expr {
        let left = self.unary_operand();
        self.expr_with_left(left, min)
    }

    /// The climbing loop: keep extending `left` while the current token
    /// binds tighter than the caller.
    pub(crate) fn expr_with_left(&mut self, mut left: Expr, min: Precedence) -> Expr {
        while let Some(kind) = self.peek_kind() {
            if kind.precedence() > min {
                left = self.binary(left);
            } else {
                break;
            }
        }
        left
    }

    fn binary(&mut self, left: Expr) -> Expr {
        let kind = self.peek_kind().expect("binary called at end of input");
        match kind {
            TokenKind::OpenParen => self.call(left),
            TokenKind::OpenBracket => self.index(left),
            TokenKind::Dot => {
                self.accept(TokenKind::Dot);
                match self.identifier() {
                    Some(member) => {
                        let span = left.span.merge(member.span);
                        self.expr_node(
                            ExprKind::Member {
                                base: Box::new(left),
                                member,
                            },
                            span,
                        )
                    }
                    None => left,
                }
            }
            TokenKind::Less | TokenKind::Plus | TokenKind::Minus | TokenKind::Assign => {
                self.accept(kind);
                let right = self.expr_prec(kind.precedence());
                let span = left.span.merge(right.span);
                self.expr_node(
                    ExprKind::Binary {
                        op: kind,
                        left: Box::new(left),
                        right: Box::new(right),
                    },
                    span,
                )
            }
            _ => left,
        }
    }

    fn call(&mut self, base: Expr) -> Expr {
        let start = base.span.start;
        self.expect(TokenKind::OpenParen);

        let mut args = Vec::new();
        loop {
            if self.accept(TokenKind::CloseParen).is_some() {
                break;
            }
            if self.peek_kind().is_none() {
                self.error_eof(")");
                break;
            }
            args.push(self.argument());
            if self.accept(TokenKind::CloseParen).is_some() {
                break;
            }
            if self.expect(TokenKind::Comma).is_none() {
                break;
            }
        }

        let span = self.span_from(start);
        self.expr_node(
            ExprKind::Call {
                base: Box::new(base),
                args,
            },
            span,
        )
    }

    fn index(&mut self, base: Expr) -> Expr {
        let start = base.span.start;
        self.expect(TokenKind::OpenBracket);

        let mut indices = Vec::new();
        loop {
            if self.accept(TokenKind::CloseBracket).is_some() {
                break;
            }
            if self.peek_kind().is_none() {
                self.error_eof("]");
                break;
            }
            indices.push(self.expr());
            if self.accept(TokenKind::CloseBracket).is_some() {
                break;
            }
            if self.expect(TokenKind::Comma).is_none() {
                break;
            }
        }

        let span = self.span_from(start);
        self.expr_node(
            ExprKind::Index {
                base: Box::new(base),
                indices,
            },
            span,
        )
    }

    /// A call argument: `name: expr` when an identifier is directly
    /// followed by a colon, a plain expression otherwise.
    fn argument(&mut self) -> Expr {
        if self.at(TokenKind::Identifier) {
            let ident = self.identifier().expect("identifier token");
            if self.accept(TokenKind::Colon).is_some() {
                let value = self.expr();
                let span = ident.span.merge(value.span);
                return self.expr_node(
                    ExprKind::NamedArg {
                        name: ident,
                        value: Box::new(value),
                    },
                    span,
                );
            }
            let span = ident.span;
            let left = self.expr_node(ExprKind::Ident(ident), span);
            return self.expr_with_left(left, Precedence::None);
        }
        self.expr()
    }

    fn unary_operand(&mut self) -> Expr {
        let Some(tok) = self.tok_clone() else {
            self.error_eof("expression");
            return self.bad_expr();
        };

        match tok.kind {
            TokenKind::Identifier => {
                let ident = self.identifier().expect("identifier token");
                let span = ident.span;
                self.expr_node(ExprKind::Ident(ident), span)
            }
            TokenKind::String | TokenKind::Integer => {
                self.accept(tok.kind);
                self.expr_node(
                    ExprKind::Literal(Literal {
                        tok: tok.kind,
                        value: tok.text,
                    }),
                    tok.span,
                )
            }
            TokenKind::Return => {
                self.accept(TokenKind::Return);
                let value = match self.peek_kind() {
                    None | Some(TokenKind::Semicolon) | Some(TokenKind::CloseBrace) => None,
                    Some(_) => Some(Box::new(self.expr())),
                };
                let span = self.span_from(tok.span.start);
                self.expr_node(ExprKind::Return { value }, span)
            }
            TokenKind::Func => {
                self.accept(TokenKind::Func);
                let func = self.func_rest();
                let span = self.span_from(tok.span.start);
                self.expr_node(ExprKind::Func(func), span)
            }
            TokenKind::Ellipses => {
                self.accept(TokenKind::Ellipses);
                self.expr_node(ExprKind::VarArg, tok.span)
            }
            TokenKind::OpenBracket => self.slice_or_many_pointer(),
            TokenKind::If => self.if_expr(),
            TokenKind::Struct => {
                self.accept(TokenKind::Struct);
                let members = self.fields();
                let span = self.span_from(tok.span.start);
                self.expr_node(ExprKind::Struct { members }, span)
            }
            TokenKind::Trait => {
                self.accept(TokenKind::Trait);
                let body = self.trait_rest();
                let span = self.span_from(tok.span.start);
                self.expr_node(ExprKind::Trait(body), span)
            }
            TokenKind::ForSome => {
                self.accept(TokenKind::ForSome);
                let base = self.type_expr();
                let span = self.span_from(tok.span.start);
                self.expr_node(
                    ExprKind::Existential {
                        base: Box::new(base),
                    },
                    span,
                )
            }
            _ => {
                // Leave the token in place; the caller's statement or
                // declaration recovery will skip past it.
                self.record_unexpected_operand(&tok);
                self.bad_expr()
            }
        }
    }

    pub(crate) fn if_expr(&mut self) -> Expr {
        let start = self.cur_start();
        self.expect(TokenKind::If);
        let cond = self.expr();
        let block = self.block();
        let span = self.span_from(start);
        self.expr_node(
            ExprKind::If {
                cond: Box::new(cond),
                block,
            },
            span,
        )
    }

    fn slice_or_many_pointer(&mut self) -> Expr {
        let start = self.cur_start();
        self.expect(TokenKind::OpenBracket);

        let mut many = false;
        match self.peek_kind() {
            Some(TokenKind::Asterisk) => {
                self.accept(TokenKind::Asterisk);
                self.expect(TokenKind::CloseBracket);
                many = true;
            }
            Some(TokenKind::CloseBracket) => {
                self.accept(TokenKind::CloseBracket);
            }
            _ => {
                self.expect(TokenKind::CloseBracket);
            }
        }

        let base = Box::new(self.type_expr());
        let span = self.span_from(start);
        if many {
            self.expr_node(ExprKind::ManyPointer { base }, span)
        } else {
            self.expr_node(ExprKind::Slice { base }, span)
        }
    }

    pub(crate) fn identifier(&mut self) -> Option<Ident> {
        let tok = self.expect(TokenKind::Identifier)?;
        let id = self.next_id();
        Some(Ident::new(tok.text, tok.span, id))
    }
}
