//! Statement and block parsing.

use crate::parser::Parser;
use tarn_ast::{Block, Stmt};
use tarn_lexer::TokenKind;

impl Parser<'_> {
    pub(crate) fn block(&mut self) -> Block {
        let start = self.cur_start();
        let id = self.next_id();
        self.expect(TokenKind::OpenBrace);

        let mut stmts = Vec::new();
        loop {
            if self.accept(TokenKind::CloseBrace).is_some() {
                break;
            }
            if self.peek_kind().is_none() {
                self.error_eof("}");
                break;
            }
            if let Some(stmt) = self.stmt() {
                stmts.push(stmt);
            }
        }

        Block {
            stmts,
            span: self.span_from(start),
            id,
        }
    }

    fn stmt(&mut self) -> Option<Stmt> {
        match self.peek_kind() {
            Some(
                TokenKind::Export
                | TokenKind::Const
                | TokenKind::Let
                | TokenKind::Func
                | TokenKind::Struct
                | TokenKind::Trait
                | TokenKind::Impl,
            ) => self.decl().map(Stmt::Decl),
            // An `if` used as a statement has no terminating semicolon.
            Some(TokenKind::If) => Some(Stmt::Expr(self.if_expr())),
            _ => {
                let expr = self.expr();
                self.expect(TokenKind::Semicolon);
                Some(Stmt::Expr(expr))
            }
        }
    }
}
