//! Declaration parsing: bindings and impl blocks.

use crate::parser::Parser;
use tarn_ast::{Binding, BindingMode, ExprKind, Field, FuncExpr, ImplDecl, Param, TraitExpr};
use tarn_lexer::{Precedence, TokenKind};

impl Parser<'_> {
    pub(crate) fn binding(&mut self) -> Option<Binding> {
        let start = self.cur_start();
        let mut mode = BindingMode::default();

        if self.accept(TokenKind::Export).is_some() {
            mode |= BindingMode::EXPORT;
        }
        if self.accept(TokenKind::Const).is_some() {
            mode |= BindingMode::CONST;
        }

        if mode.constant() && self.at(TokenKind::Identifier) {
            return self.const_binding(mode, start);
        }

        match self.peek_kind() {
            Some(TokenKind::Let) => self.let_binding(mode, start),
            Some(TokenKind::Func) => self.func_binding(mode, start),
            Some(TokenKind::Struct) => self.struct_binding(mode, start),
            Some(TokenKind::Trait) => self.trait_binding(mode, start),
            _ => {
                self.unexpected("binding");
                None
            }
        }
    }

    fn const_binding(&mut self, mode: BindingMode, start: tarn_lexer::Pos) -> Option<Binding> {
        let name = self.identifier()?;

        let ty = if self.accept(TokenKind::Colon).is_some() {
            Some(self.type_expr())
        } else {
            None
        };
        let value = if self.accept(TokenKind::Assign).is_some() {
            Some(self.expr())
        } else {
            None
        };
        self.expect(TokenKind::Semicolon);

        let id = self.next_id();
        Some(Binding {
            token: TokenKind::Const,
            mode,
            name,
            ty,
            value,
            span: self.span_from(start),
            id,
        })
    }

    fn let_binding(&mut self, mode: BindingMode, start: tarn_lexer::Pos) -> Option<Binding> {
        self.expect(TokenKind::Let)?;
        let name = self.identifier()?;

        let ty = if self.accept(TokenKind::Colon).is_some() {
            Some(self.type_expr())
        } else {
            None
        };
        let value = if self.accept(TokenKind::Assign).is_some() {
            Some(self.expr())
        } else {
            None
        };
        self.expect(TokenKind::Semicolon);

        let id = self.next_id();
        Some(Binding {
            token: TokenKind::Let,
            mode,
            name,
            ty,
            value,
            span: self.span_from(start),
            id,
        })
    }

    fn func_binding(&mut self, mode: BindingMode, start: tarn_lexer::Pos) -> Option<Binding> {
        let kw_start = self.cur_start();
        self.expect(TokenKind::Func)?;
        let name = self.identifier()?;

        let func = self.func_rest();
        if func.body.is_none() {
            self.expect(TokenKind::Semicolon);
        }

        let span = self.span_from(kw_start);
        let value = self.expr_node(ExprKind::Func(func), span);
        let id = self.next_id();
        Some(Binding {
            token: TokenKind::Func,
            mode,
            name,
            ty: None,
            value: Some(value),
            span: self.span_from(start),
            id,
        })
    }

    fn struct_binding(&mut self, mode: BindingMode, start: tarn_lexer::Pos) -> Option<Binding> {
        let kw_start = self.cur_start();
        self.expect(TokenKind::Struct)?;
        let name = self.identifier()?;

        let members = self.fields();
        self.expect(TokenKind::Semicolon);

        let span = self.span_from(kw_start);
        let value = self.expr_node(ExprKind::Struct { members }, span);
        let id = self.next_id();
        Some(Binding {
            token: TokenKind::Struct,
            mode,
            name,
            ty: None,
            value: Some(value),
            span: self.span_from(start),
            id,
        })
    }

    fn trait_binding(&mut self, mode: BindingMode, start: tarn_lexer::Pos) -> Option<Binding> {
        let kw_start = self.cur_start();
        self.expect(TokenKind::Trait)?;
        let name = self.identifier()?;

        let body = self.trait_rest();
        self.accept(TokenKind::Semicolon);

        let span = self.span_from(kw_start);
        let value = self.expr_node(ExprKind::Trait(body), span);
        let id = self.next_id();
        Some(Binding {
            token: TokenKind::Trait,
            mode,
            name,
            ty: None,
            value: Some(value),
            span: self.span_from(start),
            id,
        })
    }

    pub(crate) fn impl_decl(&mut self) -> Option<ImplDecl> {
        let start = self.cur_start();
        self.expect(TokenKind::Impl)?;

        let ty = self.expr_prec(Precedence::Call);

        let mut traits = Vec::new();
        self.expect(TokenKind::OpenParen);
        loop {
            if self.accept(TokenKind::CloseParen).is_some() {
                break;
            }
            if self.peek_kind().is_none() {
                self.error_eof(")");
                break;
            }
            traits.push(self.expr());
            if self.accept(TokenKind::Comma).is_some() {
                continue;
            }
            if self.accept(TokenKind::CloseParen).is_some() {
                break;
            }
            self.expect(TokenKind::CloseParen);
            break;
        }

        let definitions = self.binding_list();

        let id = self.next_id();
        Some(ImplDecl {
            ty,
            traits,
            definitions,
            span: self.span_from(start),
            id,
        })
    }

    /// `(supertraits)? { bindings }` after the `trait` keyword (and name,
    /// when there is one).
    pub(crate) fn trait_rest(&mut self) -> TraitExpr {
        let mut supertraits = Vec::new();
        if self.accept(TokenKind::OpenParen).is_some() {
            loop {
                if self.accept(TokenKind::CloseParen).is_some() {
                    break;
                }
                if self.peek_kind().is_none() {
                    self.error_eof(")");
                    break;
                }
                supertraits.push(self.expr());
                if self.accept(TokenKind::Comma).is_some() {
                    continue;
                }
                if self.accept(TokenKind::CloseParen).is_some() {
                    break;
                }
                self.expect(TokenKind::CloseParen);
                break;
            }
        }

        let members = self.binding_list();
        TraitExpr {
            supertraits,
            members,
        }
    }

    fn binding_list(&mut self) -> Vec<Binding> {
        let mut bindings = Vec::new();
        self.expect(TokenKind::OpenBrace);
        loop {
            if self.accept(TokenKind::CloseBrace).is_some() {
                break;
            }
            if self.peek_kind().is_none() {
                self.error_eof("}");
                break;
            }
            if let Some(binding) = self.binding() {
                bindings.push(binding);
            }
        }
        bindings
    }

    /// `(params) ReturnType Block?` after the `func` keyword (and name,
    /// when there is one).
    pub(crate) fn func_rest(&mut self) -> FuncExpr {
        let mut params = Vec::new();
        self.expect(TokenKind::OpenParen);
        loop {
            if self.accept(TokenKind::CloseParen).is_some() {
                break;
            }
            if self.peek_kind().is_none() {
                self.error_eof(")");
                break;
            }
            match self.param() {
                Some(param) => params.push(param),
                None => break,
            }
            if self.accept(TokenKind::Comma).is_some() {
                continue;
            }
            if self.accept(TokenKind::CloseParen).is_some() {
                break;
            }
            self.expect(TokenKind::CloseParen);
            break;
        }

        let return_type = self.type_expr();
        let body = if self.at(TokenKind::OpenBrace) {
            Some(self.block())
        } else {
            None
        };

        FuncExpr {
            params,
            return_type: Box::new(return_type),
            body,
        }
    }

    fn param(&mut self) -> Option<Param> {
        if let Some(tok) = self.accept(TokenKind::Ellipses) {
            let ty = self.expr_node(ExprKind::VarArg, tok.span);
            return Some(Param {
                name: None,
                ty,
                span: tok.span,
            });
        }

        let name = self.identifier()?;
        self.expect(TokenKind::Colon)?;
        let ty = self.type_expr();
        Some(Param {
            span: name.span.merge(ty.span),
            name: Some(name),
            ty,
        })
    }

    pub(crate) fn fields(&mut self) -> Vec<Field> {
        let mut fields = Vec::new();
        self.expect(TokenKind::OpenParen);
        loop {
            if self.accept(TokenKind::CloseParen).is_some() {
                break;
            }
            if self.peek_kind().is_none() {
                self.error_eof(")");
                break;
            }
            match self.field() {
                Some(field) => fields.push(field),
                None => break,
            }
            if self.accept(TokenKind::CloseParen).is_some() {
                break;
            }
            if self.expect(TokenKind::Comma).is_none() {
                break;
            }
        }
        fields
    }

    fn field(&mut self) -> Option<Field> {
        let name = self.identifier()?;
        self.expect(TokenKind::Colon)?;
        let ty = self.type_expr();
        Some(Field {
            span: name.span.merge(ty.span),
            name,
            ty,
        })
    }
}
