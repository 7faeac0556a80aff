//! Declaration ordering.
//!
//! Code emission needs module-level bindings in dependency order: a symbol
//! must be emitted after every module-level symbol its definition uses.
//! This pass runs a post-order DFS over the use edges recorded by the
//! checker. Uses inside function bodies are exempt from the cycle check,
//! since bodies run at run time and may legally reach their own symbol.

use crate::error::TranslateError;
use std::collections::HashMap;
use tarn_ast::{self as ast, ExprKind};
use tarn_sema::{Info, Symbol, Value};

#[derive(Clone, Copy, PartialEq, Eq)]
enum Visit {
    InProgress,
    Done,
}

/// Orders the module's bindings so every definition precedes its uses.
pub fn declaration_order<'m>(
    module: &'m ast::Module,
    info: &Info,
) -> Result<Vec<&'m ast::Binding>, TranslateError> {
    let mut pass = OrderPass {
        info,
        defs: HashMap::new(),
        state: HashMap::new(),
        order: Vec::new(),
    };

    for decl in &module.decls {
        if let ast::Decl::Binding(binding) = decl {
            if let Some(sym) = info.defs.get(&binding.name.id) {
                pass.defs.insert(sym.clone(), binding);
            }
        }
    }

    for decl in &module.decls {
        if let ast::Decl::Binding(binding) = decl {
            pass.visit(binding)?;
        }
    }
    Ok(pass.order)
}

struct OrderPass<'a, 'm> {
    info: &'a Info,
    defs: HashMap<Symbol, &'m ast::Binding>,
    state: HashMap<Symbol, Visit>,
    order: Vec<&'m ast::Binding>,
}

impl<'m> OrderPass<'_, 'm> {
    fn visit(&mut self, binding: &'m ast::Binding) -> Result<(), TranslateError> {
        let Some(sym) = self.info.defs.get(&binding.name.id).cloned() else {
            return Ok(());
        };
        if self.state.contains_key(&sym) {
            return Ok(());
        }
        self.state.insert(sym.clone(), Visit::InProgress);

        if let Some(ty) = &binding.ty {
            self.expr(ty, false)?;
        }
        if let Some(value) = &binding.value {
            self.expr(value, false)?;
        }

        self.state.insert(sym.clone(), Visit::Done);
        // Imports and externs have no definition of their own to emit.
        if !matches!(
            sym.value(),
            Some(Value::Module(_)) | Some(Value::Extern { .. })
        ) {
            self.order.push(binding);
        }
        Ok(())
    }

    fn see(&mut self, ident: &ast::Ident, in_body: bool) -> Result<(), TranslateError> {
        let Some(sym) = self.info.uses.get(&ident.id).cloned() else {
            return Ok(());
        };
        if matches!(
            sym.value(),
            Some(Value::Module(_)) | Some(Value::Extern { .. })
        ) {
            return Ok(());
        }
        // Only module-level bindings of this module participate.
        let Some(binding) = self.defs.get(&sym).copied() else {
            return Ok(());
        };
        match self.state.get(&sym) {
            Some(Visit::Done) => Ok(()),
            Some(Visit::InProgress) => {
                if in_body {
                    Ok(())
                } else {
                    Err(TranslateError::CyclicDefinition {
                        name: ident.name.clone(),
                        span: ident.span,
                    })
                }
            }
            None => self.visit(binding),
        }
    }

    fn binding_stmt(&mut self, binding: &'m ast::Binding, in_body: bool) -> Result<(), TranslateError> {
        if let Some(ty) = &binding.ty {
            self.expr(ty, in_body)?;
        }
        if let Some(value) = &binding.value {
            self.expr(value, in_body)?;
        }
        Ok(())
    }

    fn expr(&mut self, e: &'m ast::Expr, in_body: bool) -> Result<(), TranslateError> {
        match &e.kind {
            ExprKind::Literal(_) | ExprKind::VarArg | ExprKind::Bad => Ok(()),
            ExprKind::Ident(ident) => self.see(ident, in_body),
            ExprKind::Func(func) => {
                for param in &func.params {
                    self.expr(&param.ty, in_body)?;
                }
                self.expr(&func.return_type, in_body)?;
                if let Some(body) = &func.body {
                    self.block(body, true)?;
                }
                Ok(())
            }
            ExprKind::Block(block) => self.block(block, in_body),
            ExprKind::Call { base, args } => {
                self.expr(base, in_body)?;
                for arg in args {
                    self.expr(arg, in_body)?;
                }
                Ok(())
            }
            ExprKind::Member { base, .. } => self.expr(base, in_body),
            ExprKind::Index { base, indices } => {
                self.expr(base, in_body)?;
                for index in indices {
                    self.expr(index, in_body)?;
                }
                Ok(())
            }
            ExprKind::Return { value } => match value {
                Some(value) => self.expr(value, in_body),
                None => Ok(()),
            },
            ExprKind::Struct { members } => {
                for member in members {
                    self.expr(&member.ty, in_body)?;
                }
                Ok(())
            }
            ExprKind::Trait(trait_expr) => {
                for supertrait in &trait_expr.supertraits {
                    self.expr(supertrait, in_body)?;
                }
                for member in &trait_expr.members {
                    self.binding_stmt(member, in_body)?;
                }
                Ok(())
            }
            ExprKind::Binary { left, right, .. } => {
                self.expr(left, in_body)?;
                self.expr(right, in_body)
            }
            ExprKind::Unary { base, .. } => self.expr(base, in_body),
            ExprKind::If { cond, block } => {
                self.expr(cond, in_body)?;
                self.block(block, in_body)
            }
            ExprKind::NamedArg { value, .. } => self.expr(value, in_body),
            ExprKind::Slice { base }
            | ExprKind::ManyPointer { base }
            | ExprKind::Existential { base } => self.expr(base, in_body),
        }
    }

    fn block(&mut self, block: &'m ast::Block, in_body: bool) -> Result<(), TranslateError> {
        for stmt in &block.stmts {
            match stmt {
                ast::Stmt::Expr(e) => self.expr(e, in_body)?,
                ast::Stmt::Decl(ast::Decl::Binding(binding)) => {
                    self.binding_stmt(binding, in_body)?
                }
                ast::Stmt::Decl(ast::Decl::Impl(_)) => {}
            }
        }
        Ok(())
    }
}
