//! Lowering from the typed AST to IL.

use crate::error::TranslateError;
use crate::il::{
    BinOp, BlockBuilder, Def, FunctionBuilder, Function, IlModule, IlType, IlValue, Inst, Linkage,
    ModuleBuilder, Temp,
};
use crate::order::declaration_order;
use std::collections::HashMap;
use tarn_ast::{self as ast, ExprKind};
use tarn_lexer::{Span, TokenKind};
use tarn_sema::{Info, Symbol, Type, Value};

/// Lowers a checked module to IL, in declaration order.
///
/// The module must have checked without errors; bindings whose value is a
/// compile-time constant or a type produce no definition (they fold into
/// their use sites).
pub fn translate(module: &ast::Module, info: &Info) -> Result<IlModule, TranslateError> {
    let lowerer = Lowerer {
        info,
        module: ModuleBuilder::default(),
    };
    lowerer.run(module)
}

struct Lowerer<'a> {
    info: &'a Info,
    module: ModuleBuilder,
}

/// Per-function lowering state: the builder, the block being filled, and
/// the parameter environment.
struct FuncState {
    fb: FunctionBuilder,
    cur: BlockBuilder,
    env: HashMap<Symbol, Temp>,
}

impl FuncState {
    /// Ends the current block and starts a new one under `label`.
    fn seal_and_start(&mut self, label: String) {
        let finished = std::mem::replace(&mut self.cur, BlockBuilder::new(label));
        self.fb.add_block(finished.finish());
    }
}

impl Lowerer<'_> {
    fn run(mut self, module: &ast::Module) -> Result<IlModule, TranslateError> {
        let order = declaration_order(module, self.info)?;
        for binding in order {
            self.binding(binding)?;
        }
        Ok(self.module.finish())
    }

    fn binding(&mut self, b: &ast::Binding) -> Result<(), TranslateError> {
        let Some(sym) = self.info.defs.get(&b.name.id).cloned() else {
            return Ok(());
        };
        match sym.value() {
            // Compile-time entities fold into their use sites.
            Some(
                Value::Type(_)
                | Value::Integer(_)
                | Value::String(_)
                | Value::Builtin(_)
                | Value::Module(_)
                | Value::Extern { .. },
            ) => Ok(()),
            None => match &b.value {
                Some(expr) => {
                    if let ExprKind::Func(func) = &expr.kind {
                        if func.body.is_some() {
                            let function = self.function(&sym, b, func)?;
                            self.module.add(Def::Function(function));
                            return Ok(());
                        }
                    }
                    Err(TranslateError::unsupported(
                        b.span,
                        format!("{:?} has no compile-time value and is not a function", b.name.name),
                    ))
                }
                None => Ok(()),
            },
        }
    }

    fn function(
        &mut self,
        sym: &Symbol,
        b: &ast::Binding,
        func: &ast::FuncExpr,
    ) -> Result<Function, TranslateError> {
        let Some(Type::Signature(sig)) = sym.ty() else {
            return Err(TranslateError::unsupported(
                b.span,
                format!("{:?} is not typed as a function", b.name.name),
            ));
        };

        let linkage = Linkage {
            export: b.mode.export(),
            thread: false,
        };
        let mut fb = FunctionBuilder::new(sym.link_name(), linkage);
        fb.returns(self.as_type(&sig.return_type, b.span)?);

        let mut env = HashMap::new();
        for (param, nt) in func.params.iter().zip(&sig.params) {
            let Some(name) = &param.name else {
                return Err(TranslateError::unsupported(param.span, "unnamed parameter"));
            };
            let ty = self.as_type(&nt.ty, param.span)?;
            let temp = fb.param(&name.name, ty);
            if let Some(param_sym) = self.info.defs.get(&name.id) {
                env.insert(param_sym.clone(), temp);
            }
        }

        let mut state = FuncState {
            fb,
            cur: BlockBuilder::new("start"),
            env,
        };
        let body = func.body.as_ref().expect("function lowering requires a body");
        for stmt in &body.stmts {
            self.stmt(&mut state, stmt)?;
        }
        if !state.cur.is_terminated() {
            state.cur.push(Inst::Ret(None));
        }

        let FuncState { mut fb, cur, .. } = state;
        fb.add_block(cur.finish());
        Ok(fb.finish())
    }

    fn stmt(&mut self, state: &mut FuncState, stmt: &ast::Stmt) -> Result<(), TranslateError> {
        match stmt {
            ast::Stmt::Expr(e) => {
                self.expr(state, e)?;
                Ok(())
            }
            ast::Stmt::Decl(ast::Decl::Binding(binding)) => {
                // Local constants fold at their use sites; anything that
                // would need a stack slot is outside the covered subset.
                let has_value = self
                    .info
                    .defs
                    .get(&binding.name.id)
                    .and_then(|sym| sym.value())
                    .is_some();
                if has_value {
                    Ok(())
                } else {
                    Err(TranslateError::unsupported(
                        binding.span,
                        "local bindings without compile-time values",
                    ))
                }
            }
            ast::Stmt::Decl(ast::Decl::Impl(decl)) => Err(TranslateError::unsupported(
                decl.span,
                "impl declarations inside function bodies",
            )),
        }
    }

    fn expr(&mut self, state: &mut FuncState, e: &ast::Expr) -> Result<Option<IlValue>, TranslateError> {
        // Folded compile-time results take priority over lowering the
        // operands.
        if !matches!(e.kind, ExprKind::Func(_)) {
            let folded = self.info.types.get(&e.id).and_then(|tv| tv.value.clone());
            if let Some(value) = folded {
                return self.as_value(&value, e.span).map(Some);
            }
        }

        match &e.kind {
            ExprKind::Ident(ident) => self.ident(state, ident).map(Some),
            ExprKind::Call { base, args } => {
                let return_ty = self.expr_type(e)?;
                let base_value = self.expr_value(state, base)?;
                let mut arg_values = Vec::with_capacity(args.len());
                for arg in args {
                    arg_values.push(self.expr_value(state, arg)?);
                }
                let (out, ty) = match self.as_type(&return_ty, e.span)? {
                    IlType::Void => (None, IlType::Void),
                    ty => (Some(state.fb.temporary(ty)), ty),
                };
                state.cur.push(Inst::Call {
                    out: out.clone(),
                    ty,
                    base: base_value,
                    args: arg_values,
                });
                Ok(out.map(IlValue::Temp))
            }
            ExprKind::Return { value } => {
                let lowered = match value {
                    Some(value) => Some(self.expr_value(state, value)?),
                    None => None,
                };
                state.cur.push(Inst::Ret(lowered));
                Ok(None)
            }
            ExprKind::Binary { op, left, right } => {
                self.binary(state, e, *op, left, right).map(Some)
            }
            ExprKind::If { cond, block } => {
                let cond_value = self.expr_value(state, cond)?;
                let then_label = state.fb.fresh_label("then");
                let end_label = state.fb.fresh_label("end");
                state.cur.push(Inst::Jnz {
                    cond: cond_value,
                    then_block: then_label.clone(),
                    else_block: end_label.clone(),
                });
                state.seal_and_start(then_label);
                for stmt in &block.stmts {
                    self.stmt(state, stmt)?;
                }
                if !state.cur.is_terminated() {
                    state.cur.push(Inst::Jmp {
                        target: end_label.clone(),
                    });
                }
                state.seal_and_start(end_label);
                Ok(None)
            }
            ExprKind::NamedArg { value, .. } => self.expr(state, value),
            ExprKind::Member { .. } => Err(TranslateError::unsupported(
                e.span,
                "run-time member access",
            )),
            other => Err(TranslateError::unsupported(
                e.span,
                format!("expression has no lowering: {other:?}"),
            )),
        }
    }

    fn expr_value(&mut self, state: &mut FuncState, e: &ast::Expr) -> Result<IlValue, TranslateError> {
        self.expr(state, e)?.ok_or_else(|| {
            TranslateError::unsupported(e.span, "expression produces no value")
        })
    }

    fn ident(&mut self, state: &mut FuncState, ident: &ast::Ident) -> Result<IlValue, TranslateError> {
        let Some(sym) = self.info.uses.get(&ident.id).cloned() else {
            return Err(TranslateError::unsupported(
                ident.span,
                format!("{:?} has no resolution", ident.name),
            ));
        };
        if let Some(value) = sym.value() {
            return self.as_value(&value, ident.span);
        }
        if let Some(temp) = state.env.get(&sym) {
            return Ok(IlValue::Temp(temp.clone()));
        }
        if matches!(sym.ty(), Some(Type::Signature(_))) {
            return Ok(IlValue::Global {
                name: sym.link_name(),
                ty: IlType::Long,
            });
        }
        Err(TranslateError::unsupported(
            ident.span,
            format!("{:?} has no run-time location", ident.name),
        ))
    }

    fn binary(
        &mut self,
        state: &mut FuncState,
        e: &ast::Expr,
        op: TokenKind,
        left: &ast::Expr,
        right: &ast::Expr,
    ) -> Result<IlValue, TranslateError> {
        let a = self.expr_value(state, left)?;
        let b = self.expr_value(state, right)?;
        let bin_op = match op {
            TokenKind::Plus => BinOp::Add,
            TokenKind::Minus => BinOp::Sub,
            TokenKind::Less => {
                let signed = match self.expr_type(left)? {
                    Type::Integer(int) => int.signed,
                    _ => false,
                };
                if signed {
                    BinOp::Slt
                } else {
                    BinOp::Ult
                }
            }
            other => {
                return Err(TranslateError::unsupported(
                    e.span,
                    format!("binary operator {other} has no lowering"),
                ))
            }
        };
        let ty = self.as_type(&self.expr_type(e)?, e.span)?;
        let out = state.fb.temporary(ty);
        state.cur.push(Inst::Bin {
            op: bin_op,
            out: out.clone(),
            ty,
            a,
            b,
        });
        Ok(IlValue::Temp(out))
    }

    fn expr_type(&self, e: &ast::Expr) -> Result<Type, TranslateError> {
        self.info
            .types
            .get(&e.id)
            .map(|tv| tv.ty.clone())
            .ok_or_else(|| TranslateError::unsupported(e.span, "expression was not checked"))
    }

    /// Maps a semantic type onto an IL type.
    fn as_type(&self, ty: &Type, span: Span) -> Result<IlType, TranslateError> {
        match ty {
            Type::Integer(int) => match int.bits {
                0 => Ok(IlType::Void),
                1..=32 => Ok(IlType::Word),
                33..=64 => Ok(IlType::Long),
                bits => Err(TranslateError::unsupported(
                    span,
                    format!("{bits}-bit integers are not representable"),
                )),
            },
            Type::Signature(_) | Type::Slice { .. } | Type::Pointer { .. } => Ok(IlType::Long),
            other => Err(TranslateError::unsupported(
                span,
                format!("{other} has no IL representation"),
            )),
        }
    }

    /// Maps a compile-time value onto an IL operand.
    fn as_value(&mut self, value: &Value, span: Span) -> Result<IlValue, TranslateError> {
        match value {
            Value::String(bytes) => Ok(self.module.string_literal(bytes)),
            Value::Integer(n) => i64::try_from(n.clone()).map(IlValue::Const).map_err(|_| {
                TranslateError::unsupported(span, format!("integer {n} does not fit in 64 bits"))
            }),
            Value::Extern { link_name, ty } => Ok(IlValue::Global {
                name: link_name.clone(),
                ty: self.as_type(ty, span)?,
            }),
            other => Err(TranslateError::unsupported(
                span,
                format!("{other} has no run-time representation"),
            )),
        }
    }
}
