//! The semantic checker.
//!
//! A single walk over the module that builds scopes, resolves names, checks
//! types, and folds compile-time values. Results land in an [`Info`] record
//! keyed by node id; errors are accumulated at binding granularity so one
//! bad declaration does not hide the rest of the module.

use crate::error::{ImportError, Importer, SemaError, SemaErrorKind};
use crate::scope::{universe, Module, Scope, Symbol};
use crate::types::{integer_type_from_name, NameAndType, Signature, StructType, TraitType, Type};
use crate::value::{unquote, BuiltinId, Value};
use num_bigint::BigInt;
use std::collections::HashMap;
use std::rc::Rc;
use tarn_ast::{self as ast, ExprKind, NodeId};
use tarn_lexer::{Span, TokenKind};

/// The type of an expression plus its compile-time value, when it has one.
#[derive(Clone, Debug)]
pub struct TypeAndValue {
    pub ty: Type,
    pub value: Option<Value>,
}

impl TypeAndValue {
    fn new(ty: Type, value: Option<Value>) -> Self {
        Self { ty, value }
    }
}

/// Side tables populated by the checker, keyed by AST node id.
#[derive(Default)]
pub struct Info {
    /// Type and value per expression.
    pub types: HashMap<NodeId, TypeAndValue>,
    /// Definition sites: binding and parameter name identifiers.
    pub defs: HashMap<NodeId, Symbol>,
    /// Use sites: resolved identifiers, including module members.
    pub uses: HashMap<NodeId, Symbol>,
    /// Scopes opened by functions, blocks, traits, and impls.
    pub scopes: HashMap<NodeId, Scope>,
}

/// Configuration for a checking run.
pub struct CheckConfig<'a> {
    pub importer: Option<&'a dyn Importer>,
    /// When false, function bodies are skipped and only interfaces are
    /// checked; importers use this for modules that only need a surface.
    pub check_func_bodies: bool,
}

impl Default for CheckConfig<'_> {
    fn default() -> Self {
        Self {
            importer: None,
            check_func_bodies: true,
        }
    }
}

/// Checks a parsed module, producing its interface and every semantic
/// error found.
pub fn check(
    module_ast: &ast::Module,
    cfg: CheckConfig<'_>,
    info: &mut Info,
) -> (Module, Vec<SemaError>) {
    let scope = Scope::new_module_scope(
        &universe(),
        Span::NONE,
        format!("module {:?}", module_ast.name),
    );
    let module = Module::new(&module_ast.name, scope.clone());

    let mut checker = Checker {
        cur: scope,
        info,
        importer: cfg.importer,
        check_func_bodies: cfg.check_func_bodies,
        return_type: None,
        result_location: None,
        errors: Vec::new(),
    };
    for decl in &module_ast.decls {
        checker.decl(decl);
    }
    (module, checker.errors)
}

struct Checker<'a> {
    cur: Scope,
    info: &'a mut Info,
    importer: Option<&'a dyn Importer>,
    check_func_bodies: bool,
    return_type: Option<Type>,
    /// The symbol currently being bound; `@extern` reads its declared type
    /// and stamps its link name.
    result_location: Option<Symbol>,
    errors: Vec<SemaError>,
}

impl Checker<'_> {
    fn decl(&mut self, decl: &ast::Decl) {
        match decl {
            ast::Decl::Binding(binding) => self.binding(binding),
            ast::Decl::Impl(impl_decl) => self.impl_decl(impl_decl),
        }
    }

    fn binding(&mut self, b: &ast::Binding) {
        let sym = Symbol::new(&b.name.name);
        self.info.defs.insert(b.name.id, sym.clone());

        // Function bindings go into scope up front so their bodies can
        // refer to themselves.
        if b.token == TokenKind::Func {
            self.insert(sym.clone(), b.name.span);
        }

        let prev = self.result_location.replace(sym.clone());
        let result = self.binding_value(b, &sym);
        self.result_location = prev;

        if b.token != TokenKind::Func {
            self.insert(sym, b.name.span);
        }
        if let Err(err) = result {
            self.errors.push(err);
        }
    }

    fn binding_value(&mut self, b: &ast::Binding, sym: &Symbol) -> Result<(), SemaError> {
        let mut declared = None;
        if let Some(ty_expr) = &b.ty {
            let ty = self.type_operand(ty_expr)?;
            sym.set_ty(ty.clone());
            declared = Some(ty);
        }

        if let Some(value_expr) = &b.value {
            let tv = self.expr(value_expr)?;
            match &declared {
                Some(want) => {
                    if !tv.ty.assignable_to(want) {
                        return Err(SemaError::new(
                            SemaErrorKind::TypeMismatch,
                            value_expr.span,
                            format!("{} is not assignable to {}", tv.ty, want),
                        ));
                    }
                }
                None => sym.set_ty(tv.ty.clone()),
            }
            if let Some(value) = tv.value {
                sym.set_value(value);
            }
        }
        Ok(())
    }

    fn insert(&mut self, sym: Symbol, span: Span) {
        if self.cur.insert(sym.clone()).is_some() {
            self.errors.push(SemaError::new(
                SemaErrorKind::Redeclaration,
                span,
                format!("{:?} is already declared in this scope", sym.name()),
            ));
        }
    }

    fn impl_decl(&mut self, decl: &ast::ImplDecl) {
        // The implemented type and its traits resolve in the enclosing
        // scope; only the definitions live in the impl scope.
        if let Err(err) = self.type_operand(&decl.ty) {
            self.errors.push(err);
        }
        for trait_expr in &decl.traits {
            match self.type_operand(trait_expr) {
                Ok(Type::Trait(_)) => {}
                Ok(other) => self.errors.push(SemaError::new(
                    SemaErrorKind::TypeMismatch,
                    trait_expr.span,
                    format!("expected a trait, found {other}"),
                )),
                Err(err) => self.errors.push(err),
            }
        }

        let scope = Scope::new(Some(&self.cur), decl.span, "impl");
        self.info.scopes.insert(decl.id, scope.clone());
        self.in_scope(scope, |c| {
            for def in &decl.definitions {
                c.binding(def);
            }
        });
    }

    fn stmt(&mut self, stmt: &ast::Stmt) -> Result<(), SemaError> {
        match stmt {
            ast::Stmt::Decl(decl) => {
                self.decl(decl);
                Ok(())
            }
            ast::Stmt::Expr(expr) => self.expr(expr).map(|_| ()),
        }
    }

    fn expr(&mut self, e: &ast::Expr) -> Result<TypeAndValue, SemaError> {
        let tv = self.expr_inner(e)?;
        self.info.types.insert(e.id, tv.clone());
        Ok(tv)
    }

    fn expr_inner(&mut self, e: &ast::Expr) -> Result<TypeAndValue, SemaError> {
        match &e.kind {
            ExprKind::Literal(lit) => self.literal(lit, e.span),
            ExprKind::Ident(ident) => self.ident(ident),
            ExprKind::Func(func) => self.func_expr(e.id, e.span, func),
            ExprKind::Call { base, args } => {
                let base_tv = self.expr(base)?;
                let mut arg_tvs = Vec::with_capacity(args.len());
                for arg in args {
                    arg_tvs.push((self.expr(arg)?, arg.span));
                }
                self.call(e.span, base_tv, arg_tvs)
            }
            ExprKind::Member { base, member } => {
                let base_tv = self.expr(base)?;
                self.member(&base_tv, member)
            }
            ExprKind::Binary { op, left, right } => {
                let left_tv = self.expr(left)?;
                let right_tv = self.expr(right)?;
                self.binary(*op, left_tv, right_tv, e.span, right.span)
            }
            ExprKind::Return { value } => {
                let Some(want) = self.return_type.clone() else {
                    return Err(SemaError::new(
                        SemaErrorKind::TypeMismatch,
                        e.span,
                        "return outside of a function body",
                    ));
                };
                let tv = match value {
                    Some(value) => Some(self.expr(value)?),
                    None => None,
                };
                let got = tv.as_ref().map(|t| t.ty.clone()).unwrap_or_else(Type::void);
                if !got.assignable_to(&want) {
                    return Err(SemaError::new(
                        SemaErrorKind::TypeMismatch,
                        value.as_ref().map(|v| v.span).unwrap_or(e.span),
                        format!("{got} is not assignable to return type {want}"),
                    ));
                }
                Ok(TypeAndValue::new(Type::void(), tv.and_then(|t| t.value)))
            }
            ExprKind::Struct { members } => {
                let mut fields = Vec::with_capacity(members.len());
                for member in members {
                    let ty = self.type_operand(&member.ty)?;
                    fields.push(NameAndType::new(&member.name.name, ty));
                }
                let ty = Type::Struct(StructType::new(fields));
                Ok(TypeAndValue::new(ty.clone(), Some(Value::Type(ty))))
            }
            ExprKind::Trait(trait_expr) => self.trait_expr(e.id, e.span, trait_expr),
            ExprKind::Slice { base } => {
                let element = self.type_operand(base)?;
                let ty = Type::Slice {
                    element: Box::new(element),
                };
                Ok(TypeAndValue::new(ty.clone(), Some(Value::Type(ty))))
            }
            ExprKind::ManyPointer { base } => {
                let element = self.type_operand(base)?;
                let ty = Type::Pointer {
                    element: Box::new(element),
                    many: true,
                };
                Ok(TypeAndValue::new(ty.clone(), Some(Value::Type(ty))))
            }
            ExprKind::Existential { base } => {
                let inner = self.type_operand(base)?;
                if !matches!(inner, Type::Trait(_)) {
                    return Err(SemaError::new(
                        SemaErrorKind::TypeMismatch,
                        base.span,
                        format!("forSome requires a trait, found {inner}"),
                    ));
                }
                let ty = Type::Existential {
                    trait_type: Box::new(inner),
                };
                Ok(TypeAndValue::new(ty.clone(), Some(Value::Type(ty))))
            }
            ExprKind::If { cond, block } => {
                let cond_tv = self.expr(cond)?;
                if !cond_tv.ty.is_integer() {
                    return Err(SemaError::new(
                        SemaErrorKind::TypeMismatch,
                        cond.span,
                        format!("if condition must be an integer, found {}", cond_tv.ty),
                    ));
                }
                self.check_block(block, "if")?;
                Ok(TypeAndValue::new(Type::void(), None))
            }
            ExprKind::Block(block) => {
                self.check_block(block, "block")?;
                Ok(TypeAndValue::new(Type::void(), None))
            }
            ExprKind::Index { base, indices } => {
                let base_tv = self.expr(base)?;
                let element = match &base_tv.ty {
                    Type::Slice { element } => element.as_ref().clone(),
                    Type::Pointer {
                        element,
                        many: true,
                    } => element.as_ref().clone(),
                    other => {
                        return Err(SemaError::new(
                            SemaErrorKind::TypeMismatch,
                            e.span,
                            format!("cannot index {other}"),
                        ))
                    }
                };
                for index in indices {
                    let index_tv = self.expr(index)?;
                    if !index_tv.ty.is_integer() {
                        return Err(SemaError::new(
                            SemaErrorKind::TypeMismatch,
                            index.span,
                            format!("index must be an integer, found {}", index_tv.ty),
                        ));
                    }
                }
                Ok(TypeAndValue::new(element, None))
            }
            ExprKind::NamedArg { value, .. } => self.expr(value),
            ExprKind::VarArg => Err(SemaError::new(
                SemaErrorKind::MalformedSyntax,
                e.span,
                "variadic placeholder outside a parameter list",
            )),
            ExprKind::Unary { op, .. } => Err(SemaError::new(
                SemaErrorKind::MalformedSyntax,
                e.span,
                format!("unsupported unary operator {op}"),
            )),
            ExprKind::Bad => Err(SemaError::new(
                SemaErrorKind::MalformedSyntax,
                e.span,
                "cannot check malformed expression",
            )),
        }
    }

    fn literal(&mut self, lit: &ast::Literal, span: Span) -> Result<TypeAndValue, SemaError> {
        match lit.tok {
            TokenKind::String => {
                let bytes = unquote(&lit.value);
                Ok(TypeAndValue::new(
                    Type::byte_slice(),
                    Some(Value::String(bytes)),
                ))
            }
            TokenKind::Integer => {
                let n: BigInt = lit.value.parse().map_err(|_| {
                    SemaError::new(
                        SemaErrorKind::MalformedSyntax,
                        span,
                        format!("invalid integer literal {:?}", lit.value),
                    )
                })?;
                Ok(TypeAndValue::new(
                    Type::untyped_integer(),
                    Some(Value::Integer(n)),
                ))
            }
            other => Err(SemaError::new(
                SemaErrorKind::MalformedSyntax,
                span,
                format!("unknown literal token {other}"),
            )),
        }
    }

    fn ident(&mut self, ident: &ast::Ident) -> Result<TypeAndValue, SemaError> {
        // Integer type names are synthesized, not looked up.
        if let Some(int) = integer_type_from_name(&ident.name) {
            let ty = Type::Integer(int);
            return Ok(TypeAndValue::new(ty.clone(), Some(Value::Type(ty))));
        }

        let Some(sym) = self.cur.lookup(&ident.name) else {
            return Err(SemaError::new(
                SemaErrorKind::UnresolvedName,
                ident.span,
                format!("unresolved name {:?}", ident.name),
            ));
        };
        self.info.uses.insert(ident.id, sym.clone());
        let Some(ty) = sym.ty() else {
            return Err(SemaError::new(
                SemaErrorKind::UnresolvedName,
                ident.span,
                format!("{:?} is used before its type is known", ident.name),
            ));
        };
        Ok(TypeAndValue::new(ty, sym.value()))
    }

    fn func_expr(
        &mut self,
        id: NodeId,
        span: Span,
        func: &ast::FuncExpr,
    ) -> Result<TypeAndValue, SemaError> {
        let comment = match &self.result_location {
            Some(sym) => format!("func {:?}", sym.name()),
            None => "func".to_string(),
        };
        let scope = Scope::new(Some(&self.cur), span, comment);
        self.info.scopes.insert(id, scope.clone());
        self.in_scope(scope, |c| c.func_expr_inner(func))
    }

    fn func_expr_inner(&mut self, func: &ast::FuncExpr) -> Result<TypeAndValue, SemaError> {
        let mut params = Vec::with_capacity(func.params.len());
        for param in &func.params {
            if matches!(param.ty.kind, ExprKind::VarArg) {
                return Err(SemaError::new(
                    SemaErrorKind::TypeMismatch,
                    param.span,
                    "variadic parameters are not supported in signatures",
                ));
            }
            let Some(name) = &param.name else {
                return Err(SemaError::new(
                    SemaErrorKind::MalformedSyntax,
                    param.span,
                    "parameter has no name",
                ));
            };
            let ty = self.type_operand(&param.ty)?;
            let sym = Symbol::new(&name.name);
            sym.set_ty(ty.clone());
            self.info.defs.insert(name.id, sym.clone());
            self.insert(sym, name.span);
            params.push(NameAndType::new(&name.name, ty));
        }

        let return_type = self.type_operand(&func.return_type)?;
        let sig = Type::Signature(Rc::new(Signature {
            params,
            return_type: return_type.clone(),
        }));

        // A bodyless function expression is a function type.
        let Some(body) = &func.body else {
            return Ok(TypeAndValue::new(sig.clone(), Some(Value::Type(sig))));
        };

        // Stamp the signature onto the symbol being bound before walking
        // the body, so recursive calls resolve.
        if let Some(sym) = &self.result_location {
            if sym.ty().is_none() {
                sym.set_ty(sig.clone());
            }
        }

        if self.check_func_bodies {
            let prev_return = self.return_type.replace(return_type);
            // Statements are not a binding context; `@extern` in a body
            // must not see the enclosing binding.
            let prev_location = self.result_location.take();
            let mut result = Ok(());
            for stmt in &body.stmts {
                result = self.stmt(stmt);
                if result.is_err() {
                    break;
                }
            }
            self.return_type = prev_return;
            self.result_location = prev_location;
            result?;
        }
        Ok(TypeAndValue::new(sig, None))
    }

    fn trait_expr(
        &mut self,
        id: NodeId,
        span: Span,
        trait_expr: &ast::TraitExpr,
    ) -> Result<TypeAndValue, SemaError> {
        for supertrait in &trait_expr.supertraits {
            let ty = self.type_operand(supertrait)?;
            if !matches!(ty, Type::Trait(_)) {
                return Err(SemaError::new(
                    SemaErrorKind::TypeMismatch,
                    supertrait.span,
                    format!("expected a trait, found {ty}"),
                ));
            }
        }

        let scope = Scope::new(Some(&self.cur), span, "trait");
        self.info.scopes.insert(id, scope.clone());
        self.in_scope(scope.clone(), |c| {
            for member in &trait_expr.members {
                c.binding(member);
            }
        });

        let requirements = scope
            .symbols()
            .iter()
            .filter_map(|sym| sym.ty().map(|ty| NameAndType::new(sym.name(), ty)))
            .collect();
        let ty = Type::Trait(Rc::new(TraitType {
            closed: false,
            requirements,
        }));
        Ok(TypeAndValue::new(ty.clone(), Some(Value::Type(ty))))
    }

    fn binary(
        &mut self,
        op: TokenKind,
        left: TypeAndValue,
        right: TypeAndValue,
        span: Span,
        right_span: Span,
    ) -> Result<TypeAndValue, SemaError> {
        match op {
            TokenKind::Plus | TokenKind::Minus => {
                if !left.ty.is_integer() || !right.ty.is_integer() || !left.ty.equal(&right.ty) {
                    return Err(SemaError::new(
                        SemaErrorKind::TypeMismatch,
                        span,
                        format!("cannot apply {op} to {} and {}", left.ty, right.ty),
                    ));
                }
                if let (Some(Value::Integer(l)), Some(Value::Integer(r))) =
                    (&left.value, &right.value)
                {
                    let folded = if op == TokenKind::Plus { l + r } else { l - r };
                    return Ok(TypeAndValue::new(
                        left.ty.clone(),
                        Some(Value::Integer(folded)),
                    ));
                }
                Ok(TypeAndValue::new(left.ty, None))
            }
            TokenKind::Less => {
                if !left.ty.is_integer() || !right.ty.is_integer() || !left.ty.equal(&right.ty) {
                    return Err(SemaError::new(
                        SemaErrorKind::TypeMismatch,
                        span,
                        format!("cannot compare {} and {}", left.ty, right.ty),
                    ));
                }
                let bool_ty = Type::Integer(crate::types::IntegerType {
                    signed: false,
                    bits: 1,
                });
                Ok(TypeAndValue::new(bool_ty, None))
            }
            TokenKind::Assign => {
                if !right.ty.assignable_to(&left.ty) {
                    return Err(SemaError::new(
                        SemaErrorKind::TypeMismatch,
                        right_span,
                        format!("{} is not assignable to {}", right.ty, left.ty),
                    ));
                }
                Ok(TypeAndValue::new(Type::void(), None))
            }
            other => Err(SemaError::new(
                SemaErrorKind::MalformedSyntax,
                span,
                format!("unsupported binary operator {other}"),
            )),
        }
    }

    fn call(
        &mut self,
        span: Span,
        base: TypeAndValue,
        args: Vec<(TypeAndValue, Span)>,
    ) -> Result<TypeAndValue, SemaError> {
        if let Some(Value::Builtin(id)) = &base.value {
            return self.builtin(*id, span, args);
        }

        if let Type::Signature(sig) = &base.ty {
            return Ok(TypeAndValue::new(sig.return_type.clone(), None));
        }

        if let Some(Value::Type(Type::Struct(st))) = &base.value {
            if args.len() != st.members().len() {
                return Err(SemaError::new(
                    SemaErrorKind::ArityMismatch,
                    span,
                    format!(
                        "constructor for {} takes {} arguments, found {}",
                        base.ty,
                        st.members().len(),
                        args.len()
                    ),
                ));
            }
            for ((arg, arg_span), member) in args.iter().zip(st.members()) {
                if !arg.ty.assignable_to(&member.ty) {
                    return Err(SemaError::new(
                        SemaErrorKind::TypeMismatch,
                        *arg_span,
                        format!("{} is not assignable to {}", arg.ty, member.ty),
                    ));
                }
            }
            return Ok(TypeAndValue::new(Type::Struct(st.clone()), None));
        }

        Err(SemaError::new(
            SemaErrorKind::NotCallable,
            span,
            format!("{} is not callable", base.ty),
        ))
    }

    fn builtin(
        &mut self,
        id: BuiltinId,
        span: Span,
        args: Vec<(TypeAndValue, Span)>,
    ) -> Result<TypeAndValue, SemaError> {
        let arg = match args.as_slice() {
            [(tv, _)] => match &tv.value {
                Some(Value::String(bytes)) => Some(bytes.clone()),
                _ => None,
            },
            _ => None,
        };
        let Some(bytes) = arg else {
            return Err(SemaError::new(
                SemaErrorKind::BadBuiltinArgs,
                span,
                format!("{id} takes exactly one string literal argument"),
            ));
        };
        let name = String::from_utf8_lossy(&bytes).into_owned();

        match id {
            BuiltinId::Import => {
                let Some(importer) = self.importer else {
                    return Err(SemaError::new(
                        SemaErrorKind::BadBuiltinArgs,
                        span,
                        "@import used without an importer",
                    ));
                };
                let module = importer.import(&name).map_err(|err| {
                    let kind = match err {
                        ImportError::Cycle(_) => SemaErrorKind::CyclicImport,
                        ImportError::Failed(_) => SemaErrorKind::Import,
                    };
                    SemaError::new(kind, span, err.to_string())
                })?;
                let value = Value::Module(module);
                Ok(TypeAndValue::new(value.ty(), Some(value)))
            }
            BuiltinId::Extern => {
                let Some(sym) = self.result_location.clone() else {
                    return Err(SemaError::new(
                        SemaErrorKind::BadBuiltinArgs,
                        span,
                        "@extern is only valid as a binding's value",
                    ));
                };
                let Some(ty) = sym.ty() else {
                    return Err(SemaError::new(
                        SemaErrorKind::BadBuiltinArgs,
                        span,
                        "@extern requires the binding to declare a type",
                    ));
                };
                sym.set_link_name(&name);
                Ok(TypeAndValue::new(
                    ty.clone(),
                    Some(Value::Extern {
                        link_name: name,
                        ty,
                    }),
                ))
            }
        }
    }

    fn member(
        &mut self,
        base: &TypeAndValue,
        member: &ast::Ident,
    ) -> Result<TypeAndValue, SemaError> {
        if let Some(Value::Module(module)) = &base.value {
            let Some(sym) = module.scope().lookup(&member.name) else {
                return Err(SemaError::new(
                    SemaErrorKind::NoSuchMember,
                    member.span,
                    format!(
                        "module {:?} has no member {:?}",
                        module.name(),
                        member.name
                    ),
                ));
            };
            self.info.uses.insert(member.id, sym.clone());
            let Some(ty) = sym.ty() else {
                return Err(SemaError::new(
                    SemaErrorKind::UnresolvedName,
                    member.span,
                    format!("{:?} is used before its type is known", member.name),
                ));
            };
            return Ok(TypeAndValue::new(ty, sym.value()));
        }

        if let Type::Struct(st) = &base.ty {
            if let Some(field) = st.members().iter().find(|m| m.name == member.name) {
                return Ok(TypeAndValue::new(field.ty.clone(), None));
            }
            return Err(SemaError::new(
                SemaErrorKind::NoSuchMember,
                member.span,
                format!("no field {:?} on {}", member.name, base.ty),
            ));
        }

        Err(SemaError::new(
            SemaErrorKind::NoSuchMember,
            member.span,
            format!("cannot access member {:?} of {}", member.name, base.ty),
        ))
    }

    fn check_block(&mut self, block: &ast::Block, comment: &str) -> Result<(), SemaError> {
        let scope = Scope::new(Some(&self.cur), block.span, comment);
        self.info.scopes.insert(block.id, scope.clone());
        self.in_scope(scope, |c| {
            for stmt in &block.stmts {
                c.stmt(stmt)?;
            }
            Ok(())
        })
    }

    /// Evaluates an expression that must denote a type.
    fn type_operand(&mut self, e: &ast::Expr) -> Result<Type, SemaError> {
        let tv = self.expr(e)?;
        match tv.value {
            Some(Value::Type(ty)) => Ok(ty),
            _ => Err(SemaError::new(
                SemaErrorKind::TypeMismatch,
                e.span,
                format!("expected a type, found {}", tv.ty),
            )),
        }
    }

    fn in_scope<T>(&mut self, scope: Scope, f: impl FnOnce(&mut Self) -> T) -> T {
        let prev = std::mem::replace(&mut self.cur, scope);
        let result = f(self);
        self.cur = prev;
        result
    }
}
