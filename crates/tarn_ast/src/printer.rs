//! Canonical source printer.
//!
//! Prints an AST back to parsable source text. Parsing the printed form and
//! printing again is a fixpoint, which is what the parser round-trip tests
//! rely on.

use crate::{Binding, Block, Decl, Expr, ExprKind, Field, Module, Param, Stmt, TraitExpr};
use tarn_lexer::TokenKind;

/// Prints a module as source text.
pub fn print_module(module: &Module) -> String {
    let mut printer = Printer::new();
    for decl in &module.decls {
        printer.decl(decl);
    }
    printer.out
}

struct Printer {
    out: String,
    indent: usize,
}

impl Printer {
    fn new() -> Self {
        Self {
            out: String::new(),
            indent: 0,
        }
    }

    fn write(&mut self, s: &str) {
        self.out.push_str(s);
    }

    fn write_indent(&mut self) {
        for _ in 0..self.indent {
            self.out.push_str("    ");
        }
    }

    fn decl(&mut self, decl: &Decl) {
        match decl {
            Decl::Binding(b) => self.binding(b),
            Decl::Impl(i) => {
                self.write_indent();
                self.write("impl ");
                self.expr(&i.ty);
                self.write("(");
                self.comma_separated(&i.traits);
                self.write(") {\n");
                self.indent += 1;
                for def in &i.definitions {
                    self.binding(def);
                }
                self.indent -= 1;
                self.write_indent();
                self.write("}\n");
            }
        }
    }

    fn binding(&mut self, b: &Binding) {
        self.write_indent();
        if b.mode.export() {
            self.write("export ");
        }
        if b.mode.constant() {
            self.write("const ");
        }
        if b.token != TokenKind::Const {
            self.write(b.token.as_str());
            self.write(" ");
        }
        self.write(&b.name.name);

        match b.token {
            TokenKind::Func => {
                if let Some(Expr {
                    kind: ExprKind::Func(f),
                    ..
                }) = b.value.as_ref()
                {
                    self.write("(");
                    self.params(&f.params);
                    self.write(") ");
                    self.expr(&f.return_type);
                    match &f.body {
                        Some(body) => {
                            self.write(" ");
                            self.block(body);
                        }
                        None => self.write(";"),
                    }
                }
            }
            TokenKind::Struct => {
                if let Some(Expr {
                    kind: ExprKind::Struct { members },
                    ..
                }) = b.value.as_ref()
                {
                    self.write("(");
                    self.fields(members);
                    self.write(");");
                }
            }
            TokenKind::Trait => {
                if let Some(Expr {
                    kind: ExprKind::Trait(t),
                    ..
                }) = b.value.as_ref()
                {
                    self.trait_body(t);
                }
            }
            _ => {
                if let Some(ty) = &b.ty {
                    self.write(": ");
                    self.expr(ty);
                }
                if let Some(value) = &b.value {
                    self.write(" = ");
                    self.expr(value);
                }
                self.write(";");
            }
        }
        self.write("\n");
    }

    fn stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Decl(d) => self.decl(d),
            Stmt::Expr(e) => {
                self.write_indent();
                self.expr(e);
                // `if` statements carry no terminating semicolon.
                if !matches!(e.kind, ExprKind::If { .. }) {
                    self.write(";");
                }
                self.write("\n");
            }
        }
    }

    fn expr(&mut self, expr: &Expr) {
        match &expr.kind {
            ExprKind::Ident(ident) => self.write(&ident.name),
            ExprKind::Literal(lit) => self.write(&lit.value),
            ExprKind::Call { base, args } => {
                self.expr(base);
                self.write("(");
                self.comma_separated(args);
                self.write(")");
            }
            ExprKind::Member { base, member } => {
                self.expr(base);
                self.write(".");
                self.write(&member.name);
            }
            ExprKind::Index { base, indices } => {
                self.expr(base);
                self.write("[");
                self.comma_separated(indices);
                self.write("]");
            }
            ExprKind::Binary { op, left, right } => {
                self.expr(left);
                self.write(" ");
                self.write(op.as_str());
                self.write(" ");
                self.expr(right);
            }
            ExprKind::Unary { op, base } => {
                self.write(op.as_str());
                self.expr(base);
            }
            ExprKind::Return { value } => {
                self.write("return");
                if let Some(value) = value {
                    self.write(" ");
                    self.expr(value);
                }
            }
            ExprKind::Block(block) => self.block(block),
            ExprKind::Func(f) => {
                self.write("func(");
                self.params(&f.params);
                self.write(") ");
                self.expr(&f.return_type);
                if let Some(body) = &f.body {
                    self.write(" ");
                    self.block(body);
                }
            }
            ExprKind::If { cond, block } => {
                self.write("if ");
                self.expr(cond);
                self.write(" ");
                self.block(block);
            }
            ExprKind::Struct { members } => {
                self.write("struct(");
                self.fields(members);
                self.write(")");
            }
            ExprKind::Trait(t) => {
                self.write("trait");
                self.trait_body(t);
            }
            ExprKind::NamedArg { name, value } => {
                self.write(&name.name);
                self.write(": ");
                self.expr(value);
            }
            ExprKind::Slice { base } => {
                self.write("[]");
                self.expr(base);
            }
            ExprKind::ManyPointer { base } => {
                self.write("[*]");
                self.expr(base);
            }
            ExprKind::VarArg => self.write("..."),
            ExprKind::Existential { base } => {
                self.write("forSome ");
                self.expr(base);
            }
            ExprKind::Bad => {}
        }
    }

    fn block(&mut self, block: &Block) {
        self.write("{\n");
        self.indent += 1;
        for stmt in &block.stmts {
            self.stmt(stmt);
        }
        self.indent -= 1;
        self.write_indent();
        self.write("}");
    }

    fn trait_body(&mut self, t: &TraitExpr) {
        if !t.supertraits.is_empty() {
            self.write("(");
            self.comma_separated(&t.supertraits);
            self.write(")");
        }
        self.write(" {\n");
        self.indent += 1;
        for member in &t.members {
            self.binding(member);
        }
        self.indent -= 1;
        self.write_indent();
        self.write("}");
    }

    fn params(&mut self, params: &[Param]) {
        for (i, param) in params.iter().enumerate() {
            if i > 0 {
                self.write(", ");
            }
            match &param.name {
                Some(name) => {
                    self.write(&name.name);
                    self.write(": ");
                    self.expr(&param.ty);
                }
                None => self.expr(&param.ty),
            }
        }
    }

    fn fields(&mut self, fields: &[Field]) {
        for (i, field) in fields.iter().enumerate() {
            if i > 0 {
                self.write(", ");
            }
            self.write(&field.name.name);
            self.write(": ");
            self.expr(&field.ty);
        }
    }

    fn comma_separated(&mut self, exprs: &[Expr]) {
        for (i, expr) in exprs.iter().enumerate() {
            if i > 0 {
                self.write(", ");
            }
            self.expr(expr);
        }
    }
}
