//! The parser core: token cursor, error accumulation, and recovery.

use crate::error::ParseError;
use tarn_ast::{Decl, Expr, ExprKind, Module, NodeId};
use tarn_lexer::{Pos, Scanner, Span, Token, TokenKind};

/// The Tarn parser.
///
/// Wraps a scanner with a one-token lookahead. Comment tokens are skipped
/// and scanner errors are folded into the parse error list so a lexically
/// broken file still produces a partial module.
pub struct Parser<'a> {
    scanner: Scanner<'a>,
    tok: Option<Token>,
    /// End of the most recently consumed token; closes node spans.
    prev_end: Pos,
    errors: Vec<ParseError>,
    next_node_id: u32,
}

/// Parses a module from source text. Returns the (possibly partial) module
/// together with every error encountered.
pub fn parse(name: &str, source: &str) -> (Module, Vec<ParseError>) {
    Parser::new(source).parse(name)
}

impl<'a> Parser<'a> {
    pub fn new(source: &'a str) -> Self {
        let mut parser = Self {
            scanner: Scanner::new(source),
            tok: None,
            prev_end: Pos::NONE,
            errors: Vec::new(),
            next_node_id: 0,
        };
        parser.advance_token();
        parser
    }

    /// Parses declarations until the stream is exhausted.
    pub fn parse(mut self, name: &str) -> (Module, Vec<ParseError>) {
        let mut decls = Vec::new();
        while self.tok.is_some() {
            if let Some(decl) = self.decl() {
                decls.push(decl);
            }
        }
        (
            Module {
                name: name.to_string(),
                decls,
            },
            self.errors,
        )
    }

    pub(crate) fn decl(&mut self) -> Option<Decl> {
        match self.peek_kind() {
            Some(
                TokenKind::Export
                | TokenKind::Const
                | TokenKind::Let
                | TokenKind::Func
                | TokenKind::Struct
                | TokenKind::Trait,
            ) => self.binding().map(Decl::Binding),
            Some(TokenKind::Impl) => self.impl_decl().map(Decl::Impl),
            _ => {
                self.unexpected("declaration");
                None
            }
        }
    }

    // ========== Cursor helpers ==========

    pub(crate) fn next_id(&mut self) -> NodeId {
        let id = self.next_node_id;
        self.next_node_id += 1;
        NodeId(id)
    }

    pub(crate) fn peek_kind(&self) -> Option<TokenKind> {
        self.tok.as_ref().map(|t| t.kind)
    }

    pub(crate) fn at(&self, kind: TokenKind) -> bool {
        self.peek_kind() == Some(kind)
    }

    /// Start position of the current token, for opening node spans.
    pub(crate) fn cur_start(&self) -> Pos {
        match &self.tok {
            Some(t) => t.span.start,
            None => self.prev_end,
        }
    }

    /// Span from `start` to the end of the last consumed token.
    pub(crate) fn span_from(&self, start: Pos) -> Span {
        Span::new(start, self.prev_end.max(start))
    }

    fn advance_token(&mut self) {
        if let Some(t) = &self.tok {
            self.prev_end = t.span.end;
        }
        loop {
            match self.scanner.scan() {
                Ok(Some(t)) if t.kind == TokenKind::Comment => continue,
                Ok(t) => {
                    self.tok = t;
                    return;
                }
                Err(err) => self.errors.push(ParseError::Lex(err)),
            }
        }
    }

    /// Consumes and returns the current token if it has the given kind.
    pub(crate) fn accept(&mut self, kind: TokenKind) -> Option<Token> {
        if self.at(kind) {
            let t = self.tok.take();
            if let Some(t) = &t {
                self.prev_end = t.span.end;
            }
            self.advance_token();
            t
        } else {
            None
        }
    }

    /// Like `accept`, but records an error and recovers on mismatch.
    pub(crate) fn expect(&mut self, kind: TokenKind) -> Option<Token> {
        if let Some(t) = self.accept(kind) {
            return Some(t);
        }
        match &self.tok {
            Some(t) => {
                self.errors.push(ParseError::Unexpected {
                    expected: format!("{:?}", kind.as_str()),
                    found: t.text.clone(),
                    span: t.span,
                });
            }
            None => self.error_eof(kind.as_str()),
        }
        self.recover();
        None
    }

    pub(crate) fn error_eof(&mut self, expected: &str) {
        self.errors.push(ParseError::UnexpectedEof {
            expected: expected.to_string(),
            span: Span::new(self.prev_end, self.prev_end),
        });
    }

    /// Records an error at the current token, skips it, and recovers.
    pub(crate) fn unexpected(&mut self, expected: &str) {
        match &self.tok {
            Some(t) => {
                self.errors.push(ParseError::Unexpected {
                    expected: expected.to_string(),
                    found: t.text.clone(),
                    span: t.span,
                });
                self.advance_token();
            }
            None => self.error_eof(expected),
        }
        self.recover();
    }

    /// Skips ahead to the next statement or declaration boundary: consumes
    /// through a `;`, stops in front of a `}` so the enclosing block sees
    /// its closer.
    pub(crate) fn recover(&mut self) {
        while let Some(t) = &self.tok {
            match t.kind {
                TokenKind::Semicolon => {
                    self.advance_token();
                    return;
                }
                TokenKind::CloseBrace => return,
                _ => self.advance_token(),
            }
        }
    }

    pub(crate) fn tok_clone(&self) -> Option<Token> {
        self.tok.clone()
    }

    /// Records an "expected expression" error without consuming the token;
    /// the enclosing statement or declaration recovery makes progress.
    pub(crate) fn record_unexpected_operand(&mut self, tok: &Token) {
        self.errors.push(ParseError::Unexpected {
            expected: "expression".to_string(),
            found: tok.text.clone(),
            span: tok.span,
        });
    }

    pub(crate) fn expr_node(&mut self, kind: ExprKind, span: Span) -> Expr {
        let id = self.next_id();
        Expr::new(kind, span, id)
    }

    /// A placeholder expression anchored at the current token.
    pub(crate) fn bad_expr(&mut self) -> Expr {
        let span = match &self.tok {
            Some(t) => t.span,
            None => Span::new(self.prev_end, self.prev_end),
        };
        self.expr_node(ExprKind::Bad, span)
    }
}

#[cfg(test)]
mod tests {
    use super::parse;
    use tarn_ast::{print_module, Decl, ExprKind};
    use tarn_lexer::TokenKind;

    const SRC: &str = r#"
const std = @import("std");

struct TwoInts(a: i32, b: i32);

trait Drop {
    func drop(self: TwoInts) void;
}

impl TwoInts(Drop) {
    func drop(self: TwoInts) void {
    }
}

const add: func(arg: TwoInts) i32 = func(arg: TwoInts) i32 {
    return arg.a + arg.b;
};

func main() void {
    std.print(add(TwoInts(a: 1, b: 2)));
}
"#;

    #[test]
    fn parses_the_kitchen_sink_module() {
        let (module, errors) = parse("main", SRC);
        assert!(errors.is_empty(), "unexpected errors: {errors:?}");
        assert_eq!(module.decls.len(), 6);

        let Decl::Binding(std_binding) = &module.decls[0] else {
            panic!("expected a binding");
        };
        assert_eq!(std_binding.name.name, "std");
        assert_eq!(std_binding.token, TokenKind::Const);
        assert!(std_binding.mode.constant());

        let Decl::Impl(impl_decl) = &module.decls[3] else {
            panic!("expected an impl");
        };
        assert_eq!(impl_decl.traits.len(), 1);
        assert_eq!(impl_decl.definitions.len(), 1);
    }

    #[test]
    fn print_parse_print_is_a_fixpoint() {
        let (module, errors) = parse("main", SRC);
        assert!(errors.is_empty());
        let first = print_module(&module);
        let (reparsed, errors) = parse("main", &first);
        assert!(errors.is_empty(), "printed source failed to parse: {errors:?}\n{first}");
        assert_eq!(print_module(&reparsed), first);
    }

    #[test]
    fn recovers_at_semicolons() {
        let (module, errors) = parse("main", "const = 5;\nconst y = 2;");
        assert!(!errors.is_empty());
        assert_eq!(module.decls.len(), 1);
        let Decl::Binding(b) = &module.decls[0] else {
            panic!()
        };
        assert_eq!(b.name.name, "y");
    }

    #[test]
    fn recovers_inside_blocks() {
        let src = "func f() void {\n    oops oops;\n    x;\n}\nconst y = 1;";
        let (module, errors) = parse("main", src);
        assert!(!errors.is_empty());
        assert_eq!(module.decls.len(), 2);
    }

    #[test]
    fn declaration_only_function_requires_semicolon() {
        let (_, errors) = parse("main", "func f() i32");
        assert!(!errors.is_empty());
        let (_, errors) = parse("main", "func f() i32;");
        assert!(errors.is_empty(), "{errors:?}");
    }

    #[test]
    fn every_node_span_is_inside_the_source() {
        let (module, errors) = parse("main", SRC);
        assert!(errors.is_empty());
        for decl in &module.decls {
            let span = decl.span();
            assert!(span.start <= span.end);
            assert!((span.end.0 as usize) <= SRC.len() + 1);
        }
    }

    #[test]
    fn assignment_binds_loosest() {
        let (module, errors) = parse("main", "func f() void {\n    x = 1 + 2;\n}");
        assert!(errors.is_empty(), "{errors:?}");
        let Decl::Binding(b) = &module.decls[0] else {
            panic!()
        };
        let Some(value) = &b.value else { panic!() };
        let ExprKind::Func(f) = &value.kind else {
            panic!()
        };
        let body = f.body.as_ref().unwrap();
        let tarn_ast::Stmt::Expr(e) = &body.stmts[0] else {
            panic!()
        };
        let ExprKind::Binary { op, right, .. } = &e.kind else {
            panic!("expected an assignment, got {e:?}")
        };
        assert_eq!(*op, TokenKind::Assign);
        assert!(matches!(right.kind, ExprKind::Binary { op: TokenKind::Plus, .. }));
    }

    #[test]
    fn type_annotations_stop_before_the_initializer() {
        let (module, errors) = parse("main", "const x: i32 = 1;");
        assert!(errors.is_empty(), "{errors:?}");
        let Decl::Binding(b) = &module.decls[0] else {
            panic!()
        };
        let ty = b.ty.as_ref().unwrap();
        assert!(matches!(&ty.kind, ExprKind::Ident(i) if i.name == "i32"));
        assert!(b.value.is_some());
    }

    #[test]
    fn slice_and_many_pointer_types() {
        let (module, errors) = parse("main", "const a: []u8 = \"hi\";\nconst p: [*]u8 = q;");
        assert!(errors.is_empty(), "{errors:?}");
        let Decl::Binding(a) = &module.decls[0] else {
            panic!()
        };
        assert!(matches!(a.ty.as_ref().unwrap().kind, ExprKind::Slice { .. }));
        let Decl::Binding(p) = &module.decls[1] else {
            panic!()
        };
        assert!(matches!(
            p.ty.as_ref().unwrap().kind,
            ExprKind::ManyPointer { .. }
        ));
    }

    #[test]
    fn named_and_positional_arguments() {
        let (module, errors) = parse("main", "const p = Pair(a: 1, 2);");
        assert!(errors.is_empty(), "{errors:?}");
        let Decl::Binding(b) = &module.decls[0] else {
            panic!()
        };
        let ExprKind::Call { args, .. } = &b.value.as_ref().unwrap().kind else {
            panic!()
        };
        assert_eq!(args.len(), 2);
        assert!(matches!(args[0].kind, ExprKind::NamedArg { .. }));
        assert!(matches!(args[1].kind, ExprKind::Literal(_)));
    }

    #[test]
    fn existential_parameter_types() {
        let (module, errors) = parse("main", "func id(x: forSome Ord) i32;");
        assert!(errors.is_empty(), "{errors:?}");
        let Decl::Binding(b) = &module.decls[0] else {
            panic!()
        };
        let ExprKind::Func(f) = &b.value.as_ref().unwrap().kind else {
            panic!()
        };
        assert!(matches!(
            f.params[0].ty.kind,
            ExprKind::Existential { .. }
        ));
    }
}
