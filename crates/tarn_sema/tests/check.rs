//! Checker behavior over parsed modules.

use std::cell::RefCell;
use std::collections::HashMap;
use tarn_ast::{Decl, ExprKind};
use tarn_sema::{
    check, CheckConfig, ImportError, Importer, Info, Module, SemaError, SemaErrorKind, Type, Value,
};

const STD: &str = r#"
const printf: func(fmt: [*]u8) i32 = @extern("printf");
"#;

#[derive(Default)]
struct TestImporter {
    modules: RefCell<HashMap<String, Module>>,
}

impl TestImporter {
    fn add(&self, name: &str, module: Module) {
        self.modules.borrow_mut().insert(name.to_string(), module);
    }
}

impl Importer for TestImporter {
    fn import(&self, name: &str) -> Result<Module, ImportError> {
        self.modules
            .borrow()
            .get(name)
            .cloned()
            .ok_or_else(|| ImportError::Failed(format!("module {name:?} not found")))
    }
}

fn load(
    name: &str,
    source: &str,
    importer: Option<&dyn Importer>,
) -> (tarn_ast::Module, Module, Info, Vec<SemaError>) {
    let (ast, parse_errors) = tarn_parser::parse(name, source);
    assert!(parse_errors.is_empty(), "parse errors: {parse_errors:?}");
    let mut info = Info::default();
    let (module, errors) = check(
        &ast,
        CheckConfig {
            importer,
            check_func_bodies: true,
        },
        &mut info,
    );
    (ast, module, info, errors)
}

fn load_ok(name: &str, source: &str, importer: Option<&dyn Importer>) -> (tarn_ast::Module, Module, Info) {
    let (ast, module, info, errors) = load(name, source, importer);
    assert!(errors.is_empty(), "unexpected errors: {errors:?}");
    (ast, module, info)
}

#[test]
fn const_binding_folds_its_value() {
    let (_, module, _) = load_ok("main", "const x: i32 = 1 + 2;", None);
    let x = module.scope().lookup("x").expect("x");
    let ty = x.ty().expect("type");
    assert_eq!(ty.to_string(), "i32");
    let Some(Value::Integer(n)) = x.value() else {
        panic!("expected a folded integer, got {:?}", x.value().map(|v| v.to_string()));
    };
    assert_eq!(n, 3.into());
}

#[test]
fn extern_binding_takes_the_declared_signature() {
    let (_, module, _) = load_ok("std", STD, None);
    let printf = module.scope().lookup("printf").expect("printf");
    assert_eq!(printf.ty().unwrap().to_string(), "func(fmt: [*]u8) i32");
    let Some(Value::Extern { link_name, ty }) = printf.value() else {
        panic!("expected an external symbol");
    };
    assert_eq!(link_name, "printf");
    assert!(matches!(ty, Type::Signature(_)));
    assert_eq!(printf.link_name(), "printf");
}

#[test]
fn functions_land_in_the_module_scope() {
    let source = "func add(a: i32, b: i32) i32 {\n    return a + b;\n}\nexport func main() i32 {\n    return add(2, 3);\n}";
    let (_, module, _) = load_ok("main", source, None);
    let add = module.scope().lookup("add").expect("add");
    let main = module.scope().lookup("main").expect("main");
    assert_eq!(add.ty().unwrap().to_string(), "func(a: i32, b: i32) i32");
    assert_eq!(add.link_name(), "_U8main.add");
    assert!(main.ty().is_some());
}

#[test]
fn module_members_resolve_through_the_import() {
    let importer = TestImporter::default();
    let (_, std_module, _) = load_ok("std", STD, None);
    importer.add("std", std_module.clone());

    let source = "const std = @import(\"std\");\nfunc main() void {\n    std.printf(\"hi\\n\");\n}";
    let (ast, _, info) = load_ok("main", source, Some(&importer));

    // Find the member identifier `printf` and check its use entry is the
    // imported module's own symbol.
    let expected = std_module.scope().lookup("printf").expect("printf");
    let Decl::Binding(main) = &ast.decls[1] else {
        panic!()
    };
    let ExprKind::Func(func) = &main.value.as_ref().unwrap().kind else {
        panic!()
    };
    let tarn_ast::Stmt::Expr(stmt) = &func.body.as_ref().unwrap().stmts[0] else {
        panic!()
    };
    let ExprKind::Call { base, .. } = &stmt.kind else {
        panic!()
    };
    let ExprKind::Member { member, .. } = &base.kind else {
        panic!()
    };
    assert_eq!(member.name, "printf");
    let used = info.uses.get(&member.id).expect("use entry for printf");
    assert_eq!(used, &expected);
}

#[test]
fn resolved_identifiers_match_a_fresh_scope_lookup() {
    let source = "const x: i32 = 1;\nconst y: i32 = x;";
    let (ast, module, info) = load_ok("main", source, None);
    let Decl::Binding(y) = &ast.decls[1] else {
        panic!()
    };
    let ExprKind::Ident(x_use) = &y.value.as_ref().unwrap().kind else {
        panic!()
    };
    let via_info = info.uses.get(&x_use.id).expect("use entry");
    let via_lookup = module.scope().lookup("x").expect("x");
    assert_eq!(via_info, &via_lookup);
}

#[test]
fn value_type_mismatch_is_reported_at_the_value() {
    let source = "const x: i32 = \"hi\";";
    let (_, _, _, errors) = load("main", source, None);
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].kind, SemaErrorKind::TypeMismatch);
    assert!(errors[0].message.contains("[]u8"));
    assert!(errors[0].message.contains("i32"));
    let span = errors[0].span;
    assert_eq!(&source[(span.start.0 - 1) as usize..(span.end.0 - 1) as usize], "\"hi\"");
}

#[test]
fn struct_constructors_check_arity_and_fields() {
    let (_, module, _) = load_ok(
        "main",
        "struct Pair(a: i32, b: i32);\nconst p = Pair(a: 1, b: 2);",
        None,
    );
    let p = module.scope().lookup("p").expect("p");
    assert_eq!(p.ty().unwrap().to_string(), "struct(a: i32, b: i32)");

    let (_, _, _, errors) = load(
        "main",
        "struct Pair(a: i32, b: i32);\nconst p = Pair(a: 1);",
        None,
    );
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].kind, SemaErrorKind::ArityMismatch);

    let (_, _, _, errors) = load(
        "main",
        "struct Pair(a: i32, b: i32);\nconst p = Pair(\"x\", 2);",
        None,
    );
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].kind, SemaErrorKind::TypeMismatch);
}

#[test]
fn struct_member_access_types_as_the_field() {
    let source = "struct Pair(a: i32, b: i32);\nfunc first(p: Pair) i32 {\n    return p.a;\n}";
    load_ok("main", source, None);
}

#[test]
fn redeclarations_keep_the_first_symbol_and_report_the_rest() {
    let source = "const x = 1;\nconst x = 2;\nconst x = 3;";
    let (_, module, _, errors) = load("main", source, None);
    let redecls: Vec<_> = errors
        .iter()
        .filter(|e| e.kind == SemaErrorKind::Redeclaration)
        .collect();
    assert_eq!(redecls.len(), 2);
    let Some(Value::Integer(n)) = module.scope().lookup("x").unwrap().value() else {
        panic!()
    };
    assert_eq!(n, 1.into());
}

#[test]
fn unresolved_names_are_reported() {
    let (_, _, _, errors) = load("main", "const x = missing;", None);
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].kind, SemaErrorKind::UnresolvedName);
}

#[test]
fn extern_outside_a_binding_is_rejected() {
    let source = "func f() void {\n    @extern(\"x\");\n}";
    let (_, _, _, errors) = load("main", source, None);
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].kind, SemaErrorKind::BadBuiltinArgs);
}

#[test]
fn import_takes_one_string_literal() {
    let importer = TestImporter::default();
    let (_, _, _, errors) = load("main", "const std = @import(1);", Some(&importer));
    assert_eq!(errors[0].kind, SemaErrorKind::BadBuiltinArgs);

    let (_, _, _, errors) = load("main", "const std = @import(\"nope\");", Some(&importer));
    assert_eq!(errors[0].kind, SemaErrorKind::Import);
}

#[test]
fn calls_through_non_functions_are_rejected() {
    let (_, _, _, errors) = load("main", "const x = 1;\nconst y = x(2);", None);
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].kind, SemaErrorKind::NotCallable);
}

#[test]
fn recursive_functions_resolve_their_own_name() {
    let source = "func spin(n: i32) i32 {\n    return spin(n);\n}";
    load_ok("main", source, None);
}

#[test]
fn comparisons_produce_a_one_bit_boolean() {
    let source = "func less(a: i32, b: i32) u1 {\n    return a < b;\n}";
    load_ok("main", source, None);
}

#[test]
fn if_statements_check_their_block() {
    let source =
        "func f(a: i32, b: i32) void {\n    if a < b {\n        return;\n    }\n}";
    load_ok("main", source, None);

    let bad = "func f(a: i32, b: i32) void {\n    if a < b {\n        return \"no\";\n    }\n}";
    let (_, _, _, errors) = load("main", bad, None);
    assert_eq!(errors[0].kind, SemaErrorKind::TypeMismatch);
}

#[test]
fn return_type_mismatch_is_reported() {
    let (_, _, _, errors) = load("main", "func f() i32 {\n    return \"hi\";\n}", None);
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].kind, SemaErrorKind::TypeMismatch);
    assert!(errors[0].message.contains("return type"));
}

#[test]
fn bodyless_functions_are_function_types() {
    // The declared type is a func *type* expression, so the extern value
    // can take it on.
    let source = "const exit: func(code: i32) void = @extern(\"exit\");";
    let (_, module, _) = load_ok("main", source, None);
    let exit = module.scope().lookup("exit").expect("exit");
    assert_eq!(exit.link_name(), "exit");
}

#[test]
fn trait_bindings_collect_requirements() {
    let source = "struct Pair(a: i32, b: i32);\ntrait Summable {\n    func sum(p: Pair) i32;\n}";
    let (_, module, _) = load_ok("main", source, None);
    let summable = module.scope().lookup("Summable").expect("Summable");
    let Some(Value::Type(Type::Trait(t))) = summable.value() else {
        panic!("expected a trait type value");
    };
    assert!(!t.closed);
    assert_eq!(t.requirements.len(), 1);
    assert_eq!(t.requirements[0].name, "sum");
}

#[test]
fn impl_definitions_live_in_their_own_scope() {
    let source = "struct Pair(a: i32, b: i32);\ntrait Zero {\n    func zero(p: Pair) i32;\n}\nimpl Pair(Zero) {\n    func zero(p: Pair) i32 {\n        return 0;\n    }\n}";
    let (_, module, _) = load_ok("main", source, None);
    // The impl's definition must not leak into the module scope.
    assert!(module.scope().lookup("zero").is_none());
}

#[test]
fn existentials_require_traits() {
    let source = "trait Ord {}\nfunc min(x: forSome Ord) void;";
    load_ok("main", source, None);

    let (_, _, _, errors) = load("main", "func min(x: forSome i32) void;", None);
    assert_eq!(errors[0].kind, SemaErrorKind::TypeMismatch);
}
