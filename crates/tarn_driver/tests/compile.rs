//! Integration tests driving multi-file compilations through temp dirs.

use std::fs;
use tarn_driver::{CompileError, Driver};

fn write_files(dir: &std::path::Path, files: &[(&str, &str)]) {
    for (name, source) in files {
        fs::write(dir.join(name), source).expect("write source file");
    }
}

#[test]
fn compiles_a_module_that_imports_another() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_files(
        dir.path(),
        &[
            (
                "std.tarn",
                "const printf: func(fmt: [*]u8) i32 = @extern(\"printf\");\n",
            ),
            (
                "main.tarn",
                "const std = @import(\"std\");\n\nexport func main() i32 {\n    std.printf(\"hello\\n\");\n    return 0;\n}\n",
            ),
        ],
    );

    let il = Driver::new()
        .compile_file(&dir.path().join("main.tarn"))
        .expect("compile failed");
    assert!(il.contains("export function w $_U9main.main()"), "{il}");
    assert!(il.contains("call $printf(l $str0)"), "{il}");
    assert!(il.contains("data $str0 = { b \"hello\\n\", b 0 }"), "{il}");
}

#[test]
fn import_cycles_are_reported_not_recursed() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_files(
        dir.path(),
        &[
            ("a.tarn", "const b = @import(\"b\");\n"),
            ("b.tarn", "const a = @import(\"a\");\n"),
        ],
    );

    let err = Driver::new()
        .compile_file(&dir.path().join("a.tarn"))
        .expect_err("cycle must fail");
    assert!(
        err.to_string().contains("cyclic import"),
        "unexpected error: {err}"
    );
}

#[test]
fn type_errors_stop_before_code_generation() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_files(dir.path(), &[("main.tarn", "const x: i32 = \"hi\";\n")]);

    let err = Driver::new()
        .compile_file(&dir.path().join("main.tarn"))
        .expect_err("type error must fail");
    let CompileError::Diagnostics(diagnostics) = &err else {
        panic!("expected diagnostics, got {err}");
    };
    assert_eq!(diagnostics.len(), 1);
    assert!(diagnostics[0].message.contains("not assignable"));
    assert_ne!(diagnostics[0].span.start.0, 0);
}

#[test]
fn parse_errors_accumulate_and_report_spans() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_files(
        dir.path(),
        &[("main.tarn", "const = 1;\nconst y 2;\nconst z = 3;\n")],
    );

    let err = Driver::new()
        .compile_file(&dir.path().join("main.tarn"))
        .expect_err("parse errors must fail");
    let CompileError::Diagnostics(diagnostics) = &err else {
        panic!("expected diagnostics, got {err}");
    };
    assert!(diagnostics.len() >= 2, "{diagnostics:?}");
}

#[test]
fn missing_imports_surface_the_importer_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_files(dir.path(), &[("main.tarn", "const gone = @import(\"gone\");\n")]);

    let err = Driver::new()
        .compile_file(&dir.path().join("main.tarn"))
        .expect_err("missing module must fail");
    assert!(err.to_string().contains("gone"), "{err}");
}

#[test]
fn check_only_reports_success_without_emitting() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_files(
        dir.path(),
        &[(
            "main.tarn",
            "func add(a: i32, b: i32) i32 {\n    return a + b;\n}\n",
        )],
    );

    Driver::new()
        .check_file(&dir.path().join("main.tarn"))
        .expect("check failed");
}
