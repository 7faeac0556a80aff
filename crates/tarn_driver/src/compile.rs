//! The compilation pipeline.

use crate::error::{CompileError, CompileResult, Diagnostic};
use crate::importer::FileImporter;
use std::fs;
use std::path::Path;
use tarn_qbe::{translate, write_module};
use tarn_sema::{check, CheckConfig, Importer, Info};

/// The compilation driver: parse, check, order, lower, render.
///
/// IL is never emitted for a module with parse or semantic errors.
pub struct Driver {
    verbose: bool,
}

impl Driver {
    pub fn new() -> Self {
        Self { verbose: false }
    }

    /// A driver that traces pipeline stages to stderr.
    pub fn verbose() -> Self {
        Self { verbose: true }
    }

    /// Checks source without generating code.
    pub fn check_source(
        &self,
        name: &str,
        source: &str,
        importer: Option<&dyn Importer>,
    ) -> CompileResult<()> {
        self.front_end(name, source, importer).map(|_| ())
    }

    /// Compiles source to IL text.
    pub fn compile_source(
        &self,
        name: &str,
        source: &str,
        importer: Option<&dyn Importer>,
    ) -> CompileResult<String> {
        let (ast, info) = self.front_end(name, source, importer)?;

        if self.verbose {
            eprintln!("[tarn] lowering {name}...");
        }
        let il = translate(&ast, &info)?;
        Ok(write_module(&il))
    }

    /// Checks the file at `path`; imports resolve relative to its
    /// directory.
    pub fn check_file(&self, path: &Path) -> CompileResult<()> {
        let (name, source, importer) = self.open(path)?;
        self.check_source(&name, &source, Some(&importer))
    }

    /// Compiles the file at `path` to IL text; imports resolve relative to
    /// its directory.
    pub fn compile_file(&self, path: &Path) -> CompileResult<String> {
        let (name, source, importer) = self.open(path)?;
        self.compile_source(&name, &source, Some(&importer))
    }

    fn open(&self, path: &Path) -> CompileResult<(String, String, FileImporter)> {
        let source = fs::read_to_string(path)?;
        let name = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| "main".to_string());
        let root = path.parent().unwrap_or_else(|| Path::new("."));
        Ok((name, source, FileImporter::new(root)))
    }

    fn front_end(
        &self,
        name: &str,
        source: &str,
        importer: Option<&dyn Importer>,
    ) -> CompileResult<(tarn_ast::Module, Info)> {
        if self.verbose {
            eprintln!("[tarn] parsing {name}...");
        }
        let (ast, parse_errors) = tarn_parser::parse(name, source);
        if !parse_errors.is_empty() {
            return Err(CompileError::Diagnostics(
                parse_errors
                    .into_iter()
                    .map(|err| Diagnostic {
                        module: name.to_string(),
                        span: err.span(),
                        message: err.to_string(),
                    })
                    .collect(),
            ));
        }

        if self.verbose {
            eprintln!("[tarn] checking {name}...");
        }
        let mut info = Info::default();
        let (_module, errors) = check(
            &ast,
            CheckConfig {
                importer,
                check_func_bodies: true,
            },
            &mut info,
        );
        if !errors.is_empty() {
            return Err(CompileError::Diagnostics(
                errors
                    .into_iter()
                    .map(|err| Diagnostic {
                        module: name.to_string(),
                        span: err.span,
                        message: err.to_string(),
                    })
                    .collect(),
            ));
        }

        Ok((ast, info))
    }
}

impl Default for Driver {
    fn default() -> Self {
        Self::new()
    }
}
