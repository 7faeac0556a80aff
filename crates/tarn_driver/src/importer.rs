//! Disk-backed module resolution for `@import`.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use tarn_sema::{check, CheckConfig, ImportError, Importer, Info, Module};

/// Resolves `@import("name")` to `<root>/name.tarn`, checking each module
/// once and caching the result.
///
/// A load stack guards against reentrant imports: if a module is asked for
/// while it is still being loaded, the import is cyclic and reported as
/// such instead of recursing forever.
pub struct FileImporter {
    root: PathBuf,
    cache: RefCell<HashMap<String, Module>>,
    loading: RefCell<Vec<String>>,
}

impl FileImporter {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            cache: RefCell::new(HashMap::new()),
            loading: RefCell::new(Vec::new()),
        }
    }

    fn load(&self, name: &str, source: &str) -> Result<Module, ImportError> {
        let (ast, parse_errors) = tarn_parser::parse(name, source);
        if !parse_errors.is_empty() {
            return Err(ImportError::Failed(format!(
                "module {name:?} failed to parse: {}",
                parse_errors[0]
            )));
        }

        let mut info = Info::default();
        let (module, errors) = check(
            &ast,
            CheckConfig {
                importer: Some(self),
                // Imports only need their interface.
                check_func_bodies: false,
            },
            &mut info,
        );
        if !errors.is_empty() {
            return Err(ImportError::Failed(format!(
                "module {name:?} failed to check: {}",
                errors[0]
            )));
        }
        Ok(module)
    }
}

impl Importer for FileImporter {
    fn import(&self, name: &str) -> Result<Module, ImportError> {
        if let Some(module) = self.cache.borrow().get(name) {
            return Ok(module.clone());
        }
        if self.loading.borrow().iter().any(|loading| loading == name) {
            return Err(ImportError::Cycle(name.to_string()));
        }

        let path = self.root.join(format!("{name}.tarn"));
        let source = fs::read_to_string(&path).map_err(|err| {
            ImportError::Failed(format!("cannot read {}: {err}", path.display()))
        })?;

        self.loading.borrow_mut().push(name.to_string());
        let result = self.load(name, &source);
        self.loading.borrow_mut().pop();

        let module = result?;
        self.cache
            .borrow_mut()
            .insert(name.to_string(), module.clone());
        Ok(module)
    }
}
