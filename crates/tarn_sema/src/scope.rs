//! Lexical scopes, symbols, and module interfaces.
//!
//! Scopes form a tree rooted at the universe scope. Child scopes and
//! symbols are owned via `Rc`; back-links (symbol → scope, scope → parent,
//! scope → module) are weak so a module handle transitively owns its whole
//! tree and dropping it releases everything.

use crate::types::{TraitType, Type};
use crate::value::{BuiltinId, Value};
use indexmap::IndexMap;
use std::cell::RefCell;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::{Rc, Weak};
use tarn_lexer::Span;

/// A lexical scope; cloning shares the handle.
#[derive(Clone)]
pub struct Scope(Rc<ScopeData>);

struct ScopeData {
    span: Span,
    comment: String,
    parent: Option<Weak<ScopeData>>,
    module: RefCell<Option<Weak<ModuleData>>>,
    children: RefCell<Vec<Scope>>,
    symbols: RefCell<IndexMap<String, Symbol>>,
}

impl Scope {
    /// Creates a scope, registering it with its parent and inheriting the
    /// parent's module.
    pub fn new(parent: Option<&Scope>, span: Span, comment: impl Into<String>) -> Scope {
        let scope = Scope::detached(parent, span, comment);
        if let Some(parent) = parent {
            parent.0.children.borrow_mut().push(scope.clone());
        }
        scope
    }

    /// Creates a module scope under the universe. The parent link works
    /// for lookups, but the universe does not own the new scope, so
    /// dropping the module releases its whole tree.
    pub fn new_module_scope(universe: &Scope, span: Span, comment: impl Into<String>) -> Scope {
        Scope::detached(Some(universe), span, comment)
    }

    fn detached(parent: Option<&Scope>, span: Span, comment: impl Into<String>) -> Scope {
        Scope(Rc::new(ScopeData {
            span,
            comment: comment.into(),
            parent: parent.map(|p| Rc::downgrade(&p.0)),
            module: RefCell::new(parent.and_then(|p| p.0.module.borrow().clone())),
            children: RefCell::new(Vec::new()),
            symbols: RefCell::new(IndexMap::new()),
        }))
    }

    /// Inserts a symbol. If the name is already bound the existing symbol
    /// wins and is returned so the caller can report the redeclaration.
    pub fn insert(&self, symbol: Symbol) -> Option<Symbol> {
        let mut symbols = self.0.symbols.borrow_mut();
        if let Some(existing) = symbols.get(symbol.name()) {
            return Some(existing.clone());
        }
        *symbol.0.scope.borrow_mut() = Some(Rc::downgrade(&self.0));
        symbols.insert(symbol.name().to_string(), symbol);
        None
    }

    /// Looks a name up through the scope chain, ending at the universe.
    pub fn lookup(&self, name: &str) -> Option<Symbol> {
        if let Some(symbol) = self.lookup_local(name) {
            return Some(symbol);
        }
        let parent = self.0.parent.as_ref()?.upgrade()?;
        Scope(parent).lookup(name)
    }

    /// Looks a name up in this scope only.
    pub fn lookup_local(&self, name: &str) -> Option<Symbol> {
        self.0.symbols.borrow().get(name).cloned()
    }

    pub fn module(&self) -> Option<Module> {
        self.0
            .module
            .borrow()
            .as_ref()
            .and_then(Weak::upgrade)
            .map(Module)
    }

    pub fn span(&self) -> Span {
        self.0.span
    }

    /// Symbols in insertion order.
    pub fn symbols(&self) -> Vec<Symbol> {
        self.0.symbols.borrow().values().cloned().collect()
    }

    fn set_module(&self, module: &Module) {
        *self.0.module.borrow_mut() = Some(Rc::downgrade(&module.0));
    }

    fn write_tree(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        let pad = "  ".repeat(depth);
        writeln!(f, "{pad}{} {{", self.0.comment)?;
        for symbol in self.0.symbols.borrow().values() {
            writeln!(f, "{pad}  {symbol}")?;
        }
        for child in self.0.children.borrow().iter() {
            child.write_tree(f, depth + 1)?;
        }
        write!(f, "{pad}}}")?;
        if depth > 0 {
            writeln!(f)?;
        }
        Ok(())
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_tree(f, 0)
    }
}

impl fmt::Debug for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Scope({:?})", self.0.comment)
    }
}

impl PartialEq for Scope {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for Scope {}

/// A checked module: its name plus its scope. Cloning shares the handle.
#[derive(Clone)]
pub struct Module(Rc<ModuleData>);

struct ModuleData {
    name: String,
    scope: Scope,
}

impl Module {
    /// Creates a module owning the given scope and points the scope (and
    /// its future children) back at it.
    pub fn new(name: impl Into<String>, scope: Scope) -> Module {
        let module = Module(Rc::new(ModuleData {
            name: name.into(),
            scope: scope.clone(),
        }));
        scope.set_module(&module);
        module
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn scope(&self) -> &Scope {
        &self.0.scope
    }
}

impl PartialEq for Module {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for Module {}

impl fmt::Debug for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Module({:?})", self.0.name)
    }
}

/// A symbol: a name bound to a type-and-value pair, plus an optional link
/// name override. Cloning shares the handle; equality and hashing are
/// handle identity.
#[derive(Clone)]
pub struct Symbol(Rc<SymbolData>);

struct SymbolData {
    name: String,
    scope: RefCell<Option<Weak<ScopeData>>>,
    ty: RefCell<Option<Type>>,
    value: RefCell<Option<Value>>,
    link_name: RefCell<Option<String>>,
}

impl Symbol {
    pub fn new(name: impl Into<String>) -> Symbol {
        Symbol(Rc::new(SymbolData {
            name: name.into(),
            scope: RefCell::new(None),
            ty: RefCell::new(None),
            value: RefCell::new(None),
            link_name: RefCell::new(None),
        }))
    }

    /// A symbol whose type is derived from its value, as used for the
    /// universe builtins.
    pub fn from_value(name: impl Into<String>, value: Value) -> Symbol {
        let symbol = Symbol::new(name);
        symbol.set_ty(value.ty());
        symbol.set_value(value);
        symbol
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn ty(&self) -> Option<Type> {
        self.0.ty.borrow().clone()
    }

    pub fn set_ty(&self, ty: Type) {
        *self.0.ty.borrow_mut() = Some(ty);
    }

    pub fn value(&self) -> Option<Value> {
        self.0.value.borrow().clone()
    }

    pub fn set_value(&self, value: Value) {
        *self.0.value.borrow_mut() = Some(value);
    }

    pub fn scope(&self) -> Option<Scope> {
        self.0
            .scope
            .borrow()
            .as_ref()
            .and_then(Weak::upgrade)
            .map(Scope)
    }

    pub fn set_link_name(&self, link_name: impl Into<String>) {
        *self.0.link_name.borrow_mut() = Some(link_name.into());
    }

    /// The module-qualified source name, `module.name`.
    pub fn qualified_name(&self) -> String {
        match self.scope().and_then(|s| s.module()) {
            Some(module) => format!("{}.{}", module.name(), self.name()),
            None => self.name().to_string(),
        }
    }

    /// The name this symbol links under: the `@extern` override when set,
    /// the mangled qualified name otherwise.
    pub fn link_name(&self) -> String {
        if let Some(link_name) = self.0.link_name.borrow().as_ref() {
            return link_name.clone();
        }
        let qualified = self.qualified_name();
        format!("_U{}{}", qualified.len(), qualified)
    }

    /// True when this symbol lives directly in its module's top scope.
    pub fn is_module_level(&self) -> bool {
        match (self.scope(), self.scope().and_then(|s| s.module())) {
            (Some(scope), Some(module)) => &scope == module.scope(),
            _ => false,
        }
    }
}

impl PartialEq for Symbol {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for Symbol {}

impl Hash for Symbol {
    fn hash<H: Hasher>(&self, state: &mut H) {
        (Rc::as_ptr(&self.0) as usize).hash(state);
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())?;
        if let Some(ty) = self.ty() {
            write!(f, ": {ty}")?;
        }
        if let Some(value) = self.value() {
            write!(f, " = {value}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Symbol({:?})", self.name())
    }
}

thread_local! {
    static UNIVERSE: Scope = build_universe();
}

/// The universe scope holding the builtins. Built once per thread and
/// immutable afterwards; module scopes use it as their parent.
pub fn universe() -> Scope {
    UNIVERSE.with(Scope::clone)
}

fn build_universe() -> Scope {
    let scope = Scope::new(None, Span::NONE, "universe");
    scope.insert(Symbol::from_value(
        "Type",
        Value::Type(Type::Trait(Rc::new(TraitType {
            closed: true,
            requirements: Vec::new(),
        }))),
    ));
    scope.insert(Symbol::from_value("@import", Value::Builtin(BuiltinId::Import)));
    scope.insert(Symbol::from_value("@extern", Value::Builtin(BuiltinId::Extern)));
    scope
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn universe_holds_the_builtins() {
        let universe = universe();
        assert!(universe.lookup("Type").is_some());
        assert!(universe.lookup("@import").is_some());
        assert!(universe.lookup("@extern").is_some());
        assert!(universe.lookup("nothing").is_none());
    }

    #[test]
    fn lookup_walks_the_parent_chain() {
        let parent = Scope::new(Some(&universe()), Span::NONE, "module");
        let child = Scope::new(Some(&parent), Span::NONE, "func");
        parent.insert(Symbol::from_value(
            "x",
            Value::Integer(num_bigint::BigInt::from(1)),
        ));
        assert!(child.lookup("x").is_some());
        assert!(child.lookup("@import").is_some());
        assert!(child.lookup_local("x").is_none());
    }

    #[test]
    fn insert_keeps_the_first_symbol() {
        let scope = Scope::new(None, Span::NONE, "test");
        let first = Symbol::new("x");
        assert!(scope.insert(first.clone()).is_none());
        let clash = scope.insert(Symbol::new("x")).expect("existing symbol");
        assert_eq!(clash, first);
    }

    #[test]
    fn link_names_mangle_the_qualified_name() {
        let scope = Scope::new(Some(&universe()), Span::NONE, "module");
        let module = Module::new("main", scope.clone());
        let symbol = Symbol::new("add");
        scope.insert(symbol.clone());
        assert_eq!(symbol.qualified_name(), "main.add");
        assert_eq!(symbol.link_name(), "_U8main.add");
        assert!(symbol.is_module_level());
        drop(module);
    }

    #[test]
    fn extern_overrides_the_link_name() {
        let symbol = Symbol::new("printf");
        symbol.set_link_name("printf");
        assert_eq!(symbol.link_name(), "printf");
    }
}
