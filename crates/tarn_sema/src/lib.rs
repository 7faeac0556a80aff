//! Semantic analysis for the Tarn programming language.
//!
//! This crate provides the semantic type and value domains, lexical scopes
//! and symbols, the checker that walks a parsed module, and the importer
//! interface the checker uses to resolve `@import`.

mod check;
mod error;
mod scope;
mod types;
mod value;

pub use check::{check, CheckConfig, Info, TypeAndValue};
pub use error::{ImportError, Importer, SemaError, SemaErrorKind};
pub use scope::{universe, Module, Scope, Symbol};
pub use types::{integer_type_from_name, IntegerType, NameAndType, Signature, StructType, TraitType, Type};
pub use value::{unquote, BuiltinId, Value};
