//! Compile-time values produced during checking.

use crate::scope::Module;
use crate::types::{NameAndType, Signature, StructType, TraitType, Type};
use num_bigint::BigInt;
use std::fmt;
use std::rc::Rc;

/// The builtin functions living in the universe scope.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BuiltinId {
    Import,
    Extern,
}

impl fmt::Display for BuiltinId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuiltinId::Import => write!(f, "@import"),
            BuiltinId::Extern => write!(f, "@extern"),
        }
    }
}

/// A compile-time value.
#[derive(Clone, Debug)]
pub enum Value {
    /// A type used as a value.
    Type(Type),
    /// A folded integer literal.
    Integer(BigInt),
    /// An unquoted string literal.
    String(Vec<u8>),
    /// One of the universe builtins.
    Builtin(BuiltinId),
    /// The module produced by `@import`.
    Module(Module),
    /// The symbol produced by `@extern`.
    Extern { link_name: String, ty: Type },
}

impl Value {
    /// The type of this value.
    ///
    /// A type value's type is the type it denotes; builtins have the
    /// signature `func(name: []u8) Type`.
    pub fn ty(&self) -> Type {
        match self {
            Value::Type(ty) => ty.clone(),
            Value::Integer(_) => Type::untyped_integer(),
            Value::String(_) => Type::byte_slice(),
            Value::Builtin(id) => {
                let param = match id {
                    BuiltinId::Import => "name",
                    BuiltinId::Extern => "linkName",
                };
                Type::Signature(Rc::new(Signature {
                    params: vec![NameAndType::new(param, Type::byte_slice())],
                    return_type: Type::Trait(Rc::new(TraitType {
                        closed: true,
                        requirements: vec![],
                    })),
                }))
            }
            // Modules are opaque: a fresh nominal struct with no members.
            Value::Module(_) => Type::Struct(StructType::new(Vec::new())),
            Value::Extern { ty, .. } => ty.clone(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Type(ty) => write!(f, "type {ty}"),
            Value::Integer(n) => write!(f, "{n}"),
            Value::String(bytes) => write!(f, "{:?}", String::from_utf8_lossy(bytes)),
            Value::Builtin(id) => write!(f, "{id}"),
            Value::Module(module) => write!(f, "module {:?}", module.name()),
            Value::Extern { link_name, .. } => write!(f, "@extern({link_name:?})"),
        }
    }
}

/// Strips the surrounding quotes and processes C-style escapes in a string
/// literal lexeme.
pub fn unquote(text: &str) -> Vec<u8> {
    let inner = text
        .strip_prefix('"')
        .and_then(|t| t.strip_suffix('"'))
        .unwrap_or(text);

    let mut bytes = Vec::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            let mut buf = [0u8; 4];
            bytes.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
            continue;
        }
        match chars.next() {
            Some('n') => bytes.push(b'\n'),
            Some('r') => bytes.push(b'\r'),
            Some('t') => bytes.push(b'\t'),
            Some('0') => bytes.push(0),
            Some('\\') => bytes.push(b'\\'),
            Some('"') => bytes.push(b'"'),
            Some(other) => {
                let mut buf = [0u8; 4];
                bytes.extend_from_slice(other.encode_utf8(&mut buf).as_bytes());
            }
            None => bytes.push(b'\\'),
        }
    }
    bytes
}
