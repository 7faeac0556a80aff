//! The semantic type domain.

use std::fmt;
use std::rc::Rc;

/// A semantic type.
///
/// Equality is structural for everything except [`Type::Struct`], whose
/// identity is nominal: two struct types are equal only when they are the
/// same handle, introduced by the same `struct` binding.
#[derive(Clone, Debug)]
pub enum Type {
    Integer(IntegerType),
    Pointer { element: Box<Type>, many: bool },
    Slice { element: Box<Type> },
    Signature(Rc<Signature>),
    Struct(StructType),
    Trait(Rc<TraitType>),
    Existential { trait_type: Box<Type> },
}

/// A fixed-width integer type. `void` is the unsigned zero-width integer;
/// the signed zero-width integer is the type of untyped integer literals.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IntegerType {
    pub signed: bool,
    pub bits: u16,
}

/// A function type: named parameters plus a return type. Parameter names
/// participate in equality but not in assignability beyond it.
#[derive(Clone, Debug)]
pub struct Signature {
    pub params: Vec<NameAndType>,
    pub return_type: Type,
}

/// A nominal struct type; cloning shares the handle.
#[derive(Clone, Debug)]
pub struct StructType(Rc<Vec<NameAndType>>);

impl StructType {
    pub fn new(members: Vec<NameAndType>) -> Self {
        Self(Rc::new(members))
    }

    pub fn members(&self) -> &[NameAndType] {
        &self.0
    }

    fn same(&self, other: &StructType) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

/// A trait type: a closed marker plus named requirements.
#[derive(Clone, Debug)]
pub struct TraitType {
    pub closed: bool,
    pub requirements: Vec<NameAndType>,
}

/// A name paired with a type: parameters, struct members, trait
/// requirements.
#[derive(Clone, Debug)]
pub struct NameAndType {
    pub name: String,
    pub ty: Type,
}

impl NameAndType {
    pub fn new(name: impl Into<String>, ty: Type) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }
}

impl Type {
    /// The `void` type.
    pub fn void() -> Type {
        Type::Integer(IntegerType {
            signed: false,
            bits: 0,
        })
    }

    /// The type of untyped integer literals, assignable to any integer.
    pub fn untyped_integer() -> Type {
        Type::Integer(IntegerType {
            signed: true,
            bits: 0,
        })
    }

    /// The type of string literals, `[]u8`.
    pub fn byte_slice() -> Type {
        Type::Slice {
            element: Box::new(Type::Integer(IntegerType {
                signed: false,
                bits: 8,
            })),
        }
    }

    pub fn is_void(&self) -> bool {
        matches!(
            self,
            Type::Integer(IntegerType {
                signed: false,
                bits: 0
            })
        )
    }

    pub fn is_integer(&self) -> bool {
        matches!(self, Type::Integer(_))
    }

    /// Structural equality, nominal for structs.
    pub fn equal(&self, other: &Type) -> bool {
        match (self, other) {
            (Type::Integer(a), Type::Integer(b)) => a == b,
            (
                Type::Pointer {
                    element: a,
                    many: am,
                },
                Type::Pointer {
                    element: b,
                    many: bm,
                },
            ) => am == bm && a.equal(b),
            (Type::Slice { element: a }, Type::Slice { element: b }) => a.equal(b),
            (Type::Signature(a), Type::Signature(b)) => {
                a.params.len() == b.params.len()
                    && a.params
                        .iter()
                        .zip(&b.params)
                        .all(|(x, y)| x.name == y.name && x.ty.equal(&y.ty))
                    && a.return_type.equal(&b.return_type)
            }
            (Type::Struct(a), Type::Struct(b)) => a.same(b),
            (Type::Trait(a), Type::Trait(b)) => {
                a.closed == b.closed
                    && a.requirements.len() == b.requirements.len()
                    && a.requirements
                        .iter()
                        .zip(&b.requirements)
                        .all(|(x, y)| x.name == y.name && x.ty.equal(&y.ty))
            }
            (Type::Existential { trait_type: a }, Type::Existential { trait_type: b }) => {
                a.equal(b)
            }
            _ => false,
        }
    }

    /// Assignability: integers widen (sign ignored), slices and signatures
    /// require structural equality, everything else only assigns to its
    /// equal self.
    pub fn assignable_to(&self, other: &Type) -> bool {
        match (self, other) {
            (Type::Integer(a), Type::Integer(b)) => b.bits >= a.bits,
            (Type::Slice { .. }, _) | (Type::Signature(_), _) => self.equal(other),
            _ => self.equal(other),
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Integer(i) => match (i.signed, i.bits) {
                (false, 0) => write!(f, "void"),
                (true, 0) => write!(f, "{{integer}}"),
                (true, bits) => write!(f, "i{bits}"),
                (false, bits) => write!(f, "u{bits}"),
            },
            Type::Pointer { element, many } => {
                if *many {
                    write!(f, "[*]{element}")
                } else {
                    write!(f, "*{element}")
                }
            }
            Type::Slice { element } => write!(f, "[]{element}"),
            Type::Signature(sig) => {
                write!(f, "func(")?;
                for (i, param) in sig.params.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", param.name, param.ty)?;
                }
                write!(f, ") {}", sig.return_type)
            }
            Type::Struct(st) => {
                write!(f, "struct(")?;
                for (i, member) in st.members().iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", member.name, member.ty)?;
                }
                write!(f, ")")
            }
            Type::Trait(_) => write!(f, "trait"),
            Type::Existential { trait_type } => write!(f, "forSome {trait_type}"),
        }
    }
}

/// Synthesizes an integer type from a name: `i<bits>`, `u<bits>`, or
/// `void`. Returns `None` for everything else.
pub fn integer_type_from_name(name: &str) -> Option<IntegerType> {
    if name == "void" {
        return Some(IntegerType {
            signed: false,
            bits: 0,
        });
    }

    let mut chars = name.chars();
    let signed = match chars.next() {
        Some('i') => true,
        Some('u') => false,
        _ => return None,
    };
    let rest = chars.as_str();
    if rest.is_empty() || !rest.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let bits = rest.parse::<u16>().ok()?;
    Some(IntegerType { signed, bits })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn int(signed: bool, bits: u16) -> Type {
        Type::Integer(IntegerType { signed, bits })
    }

    #[test]
    fn integer_names() {
        assert_eq!(
            integer_type_from_name("i32"),
            Some(IntegerType {
                signed: true,
                bits: 32
            })
        );
        assert_eq!(
            integer_type_from_name("u1"),
            Some(IntegerType {
                signed: false,
                bits: 1
            })
        );
        assert_eq!(
            integer_type_from_name("void"),
            Some(IntegerType {
                signed: false,
                bits: 0
            })
        );
        assert_eq!(integer_type_from_name("i"), None);
        assert_eq!(integer_type_from_name("u8x"), None);
        assert_eq!(integer_type_from_name("x32"), None);
        assert_eq!(integer_type_from_name("i99999"), None);
    }

    #[test]
    fn assignability_is_reflexive_for_every_shape() {
        let samples = [
            int(true, 32),
            Type::void(),
            Type::byte_slice(),
            Type::Pointer {
                element: Box::new(int(false, 8)),
                many: true,
            },
            Type::Signature(Rc::new(Signature {
                params: vec![NameAndType::new("x", int(true, 64))],
                return_type: Type::void(),
            })),
            Type::Struct(StructType::new(vec![NameAndType::new("a", int(true, 32))])),
            Type::Trait(Rc::new(TraitType {
                closed: false,
                requirements: vec![],
            })),
        ];
        for ty in &samples {
            assert!(ty.equal(ty), "{ty} should equal itself");
            assert!(ty.assignable_to(ty), "{ty} should assign to itself");
        }
    }

    #[test]
    fn integers_widen_regardless_of_sign() {
        assert!(int(true, 8).assignable_to(&int(false, 16)));
        assert!(int(false, 32).assignable_to(&int(true, 32)));
        assert!(!int(true, 64).assignable_to(&int(true, 32)));
        assert!(!int(true, 8).equal(&int(false, 8)));
    }

    #[test]
    fn struct_identity_is_nominal() {
        let members = vec![NameAndType::new("a", int(true, 32))];
        let a = StructType::new(members.clone());
        let b = StructType::new(members);
        assert!(Type::Struct(a.clone()).equal(&Type::Struct(a.clone())));
        assert!(!Type::Struct(a.clone()).equal(&Type::Struct(b.clone())));
        assert!(!Type::Struct(a).assignable_to(&Type::Struct(b)));
    }

    #[test]
    fn slices_and_signatures_are_structural() {
        assert!(Type::byte_slice().equal(&Type::byte_slice()));
        assert!(Type::byte_slice().assignable_to(&Type::byte_slice()));
        let sig = |name: &str| {
            Type::Signature(Rc::new(Signature {
                params: vec![NameAndType::new(name, int(true, 32))],
                return_type: Type::void(),
            }))
        };
        assert!(sig("x").equal(&sig("x")));
        assert!(!sig("x").equal(&sig("y")));
    }

    #[test]
    fn untyped_literals_assign_to_any_integer() {
        assert!(Type::untyped_integer().assignable_to(&int(true, 8)));
        assert!(Type::untyped_integer().assignable_to(&int(false, 64)));
        assert!(!Type::untyped_integer().assignable_to(&Type::byte_slice()));
    }
}
