//! Type shapes: the coarse static types the Type stage infers and the
//! overload registry discriminates on.

use std::fmt;
use std::sync::Arc;

use crate::TypeHash;

/// Built-in value kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PrimitiveKind {
    Void,
    Bool,
    Int32,
    Int64,
    Float64,
    String,
}

impl PrimitiveKind {
    pub const ALL: [PrimitiveKind; 6] = [
        PrimitiveKind::Void,
        PrimitiveKind::Bool,
        PrimitiveKind::Int32,
        PrimitiveKind::Int64,
        PrimitiveKind::Float64,
        PrimitiveKind::String,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            PrimitiveKind::Void => "Void",
            PrimitiveKind::Bool => "Bool",
            PrimitiveKind::Int32 => "Int32",
            PrimitiveKind::Int64 => "Int64",
            PrimitiveKind::Float64 => "Float64",
            PrimitiveKind::String => "String",
        }
    }

    pub fn from_name(name: &str) -> Option<PrimitiveKind> {
        PrimitiveKind::ALL.into_iter().find(|kind| kind.name() == name)
    }

    pub const fn is_numeric(self) -> bool {
        matches!(
            self,
            PrimitiveKind::Int32 | PrimitiveKind::Int64 | PrimitiveKind::Float64
        )
    }

    pub fn type_hash(self) -> TypeHash {
        TypeHash::from_name(self.name())
    }
}

impl fmt::Display for PrimitiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Signature of a function-typed value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FunctionShape {
    pub params: Vec<TypeShape>,
    pub result: TypeShape,
}

/// A coarse static type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeShape {
    /// Statically unknown; compatible with everything.
    Any,
    Primitive(PrimitiveKind),
    Function(Arc<FunctionShape>),
    /// Result of an `async` block.
    Promise(Arc<TypeShape>),
    /// The type of a reified type value (`type T = ...` declarations).
    Type,
    /// A named type that has not been resolved yet (before Define).
    Named(Arc<str>),
}

impl TypeShape {
    pub const VOID: TypeShape = TypeShape::Primitive(PrimitiveKind::Void);
    pub const BOOL: TypeShape = TypeShape::Primitive(PrimitiveKind::Bool);
    pub const INT32: TypeShape = TypeShape::Primitive(PrimitiveKind::Int32);
    pub const INT64: TypeShape = TypeShape::Primitive(PrimitiveKind::Int64);
    pub const FLOAT64: TypeShape = TypeShape::Primitive(PrimitiveKind::Float64);
    pub const STRING: TypeShape = TypeShape::Primitive(PrimitiveKind::String);

    pub fn function(params: Vec<TypeShape>, result: TypeShape) -> Self {
        TypeShape::Function(Arc::new(FunctionShape { params, result }))
    }

    pub fn promise(of: TypeShape) -> Self {
        TypeShape::Promise(Arc::new(of))
    }

    pub fn is_any(&self) -> bool {
        matches!(self, TypeShape::Any)
    }

    pub fn as_primitive(&self) -> Option<PrimitiveKind> {
        match self {
            TypeShape::Primitive(kind) => Some(*kind),
            _ => None,
        }
    }

    pub fn as_function(&self) -> Option<&FunctionShape> {
        match self {
            TypeShape::Function(shape) => Some(shape),
            _ => None,
        }
    }

    /// Whether a value of shape `other` may be used where `self` is expected.
    pub fn accepts(&self, other: &TypeShape) -> bool {
        match (self, other) {
            (TypeShape::Any, _) | (_, TypeShape::Any) => true,
            (TypeShape::Function(a), TypeShape::Function(b)) => {
                a.params.len() == b.params.len()
                    && a.params.iter().zip(&b.params).all(|(x, y)| y.accepts(x))
                    && a.result.accepts(&b.result)
            }
            (TypeShape::Promise(a), TypeShape::Promise(b)) => a.accepts(b),
            _ => self == other,
        }
    }

    /// Deterministic identity used when hashing signatures.
    pub fn type_hash(&self) -> TypeHash {
        match self {
            TypeShape::Primitive(kind) => kind.type_hash(),
            TypeShape::Function(shape) => {
                let params: Vec<TypeHash> = shape.params.iter().map(TypeShape::type_hash).collect();
                TypeHash::from_function("fn", &params).combine(shape.result.type_hash())
            }
            TypeShape::Promise(of) => TypeHash::from_name("Promise").combine(of.type_hash()),
            other => TypeHash::from_name(&other.to_string()),
        }
    }
}

impl fmt::Display for TypeShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeShape::Any => f.write_str("Any"),
            TypeShape::Primitive(kind) => write!(f, "{kind}"),
            TypeShape::Function(shape) => {
                f.write_str("fn(")?;
                for (i, param) in shape.params.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{param}")?;
                }
                write!(f, ") -> {}", shape.result)
            }
            TypeShape::Promise(of) => write!(f, "Promise<{of}>"),
            TypeShape::Type => f.write_str("Type"),
            TypeShape::Named(name) => f.write_str(name),
        }
    }
}

impl From<PrimitiveKind> for TypeShape {
    fn from(kind: PrimitiveKind) -> Self {
        TypeShape::Primitive(kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn any_accepts_everything() {
        assert!(TypeShape::Any.accepts(&TypeShape::INT32));
        assert!(TypeShape::INT64.accepts(&TypeShape::Any));
        assert!(!TypeShape::INT64.accepts(&TypeShape::INT32));
    }

    #[test]
    fn function_display() {
        let shape = TypeShape::function(vec![TypeShape::INT32, TypeShape::BOOL], TypeShape::VOID);
        assert_eq!(shape.to_string(), "fn(Int32, Bool) -> Void");
    }

    #[test]
    fn function_hashes_differ_by_params() {
        let a = TypeShape::function(vec![TypeShape::INT32], TypeShape::INT32);
        let b = TypeShape::function(vec![TypeShape::INT64], TypeShape::INT32);
        assert_ne!(a.type_hash(), b.type_hash());
        assert_eq!(a.type_hash(), a.clone().type_hash());
    }

    #[test]
    fn primitive_names_round_trip() {
        for kind in PrimitiveKind::ALL {
            assert_eq!(PrimitiveKind::from_name(kind.name()), Some(kind));
        }
    }
}
