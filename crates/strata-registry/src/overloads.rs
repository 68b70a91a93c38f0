//! Overloaded operations and their dispatch trees.
//!
//! An [`OverloadRegistry`] maps an operation name (`"+"`, `"toString"`) to
//! its overloads. [`OverloadRegistry::finalize`] builds one decision tree per
//! operation over the discriminants [`Discriminant::Arity`] and
//! [`Discriminant::ArgType`]; [`OverloadRegistry::dispatch`] walks that tree
//! for a concrete argument list and disambiguates what is left at the leaf.
//!
//! # Example
//!
//! ```
//! use strata_core::TypeShape;
//! use strata_registry::{OverloadRegistry, Signature};
//!
//! let mut registry: OverloadRegistry<&str> = OverloadRegistry::new();
//! registry
//!     .register("+", Signature::new(vec![TypeShape::INT32, TypeShape::INT32], TypeShape::INT32), "add_i32")
//!     .unwrap();
//! registry
//!     .register("+", Signature::new(vec![TypeShape::STRING, TypeShape::STRING], TypeShape::STRING), "concat")
//!     .unwrap();
//! registry.finalize();
//!
//! let chosen = registry.dispatch("+", &[TypeShape::STRING, TypeShape::STRING]).unwrap();
//! assert_eq!(chosen.implementation, "concat");
//! ```

use std::fmt;
use std::sync::Arc;

use rustc_hash::{FxHashMap, FxHashSet};
use strata_core::{PrimitiveKind, TypeHash, TypeShape};
use thiserror::Error;

use crate::decision_tree::{DecisionTree, build_decision_tree};

/// Parameter and result shapes of one overload.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Signature {
    pub params: Vec<TypeShape>,
    pub result: TypeShape,
}

impl Signature {
    pub fn new(params: Vec<TypeShape>, result: TypeShape) -> Self {
        Self { params, result }
    }

    pub fn arity(&self) -> usize {
        self.params.len()
    }

    /// Whether arguments of these shapes may be passed.
    pub fn accepts(&self, args: &[TypeShape]) -> bool {
        self.params.len() == args.len()
            && self.params.iter().zip(args).all(|(p, a)| p.accepts(a))
    }

    /// Whether every parameter is exactly the argument's shape.
    pub fn is_exact(&self, args: &[TypeShape]) -> bool {
        self.params.as_slice() == args
    }

    /// Number of `Any` parameters; fewer means more specific.
    pub fn any_count(&self) -> usize {
        self.params.iter().filter(|p| p.is_any()).count()
    }

    /// The signature as a function type.
    pub fn shape(&self) -> TypeShape {
        TypeShape::function(self.params.clone(), self.result.clone())
    }

    /// Identity of `name` with these parameters. Overloads differing only in
    /// result share a hash and are duplicates.
    pub fn type_hash(&self, name: &str) -> TypeHash {
        let params: Vec<TypeHash> = self.params.iter().map(TypeShape::type_hash).collect();
        TypeHash::from_function(name, &params)
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.shape())
    }
}

/// A registered overload.
#[derive(Debug, Clone)]
pub struct Overload<F> {
    pub name: Arc<str>,
    pub signature: Signature,
    pub hash: TypeHash,
    pub implementation: F,
}

/// A probe that splits overloads during dispatch-tree construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Discriminant {
    /// Number of arguments.
    Arity,
    /// Shape class of the argument at this index.
    ArgType(usize),
}

impl fmt::Display for Discriminant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Discriminant::Arity => f.write_str("arity"),
            Discriminant::ArgType(i) => write!(f, "arg{i}"),
        }
    }
}

/// Coarse classification of a shape, used as a dispatch category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShapeClass {
    Primitive(PrimitiveKind),
    Function,
    Promise,
    Type,
}

impl ShapeClass {
    /// Every class an `Any` parameter accepts.
    pub fn all() -> impl Iterator<Item = ShapeClass> {
        PrimitiveKind::ALL
            .into_iter()
            .map(ShapeClass::Primitive)
            .chain([ShapeClass::Function, ShapeClass::Promise, ShapeClass::Type])
    }

    /// Class of a concrete shape; `None` when statically unknown.
    pub fn of(shape: &TypeShape) -> Option<ShapeClass> {
        match shape {
            TypeShape::Primitive(kind) => Some(ShapeClass::Primitive(*kind)),
            TypeShape::Function(_) => Some(ShapeClass::Function),
            TypeShape::Promise(_) => Some(ShapeClass::Promise),
            TypeShape::Type => Some(ShapeClass::Type),
            TypeShape::Any | TypeShape::Named(_) => None,
        }
    }
}

/// Category a [`Discriminant`] assigns to a signature or an argument list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DispatchKey {
    Arity(usize),
    Class(ShapeClass),
    /// The probed argument position does not exist.
    Absent,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    #[error("unknown operation `{0}`")]
    UnknownOperation(String),

    #[error("no overload of `{name}` accepts ({args})")]
    NoOverload { name: String, args: String },

    #[error("call to `{name}` with ({args}) is ambiguous between {}", .candidates.join(" and "))]
    Ambiguous {
        name: String,
        args: String,
        candidates: Vec<String>,
    },

    #[error("`{name}` already has an overload {signature}")]
    Duplicate { name: String, signature: String },
}

type DispatchTree = DecisionTree<usize, Discriminant, DispatchKey>;

struct Operation<F> {
    overloads: Vec<Overload<F>>,
    hashes: FxHashSet<TypeHash>,
    tree: Option<DispatchTree>,
}

/// Overloaded operations by name.
pub struct OverloadRegistry<F> {
    operations: FxHashMap<Arc<str>, Operation<F>>,
}

impl<F> Default for OverloadRegistry<F> {
    fn default() -> Self {
        Self {
            operations: FxHashMap::default(),
        }
    }
}

impl<F> fmt::Debug for OverloadRegistry<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.operations.keys().map(|k| &**k).collect();
        names.sort_unstable();
        f.debug_struct("OverloadRegistry")
            .field("operations", &names)
            .finish()
    }
}

impl<F> OverloadRegistry<F> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an overload. Invalidates the operation's dispatch tree until the
    /// next [`finalize`](Self::finalize).
    pub fn register(
        &mut self,
        name: &str,
        signature: Signature,
        implementation: F,
    ) -> Result<TypeHash, DispatchError> {
        let hash = signature.type_hash(name);
        let operation = self
            .operations
            .entry(Arc::from(name))
            .or_insert_with(|| Operation {
                overloads: Vec::new(),
                hashes: FxHashSet::default(),
                tree: None,
            });
        if !operation.hashes.insert(hash) {
            return Err(DispatchError::Duplicate {
                name: name.to_string(),
                signature: signature.to_string(),
            });
        }
        operation.overloads.push(Overload {
            name: Arc::from(name),
            signature,
            hash,
            implementation,
        });
        operation.tree = None;
        Ok(hash)
    }

    /// Build a dispatch tree for every operation that lacks one.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn finalize(&mut self) {
        for operation in self.operations.values_mut() {
            if operation.tree.is_none() {
                operation.tree = Some(build_tree(&operation.overloads));
            }
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.operations.contains_key(name)
    }

    /// Names of all operations, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.operations.keys().map(|k| &**k).collect();
        names.sort_unstable();
        names
    }

    pub fn overloads(&self, name: &str) -> &[Overload<F>] {
        self.operations
            .get(name)
            .map_or(&[], |operation| operation.overloads.as_slice())
    }

    /// The dispatch tree of `name`, once finalized.
    pub fn tree(&self, name: &str) -> Option<&DecisionTree<usize, Discriminant, DispatchKey>> {
        self.operations.get(name)?.tree.as_ref()
    }

    /// Select the overload of `name` for arguments of shapes `args`.
    ///
    /// Walks the dispatch tree, then narrows the leaf to overloads accepting
    /// `args`, preferring an exact match and then the fewest `Any`
    /// parameters. An operation not yet finalized is searched linearly.
    pub fn dispatch(&self, name: &str, args: &[TypeShape]) -> Result<&Overload<F>, DispatchError> {
        let operation = self
            .operations
            .get(name)
            .ok_or_else(|| DispatchError::UnknownOperation(name.to_string()))?;

        let all: Vec<usize> = (0..operation.overloads.len()).collect();
        let reached: &[usize] = match &operation.tree {
            Some(tree) => tree.select(|d| probe(*d, args)),
            None => &all,
        };

        let mut candidates: Vec<&Overload<F>> = reached
            .iter()
            .map(|&i| &operation.overloads[i])
            .filter(|o| o.signature.accepts(args))
            .collect();

        if candidates.len() > 1
            && let Some(exact) = candidates.iter().find(|o| o.signature.is_exact(args))
        {
            return Ok(*exact);
        }
        if let Some(fewest) = candidates.iter().map(|o| o.signature.any_count()).min() {
            candidates.retain(|o| o.signature.any_count() == fewest);
        }

        match candidates.as_slice() {
            [] => Err(DispatchError::NoOverload {
                name: name.to_string(),
                args: render_args(args),
            }),
            [only] => Ok(*only),
            many => Err(DispatchError::Ambiguous {
                name: name.to_string(),
                args: render_args(args),
                candidates: many.iter().map(|o| o.signature.to_string()).collect(),
            }),
        }
    }

    /// Result shape of the overload `dispatch` would select.
    pub fn result_type(&self, name: &str, args: &[TypeShape]) -> Result<TypeShape, DispatchError> {
        self.dispatch(name, args)
            .map(|overload| overload.signature.result.clone())
    }
}

fn render_args(args: &[TypeShape]) -> String {
    args.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Classify an argument list; unknown argument shapes cannot be probed.
fn probe(discriminant: Discriminant, args: &[TypeShape]) -> Option<DispatchKey> {
    match discriminant {
        Discriminant::Arity => Some(DispatchKey::Arity(args.len())),
        Discriminant::ArgType(i) => match args.get(i) {
            None => Some(DispatchKey::Absent),
            Some(shape) => ShapeClass::of(shape).map(DispatchKey::Class),
        },
    }
}

/// Classify a signature. An `Any` parameter is ambiguous under every class.
fn categorize(signature: &Signature, discriminant: Discriminant) -> Vec<DispatchKey> {
    match discriminant {
        Discriminant::Arity => vec![DispatchKey::Arity(signature.arity())],
        Discriminant::ArgType(i) => match signature.params.get(i) {
            None => vec![DispatchKey::Absent],
            Some(TypeShape::Any) | Some(TypeShape::Named(_)) => {
                ShapeClass::all().map(DispatchKey::Class).collect()
            }
            Some(shape) => ShapeClass::of(shape)
                .map(DispatchKey::Class)
                .into_iter()
                .collect(),
        },
    }
}

fn build_tree<F>(overloads: &[Overload<F>]) -> DispatchTree {
    let max_arity = overloads
        .iter()
        .map(|o| o.signature.arity())
        .max()
        .unwrap_or(0);
    let discriminants: Vec<Discriminant> = std::iter::once(Discriminant::Arity)
        .chain((0..max_arity).map(Discriminant::ArgType))
        .collect();
    build_decision_tree(
        (0..overloads.len()).collect(),
        discriminants,
        |&case, &discriminant| categorize(&overloads[case].signature, discriminant),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numeric_registry() -> OverloadRegistry<&'static str> {
        let mut registry = OverloadRegistry::new();
        for (shape, id) in [
            (TypeShape::INT32, "i32"),
            (TypeShape::INT64, "i64"),
            (TypeShape::FLOAT64, "f64"),
        ] {
            registry
                .register("+", Signature::new(vec![shape.clone(), shape.clone()], shape), id)
                .unwrap();
        }
        registry.finalize();
        registry
    }

    #[test]
    fn every_well_typed_pair_reaches_exactly_its_overload() {
        let registry = numeric_registry();
        let tree = registry.tree("+").unwrap();
        let shapes = [TypeShape::INT32, TypeShape::INT64, TypeShape::FLOAT64];
        for (i, shape) in shapes.iter().enumerate() {
            let args = [shape.clone(), shape.clone()];
            let leaf = tree.select(|d| probe(*d, &args));
            assert_eq!(leaf, &[i]);
            assert_eq!(
                registry.dispatch("+", &args).unwrap().signature.result,
                *shape
            );
        }
    }

    #[test]
    fn arity_is_useless_when_all_overloads_share_it() {
        let registry = numeric_registry();
        let tree = registry.tree("+").unwrap();
        assert_eq!(tree.discriminant(), Some(&Discriminant::ArgType(0)));
    }

    #[test]
    fn mismatched_arguments_have_no_overload() {
        let registry = numeric_registry();
        let err = registry
            .dispatch("+", &[TypeShape::INT32, TypeShape::FLOAT64])
            .unwrap_err();
        assert!(matches!(err, DispatchError::NoOverload { .. }));
        assert_eq!(
            err.to_string(),
            "no overload of `+` accepts (Int32, Float64)"
        );
    }

    #[test]
    fn unknown_argument_shapes_fall_back_to_disambiguation() {
        let registry = numeric_registry();
        let chosen = registry
            .dispatch("+", &[TypeShape::Any, TypeShape::INT64])
            .unwrap();
        assert_eq!(chosen.implementation, "i64");

        let err = registry
            .dispatch("+", &[TypeShape::Any, TypeShape::Any])
            .unwrap_err();
        assert!(matches!(err, DispatchError::Ambiguous { ref candidates, .. } if candidates.len() == 3));
    }

    #[test]
    fn specific_overload_beats_any() {
        let mut registry = OverloadRegistry::new();
        registry
            .register("show", Signature::new(vec![TypeShape::Any], TypeShape::STRING), "any")
            .unwrap();
        registry
            .register("show", Signature::new(vec![TypeShape::BOOL], TypeShape::STRING), "bool")
            .unwrap();
        registry.finalize();
        assert_eq!(
            registry.dispatch("show", &[TypeShape::BOOL]).unwrap().implementation,
            "bool"
        );
        assert_eq!(
            registry.dispatch("show", &[TypeShape::STRING]).unwrap().implementation,
            "any"
        );
        let f = TypeShape::function(vec![], TypeShape::VOID);
        assert_eq!(registry.dispatch("show", &[f]).unwrap().implementation, "any");
    }

    #[test]
    fn arity_splits_unary_from_binary() {
        let mut registry = OverloadRegistry::new();
        registry
            .register("-", Signature::new(vec![TypeShape::INT32], TypeShape::INT32), "neg")
            .unwrap();
        registry
            .register(
                "-",
                Signature::new(vec![TypeShape::INT32, TypeShape::INT32], TypeShape::INT32),
                "sub",
            )
            .unwrap();
        registry.finalize();
        assert_eq!(registry.dispatch("-", &[TypeShape::INT32]).unwrap().implementation, "neg");
        assert_eq!(
            registry
                .dispatch("-", &[TypeShape::INT32, TypeShape::INT32])
                .unwrap()
                .implementation,
            "sub"
        );
    }

    #[test]
    fn duplicate_parameter_lists_are_rejected() {
        let mut registry = OverloadRegistry::new();
        let sig = Signature::new(vec![TypeShape::INT32], TypeShape::INT32);
        registry.register("f", sig.clone(), 1).unwrap();
        let other_result = Signature::new(vec![TypeShape::INT32], TypeShape::BOOL);
        assert!(matches!(
            registry.register("f", other_result, 2),
            Err(DispatchError::Duplicate { .. })
        ));
        assert!(registry.register("g", sig, 3).is_ok());
    }

    #[test]
    fn unfinalized_registry_still_dispatches() {
        let mut registry = OverloadRegistry::new();
        registry
            .register("len", Signature::new(vec![TypeShape::STRING], TypeShape::INT32), ())
            .unwrap();
        assert!(registry.tree("len").is_none());
        assert_eq!(
            registry.result_type("len", &[TypeShape::STRING]),
            Ok(TypeShape::INT32)
        );
        assert_eq!(
            registry.result_type("nope", &[]),
            Err(DispatchError::UnknownOperation("nope".into()))
        );
    }
}
