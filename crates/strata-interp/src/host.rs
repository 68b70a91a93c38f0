//! Values supplied by the embedding host.
//!
//! - [`Capabilities`]: named values visible to every module (e.g. `print`)
//! - [`Resolvers`]: implementations for `extern fn` declarations, looked up
//!   by name and declared signature
//! - [`Intrinsic`]: the promise builtins, which need the interpreter's
//!   promise registry

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use rustc_hash::FxHashMap;
use strata_core::{Callable, TypeShape, Value};

type HostImpl = dyn Fn(&[Value]) -> Result<Value, String> + Send + Sync;

/// A function implemented by the host.
///
/// Calling one is an effect: partial evaluation never performs it.
#[derive(Clone)]
pub struct HostFunction {
    name: Arc<str>,
    shape: TypeShape,
    implementation: Arc<HostImpl>,
}

impl HostFunction {
    pub fn new(
        name: impl Into<Arc<str>>,
        shape: TypeShape,
        implementation: impl Fn(&[Value]) -> Result<Value, String> + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            shape,
            implementation: Arc::new(implementation),
        }
    }

    pub fn call(&self, args: &[Value]) -> Result<Value, String> {
        (self.implementation)(args)
    }
}

impl fmt::Debug for HostFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostFunction")
            .field("name", &self.name)
            .field("shape", &self.shape)
            .finish_non_exhaustive()
    }
}

impl Callable for HostFunction {
    fn name(&self) -> &str {
        &self.name
    }

    fn shape(&self) -> TypeShape {
        self.shape.clone()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

// =========================================
// Capabilities
// =========================================

#[derive(Debug, Clone, Default)]
pub struct Capabilities {
    values: FxHashMap<Arc<str>, Value>,
}

impl Capabilities {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<Arc<str>>, value: Value) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<Arc<str>>, value: Value) {
        self.values.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Names in sorted order.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.values.keys().map(|n| &**n).collect();
        names.sort_unstable();
        names
    }
}

// =========================================
// Signature resolvers
// =========================================

/// Supplies an implementation for an `extern fn` declaration.
pub trait SignatureResolver: Send + Sync {
    /// An implementation of `shape`, or `None` if this resolver has none.
    fn resolve(&self, name: &str, shape: &TypeShape) -> Option<Value>;
}

impl<F> SignatureResolver for F
where
    F: Fn(&str, &TypeShape) -> Option<Value> + Send + Sync,
{
    fn resolve(&self, name: &str, shape: &TypeShape) -> Option<Value> {
        self(name, shape)
    }
}

#[derive(Clone, Default)]
pub struct Resolvers {
    by_name: FxHashMap<Arc<str>, Arc<dyn SignatureResolver>>,
}

impl Resolvers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<Arc<str>>, resolver: impl SignatureResolver + 'static) -> Self {
        self.insert(name, resolver);
        self
    }

    pub fn insert(&mut self, name: impl Into<Arc<str>>, resolver: impl SignatureResolver + 'static) {
        self.by_name.insert(name.into(), Arc::new(resolver));
    }

    pub fn get(&self, name: &str) -> Option<&dyn SignatureResolver> {
        self.by_name.get(name).map(|r| &**r)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }
}

impl fmt::Debug for Resolvers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.by_name.keys().map(|n| &**n).collect();
        names.sort_unstable();
        f.debug_struct("Resolvers").field("names", &names).finish()
    }
}

// =========================================
// Intrinsics
// =========================================

/// Builtins that operate on the interpreter's promise registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intrinsic {
    /// `promise()` creates a pending promise.
    Promise,
    /// `resolve(p, v)` settles `p` with `v`; true if it was still pending.
    Resolve,
}

impl Intrinsic {
    pub const ALL: [Intrinsic; 2] = [Intrinsic::Promise, Intrinsic::Resolve];

    pub fn name(self) -> &'static str {
        match self {
            Intrinsic::Promise => "promise",
            Intrinsic::Resolve => "resolve",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|i| i.name() == name)
    }

    pub fn shape(self) -> TypeShape {
        match self {
            Intrinsic::Promise => TypeShape::function(vec![], TypeShape::promise(TypeShape::Any)),
            Intrinsic::Resolve => TypeShape::function(
                vec![TypeShape::promise(TypeShape::Any), TypeShape::Any],
                TypeShape::BOOL,
            ),
        }
    }
}

impl Callable for Intrinsic {
    fn name(&self) -> &str {
        Intrinsic::name(*self)
    }

    fn shape(&self) -> TypeShape {
        Intrinsic::shape(*self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
