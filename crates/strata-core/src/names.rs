//! Names used across stages.
//!
//! - [`ModuleName`]: identifies a module in the advancing set.
//! - [`BindingId`]: the stable identity a declaration receives during name
//!   resolution; references resolve to it rather than to raw text.
//! - [`ExportedName`]: the externally visible identity of an exported
//!   declaration, distinct from its locally resolved name.

use std::fmt;
use std::sync::Arc;

/// Name of a module, e.g. `"app/main"`.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModuleName(Arc<str>);

impl ModuleName {
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ModuleName {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl fmt::Debug for ModuleName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ModuleName({})", self.0)
    }
}

impl fmt::Display for ModuleName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identity of a resolved declaration within one module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BindingId(pub u32);

impl fmt::Display for BindingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Hands out fresh [`BindingId`]s for one module.
#[derive(Debug, Default, Clone)]
pub struct BindingIdAllocator {
    next: u32,
}

impl BindingIdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fresh(&mut self) -> BindingId {
        let id = BindingId(self.next);
        self.next += 1;
        id
    }
}

/// The externally visible name of an exported declaration.
///
/// Exported names conflict with their base name when hoisting: a hoisted
/// declaration of `x` may not move past `export let x`.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ExportedName {
    pub module: ModuleName,
    pub base: Arc<str>,
}

impl ExportedName {
    pub fn new(module: ModuleName, base: impl Into<Arc<str>>) -> Self {
        Self {
            module,
            base: base.into(),
        }
    }

    pub fn base_name(&self) -> &str {
        &self.base
    }
}

impl fmt::Debug for ExportedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ExportedName({}.{})", self.module, self.base)
    }
}

impl fmt::Display for ExportedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.module, self.base)
    }
}
