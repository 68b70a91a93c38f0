//! Binding environments.
//!
//! Names are resolved to [`BindingId`]s before anything is interpreted, so a
//! frame is a map from identity to [`Binding`]. Frames chain to their
//! parent; a closure keeps the frame it was created in alive.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use strata_core::{Binding, BindingId, Lifespan, Value};

/// Why an assignment was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignError {
    /// No frame in the chain declares the binding.
    Undeclared,
    /// The binding is immutable and already has a value.
    Immutable,
}

struct Frame {
    bindings: RwLock<FxHashMap<BindingId, Binding<Value>>>,
    parent: Option<Environment>,
}

/// Shared handle to a chain of binding frames.
#[derive(Clone)]
pub struct Environment {
    frame: Arc<Frame>,
}

impl Environment {
    /// A root environment, e.g. one module's top level.
    pub fn new() -> Self {
        Self {
            frame: Arc::new(Frame {
                bindings: RwLock::new(FxHashMap::default()),
                parent: None,
            }),
        }
    }

    /// A fresh frame whose lookups fall back to `self`.
    pub fn child(&self) -> Self {
        Self {
            frame: Arc::new(Frame {
                bindings: RwLock::new(FxHashMap::default()),
                parent: Some(self.clone()),
            }),
        }
    }

    /// Bind `id` in this frame, replacing any earlier binding of it here.
    pub fn define(&self, id: BindingId, binding: Binding<Value>) {
        self.frame.bindings.write().insert(id, binding);
    }

    /// Find the nearest binding of `id`.
    pub fn lookup(&self, id: BindingId) -> Option<Binding<Value>> {
        let mut env = self;
        loop {
            if let Some(binding) = env.frame.bindings.read().get(&id) {
                return Some(binding.clone());
            }
            env = env.frame.parent.as_ref()?;
        }
    }

    /// Whether this frame itself binds `id`.
    pub fn binds_locally(&self, id: BindingId) -> bool {
        self.frame.bindings.read().contains_key(&id)
    }

    /// Give the nearest binding of `id` a new value.
    ///
    /// An immutable binding may be assigned exactly once, which is how a
    /// hoisted declaration receives its value.
    pub fn assign(&self, id: BindingId, value: Value, lifespan: Lifespan) -> Result<(), AssignError> {
        let mut env = self;
        loop {
            {
                let mut bindings = env.frame.bindings.write();
                if let Some(binding) = bindings.get_mut(&id) {
                    if !binding.mutable && binding.value.is_some() {
                        return Err(AssignError::Immutable);
                    }
                    binding.value = Some(value);
                    binding.lifespan = lifespan;
                    return Ok(());
                }
            }
            env = env.frame.parent.as_ref().ok_or(AssignError::Undeclared)?;
        }
    }

    /// Number of bindings in this frame, not counting parents.
    pub fn len(&self) -> usize {
        self.frame.bindings.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut ids: Vec<BindingId> = self.frame.bindings.read().keys().copied().collect();
        ids.sort();
        f.debug_struct("Environment")
            .field("bindings", &ids)
            .field("has_parent", &self.frame.parent.is_some())
            .finish()
    }
}
