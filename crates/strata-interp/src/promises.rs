//! Asynchronous-result registry.
//!
//! Promises are created by `async` blocks and by the `promise()` host
//! builtin. Suspended tasks are parked here until the promise they await
//! settles; the interpretation that owns the registry drains it.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use strata_core::{BindingId, PromiseId, Span, Value};
use strata_parser::ast::Block;

use crate::environment::Environment;

#[derive(Debug, Clone, PartialEq)]
pub enum PromiseState {
    Pending,
    Resolved(Value),
    Failed(String),
}

impl PromiseState {
    pub fn is_settled(&self) -> bool {
        !matches!(self, PromiseState::Pending)
    }
}

/// What a suspended task waits for.
pub(crate) struct Waiting {
    pub promise: PromiseId,
    pub bind: Option<BindingId>,
    pub span: Span,
}

/// The body of an `async` block, resumable at statement granularity.
pub(crate) struct Task {
    pub promise: PromiseId,
    pub body: Arc<Block>,
    pub env: Environment,
    pub next: usize,
    pub last: Value,
    pub waiting: Option<Waiting>,
}

#[derive(Default)]
struct Inner {
    states: Vec<PromiseState>,
    tasks: Vec<Task>,
}

#[derive(Default)]
pub struct Promises {
    inner: Mutex<Inner>,
}

impl Promises {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a pending promise.
    pub fn create(&self) -> PromiseId {
        let mut inner = self.inner.lock();
        let id = PromiseId(inner.states.len() as u32);
        inner.states.push(PromiseState::Pending);
        id
    }

    pub fn state(&self, id: PromiseId) -> Option<PromiseState> {
        self.inner.lock().states.get(id.0 as usize).cloned()
    }

    pub fn is_settled(&self, id: PromiseId) -> bool {
        self.state(id).is_some_and(|s| s.is_settled())
    }

    /// Settle `id` with a value. Returns false if it was unknown or already settled.
    pub fn resolve(&self, id: PromiseId, value: Value) -> bool {
        self.settle(id, PromiseState::Resolved(value))
    }

    /// Settle `id` as failed. Returns false if it was unknown or already settled.
    pub fn fail(&self, id: PromiseId, message: impl Into<String>) -> bool {
        self.settle(id, PromiseState::Failed(message.into()))
    }

    fn settle(&self, id: PromiseId, state: PromiseState) -> bool {
        let mut inner = self.inner.lock();
        match inner.states.get_mut(id.0 as usize) {
            Some(slot @ PromiseState::Pending) => {
                *slot = state;
                true
            }
            _ => false,
        }
    }

    pub fn len(&self) -> usize {
        self.inner.lock().states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Promises that have not settled.
    pub fn pending_count(&self) -> usize {
        self.inner
            .lock()
            .states
            .iter()
            .filter(|s| !s.is_settled())
            .count()
    }

    /// Tasks that are parked and have not finished.
    pub fn unresolved_tasks(&self) -> usize {
        self.inner.lock().tasks.len()
    }

    /// Drop every parked task, failing its promise. Returns how many were dropped.
    pub fn abandon_tasks(&self) -> usize {
        let mut inner = self.inner.lock();
        let tasks = std::mem::take(&mut inner.tasks);
        for task in &tasks {
            if let Some(slot @ PromiseState::Pending) = inner.states.get_mut(task.promise.0 as usize) {
                *slot = PromiseState::Failed("task never completed".to_string());
            }
        }
        tasks.len()
    }

    pub(crate) fn park(&self, task: Task) {
        self.inner.lock().tasks.push(task);
    }

    /// Remove and return the tasks that can make progress, in the order they were parked.
    pub(crate) fn take_runnable(&self) -> Vec<Task> {
        let mut inner = self.inner.lock();
        let Inner { states, tasks } = &mut *inner;
        let (runnable, parked): (Vec<Task>, Vec<Task>) =
            std::mem::take(tasks).into_iter().partition(|task| {
                task.waiting.as_ref().is_none_or(|w| {
                    states
                        .get(w.promise.0 as usize)
                        .is_none_or(PromiseState::is_settled)
                })
            });
        *tasks = parked;
        runnable
    }
}

impl fmt::Debug for Promises {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("Promises")
            .field("states", &inner.states)
            .field("tasks", &inner.tasks.len())
            .finish()
    }
}
