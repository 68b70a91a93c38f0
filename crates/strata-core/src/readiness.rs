//! Readiness: whether a named binding is usable at the moment it is queried.
//!
//! A [`ReadinessClock`] is owned by exactly one stage's processing of one
//! module. Bindings carry a [`Lifespan`] recording when their window of use
//! opened; the clock turns that into a [`Readiness`] on every query. Because
//! readiness is recomputed on each query, a value cached across a checkpoint
//! is caught as [`Readiness::Evaporated`] instead of being silently reused.

use std::fmt;

use crate::{ReadinessError, Span, Stage};

/// Four-state usability lattice, ordered from least to most usable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Readiness {
    /// The window to use this binding has closed.
    Evaporated,
    /// No value yet.
    Unready,
    /// Usable now, guaranteed gone by the next checkpoint.
    GoingOutOfStyle,
    Ready,
}

impl Readiness {
    /// The less usable of two states.
    pub fn meet(self, other: Readiness) -> Readiness {
        self.min(other)
    }

    pub fn is_usable(self) -> bool {
        matches!(self, Readiness::Ready | Readiness::GoingOutOfStyle)
    }
}

impl fmt::Display for Readiness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Readiness::Evaporated => "Evaporated",
            Readiness::Unready => "Unready",
            Readiness::GoingOutOfStyle => "GoingOutOfStyle",
            Readiness::Ready => "Ready",
        })
    }
}

/// When a binding's window of use opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Lifespan {
    /// Published; usable for the rest of the build.
    Durable,
    /// Only usable until the next checkpoint of the stage that made it.
    Transient { stage: Stage, checkpoint: u32 },
}

/// Per-stage clock that decides readiness.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadinessClock {
    stage: Stage,
    checkpoint: u32,
    going_out_of_style: bool,
}

impl ReadinessClock {
    pub fn new(stage: Stage) -> Self {
        Self {
            stage,
            checkpoint: 0,
            // Everything is on its way out once the build has been run.
            going_out_of_style: stage == Stage::Run,
        }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn current_checkpoint(&self) -> u32 {
        self.checkpoint
    }

    pub fn is_going_out_of_style(&self) -> bool {
        self.going_out_of_style
    }

    /// Close the current window. Transient bindings made before this call
    /// evaporate.
    pub fn checkpoint(&mut self) -> u32 {
        self.checkpoint += 1;
        self.checkpoint
    }

    /// Lifespan for a binding made now. Only durable stages publish.
    pub fn lifespan_for_new_binding(&self, durable: bool) -> Lifespan {
        if durable {
            Lifespan::Durable
        } else {
            Lifespan::Transient {
                stage: self.stage,
                checkpoint: self.checkpoint,
            }
        }
    }

    /// Readiness of a binding with the given lifespan; `has_value` is false
    /// for declared but not yet initialized bindings.
    pub fn readiness(&self, lifespan: Lifespan, has_value: bool) -> Readiness {
        match lifespan {
            Lifespan::Transient { stage, checkpoint }
                if stage != self.stage || checkpoint != self.checkpoint =>
            {
                Readiness::Evaporated
            }
            _ if !has_value => Readiness::Unready,
            Lifespan::Transient { .. } => Readiness::GoingOutOfStyle,
            Lifespan::Durable if self.going_out_of_style => Readiness::GoingOutOfStyle,
            Lifespan::Durable => Readiness::Ready,
        }
    }

    /// Gate a use of `value`. Unusable bindings are rejected at `span`.
    pub fn consume<'a, T>(
        &self,
        name: &str,
        binding: &'a Binding<T>,
        span: Span,
    ) -> Result<&'a T, ReadinessError> {
        match (self.readiness(binding.lifespan, binding.value.is_some()), &binding.value) {
            (Readiness::Evaporated, _) => Err(ReadinessError::Evaporated {
                name: name.to_string(),
                span,
            }),
            (_, Some(value)) => Ok(value),
            (_, None) => Err(ReadinessError::Unready {
                name: name.to_string(),
                span,
            }),
        }
    }
}

/// A value slot plus the window in which it may be used.
#[derive(Debug, Clone, PartialEq)]
pub struct Binding<T> {
    pub value: Option<T>,
    pub lifespan: Lifespan,
    pub mutable: bool,
}

impl<T> Binding<T> {
    pub fn new(value: Option<T>, lifespan: Lifespan, mutable: bool) -> Self {
        Self {
            value,
            lifespan,
            mutable,
        }
    }
}
