use std::any::Any;
use std::fmt;
use std::sync::Arc;

use strata_core::{Callable, TypeShape};
use strata_parser::ast::FnExpr;

use crate::environment::Environment;

/// A script function together with the environment it was created in.
#[derive(Clone)]
pub struct Closure {
    name: Arc<str>,
    func: Arc<FnExpr>,
    env: Environment,
}

impl Closure {
    pub fn new(name: Arc<str>, func: Arc<FnExpr>, env: Environment) -> Self {
        Self { name, func, env }
    }

    pub fn func(&self) -> &FnExpr {
        &self.func
    }

    pub fn env(&self) -> &Environment {
        &self.env
    }
}

impl fmt::Debug for Closure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Closure")
            .field("name", &self.name)
            .field("shape", &self.func.shape())
            .finish_non_exhaustive()
    }
}

impl Callable for Closure {
    fn name(&self) -> &str {
        &self.name
    }

    fn shape(&self) -> TypeShape {
        self.func.shape()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
