//! What a stage hands on: the edited tree, the interpretation result and,
//! once Export has run, the module's published symbols.

use std::collections::BTreeMap;
use std::sync::Arc;

use strata_core::{BindingId, ExportedName, PartialResult, Stage, TypeShape, Value};
use strata_parser::ast::Block;

/// One published symbol.
#[derive(Debug, Clone, PartialEq)]
pub struct Export {
    pub name: ExportedName,
    pub binding: BindingId,
    /// `None` when the value was not computable by the end of Export.
    pub value: Option<Value>,
    pub shape: TypeShape,
}

impl Export {
    /// Whether this exports a type definition rather than a value.
    pub fn is_type(&self) -> bool {
        matches!(self.value, Some(Value::Type(_)))
    }

    /// The defined type, for type exports.
    pub fn as_type(&self) -> Option<&TypeShape> {
        match &self.value {
            Some(Value::Type(shape)) => Some(shape),
            _ => None,
        }
    }
}

/// A module's exports in declaration order, shared with importers.
pub type Exports = Arc<[Export]>;

/// Bundle produced by an interpretive stage.
#[derive(Debug, Clone)]
pub struct StageOutputs {
    pub stage: Stage,
    pub root: Block,
    pub result: PartialResult,
    pub exports: Exports,
    /// Shapes of top-level declarations as inferred by the Type stage.
    pub declared_types: BTreeMap<Arc<str>, TypeShape>,
}

impl StageOutputs {
    pub fn is_ok(&self) -> bool {
        !matches!(self.result, PartialResult::Fail(_))
    }

    pub fn export(&self, base: &str) -> Option<&Export> {
        self.exports.iter().find(|e| e.name.base_name() == base)
    }
}
